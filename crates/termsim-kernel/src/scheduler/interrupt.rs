//! Per-session cancel flag.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cloneable handle that asks the running line to stop.
///
/// The flag is checked between pipeline stages and between links, and
/// polled by long-running builtins such as `sleep`. Setting it never
/// touches session state.
#[derive(Debug, Clone, Default)]
pub struct InterruptHandle(Arc<AtomicBool>);

impl InterruptHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the current line stop.
    pub fn interrupt(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Reset before the next line runs.
    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let handle = InterruptHandle::new();
        let remote = handle.clone();
        assert!(!handle.is_set());
        remote.interrupt();
        assert!(handle.is_set());
        handle.clear();
        assert!(!remote.is_set());
    }
}
