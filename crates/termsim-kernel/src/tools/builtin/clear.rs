//! clear — Clear the terminal screen.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Home the cursor, then erase the display.
const CLEAR_SEQUENCE: &str = "\x1b[H\x1b[2J";

/// Clear tool: emit the terminal clear sequence.
pub struct Clear;

#[async_trait]
impl Tool for Clear {
    fn name(&self) -> &str {
        "clear"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("clear", "Clear the terminal screen")
    }

    async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(CLEAR_SEQUENCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn emits_escape_sequence() {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Clear, &mut ctx, &[]).await.out, "\x1b[H\x1b[2J");
    }
}
