//! ExecResult — the outcome of every command, pipeline, and line.

/// Prefix that marks shell-level error text. Output starting with it is
/// treated as a failure even when the command reported status 0.
pub const ERROR_PREFIX: &str = "-bash:";

/// The result of executing a command or pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// Exit code. 0 means success.
    pub code: i64,
    /// Standard output.
    pub out: String,
    /// Standard error.
    pub err: String,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
        }
    }

    /// Create a failed result with an error message.
    pub fn failure(code: i64, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
        }
    }

    /// Create a result from raw parts.
    pub fn from_output(code: i64, out: impl Into<String>, err: impl Into<String>) -> Self {
        Self {
            code,
            out: out.into(),
            err: err.into(),
        }
    }

    /// True if the exit code is 0.
    pub fn ok(&self) -> bool {
        self.code == 0
    }

    /// True if either stream starts with the shell error prefix.
    pub fn has_error_prefix(&self) -> bool {
        self.out.starts_with(ERROR_PREFIX) || self.err.starts_with(ERROR_PREFIX)
    }

    /// Stdout followed by stderr, with stderr newline-terminated.
    pub fn rendered(&self) -> String {
        let mut text = self.out.clone();
        push_line(&mut text, &self.err);
        text
    }
}

/// Append `chunk` to `buf`, adding a trailing newline if `chunk` lacks one.
pub(crate) fn push_line(buf: &mut String, chunk: &str) {
    if chunk.is_empty() {
        return;
    }
    buf.push_str(chunk);
    if !chunk.ends_with('\n') {
        buf.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_terminates_stderr() {
        let result = ExecResult::from_output(1, "partial\n", "cat: x: No such file or directory");
        assert_eq!(
            result.rendered(),
            "partial\ncat: x: No such file or directory\n"
        );
    }

    #[test]
    fn error_prefix_detection() {
        assert!(ExecResult::success("-bash: foo: command not found").has_error_prefix());
        assert!(ExecResult::failure(1, "-bash: cd: x: No such file or directory").has_error_prefix());
        assert!(!ExecResult::success("bash is fine").has_error_prefix());
    }
}
