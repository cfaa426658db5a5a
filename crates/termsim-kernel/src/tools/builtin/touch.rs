//! touch — Change file timestamps, creating empty files.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

use super::missing_operand;

/// Touch tool: update timestamps or create empty files.
pub struct Touch;

#[async_trait]
impl Tool for Touch {
    fn name(&self) -> &str {
        "touch"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("touch", "Change file timestamps")
            .param(ParamSchema::flag("no-create", "Do not create any files").with_aliases(["-c"]))
            .example("Create an empty file", "touch new.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("touch");
        }
        let mut err = String::new();
        for file in &args.positional {
            let resolved = ctx.resolve_path(file);
            if args.has_flag("no-create") && !ctx.vfs.exists(&resolved) {
                continue;
            }
            if let Err(e) = ctx.vfs.touch(&resolved) {
                err.push_str(&format!("touch: cannot touch '{file}': {}\n", e.reason()));
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, "", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn creates_and_updates() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Touch, &mut ctx, &["new.txt"]).await.ok());
        assert_eq!(ctx.vfs.read_to_string("/home/user/new.txt").unwrap(), "");

        let before = ctx.vfs.stat("/home/user/notes.txt").unwrap().modified;
        run_tool(&Touch, &mut ctx, &["notes.txt"]).await;
        assert!(ctx.vfs.stat("/home/user/notes.txt").unwrap().modified >= before);
        assert_eq!(ctx.vfs.read_to_string("/home/user/notes.txt").unwrap(), "one\ntwo\nthree\n");
    }

    #[tokio::test]
    async fn missing_parent() {
        let mut ctx = make_ctx();
        let result = run_tool(&Touch, &mut ctx, &["nope/x"]).await;
        assert_eq!(result.err, "touch: cannot touch 'nope/x': No such file or directory\n");
    }

    #[tokio::test]
    async fn no_create() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Touch, &mut ctx, &["-c", "ghost"]).await.ok());
        assert!(!ctx.vfs.exists("/home/user/ghost"));
    }
}
