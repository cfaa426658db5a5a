//! rm — Remove files or directories.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

use super::missing_operand;

/// Rm tool: remove files or directories.
pub struct Rm;

#[async_trait]
impl Tool for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("rm", "Remove files or directories")
            .param(
                ParamSchema::flag("recursive", "Remove directories and their contents recursively")
                    .with_aliases(["-r", "-R"]),
            )
            .param(
                ParamSchema::flag("force", "Ignore nonexistent files, never prompt")
                    .with_aliases(["-f"]),
            )
            .param(ParamSchema::flag("dir", "Remove empty directories").with_aliases(["-d"]))
            .param(ParamSchema::flag("verbose", "Explain what is being done").with_aliases(["-v"]))
            .param(ParamSchema::flag("no-preserve-root", "Do not treat '/' specially"))
            .example("Remove a file", "rm notes.txt")
            .example("Remove a directory tree", "rm -rf build")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let force = args.has_flag("force");
        if args.positional.is_empty() {
            return if force {
                ExecResult::success("")
            } else {
                missing_operand("rm")
            };
        }
        let recursive = args.has_flag("recursive");

        let mut out = String::new();
        let mut err = String::new();
        for target in &args.positional {
            let resolved = ctx.resolve_path(target);
            if resolved == "/" && recursive && !args.has_flag("no-preserve-root") {
                err.push_str("rm: it is dangerous to operate recursively on '/'\n");
                err.push_str("rm: use --no-preserve-root to override this failsafe\n");
                continue;
            }
            let meta = match ctx.vfs.lstat(&resolved) {
                Ok(meta) => meta,
                Err(_) if force => continue,
                Err(e) => {
                    err.push_str(&format!("rm: cannot remove '{target}': {}\n", e.reason()));
                    continue;
                }
            };
            if meta.is_dir() && !recursive && !args.has_flag("dir") {
                err.push_str(&format!("rm: cannot remove '{target}': Is a directory\n"));
                continue;
            }
            match ctx.vfs.delete(&resolved, recursive) {
                Ok(()) => {
                    if args.has_flag("verbose") {
                        let what = if meta.is_dir() { "removed directory" } else { "removed" };
                        out.push_str(&format!("{what} '{target}'\n"));
                    }
                }
                Err(e) => {
                    err.push_str(&format!("rm: cannot remove '{target}': {}\n", e.reason()));
                }
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn removes_files() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Rm, &mut ctx, &["notes.txt"]).await.ok());
        assert!(!ctx.vfs.exists("/home/user/notes.txt"));
    }

    #[tokio::test]
    async fn directories_need_recursive() {
        let mut ctx = make_ctx();
        let result = run_tool(&Rm, &mut ctx, &["docs"]).await;
        assert_eq!(result.err, "rm: cannot remove 'docs': Is a directory\n");
        assert!(ctx.vfs.exists("/home/user/docs/readme.md"));

        assert!(run_tool(&Rm, &mut ctx, &["-r", "docs"]).await.ok());
        assert!(!ctx.vfs.exists("/home/user/docs"));
    }

    #[tokio::test]
    async fn dir_flag_only_removes_empty() {
        let mut ctx = make_ctx();
        let result = run_tool(&Rm, &mut ctx, &["-d", "docs"]).await;
        assert_eq!(result.err, "rm: cannot remove 'docs': Directory not empty\n");
    }

    #[tokio::test]
    async fn force_ignores_missing() {
        let mut ctx = make_ctx();
        assert_eq!(
            run_tool(&Rm, &mut ctx, &["nope"]).await.err,
            "rm: cannot remove 'nope': No such file or directory\n"
        );
        assert!(run_tool(&Rm, &mut ctx, &["-f", "nope"]).await.ok());
    }

    #[tokio::test]
    async fn root_is_protected() {
        let mut ctx = make_ctx();
        let result = run_tool(&Rm, &mut ctx, &["-rf", "/"]).await;
        assert_eq!(result.code, 1);
        assert!(result.err.contains("dangerous"));
        assert!(ctx.vfs.exists("/home/user"));
    }

    #[tokio::test]
    async fn removes_symlink_not_target() {
        let mut ctx = make_ctx();
        ctx.vfs.symlink("docs", "/home/user/d").unwrap();
        assert!(run_tool(&Rm, &mut ctx, &["d"]).await.ok());
        assert!(ctx.vfs.is_dir("/home/user/docs"));
    }
}
