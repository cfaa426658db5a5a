//! cd, pwd — Change and print the working directory.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Cd tool: change the current working directory.
pub struct Cd;

#[async_trait]
impl Tool for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cd", "Change the shell working directory")
            .example("Go home", "cd")
            .example("Go back to the previous directory", "cd -")
            .example("Relative move", "cd ../docs")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.len() > 1 {
            return ExecResult::failure(1, format!("{ERROR_PREFIX} cd: too many arguments"));
        }

        let mut out = String::new();
        let target = match args.get_positional(0) {
            None => ctx.home(),
            Some("-") => match ctx.scope.get("OLDPWD").filter(|p| !p.is_empty()) {
                Some(old) => {
                    out = format!("{old}\n");
                    old.to_string()
                }
                None => {
                    return ExecResult::failure(1, format!("{ERROR_PREFIX} cd: OLDPWD not set"));
                }
            },
            Some(dir) => dir.to_string(),
        };

        let resolved = ctx.resolve_path(&target);
        match ctx.vfs.stat(&resolved) {
            Ok(meta) if meta.is_dir() => {
                ctx.set_cwd(resolved);
                ExecResult::success(out)
            }
            Ok(_) => ExecResult::failure(
                1,
                format!("{ERROR_PREFIX} cd: {target}: Not a directory"),
            ),
            Err(e) => ExecResult::failure(
                1,
                format!("{ERROR_PREFIX} cd: {target}: {}", e.reason()),
            ),
        }
    }
}

/// Pwd tool: print the current working directory.
pub struct Pwd;

#[async_trait]
impl Tool for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("pwd", "Print the name of the current working directory")
            .param(ParamSchema::flag("physical", "Resolve symlinks").with_aliases(["-P"]))
            .param(ParamSchema::flag("logical", "Use PWD as is (default)").with_aliases(["-L"]))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.has_flag("physical") {
            return match ctx.vfs.canonicalize(&ctx.cwd) {
                Ok(path) => ExecResult::success(format!("{path}\n")),
                Err(e) => ExecResult::failure(1, format!("pwd: {}", e.reason())),
            };
        }
        ExecResult::success(format!("{}\n", ctx.cwd))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn relative_absolute_and_home() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Cd, &mut ctx, &["docs"]).await.ok());
        assert_eq!(ctx.cwd, "/home/user/docs");
        assert!(run_tool(&Cd, &mut ctx, &["/tmp"]).await.ok());
        assert_eq!(ctx.cwd, "/tmp");
        assert!(run_tool(&Cd, &mut ctx, &[]).await.ok());
        assert_eq!(ctx.cwd, "/home/user");
        assert_eq!(run_tool(&Pwd, &mut ctx, &[]).await.out, "/home/user\n");
    }

    #[tokio::test]
    async fn dash_goes_back_and_prints() {
        let mut ctx = make_ctx();
        run_tool(&Cd, &mut ctx, &["/tmp"]).await;
        let result = run_tool(&Cd, &mut ctx, &["-"]).await;
        assert_eq!(result.out, "/home/user\n");
        assert_eq!(ctx.cwd, "/home/user");
    }

    #[tokio::test]
    async fn errors_leave_cwd_alone() {
        let mut ctx = make_ctx();
        let missing = run_tool(&Cd, &mut ctx, &["nope"]).await;
        assert_eq!(missing.code, 1);
        assert_eq!(missing.err, "-bash: cd: nope: No such file or directory");

        let file = run_tool(&Cd, &mut ctx, &["notes.txt"]).await;
        assert_eq!(file.err, "-bash: cd: notes.txt: Not a directory");

        let many = run_tool(&Cd, &mut ctx, &["a", "b"]).await;
        assert_eq!(many.err, "-bash: cd: too many arguments");
        assert_eq!(ctx.cwd, "/home/user");
    }

    #[tokio::test]
    async fn physical_pwd_resolves_links() {
        let mut ctx = make_ctx();
        ctx.vfs.symlink("/home/user/docs", "/tmp/d").unwrap();
        run_tool(&Cd, &mut ctx, &["/tmp/d"]).await;
        assert_eq!(run_tool(&Pwd, &mut ctx, &[]).await.out, "/tmp/d\n");
        assert_eq!(run_tool(&Pwd, &mut ctx, &["-P"]).await.out, "/home/user/docs\n");
    }
}
