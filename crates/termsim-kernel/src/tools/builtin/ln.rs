//! ln, readlink — Symbolic links.
//!
//! Hard links are not modelled; `ln` without `-s` refuses.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::missing_operand;

/// Ln tool: make symbolic links.
pub struct Ln;

#[async_trait]
impl Tool for Ln {
    fn name(&self) -> &str {
        "ln"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ln", "Make links between files")
            .param(ParamSchema::flag("symbolic", "Make symbolic links").with_aliases(["-s"]))
            .param(
                ParamSchema::flag("force", "Remove existing destination files")
                    .with_aliases(["-f"]),
            )
            .param(ParamSchema::flag("verbose", "Print name of each linked file").with_aliases(["-v"]))
            .example("Link a config file", "ln -s /etc/hosts hosts")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let (target, link) = match args.positional.as_slice() {
            [] => return missing_operand("ln"),
            [target] => (target.clone(), path::basename(target).to_string()),
            [target, link] => (target.clone(), link.clone()),
            _ => return ExecResult::failure(1, "ln: extra operand\nTry 'ln --help' for more information."),
        };

        let mut link_path = ctx.resolve_path(&link);
        if ctx.vfs.is_dir(&link_path) && !ctx.vfs.is_symlink(&link_path) {
            link_path = path::join(&link_path, path::basename(&target));
        }

        if !args.has_flag("symbolic") {
            return ExecResult::failure(
                1,
                format!("ln: failed to create hard link '{link}' => '{target}': Operation not permitted"),
            );
        }

        if args.has_flag("force") && ctx.vfs.lstat(&link_path).is_ok_and(|m| !m.is_dir()) {
            if let Err(e) = ctx.vfs.delete(&link_path, false) {
                return ExecResult::failure(1, format!("ln: cannot remove '{link}': {}", e.reason()));
            }
        }

        match ctx.vfs.symlink(&target, &link_path) {
            Ok(()) => {
                let out = if args.has_flag("verbose") {
                    format!("'{link}' -> '{target}'\n")
                } else {
                    String::new()
                };
                ExecResult::success(out)
            }
            Err(e) => ExecResult::failure(
                1,
                format!("ln: failed to create symbolic link '{link}': {}", e.reason()),
            ),
        }
    }
}

/// Readlink tool: print a symlink's target.
pub struct Readlink;

#[async_trait]
impl Tool for Readlink {
    fn name(&self) -> &str {
        "readlink"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("readlink", "Print resolved symbolic links or canonical file names")
            .param(
                ParamSchema::flag("canonicalize", "Follow every symlink in every component")
                    .with_aliases(["-f", "-e"]),
            )
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("readlink");
        }
        let mut out = String::new();
        let mut code = 0;
        for name in &args.positional {
            let resolved = ctx.resolve_path(name);
            let target = if args.has_flag("canonicalize") {
                ctx.vfs.canonicalize(&resolved)
            } else {
                ctx.vfs.readlink(&resolved)
            };
            match target {
                Ok(target) => {
                    out.push_str(&target);
                    out.push('\n');
                }
                Err(_) => code = 1,
            }
        }
        ExecResult::from_output(code, out, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn symbolic_link() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Ln, &mut ctx, &["-s", "notes.txt", "link"]).await.ok());
        assert!(ctx.vfs.is_symlink("/home/user/link"));
        assert_eq!(ctx.vfs.read_to_string("/home/user/link").unwrap(), "one\ntwo\nthree\n");

        let again = run_tool(&Ln, &mut ctx, &["-s", "notes.txt", "link"]).await;
        assert_eq!(again.err, "ln: failed to create symbolic link 'link': File exists");

        assert!(run_tool(&Ln, &mut ctx, &["-sf", "docs", "link"]).await.ok());
        assert_eq!(ctx.vfs.readlink("/home/user/link").unwrap(), "docs");
    }

    #[tokio::test]
    async fn hard_links_refused() {
        let mut ctx = make_ctx();
        let result = run_tool(&Ln, &mut ctx, &["notes.txt", "hard"]).await;
        assert_eq!(result.code, 1);
        assert!(result.err.ends_with("Operation not permitted"));
        assert!(!ctx.vfs.exists("/home/user/hard"));
    }

    #[tokio::test]
    async fn link_into_directory() {
        let mut ctx = make_ctx();
        run_tool(&Ln, &mut ctx, &["-s", "/home/user/notes.txt", "/tmp"]).await;
        assert!(ctx.vfs.is_symlink("/tmp/notes.txt"));
    }

    #[tokio::test]
    async fn readlink_modes() {
        let mut ctx = make_ctx();
        ctx.vfs.symlink("docs", "/home/user/d").unwrap();

        assert_eq!(run_tool(&Readlink, &mut ctx, &["d"]).await.out, "docs\n");
        assert_eq!(
            run_tool(&Readlink, &mut ctx, &["-f", "d"]).await.out,
            "/home/user/docs\n"
        );
        assert_eq!(run_tool(&Readlink, &mut ctx, &["notes.txt"]).await.code, 1);
    }
}
