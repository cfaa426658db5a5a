//! cp — Copy files and directories.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::missing_operand;

/// Cp tool: copy files and directory trees.
pub struct Cp;

#[async_trait]
impl Tool for Cp {
    fn name(&self) -> &str {
        "cp"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cp", "Copy files and directories")
            .param(
                ParamSchema::flag("recursive", "Copy directories recursively")
                    .with_aliases(["-r", "-R", "-a"]),
            )
            .param(ParamSchema::flag("verbose", "Explain what is being done").with_aliases(["-v"]))
            .param(
                ParamSchema::flag("no-clobber", "Do not overwrite an existing file")
                    .with_aliases(["-n"]),
            )
            .param(ParamSchema::flag("force", "Overwrite without asking").with_aliases(["-f"]))
            .example("Copy a file", "cp notes.txt notes.bak")
            .example("Copy a tree into a directory", "cp -r src /tmp/")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let operands = &args.positional;
        match operands.len() {
            0 => return missing_operand("cp"),
            1 => {
                return ExecResult::failure(
                    1,
                    format!(
                        "cp: missing destination file operand after '{}'\nTry 'cp --help' for more information.",
                        operands[0]
                    ),
                )
            }
            _ => {}
        }

        let (sources, dest) = operands.split_at(operands.len() - 1);
        let dest = &dest[0];
        let dest_resolved = ctx.resolve_path(dest);
        if sources.len() > 1 && !ctx.vfs.is_dir(&dest_resolved) {
            return ExecResult::failure(1, format!("cp: target '{dest}' is not a directory"));
        }

        let recursive = args.has_flag("recursive");
        let mut out = String::new();
        let mut err = String::new();
        for source in sources {
            let resolved = ctx.resolve_path(source);
            let meta = match ctx.vfs.stat(&resolved) {
                Ok(meta) => meta,
                Err(e) => {
                    err.push_str(&format!("cp: cannot stat '{source}': {}\n", e.reason()));
                    continue;
                }
            };
            if meta.is_dir() && !recursive {
                err.push_str(&format!("cp: -r not specified; omitting directory '{source}'\n"));
                continue;
            }

            let final_dest = if ctx.vfs.is_dir(&dest_resolved) {
                path::join(&dest_resolved, path::basename(&resolved))
            } else {
                dest_resolved.clone()
            };
            if final_dest == resolved {
                err.push_str(&format!("cp: '{source}' and '{dest}' are the same file\n"));
                continue;
            }
            if args.has_flag("no-clobber") && ctx.vfs.exists(&final_dest) {
                continue;
            }

            match ctx.vfs.copy(&resolved, &dest_resolved, recursive) {
                Ok(()) => {
                    if args.has_flag("verbose") {
                        out.push_str(&format!("'{source}' -> '{dest}'\n"));
                    }
                }
                Err(e) => {
                    err.push_str(&format!(
                        "cp: cannot copy '{source}' to '{dest}': {}\n",
                        e.reason()
                    ));
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
    async fn copies_a_file() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Cp, &mut ctx, &["notes.txt", "copy.txt"]).await.ok());
        assert_eq!(ctx.vfs.read_to_string("/home/user/copy.txt").unwrap(), "one\ntwo\nthree\n");
        assert!(ctx.vfs.exists("/home/user/notes.txt"));
    }

    #[tokio::test]
    async fn copies_into_directory() {
        let mut ctx = make_ctx();
        assert!(run_tool(&Cp, &mut ctx, &["notes.txt", "/tmp"]).await.ok());
        assert!(ctx.vfs.exists("/tmp/notes.txt"));
    }

    #[tokio::test]
    async fn directories_need_recursive() {
        let mut ctx = make_ctx();
        let result = run_tool(&Cp, &mut ctx, &["docs", "/tmp/docs"]).await;
        assert_eq!(result.err, "cp: -r not specified; omitting directory 'docs'\n");

        assert!(run_tool(&Cp, &mut ctx, &["-r", "docs", "/tmp/docs"]).await.ok());
        assert_eq!(ctx.vfs.read_to_string("/tmp/docs/readme.md").unwrap(), "# Readme\n");
    }

    #[tokio::test]
    async fn operand_errors() {
        let mut ctx = make_ctx();
        let missing = run_tool(&Cp, &mut ctx, &["nope", "x"]).await;
        assert_eq!(missing.err, "cp: cannot stat 'nope': No such file or directory\n");

        let many = run_tool(&Cp, &mut ctx, &["notes.txt", "docs/readme.md", "notes.txt"]).await;
        assert_eq!(many.err, "cp: target 'notes.txt' is not a directory");

        let lone = run_tool(&Cp, &mut ctx, &["notes.txt"]).await;
        assert!(lone.err.starts_with("cp: missing destination file operand after 'notes.txt'"));
    }

    #[tokio::test]
    async fn no_clobber_keeps_existing() {
        let mut ctx = make_ctx();
        ctx.vfs.write("/tmp/notes.txt", b"old\n", false).unwrap();
        run_tool(&Cp, &mut ctx, &["-n", "notes.txt", "/tmp/notes.txt"]).await;
        assert_eq!(ctx.vfs.read_to_string("/tmp/notes.txt").unwrap(), "old\n");
    }
}
