//! mv — Move or rename files.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::missing_operand;

/// Mv tool: rename entries, or move them into a directory.
pub struct Mv;

#[async_trait]
impl Tool for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mv", "Move (rename) files")
            .param(ParamSchema::flag("verbose", "Explain what is being done").with_aliases(["-v"]))
            .param(
                ParamSchema::flag("no-clobber", "Do not overwrite an existing file")
                    .with_aliases(["-n"]),
            )
            .param(ParamSchema::flag("force", "Do not prompt before overwriting").with_aliases(["-f"]))
            .example("Rename a file", "mv draft.txt final.txt")
            .example("Move files into a directory", "mv a.txt b.txt archive/")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let operands = &args.positional;
        match operands.len() {
            0 => return missing_operand("mv"),
            1 => {
                return ExecResult::failure(
                    1,
                    format!(
                        "mv: missing destination file operand after '{}'\nTry 'mv --help' for more information.",
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
            return ExecResult::failure(1, format!("mv: target '{dest}' is not a directory"));
        }

        let mut out = String::new();
        let mut err = String::new();
        for source in sources {
            let resolved = ctx.resolve_path(source);
            if let Err(e) = ctx.vfs.lstat(&resolved) {
                err.push_str(&format!("mv: cannot stat '{source}': {}\n", e.reason()));
                continue;
            }
            if args.has_flag("no-clobber") {
                let final_dest = if ctx.vfs.is_dir(&dest_resolved) {
                    path::join(&dest_resolved, path::basename(&resolved))
                } else {
                    dest_resolved.clone()
                };
                if ctx.vfs.exists(&final_dest) {
                    continue;
                }
            }
            match ctx.vfs.rename(&resolved, &dest_resolved) {
                Ok(()) => {
                    if args.has_flag("verbose") {
                        out.push_str(&format!("renamed '{source}' -> '{dest}'\n"));
                    }
                }
                Err(e) => {
                    err.push_str(&format!(
                        "mv: cannot move '{source}' to '{dest}': {}\n",
                        e.reason()
                    ));
                }
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}
