//! mkdir, rmdir — Create and remove directories.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::VfsError;

use super::missing_operand;

/// Mkdir tool: create directories.
pub struct Mkdir;

#[async_trait]
impl Tool for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mkdir", "Make directories")
            .param(
                ParamSchema::flag("parents", "No error if existing, make parent directories as needed")
                    .with_aliases(["-p"]),
            )
            .param(ParamSchema::flag("verbose", "Print a message for each created directory").with_aliases(["-v"]))
            .param(ParamSchema::option("mode", "Set file mode (octal)").with_aliases(["-m"]))
            .example("Create nested directories", "mkdir -p a/b/c")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("mkdir");
        }
        let parents = args.has_flag("parents");
        let mode = match args.get_named("mode") {
            Some(text) => match u32::from_str_radix(text, 8) {
                Ok(mode) if mode <= 0o7777 => Some(mode),
                _ => return ExecResult::failure(1, format!("mkdir: invalid mode '{text}'")),
            },
            None => None,
        };

        let mut out = String::new();
        let mut err = String::new();
        for dir in &args.positional {
            let resolved = ctx.resolve_path(dir);
            let created = ctx.vfs.mkdir(&resolved, parents).and_then(|()| match mode {
                Some(mode) => ctx.vfs.chmod(&resolved, mode),
                None => Ok(()),
            });
            match created {
                Ok(()) => {
                    if args.has_flag("verbose") {
                        out.push_str(&format!("mkdir: created directory '{dir}'\n"));
                    }
                }
                Err(e) => {
                    err.push_str(&format!(
                        "mkdir: cannot create directory '{dir}': {}\n",
                        e.reason()
                    ));
                }
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

/// Rmdir tool: remove empty directories.
pub struct Rmdir;

#[async_trait]
impl Tool for Rmdir {
    fn name(&self) -> &str {
        "rmdir"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("rmdir", "Remove empty directories")
            .param(ParamSchema::flag("parents", "Remove DIRECTORY and its ancestors").with_aliases(["-p"]))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("rmdir");
        }
        let mut err = String::new();
        for dir in &args.positional {
            let mut current = dir.trim_end_matches('/').to_string();
            loop {
                if let Err(reason) = remove_empty(ctx, &current) {
                    err.push_str(&format!("rmdir: failed to remove '{current}': {reason}\n"));
                    break;
                }
                if !args.has_flag("parents") {
                    break;
                }
                match current.rsplit_once('/') {
                    Some((parent, _)) if !parent.is_empty() => current = parent.to_string(),
                    _ => break,
                }
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, "", err)
    }
}

fn remove_empty(ctx: &mut ExecContext, dir: &str) -> Result<(), String> {
    let resolved = ctx.resolve_path(dir);
    let meta = ctx.vfs.lstat(&resolved).map_err(|e| e.reason().to_string())?;
    if !meta.is_dir() {
        return Err(VfsError::NotADirectory(resolved).reason().to_string());
    }
    ctx.vfs
        .delete(&resolved, false)
        .map_err(|e| e.reason().to_string())
}
