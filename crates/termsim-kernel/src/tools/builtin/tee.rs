//! tee — Copy standard input to files and standard output.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Tee tool: write stdin to each file and pass it through.
pub struct Tee;

#[async_trait]
impl Tool for Tee {
    fn name(&self) -> &str {
        "tee"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("tee", "Read from standard input and write to standard output and files")
            .param(
                ParamSchema::flag("append", "Append to the given files, do not overwrite")
                    .with_aliases(["-a"]),
            )
            .example("Save and show", "ls | tee listing.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let input = ctx.take_stdin().unwrap_or_default();
        let append = args.has_flag("append");

        let mut err = String::new();
        for file in &args.positional {
            let resolved = ctx.resolve_path(file);
            if let Err(e) = ctx.vfs.write(&resolved, input.as_bytes(), append) {
                err.push_str(&format!("tee: {file}: {}\n", e.reason()));
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, input, err)
    }
}
