//! tail — Output the last part of files.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

use super::head::{run_sections, shorthand_files, Count};

/// Tail tool: output the last lines (or bytes) of each input.
pub struct Tail;

#[async_trait]
impl Tool for Tail {
    fn name(&self) -> &str {
        "tail"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("tail", "Output the last part of files")
            .param(
                ParamSchema::option("lines", "Output the last NUM lines, or +NUM to start at line NUM")
                    .with_aliases(["-n"]),
            )
            .param(ParamSchema::option("bytes", "Output the last NUM bytes").with_aliases(["-c"]))
            .param(ParamSchema::flag("quiet", "Never print headers").with_aliases(["-q"]))
            .param(ParamSchema::flag("verbose", "Always print headers").with_aliases(["-v"]))
            .example("Last 20 lines", "tail -n 20 /var/log/syslog")
            .example("Skip a header line", "tail -n +2 data.csv")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let count = match Count::from_args("tail", &args) {
            Ok(count) => count,
            Err(result) => return result,
        };
        let files = shorthand_files(&args);
        run_sections("tail", &files, &args, ctx, |text| count.tail(text))
    }
}
