//! cat — Concatenate files to standard output.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Cat tool: concatenate files, or copy stdin.
pub struct Cat;

#[async_trait]
impl Tool for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cat", "Concatenate files and print on the standard output")
            .param(ParamSchema::flag("number", "Number all output lines").with_aliases(["-n"]))
            .example("Print a file", "cat /etc/hostname")
            .example("Number lines", "cat -n notes.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let sources = ctx.read_sources("cat", &args.positional);
        let code = i64::from(sources.failed());

        let out = if args.has_flag("number") {
            number_lines(&sources.text)
        } else {
            sources.text
        };
        ExecResult::from_output(code, out, sources.errors)
    }
}

fn number_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 8 * text.lines().count());
    for (i, line) in text.split_inclusive('\n').enumerate() {
        out.push_str(&format!("{:>6}\t{line}", i + 1));
    }
    out
}
