//! history — Display or clear the command history.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// History tool: numbered list of previous lines.
pub struct HistoryTool;

#[async_trait]
impl Tool for HistoryTool {
    fn name(&self) -> &str {
        "history"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("history", "Display or manipulate the history list")
            .param(ParamSchema::flag("clear", "Clear the history list").with_aliases(["-c"]))
            .example("Last five commands", "history 5")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.has_flag("clear") {
            ctx.history.clear();
            return ExecResult::success("");
        }

        let limit = match args.get_positional(0) {
            Some(text) => match text.parse::<usize>() {
                Ok(n) => Some(n),
                Err(_) => {
                    return ExecResult::failure(
                        1,
                        format!("{ERROR_PREFIX} history: {text}: numeric argument required"),
                    )
                }
            },
            None => None,
        };

        let entries: Vec<(usize, &str)> = ctx.history.numbered().collect();
        let skip = limit.map_or(0, |n| entries.len().saturating_sub(n));
        let out: String = entries[skip..]
            .iter()
            .map(|(number, line)| format!("{number:>5}  {line}\n"))
            .collect();
        ExecResult::success(out)
    }
}
