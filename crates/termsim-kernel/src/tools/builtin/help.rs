//! help — List commands or describe one.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Help tool: list available commands, or show one command's options.
pub struct Help;

#[async_trait]
impl Tool for Help {
    fn name(&self) -> &str {
        "help"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("help", "Display information about commands")
            .example("List every command", "help")
            .example("Options of one command", "help grep")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(topic) = args.get_positional(0) else {
            return ExecResult::success(overview(&ctx.tool_schemas));
        };
        match ctx.tool_schemas.iter().find(|s| s.name == topic) {
            Some(schema) => ExecResult::success(describe(schema)),
            None => ExecResult::failure(
                1,
                format!(
                    "{ERROR_PREFIX} help: no help topics match `{topic}'.  Try `help help' or `man -k {topic}' or `info {topic}'."
                ),
            ),
        }
    }
}

fn overview(schemas: &[ToolSchema]) -> String {
    let width = schemas.iter().map(|s| s.name.len()).max().unwrap_or(0);
    let mut out = String::from(
        "termsim, a simulated bash session.\nThese commands are available. Type `help name' to find out more about `name'.\n\n",
    );
    for schema in schemas {
        out.push_str(&format!(" {:<width$}  {}\n", schema.name, schema.description));
    }
    out
}

fn describe(schema: &ToolSchema) -> String {
    let mut out = format!("{}: {}\n", schema.name, schema.description);
    if !schema.params.is_empty() {
        let labels: Vec<String> = schema.params.iter().map(|p| p.label()).collect();
        let width = labels.iter().map(String::len).max().unwrap_or(0);
        out.push_str("\nOptions:\n");
        for (label, param) in labels.iter().zip(&schema.params) {
            out.push_str(&format!("  {label:<width$}  {}\n", param.description));
        }
    }
    if !schema.examples.is_empty() {
        out.push_str("\nExamples:\n");
        for (description, command) in &schema.examples {
            out.push_str(&format!("  # {description}\n  {command}\n"));
        }
    }
    out
}
