//! export, unset — Environment variable attributes.

use async_trait::async_trait;

use crate::interpreter::{is_valid_name, ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Export tool: set and mark variables for the environment.
pub struct Export;

#[async_trait]
impl Tool for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("export", "Set export attribute for shell variables")
            .param(ParamSchema::flag("print", "Display all exported names").with_aliases(["-p"]))
            .example("Export a variable", "export EDITOR=vim")
            .example("List exported variables", "export -p")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            let out: String = ctx
                .scope
                .exported()
                .map(|(name, value)| format!("declare -x {name}=\"{}\"\n", quote_value(value)))
                .collect();
            return ExecResult::success(out);
        }

        let mut err = String::new();
        for word in &args.positional {
            let (name, value) = match word.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (word.as_str(), None),
            };
            if !is_valid_name(name) {
                err.push_str(&format!("{ERROR_PREFIX} export: `{word}': not a valid identifier\n"));
                continue;
            }
            match value {
                Some(value) => ctx.scope.export(name, value),
                None => ctx.scope.mark_exported(name),
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, "", err)
    }
}

fn quote_value(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('$', "\\$")
}

/// Unset tool: remove variables.
pub struct Unset;

#[async_trait]
impl Tool for Unset {
    fn name(&self) -> &str {
        "unset"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("unset", "Unset values of shell variables")
            .param(ParamSchema::flag("variables", "Treat each name as a variable").with_aliases(["-v"]))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut err = String::new();
        for name in &args.positional {
            if !is_valid_name(name) {
                err.push_str(&format!("{ERROR_PREFIX} unset: `{name}': not a valid identifier\n"));
                continue;
            }
            ctx.scope.remove(name);
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, "", err)
    }
}
