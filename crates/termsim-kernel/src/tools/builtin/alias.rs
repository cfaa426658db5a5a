//! alias, unalias — Command aliases.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Alias tool: define or display aliases.
pub struct Alias;

#[async_trait]
impl Tool for Alias {
    fn name(&self) -> &str {
        "alias"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("alias", "Define or display aliases")
            .param(ParamSchema::flag("print", "Print all defined aliases").with_aliases(["-p"]))
            .example("Define an alias", "alias ll='ls -la'")
            .example("Show one alias", "alias ll")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            let out: String = ctx
                .aliases
                .iter()
                .map(|(name, value)| format!("{}\n", render(name, value)))
                .collect();
            return ExecResult::success(out);
        }

        let mut out = String::new();
        let mut err = String::new();
        for word in &args.positional {
            match word.split_once('=') {
                Some((name, value)) if !name.is_empty() => {
                    ctx.aliases.insert(name.to_string(), value.to_string());
                }
                _ => match ctx.aliases.get(word) {
                    Some(value) => {
                        out.push_str(&render(word, value));
                        out.push('\n');
                    }
                    None => err.push_str(&format!("{ERROR_PREFIX} alias: {word}: not found\n")),
                },
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

fn render(name: &str, value: &str) -> String {
    format!("alias {name}='{}'", value.replace('\'', r"'\''"))
}

/// Unalias tool: remove aliases.
pub struct Unalias;

#[async_trait]
impl Tool for Unalias {
    fn name(&self) -> &str {
        "unalias"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("unalias", "Remove alias definitions")
            .param(ParamSchema::flag("all", "Remove all alias definitions").with_aliases(["-a"]))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.has_flag("all") {
            ctx.aliases.clear();
            return ExecResult::success("");
        }
        if args.positional.is_empty() {
            return ExecResult::failure(2, "unalias: usage: unalias [-a] name [name ...]");
        }
        let mut err = String::new();
        for name in &args.positional {
            if ctx.aliases.remove(name).is_none() {
                err.push_str(&format!("{ERROR_PREFIX} unalias: {name}: not found\n"));
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, "", err)
    }
}
