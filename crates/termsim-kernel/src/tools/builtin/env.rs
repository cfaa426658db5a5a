//! env, printenv — Show the environment.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// Env tool: print exported variables.
///
/// Running a command under a modified environment needs a nested
/// dispatcher; that form is rejected rather than silently ignored.
pub struct Env;

#[async_trait]
impl Tool for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("env", "Print the environment").example("Show exported variables", "env")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if let Some(command) = args.positional.first() {
            return ExecResult::failure(
                126,
                format!("env: '{command}': running commands is not supported"),
            );
        }
        let out: String = ctx
            .scope
            .exported()
            .map(|(name, value)| format!("{name}={value}\n"))
            .collect();
        ExecResult::success(out)
    }
}

/// Printenv tool: print all or some exported variables.
pub struct Printenv;

#[async_trait]
impl Tool for Printenv {
    fn name(&self) -> &str {
        "printenv"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("printenv", "Print all or part of environment")
            .example("Print one variable", "printenv HOME")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            let out: String = ctx
                .scope
                .exported()
                .map(|(name, value)| format!("{name}={value}\n"))
                .collect();
            return ExecResult::success(out);
        }

        let mut out = String::new();
        let mut missing = false;
        for name in &args.positional {
            match ctx.scope.get(name).filter(|_| ctx.scope.is_exported(name)) {
                Some(value) => {
                    out.push_str(value);
                    out.push('\n');
                }
                None => missing = true,
            }
        }
        ExecResult::from_output(i64::from(missing), out, "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn env_lists_exported_only() {
        let mut ctx = make_ctx();
        ctx.scope.set("LOCAL", "hidden");
        let out = run_tool(&Env, &mut ctx, &[]).await.out;
        assert!(out.contains("HOME=/home/user\n"));
        assert!(out.contains("USER=user\n"));
        assert!(!out.contains("LOCAL"));
    }

    #[tokio::test]
    async fn printenv_names() {
        let mut ctx = make_ctx();
        let result = run_tool(&Printenv, &mut ctx, &["USER", "HOME"]).await;
        assert_eq!(result.out, "user\n/home/user\n");
        assert!(result.ok());

        let missing = run_tool(&Printenv, &mut ctx, &["NOPE"]).await;
        assert_eq!(missing.code, 1);
        assert_eq!(missing.out, "");
    }
}
