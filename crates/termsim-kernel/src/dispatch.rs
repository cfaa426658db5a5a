//! Command dispatch: the single path from a command name to a result.
//!
//! `PipelineRunner` owns I/O routing (pipes, redirects, assignments) and
//! calls [`CommandDispatcher::dispatch`] once per stage with the final
//! argv. The dispatcher resolves the name, parses arguments against the
//! tool's schema, runs it, and turns every failure mode into an
//! [`ExecResult`]:
//!
//! ```text
//! dispatch(name, argv, ctx)
//!     │
//!     ├── unknown name           → 127  "-bash: name: command not found"
//!     ├── /bin/name, ./name      → the builtin of that basename, if the file exists
//!     ├── tool panics            → 1    "name: <panic message>"
//!     └── tool returns           → its result; "-bash:" text forces a nonzero status
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::interpreter::{ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, ToolArgs, ToolRegistry};
use crate::vfs::path;

/// Resolves and runs a single command.
///
/// Implementations read stdin from `ctx.stdin` and may mutate any session
/// table reachable through `ctx`.
#[async_trait]
pub trait CommandDispatcher: Send + Sync {
    async fn dispatch(&self, name: &str, argv: Vec<String>, ctx: &mut ExecContext) -> ExecResult;
}

/// Dispatcher over a [`ToolRegistry`].
pub struct RegistryDispatcher {
    tools: Arc<ToolRegistry>,
}

impl RegistryDispatcher {
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Map `name` to a registered tool name.
    ///
    /// Names with a slash refer to VFS files; `/usr/bin/ls` runs `ls` as
    /// long as the file is there.
    fn resolve(&self, name: &str, ctx: &ExecContext) -> Result<String, ExecResult> {
        if !name.contains('/') {
            return if self.tools.contains(name) {
                Ok(name.to_string())
            } else {
                Err(ExecResult::failure(
                    127,
                    format!("{ERROR_PREFIX} {name}: command not found"),
                ))
            };
        }

        let resolved = ctx.resolve_path(name);
        if !ctx.vfs.exists(&resolved) {
            return Err(ExecResult::failure(
                127,
                format!("{ERROR_PREFIX} {name}: No such file or directory"),
            ));
        }
        if ctx.vfs.is_dir(&resolved) {
            return Err(ExecResult::failure(
                126,
                format!("{ERROR_PREFIX} {name}: Is a directory"),
            ));
        }
        let base = path::basename(&resolved);
        if self.tools.contains(base) {
            Ok(base.to_string())
        } else {
            Err(ExecResult::failure(
                126,
                format!("{ERROR_PREFIX} {name}: Permission denied"),
            ))
        }
    }
}

#[async_trait]
impl CommandDispatcher for RegistryDispatcher {
    async fn dispatch(&self, name: &str, argv: Vec<String>, ctx: &mut ExecContext) -> ExecResult {
        let tool_name = match self.resolve(name, ctx) {
            Ok(tool_name) => tool_name,
            Err(result) => {
                tracing::debug!(command = name, "command not found");
                return result;
            }
        };
        let Some(tool) = self.tools.get(&tool_name) else {
            return ExecResult::failure(127, format!("{ERROR_PREFIX} {name}: command not found"));
        };

        tracing::debug!(command = %tool_name, argc = argv.len(), "dispatch");
        let args = ToolArgs::parse(&tool.schema(), argv);
        let outcome = AssertUnwindSafe(tool.execute(args, ctx)).catch_unwind().await;

        let mut result = match outcome {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::warn!(command = %tool_name, %message, "tool panicked");
                ExecResult::failure(1, format!("{tool_name}: {message}"))
            }
        };

        if result.code == 0 && result.has_error_prefix() {
            result.code = 1;
        }
        result
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "internal error".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{Tool, ToolSchema};
    use crate::vfs::Vfs;

    struct Boom;

    #[async_trait]
    impl Tool for Boom {
        fn name(&self) -> &str {
            "boom"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("boom", "Always panics")
        }

        async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
            panic!("kaboom")
        }
    }

    struct Sneaky;

    #[async_trait]
    impl Tool for Sneaky {
        fn name(&self) -> &str {
            "sneaky"
        }

        fn schema(&self) -> ToolSchema {
            ToolSchema::new("sneaky", "Reports shell errors with status 0")
        }

        async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
            ExecResult::success("-bash: sneaky: something went wrong\n")
        }
    }

    fn dispatcher() -> RegistryDispatcher {
        let mut registry = ToolRegistry::new();
        registry.register(Boom);
        registry.register(Sneaky);
        RegistryDispatcher::new(Arc::new(registry))
    }

    fn ctx() -> ExecContext {
        let mut vfs = Vfs::new();
        vfs.mkdir("/bin", false).unwrap();
        vfs.write("/bin/sneaky", b"", false).unwrap();
        ExecContext::new(vfs)
    }

    #[tokio::test]
    async fn unknown_command() {
        let result = dispatcher().dispatch("nope", vec![], &mut ctx()).await;
        assert_eq!(result.code, 127);
        assert_eq!(result.err, "-bash: nope: command not found");
    }

    #[tokio::test]
    async fn panic_becomes_text() {
        let result = dispatcher().dispatch("boom", vec![], &mut ctx()).await;
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "boom: kaboom");
    }

    #[tokio::test]
    async fn error_prefix_forces_failure() {
        let result = dispatcher().dispatch("sneaky", vec![], &mut ctx()).await;
        assert_eq!(result.code, 1);
    }

    #[tokio::test]
    async fn path_names_resolve_to_builtins() {
        let d = dispatcher();
        let mut ctx = ctx();
        assert_eq!(d.dispatch("/bin/sneaky", vec![], &mut ctx).await.code, 1);
        assert_eq!(d.dispatch("/bin/boom", vec![], &mut ctx).await.code, 127);
        assert_eq!(d.dispatch("/bin", vec![], &mut ctx).await.code, 126);
    }
}
