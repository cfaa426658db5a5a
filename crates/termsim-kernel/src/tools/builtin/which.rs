//! type, which — Describe how a command name would be resolved.

use async_trait::async_trait;

use crate::interpreter::{ExecResult, ERROR_PREFIX};
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::SHELL_BUILTINS;

/// Type tool: say whether a name is an alias, builtin or file.
pub struct Type;

#[async_trait]
impl Tool for Type {
    fn name(&self) -> &str {
        "type"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("type", "Display information about command type")
            .param(ParamSchema::flag("type", "Print a single word: alias, builtin, file").with_aliases(["-t"]))
            .example("Where does ls come from", "type ls")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let terse = args.has_flag("type");
        let mut out = String::new();
        let mut err = String::new();
        let mut missing = false;
        for name in &args.positional {
            if let Some(value) = ctx.aliases.get(name) {
                out.push_str(&if terse {
                    "alias\n".to_string()
                } else {
                    format!("{name} is aliased to `{value}'\n")
                });
            } else if SHELL_BUILTINS.contains(&name.as_str()) {
                out.push_str(&if terse {
                    "builtin\n".to_string()
                } else {
                    format!("{name} is a shell builtin\n")
                });
            } else if let Some(found) = locate(ctx, name) {
                out.push_str(&if terse {
                    "file\n".to_string()
                } else {
                    format!("{name} is {found}\n")
                });
            } else {
                missing = true;
                if !terse {
                    err.push_str(&format!("{ERROR_PREFIX} type: {name}: not found\n"));
                }
            }
        }
        ExecResult::from_output(i64::from(missing), out, err)
    }
}

/// Which tool: locate a command on `PATH`.
pub struct Which;

#[async_trait]
impl Tool for Which {
    fn name(&self) -> &str {
        "which"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("which", "Locate a command").example("Find grep", "which grep")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut out = String::new();
        let mut missing = false;
        for name in &args.positional {
            let found = if SHELL_BUILTINS.contains(&name.as_str()) {
                None
            } else {
                locate(ctx, name)
            };
            match found {
                Some(found) => {
                    out.push_str(&found);
                    out.push('\n');
                }
                None => missing = true,
            }
        }
        ExecResult::from_output(i64::from(missing || args.positional.is_empty()), out, "")
    }
}

/// Path a command name runs from: the first `PATH` entry holding a file of
/// that name, else `/usr/bin/<name>` for any registered tool.
fn locate(ctx: &ExecContext, name: &str) -> Option<String> {
    if name.contains('/') {
        let resolved = ctx.resolve_path(name);
        return ctx.vfs.is_file(&resolved).then(|| name.to_string());
    }
    let search_path = ctx.scope.get("PATH").unwrap_or_default();
    for dir in search_path.split(':').filter(|d| !d.is_empty()) {
        let candidate = path::join(dir, name);
        if ctx.vfs.is_file(&candidate) {
            return Some(candidate);
        }
    }
    ctx.tool_schemas
        .iter()
        .any(|s| s.name == name)
        .then(|| format!("/usr/bin/{name}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};
    use crate::tools::{register_builtins, ToolRegistry};

    fn ctx() -> ExecContext {
        let mut ctx = make_ctx();
        let mut registry = ToolRegistry::new();
        register_builtins(&mut registry);
        ctx.set_tool_schemas(registry.schemas());
        ctx.vfs.mkdir("/bin", false).unwrap();
        ctx.vfs.write("/bin/ls", b"", false).unwrap();
        ctx.aliases.insert("ll".to_string(), "ls -la".to_string());
        ctx
    }

    #[tokio::test]
    async fn type_describes_each_kind() {
        let mut ctx = ctx();
        let result = run_tool(&Type, &mut ctx, &["ll", "cd", "ls", "grep"]).await;
        assert_eq!(
            result.out,
            "ll is aliased to `ls -la'\ncd is a shell builtin\nls is /bin/ls\ngrep is /usr/bin/grep\n"
        );
        assert!(result.ok());

        let missing = run_tool(&Type, &mut ctx, &["nope"]).await;
        assert_eq!(missing.err, "-bash: type: nope: not found\n");
        assert_eq!(missing.code, 1);
    }

    #[tokio::test]
    async fn type_terse() {
        let mut ctx = ctx();
        let result = run_tool(&Type, &mut ctx, &["-t", "ll", "cd", "ls"]).await;
        assert_eq!(result.out, "alias\nbuiltin\nfile\n");
    }

    #[tokio::test]
    async fn which_skips_builtins() {
        let mut ctx = ctx();
        let result = run_tool(&Which, &mut ctx, &["ls", "cd"]).await;
        assert_eq!(result.out, "/bin/ls\n");
        assert_eq!(result.code, 1);

        assert!(run_tool(&Which, &mut ctx, &["grep"]).await.ok());
    }
}
