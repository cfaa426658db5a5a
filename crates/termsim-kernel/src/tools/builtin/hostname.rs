//! whoami, hostname — Who and where the session is.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Whoami tool: print the effective user name.
pub struct Whoami;

#[async_trait]
impl Tool for Whoami {
    fn name(&self) -> &str {
        "whoami"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("whoami", "Print effective user name")
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(format!("{}\n", ctx.user))
    }
}

/// Hostname tool: show or set the system host name.
pub struct Hostname;

#[async_trait]
impl Tool for Hostname {
    fn name(&self) -> &str {
        "hostname"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("hostname", "Show or set the system's host name")
            .param(ParamSchema::flag("short", "Short host name").with_aliases(["-s"]))
            .param(ParamSchema::flag("ip-address", "Addresses for the host name").with_aliases(["-i", "-I"]))
            .example("Show the host name", "hostname")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if let Some(name) = args.get_positional(0) {
            if ctx.user != "root" {
                return ExecResult::failure(1, "hostname: you must be root to change the host name");
            }
            ctx.hostname = name.to_string();
            ctx.scope.set("HOSTNAME", name);
            if let Err(e) = ctx.vfs.write("/etc/hostname", format!("{name}\n").as_bytes(), false) {
                tracing::debug!(error = %e, "could not persist hostname");
            }
            return ExecResult::success("");
        }

        if args.has_flag("ip-address") {
            return ExecResult::success("127.0.1.1\n");
        }
        let name = if args.has_flag("short") {
            ctx.hostname.split('.').next().unwrap_or_default()
        } else {
            ctx.hostname.as_str()
        };
        ExecResult::success(format!("{name}\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn whoami() {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Whoami, &mut ctx, &[]).await.out, "user\n");
    }

    #[tokio::test]
    async fn show_hostname() {
        let mut ctx = make_ctx();
        ctx.hostname = "box.example.com".to_string();
        assert_eq!(run_tool(&Hostname, &mut ctx, &[]).await.out, "box.example.com\n");
        assert_eq!(run_tool(&Hostname, &mut ctx, &["-s"]).await.out, "box\n");
    }

    #[tokio::test]
    async fn setting_needs_root() {
        let mut ctx = make_ctx();
        let denied = run_tool(&Hostname, &mut ctx, &["other"]).await;
        assert_eq!(denied.err, "hostname: you must be root to change the host name");
        assert_eq!(ctx.hostname, "termsim");

        ctx.user = "root".to_string();
        assert!(run_tool(&Hostname, &mut ctx, &["other"]).await.ok());
        assert_eq!(ctx.hostname, "other");
        assert_eq!(ctx.vfs.read_to_string("/etc/hostname").unwrap(), "other\n");
    }
}
