//! Test helpers for tool unit tests.

use crate::interpreter::ExecResult;
use crate::vfs::{seed_standard_tree, Credentials, SeedProfile, Vfs};

use super::{ExecContext, Tool, ToolArgs};

/// A context over a small tree: `/home/user` (cwd) holding `notes.txt` and
/// `docs/readme.md`, plus `/tmp`.
pub fn make_ctx() -> ExecContext {
    let mut vfs = Vfs::new();
    vfs.mkdir("/home/user/docs", true).unwrap();
    vfs.mkdir("/tmp", false).unwrap();
    vfs.mkdir("/etc", false).unwrap();
    vfs.write(
        "/etc/passwd",
        b"root:x:0:0:root:/root:/bin/bash\nuser:x:1000:1000:user:/home/user:/bin/bash\n",
        false,
    )
    .unwrap();
    vfs.write("/etc/group", b"root:x:0:\nuser:x:1000:\n", false).unwrap();
    vfs.set_credentials(Credentials::new("user", "user"));
    vfs.chown("/home/user", Some("user"), Some("user")).unwrap();
    vfs.chown("/home/user/docs", Some("user"), Some("user")).unwrap();
    vfs.write("/home/user/notes.txt", b"one\ntwo\nthree\n", false).unwrap();
    vfs.write("/home/user/docs/readme.md", b"# Readme\n", false).unwrap();

    let mut ctx = ExecContext::new(vfs);
    ctx.scope.export("HOME", "/home/user");
    ctx.scope.export("USER", "user");
    ctx.scope.export("PATH", "/usr/local/bin:/usr/bin:/bin");
    ctx.user = "user".to_string();
    ctx.hostname = "termsim".to_string();
    ctx.set_cwd("/home/user".to_string());
    ctx
}

/// A context over the full seeded tree.
pub fn make_seeded_ctx() -> ExecContext {
    let mut vfs = Vfs::new();
    seed_standard_tree(
        &mut vfs,
        &SeedProfile {
            user: "user",
            home: "/home/user",
            hostname: "termsim",
        },
    )
    .unwrap();
    vfs.set_credentials(Credentials::new("user", "user"));
    let mut ctx = ExecContext::new(vfs);
    ctx.scope.export("HOME", "/home/user");
    ctx.scope.export("PATH", "/usr/local/bin:/usr/bin:/bin");
    ctx.user = "user".to_string();
    ctx.hostname = "termsim".to_string();
    ctx.set_cwd("/home/user".to_string());
    ctx
}

/// Parse `argv` against the tool's schema and run it.
pub async fn run_tool(tool: &dyn Tool, ctx: &mut ExecContext, argv: &[&str]) -> ExecResult {
    let argv = argv.iter().map(|s| s.to_string()).collect();
    let args = ToolArgs::parse(&tool.schema(), argv);
    tool.execute(args, ctx).await
}

/// Like [`run_tool`], with `stdin` as piped input.
pub async fn run_piped(tool: &dyn Tool, ctx: &mut ExecContext, argv: &[&str], stdin: &str) -> ExecResult {
    ctx.set_stdin(stdin.to_string());
    run_tool(tool, ctx, argv).await
}
