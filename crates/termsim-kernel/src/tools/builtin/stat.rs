//! stat — Display file status.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::{FileKind, Metadata};

use super::{blocks_1k, lookup_id, missing_operand};

/// Stat tool: show inode metadata in GNU layout.
pub struct Stat;

#[async_trait]
impl Tool for Stat {
    fn name(&self) -> &str {
        "stat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("stat", "Display file or file system status")
            .param(ParamSchema::flag("dereference", "Follow links").with_aliases(["-L"]))
            .param(
                ParamSchema::option("format", "Use the specified FORMAT instead of the default")
                    .with_aliases(["-c"]),
            )
            .example("Show a file's metadata", "stat notes.txt")
            .example("Print size and name", "stat -c '%s %n' notes.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("stat");
        }

        let mut out = String::new();
        let mut err = String::new();
        for name in &args.positional {
            let resolved = ctx.resolve_path(name);
            let meta = if args.has_flag("dereference") {
                ctx.vfs.stat(&resolved)
            } else {
                ctx.vfs.lstat(&resolved)
            };
            let meta = match meta {
                Ok(meta) => meta,
                Err(e) => {
                    err.push_str(&format!("stat: cannot statx '{name}': {}\n", e.reason()));
                    continue;
                }
            };
            let uid = lookup_id(ctx, "/etc/passwd", &meta.owner).unwrap_or(0);
            let gid = lookup_id(ctx, "/etc/group", &meta.group).unwrap_or(0);
            let ids = Ids { uid, gid };

            match args.get_named("format") {
                Some(format) => {
                    out.push_str(&custom(format, name, &meta, &ids));
                    out.push('\n');
                }
                None => out.push_str(&standard(name, &meta, &ids)),
            }
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

struct Ids {
    uid: u32,
    gid: u32,
}

fn standard(name: &str, meta: &Metadata, ids: &Ids) -> String {
    let shown = match &meta.target {
        Some(target) => format!("{name} -> {target}"),
        None => name.to_string(),
    };
    let kind = meta.kind.describe(meta.device.map(|d| d.0));
    let device_line = match meta.device {
        Some((_, major, minor)) => format!(
            "Device: 5h/5d\tInode: {:<11} Links: {:<5} Device type: {major},{minor}",
            meta.ino, meta.nlink
        ),
        None => format!("Device: 801h/2049d\tInode: {:<11} Links: {}", meta.ino, meta.nlink),
    };
    let blocks = if meta.kind == FileKind::File {
        blocks_1k(meta.size) * 2
    } else if meta.is_dir() {
        8
    } else {
        0
    };

    format!(
        "  File: {shown}\n  Size: {:<15} Blocks: {:<10} IO Block: 4096   {kind}\n{device_line}\n\
         Access: ({:04o}/{})  Uid: ({:>5}/{:>8})   Gid: ({:>5}/{:>8})\n\
         Access: {}\nModify: {}\nChange: {}\n Birth: {}\n",
        meta.size,
        blocks,
        meta.mode,
        meta.mode_string(),
        ids.uid,
        meta.owner,
        ids.gid,
        meta.group,
        timestamp(&meta.accessed),
        timestamp(&meta.modified),
        timestamp(&meta.modified),
        timestamp(&meta.created),
    )
}

fn timestamp(time: &DateTime<Utc>) -> String {
    time.format("%Y-%m-%d %H:%M:%S%.9f %z").to_string()
}

/// Expand a `-c` format string.
fn custom(format: &str, name: &str, meta: &Metadata, ids: &Ids) -> String {
    let mut out = String::new();
    let mut chars = format.chars();
    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push_str(name),
            Some('N') => match &meta.target {
                Some(target) => out.push_str(&format!("'{name}' -> '{target}'")),
                None => out.push_str(&format!("'{name}'")),
            },
            Some('s') => out.push_str(&meta.size.to_string()),
            Some('a') => out.push_str(&format!("{:o}", meta.mode)),
            Some('A') => out.push_str(&meta.mode_string()),
            Some('F') => out.push_str(meta.kind.describe(meta.device.map(|d| d.0))),
            Some('i') => out.push_str(&meta.ino.to_string()),
            Some('h') => out.push_str(&meta.nlink.to_string()),
            Some('U') => out.push_str(&meta.owner),
            Some('G') => out.push_str(&meta.group),
            Some('u') => out.push_str(&ids.uid.to_string()),
            Some('g') => out.push_str(&ids.gid.to_string()),
            Some('y') => out.push_str(&timestamp(&meta.modified)),
            Some('Y') => out.push_str(&meta.modified.timestamp().to_string()),
            Some('%') => out.push('%'),
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn standard_layout() {
        let mut ctx = make_ctx();
        let result = run_tool(&Stat, &mut ctx, &["notes.txt"]).await;
        assert!(result.ok());
        let lines: Vec<&str> = result.out.lines().collect();
        assert_eq!(lines[0], "  File: notes.txt");
        assert!(lines[1].starts_with("  Size: 14 "));
        assert!(lines[1].ends_with("regular file"));
        assert!(lines[3].starts_with("Access: (0644/-rw-r--r--)  Uid: ( 1000/    user)"));
        assert_eq!(lines.len(), 8);
    }

    #[tokio::test]
    async fn symlink_shows_target() {
        let mut ctx = make_ctx();
        ctx.vfs.symlink("notes.txt", "/home/user/n").unwrap();
        let result = run_tool(&Stat, &mut ctx, &["n"]).await;
        assert!(result.out.starts_with("  File: n -> notes.txt\n"));
        assert!(result.out.contains("symbolic link"));

        let followed = run_tool(&Stat, &mut ctx, &["-L", "n"]).await;
        assert!(followed.out.contains("regular file"));
    }

    #[tokio::test]
    async fn format_option() {
        let mut ctx = make_ctx();
        let result = run_tool(&Stat, &mut ctx, &["-c", "%n %s %a %U:%G %F", "notes.txt", "docs"]).await;
        assert_eq!(
            result.out,
            "notes.txt 14 644 user:user regular file\ndocs 4096 755 user:user directory\n"
        );
    }

    #[tokio::test]
    async fn missing_file() {
        let mut ctx = make_ctx();
        let result = run_tool(&Stat, &mut ctx, &["ghost"]).await;
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "stat: cannot statx 'ghost': No such file or directory\n");
    }
}
