//! ls — List directory contents.

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, OutputContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::{path, DirEntry, FileKind, Metadata};

use super::{blocks_1k, human_size};

/// Ls tool: list directory contents.
pub struct Ls;

#[derive(Debug, Clone, Copy, Default)]
struct Options {
    long: bool,
    all: bool,
    almost_all: bool,
    one: bool,
    human: bool,
    sort_time: bool,
    sort_size: bool,
    reverse: bool,
    directory: bool,
    classify: bool,
}

impl Options {
    fn from_args(args: &ToolArgs, output: OutputContext) -> Self {
        Self {
            long: args.has_flag("long"),
            all: args.has_flag("all"),
            almost_all: args.has_flag("almost-all"),
            one: args.has_flag("one") || output == OutputContext::Piped,
            human: args.has_flag("human-readable"),
            sort_time: args.has_flag("time"),
            sort_size: args.has_flag("size"),
            reverse: args.has_flag("reverse"),
            directory: args.has_flag("directory"),
            classify: args.has_flag("classify"),
        }
    }
}

#[async_trait]
impl Tool for Ls {
    fn name(&self) -> &str {
        "ls"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ls", "List directory contents")
            .param(ParamSchema::flag("long", "Use long listing format").with_aliases(["-l"]))
            .param(ParamSchema::flag("all", "Show entries starting with .").with_aliases(["-a"]))
            .param(
                ParamSchema::flag("almost-all", "Like -a, without . and ..").with_aliases(["-A"]),
            )
            .param(ParamSchema::flag("one", "One entry per line").with_aliases(["-1"]))
            .param(
                ParamSchema::flag("human-readable", "Sizes like 1K 234M 2G").with_aliases(["-h"]),
            )
            .param(ParamSchema::flag("time", "Sort by modification time, newest first").with_aliases(["-t"]))
            .param(ParamSchema::flag("size", "Sort by file size, largest first").with_aliases(["-S"]))
            .param(ParamSchema::flag("reverse", "Reverse sort order").with_aliases(["-r"]))
            .param(
                ParamSchema::flag("directory", "List directories themselves, not their contents")
                    .with_aliases(["-d"]),
            )
            .param(
                ParamSchema::flag("classify", "Append indicator (one of */@) to entries")
                    .with_aliases(["-F"]),
            )
            .example("List current directory", "ls")
            .example("Show hidden files with details", "ls -la /etc")
            .example("Sort by size, largest first", "ls -lS")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let opts = Options::from_args(&args, ctx.output);
        let targets: Vec<String> = if args.positional.is_empty() {
            vec![".".to_string()]
        } else {
            args.positional.clone()
        };

        let mut out = String::new();
        let mut err = String::new();
        let mut code = 0;
        let mut files: Vec<DirEntry> = Vec::new();
        let mut dirs: Vec<(String, String)> = Vec::new();

        for target in &targets {
            let resolved = ctx.resolve_path(target);
            let lstat = ctx.vfs.lstat(&resolved);
            let Ok(lmeta) = lstat else {
                err.push_str(&format!(
                    "ls: cannot access '{target}': No such file or directory\n"
                ));
                code = 2;
                continue;
            };
            // `ls link` lists the directory a symlink points to, `ls -l link` the link
            let follows = !opts.long || target.ends_with('/');
            let meta = match ctx.vfs.stat(&resolved) {
                Ok(meta) if follows => meta,
                _ => lmeta,
            };
            if meta.is_dir() && !opts.directory {
                dirs.push((target.clone(), resolved));
            } else {
                files.push(DirEntry {
                    name: target.clone(),
                    meta,
                });
            }
        }

        sort_entries(&mut files, &opts);
        let headers = targets.len() > 1;
        if !files.is_empty() {
            out.push_str(&render(&files, &opts, false));
        }

        for (i, (shown, resolved)) in dirs.iter().enumerate() {
            let entries = match list_dir(ctx, resolved, &opts) {
                Ok(entries) => entries,
                Err(reason) => {
                    err.push_str(&format!("ls: cannot open directory '{shown}': {reason}\n"));
                    code = 2;
                    continue;
                }
            };
            if headers {
                if i > 0 || !files.is_empty() {
                    out.push('\n');
                }
                out.push_str(&format!("{shown}:\n"));
            }
            out.push_str(&render(&entries, &opts, true));
        }

        ExecResult::from_output(code, out, err.trim_end().to_string())
    }
}

fn list_dir(ctx: &ExecContext, dir: &str, opts: &Options) -> Result<Vec<DirEntry>, String> {
    let mut entries: Vec<DirEntry> = ctx
        .vfs
        .list(dir)
        .map_err(|e| e.reason().to_string())?
        .into_iter()
        .filter(|e| opts.all || opts.almost_all || !e.name.starts_with('.'))
        .collect();

    if opts.all {
        for (name, target) in [(".", dir.to_string()), ("..", path::dirname(dir).to_string())] {
            if let Ok(meta) = ctx.vfs.stat(&target) {
                entries.push(DirEntry {
                    name: name.to_string(),
                    meta,
                });
            }
        }
    }
    sort_entries(&mut entries, opts);
    Ok(entries)
}

fn sort_entries(entries: &mut [DirEntry], opts: &Options) {
    entries.sort_by(|a, b| {
        let cmp = if opts.sort_time {
            b.meta.modified.cmp(&a.meta.modified).then_with(|| by_name(a, b))
        } else if opts.sort_size {
            b.meta.size.cmp(&a.meta.size).then_with(|| by_name(a, b))
        } else {
            by_name(a, b)
        };
        if opts.reverse {
            cmp.reverse()
        } else {
            cmp
        }
    });
}

/// Dot entries first, then by name ignoring a leading dot and case.
fn by_name(a: &DirEntry, b: &DirEntry) -> Ordering {
    let rank = |e: &DirEntry| match e.name.as_str() {
        "." => 0,
        ".." => 1,
        _ => 2,
    };
    let key = |e: &DirEntry| e.name.trim_start_matches('.').to_lowercase();
    rank(a)
        .cmp(&rank(b))
        .then_with(|| key(a).cmp(&key(b)))
        .then_with(|| a.name.cmp(&b.name))
}

fn render(entries: &[DirEntry], opts: &Options, in_dir: bool) -> String {
    if opts.long {
        return render_long(entries, opts, in_dir);
    }
    let names: Vec<String> = entries.iter().map(|e| decorated(e, opts)).collect();
    if names.is_empty() {
        return String::new();
    }
    let sep = if opts.one { "\n" } else { "  " };
    format!("{}\n", names.join(sep))
}

fn decorated(entry: &DirEntry, opts: &Options) -> String {
    if !opts.classify {
        return entry.name.clone();
    }
    let suffix = match entry.meta.kind {
        FileKind::Directory => "/",
        FileKind::Symlink => "@",
        FileKind::File if entry.meta.mode & 0o111 != 0 => "*",
        _ => "",
    };
    format!("{}{suffix}", entry.name)
}

fn size_column(meta: &Metadata, human: bool) -> String {
    if let Some((_, major, minor)) = meta.device {
        return format!("{major}, {minor}");
    }
    if human {
        human_size(meta.size)
    } else {
        meta.size.to_string()
    }
}

fn render_long(entries: &[DirEntry], opts: &Options, total: bool) -> String {
    let rows: Vec<[String; 6]> = entries
        .iter()
        .map(|e| {
            let m = &e.meta;
            let mut name = decorated(e, opts);
            if let Some(target) = &m.target {
                name.push_str(" -> ");
                name.push_str(target);
            }
            [
                m.mode_string(),
                m.nlink.to_string(),
                m.owner.clone(),
                m.group.clone(),
                size_column(m, opts.human),
                format!("{} {name}", format_mtime(m)),
            ]
        })
        .collect();

    let width = |col: usize| rows.iter().map(|r| r[col].len()).max().unwrap_or(0);
    let (w1, w2, w3, w4) = (width(1), width(2), width(3), width(4));

    let mut out = String::new();
    if total {
        let blocks: u64 = entries
            .iter()
            .filter(|e| e.name != "." && e.name != "..")
            .map(|e| match e.meta.kind {
                FileKind::File | FileKind::Directory => blocks_1k(e.meta.size),
                _ => 0,
            })
            .sum();
        let shown = if opts.human {
            human_size(blocks * 1024)
        } else {
            blocks.to_string()
        };
        out.push_str(&format!("total {shown}\n"));
    }
    for row in rows {
        out.push_str(&format!(
            "{} {:>w1$} {:<w2$} {:<w3$} {:>w4$} {}\n",
            row[0], row[1], row[2], row[3], row[4], row[5]
        ));
    }
    out
}

/// `Mon dd HH:MM` for recent files, `Mon dd  yyyy` for old ones.
fn format_mtime(meta: &Metadata) -> String {
    let now = chrono::Utc::now();
    let age = now.signed_duration_since(meta.modified);
    if age.num_days() > 182 || age.num_seconds() < 0 {
        meta.modified.format("%b %e  %Y").to_string()
    } else {
        meta.modified.format("%b %e %H:%M").to_string()
    }
}
