//! du, df — Disk usage of the virtual filesystem.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::{blocks_1k, display_join, human_size};

/// Capacity the simulated root filesystem reports, in 1K blocks.
const DISK_BLOCKS: u64 = 50 * 1024 * 1024;

/// Du tool: estimate space used under each path.
pub struct Du;

#[async_trait]
impl Tool for Du {
    fn name(&self) -> &str {
        "du"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("du", "Estimate file space usage")
            .param(
                ParamSchema::flag("summarize", "Display only a total for each argument")
                    .with_aliases(["-s"]),
            )
            .param(
                ParamSchema::flag("human-readable", "Print sizes like 1K 234M 2G")
                    .with_aliases(["-h"]),
            )
            .param(ParamSchema::flag("total", "Produce a grand total").with_aliases(["-c"]))
            .param(ParamSchema::flag("all", "Write counts for all files, not just directories").with_aliases(["-a"]))
            .example("Size of the home directory", "du -sh ~")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let targets = if args.positional.is_empty() {
            vec![".".to_string()]
        } else {
            args.positional.clone()
        };
        let opts = DuOptions {
            summarize: args.has_flag("summarize"),
            human: args.has_flag("human-readable"),
            all: args.has_flag("all"),
        };

        let mut out = String::new();
        let mut err = String::new();
        let mut grand = 0;
        for target in &targets {
            let resolved = ctx.resolve_path(target);
            if let Err(e) = ctx.vfs.lstat(&resolved) {
                err.push_str(&format!("du: cannot access '{target}': {}\n", e.reason()));
                continue;
            }
            let mut lines = Vec::new();
            let total = measure(ctx, &resolved, target, &opts, 0, &mut lines);
            if opts.summarize {
                lines.clear();
                lines.push((total, target.clone()));
            }
            for (blocks, shown) in lines {
                out.push_str(&format!("{}\t{shown}\n", opts.size(blocks)));
            }
            grand += total;
        }
        if args.has_flag("total") {
            out.push_str(&format!("{}\ttotal\n", opts.size(grand)));
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

struct DuOptions {
    summarize: bool,
    human: bool,
    all: bool,
}

impl DuOptions {
    fn size(&self, blocks: u64) -> String {
        if self.human {
            human_size(blocks * 1024)
        } else {
            blocks.to_string()
        }
    }
}

/// Blocks used under `dir`, pushing a line per directory (and per file with
/// `-a`) in post-order.
fn measure(
    ctx: &ExecContext,
    abs: &str,
    shown: &str,
    opts: &DuOptions,
    depth: usize,
    lines: &mut Vec<(u64, String)>,
) -> u64 {
    let Ok(meta) = ctx.vfs.lstat(abs) else {
        return 0;
    };
    if !meta.is_dir() {
        let blocks = if meta.is_file() { blocks_1k(meta.size) } else { 0 };
        if opts.all || depth == 0 {
            lines.push((blocks, shown.to_string()));
        }
        return blocks;
    }

    let mut total = 4;
    if let Ok(entries) = ctx.vfs.list(abs) {
        for entry in entries {
            total += measure(
                ctx,
                &path::join(abs, &entry.name),
                &display_join(shown, &entry.name),
                opts,
                depth + 1,
                lines,
            );
        }
    }
    lines.push((total, shown.to_string()));
    total
}

/// Df tool: report filesystem space.
pub struct Df;

#[async_trait]
impl Tool for Df {
    fn name(&self) -> &str {
        "df"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("df", "Report file system disk space usage").param(
            ParamSchema::flag("human-readable", "Print sizes in powers of 1024")
                .with_aliases(["-h"]),
        )
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut lines = Vec::new();
        let used = measure(
            ctx,
            "/",
            "/",
            &DuOptions {
                summarize: true,
                human: false,
                all: false,
            },
            0,
            &mut lines,
        );
        let available = DISK_BLOCKS.saturating_sub(used);
        let percent = (used * 100).div_ceil(DISK_BLOCKS);

        let out = if args.has_flag("human-readable") {
            format!(
                "Filesystem      Size  Used Avail Use% Mounted on\n{:<15} {:>4} {:>5} {:>5} {:>3}% /\n",
                "termsim",
                human_size(DISK_BLOCKS * 1024),
                human_size(used * 1024),
                human_size(available * 1024),
                percent
            )
        } else {
            format!(
                "Filesystem     1K-blocks    Used Available Use% Mounted on\n{:<14} {:>9} {:>7} {:>9} {:>3}% /\n",
                "termsim", DISK_BLOCKS, used, available, percent
            )
        };
        ExecResult::success(out)
    }
}
