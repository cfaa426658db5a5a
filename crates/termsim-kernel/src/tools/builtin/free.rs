//! free — Display amount of free and used memory, read from `/proc/meminfo`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Free tool.
pub struct Free;

#[async_trait]
impl Tool for Free {
    fn name(&self) -> &str {
        "free"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("free", "Display amount of free and used memory in the system")
            .param(ParamSchema::flag("bytes", "Show output in bytes").with_aliases(["-b"]))
            .param(ParamSchema::flag("kibi", "Show output in kibibytes").with_aliases(["-k"]))
            .param(ParamSchema::flag("mebi", "Show output in mebibytes").with_aliases(["-m"]))
            .param(ParamSchema::flag("gibi", "Show output in gibibytes").with_aliases(["-g"]))
            .param(ParamSchema::flag("human", "Show human-readable output").with_aliases(["-h"]))
            .param(ParamSchema::flag("total", "Show total for RAM + swap").with_aliases(["-t"]))
            .example("Human-readable sizes", "free -h")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let info = match meminfo(ctx) {
            Ok(info) => info,
            Err(reason) => return ExecResult::failure(1, format!("free: /proc/meminfo: {reason}")),
        };
        let field = |name: &str| info.get(name).copied().unwrap_or(0);

        let total = field("MemTotal");
        let free = field("MemFree");
        let cache = field("Buffers") + field("Cached") + field("SReclaimable");
        let used = total.saturating_sub(free + cache);
        let available = info.get("MemAvailable").copied().unwrap_or(free + cache);
        let swap_total = field("SwapTotal");
        let swap_free = field("SwapFree");
        let swap_used = swap_total.saturating_sub(swap_free);

        let unit = if args.has_flag("human") {
            Unit::Human
        } else if args.has_flag("bytes") {
            Unit::Bytes
        } else if args.has_flag("mebi") {
            Unit::Mebi
        } else if args.has_flag("gibi") {
            Unit::Gibi
        } else {
            Unit::Kibi
        };

        let mut out = row("", ["total", "used", "free", "shared", "buff/cache", "available"].map(String::from).to_vec());
        out.push_str(&row(
            "Mem:",
            [total, used, free, field("Shmem"), cache, available]
                .iter()
                .map(|kb| unit.show(*kb))
                .collect(),
        ));
        out.push_str(&row(
            "Swap:",
            [swap_total, swap_used, swap_free].iter().map(|kb| unit.show(*kb)).collect(),
        ));
        if args.has_flag("total") {
            out.push_str(&row(
                "Total:",
                [total + swap_total, used + swap_used, free + swap_free]
                    .iter()
                    .map(|kb| unit.show(*kb))
                    .collect(),
            ));
        }
        ExecResult::success(out)
    }
}

/// `/proc/meminfo` as kB values by field name.
pub(crate) fn meminfo(ctx: &mut ExecContext) -> Result<HashMap<String, u64>, String> {
    let text = ctx
        .vfs
        .read_to_string("/proc/meminfo")
        .map_err(|e| e.reason().to_string())?;
    Ok(text
        .lines()
        .filter_map(|line| {
            let (name, rest) = line.split_once(':')?;
            let kb = rest.split_whitespace().next()?.parse().ok()?;
            Some((name.trim().to_string(), kb))
        })
        .collect())
}

fn row(label: &str, cells: Vec<String>) -> String {
    let mut line = format!("{label:<8}");
    for cell in cells {
        line.push_str(&format!("{cell:>12}"));
    }
    line.push('\n');
    line
}

#[derive(Debug, Clone, Copy)]
enum Unit {
    Bytes,
    Kibi,
    Mebi,
    Gibi,
    Human,
}

impl Unit {
    fn show(self, kb: u64) -> String {
        match self {
            Unit::Bytes => (kb * 1024).to_string(),
            Unit::Kibi => kb.to_string(),
            Unit::Mebi => (kb / 1024).to_string(),
            Unit::Gibi => (kb / (1024 * 1024)).to_string(),
            Unit::Human => human_binary(kb * 1024),
        }
    }
}

/// `0B`, `512Ki`, `1.5Gi`
fn human_binary(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Ki", "Mi", "Gi", "Ti"];
    if bytes < 1024 {
        return format!("{bytes}B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if value < 10.0 {
        format!("{value:.1}{}", UNITS[unit])
    } else {
        format!("{}{}", value.round() as u64, UNITS[unit])
    }
}
