//! uptime — Tell how long the session has been running.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Uptime tool. The "system" booted when the session started.
pub struct Uptime;

#[async_trait]
impl Tool for Uptime {
    fn name(&self) -> &str {
        "uptime"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("uptime", "Tell how long the system has been running")
            .param(ParamSchema::flag("pretty", "Show uptime in pretty format").with_aliases(["-p"]))
            .param(ParamSchema::flag("since", "System up since").with_aliases(["-s"]))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let secs = ctx.elapsed_secs();
        if args.has_flag("since") {
            let booted = Utc::now() - Duration::seconds(secs as i64);
            return ExecResult::success(format!("{}\n", booted.format("%Y-%m-%d %H:%M:%S")));
        }
        if args.has_flag("pretty") {
            return ExecResult::success(format!("{}\n", pretty(secs)));
        }

        let load = ctx
            .vfs
            .read_to_string("/proc/loadavg")
            .ok()
            .map(|text| text.split_whitespace().take(3).collect::<Vec<_>>().join(", "))
            .filter(|load| !load.is_empty())
            .unwrap_or_else(|| "0.00, 0.00, 0.00".to_string());

        ExecResult::success(format!(
            " {} up {},  1 user,  load average: {}\n",
            Utc::now().format("%H:%M:%S"),
            clock(secs),
            load
        ))
    }
}

/// `5 min`, `1:05`, `2 days,  3:10` as in the classic one-line report.
fn clock(secs: u64) -> String {
    let days = secs / 86_400;
    let hours = secs % 86_400 / 3600;
    let minutes = secs % 3600 / 60;
    let time = if hours == 0 {
        format!("{minutes} min")
    } else {
        format!("{hours:>2}:{minutes:02}")
    };
    match days {
        0 => time,
        1 => format!("1 day, {time}"),
        n => format!("{n} days, {time}"),
    }
}

/// `up 1 hour, 5 minutes`
fn pretty(secs: u64) -> String {
    let parts: Vec<String> = [
        (secs / 86_400, "day"),
        (secs % 86_400 / 3600, "hour"),
        (secs % 3600 / 60, "minute"),
    ]
    .into_iter()
    .filter(|(n, _)| *n > 0)
    .map(|(n, unit)| format!("{n} {unit}{}", if n == 1 { "" } else { "s" }))
    .collect();

    if parts.is_empty() {
        "up 0 minutes".to_string()
    } else {
        format!("up {}", parts.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_seeded_ctx, run_tool};
    use rstest::rstest;

    #[rstest]
    #[case(0, "0 min")]
    #[case(300, "5 min")]
    #[case(3900, " 1:05")]
    #[case(86_400 + 600, "1 day, 10 min")]
    #[case(3 * 86_400 + 7200, "3 days,  2:00")]
    fn clock_layout(#[case] secs: u64, #[case] expected: &str) {
        assert_eq!(clock(secs), expected);
    }

    #[rstest]
    #[case(0, "up 0 minutes")]
    #[case(60, "up 1 minute")]
    #[case(3900, "up 1 hour, 5 minutes")]
    #[case(2 * 86_400, "up 2 days")]
    fn pretty_layout(#[case] secs: u64, #[case] expected: &str) {
        assert_eq!(pretty(secs), expected);
    }

    #[tokio::test]
    async fn reports_load_average() {
        let mut ctx = make_seeded_ctx();
        let out = run_tool(&Uptime, &mut ctx, &[]).await.out;
        assert!(out.contains(" up 0 min,  1 user,  load average: 0.08, 0.03, 0.01\n"), "{out}");
    }
}
