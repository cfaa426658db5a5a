//! date — Print the system date and time.
//!
//! The simulated machine keeps UTC, so `-u` changes nothing but is accepted.

use std::fmt::Write;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

const DEFAULT_FORMAT: &str = "%a %b %e %H:%M:%S %Z %Y";

/// Date tool: format the current (or a given) time.
pub struct Date;

#[async_trait]
impl Tool for Date {
    fn name(&self) -> &str {
        "date"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("date", "Print the system date and time")
            .param(ParamSchema::option("date", "Display time described by STRING, not 'now'").with_aliases(["-d"]))
            .param(ParamSchema::flag("utc", "Print Coordinated Universal Time").with_aliases(["-u"]))
            .param(ParamSchema::flag("iso-8601", "Output date in ISO 8601 format").with_aliases(["-I"]))
            .param(ParamSchema::flag("rfc-email", "Output date in RFC 5322 format").with_aliases(["-R"]))
            .example("Current time", "date")
            .example("Custom format", "date +%Y-%m-%d")
            .example("From a timestamp", "date -d @0")
    }

    async fn execute(&self, args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        let time = match args.get_named("date") {
            Some(text) => match parse_date(text) {
                Some(time) => time,
                None => return ExecResult::failure(1, format!("date: invalid date '{text}'")),
            },
            None => Utc::now(),
        };

        let mut format = if args.has_flag("iso-8601") {
            "%Y-%m-%d"
        } else if args.has_flag("rfc-email") {
            "%a, %d %b %Y %H:%M:%S %z"
        } else {
            DEFAULT_FORMAT
        };
        for operand in &args.positional {
            match operand.strip_prefix('+') {
                Some(custom) if format == DEFAULT_FORMAT => format = custom,
                _ => {
                    return ExecResult::failure(
                        1,
                        format!("date: extra operand '{operand}'\nTry 'date --help' for more information."),
                    )
                }
            }
        }

        let mut out = String::new();
        if write!(out, "{}", time.format(format)).is_err() {
            return ExecResult::failure(1, format!("date: invalid format '{format}'"));
        }
        out.push('\n');
        ExecResult::success(out)
    }
}

/// `now`, `@SECONDS`, RFC 3339, `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DD`.
fn parse_date(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    if text.is_empty() || text == "now" {
        return Some(Utc::now());
    }
    if let Some(secs) = text.strip_prefix('@') {
        return DateTime::from_timestamp(secs.parse().ok()?, 0);
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(text) {
        return Some(time.with_timezone(&Utc));
    }
    for layout in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, layout) {
            return Some(naive.and_utc());
        }
    }
    let day = NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?;
    Some(day.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};
    use rstest::rstest;

    #[tokio::test]
    async fn default_layout() {
        let mut ctx = make_ctx();
        let result = run_tool(&Date, &mut ctx, &["-d", "@0"]).await;
        assert_eq!(result.out, "Thu Jan  1 00:00:00 UTC 1970\n");
    }

    #[rstest]
    #[case(&["-d", "2024-02-29 13:05:09", "+%Y/%m/%d %T"], "2024/02/29 13:05:09\n")]
    #[case(&["-d", "2024-02-29", "-I"], "2024-02-29\n")]
    #[case(&["-u", "-d", "@86400", "+%s"], "86400\n")]
    #[case(&["-d", "@0", "-R"], "Thu, 01 Jan 1970 00:00:00 +0000\n")]
    #[tokio::test]
    async fn formats(#[case] argv: &[&str], #[case] expected: &str) {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Date, &mut ctx, argv).await.out, expected);
    }

    #[tokio::test]
    async fn bad_inputs() {
        let mut ctx = make_ctx();
        let result = run_tool(&Date, &mut ctx, &["-d", "yesterday-ish"]).await;
        assert_eq!(result.err, "date: invalid date 'yesterday-ish'");

        let result = run_tool(&Date, &mut ctx, &["tomorrow"]).await;
        assert_eq!(result.code, 1);
        assert!(result.err.starts_with("date: extra operand 'tomorrow'"));
    }

    #[tokio::test]
    async fn invalid_specifier_does_not_panic() {
        let mut ctx = make_ctx();
        let result = run_tool(&Date, &mut ctx, &["+%Q"]).await;
        assert_eq!(result.code, 1);
    }
}
