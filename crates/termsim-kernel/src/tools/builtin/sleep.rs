//! sleep — Delay for a specified amount of time.

use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

use super::missing_operand;

/// How often a sleeping command looks at the interrupt flag.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Status of a command stopped by Ctrl-C.
pub(crate) const INTERRUPTED: i64 = 130;

/// Sleep tool. Arguments add up; each may carry an s/m/h/d suffix.
pub struct Sleep;

#[async_trait]
impl Tool for Sleep {
    fn name(&self) -> &str {
        "sleep"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("sleep", "Delay for a specified amount of time")
            .example("Wait a second and a half", "sleep 1.5")
            .example("Wait two minutes", "sleep 2m")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("sleep");
        }

        let mut total = Duration::ZERO;
        for operand in &args.positional {
            match parse_interval(operand) {
                Some(interval) => total = total.saturating_add(interval),
                None => {
                    return ExecResult::failure(
                        1,
                        format!("sleep: invalid time interval '{operand}'\nTry 'sleep --help' for more information."),
                    )
                }
            }
        }

        let deadline = Instant::now() + total;
        loop {
            if ctx.interrupt.is_set() {
                tracing::debug!("sleep interrupted");
                return ExecResult::from_output(INTERRUPTED, "", "");
            }
            let now = Instant::now();
            if now >= deadline {
                return ExecResult::success("");
            }
            tokio::time::sleep((deadline - now).min(POLL_INTERVAL)).await;
        }
    }
}

fn parse_interval(text: &str) -> Option<Duration> {
    let (number, scale) = match text.char_indices().last()? {
        (i, 's') => (&text[..i], 1.0),
        (i, 'm') => (&text[..i], 60.0),
        (i, 'h') => (&text[..i], 3600.0),
        (i, 'd') => (&text[..i], 86_400.0),
        _ => (text, 1.0),
    };
    let value: f64 = number.parse().ok()?;
    if !value.is_finite() || value < 0.0 {
        return None;
    }
    Duration::try_from_secs_f64(value * scale).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};
    use rstest::rstest;

    #[rstest]
    #[case("1", Some(1000))]
    #[case("0.25", Some(250))]
    #[case("2m", Some(120_000))]
    #[case("1h", Some(3_600_000))]
    #[case("abc", None)]
    #[case("-1", None)]
    #[case("5x", None)]
    fn intervals(#[case] text: &str, #[case] millis: Option<u64>) {
        assert_eq!(parse_interval(text), millis.map(Duration::from_millis));
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_for_the_sum() {
        let mut ctx = make_ctx();
        let started = Instant::now();
        let result = run_tool(&Sleep, &mut ctx, &["1", "0.5"]).await;
        assert!(result.ok());
        assert!(started.elapsed() >= Duration::from_millis(1500));
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_stops_early() {
        let mut ctx = make_ctx();
        let handle = ctx.interrupt.clone();
        let started = Instant::now();

        let (result, ()) = tokio::join!(run_tool(&Sleep, &mut ctx, &["60"]), async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            handle.interrupt();
        });

        assert_eq!(result.code, INTERRUPTED);
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn bad_operands() {
        let mut ctx = make_ctx();
        let result = run_tool(&Sleep, &mut ctx, &[]).await;
        assert!(result.err.starts_with("sleep: missing operand"));

        let result = run_tool(&Sleep, &mut ctx, &["soon"]).await;
        assert!(result.err.starts_with("sleep: invalid time interval 'soon'"));
    }
}
