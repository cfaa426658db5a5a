//! seq — Print a sequence of numbers.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

use super::missing_operand;

/// Most numbers one invocation may print.
const MAX_NUMBERS: u64 = 100_000;

/// Seq tool: print numbers from FIRST to LAST by INCREMENT.
pub struct Seq;

#[async_trait]
impl Tool for Seq {
    fn name(&self) -> &str {
        "seq"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("seq", "Print a sequence of numbers")
            .param(
                ParamSchema::option("separator", "Use STRING to separate numbers (default: \\n)")
                    .with_aliases(["-s"]),
            )
            .param(
                ParamSchema::flag("equal-width", "Equalize width by padding with leading zeroes")
                    .with_aliases(["-w"]),
            )
            .example("Count to five", "seq 5")
            .example("Even numbers", "seq 0 2 10")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let operands = &args.positional;
        let (first, step, last) = match operands.as_slice() {
            [] => return missing_operand("seq"),
            [last] => ("1", "1", last.as_str()),
            [first, last] => (first.as_str(), "1", last.as_str()),
            [first, step, last] => (first.as_str(), step.as_str(), last.as_str()),
            [_, _, _, extra, ..] => {
                return ExecResult::failure(
                    1,
                    format!("seq: extra operand '{extra}'\nTry 'seq --help' for more information."),
                )
            }
        };

        let mut values = [0.0f64; 3];
        for (slot, text) in values.iter_mut().zip([first, step, last]) {
            *slot = match text.parse::<f64>() {
                Ok(v) if v.is_finite() => v,
                _ => {
                    return ExecResult::failure(
                        1,
                        format!("seq: invalid floating point argument: '{text}'\nTry 'seq --help' for more information."),
                    )
                }
            };
        }
        let [start, increment, end] = values;
        if increment == 0.0 {
            return ExecResult::failure(
                1,
                format!("seq: invalid Zero increment value: '{step}'\nTry 'seq --help' for more information."),
            );
        }

        let count = ((end - start) / increment + 1e-9).floor() + 1.0;
        let count = if count > 0.0 { count } else { 0.0 };
        if count > MAX_NUMBERS as f64 {
            return ExecResult::failure(
                1,
                format!("seq: refusing to print {count:.0} numbers (limit {MAX_NUMBERS})"),
            );
        }

        let precision = decimals(first).max(decimals(step));
        let mut numbers = Vec::with_capacity(count as usize);
        for i in 0..count as u64 {
            if i % 4096 == 0 && ctx.interrupt.is_set() {
                break;
            }
            let value = start + increment * i as f64;
            numbers.push(format!("{value:.precision$}"));
        }

        if args.has_flag("equal-width") {
            let width = numbers.iter().map(String::len).max().unwrap_or(0);
            for n in &mut numbers {
                *n = pad_zeros(n, width);
            }
        }

        if numbers.is_empty() {
            return ExecResult::success("");
        }
        let separator = args.get_named("separator").unwrap_or("\n");
        let mut out = numbers.join(separator);
        out.push('\n');
        ExecResult::success(out)
    }
}

fn decimals(text: &str) -> usize {
    text.split_once('.').map(|(_, frac)| frac.len()).unwrap_or(0)
}

fn pad_zeros(number: &str, width: usize) -> String {
    match number.strip_prefix('-') {
        Some(digits) => format!("-{digits:0>w$}", w = width.saturating_sub(1)),
        None => format!("{number:0>width$}"),
    }
}
