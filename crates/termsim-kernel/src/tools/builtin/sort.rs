//! sort — Sort lines of text.

use async_trait::async_trait;
use std::cmp::Ordering;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Sort tool: sort lines from files or stdin.
pub struct Sort;

#[async_trait]
impl Tool for Sort {
    fn name(&self) -> &str {
        "sort"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("sort", "Sort lines of text files")
            .param(ParamSchema::flag("reverse", "Reverse the result of comparisons").with_aliases(["-r"]))
            .param(
                ParamSchema::flag("numeric-sort", "Compare according to string numerical value")
                    .with_aliases(["-n"]),
            )
            .param(ParamSchema::flag("unique", "Output only the first of an equal run").with_aliases(["-u"]))
            .param(ParamSchema::flag("ignore-case", "Fold lower case to upper case characters").with_aliases(["-f"]))
            .param(ParamSchema::option("key", "Sort via a key (field number, 1-based)").with_aliases(["-k"]))
            .param(
                ParamSchema::option("field-separator", "Use SEP instead of blank transitions")
                    .with_aliases(["-t"]),
            )
            .example("Sort numerically, largest first", "du -s * | sort -rn")
            .example("Sort by the third colon field", "sort -t: -k3 -n /etc/passwd")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let key = match args.get_named("key") {
            Some(spec) => match parse_key(spec) {
                Some(key) => Some(key),
                None => return ExecResult::failure(2, format!("sort: invalid number at field start: invalid count at start of '{spec}'")),
            },
            None => None,
        };
        let separator = args.get_named("field-separator").and_then(|s| s.chars().next());

        let sources = ctx.read_sources("sort", &args.positional);
        if sources.failed() {
            return ExecResult::failure(2, sources.errors);
        }

        let opts = SortOptions {
            numeric: args.has_flag("numeric-sort"),
            fold: args.has_flag("ignore-case"),
            key,
            separator,
        };
        let mut lines: Vec<&str> = sources.text.lines().collect();
        lines.sort_by(|a, b| opts.compare(a, b));
        if args.has_flag("reverse") {
            lines.reverse();
        }
        if args.has_flag("unique") {
            lines.dedup_by(|a, b| opts.compare(a, b) == Ordering::Equal);
        }

        let mut out = lines.join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

struct SortOptions {
    numeric: bool,
    fold: bool,
    /// 1-based field index.
    key: Option<usize>,
    separator: Option<char>,
}

impl SortOptions {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        let (ka, kb) = (self.key_of(a), self.key_of(b));
        let primary = if self.numeric {
            leading_number(ka)
                .partial_cmp(&leading_number(kb))
                .unwrap_or(Ordering::Equal)
        } else if self.fold {
            ka.to_lowercase().cmp(&kb.to_lowercase())
        } else {
            ka.cmp(kb)
        };
        // last-resort comparison on the whole line, like GNU sort
        primary.then_with(|| a.cmp(b))
    }

    fn key_of<'a>(&self, line: &'a str) -> &'a str {
        let Some(field) = self.key else {
            return line;
        };
        let start = match self.separator {
            Some(sep) => line
                .match_indices(sep)
                .nth(field.wrapping_sub(2))
                .map(|(i, _)| i + sep.len_utf8()),
            None => field_starts(line).get(field - 1).copied(),
        };
        match (field, start) {
            (1, _) => line,
            (_, Some(start)) => &line[start..],
            (_, None) => "",
        }
    }
}

/// Byte offsets where blank-separated fields start (including their
/// leading blanks, as GNU sort does without `-b`).
fn field_starts(line: &str) -> Vec<usize> {
    let mut starts = vec![0];
    let mut in_blank = false;
    for (i, c) in line.char_indices() {
        if c.is_whitespace() {
            if !in_blank && i > 0 {
                starts.push(i);
            }
            in_blank = true;
        } else {
            in_blank = false;
        }
    }
    starts
}

fn parse_key(spec: &str) -> Option<usize> {
    let field = spec.split([',', '.']).next()?;
    let digits: String = field.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok().filter(|n| *n > 0)
}

/// Leading numeric prefix; lines without one sort as zero.
fn leading_number(text: &str) -> f64 {
    let trimmed = text.trim_start();
    let mut end = 0;
    for (i, c) in trimmed.char_indices() {
        let ok = c.is_ascii_digit() || c == '.' || (i == 0 && (c == '-' || c == '+'));
        if !ok {
            break;
        }
        end = i + c.len_utf8();
    }
    trimmed[..end].parse().unwrap_or(0.0)
}
