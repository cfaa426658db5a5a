//! head — Output the first part of files.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Head tool: output the first lines (or bytes) of each input.
pub struct Head;

#[async_trait]
impl Tool for Head {
    fn name(&self) -> &str {
        "head"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("head", "Output the first part of files")
            .param(ParamSchema::option("lines", "Print the first NUM lines (default 10)").with_aliases(["-n"]))
            .param(ParamSchema::option("bytes", "Print the first NUM bytes").with_aliases(["-c"]))
            .param(ParamSchema::flag("quiet", "Never print headers").with_aliases(["-q"]))
            .param(ParamSchema::flag("verbose", "Always print headers").with_aliases(["-v"]))
            .example("First 5 lines", "head -n 5 /etc/passwd")
            .example("First 3 lines of a pipe", "ls | head -3")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let count = match Count::from_args("head", &args) {
            Ok(count) => count,
            Err(result) => return result,
        };
        let files = shorthand_files(&args);
        run_sections("head", &files, &args, ctx, |text| count.head(text))
    }
}

/// How much of each input to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Count {
    Lines(usize),
    Bytes(usize),
    /// `tail -n +N`: everything from line N on.
    FromLine(usize),
}

impl Count {
    /// Read `-n`, `-c` and the `-NUM` shorthand.
    pub(crate) fn from_args(cmd: &str, args: &ToolArgs) -> Result<Count, ExecResult> {
        if let Some(bytes) = args.get_named("bytes") {
            return parse_count(bytes)
                .map(Count::Bytes)
                .ok_or_else(|| ExecResult::failure(1, format!("{cmd}: invalid number of bytes: '{bytes}'")));
        }
        if let Some(lines) = args.get_named("lines") {
            if let Some(from) = lines.strip_prefix('+') {
                if cmd == "tail" {
                    return from
                        .parse()
                        .map(Count::FromLine)
                        .map_err(|_| ExecResult::failure(1, format!("{cmd}: invalid number of lines: '{lines}'")));
                }
            }
            return parse_count(lines)
                .map(Count::Lines)
                .ok_or_else(|| ExecResult::failure(1, format!("{cmd}: invalid number of lines: '{lines}'")));
        }
        // -5 parses as a negative-number positional
        if let Some(n) = args
            .positional
            .first()
            .and_then(|p| p.strip_prefix('-'))
            .and_then(|n| n.parse().ok())
        {
            return Ok(Count::Lines(n));
        }
        Ok(Count::Lines(10))
    }

    fn head(self, text: &str) -> String {
        match self {
            Count::Lines(n) | Count::FromLine(n) => text.split_inclusive('\n').take(n).collect(),
            Count::Bytes(n) => take_bytes(text, n),
        }
    }

    pub(crate) fn tail(self, text: &str) -> String {
        match self {
            Count::Lines(n) => {
                let lines: Vec<&str> = text.split_inclusive('\n').collect();
                lines[lines.len().saturating_sub(n)..].concat()
            }
            Count::FromLine(n) => text.split_inclusive('\n').skip(n.saturating_sub(1)).collect(),
            Count::Bytes(n) => {
                let bytes = text.as_bytes();
                let start = bytes.len().saturating_sub(n);
                String::from_utf8_lossy(&bytes[start..]).into_owned()
            }
        }
    }
}

fn parse_count(text: &str) -> Option<usize> {
    text.trim_start_matches('-').parse().ok()
}

fn take_bytes(text: &str, n: usize) -> String {
    let bytes = text.as_bytes();
    String::from_utf8_lossy(&bytes[..n.min(bytes.len())]).into_owned()
}

/// Positional files, without a leading `-NUM` shorthand.
pub(crate) fn shorthand_files(args: &ToolArgs) -> Vec<String> {
    let mut files = args.positional.clone();
    if files
        .first()
        .is_some_and(|p| p.len() > 1 && p.starts_with('-') && p[1..].chars().all(|c| c.is_ascii_digit()))
    {
        files.remove(0);
    }
    files
}

/// Apply `select` to stdin or to each file, with `==> name <==` headers
/// when there is more than one file.
pub(crate) fn run_sections(
    cmd: &str,
    files: &[String],
    args: &ToolArgs,
    ctx: &mut ExecContext,
    select: impl Fn(&str) -> String,
) -> ExecResult {
    if files.is_empty() {
        let input = ctx.take_stdin().unwrap_or_default();
        return ExecResult::success(select(&input));
    }

    let headers = (files.len() > 1 || args.has_flag("verbose")) && !args.has_flag("quiet");
    let mut out = String::new();
    let mut err = String::new();
    let mut first = true;
    for file in files {
        let text = if file == "-" {
            Ok(ctx.take_stdin().unwrap_or_default())
        } else {
            ctx.vfs
                .read_to_string(&ctx.resolve_path(file))
                .map_err(|e| format!("{cmd}: cannot open '{file}' for reading: {}\n", e.reason()))
        };
        match text {
            Ok(text) => {
                if headers {
                    if !first {
                        out.push('\n');
                    }
                    let shown = if file == "-" { "standard input" } else { file };
                    out.push_str(&format!("==> {shown} <==\n"));
                }
                first = false;
                out.push_str(&select(&text));
            }
            Err(message) => err.push_str(&message),
        }
    }
    let code = i64::from(!err.is_empty());
    ExecResult::from_output(code, out, err)
}
