//! wc — Count lines, words, and bytes.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Wc tool: newline, word, character and byte counts.
pub struct Wc;

#[async_trait]
impl Tool for Wc {
    fn name(&self) -> &str {
        "wc"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("wc", "Print newline, word, and byte counts for each file")
            .param(ParamSchema::flag("lines", "Print the newline counts").with_aliases(["-l"]))
            .param(ParamSchema::flag("words", "Print the word counts").with_aliases(["-w"]))
            .param(ParamSchema::flag("bytes", "Print the byte counts").with_aliases(["-c"]))
            .param(ParamSchema::flag("chars", "Print the character counts").with_aliases(["-m"]))
            .example("Count lines", "wc -l notes.txt")
            .example("Count entries", "ls | wc -l")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut columns = Columns {
            lines: args.has_flag("lines"),
            words: args.has_flag("words"),
            chars: args.has_flag("chars"),
            bytes: args.has_flag("bytes"),
        };
        if !(columns.lines || columns.words || columns.chars || columns.bytes) {
            columns = Columns {
                lines: true,
                words: true,
                chars: false,
                bytes: true,
            };
        }

        let mut rows: Vec<(Counts, Option<String>)> = Vec::new();
        let mut err = String::new();
        if args.positional.is_empty() {
            let input = ctx.take_stdin().unwrap_or_default();
            rows.push((Counts::of(&input), None));
        } else {
            for file in &args.positional {
                let text = if file == "-" {
                    Ok(ctx.take_stdin().unwrap_or_default())
                } else {
                    ctx.read_text("wc", file)
                };
                match text {
                    Ok(text) => rows.push((Counts::of(&text), Some(file.clone()))),
                    Err(message) => {
                        err.push_str(&message);
                        err.push('\n');
                    }
                }
            }
            if args.positional.len() > 1 {
                let total = rows.iter().fold(Counts::default(), |acc, (c, _)| acc.add(c));
                rows.push((total, Some("total".to_string())));
            }
        }

        let width = if columns.count() == 1 && rows.len() == 1 {
            1
        } else if args.positional.is_empty() {
            7
        } else {
            rows.iter()
                .flat_map(|(c, _)| columns.values(c))
                .map(|v| v.to_string().len())
                .max()
                .unwrap_or(1)
        };

        let mut out = String::new();
        for (counts, name) in &rows {
            let cells: Vec<String> = columns
                .values(counts)
                .into_iter()
                .map(|v| format!("{v:>width$}"))
                .collect();
            out.push_str(&cells.join(" "));
            if let Some(name) = name {
                out.push(' ');
                out.push_str(name);
            }
            out.push('\n');
        }
        let code = i64::from(!err.is_empty());
        ExecResult::from_output(code, out, err)
    }
}

#[derive(Debug, Clone, Copy)]
struct Columns {
    lines: bool,
    words: bool,
    chars: bool,
    bytes: bool,
}

impl Columns {
    fn count(&self) -> usize {
        [self.lines, self.words, self.chars, self.bytes]
            .into_iter()
            .filter(|c| *c)
            .count()
    }

    fn values(&self, counts: &Counts) -> Vec<usize> {
        let mut values = Vec::with_capacity(4);
        if self.lines {
            values.push(counts.lines);
        }
        if self.words {
            values.push(counts.words);
        }
        if self.chars {
            values.push(counts.chars);
        }
        if self.bytes {
            values.push(counts.bytes);
        }
        values
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Counts {
    lines: usize,
    words: usize,
    chars: usize,
    bytes: usize,
}

impl Counts {
    fn of(text: &str) -> Self {
        Self {
            lines: text.matches('\n').count(),
            words: text.split_whitespace().count(),
            chars: text.chars().count(),
            bytes: text.len(),
        }
    }

    fn add(self, other: &Counts) -> Self {
        Self {
            lines: self.lines + other.lines,
            words: self.words + other.words,
            chars: self.chars + other.chars,
            bytes: self.bytes + other.bytes,
        }
    }
}
