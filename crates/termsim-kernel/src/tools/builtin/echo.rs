//! echo — Print arguments.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Echo tool: print arguments separated by spaces.
///
/// Leading `-n`, `-e` and `-E` words (and bundles of them) are options;
/// anything else, including `--`, is printed as-is.
pub struct Echo;

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("echo", "Display a line of text")
            .param(ParamSchema::flag("no-newline", "Do not output the trailing newline").with_aliases(["-n"]))
            .param(ParamSchema::flag("escapes", "Enable interpretation of backslash escapes").with_aliases(["-e"]))
            .param(ParamSchema::flag("no-escapes", "Disable interpretation of backslash escapes").with_aliases(["-E"]))
            .example("Print a greeting", "echo hello world")
            .example("Without newline", "echo -n partial")
            .raw()
    }

    async fn execute(&self, args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        let mut newline = true;
        let mut escapes = false;
        let mut words = args.positional.as_slice();

        while let Some((first, rest)) = words.split_first() {
            let Some(letters) = first.strip_prefix('-') else {
                break;
            };
            if letters.is_empty() || !letters.chars().all(|c| matches!(c, 'n' | 'e' | 'E')) {
                break;
            }
            for c in letters.chars() {
                match c {
                    'n' => newline = false,
                    'e' => escapes = true,
                    _ => escapes = false,
                }
            }
            words = rest;
        }

        let mut out = words.join(" ");
        if escapes {
            let (text, stop) = interpret_escapes(&out);
            out = text;
            if stop {
                return ExecResult::success(out);
            }
        }
        if newline {
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

/// Process backslash escapes. The flag is set when `\c` cut output short.
fn interpret_escapes(text: &str) -> (String, bool) {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('a') => out.push('\x07'),
            Some('b') => out.push('\x08'),
            Some('f') => out.push('\x0c'),
            Some('v') => out.push('\x0b'),
            Some('e') => out.push('\x1b'),
            Some('\\') => out.push('\\'),
            Some('c') => return (out, true),
            Some('0') => {
                let mut value = 0u32;
                for _ in 0..3 {
                    match chars.peek().and_then(|d| d.to_digit(8)) {
                        Some(d) => {
                            value = value * 8 + d;
                            chars.next();
                        }
                        None => break,
                    }
                }
                out.extend(char::from_u32(value));
            }
            Some('x') => {
                let mut value = 0u32;
                let mut digits = 0;
                while digits < 2 {
                    match chars.peek().and_then(|d| d.to_digit(16)) {
                        Some(d) => {
                            value = value * 16 + d;
                            chars.next();
                            digits += 1;
                        }
                        None => break,
                    }
                }
                if digits == 0 {
                    out.push_str("\\x");
                } else {
                    out.extend(char::from_u32(value));
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    (out, false)
}
