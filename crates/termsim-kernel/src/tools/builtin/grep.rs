//! grep — Print lines matching a pattern.
//!
//! Basic regular expressions are translated to the `regex` crate's
//! extended syntax, so `\(a\|b\)` and `(a|b)` with `-E` mean the same.

use async_trait::async_trait;
use regex::{Regex, RegexBuilder};

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::display_join;

/// Grep tool: search files or stdin for lines matching a pattern.
pub struct Grep;

#[async_trait]
impl Tool for Grep {
    fn name(&self) -> &str {
        "grep"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("grep", "Print lines that match patterns")
            .param(ParamSchema::option("regexp", "Use PATTERN for matching").with_aliases(["-e"]))
            .param(ParamSchema::flag("ignore-case", "Ignore case distinctions").with_aliases(["-i"]))
            .param(ParamSchema::flag("invert-match", "Select non-matching lines").with_aliases(["-v"]))
            .param(ParamSchema::flag("line-number", "Print line number with output lines").with_aliases(["-n"]))
            .param(ParamSchema::flag("count", "Print only a count of selected lines per file").with_aliases(["-c"]))
            .param(
                ParamSchema::flag("files-with-matches", "Print only names of files with selected lines")
                    .with_aliases(["-l"]),
            )
            .param(
                ParamSchema::flag("files-without-match", "Print only names of files with no selected lines")
                    .with_aliases(["-L"]),
            )
            .param(ParamSchema::flag("recursive", "Read all files under each directory").with_aliases(["-r", "-R"]))
            .param(ParamSchema::flag("extended-regexp", "PATTERN is an extended regular expression").with_aliases(["-E"]))
            .param(ParamSchema::flag("fixed-strings", "PATTERN is a literal string").with_aliases(["-F"]))
            .param(ParamSchema::flag("word-regexp", "Match only whole words").with_aliases(["-w"]))
            .param(ParamSchema::flag("line-regexp", "Match only whole lines").with_aliases(["-x"]))
            .param(ParamSchema::flag("only-matching", "Show only the matching part of lines").with_aliases(["-o"]))
            .param(ParamSchema::flag("quiet", "Suppress all normal output").with_aliases(["-q"]))
            .param(ParamSchema::flag("no-messages", "Suppress error messages").with_aliases(["-s"]))
            .param(ParamSchema::flag("with-filename", "Print the file name for each match").with_aliases(["-H"]))
            .param(ParamSchema::flag("no-filename", "Suppress the file name prefix").with_aliases(["-h"]))
            .example("Search a file", "grep root /etc/passwd")
            .example("Case-insensitive, recursive", "grep -ri todo src")
            .example("Filter a pipe", "ls | grep '\\.txt$'")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut operands = args.positional.clone();
        let pattern = match args.get_named("regexp") {
            Some(p) => p.to_string(),
            None if operands.is_empty() => {
                return ExecResult::failure(
                    2,
                    "Usage: grep [OPTION]... PATTERNS [FILE]...\nTry 'grep --help' for more information.",
                )
            }
            None => operands.remove(0),
        };

        let matcher = match Matcher::build(&pattern, &args) {
            Ok(matcher) => matcher,
            Err(e) => return ExecResult::failure(2, format!("grep: {e}")),
        };

        let recursive = args.has_flag("recursive");
        if operands.is_empty() && recursive {
            operands.push(".".to_string());
        }

        let mut inputs: Vec<(String, Result<String, String>)> = Vec::new();
        if operands.is_empty() {
            inputs.push((
                "(standard input)".to_string(),
                Ok(ctx.take_stdin().unwrap_or_default()),
            ));
        }
        for operand in &operands {
            if operand == "-" {
                inputs.push((
                    "(standard input)".to_string(),
                    Ok(ctx.take_stdin().unwrap_or_default()),
                ));
                continue;
            }
            let resolved = ctx.resolve_path(operand);
            if recursive && ctx.vfs.is_dir(&resolved) {
                for (abs, shown) in collect_files(ctx, &resolved, operand) {
                    let text = ctx.vfs.read_to_string(&abs).map_err(|e| e.reason().to_string());
                    inputs.push((shown, text));
                }
                continue;
            }
            let text = ctx.vfs.read_to_string(&resolved).map_err(|e| e.reason().to_string());
            inputs.push((operand.clone(), text));
        }

        let show_names = !args.has_flag("no-filename")
            && (args.has_flag("with-filename") || recursive || inputs.len() > 1);
        let quiet = args.has_flag("quiet");

        let mut out = String::new();
        let mut err = String::new();
        let mut matched = false;
        for (name, text) in &inputs {
            let text = match text {
                Ok(text) => text,
                Err(reason) => {
                    if !quiet && !args.has_flag("no-messages") {
                        err.push_str(&format!("grep: {name}: {reason}\n"));
                    }
                    continue;
                }
            };

            let mut selected = 0;
            for (number, line) in text.lines().enumerate() {
                if matcher.selects(line) == args.has_flag("invert-match") {
                    continue;
                }
                selected += 1;
                if quiet || args.has_flag("count") || args.has_flag("files-with-matches") || args.has_flag("files-without-match") {
                    continue;
                }
                let mut prefix = String::new();
                if show_names {
                    prefix.push_str(name);
                    prefix.push(':');
                }
                if args.has_flag("line-number") {
                    prefix.push_str(&format!("{}:", number + 1));
                }
                if args.has_flag("only-matching") && !args.has_flag("invert-match") {
                    for part in matcher.regex.find_iter(line).filter(|m| !m.as_str().is_empty()) {
                        out.push_str(&format!("{prefix}{}\n", part.as_str()));
                    }
                } else {
                    out.push_str(&format!("{prefix}{line}\n"));
                }
            }
            matched |= selected > 0;

            if quiet {
                continue;
            }
            if args.has_flag("files-with-matches") {
                if selected > 0 {
                    out.push_str(&format!("{name}\n"));
                }
            } else if args.has_flag("files-without-match") {
                if selected == 0 {
                    out.push_str(&format!("{name}\n"));
                }
            } else if args.has_flag("count") {
                if show_names {
                    out.push_str(&format!("{name}:{selected}\n"));
                } else {
                    out.push_str(&format!("{selected}\n"));
                }
            }
        }

        let failed = inputs.iter().any(|(_, text)| text.is_err());
        let code = if failed && !(quiet && matched) {
            2
        } else if matched {
            0
        } else {
            1
        };
        ExecResult::from_output(code, out, err)
    }
}

struct Matcher {
    regex: Regex,
}

impl Matcher {
    fn build(pattern: &str, args: &ToolArgs) -> Result<Self, regex::Error> {
        let mut source = if args.has_flag("fixed-strings") {
            regex::escape(pattern)
        } else if args.has_flag("extended-regexp") {
            pattern.to_string()
        } else {
            basic_to_extended(pattern)
        };
        if args.has_flag("line-regexp") {
            source = format!("^(?:{source})$");
        } else if args.has_flag("word-regexp") {
            source = format!(r"\b(?:{source})\b");
        }
        let regex = RegexBuilder::new(&source)
            .case_insensitive(args.has_flag("ignore-case"))
            .build()?;
        Ok(Self { regex })
    }

    fn selects(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// Rewrite a POSIX basic regular expression in extended syntax: `\(`,
/// `\)`, `\{`, `\}`, `\|`, `\+`, `\?` become operators and their bare
/// forms become literals.
fn basic_to_extended(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(op @ ('(' | ')' | '{' | '}' | '|' | '+' | '?')) => out.push(op),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push_str(r"\\"),
            },
            '(' | ')' | '{' | '}' | '|' | '+' | '?' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}

/// Regular files under `dir`, sorted by path, with display names.
fn collect_files(ctx: &ExecContext, dir: &str, shown: &str) -> Vec<(String, String)> {
    let mut files = Vec::new();
    let Ok(entries) = ctx.vfs.list(dir) else {
        return files;
    };
    for entry in entries {
        let abs = path::join(dir, &entry.name);
        let child_shown = display_join(shown, &entry.name);
        if entry.meta.is_dir() {
            files.extend(collect_files(ctx, &abs, &child_shown));
        } else if entry.meta.is_file() {
            files.push((abs, child_shown));
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_piped, run_tool};
    use rstest::rstest;

    #[rstest]
    #[case(r"a\(b\|c\)", "a(b|c)")]
    #[case("a(b)", r"a\(b\)")]
    #[case(r"x\+", "x+")]
    #[case(r"\.txt$", r"\.txt$")]
    fn basic_regex_translation(#[case] basic: &str, #[case] extended: &str) {
        assert_eq!(basic_to_extended(basic), extended);
    }

    #[tokio::test]
    async fn matches_lines() {
        let mut ctx = make_ctx();
        let result = run_tool(&Grep, &mut ctx, &["t", "notes.txt"]).await;
        assert_eq!(result.out, "two\nthree\n");
        assert!(result.ok());
    }

    #[tokio::test]
    async fn no_match_exits_one() {
        let mut ctx = make_ctx();
        let result = run_tool(&Grep, &mut ctx, &["zebra", "notes.txt"]).await;
        assert_eq!(result.code, 1);
        assert_eq!(result.out, "");
    }

    #[tokio::test]
    async fn flags() {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Grep, &mut ctx, &["-v", "t", "notes.txt"]).await.out, "one\n");
        assert_eq!(run_tool(&Grep, &mut ctx, &["-n", "two", "notes.txt"]).await.out, "2:two\n");
        assert_eq!(run_tool(&Grep, &mut ctx, &["-c", "o", "notes.txt"]).await.out, "2\n");
        assert_eq!(run_tool(&Grep, &mut ctx, &["-i", "ONE", "notes.txt"]).await.out, "one\n");
        assert_eq!(run_tool(&Grep, &mut ctx, &["-o", "t.", "notes.txt"]).await.out, "tw\nth\n");
        assert_eq!(run_tool(&Grep, &mut ctx, &["-x", "tw", "notes.txt"]).await.code, 1);
        assert_eq!(run_tool(&Grep, &mut ctx, &["-E", "one|two", "notes.txt"]).await.out, "one\ntwo\n");
        assert_eq!(run_tool(&Grep, &mut ctx, &["-F", ".", "notes.txt"]).await.code, 1);
    }

    #[tokio::test]
    async fn word_match() {
        let mut ctx = make_ctx();
        let result = run_piped(&Grep, &mut ctx, &["-w", "cat"], "cat\ncatalog\nthe cat sat\n").await;
        assert_eq!(result.out, "cat\nthe cat sat\n");
    }

    #[tokio::test]
    async fn several_files_get_names() {
        let mut ctx = make_ctx();
        let result = run_tool(&Grep, &mut ctx, &["e", "notes.txt", "docs/readme.md"]).await;
        assert_eq!(result.out, "notes.txt:one\nnotes.txt:three\ndocs/readme.md:# Readme\n");

        let listed = run_tool(&Grep, &mut ctx, &["-l", "Readme", "notes.txt", "docs/readme.md"]).await;
        assert_eq!(listed.out, "docs/readme.md\n");
    }

    #[tokio::test]
    async fn recursive_search() {
        let mut ctx = make_ctx();
        let result = run_tool(&Grep, &mut ctx, &["-r", "Readme"]).await;
        assert_eq!(result.out, "./docs/readme.md:# Readme\n");
    }

    #[tokio::test]
    async fn errors_exit_two() {
        let mut ctx = make_ctx();
        let missing = run_tool(&Grep, &mut ctx, &["x", "ghost"]).await;
        assert_eq!(missing.code, 2);
        assert_eq!(missing.err, "grep: ghost: No such file or directory\n");

        let dir = run_tool(&Grep, &mut ctx, &["x", "docs"]).await;
        assert_eq!(dir.err, "grep: docs: Is a directory\n");

        let bad = run_tool(&Grep, &mut ctx, &["-E", "(", "notes.txt"]).await;
        assert_eq!(bad.code, 2);
    }

    #[tokio::test]
    async fn quiet_mode() {
        let mut ctx = make_ctx();
        let result = run_piped(&Grep, &mut ctx, &["-q", "b"], "a\nb\n").await;
        assert_eq!(result.out, "");
        assert!(result.ok());
    }
}
