//! uniq — Report or omit repeated lines.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Uniq tool: collapse adjacent duplicate lines.
pub struct Uniq;

#[async_trait]
impl Tool for Uniq {
    fn name(&self) -> &str {
        "uniq"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("uniq", "Report or omit repeated lines")
            .param(ParamSchema::flag("count", "Prefix lines by the number of occurrences").with_aliases(["-c"]))
            .param(ParamSchema::flag("repeated", "Only print duplicate lines, one for each group").with_aliases(["-d"]))
            .param(ParamSchema::flag("unique", "Only print unique lines").with_aliases(["-u"]))
            .param(
                ParamSchema::flag("ignore-case", "Ignore differences in case when comparing")
                    .with_aliases(["-i"]),
            )
            .example("Count occurrences", "sort words.txt | uniq -c")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        // uniq INPUT [OUTPUT]
        let input = match args.positional.first() {
            Some(file) if file != "-" => match ctx.read_text("uniq", file) {
                Ok(text) => text,
                Err(message) => return ExecResult::failure(1, message),
            },
            _ => ctx.take_stdin().unwrap_or_default(),
        };

        let fold = args.has_flag("ignore-case");
        let mut groups: Vec<(&str, usize)> = Vec::new();
        for line in input.lines() {
            match groups.last_mut() {
                Some((first, count)) if same(first, line, fold) => *count += 1,
                _ => groups.push((line, 1)),
            }
        }

        let mut out = String::new();
        for (line, count) in groups {
            if args.has_flag("repeated") && count < 2 {
                continue;
            }
            if args.has_flag("unique") && count > 1 {
                continue;
            }
            if args.has_flag("count") {
                out.push_str(&format!("{count:>7} "));
            }
            out.push_str(line);
            out.push('\n');
        }

        if let Some(target) = args.positional.get(1) {
            let resolved = ctx.resolve_path(target);
            return match ctx.vfs.write(&resolved, out.as_bytes(), false) {
                Ok(()) => ExecResult::success(""),
                Err(e) => ExecResult::failure(1, format!("uniq: {target}: {}", e.reason())),
            };
        }
        ExecResult::success(out)
    }
}

fn same(a: &str, b: &str, fold: bool) -> bool {
    if fold {
        a.to_lowercase() == b.to_lowercase()
    } else {
        a == b
    }
}
