//! basename, dirname — Strip path components.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::path;

use super::missing_operand;

/// Basename tool: strip directory and suffix from names.
pub struct Basename;

#[async_trait]
impl Tool for Basename {
    fn name(&self) -> &str {
        "basename"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("basename", "Strip directory and suffix from filenames")
            .param(ParamSchema::flag("multiple", "Support multiple arguments").with_aliases(["-a"]))
            .param(ParamSchema::option("suffix", "Remove a trailing SUFFIX; implies -a").with_aliases(["-s"]))
            .example("File name only", "basename /usr/bin/sort")
            .example("Drop an extension", "basename notes.txt .txt")
    }

    async fn execute(&self, args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        let suffix = args.get_named("suffix");
        let (names, suffix): (&[String], Option<&str>) =
            if args.has_flag("multiple") || suffix.is_some() {
                (&args.positional, suffix)
            } else {
                match args.positional.as_slice() {
                    [] => return missing_operand("basename"),
                    [name] => (std::slice::from_ref(name), None),
                    [name, suffix] => (std::slice::from_ref(name), Some(suffix.as_str())),
                    [_, _, extra, ..] => {
                        return ExecResult::failure(
                            1,
                            format!("basename: extra operand '{extra}'\nTry 'basename --help' for more information."),
                        )
                    }
                }
            };
        if names.is_empty() {
            return missing_operand("basename");
        }

        let mut out = String::new();
        for name in names {
            let base = path::basename(name);
            let base = match suffix {
                Some(suffix) if base != suffix => base.strip_suffix(suffix).unwrap_or(base),
                _ => base,
            };
            out.push_str(base);
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

/// Dirname tool: strip the last component from names.
pub struct Dirname;

#[async_trait]
impl Tool for Dirname {
    fn name(&self) -> &str {
        "dirname"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("dirname", "Strip last component from file name")
            .example("Parent directory", "dirname /usr/bin/sort")
    }

    async fn execute(&self, args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return missing_operand("dirname");
        }
        let mut out = String::new();
        for name in &args.positional {
            out.push_str(path::dirname(name));
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};
    use rstest::rstest;

    #[rstest]
    #[case(&["/usr/bin/sort"], "sort\n")]
    #[case(&["notes.txt", ".txt"], "notes\n")]
    #[case(&[".txt", ".txt"], ".txt\n")]
    #[case(&["dir/"], "dir\n")]
    #[case(&["/"], "/\n")]
    #[case(&["-a", "a/x", "b/y"], "x\ny\n")]
    #[case(&["-s", ".rs", "a.rs", "b.rs"], "a\nb\n")]
    #[tokio::test]
    async fn basenames(#[case] argv: &[&str], #[case] expected: &str) {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Basename, &mut ctx, argv).await.out, expected);
    }

    #[rstest]
    #[case(&["/usr/bin/sort"], "/usr/bin\n")]
    #[case(&["notes.txt"], ".\n")]
    #[case(&["/usr/"], "/\n")]
    #[case(&["a/b", "/c"], "a\n/\n")]
    #[tokio::test]
    async fn dirnames(#[case] argv: &[&str], #[case] expected: &str) {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Dirname, &mut ctx, argv).await.out, expected);
    }
}
