//! jobs — List background jobs.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

/// Jobs tool: show the job table, then forget finished jobs.
pub struct Jobs;

#[async_trait]
impl Tool for Jobs {
    fn name(&self) -> &str {
        "jobs"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("jobs", "Display status of jobs")
            .param(ParamSchema::flag("long", "List process IDs in addition to the normal information").with_aliases(["-l"]))
            .param(ParamSchema::flag("pids", "List process IDs only").with_aliases(["-p"]))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let jobs = ctx.jobs.list();
        let last = jobs.len().saturating_sub(1);
        let mut out = String::new();
        for (i, job) in jobs.iter().enumerate() {
            if args.has_flag("pids") {
                out.push_str(&format!("{}\n", job.pid));
                continue;
            }
            let line = job.display(i == last);
            if args.has_flag("long") {
                // [1]+  1000 Done ...
                let (head, tail) = line.split_at(line.find("  ").map_or(0, |i| i + 2));
                out.push_str(&format!("{head}{} {tail}\n", job.pid));
            } else {
                out.push_str(&line);
                out.push('\n');
            }
        }
        ctx.jobs.reap();
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn lists_then_reaps() {
        let mut ctx = make_ctx();
        let first = ctx.jobs.start("sleep 1");
        let second = ctx.jobs.start("echo hi");
        ctx.jobs.finish(first.id, 0);
        ctx.jobs.finish(second.id, 2);

        let result = run_tool(&Jobs, &mut ctx, &[]).await;
        assert_eq!(
            result.out,
            "[1]-  Done                    sleep 1\n[2]+  Exit 2                  echo hi\n"
        );
        assert!(ctx.jobs.is_empty());
        assert_eq!(run_tool(&Jobs, &mut ctx, &[]).await.out, "");
    }

    #[tokio::test]
    async fn long_format_adds_pid() {
        let mut ctx = make_ctx();
        let job = ctx.jobs.start("sleep 1");
        ctx.jobs.finish(job.id, 0);
        let result = run_tool(&Jobs, &mut ctx, &["-l"]).await;
        assert_eq!(result.out, format!("[1]+  {} Done                    sleep 1\n", job.pid));
    }
}
