//! true, false — Exit with a fixed status.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, Tool, ToolArgs, ToolSchema};

/// True tool: do nothing, successfully.
pub struct True;

#[async_trait]
impl Tool for True {
    fn name(&self) -> &str {
        "true"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("true", "Do nothing, successfully").raw()
    }

    async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success("")
    }
}

/// False tool: do nothing, unsuccessfully.
pub struct False;

#[async_trait]
impl Tool for False {
    fn name(&self) -> &str {
        "false"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("false", "Do nothing, unsuccessfully").raw()
    }

    async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        ExecResult::from_output(1, "", "")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn statuses() {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&True, &mut ctx, &["--ignored"]).await, ExecResult::success(""));
        let result = run_tool(&False, &mut ctx, &[]).await;
        assert_eq!((result.code, result.out.as_str(), result.err.as_str()), (1, "", ""));
    }
}
