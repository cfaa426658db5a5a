//! uname — Print system information.

use async_trait::async_trait;

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};
use crate::vfs::KERNEL_RELEASE;

const KERNEL_NAME: &str = "Linux";
const KERNEL_VERSION: &str = "#1 SMP PREEMPT_DYNAMIC Thu Jan 1 00:00:00 UTC 2024";
const MACHINE: &str = "x86_64";
const OPERATING_SYSTEM: &str = "GNU/Linux";

/// Uname tool: kernel and machine identification.
pub struct Uname;

#[async_trait]
impl Tool for Uname {
    fn name(&self) -> &str {
        "uname"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("uname", "Print system information")
            .param(ParamSchema::flag("all", "Print all information").with_aliases(["-a"]))
            .param(ParamSchema::flag("kernel-name", "Print the kernel name").with_aliases(["-s"]))
            .param(ParamSchema::flag("nodename", "Print the network node hostname").with_aliases(["-n"]))
            .param(ParamSchema::flag("kernel-release", "Print the kernel release").with_aliases(["-r"]))
            .param(ParamSchema::flag("kernel-version", "Print the kernel version").with_aliases(["-v"]))
            .param(ParamSchema::flag("machine", "Print the machine hardware name").with_aliases(["-m"]))
            .param(ParamSchema::flag("processor", "Print the processor type").with_aliases(["-p"]))
            .param(ParamSchema::flag("hardware-platform", "Print the hardware platform").with_aliases(["-i"]))
            .param(ParamSchema::flag("operating-system", "Print the operating system").with_aliases(["-o"]))
            .example("Everything", "uname -a")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let all = args.has_flag("all");
        let fields: [(&str, &str); 8] = [
            ("kernel-name", KERNEL_NAME),
            ("nodename", ctx.hostname.as_str()),
            ("kernel-release", KERNEL_RELEASE),
            ("kernel-version", KERNEL_VERSION),
            ("machine", MACHINE),
            ("processor", MACHINE),
            ("hardware-platform", MACHINE),
            ("operating-system", OPERATING_SYSTEM),
        ];

        let mut selected: Vec<&str> = fields
            .iter()
            .filter(|(flag, _)| all || args.has_flag(flag))
            .map(|(_, value)| *value)
            .collect();
        if selected.is_empty() {
            selected.push(KERNEL_NAME);
        }
        ExecResult::success(format!("{}\n", selected.join(" ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_ctx, run_tool};

    #[tokio::test]
    async fn default_is_kernel_name() {
        let mut ctx = make_ctx();
        assert_eq!(run_tool(&Uname, &mut ctx, &[]).await.out, "Linux\n");
    }

    #[tokio::test]
    async fn selected_fields_in_fixed_order() {
        let mut ctx = make_ctx();
        assert_eq!(
            run_tool(&Uname, &mut ctx, &["-rn"]).await.out,
            "termsim 5.15.0-termsim\n"
        );
    }

    #[tokio::test]
    async fn all_fields() {
        let mut ctx = make_ctx();
        let out = run_tool(&Uname, &mut ctx, &["-a"]).await.out;
        assert!(out.starts_with("Linux termsim 5.15.0-termsim #1 SMP"));
        assert!(out.ends_with("x86_64 x86_64 x86_64 GNU/Linux\n"));
    }
}
