//! Tool system for termsim.
//!
//! Every command is a tool. The interpreter never knows what a command
//! does; it looks the name up in a [`ToolRegistry`] and hands over parsed
//! arguments plus the session's [`ExecContext`].
//!
//! # Architecture
//!
//! ```text
//! ToolRegistry
//! ├── Files    (ls, cat, cd, mkdir, rm, cp, mv, ln, chmod, stat, du, tee, ...)
//! ├── Text     (echo, head, tail, wc, sort, uniq, grep, seq, basename, ...)
//! ├── Session  (export, unset, env, alias, history, type, help, jobs, ...)
//! ├── System   (whoami, hostname, uname, date, uptime, sleep, ps, free)
//! └── Network  (curl, wget)
//! ```

mod builtin;
mod context;
mod registry;
mod traits;

#[cfg(test)]
pub(crate) mod testing;

pub use builtin::register_builtins;
pub use context::{ExecContext, OutputContext, Sources};
pub use registry::ToolRegistry;
pub use traits::{ParamSchema, Tool, ToolArgs, ToolSchema};
