//! termsim-kernel: the core of a simulated bash session.
//!
//! This crate provides:
//!
//! - **VFS**: an in-memory Linux-like tree with symlinks, devices, and
//!   JSON snapshots
//! - **Interpreter**: alias, history and variable expansion, a logos lexer,
//!   and a parser for links, pipelines and redirections
//! - **Scheduler**: pipeline execution, the job table, and interrupts
//! - **Tools**: the `Tool` trait, the registry, and the builtin commands
//! - **Session**: one login's worth of state tying it all together
//!
//! ```no_run
//! use termsim_kernel::{Session, SessionConfig};
//!
//! # async fn demo() -> anyhow::Result<()> {
//! let mut session = Session::new(SessionConfig::default())?;
//! print!("{}", session.prompt());
//! print!("{}", session.execute("ls -la ~").await);
//! # Ok(())
//! # }
//! ```

pub mod dispatch;
pub mod interpreter;
pub mod scheduler;
pub mod session;
pub mod tools;
pub mod vfs;

pub use dispatch::{CommandDispatcher, RegistryDispatcher};
pub use interpreter::{ExecResult, ERROR_PREFIX};
pub use scheduler::{InterruptHandle, JobTable};
pub use session::{Session, SessionConfig};
pub use tools::{ExecContext, Tool, ToolRegistry};
pub use vfs::{Snapshot, SnapshotError, Vfs, VfsError};
