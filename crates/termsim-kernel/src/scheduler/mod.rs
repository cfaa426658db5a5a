//! Scheduler module for termsim: pipelines, background jobs, interrupts.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     PipelineRunner                       │
//! │  ┌────────┐   stdout    ┌────────┐   stdout    ┌───────┐ │
//! │  │ stage1 │────────────▶│ stage2 │────────────▶│ stage3│ │
//! │  └────────┘   (String)  └────────┘   (String)  └───────┘ │
//! │        ▲ interrupt checked before every stage            │
//! └──────────────────────────────────────────────────────────┘
//!
//! ┌──────────────────────────────────────────────────────────┐
//! │                       JobTable                           │
//! │  start(command) → JobInfo { id, pid }                    │
//! │  finish(id, code) / list() / reap()                      │
//! └──────────────────────────────────────────────────────────┘
//! ```

mod interrupt;
mod job;
mod pipeline;

pub use interrupt::InterruptHandle;
pub use job::{JobId, JobInfo, JobStatus, JobTable};
pub use pipeline::PipelineRunner;
