//! Background job bookkeeping.
//!
//! Lines run to completion before the next one is read, so a background
//! link has always finished by the time `jobs` can look at it. The table
//! still records each one so `[N] pid`, `$!` and `jobs` behave the way a
//! user expects.

use std::fmt;

/// Unique identifier for a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct JobId(pub u32);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of a background job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    /// Finished with status 0.
    Done,
    /// Finished with a nonzero status.
    Exited(i64),
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Done => write!(f, "Done"),
            JobStatus::Exited(code) => write!(f, "Exit {code}"),
        }
    }
}

/// Information about a job for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobInfo {
    pub id: JobId,
    /// Simulated process id, also what `$!` expands to.
    pub pid: u32,
    pub command: String,
    pub status: JobStatus,
}

impl JobInfo {
    /// One `jobs` line, e.g. `[1]+  Done                    sleep 1`.
    pub fn display(&self, current: bool) -> String {
        let marker = if current { '+' } else { '-' };
        format!(
            "[{}]{}  {:<24}{}",
            self.id,
            marker,
            self.status.to_string(),
            self.command
        )
    }
}

/// Per-session job table.
#[derive(Debug, Clone)]
pub struct JobTable {
    jobs: Vec<JobInfo>,
    next_pid: u32,
}

impl JobTable {
    /// Create a table whose first job gets `first_pid`.
    pub fn new(first_pid: u32) -> Self {
        Self {
            jobs: Vec::new(),
            next_pid: first_pid,
        }
    }

    /// Record a new running job. Numbering restarts at 1 once the table
    /// has been emptied.
    pub fn start(&mut self, command: impl Into<String>) -> JobInfo {
        let id = JobId(self.jobs.iter().map(|j| j.id.0).max().unwrap_or(0) + 1);
        let pid = self.next_pid;
        self.next_pid += 1;
        let info = JobInfo {
            id,
            pid,
            command: command.into(),
            status: JobStatus::Running,
        };
        self.jobs.push(info.clone());
        info
    }

    /// Mark a job finished with `code`.
    pub fn finish(&mut self, id: JobId, code: i64) {
        if let Some(job) = self.jobs.iter_mut().find(|j| j.id == id) {
            job.status = if code == 0 {
                JobStatus::Done
            } else {
                JobStatus::Exited(code)
            };
        }
    }

    /// Hand out a pid for something that is not a job (e.g. `ps` rows).
    pub fn allocate_pid(&mut self) -> u32 {
        let pid = self.next_pid;
        self.next_pid += 1;
        pid
    }

    pub fn list(&self) -> &[JobInfo] {
        &self.jobs
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Drop every job that has finished. Returns what was dropped.
    pub fn reap(&mut self) -> Vec<JobInfo> {
        let (done, running): (Vec<_>, Vec<_>) = self
            .jobs
            .drain(..)
            .partition(|j| j.status != JobStatus::Running);
        self.jobs = running;
        done
    }
}
