//! Execution context for tools.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::interpreter::{History, Scope};
use crate::scheduler::{InterruptHandle, JobTable};
use crate::vfs::{path, Vfs};

use super::traits::ToolSchema;

/// Where a tool's stdout is going.
///
/// - **Terminal**: straight to the user, so column layouts are fine
/// - **Piped**: into another stage or a file, so one item per line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputContext {
    #[default]
    Terminal,
    Piped,
}

/// Everything a tool may read or change: the VFS and the session tables.
///
/// The session owns exactly one of these for its whole life, so state a
/// tool leaves behind (cwd, variables, aliases) is what the next line sees.
pub struct ExecContext {
    pub vfs: Vfs,
    pub scope: Scope,
    pub aliases: BTreeMap<String, String>,
    pub history: History,
    pub jobs: JobTable,
    /// Current working directory: absolute, normalized, and a directory.
    pub cwd: String,
    pub user: String,
    pub hostname: String,
    /// `$?`
    pub last_status: i64,
    /// `$!`
    pub last_background: Option<u32>,
    /// Standard input for the running tool (pipe or `<` redirect).
    pub stdin: Option<String>,
    pub output: OutputContext,
    /// Tool schemas for `help`, `type` and `which`.
    pub tool_schemas: Vec<ToolSchema>,
    pub interrupt: InterruptHandle,
    pub started: Instant,
    /// Simulated pid of the shell itself, `$$`.
    pub pid: u32,
    /// Upper bound for outbound fetches.
    pub fetch_timeout: Duration,
}

impl ExecContext {
    /// Create a context over `vfs` with cwd `/` and empty tables.
    pub fn new(vfs: Vfs) -> Self {
        Self {
            vfs,
            scope: Scope::new(),
            aliases: BTreeMap::new(),
            history: History::default(),
            jobs: JobTable::new(1000),
            cwd: "/".to_string(),
            user: "root".to_string(),
            hostname: "localhost".to_string(),
            last_status: 0,
            last_background: None,
            stdin: None,
            output: OutputContext::Terminal,
            tool_schemas: Vec::new(),
            interrupt: InterruptHandle::new(),
            started: Instant::now(),
            pid: 999,
            fetch_timeout: Duration::from_secs(10),
        }
    }

    /// Set the available tool schemas (for help command).
    pub fn set_tool_schemas(&mut self, schemas: Vec<ToolSchema>) {
        self.tool_schemas = schemas;
    }

    /// Set stdin for this execution.
    pub fn set_stdin(&mut self, stdin: String) {
        self.stdin = Some(stdin);
    }

    /// Get stdin, consuming it.
    pub fn take_stdin(&mut self) -> Option<String> {
        self.stdin.take()
    }

    /// `$HOME`, falling back to `/`.
    pub fn home(&self) -> String {
        self.scope
            .get("HOME")
            .filter(|h| !h.is_empty())
            .unwrap_or("/")
            .to_string()
    }

    /// Resolve a user-supplied path against cwd and `$HOME`.
    pub fn resolve_path(&self, input: &str) -> String {
        path::resolve(input, &self.cwd, &self.home())
    }

    /// Change the current working directory, keeping `PWD`/`OLDPWD` in step.
    pub fn set_cwd(&mut self, dir: String) {
        let old = std::mem::replace(&mut self.cwd, dir);
        self.scope.set("OLDPWD", old);
        self.scope.set("PWD", self.cwd.clone());
    }

    /// Move cwd to the nearest existing ancestor if something removed it.
    pub fn repair_cwd(&mut self) {
        if self.vfs.is_dir(&self.cwd) {
            return;
        }
        let mut dir = self.cwd.clone();
        while !self.vfs.is_dir(&dir) {
            dir = path::dirname(&dir).to_string();
        }
        tracing::debug!(from = %self.cwd, to = %dir, "cwd no longer exists");
        self.cwd = dir;
        self.scope.set("PWD", self.cwd.clone());
    }

    /// cwd with the home directory shown as `~`.
    pub fn display_cwd(&self) -> String {
        let home = self.home();
        if home != "/" {
            if self.cwd == home {
                return "~".to_string();
            }
            if let Some(rest) = self.cwd.strip_prefix(&format!("{home}/")) {
                return format!("~/{rest}");
            }
        }
        self.cwd.clone()
    }

    /// Read a file as text for `cmd`, producing `cmd: name: reason` on failure.
    pub fn read_text(&mut self, cmd: &str, name: &str) -> Result<String, String> {
        let resolved = self.resolve_path(name);
        self.vfs
            .read_to_string(&resolved)
            .map_err(|e| format!("{cmd}: {name}: {}", e.reason()))
    }

    /// Concatenate the named files, or stdin when there are none (or for `-`).
    ///
    /// Unreadable files add an error line and are skipped; the rest are
    /// still read.
    pub fn read_sources(&mut self, cmd: &str, names: &[String]) -> Sources {
        let mut sources = Sources::default();
        if names.is_empty() {
            sources.text = self.take_stdin().unwrap_or_default();
            return sources;
        }
        for name in names {
            if name == "-" {
                sources.text.push_str(&self.take_stdin().unwrap_or_default());
                continue;
            }
            match self.read_text(cmd, name) {
                Ok(text) => sources.text.push_str(&text),
                Err(message) => {
                    crate::interpreter::push_line(&mut sources.errors, &message);
                }
            }
        }
        sources
    }

    /// Seconds since the session started.
    pub fn elapsed_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}

/// Text gathered from files or stdin, plus error lines for what could not
/// be read.
#[derive(Debug, Clone, Default)]
pub struct Sources {
    pub text: String,
    pub errors: String,
}

impl Sources {
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> ExecContext {
        let mut vfs = Vfs::new();
        vfs.mkdir("/home/user/docs", true).unwrap();
        vfs.write("/home/user/a.txt", b"alpha\n", false).unwrap();
        let mut ctx = ExecContext::new(vfs);
        ctx.scope.export("HOME", "/home/user");
        ctx.cwd = "/home/user".to_string();
        ctx
    }

    #[test]
    fn resolve_uses_cwd_and_home() {
        let ctx = ctx();
        assert_eq!(ctx.resolve_path("docs"), "/home/user/docs");
        assert_eq!(ctx.resolve_path("~/x"), "/home/user/x");
        assert_eq!(ctx.resolve_path("../.."), "/");
    }

    #[test]
    fn set_cwd_tracks_oldpwd() {
        let mut ctx = ctx();
        ctx.set_cwd("/home/user/docs".to_string());
        assert_eq!(ctx.scope.get("PWD"), Some("/home/user/docs"));
        assert_eq!(ctx.scope.get("OLDPWD"), Some("/home/user"));
        assert_eq!(ctx.display_cwd(), "~/docs");
    }

    #[test]
    fn repair_moves_to_existing_ancestor() {
        let mut ctx = ctx();
        ctx.set_cwd("/home/user/docs".to_string());
        ctx.vfs.delete("/home/user/docs", false).unwrap();
        ctx.repair_cwd();
        assert_eq!(ctx.cwd, "/home/user");
    }

    #[test]
    fn sources_report_missing_files() {
        let mut ctx = ctx();
        let sources = ctx.read_sources("cat", &["a.txt".to_string(), "nope".to_string()]);
        assert_eq!(sources.text, "alpha\n");
        assert_eq!(sources.errors, "cat: nope: No such file or directory\n");
        assert!(sources.failed());
    }

    #[test]
    fn sources_fall_back_to_stdin() {
        let mut ctx = ctx();
        ctx.set_stdin("piped\n".to_string());
        assert_eq!(ctx.read_sources("cat", &[]).text, "piped\n");
    }
}
