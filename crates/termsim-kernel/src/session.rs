//! Session — one simulated login: a VFS, the command registry, and the
//! shell state that carries from one line to the next.
//!
//! A session handles one line at a time. [`Session::execute`] takes a raw
//! line and returns display-ready text; nothing that goes wrong inside a
//! line escapes as an error.
//!
//! ```text
//! raw line
//!   │ alias (first word, once)
//!   │ history (!!, !n, !-n, !prefix)   → recorded, echoed if it changed
//!   │ variables ($NAME, ${..}, $?, $$, $RANDOM, $SECONDS, ~)
//!   │ parse → links (; && || &) → pipelines (|) → stages
//!   ▼
//! PipelineRunner → CommandDispatcher → Tool
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::dispatch::RegistryDispatcher;
use crate::interpreter::{
    expand_alias, expand_history, expand_variables, parse, push_line, ExecResult, History,
    SpecialParams, DEFAULT_HISTORY_SIZE, ERROR_PREFIX,
};
use crate::scheduler::{InterruptHandle, PipelineRunner};
use crate::tools::{register_builtins, ExecContext, ToolRegistry};
use crate::vfs::path as vfs_path;
use crate::vfs::{seed_standard_tree, Credentials, SeedProfile, Snapshot, SnapshotError, Vfs};

/// Status of a line stopped by an interrupt.
const INTERRUPTED: i64 = 130;

const DEFAULT_PATH: &str = "/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin";

const DEFAULT_ALIASES: &[(&str, &str)] = &[("ll", "ls -la"), ("la", "ls -A"), ("l", "ls -CF")];

/// Configuration for a new session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Name used in logs.
    pub name: String,
    /// Login user. `root` gets a `#` prompt.
    pub user: String,
    pub hostname: String,
    pub home: String,
    /// Starting directory; the home directory when unset.
    pub cwd: Option<String>,
    pub history_size: usize,
    /// Upper bound for `curl` and `wget`.
    pub fetch_timeout: Duration,
    /// Populate the standard Linux-like tree.
    pub seed: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            user: "user".to_string(),
            hostname: "termsim".to_string(),
            home: "/home/user".to_string(),
            cwd: None,
            history_size: DEFAULT_HISTORY_SIZE,
            fetch_timeout: Duration::from_secs(10),
            seed: true,
        }
    }
}

impl SessionConfig {
    /// Logged in as root, starting in `/root`.
    pub fn root() -> Self {
        Self::default().with_name("root").with_user("root")
    }

    /// No seeded tree: an empty filesystem with cwd `/`.
    ///
    /// Useful for tests that want full control over the VFS.
    pub fn isolated() -> Self {
        Self {
            name: "isolated".to_string(),
            home: "/".to_string(),
            seed: false,
            ..Self::default()
        }
    }

    /// Defaults overlaid with `TERMSIM_USER`, `TERMSIM_HOSTNAME`,
    /// `TERMSIM_HISTSIZE` and `TERMSIM_FETCH_TIMEOUT_SECS`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(user) = std::env::var("TERMSIM_USER") {
            if !user.is_empty() {
                config = config.with_user(user);
            }
        }
        if let Ok(hostname) = std::env::var("TERMSIM_HOSTNAME") {
            if !hostname.is_empty() {
                config = config.with_hostname(hostname);
            }
        }
        if let Ok(size) = std::env::var("TERMSIM_HISTSIZE") {
            match size.parse() {
                Ok(size) => config = config.with_history_size(size),
                Err(_) => tracing::warn!(value = %size, "ignoring invalid TERMSIM_HISTSIZE"),
            }
        }
        if let Ok(secs) = std::env::var("TERMSIM_FETCH_TIMEOUT_SECS") {
            match secs.parse() {
                Ok(secs) => config = config.with_fetch_timeout(Duration::from_secs(secs)),
                Err(_) => tracing::warn!(value = %secs, "ignoring invalid TERMSIM_FETCH_TIMEOUT_SECS"),
            }
        }
        config
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the login user. Also moves home to `/root` or `/home/<user>`.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = user.into();
        self.home = if self.user == "root" {
            "/root".to_string()
        } else {
            format!("/home/{}", self.user)
        };
        self
    }

    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    pub fn with_home(mut self, home: impl Into<String>) -> Self {
        self.home = home.into();
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history_size = size;
        self
    }

    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn with_seed(mut self, seed: bool) -> Self {
        self.seed = seed;
        self
    }
}

/// One simulated shell session.
///
/// Sessions share nothing; each owns its VFS and every table a command
/// can touch.
pub struct Session {
    name: String,
    ctx: ExecContext,
    tools: Arc<ToolRegistry>,
    runner: PipelineRunner,
}

impl Session {
    /// Build a session: seed the VFS, register builtins, set up a login
    /// environment.
    pub fn new(config: SessionConfig) -> Result<Self> {
        if config.user.is_empty() || config.user.contains(['/', ':']) {
            bail!("invalid user name {:?}", config.user);
        }

        let mut vfs = Vfs::new();
        if config.seed {
            seed_standard_tree(
                &mut vfs,
                &SeedProfile {
                    user: &config.user,
                    home: &config.home,
                    hostname: &config.hostname,
                },
            )
            .context("seeding the standard tree")?;
        }
        if !vfs.is_dir(&config.home) {
            vfs.mkdir(&config.home, true)
                .with_context(|| format!("creating home directory {}", config.home))?;
            if config.home != "/" {
                vfs.chown(&config.home, Some(&config.user), Some(&config.user))?;
            }
        }
        vfs.set_credentials(Credentials::new(config.user.clone(), config.user.clone()));

        let cwd = config.cwd.clone().unwrap_or_else(|| config.home.clone());
        if !vfs.is_dir(&cwd) {
            bail!("working directory {cwd} does not exist");
        }

        let mut tools = ToolRegistry::new();
        register_builtins(&mut tools);
        let tools = Arc::new(tools);
        let runner = PipelineRunner::new(Arc::new(RegistryDispatcher::new(tools.clone())));

        let mut ctx = ExecContext::new(vfs);
        ctx.set_tool_schemas(tools.schemas());
        ctx.user = config.user.clone();
        ctx.hostname = config.hostname.clone();
        ctx.history = History::new(config.history_size);
        ctx.fetch_timeout = config.fetch_timeout;
        ctx.cwd = cwd.clone();
        ctx.aliases = DEFAULT_ALIASES
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        login_environment(&mut ctx, &config, &cwd);

        tracing::info!(session = %config.name, user = %config.user, tools = tools.len(), "session started");
        Ok(Self {
            name: config.name,
            ctx,
            tools,
            runner,
        })
    }

    /// Run one line and return what a terminal would show.
    #[tracing::instrument(level = "info", skip(self), fields(session = %self.name, input_len = line.len()))]
    pub async fn execute(&mut self, line: &str) -> String {
        self.run(line).await.1
    }

    /// Run one line and return its streams and final status.
    pub async fn run_line(&mut self, line: &str) -> ExecResult {
        self.run(line).await.0
    }

    async fn run(&mut self, line: &str) -> (ExecResult, String) {
        self.ctx.interrupt.clear();
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return (ExecResult::from_output(self.ctx.last_status, "", ""), String::new());
        }
        self.apply_histsize();

        let aliased = expand_alias(line, &self.ctx.aliases);
        let expanded = match expand_history(&aliased, &self.ctx.history) {
            Ok(Some(expanded)) => expanded,
            Ok(None) => aliased,
            Err(e) => return self.finish_early(1, format!("{ERROR_PREFIX} {e}")),
        };
        let recorded = match expand_history(line, &self.ctx.history) {
            Ok(Some(recorded)) => recorded,
            _ => line.to_string(),
        };

        let mut total = ExecResult::success("");
        let mut text = String::new();
        if recorded != line {
            push_line(&mut total.out, &recorded);
            push_line(&mut text, &recorded);
        }
        self.ctx.history.push(recorded);

        let special = SpecialParams {
            last_status: self.ctx.last_status,
            pid: self.ctx.pid,
            last_background: self.ctx.last_background,
            seconds: self.ctx.elapsed_secs(),
            home: self.ctx.home(),
        };
        let source = expand_variables(&expanded, &self.ctx.scope, &special);
        let parsed = match parse(&source) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!(error = %e, "parse failed");
                let (mut result, rendered) = self.finish_early(2, format!("{ERROR_PREFIX} {e}"));
                result.out.insert_str(0, &total.out);
                return (result, text + &rendered);
            }
        };

        for link in &parsed.links {
            if self.ctx.interrupt.is_set() {
                break;
            }
            if !link.connector.should_run(self.ctx.last_status) {
                continue;
            }

            let result = if link.background {
                let job = self.ctx.jobs.start(link.pipeline.display());
                let mut result = self.runner.run(&link.pipeline, &mut self.ctx).await;
                self.ctx.jobs.finish(job.id, result.code);
                self.ctx.last_background = Some(job.pid);
                tracing::debug!(job = %job.id, pid = job.pid, code = result.code, "background link finished");
                result.out.insert_str(0, &format!("[{}] {}\n", job.id, job.pid));
                result.code = 0;
                result
            } else {
                self.runner.run(&link.pipeline, &mut self.ctx).await
            };

            self.ctx.last_status = result.code;
            text.push_str(&result.rendered());
            total.out.push_str(&result.out);
            push_line(&mut total.err, &result.err);
            self.ctx.repair_cwd();
        }

        if self.ctx.interrupt.is_set() {
            tracing::debug!("line interrupted");
            push_line(&mut text, "^C");
            push_line(&mut total.out, "^C");
            self.ctx.last_status = INTERRUPTED;
        }
        total.code = self.ctx.last_status;
        (total, text)
    }

    /// End a line before anything ran, with `message` as its only output.
    fn finish_early(&mut self, code: i64, message: String) -> (ExecResult, String) {
        self.ctx.last_status = code;
        let result = ExecResult::failure(code, message);
        let text = result.rendered();
        (result, text)
    }

    /// Follow `HISTSIZE` if the user changed it.
    fn apply_histsize(&mut self) {
        let wanted = self.ctx.scope.get("HISTSIZE").and_then(|v| v.parse::<usize>().ok());
        if let Some(size) = wanted {
            if size != self.ctx.history.capacity() {
                self.ctx.history.set_capacity(size);
            }
        }
    }

    /// `user@host:~/dir$ `, with `#` for root.
    pub fn prompt(&self) -> String {
        let host = self.ctx.hostname.split('.').next().unwrap_or_default();
        let sigil = if self.ctx.user == "root" { '#' } else { '$' };
        format!("{}@{}:{}{} ", self.ctx.user, host, self.ctx.display_cwd(), sigil)
    }

    /// Completions for the last word of `partial`, sorted and deduplicated.
    ///
    /// The first word completes against command names and aliases. Later
    /// words complete the final path component against the VFS, with a `/`
    /// after directories. Dotfiles are offered only for a prefix that
    /// starts with `.`.
    pub fn complete(&self, partial: &str) -> Vec<String> {
        let words: Vec<&str> = partial.split_whitespace().collect();
        let ends_in_blank = partial.ends_with(char::is_whitespace);
        let candidates: BTreeSet<String> = match words.as_slice() {
            [] => self.command_names(""),
            [first] if !ends_in_blank => self.command_names(first),
            [.., last] if !ends_in_blank => self.path_completions(last),
            _ => self.path_completions(""),
        };
        candidates.into_iter().collect()
    }

    fn command_names(&self, prefix: &str) -> BTreeSet<String> {
        self.tools
            .names()
            .chain(self.ctx.aliases.keys().map(String::as_str))
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string)
            .collect()
    }

    fn path_completions(&self, word: &str) -> BTreeSet<String> {
        let (dir, prefix) = match word.rsplit_once('/') {
            Some(("", prefix)) => ("/", prefix),
            Some((dir, prefix)) => (dir, prefix),
            None => (".", word),
        };
        let resolved = self.ctx.resolve_path(dir);
        let Ok(entries) = self.ctx.vfs.list(&resolved) else {
            return BTreeSet::new();
        };
        entries
            .into_iter()
            .filter(|entry| entry.name.starts_with(prefix))
            .filter(|entry| prefix.starts_with('.') || !entry.name.starts_with('.'))
            .map(|entry| {
                if self.ctx.vfs.is_dir(&vfs_path::join(&resolved, &entry.name)) {
                    format!("{}/", entry.name)
                } else {
                    entry.name
                }
            })
            .collect()
    }

    /// Record a new terminal size in `COLUMNS` and `LINES`.
    pub fn resize(&mut self, cols: u16, rows: u16) {
        self.ctx.scope.set("COLUMNS", cols.to_string());
        self.ctx.scope.set("LINES", rows.to_string());
        tracing::debug!(session = %self.name, cols, rows, "terminal resized");
    }

    /// Ask the running line to stop.
    pub fn interrupt(&self) {
        self.ctx.interrupt.interrupt();
    }

    /// A handle that can interrupt this session from another task.
    pub fn interrupt_handle(&self) -> InterruptHandle {
        self.ctx.interrupt.clone()
    }

    pub fn snapshot_filesystem(&self) -> Snapshot {
        self.ctx.vfs.export()
    }

    /// Replace the filesystem with `snapshot`. The shell moves to the home
    /// directory, or `/` if the snapshot has none.
    pub fn restore_filesystem(&mut self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        self.ctx.vfs.import(snapshot)?;
        let home = self.ctx.home();
        let dir = if self.ctx.vfs.is_dir(&home) { home } else { "/".to_string() };
        self.ctx.set_cwd(dir);
        tracing::info!(session = %self.name, cwd = %self.ctx.cwd, "filesystem restored");
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cwd(&self) -> &str {
        &self.ctx.cwd
    }

    pub fn user(&self) -> &str {
        &self.ctx.user
    }

    pub fn env_var(&self, name: &str) -> Option<&str> {
        self.ctx.scope.get(name)
    }

    pub fn last_status(&self) -> i64 {
        self.ctx.last_status
    }

    pub fn history(&self) -> &History {
        &self.ctx.history
    }

    pub fn aliases(&self) -> &BTreeMap<String, String> {
        &self.ctx.aliases
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    pub fn vfs(&self) -> &Vfs {
        &self.ctx.vfs
    }

    pub fn vfs_mut(&mut self) -> &mut Vfs {
        &mut self.ctx.vfs
    }
}

/// Variables a login shell starts with.
fn login_environment(ctx: &mut ExecContext, config: &SessionConfig, cwd: &str) {
    let uid = login_uid(ctx, &config.user);
    let exported = [
        ("USER", config.user.clone()),
        ("LOGNAME", config.user.clone()),
        ("HOME", config.home.clone()),
        ("PWD", cwd.to_string()),
        ("OLDPWD", cwd.to_string()),
        ("SHELL", "/bin/bash".to_string()),
        ("PATH", DEFAULT_PATH.to_string()),
        ("TERM", "xterm-256color".to_string()),
        ("LANG", "en_US.UTF-8".to_string()),
        ("EDITOR", "vi".to_string()),
        ("PAGER", "less".to_string()),
        ("TMPDIR", "/tmp".to_string()),
    ];
    for (name, value) in exported {
        ctx.scope.export(name, value);
    }

    let local = [
        ("HOSTNAME", config.hostname.clone()),
        ("HISTSIZE", config.history_size.to_string()),
        ("PS1", r"\u@\h:\w\$ ".to_string()),
        ("UID", uid.to_string()),
    ];
    for (name, value) in local {
        ctx.scope.set(name, value);
    }
}

/// The user's uid from `/etc/passwd`; 0 for root, 1000 when unknown.
fn login_uid(ctx: &mut ExecContext, user: &str) -> u32 {
    let from_passwd = ctx.vfs.read_to_string("/etc/passwd").ok().and_then(|text| {
        text.lines().find_map(|line| {
            let mut fields = line.split(':');
            (fields.next()? == user).then_some(())?;
            fields.nth(1)?.parse().ok()
        })
    });
    from_passwd.unwrap_or(if user == "root" { 0 } else { 1000 })
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn session() -> Session {
        Session::new(SessionConfig::default()).unwrap()
    }

    #[tokio::test]
    async fn completes_commands_and_aliases() {
        let s = session().await;
        assert_eq!(s.complete("he"), ["head", "help"]);
        assert_eq!(s.complete("l"), ["l", "la", "ll", "ln", "ls"]);
        assert!(s.complete("").contains(&"grep".to_string()));
    }

    #[tokio::test]
    async fn completes_paths() {
        let s = session().await;
        assert_eq!(s.complete("cd Do"), ["Documents/", "Downloads/"]);
        assert_eq!(s.complete("cat /etc/ho"), ["hostname", "hosts"]);
        assert_eq!(s.complete("ls .ba"), [".bash_logout", ".bashrc"]);
        assert!(s.complete("ls ").contains(&"Music/".to_string()));
        assert!(!s.complete("ls ").iter().any(|c| c.starts_with('.')));
        assert!(s.complete("cat /nope/x").is_empty());
    }

    #[tokio::test]
    async fn resize_sets_columns_and_lines() {
        let mut s = session().await;
        s.resize(120, 40);
        assert_eq!(s.env_var("COLUMNS"), Some("120"));
        assert_eq!(s.execute("echo $COLUMNS x $LINES").await, "120 x 40\n");
    }

    #[tokio::test]
    async fn prompt_tracks_user_and_cwd() {
        let mut s = session().await;
        assert_eq!(s.prompt(), "user@termsim:~$ ");
        s.execute("cd /tmp").await;
        assert_eq!(s.prompt(), "user@termsim:/tmp$ ");

        let root = Session::new(SessionConfig::root()).unwrap();
        assert_eq!(root.prompt(), "root@termsim:~# ");
        assert_eq!(root.cwd(), "/root");
    }

    #[tokio::test]
    async fn login_environment_is_set() {
        let s = session().await;
        assert_eq!(s.env_var("HOME"), Some("/home/user"));
        assert_eq!(s.env_var("SHELL"), Some("/bin/bash"));
        assert_eq!(s.env_var("UID"), Some("1000"));
        assert_eq!(s.aliases().get("ll").map(String::as_str), Some("ls -la"));
    }

    #[tokio::test]
    async fn blank_and_comment_lines_are_not_recorded() {
        let mut s = session().await;
        assert_eq!(s.execute("   ").await, "");
        assert_eq!(s.execute("# just a note").await, "");
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn history_expansion_is_echoed() {
        let mut s = session().await;
        s.execute("echo hi").await;
        assert_eq!(s.execute("!!").await, "echo hi\nhi\n");
        assert_eq!(s.history().last(), Some("echo hi"));
        assert_eq!(s.history().len(), 2);
    }

    #[tokio::test]
    async fn unknown_event() {
        let mut s = session().await;
        let result = s.run_line("!nothing").await;
        assert_eq!(result.code, 1);
        assert_eq!(result.err, "-bash: !nothing: event not found");
        assert!(s.history().is_empty());
    }

    #[tokio::test]
    async fn syntax_errors_have_status_2() {
        let mut s = session().await;
        let result = s.run_line("echo hi |").await;
        assert_eq!(result.code, 2);
        assert!(result.err.starts_with("-bash: syntax error"));
        assert_eq!(s.last_status(), 2);
    }

    #[tokio::test]
    async fn status_is_visible_on_the_next_line() {
        let mut s = session().await;
        s.execute("false").await;
        assert_eq!(s.execute("echo $?").await, "1\n");
        assert_eq!(s.execute("echo $?").await, "0\n");
    }

    #[tokio::test]
    async fn aliases_expand_once() {
        let mut s = session().await;
        s.execute("alias hello='echo hello'").await;
        assert_eq!(s.execute("hello world").await, "hello world\n");
        s.execute("alias echo='echo loop'").await;
        assert_eq!(s.execute("echo x").await, "loop x\n");
    }

    #[tokio::test]
    async fn background_links_are_jobs() {
        let mut s = session().await;
        let out = s.execute("echo bg &").await;
        assert_eq!(out, "[1] 1000\nbg\n");
        assert_eq!(s.execute("echo $!").await, "1000\n");
        assert_eq!(s.execute("jobs").await, "[1]+  Done                    echo bg\n");
    }

    #[tokio::test]
    async fn histsize_bounds_history() {
        let mut s = session().await;
        s.execute("HISTSIZE=2").await;
        s.execute("echo a").await;
        s.execute("echo b").await;
        assert_eq!(s.history().len(), 2);
        assert_eq!(s.history().capacity(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn interrupt_stops_the_line() {
        let mut s = session().await;
        let handle = s.interrupt_handle();
        let (result, ()) = tokio::join!(s.run_line("sleep 30; echo after"), async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            handle.interrupt();
        });
        assert_eq!(result.code, 130);
        assert_eq!(result.out, "^C\n");
        assert_eq!(s.last_status(), 130);

        // Session state survives and the next line runs normally.
        assert_eq!(s.execute("echo again").await, "again\n");
    }

    #[tokio::test]
    async fn restore_moves_home() {
        let mut s = session().await;
        let snapshot = s.snapshot_filesystem();
        s.execute("cd /tmp && touch scratch").await;
        s.restore_filesystem(&snapshot).unwrap();
        assert_eq!(s.cwd(), "/home/user");
        assert!(!s.vfs().exists("/tmp/scratch"));
    }

    #[tokio::test]
    async fn removed_cwd_is_repaired() {
        let mut s = session().await;
        s.execute("mkdir -p /tmp/a/b && cd /tmp/a/b").await;
        s.execute("rm -r /tmp/a").await;
        assert_eq!(s.cwd(), "/tmp");
    }

    #[test]
    fn isolated_sessions_start_empty() {
        let s = Session::new(SessionConfig::isolated()).unwrap();
        assert_eq!(s.cwd(), "/");
        assert!(!s.vfs().exists("/etc/passwd"));
    }

    #[test]
    fn missing_cwd_is_an_error() {
        assert!(Session::new(SessionConfig::default().with_cwd("/nowhere")).is_err());
    }

    #[test]
    fn config_builders() {
        let config = SessionConfig::default()
            .with_user("alice")
            .with_hostname("lab.example.com")
            .with_history_size(50);
        assert_eq!(config.home, "/home/alice");
        let s = Session::new(config).unwrap();
        assert_eq!(s.cwd(), "/home/alice");
        assert_eq!(s.prompt(), "alice@lab:~$ ");
        assert_eq!(s.history().capacity(), 50);
    }
}
