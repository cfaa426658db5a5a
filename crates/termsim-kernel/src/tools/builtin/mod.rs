//! Built-in tools for termsim.
//!
//! These tools are always available. Each one follows its coreutils
//! namesake's output and message wording closely enough that a user's
//! muscle memory works.

mod alias;
mod basename;
mod cat;
mod cd;
mod chmod;
mod clear;
mod cp;
mod curl;
mod date;
mod du;
mod echo;
mod env;
mod export;
mod free;
mod grep;
mod head;
mod help;
mod history;
mod hostname;
mod jobs;
mod ln;
mod ls;
mod mkdir;
mod mv;
mod ps;
mod rm;
mod seq;
mod sleep;
mod sort;
mod stat;
mod tail;
mod tee;
mod touch;
mod true_false;
mod uname;
mod uniq;
mod uptime;
mod wc;
mod which;

use crate::interpreter::ExecResult;

use super::{ExecContext, ToolRegistry};

/// Register all built-in tools with the registry.
pub fn register_builtins(registry: &mut ToolRegistry) {
    // Files
    registry.register(ls::Ls);
    registry.register(cat::Cat);
    registry.register(cd::Cd);
    registry.register(cd::Pwd);
    registry.register(mkdir::Mkdir);
    registry.register(mkdir::Rmdir);
    registry.register(rm::Rm);
    registry.register(touch::Touch);
    registry.register(cp::Cp);
    registry.register(mv::Mv);
    registry.register(ln::Ln);
    registry.register(ln::Readlink);
    registry.register(chmod::Chmod);
    registry.register(chmod::Chown);
    registry.register(stat::Stat);
    registry.register(du::Du);
    registry.register(du::Df);
    registry.register(tee::Tee);

    // Text
    registry.register(echo::Echo);
    registry.register(head::Head);
    registry.register(tail::Tail);
    registry.register(wc::Wc);
    registry.register(sort::Sort);
    registry.register(uniq::Uniq);
    registry.register(grep::Grep);
    registry.register(seq::Seq);
    registry.register(basename::Basename);
    registry.register(basename::Dirname);

    // Session
    registry.register(export::Export);
    registry.register(export::Unset);
    registry.register(env::Env);
    registry.register(env::Printenv);
    registry.register(alias::Alias);
    registry.register(alias::Unalias);
    registry.register(history::HistoryTool);
    registry.register(true_false::True);
    registry.register(true_false::False);
    registry.register(which::Type);
    registry.register(which::Which);
    registry.register(help::Help);
    registry.register(clear::Clear);
    registry.register(jobs::Jobs);

    // System
    registry.register(hostname::Whoami);
    registry.register(hostname::Hostname);
    registry.register(uname::Uname);
    registry.register(date::Date);
    registry.register(uptime::Uptime);
    registry.register(sleep::Sleep);
    registry.register(ps::Ps);
    registry.register(free::Free);

    // Network
    registry.register(curl::Curl);
    registry.register(curl::Wget);
}

/// Commands bash itself implements; `which` cannot find these on `PATH`.
pub(crate) const SHELL_BUILTINS: &[&str] = &[
    "alias", "cd", "echo", "export", "false", "help", "history", "jobs", "pwd", "true", "type",
    "unalias", "unset",
];

/// `cmd: missing operand` in coreutils wording.
pub(crate) fn missing_operand(cmd: &str) -> ExecResult {
    ExecResult::failure(
        1,
        format!("{cmd}: missing operand\nTry '{cmd} --help' for more information."),
    )
}

/// Sizes the way `ls -h` and `du -h` print them: `512`, `4.0K`, `1.2M`.
pub(crate) fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["K", "M", "G", "T", "P"];
    if bytes < 1024 {
        return bytes.to_string();
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    if value < 10.0 {
        format!("{:.1}{}", (value * 10.0).ceil() / 10.0, UNITS[unit])
    } else {
        format!("{}{}", value.ceil() as u64, UNITS[unit])
    }
}

/// Numeric id for a user or group name from `/etc/passwd` or `/etc/group`.
pub(crate) fn lookup_id(ctx: &mut ExecContext, database: &str, name: &str) -> Option<u32> {
    let text = ctx.vfs.read_to_string(database).ok()?;
    text.lines()
        .filter_map(|line| {
            let mut fields = line.split(':');
            let entry = fields.next()?;
            let id = fields.nth(1)?.parse().ok()?;
            Some((entry, id))
        })
        .find(|(entry, _)| *entry == name)
        .map(|(_, id)| id)
}

/// Join a child name onto a path as the user typed it, without resolving.
pub(crate) fn display_join(shown: &str, name: &str) -> String {
    if shown.ends_with('/') {
        format!("{shown}{name}")
    } else {
        format!("{shown}/{name}")
    }
}

/// 1K blocks occupied by `bytes`, allocated in 4K chunks.
pub(crate) fn blocks_1k(bytes: u64) -> u64 {
    bytes.div_ceil(4096) * 4
}
