//! ps — Report a snapshot of the current processes.
//!
//! The process list is a fixed set of system daemons plus the login shell
//! and `ps` itself. Forms understood: plain `ps`, BSD `ps aux`/`ps ax`, and
//! System V `ps -e`/`ps -ef`.

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::interpreter::ExecResult;
use crate::tools::{ExecContext, ParamSchema, Tool, ToolArgs, ToolSchema};

use super::free::meminfo;

const TERMINAL: &str = "pts/0";

struct Process {
    user: String,
    pid: u32,
    ppid: u32,
    vsz: u64,
    rss: u64,
    tty: &'static str,
    stat: &'static str,
    command: String,
}

const DAEMONS: &[(&str, u32, u32, u64, u64, &str, &str)] = &[
    ("root", 1, 0, 167_536, 11_520, "Ss", "/sbin/init"),
    ("root", 2, 0, 0, 0, "S", "[kthreadd]"),
    ("root", 412, 1, 47_640, 15_360, "S<s", "/lib/systemd/systemd-journald"),
    ("syslog", 587, 1, 222_400, 5_376, "Ssl", "/usr/sbin/rsyslogd -n -iNONE"),
    ("root", 611, 1, 15_432, 9_216, "Ss", "sshd: /usr/sbin/sshd -D [listener] 0 of 10-100 startups"),
    ("root", 640, 1, 6_896, 2_944, "Ss", "/usr/sbin/cron -f"),
];

/// Ps tool.
pub struct Ps;

#[async_trait]
impl Tool for Ps {
    fn name(&self) -> &str {
        "ps"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ps", "Report a snapshot of the current processes")
            .param(ParamSchema::flag("every", "Select all processes").with_aliases(["-e", "-A"]))
            .param(ParamSchema::flag("full", "Full-format listing").with_aliases(["-f"]))
            .example("Processes in this terminal", "ps")
            .example("Every process, BSD style", "ps aux")
            .example("Every process, full format", "ps -ef")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let bsd: String = args.positional.concat();
        if let Some(bad) = bsd.chars().find(|c| !matches!(c, 'a' | 'u' | 'x')) {
            return ExecResult::failure(1, format!("error: unsupported option (BSD syntax): {bad}"));
        }
        let every = args.has_flag("every") || bsd.contains('a') || bsd.contains('x');
        let processes = processes(ctx, &args.argv, every);

        let started = (Utc::now() - Duration::seconds(ctx.elapsed_secs() as i64))
            .format("%H:%M")
            .to_string();

        let out = if bsd.contains('u') {
            let total_kb = meminfo(ctx)
                .ok()
                .and_then(|info| info.get("MemTotal").copied())
                .filter(|kb| *kb > 0)
                .unwrap_or(1);
            user_format(&processes, &started, total_kb)
        } else if args.has_flag("full") {
            full_format(&processes, &started)
        } else {
            short_format(&processes)
        };
        ExecResult::success(out)
    }
}

fn processes(ctx: &mut ExecContext, argv: &[String], every: bool) -> Vec<Process> {
    let mut list = Vec::new();
    if every {
        list.extend(DAEMONS.iter().map(|&(user, pid, ppid, vsz, rss, stat, command)| Process {
            user: user.to_string(),
            pid,
            ppid,
            vsz,
            rss,
            tty: "?",
            stat,
            command: command.to_string(),
        }));
    }
    list.push(Process {
        user: ctx.user.clone(),
        pid: ctx.pid,
        ppid: 611,
        vsz: 8_956,
        rss: 5_376,
        tty: TERMINAL,
        stat: "Ss",
        command: "-bash".to_string(),
    });
    let mut command = vec!["ps".to_string()];
    command.extend(argv.iter().cloned());
    list.push(Process {
        user: ctx.user.clone(),
        pid: ctx.jobs.allocate_pid(),
        ppid: ctx.pid,
        vsz: 10_072,
        rss: 3_456,
        tty: TERMINAL,
        stat: "R+",
        command: command.join(" "),
    });
    list
}

/// Short command name for the default listing.
fn comm(command: &str) -> &str {
    let first = command.split_whitespace().next().unwrap_or(command);
    let first = first.trim_start_matches('-');
    first.rsplit('/').next().unwrap_or(first)
}

fn short_format(processes: &[Process]) -> String {
    let mut out = format!("{:>7} {:<8} {:>8} {}\n", "PID", "TTY", "TIME", "CMD");
    for p in processes {
        out.push_str(&format!("{:>7} {:<8} {:>8} {}\n", p.pid, p.tty, "00:00:00", comm(&p.command)));
    }
    out
}

fn full_format(processes: &[Process], started: &str) -> String {
    let line = |uid: &str, pid: &str, ppid: &str, c: &str, stime: &str, tty: &str, time: &str, cmd: &str| {
        format!("{uid:<8} {pid:>7} {ppid:>7} {c:>2} {stime:<5} {tty:<8} {time:>8} {cmd}\n")
    };
    let mut out = line("UID", "PID", "PPID", "C", "STIME", "TTY", "TIME", "CMD");
    for p in processes {
        out.push_str(&line(
            &p.user,
            &p.pid.to_string(),
            &p.ppid.to_string(),
            "0",
            started,
            p.tty,
            "00:00:00",
            &p.command,
        ));
    }
    out
}

fn user_format(processes: &[Process], started: &str, total_kb: u64) -> String {
    let mut out = format!(
        "{:<10} {:>6} {:>4} {:>4} {:>6} {:>5} {:<8} {:<4} {:>5} {:>6} {}\n",
        "USER", "PID", "%CPU", "%MEM", "VSZ", "RSS", "TTY", "STAT", "START", "TIME", "COMMAND"
    );
    for p in processes {
        let mem = p.rss as f64 * 100.0 / total_kb as f64;
        out.push_str(&format!(
            "{:<10} {:>6} {:>4.1} {:>4.1} {:>6} {:>5} {:<8} {:<4} {:>5} {:>6} {}\n",
            p.user, p.pid, 0.0, mem, p.vsz, p.rss, p.tty, p.stat, started, "0:00", p.command
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::testing::{make_seeded_ctx, run_tool};

    #[tokio::test]
    async fn terminal_processes_by_default() {
        let mut ctx = make_seeded_ctx();
        let out = run_tool(&Ps, &mut ctx, &[]).await.out;
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "    PID TTY          TIME CMD");
        assert_eq!(lines[1], "    999 pts/0    00:00:00 bash");
        assert!(lines[2].ends_with("00:00:00 ps"));
    }

    #[tokio::test]
    async fn bsd_user_format() {
        let mut ctx = make_seeded_ctx();
        let out = run_tool(&Ps, &mut ctx, &["aux"]).await.out;
        assert!(out.starts_with("USER"));
        assert!(out.contains("/sbin/init"));
        assert!(out.lines().last().unwrap().ends_with("ps aux"));
        assert!(out.lines().any(|l| l.starts_with("user") && l.ends_with("-bash")));
    }

    #[tokio::test]
    async fn full_format_lists_parents() {
        let mut ctx = make_seeded_ctx();
        let out = run_tool(&Ps, &mut ctx, &["-ef"]).await.out;
        assert!(out.starts_with("UID"));
        let ps_line = out.lines().last().unwrap();
        let fields: Vec<&str> = ps_line.split_whitespace().collect();
        assert_eq!(fields[0], "user");
        assert_eq!(fields[2], "999");
        assert!(ps_line.ends_with("ps -ef"));
    }

    #[tokio::test]
    async fn each_run_gets_a_new_pid() {
        let mut ctx = make_seeded_ctx();
        let first = run_tool(&Ps, &mut ctx, &[]).await.out;
        let second = run_tool(&Ps, &mut ctx, &[]).await.out;
        assert_ne!(first.lines().last(), second.lines().last());
    }

    #[tokio::test]
    async fn unknown_bsd_letter() {
        let mut ctx = make_seeded_ctx();
        let result = run_tool(&Ps, &mut ctx, &["auz"]).await;
        assert_eq!(result.err, "error: unsupported option (BSD syntax): z");
    }
}
