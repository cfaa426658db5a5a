//! termsim REPL: drives one simulated shell session from a real terminal.
//!
//! Line editing and in-memory history come from rustyline. Everything typed
//! is handed to the session verbatim except `exit` and `logout`, which end
//! the loop.

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;

use termsim_kernel::{Session, SessionConfig};

/// What the caller should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Print this text (possibly empty) and keep reading.
    Continue(String),
    /// Leave the loop.
    Exit,
}

/// A session plus the runtime that drives it.
pub struct Repl {
    session: Session,
    runtime: Runtime,
}

impl Repl {
    /// Create a REPL for the default user, with `TERMSIM_*` overrides applied.
    pub fn new() -> Result<Self> {
        Self::with_config(SessionConfig::from_env())
    }

    pub fn with_config(config: SessionConfig) -> Result<Self> {
        let session = Session::new(config).context("Failed to create session")?;
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;
        Ok(Self { session, runtime })
    }

    pub fn prompt(&self) -> String {
        self.session.prompt()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run one line through the session.
    pub fn process_line(&mut self, line: &str) -> Outcome {
        if matches!(line.trim(), "exit" | "logout") {
            return Outcome::Exit;
        }
        let session = &mut self.session;
        Outcome::Continue(self.runtime.block_on(session.execute(line)))
    }

    /// Run a single line and return its exit status.
    pub fn run_once(&mut self, line: &str) -> i64 {
        if let Outcome::Continue(text) = self.process_line(line) {
            print!("{text}");
        }
        self.session.last_status()
    }
}

/// Interactive loop until `exit`, `logout` or end of input.
pub fn run(mut repl: Repl) -> Result<()> {
    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    loop {
        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }
                match repl.process_line(&line) {
                    Outcome::Continue(text) => print!("{text}"),
                    Outcome::Exit => {
                        println!("logout");
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("logout");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    Ok(())
}
