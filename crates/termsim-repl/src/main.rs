//! termsim CLI entry point.
//!
//! Usage:
//!   termsim                    # Interactive session
//!   termsim -c <command>       # Execute one line and exit with its status

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use termsim_repl::Repl;

fn main() -> ExitCode {
    // Logs go to stderr so they never mix with simulated output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            termsim_repl::run(Repl::new()?)?;
            Ok(ExitCode::SUCCESS)
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("termsim {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let line = args.get(2).context("-c requires a command argument")?;
            let status = Repl::new()?.run_once(line);
            Ok(ExitCode::from(status.clamp(0, 255) as u8))
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'termsim --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn print_help() {
    println!(
        r#"termsim v{}

Usage:
  termsim                      Interactive session
  termsim -c <command>         Execute one line and exit

Options:
  -c <command>                 Execute command line and exit
  -h, --help                   Show this help
  -V, --version                Show version

Environment:
  TERMSIM_USER                 Login user (default: user)
  TERMSIM_HOSTNAME             Host name (default: termsim)
  TERMSIM_HISTSIZE             History size (default: 1000)
  TERMSIM_FETCH_TIMEOUT_SECS   curl/wget timeout (default: 10)
  RUST_LOG                     Log filter, written to stderr
"#,
        env!("CARGO_PKG_VERSION")
    );
}
