//! # Tactica CLI Library
//!
//! Command-line front end for the Tactica session engine.
//!
//! ## Main Entry Point
//!
//! The primary entry point is the [`run`] function, which parses command-line
//! arguments and executes the appropriate subcommand.
//!
//! ```no_run
//! use std::io;
//! let args = vec!["tactica", "sim", "--players", "2", "--turns", "10"];
//! let code = tactica_cli::run(args, &mut io::stdout(), &mut io::stderr());
//! assert_eq!(code, 0);
//! ```
//!
//! ## Available Subcommands
//!
//! - `sim`: Play a headless session between bots and print its statistics
//! - `cfg`: Display the resolved configuration with value sources

use clap::Parser;
use std::io::Write;
pub mod cli;
pub mod commands;
pub mod config;
mod error;
pub mod exit_code;
pub mod ui;

use cli::{Commands, TacticaCli};
use commands::{handle_cfg_command, handle_sim_command, SimOptions};

pub use error::CliError;

/// Installs the global log subscriber when `RUST_LOG` is set. The format is
/// read from `TACTICA_LOG_FORMAT` (`pretty` or `json`). Returns `Ok(false)`
/// when logging stays off.
pub fn init_logging_from_env() -> Result<bool, tracing::subscriber::SetGlobalDefaultError> {
    if std::env::var_os("RUST_LOG").is_none() {
        return Ok(false);
    }
    let format = std::env::var("TACTICA_LOG_FORMAT")
        .ok()
        .and_then(|v| v.parse::<tactica_server::LogFormat>().ok())
        .unwrap_or_default();
    tactica_server::init_logging(format)?;
    Ok(true)
}

/// Parses `args` and runs the selected subcommand.
///
/// Help and version go to `out` with exit code `0`. Argument errors and
/// failed commands write to `err` and return `2`.
pub fn run<I, S>(args: I, out: &mut dyn Write, err: &mut dyn Write) -> i32
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    const COMMANDS: &[&str] = &["sim", "cfg"];
    let argv: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

    let parsed = TacticaCli::try_parse_from(&argv);
    match parsed {
        Err(e) => {
            use clap::error::ErrorKind;

            match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                    if write!(out, "{}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::SUCCESS
                }
                _ => {
                    if writeln!(err, "{}", e).is_err()
                        || writeln!(err).is_err()
                        || writeln!(err, "Tactica CLI").is_err()
                        || writeln!(err, "Usage: tactica <command> [options]\n").is_err()
                        || writeln!(err, "Commands:").is_err()
                    {
                        return exit_code::ERROR;
                    }
                    for c in COMMANDS {
                        if writeln!(err, "  {}", c).is_err() {
                            return exit_code::ERROR;
                        }
                    }
                    if writeln!(err, "\nFor full help, run: tactica --help").is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::ERROR
                }
            }
        }
        Ok(cli) => {
            let result = match cli.cmd {
                Commands::Cfg => handle_cfg_command(out, err),
                Commands::Sim {
                    players,
                    turns,
                    seed,
                    size,
                    mode,
                    bot,
                } => handle_sim_command(
                    SimOptions {
                        players,
                        turns,
                        seed,
                        size,
                        mode,
                        bot,
                    },
                    out,
                    err,
                ),
            };
            match result {
                Ok(()) => exit_code::SUCCESS,
                Err(e) => {
                    if writeln!(err, "Error: {}", e).is_err() {
                        return exit_code::ERROR;
                    }
                    exit_code::ERROR
                }
            }
        }
    }
}
