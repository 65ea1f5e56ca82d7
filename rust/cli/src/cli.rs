//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use tactica_engine::definition::GameMode;

#[derive(Parser, Debug)]
#[command(
    name = "tactica",
    version,
    about = "Tactica session engine: headless simulations and configuration"
)]
pub struct TacticaCli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a full session between bots and print its statistics report
    Sim {
        /// Number of players (at least 2)
        #[arg(long, default_value_t = 2)]
        players: usize,
        /// Stop the game once this many turns have been played
        #[arg(long, default_value_t = 20)]
        turns: u32,
        /// Seed for the player rosters
        #[arg(long)]
        seed: Option<u64>,
        /// Side length of the square arena
        #[arg(long, default_value_t = 10)]
        size: usize,
        #[arg(long, value_enum, default_value_t = Mode::Classic)]
        mode: Mode,
        /// Bot driving every player
        #[arg(long)]
        bot: Option<String>,
    },
    /// Display the resolved configuration and where each value came from
    Cfg,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    Classic,
    Ctf,
}

impl From<Mode> for GameMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Classic => GameMode::Classic,
            Mode::Ctf => GameMode::CaptureTheFlag,
        }
    }
}
