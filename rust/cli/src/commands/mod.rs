//! Command handlers, one module per subcommand.
//!
//! Handlers take their output streams as `&mut dyn Write` and return
//! `Result<(), CliError>`; [`run`](crate::run) maps the result to an exit code.

pub mod cfg;
pub mod sim;

pub use cfg::handle_cfg_command;
pub use sim::{handle_sim_command, SimOptions};
