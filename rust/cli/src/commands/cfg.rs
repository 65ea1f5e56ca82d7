//! `cfg`: prints the resolved configuration with the source of every value.
//!
//! ```json
//! {
//!   "turn_duration_ms": {
//!     "value": 500,
//!     "source": "default"
//!   },
//!   ...
//! }
//! ```

use crate::config;
use crate::error::CliError;
use crate::ui;
use std::io::Write;

pub fn handle_cfg_command(out: &mut dyn Write, err: &mut dyn Write) -> Result<(), CliError> {
    let resolved = match config::load_with_sources() {
        Ok(r) => r,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(format!("Invalid configuration: {}", e)));
        }
    };

    let config::ConfigResolved { config, sources } = resolved;
    let settings = &config.settings;
    let display = serde_json::json!({
        "turn_duration_ms": {
            "value": settings.turn_duration_ms,
            "source": sources.turn_duration_ms,
        },
        "transition_delay_ms": {
            "value": settings.transition_delay_ms,
            "source": sources.transition_delay_ms,
        },
        "combat_round_ms": {
            "value": settings.combat_round_ms,
            "source": sources.combat_round_ms,
        },
        "statistics_retention_secs": {
            "value": settings.statistics_retention_secs,
            "source": sources.statistics_retention_secs,
        },
        "actions_per_turn": {
            "value": settings.actions_per_turn,
            "source": sources.actions_per_turn,
        },
        "wins_to_victory": {
            "value": settings.wins_to_victory,
            "source": sources.wins_to_victory,
        },
        "seed": {
            "value": config.seed,
            "source": sources.seed,
        },
        "bot": {
            "value": config.bot,
            "source": sources.bot,
        }
    });
    let json_str = serde_json::to_string_pretty(&display).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}
