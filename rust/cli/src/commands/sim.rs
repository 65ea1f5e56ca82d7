//! `sim`: plays one headless session between bots and prints its statistics
//! report as JSON.
//!
//! The seed fixes the player rosters (names and stat bonuses). Start points
//! are still drawn by the session initializer, so two runs with the same seed
//! can place players differently.
//!
//! ```no_run
//! use std::io;
//! let code = tactica_cli::run(
//!     ["tactica", "sim", "--players", "3", "--turns", "30", "--seed", "7"],
//!     &mut io::stdout(),
//!     &mut io::stderr(),
//! );
//! assert_eq!(code, 0);
//! ```

use crate::cli::Mode;
use crate::config;
use crate::error::CliError;
use crate::ui;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use std::io::Write;
use std::sync::Arc;
use tactica_ai::{create_bot, Bot, BotAction};
use tactica_engine::definition::{GameDefinition, GameMode};
use tactica_engine::player::{PlayerSeed, StatBlock, DEFAULT_STATS};
use tactica_engine::session::WaitingRoom;
use tactica_engine::statistics::GameStatistics;
use tactica_server::{
    EngineSettings, GameEvent, InMemoryDefinitions, SessionError, SessionOrchestrator,
};

const GAME_ID: &str = "arena";
const SESSION_CODE: &str = "SIM";
const MIN_ARENA_SIZE: usize = 4;
/// Stat points a player adds to either health or speed.
const ROSTER_BONUS: u32 = 2;

#[derive(Debug, Clone)]
pub struct SimOptions {
    pub players: usize,
    pub turns: u32,
    pub seed: Option<u64>,
    pub size: usize,
    pub mode: Mode,
    pub bot: Option<String>,
}

pub fn handle_sim_command(
    opts: SimOptions,
    out: &mut dyn Write,
    err: &mut dyn Write,
) -> Result<(), CliError> {
    if opts.players < 2 {
        ui::write_error(err, "players must be >= 2")?;
        return Err(CliError::InvalidInput("players must be >= 2".to_string()));
    }
    if opts.turns == 0 {
        ui::write_error(err, "turns must be >= 1")?;
        return Err(CliError::InvalidInput("turns must be >= 1".to_string()));
    }
    if opts.size < MIN_ARENA_SIZE {
        let msg = format!("size must be >= {}", MIN_ARENA_SIZE);
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    }

    let cfg = match config::load_with_sources() {
        Ok(resolved) => resolved.config,
        Err(e) => {
            ui::write_error(err, &format!("Invalid configuration: {}", e))?;
            return Err(CliError::Config(format!("Invalid configuration: {}", e)));
        }
    };

    let bot_name = opts.bot.clone().unwrap_or(cfg.bot);
    let Some(bot) = create_bot(&bot_name) else {
        let msg = format!("unknown bot: {}", bot_name);
        ui::write_error(err, &msg)?;
        return Err(CliError::InvalidInput(msg));
    };

    let seed = opts.seed.or(cfg.seed).unwrap_or_else(rand::random);
    let mode = GameMode::from(opts.mode);
    let room = WaitingRoom {
        code: SESSION_CODE.to_string(),
        game_id: GAME_ID.to_string(),
        players: roster(opts.players, seed),
        admin_mode: false,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let report = runtime.block_on(simulate(
        cfg.settings,
        GameDefinition::arena(GAME_ID, opts.size, mode, opts.players),
        room,
        mode,
        bot.as_ref(),
        opts.turns,
    ))?;

    tracing::info!(
        seed,
        players = opts.players,
        total_turns = report.global.total_turns,
        winner_id = ?report.winner_id,
        "simulation finished"
    );
    if report.winner_id.is_none() {
        ui::display_warning(err, &format!("no winner after {} turns", opts.turns))?;
    }
    let json_str = serde_json::to_string_pretty(&*report).map_err(std::io::Error::other)?;
    writeln!(out, "{}", json_str)?;
    Ok(())
}

/// Players `p1..pN` on default stats, each with a seeded bonus to health or speed.
fn roster(players: usize, seed: u64) -> Vec<PlayerSeed> {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    (1..=players)
        .map(|n| {
            let bonus = if rng.random_bool(0.5) {
                StatBlock::new(ROSTER_BONUS, 0, 0, 0)
            } else {
                StatBlock::new(0, ROSTER_BONUS, 0, 0)
            };
            PlayerSeed::new(format!("p{}", n), format!("Bot {}", n), DEFAULT_STATS)
                .with_bonus(bonus)
        })
        .collect()
}

async fn simulate(
    settings: EngineSettings,
    definition: GameDefinition,
    room: WaitingRoom,
    mode: GameMode,
    bot: &dyn Bot,
    max_turns: u32,
) -> Result<Arc<GameStatistics>, CliError> {
    let definitions = Arc::new(InMemoryDefinitions::new());
    definitions.insert(definition);
    let orch = SessionOrchestrator::with_definitions(settings, definitions)?;

    let sid = orch.create_session(room, mode)?;
    let result = play(&orch, &sid, bot, max_turns).await;
    if let Err(e) = orch.remove_session(&sid) {
        tracing::debug!(error = %e, "session already gone");
    }
    orch.shutdown();
    result
}

/// Drives every player with `bot` until the game ends or `max_turns` turns
/// have been played.
async fn play(
    orch: &SessionOrchestrator,
    sid: &str,
    bot: &dyn Bot,
    max_turns: u32,
) -> Result<Arc<GameStatistics>, CliError> {
    let settings = orch.settings();
    // no event for this long means no timer is armed any more
    let stall = (settings.turn_duration() + settings.transition_delay() + settings.combat_round()) * 2;

    let mut sub = orch.subscribe(sid);
    orch.start_game(sid)?;
    // a turn is playable once its `turn.started` is out; before that the
    // active player's budget is still empty
    let mut live_turn = 0;

    loop {
        while let Ok(event) = sub.receiver.try_recv() {
            observe(&event, &mut live_turn);
        }

        let session = orch.session(sid)?;
        if session.is_over() {
            break;
        }
        if let Some(turn) = &session.turn
            && turn.turn_number > max_turns
        {
            return Ok(orch.end_game(sid)?);
        }

        let actor = match (&session.combat, &session.turn) {
            (Some(combat), _) => Some(combat.current_fighter.clone()),
            (None, Some(turn)) if turn.turn_number == live_turn => {
                Some(turn.active_player_id.clone())
            }
            _ => None,
        };
        let decision = actor.and_then(|id| bot.decide(&session, &id).map(|action| (id, action)));
        if let Some((player_id, action)) = decision {
            match submit(orch, sid, &player_id, &action) {
                Ok(()) => continue,
                Err(e) => tracing::warn!(
                    player_id = %player_id,
                    action = ?action,
                    error = %e,
                    "bot action rejected"
                ),
            }
        }

        match tokio::time::timeout(stall, sub.receiver.recv()).await {
            Ok(Some(event)) => observe(&event, &mut live_turn),
            Ok(None) => break,
            Err(_) => return Err(CliError::Engine("simulation stalled".to_string())),
        }
    }

    orch.statistics()
        .get(sid)
        .ok_or_else(|| CliError::Engine("no statistics report".to_string()))
}

fn observe(event: &GameEvent, live_turn: &mut u32) {
    tracing::debug!(kind = event.kind(), "event");
    if let GameEvent::TurnStarted { turn_number, .. } = event {
        *live_turn = *turn_number;
    }
}

fn submit(
    orch: &SessionOrchestrator,
    sid: &str,
    player_id: &str,
    action: &BotAction,
) -> Result<(), SessionError> {
    match action {
        BotAction::Move(to) => orch.move_player(sid, player_id, *to),
        BotAction::Attack(target) => orch.attack(sid, player_id, target),
        BotAction::CombatAttack => orch.combat_attack(sid, player_id),
        BotAction::Evade => orch.combat_evade(sid, player_id),
        BotAction::ToggleDoor(at) => orch.toggle_door(sid, player_id, *at),
        BotAction::EndTurn => orch.end_turn(sid, player_id),
    }
}
