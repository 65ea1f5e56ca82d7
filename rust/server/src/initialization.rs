use crate::errors::SessionError;
use crate::ports::{GameDefinitionSource, OccupancyTracker};
use crate::store::SessionStore;
use crate::tracking::TrackingStore;
use chrono::Utc;
use std::sync::Arc;
use tactica_engine::definition::GameMode;
use tactica_engine::errors::GameError;
use tactica_engine::player::{Player, PlayerId};
use tactica_engine::session::{Session, SessionId, WaitingRoom};
use tactica_engine::setup;

/// Turns a waiting room into a playable session: turn order, teams, start
/// points, occupancy and tracking. Nothing is started; the first turn is
/// the orchestrator's call.
pub struct InitializationService {
    store: Arc<SessionStore>,
    tracking: Arc<TrackingStore>,
    definitions: Arc<dyn GameDefinitionSource>,
    occupancy: Arc<dyn OccupancyTracker>,
}

impl InitializationService {
    pub fn new(
        store: Arc<SessionStore>,
        tracking: Arc<TrackingStore>,
        definitions: Arc<dyn GameDefinitionSource>,
        occupancy: Arc<dyn OccupancyTracker>,
    ) -> Self {
        Self {
            store,
            tracking,
            definitions,
            occupancy,
        }
    }

    /// Speed-descending order with ties shuffled.
    pub fn make_turn_order<'a>(&self, players: impl IntoIterator<Item = &'a Player>) -> Vec<PlayerId> {
        setup::make_turn_order(players, &mut rand::rng())
    }

    pub fn create_session(&self, room: WaitingRoom, mode: GameMode) -> Result<SessionId, SessionError> {
        if self.store.contains(&room.code) {
            return Err(GameError::SessionAlreadyStarted.into());
        }
        let definition = self
            .definitions
            .definition(&room.game_id)
            .ok_or_else(|| GameError::GameNotFound(room.game_id.clone()))?;

        let mut session = Session::from_waiting_room(room, &definition, mode, Utc::now())?;
        let mut rng = rand::rng();
        session.turn_order = setup::make_turn_order(session.players.values(), &mut rng);
        setup::assign_teams(&mut session);
        let placements = setup::assign_start_points(&mut session, &definition, &mut rng)?;

        let session_id = session.id.clone();
        let turn_order = session.turn_order.clone();
        self.store.insert(session)?;

        for (player_id, at) in &placements {
            self.occupancy.occupy(&session_id, *at, player_id);
        }
        self.tracking
            .initialize(&session_id, definition.tracker_totals());
        for (player_id, at) in &placements {
            self.tracking.track_tile_visited(&session_id, player_id, at);
        }

        tracing::info!(
            session_id = %session_id,
            game_id = %definition.id,
            mode = ?mode,
            players = placements.len(),
            turn_order = ?turn_order,
            "session initialized"
        );
        Ok(session_id)
    }
}
