use crate::grid::Coordinate;
use serde::{Deserialize, Serialize};

pub type PlayerId = String;

/// Health, speed, attack and defense values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub health: u32,
    pub speed: u32,
    pub attack: u32,
    pub defense: u32,
}

impl StatBlock {
    pub const fn new(health: u32, speed: u32, attack: u32, defense: u32) -> Self {
        Self {
            health,
            speed,
            attack,
            defense,
        }
    }
}

/// Default base stats for a freshly created avatar.
pub const DEFAULT_STATS: StatBlock = StatBlock::new(4, 4, 4, 4);

/// Combat counters copied verbatim into the statistics report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatRecord {
    pub count: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

/// Player data brought over from the waiting room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSeed {
    pub id: PlayerId,
    pub name: String,
    pub base: StatBlock,
    #[serde(default)]
    pub bonus: StatBlock,
}

impl PlayerSeed {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>, base: StatBlock) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base,
            bonus: StatBlock::default(),
        }
    }

    pub fn with_bonus(mut self, bonus: StatBlock) -> Self {
        self.bonus = bonus;
        self
    }
}

/// A participant in a running session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub base: StatBlock,
    pub bonus: StatBlock,
    /// Current health, between 0 and [`Player::max_health`].
    pub health: u32,
    pub position: Option<Coordinate>,
    pub start_point: Option<Coordinate>,
    pub movement_left: u32,
    pub actions_left: u32,
    pub combat: CombatRecord,
    pub has_flag: bool,
    pub in_game: bool,
    pub joined: bool,
}

impl Player {
    pub fn from_seed(seed: PlayerSeed) -> Self {
        let health = seed.base.health + seed.bonus.health;
        Self {
            id: seed.id,
            name: seed.name,
            base: seed.base,
            bonus: seed.bonus,
            health,
            position: None,
            start_point: None,
            movement_left: 0,
            actions_left: 0,
            combat: CombatRecord::default(),
            has_flag: false,
            in_game: true,
            joined: true,
        }
    }

    pub fn max_health(&self) -> u32 {
        self.base.health + self.bonus.health
    }

    pub fn speed(&self) -> u32 {
        self.base.speed + self.bonus.speed
    }

    pub fn attack(&self) -> u32 {
        self.base.attack + self.bonus.attack
    }

    pub fn defense(&self) -> u32 {
        self.base.defense + self.bonus.defense
    }

    /// Refills movement and actions at the start of the player's turn.
    pub fn reset_turn_budget(&mut self, actions_per_turn: u32) {
        self.movement_left = self.speed();
        self.actions_left = actions_per_turn;
    }

    pub fn heal_full(&mut self) {
        self.health = self.max_health();
    }

    /// Applies damage and returns the health actually lost.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        let lost = amount.min(self.health);
        self.health -= lost;
        lost
    }

    pub fn is_defeated(&self) -> bool {
        self.health == 0
    }
}
