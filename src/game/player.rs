//! Player Record
//!
//! Per-player state inside a room: identity, lobby flag, kinematics, and
//! the pending input buffer consumed by the simulation step.

use serde::{Deserialize, Serialize};

/// Visual animation state reported to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualState {
    /// Standing still on the ground.
    Idle,
    /// Moving horizontally on the ground.
    Running,
    /// Airborne, moving up.
    Jumping,
    /// Airborne, moving down.
    Falling,
    /// Health depleted.
    Dead,
}

/// Horizontal facing direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Facing left.
    Left,
    /// Facing right.
    Right,
}

/// A movement action from a `player_input` frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Move left this tick.
    Left,
    /// Move right this tick.
    Right,
    /// Jump, if grounded.
    Jump,
}

impl Action {
    /// Parse a wire action token. Unknown tokens yield `None` and are
    /// dropped by the codec.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "left" => Some(Action::Left),
            "right" => Some(Action::Right),
            "jump" => Some(Action::Jump),
            _ => None,
        }
    }
}

/// A player inside exactly one room.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable identity (token subject, or an ephemeral dev-mode id).
    pub id: String,
    /// Account name.
    pub name: String,
    /// Name shown to other players.
    pub display_name: String,
    /// Lobby ready flag.
    pub ready: bool,
    /// Horizontal position, pixels. Origin top-left, y grows downward.
    pub x: f32,
    /// Vertical position, pixels.
    pub y: f32,
    /// Horizontal velocity, px/s.
    pub vx: f32,
    /// Vertical velocity, px/s.
    pub vy: f32,
    /// Current health.
    pub health: i32,
    /// Health restored on spawn.
    pub max_health: i32,
    /// Visual animation state.
    pub state: VisualState,
    /// Facing direction.
    pub facing: Facing,
    /// Actions queued for the next tick. Overwritten by each input frame,
    /// cleared by the simulation step.
    pub pending_actions: Vec<Action>,
    /// Last client-reported tick number.
    pub last_input_tick: i64,
}

impl Player {
    /// Create a new player in lobby state.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            display_name: name.clone(),
            name,
            ready: false,
            x: 0.0,
            y: 0.0,
            vx: 0.0,
            vy: 0.0,
            health: 100,
            max_health: 100,
            state: VisualState::Idle,
            facing: Facing::Right,
            pending_actions: Vec::new(),
            last_input_tick: 0,
        }
    }

    /// Place the player at a spawn point with full health and no motion.
    pub fn spawn(&mut self, x: f32, y: f32) {
        self.x = x;
        self.y = y;
        self.vx = 0.0;
        self.vy = 0.0;
        self.health = self.max_health;
        self.state = VisualState::Idle;
    }
}
