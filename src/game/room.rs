//! Room Runtime
//!
//! A room is an ephemeral session keyed by a client-chosen string. It owns
//! its players, runs the lobby → playing → finished state machine, applies
//! the simulation step each tick, and fans state out through a broadcast
//! callback bound by the gateway. The room never owns sockets.

use std::collections::BTreeMap;

use tracing::{debug, info};

use crate::game::physics::{self, GROUND_Y, MAP_HEIGHT, MAP_WIDTH};
use crate::game::player::{Action, Player};
use crate::network::protocol::{
    LobbyPlayer, MapData, PlayerSnapshot, ServerMessage, SpawnPoint, round1,
};

/// Spawn ring used at game start and for mid-game joins.
pub const SPAWN_POSITIONS: [(f32, f32); 4] = [
    (200.0, GROUND_Y),
    (400.0, GROUND_Y),
    (600.0, GROUND_Y),
    (800.0, GROUND_Y),
];

/// Room lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomState {
    /// Lobby: players joining and readying up.
    Waiting,
    /// Simulation running.
    Playing,
    /// Terminal: no new players, no ticks. Swept once empty.
    Finished,
}

impl RoomState {
    /// Wire name of the state.
    pub fn as_str(self) -> &'static str {
        match self {
            RoomState::Waiting => "waiting",
            RoomState::Playing => "playing",
            RoomState::Finished => "finished",
        }
    }
}

/// Why a join was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// Room is at its player cap.
    #[error("room is full")]
    Full,
    /// A player with this id is already present.
    #[error("player already in room")]
    Duplicate,
    /// The room has finished and accepts no new players.
    #[error("room is finished")]
    Finished,
}

/// Delivers one serialized frame to one player. Bound by the gateway; the
/// room holds no connection handles itself.
pub type BroadcastFn = Box<dyn Fn(&str, &str) + Send + Sync>;

/// A single game room.
pub struct Room {
    id: String,
    max_players: usize,
    state: RoomState,
    players: BTreeMap<String, Player>,
    tick: u64,
    next_spawn: usize,
    broadcast_fn: Option<BroadcastFn>,
}

impl Room {
    /// Create an empty room in the lobby state.
    pub fn new(id: impl Into<String>, max_players: usize) -> Self {
        Self {
            id: id.into(),
            max_players,
            state: RoomState::Waiting,
            players: BTreeMap::new(),
            tick: 0,
            next_spawn: 0,
            broadcast_fn: None,
        }
    }

    /// Room id.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoomState {
        self.state
    }

    /// Current tick counter.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Player cap.
    pub fn max_players(&self) -> usize {
        self.max_players
    }

    // ── Player management ───────────────────────────────

    /// Add a player. While PLAYING the newcomer is spawned immediately at
    /// the next spawn position; no `game_start` is re-broadcast.
    pub fn add_player(&mut self, mut player: Player) -> Result<(), RoomError> {
        if self.is_full() {
            return Err(RoomError::Full);
        }
        if self.players.contains_key(&player.id) {
            return Err(RoomError::Duplicate);
        }
        if self.state == RoomState::Finished {
            return Err(RoomError::Finished);
        }

        if self.state == RoomState::Playing {
            let (x, y) = SPAWN_POSITIONS[self.next_spawn % SPAWN_POSITIONS.len()];
            player.spawn(x, y);
            self.next_spawn += 1;
        }

        info!(player_id = %player.id, name = %player.name, room_id = %self.id, "player joined");
        self.players.insert(player.id.clone(), player);
        Ok(())
    }

    /// Remove a player. A room that empties out is finished.
    pub fn remove_player(&mut self, player_id: &str) {
        if self.players.remove(player_id).is_none() {
            return;
        }
        info!(player_id, room_id = %self.id, "player left");

        if self.players.is_empty() {
            self.state = RoomState::Finished;
            info!(room_id = %self.id, "room empty, marked finished");
        }
    }

    /// Remove a player being displaced by a reconnect with the same id.
    ///
    /// Unlike [`remove_player`](Self::remove_player) this never trips the
    /// empty → FINISHED transition: the displacing connection is admitted
    /// into the same room immediately afterwards.
    pub fn displace_player(&mut self, player_id: &str) {
        if self.players.remove(player_id).is_some() {
            debug!(player_id, room_id = %self.id, "displaced by reconnect");
        }
    }

    /// Whether a player id is present.
    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.contains_key(player_id)
    }

    /// Look up a player.
    pub fn get_player(&self, player_id: &str) -> Option<&Player> {
        self.players.get(player_id)
    }

    /// Whether the room is at its cap.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    /// Whether the room has no players.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of players.
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    // ── Lobby ───────────────────────────────────────────

    /// Update a player's ready flag and broadcast the change. Starting is
    /// only evaluated here: a leave that satisfies the guard does not start
    /// the game.
    pub fn set_ready(&mut self, player_id: &str, ready: bool) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        player.ready = ready;

        self.broadcast(&ServerMessage::PlayerReadyState {
            player_id: player_id.to_string(),
            ready,
        });
        debug!(player_id, ready, room_id = %self.id, "ready state");

        if self.all_ready() && self.state == RoomState::Waiting {
            info!(room_id = %self.id, "all players ready, starting game");
            self.start_game();
        }
    }

    /// Start guard: at least two players, all of them ready.
    pub fn all_ready(&self) -> bool {
        self.players.len() >= 2 && self.players.values().all(|p| p.ready)
    }

    // ── Chat ────────────────────────────────────────────

    /// Relay a chat line to the whole room. The codec has already rejected
    /// empty messages and applied the length cap.
    pub fn handle_chat(&mut self, sender_id: &str, message: &str) {
        let Some(sender) = self.players.get(sender_id) else {
            return;
        };
        let frame = ServerMessage::ChatMessage {
            player_id: sender_id.to_string(),
            player_name: sender.name.clone(),
            message: message.to_string(),
        };
        self.broadcast(&frame);
    }

    // ── Gameplay ────────────────────────────────────────

    fn start_game(&mut self) {
        if self.state != RoomState::Waiting {
            return;
        }

        self.state = RoomState::Playing;
        self.tick = 0;
        self.next_spawn = 0;

        for player in self.players.values_mut() {
            let (x, y) = SPAWN_POSITIONS[self.next_spawn % SPAWN_POSITIONS.len()];
            player.spawn(x, y);
            self.next_spawn += 1;
        }

        let spawn_points = self
            .players
            .values()
            .map(|p| SpawnPoint {
                player_id: p.id.clone(),
                x: p.x,
                y: p.y,
            })
            .collect();

        self.broadcast(&ServerMessage::GameStart {
            round: 1,
            map_data: MapData {
                width: MAP_WIDTH,
                height: MAP_HEIGHT,
                ground_y: GROUND_Y,
            },
            spawn_points,
        });

        info!(room_id = %self.id, players = self.players.len(), "game started");
    }

    /// Run one simulation tick and broadcast the resulting snapshot.
    /// No-op unless the room is PLAYING.
    pub fn tick(&mut self, dt: f32) {
        if self.state != RoomState::Playing {
            return;
        }

        self.tick += 1;

        for player in self.players.values_mut() {
            physics::step(player, dt);
        }

        let snapshot = self.game_state();
        self.broadcast(&snapshot);
    }

    /// Replace a player's pending action buffer.
    pub fn queue_input(&mut self, player_id: &str, tick: i64, actions: Vec<Action>) {
        let Some(player) = self.players.get_mut(player_id) else {
            return;
        };
        player.pending_actions = actions;
        player.last_input_tick = tick;
    }

    // ── Broadcasting ────────────────────────────────────

    /// Bind the outbound dispatcher. Rebound on every connection open so a
    /// fresh gateway handle map is always in effect.
    pub fn set_broadcast_fn(&mut self, f: BroadcastFn) {
        self.broadcast_fn = Some(f);
    }

    /// Send a frame to every current member.
    pub fn broadcast(&self, msg: &ServerMessage) {
        let Some(send) = self.broadcast_fn.as_ref() else {
            return;
        };
        let serialized = msg.to_json();
        for player_id in self.players.keys() {
            send(player_id, &serialized);
        }
    }

    /// Send a frame to every member except one.
    pub fn broadcast_except(&self, exclude_id: &str, msg: &ServerMessage) {
        let Some(send) = self.broadcast_fn.as_ref() else {
            return;
        };
        let serialized = msg.to_json();
        for player_id in self.players.keys() {
            if player_id != exclude_id {
                send(player_id, &serialized);
            }
        }
    }

    /// Send a frame to a single member.
    pub fn send_to(&self, player_id: &str, msg: &ServerMessage) {
        if let Some(send) = self.broadcast_fn.as_ref() {
            send(player_id, &msg.to_json());
        }
    }

    // ── State snapshots ─────────────────────────────────

    /// Current lobby snapshot.
    pub fn lobby_state(&self) -> ServerMessage {
        ServerMessage::LobbyState {
            room_id: self.id.clone(),
            state: self.state.as_str().to_string(),
            max_players: self.max_players,
            players: self
                .players
                .values()
                .map(|p| LobbyPlayer {
                    id: p.id.clone(),
                    name: p.name.clone(),
                    display_name: p.display_name.clone(),
                    ready: p.ready,
                })
                .collect(),
        }
    }

    /// Current gameplay snapshot. Spatial fields are rounded to one decimal
    /// so the wire output is stable across floating-point noise.
    pub fn game_state(&self) -> ServerMessage {
        ServerMessage::GameState {
            tick: self.tick,
            time_left: 0.0,
            players: self
                .players
                .values()
                .map(|p| PlayerSnapshot {
                    id: p.id.clone(),
                    x: round1(p.x),
                    y: round1(p.y),
                    vx: round1(p.vx),
                    vy: round1(p.vy),
                    health: p.health,
                    state: p.state,
                    facing: p.facing,
                })
                .collect(),
            enemies: Vec::new(),
            items: Vec::new(),
        }
    }
}
