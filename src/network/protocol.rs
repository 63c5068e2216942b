//! Protocol Codec
//!
//! Wire format for the persistent channel. Every frame is one UTF-8 JSON
//! object. Outbound frames are a tagged enum; inbound frames are decoded
//! leniently field-by-field, because clients of every vintage send partial
//! objects and the server must not drop a connection over a bad field.

use serde::{Deserialize, Serialize};

use crate::game::player::{Action, Facing, VisualState};

/// Maximum chat message length, in characters. Longer messages are
/// truncated, not rejected.
pub const MAX_CHAT_LEN: usize = 200;

/// Hardening cap on actions per input frame.
pub const MAX_ACTIONS_PER_FRAME: usize = 16;

// =============================================================================
// SERVER -> CLIENT FRAMES
// =============================================================================

/// Frames sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake acknowledgement to the joining player.
    Connected {
        /// The admitted player id.
        player_id: String,
        /// Room tick at admission time.
        server_tick: u64,
    },

    /// Non-fatal protocol or runtime error.
    Error {
        /// HTTP-style error code.
        code: u16,
        /// Human-readable message.
        message: String,
    },

    /// Heartbeat reply.
    Pong,

    /// A new player joined the room (sent to everyone else).
    PlayerJoined {
        /// Joining player id.
        player_id: String,
        /// Joining player name.
        player_name: String,
    },

    /// A player left the room.
    PlayerLeft {
        /// Leaving player id.
        player_id: String,
    },

    /// A player toggled their lobby ready flag.
    PlayerReadyState {
        /// Player id.
        player_id: String,
        /// New flag value.
        ready: bool,
    },

    /// Chat relay.
    ChatMessage {
        /// Sender id.
        player_id: String,
        /// Sender name.
        player_name: String,
        /// Chat text (already capped).
        message: String,
    },

    /// Full lobby snapshot.
    LobbyState {
        /// Room id.
        room_id: String,
        /// "waiting" | "playing" | "finished".
        state: String,
        /// Room player cap.
        max_players: usize,
        /// All current members.
        players: Vec<LobbyPlayer>,
    },

    /// The game is starting.
    GameStart {
        /// Round number.
        round: u32,
        /// Static map parameters.
        map_data: MapData,
        /// Where each player spawned.
        spawn_points: Vec<SpawnPoint>,
    },

    /// Per-tick gameplay snapshot.
    GameState {
        /// Server tick.
        tick: u64,
        /// Round time remaining (reserved).
        time_left: f32,
        /// All player states, spatial fields rounded to one decimal.
        players: Vec<PlayerSnapshot>,
        /// Reserved for later phases.
        enemies: Vec<serde_json::Value>,
        /// Reserved for later phases.
        items: Vec<serde_json::Value>,
    },
}

/// One lobby roster entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LobbyPlayer {
    /// Player id.
    pub id: String,
    /// Account name.
    pub name: String,
    /// Displayed name.
    pub display_name: String,
    /// Ready flag.
    pub ready: bool,
}

/// Static map parameters sent with `game_start`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MapData {
    /// Map width in pixels.
    pub width: f32,
    /// Map height in pixels.
    pub height: f32,
    /// The ground line.
    pub ground_y: f32,
}

/// A spawn assignment in `game_start`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnPoint {
    /// Player id.
    pub player_id: String,
    /// Spawn x.
    pub x: f32,
    /// Spawn y.
    pub y: f32,
}

/// One player entry in a `game_state` snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// Player id.
    pub id: String,
    /// Position x.
    pub x: f32,
    /// Position y.
    pub y: f32,
    /// Velocity x.
    pub vx: f32,
    /// Velocity y.
    pub vy: f32,
    /// Health.
    pub health: i32,
    /// Animation state.
    pub state: VisualState,
    /// Facing direction.
    pub facing: Facing,
}

impl ServerMessage {
    /// Build an error frame.
    pub fn error(code: u16, message: impl Into<String>) -> Self {
        Self::Error {
            code,
            message: message.into(),
        }
    }

    /// Serialize to a JSON string.
    ///
    /// Frame types contain no non-string map keys, so serialization cannot
    /// fail; a frame that somehow does is replaced by an error frame rather
    /// than panicking the handler.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self)
            .unwrap_or_else(|_| r#"{"type":"error","code":500,"message":"Internal error"}"#.into())
    }
}

/// Round to one decimal place for stable on-wire output.
#[inline]
pub fn round1(v: f32) -> f32 {
    (v * 10.0).round() / 10.0
}

// =============================================================================
// CLIENT -> SERVER FRAMES
// =============================================================================

/// Decoded client frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientMessage {
    /// Heartbeat; answered with `pong` to the sender only.
    Ping,
    /// Lobby ready toggle.
    Ready {
        /// New flag value (missing field → false).
        ready: bool,
    },
    /// Chat line, non-empty and already capped to [`MAX_CHAT_LEN`].
    Chat {
        /// Chat text.
        message: String,
    },
    /// Per-tick input.
    Input {
        /// Client-reported tick (missing field → 0).
        tick: i64,
        /// Parsed actions; unknown and non-string entries are dropped.
        actions: Vec<Action>,
    },
    /// Reserved for a later phase; accepted and ignored.
    PlayerAction,
    /// Reserved for a later phase; accepted and ignored.
    BuyItem,
}

/// Codec rejection. Each maps onto one `error` frame; none of them are
/// fatal to the connection.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The frame was not a JSON document.
    #[error("Invalid JSON")]
    InvalidJson,
    /// `type` was absent or not a non-empty string.
    #[error("Missing or invalid 'type' field")]
    MissingType,
    /// `type` named no known frame.
    #[error("Unknown message type: {0}")]
    UnknownType(String),
    /// Chat frame with an empty message.
    #[error("Empty chat message")]
    EmptyChat,
}

impl ProtocolError {
    /// Wire code carried on the resulting error frame.
    pub fn code(&self) -> u16 {
        400
    }

    /// The error frame answering this rejection.
    pub fn to_frame(&self) -> ServerMessage {
        ServerMessage::error(self.code(), self.to_string())
    }
}

/// Decode one inbound frame.
pub fn parse_client_frame(raw: &str) -> Result<ClientMessage, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(raw).map_err(|_| ProtocolError::InvalidJson)?;

    let ty = value.get("type").and_then(|v| v.as_str()).unwrap_or("");
    if ty.is_empty() {
        return Err(ProtocolError::MissingType);
    }

    match ty {
        "ping" => Ok(ClientMessage::Ping),

        "player_ready" => Ok(ClientMessage::Ready {
            ready: value.get("ready").and_then(|v| v.as_bool()).unwrap_or(false),
        }),

        "chat_message" => {
            let message = value.get("message").and_then(|v| v.as_str()).unwrap_or("");
            if message.is_empty() {
                return Err(ProtocolError::EmptyChat);
            }
            Ok(ClientMessage::Chat {
                message: truncate_chars(message, MAX_CHAT_LEN),
            })
        }

        "player_input" => {
            let tick = value.get("tick").and_then(|v| v.as_i64()).unwrap_or(0);
            let actions = value
                .get("actions")
                .and_then(|v| v.as_array())
                .map(|arr| {
                    arr.iter()
                        .filter_map(|a| a.as_str())
                        .filter_map(Action::parse)
                        .take(MAX_ACTIONS_PER_FRAME)
                        .collect()
                })
                .unwrap_or_default();
            Ok(ClientMessage::Input { tick, actions })
        }

        "player_action" => Ok(ClientMessage::PlayerAction),
        "buy_item" => Ok(ClientMessage::BuyItem),

        other => Err(ProtocolError::UnknownType(other.to_string())),
    }
}

/// Truncate to at most `max` characters without splitting a code point.
fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
