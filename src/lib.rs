//! # Rumble Game Server
//!
//! Authoritative realtime server for a small multiplayer 2D platformer.
//! Clients connect over WebSocket, are routed into named rooms, ready up in
//! a lobby, and then receive fixed-rate authoritative state while the room
//! is in play.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      RUMBLE SERVER                           │
//! ├─────────────────────────────────────────────────────────────┤
//! │  game/            - Room/session runtime                     │
//! │  ├── physics.rs   - Per-player simulation step               │
//! │  ├── player.rs    - Player record and visual state           │
//! │  ├── room.rs      - Lobby/playing state machine + tick       │
//! │  └── registry.rs  - room id → Room, capacity cap, sweep      │
//! │                                                              │
//! │  network/         - Connection plane                         │
//! │  ├── server.rs    - HTTP + WebSocket gateway, tick timer     │
//! │  ├── protocol.rs  - JSON frame codec                         │
//! │  └── auth.rs      - Signed-token verification                │
//! │                                                              │
//! │  storage/         - External key-value secret store          │
//! │  └── secrets.rs   - Startup fetch of the verification key    │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency model
//!
//! All room and registry state is mutated behind a single mutex, and every
//! handler runs to completion without awaiting while it holds that lock.
//! This gives the same serializability as a single-threaded event loop:
//! within one room, broadcasts observe a totally ordered history of
//! mutations. Outbound delivery is non-blocking (bounded per-connection
//! queues); a connection that cannot keep up is dropped.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod game;
pub mod network;
pub mod storage;

pub use config::ServerConfig;
pub use game::player::Player;
pub use game::registry::RoomRegistry;
pub use game::room::{Room, RoomState};
pub use network::server::Gateway;

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
