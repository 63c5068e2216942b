//! Room Registry
//!
//! Owns every live room, bounds how many may exist, and sweeps finished
//! empty rooms after each connection close.

use std::collections::HashMap;

use tracing::{info, warn};

use crate::game::room::{Room, RoomState};

/// Registry capacity was reached while creating a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("server at max room capacity")]
pub struct RegistryFull;

/// Aggregate counters reported on `/info`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Live rooms.
    pub rooms_active: usize,
    /// Rooms currently in play.
    pub rooms_playing: usize,
    /// Players across all rooms.
    pub players_online: usize,
    /// Highest current tick across all rooms.
    pub tick: u64,
}

/// The `room id → Room` map plus the global cap.
pub struct RoomRegistry {
    rooms: HashMap<String, Room>,
    max_rooms: usize,
    max_players_per_room: usize,
}

impl RoomRegistry {
    /// Create an empty registry.
    pub fn new(max_rooms: usize, max_players_per_room: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            max_rooms,
            max_players_per_room,
        }
    }

    /// Fetch a room, creating it on miss. Creation is refused at the cap;
    /// lookups of existing rooms always succeed.
    pub fn get_or_create(&mut self, room_id: &str) -> Result<&mut Room, RegistryFull> {
        if !self.rooms.contains_key(room_id) {
            if self.rooms.len() >= self.max_rooms {
                warn!(max_rooms = self.max_rooms, "max rooms reached, rejecting room creation");
                return Err(RegistryFull);
            }
            info!(room_id, "created room");
            self.rooms.insert(
                room_id.to_string(),
                Room::new(room_id, self.max_players_per_room),
            );
        }
        Ok(self.rooms.get_mut(room_id).expect("just inserted"))
    }

    /// Look up an existing room.
    pub fn get_mut(&mut self, room_id: &str) -> Option<&mut Room> {
        self.rooms.get_mut(room_id)
    }

    /// Iterate all rooms mutably (tick loop).
    pub fn rooms_mut(&mut self) -> impl Iterator<Item = &mut Room> {
        self.rooms.values_mut()
    }

    /// Evict every room that is both empty and finished. Runs after every
    /// connection close; never touches occupied or playing rooms.
    pub fn sweep(&mut self) {
        self.rooms.retain(|room_id, room| {
            let evict = room.is_empty() && room.state() == RoomState::Finished;
            if evict {
                info!(room_id, "cleaning up empty room");
            }
            !evict
        });
    }

    /// Number of live rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Counters for the `/info` endpoint.
    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            rooms_active: self.rooms.len(),
            rooms_playing: self
                .rooms
                .values()
                .filter(|r| r.state() == RoomState::Playing)
                .count(),
            players_online: self.rooms.values().map(|r| r.player_count()).sum(),
            tick: self.rooms.values().map(|r| r.tick_count()).max().unwrap_or(0),
        }
    }
}
