//! Server Configuration
//!
//! All runtime knobs come from environment variables. Unset or unparseable
//! values fall back to their defaults.

use tracing::Level;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen port for the combined HTTP/WebSocket listener.
    pub port: u16,
    /// Simulation ticks per second.
    pub tick_rate: u32,
    /// Maximum number of live rooms.
    pub max_rooms: usize,
    /// Maximum players per room.
    pub max_players_per_room: usize,
    /// Secret store host.
    pub redis_addr: String,
    /// Secret store port.
    pub redis_port: u16,
    /// Secret store password ("" = no auth).
    pub redis_password: String,
    /// Log level: debug | info | warn | error.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 9001,
            tick_rate: 20,
            max_rooms: 100,
            max_players_per_room: 4,
            redis_addr: "localhost".to_string(),
            redis_port: 6379,
            redis_password: String::new(),
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_parse("PORT") {
            cfg.port = v;
        }
        if let Some(v) = env_parse("TICK_RATE") {
            cfg.tick_rate = v;
        }
        if let Some(v) = env_parse("MAX_ROOMS") {
            cfg.max_rooms = v;
        }
        if let Some(v) = env_parse("MAX_PLAYERS_PER_ROOM") {
            cfg.max_players_per_room = v;
        }
        if let Ok(v) = std::env::var("REDIS_ADDR") {
            let (host, port) = split_host_port(&v);
            cfg.redis_addr = host;
            if let Some(p) = port {
                cfg.redis_port = p;
            }
        }
        if let Ok(v) = std::env::var("REDIS_PASSWORD") {
            cfg.redis_password = v;
        }
        if let Ok(v) = std::env::var("LOG_LEVEL") {
            cfg.log_level = v;
        }

        cfg
    }

    /// Map the configured log level onto a tracing level.
    pub fn tracing_level(&self) -> Level {
        match self.log_level.as_str() {
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    /// Tick period in whole milliseconds.
    pub fn tick_period_ms(&self) -> u64 {
        (1000 / self.tick_rate.max(1)) as u64
    }

    /// Nominal simulation delta per tick, in seconds.
    pub fn tick_dt(&self) -> f32 {
        1.0 / self.tick_rate.max(1) as f32
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok()?.parse().ok()
}

/// Split a `host` or `host:port` address. The port part is dropped if it
/// does not parse.
fn split_host_port(addr: &str) -> (String, Option<u16>) {
    match addr.split_once(':') {
        Some((host, port)) => (host.to_string(), port.parse().ok()),
        None => (addr.to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.port, 9001);
        assert_eq!(cfg.tick_rate, 20);
        assert_eq!(cfg.max_rooms, 100);
        assert_eq!(cfg.max_players_per_room, 4);
        assert_eq!(cfg.redis_addr, "localhost");
        assert_eq!(cfg.redis_port, 6379);
        assert_eq!(cfg.log_level, "info");
    }

    #[test]
    fn test_split_host_port() {
        assert_eq!(split_host_port("localhost"), ("localhost".into(), None));
        assert_eq!(
            split_host_port("redis.internal:6380"),
            ("redis.internal".into(), Some(6380))
        );
        // Bad port falls back to the default
        assert_eq!(split_host_port("host:nope"), ("host".into(), None));
    }

    #[test]
    fn test_tracing_level_mapping() {
        let mut cfg = ServerConfig::default();
        assert_eq!(cfg.tracing_level(), Level::INFO);

        cfg.log_level = "debug".into();
        assert_eq!(cfg.tracing_level(), Level::DEBUG);

        cfg.log_level = "warn".into();
        assert_eq!(cfg.tracing_level(), Level::WARN);

        cfg.log_level = "error".into();
        assert_eq!(cfg.tracing_level(), Level::ERROR);

        cfg.log_level = "garbage".into();
        assert_eq!(cfg.tracing_level(), Level::INFO);
    }

    #[test]
    fn test_tick_period() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.tick_period_ms(), 50);
        assert!((cfg.tick_dt() - 0.05).abs() < f32::EPSILON);
    }
}
