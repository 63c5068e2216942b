//! Connection Gateway
//!
//! One listener carries the whole external surface: `/health` and `/info`
//! for probes, and `/ws/{roomCode}` upgrading to the persistent channel.
//! Admission (room code, token, capacity, reconnect) is decided before the
//! upgrade completes, so failures surface as plain HTTP responses.
//!
//! All room and registry mutation happens under a single mutex and never
//! awaits while holding it, which preserves the serializability of a
//! single-threaded event loop. Connection handles live in a gateway-local
//! map, never inside room state; rooms reach sockets only through the
//! dispatcher callback bound at open time.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::game::player::Player;
use crate::game::registry::RoomRegistry;
use crate::game::room::{BroadcastFn, RoomState};
use crate::network::auth;
use crate::network::protocol::{parse_client_frame, ClientMessage, ServerMessage};

/// Maximum inbound frame size.
const MAX_FRAME_BYTES: usize = 16 * 1024;

/// Outbound queue depth per connection. A consumer that lets this fill
/// (roughly the 64 KiB backpressure budget at typical frame sizes) is
/// dropped rather than buffered without bound.
const OUTBOUND_QUEUE_FRAMES: usize = 256;

/// A connection with no inbound frame for this long is closed.
const IDLE_TIMEOUT: Duration = Duration::from_secs(120);

/// Gateway errors.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Failed to bind the listener.
    #[error("failed to bind: {0}")]
    Bind(#[source] std::io::Error),

    /// The accept loop failed.
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Per-connection control block shared between the socket task and the
/// admission path that may displace it.
#[derive(Default)]
struct ConnCtl {
    /// Set when a reconnect displaces this connection: its close handler
    /// must perform no state cleanup.
    tombstoned: AtomicBool,
    /// Wakes the socket task to shut down.
    shutdown: Notify,
}

/// Outbound handle for one open connection.
struct ConnHandle {
    tx: mpsc::Sender<String>,
    ctl: Arc<ConnCtl>,
}

/// Identity attached to an admitted connection.
#[derive(Clone, Debug)]
struct AdmittedConn {
    player_id: String,
    player_name: String,
    room_id: String,
}

/// The connection gateway.
pub struct Gateway {
    cfg: ServerConfig,
    jwt_secret: Option<String>,
    registry: Mutex<RoomRegistry>,
    handles: Arc<Mutex<HashMap<String, ConnHandle>>>,
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

#[derive(Serialize)]
struct InfoResponse {
    rooms_active: usize,
    rooms_playing: usize,
    players_online: usize,
    tick: u64,
}

impl Gateway {
    /// Create a gateway. `jwt_secret = None` runs the server in dev mode:
    /// every connection gets an ephemeral identity.
    pub fn new(cfg: ServerConfig, jwt_secret: Option<String>) -> Self {
        let registry = RoomRegistry::new(cfg.max_rooms, cfg.max_players_per_room);
        Self {
            cfg,
            jwt_secret,
            registry: Mutex::new(registry),
            handles: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Bind the listener, start the tick timer, and serve until failure.
    pub async fn run(self: Arc<Self>) -> Result<(), GatewayError> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.cfg.port));
        let listener = TcpListener::bind(addr).await.map_err(GatewayError::Bind)?;
        info!(%addr, "game server listening");
        info!(
            max_rooms = self.cfg.max_rooms,
            max_players_per_room = self.cfg.max_players_per_room,
            tick_rate = self.cfg.tick_rate,
            "limits"
        );

        self.clone().spawn_tick_loop();

        let app = self.clone().router();
        axum::serve(listener, app).await.map_err(GatewayError::Serve)
    }

    /// Build the HTTP/WS router.
    pub fn router(self: Arc<Self>) -> Router {
        Router::new()
            .route("/health", get(health))
            .route("/info", get(info_endpoint))
            .route("/ws", get(missing_room_code))
            .route("/ws/{room_code}", get(ws_handler))
            .with_state(self)
    }

    /// One shared repeating timer drives every PLAYING room. Missed firings
    /// coalesce: at most one tick per room per firing, and `dt` is always
    /// the nominal tick period regardless of wall-clock jitter.
    fn spawn_tick_loop(self: Arc<Self>) {
        let period = Duration::from_millis(self.cfg.tick_period_ms().max(1));
        let dt = self.cfg.tick_dt();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let mut registry = self.registry.lock().unwrap();
                for room in registry.rooms_mut() {
                    if room.state() == RoomState::Playing {
                        room.tick(dt);
                    }
                }
            }
        });
    }

    /// The outbound dispatcher rooms call to reach sockets. Delivery is
    /// non-blocking; a full queue drops the connection.
    fn dispatcher(&self) -> BroadcastFn {
        let handles = Arc::clone(&self.handles);
        Box::new(move |player_id: &str, frame: &str| {
            let mut map = handles.lock().unwrap();
            let delivered = match map.get(player_id) {
                Some(handle) => handle.tx.try_send(frame.to_string()).is_ok(),
                None => return,
            };
            if !delivered {
                warn!(player_id, "outbound queue overflow, dropping connection");
                if let Some(dead) = map.remove(player_id) {
                    dead.ctl.shutdown.notify_one();
                }
            }
        })
    }

    /// Send one frame directly through the handle map.
    fn send_direct(&self, player_id: &str, msg: &ServerMessage) {
        let map = self.handles.lock().unwrap();
        if let Some(handle) = map.get(player_id) {
            let _ = handle.tx.try_send(msg.to_json());
        }
    }

    /// Resolve the connecting identity from the optional token.
    fn resolve_identity(&self, token: Option<&str>) -> Result<(String, String), auth::AuthError> {
        if let (Some(secret), Some(token)) = (self.jwt_secret.as_deref(), token) {
            let claims = auth::verify_token(token, secret)?;
            return Ok((claims.sub, claims.username));
        }
        Ok((ephemeral_player_id(), "Player".to_string()))
    }

    /// Run the admission pipeline. `Ok` admits; `Err` carries the HTTP
    /// rejection. Displaces a prior connection with the same identity.
    fn admit(
        &self,
        room_code: &str,
        token: Option<&str>,
    ) -> Result<AdmittedConn, (StatusCode, &'static str)> {
        let (player_id, player_name) = self.resolve_identity(token).map_err(|e| {
            warn!(error = %e, "rejected token");
            (StatusCode::UNAUTHORIZED, "Invalid or expired token")
        })?;

        let mut registry = self.registry.lock().unwrap();
        let room = registry.get_or_create(room_code).map_err(|_| {
            (StatusCode::SERVICE_UNAVAILABLE, "Server at max room capacity")
        })?;

        if room.has_player(&player_id) {
            // Reconnect: tombstone the prior socket so its close handler is
            // a no-op, force it shut, and join fresh.
            if let Some(old) = self.handles.lock().unwrap().remove(&player_id) {
                old.ctl.tombstoned.store(true, Ordering::SeqCst);
                old.ctl.shutdown.notify_one();
            }
            room.displace_player(&player_id);
            info!(player_id = %player_id, room_id = room_code, "reconnect displaced prior connection");
        }

        if room.is_full() {
            return Err((StatusCode::FORBIDDEN, "Room is full"));
        }
        if room.state() == RoomState::Finished {
            return Err((StatusCode::FORBIDDEN, "Room is finished"));
        }

        Ok(AdmittedConn {
            player_id,
            player_name,
            room_id: room_code.to_string(),
        })
    }

    /// Post-upgrade: register the handle, join the room, and emit the open
    /// sequence (`connected`, `player_joined`, lobby snapshot).
    fn open_connection(&self, conn: &AdmittedConn, tx: &mpsc::Sender<String>, ctl: &Arc<ConnCtl>) -> bool {
        self.handles.lock().unwrap().insert(
            conn.player_id.clone(),
            ConnHandle {
                tx: tx.clone(),
                ctl: Arc::clone(ctl),
            },
        );

        let mut registry = self.registry.lock().unwrap();
        let Some(room) = registry.get_mut(&conn.room_id) else {
            // Swept between admission and open.
            let _ = tx.try_send(ServerMessage::error(500, "Room disappeared").to_json());
            self.handles.lock().unwrap().remove(&conn.player_id);
            return false;
        };

        room.set_broadcast_fn(self.dispatcher());

        let player = Player::new(conn.player_id.clone(), conn.player_name.clone());
        if room.add_player(player).is_err() {
            let _ = tx.try_send(ServerMessage::error(403, "Could not join room").to_json());
            self.handles.lock().unwrap().remove(&conn.player_id);
            return false;
        }

        room.send_to(
            &conn.player_id,
            &ServerMessage::Connected {
                player_id: conn.player_id.clone(),
                server_tick: room.tick_count(),
            },
        );
        room.broadcast_except(
            &conn.player_id,
            &ServerMessage::PlayerJoined {
                player_id: conn.player_id.clone(),
                player_name: conn.player_name.clone(),
            },
        );
        let lobby = room.lobby_state();
        room.broadcast(&lobby);

        true
    }

    /// Dispatch one inbound frame.
    fn handle_frame(&self, conn: &AdmittedConn, raw: &str) {
        let msg = match parse_client_frame(raw) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(player_id = %conn.player_id, error = %e, "rejected frame");
                self.send_direct(&conn.player_id, &e.to_frame());
                return;
            }
        };

        let mut registry = self.registry.lock().unwrap();
        let Some(room) = registry.get_mut(&conn.room_id) else {
            self.send_direct(&conn.player_id, &ServerMessage::error(404, "Room not found"));
            return;
        };

        match msg {
            ClientMessage::Ping => room.send_to(&conn.player_id, &ServerMessage::Pong),
            ClientMessage::Ready { ready } => room.set_ready(&conn.player_id, ready),
            ClientMessage::Chat { message } => room.handle_chat(&conn.player_id, &message),
            ClientMessage::Input { tick, actions } => {
                room.queue_input(&conn.player_id, tick, actions)
            }
            ClientMessage::PlayerAction | ClientMessage::BuyItem => {
                debug!(player_id = %conn.player_id, "reserved message type ignored");
            }
        }
    }

    /// Close-side cleanup. The tombstone is consulted under the registry
    /// lock so a concurrent displacement cannot interleave.
    fn close_connection(&self, conn: &AdmittedConn, ctl: &ConnCtl) {
        let mut registry = self.registry.lock().unwrap();
        if ctl.tombstoned.load(Ordering::SeqCst) {
            debug!(player_id = %conn.player_id, "tombstoned close, no cleanup");
            return;
        }

        self.handles.lock().unwrap().remove(&conn.player_id);

        if let Some(room) = registry.get_mut(&conn.room_id) {
            room.remove_player(&conn.player_id);
            room.broadcast(&ServerMessage::PlayerLeft {
                player_id: conn.player_id.clone(),
            });
            if !room.is_empty() {
                let lobby = room.lobby_state();
                room.broadcast(&lobby);
            }
        }

        registry.sweep();
    }

    /// Counters for `/info`.
    fn info(&self) -> InfoResponse {
        let stats = self.registry.lock().unwrap().stats();
        InfoResponse {
            rooms_active: stats.rooms_active,
            rooms_playing: stats.rooms_playing,
            players_online: stats.players_online,
            tick: stats.tick,
        }
    }
}

// =============================================================================
// HTTP HANDLERS
// =============================================================================

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok"}))
}

async fn info_endpoint(State(gateway): State<Arc<Gateway>>) -> impl IntoResponse {
    Json(gateway.info())
}

async fn missing_room_code() -> impl IntoResponse {
    (StatusCode::BAD_REQUEST, "Missing room code in path")
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Path(room_code): Path<String>,
    Query(query): Query<WsQuery>,
    State(gateway): State<Arc<Gateway>>,
) -> Response {
    let room_code = room_code.trim().to_string();
    if room_code.is_empty() {
        return (StatusCode::BAD_REQUEST, "Missing room code in path").into_response();
    }

    let conn = match gateway.admit(&room_code, query.token.as_deref()) {
        Ok(conn) => conn,
        Err((status, body)) => return (status, body).into_response(),
    };

    info!(
        player_id = %conn.player_id,
        name = %conn.player_name,
        room_id = %conn.room_id,
        "ws open"
    );

    ws.max_message_size(MAX_FRAME_BYTES)
        .on_upgrade(move |socket| run_connection(socket, gateway, conn))
}

/// Per-connection pump: one writer task draining the outbound queue, and a
/// read loop feeding frames into the gateway until close, idle timeout, or
/// a forced shutdown.
async fn run_connection(socket: WebSocket, gateway: Arc<Gateway>, conn: AdmittedConn) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::channel::<String>(OUTBOUND_QUEUE_FRAMES);
    let ctl = Arc::new(ConnCtl::default());

    if !gateway.open_connection(&conn, &tx, &ctl) {
        // Flush the error frame queued by open_connection, then drop.
        if let Some(frame) = rx.recv().await {
            let _ = ws_tx.send(Message::Text(frame.into())).await;
        }
        return;
    }

    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if ws_tx.send(Message::Text(frame.into())).await.is_err() {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            _ = ctl.shutdown.notified() => {
                debug!(player_id = %conn.player_id, "connection force-closed");
                break;
            }
            incoming = tokio::time::timeout(IDLE_TIMEOUT, ws_rx.next()) => {
                match incoming {
                    Err(_) => {
                        info!(player_id = %conn.player_id, "idle timeout, closing");
                        break;
                    }
                    Ok(None) | Ok(Some(Err(_))) => break,
                    Ok(Some(Ok(Message::Text(text)))) => {
                        gateway.handle_frame(&conn, text.as_str());
                    }
                    Ok(Some(Ok(Message::Binary(data)))) => {
                        // The channel is text-framed; a binary frame that is
                        // valid UTF-8 goes through the same codec path.
                        if let Ok(text) = std::str::from_utf8(&data) {
                            gateway.handle_frame(&conn, text);
                        }
                    }
                    Ok(Some(Ok(Message::Close(_)))) => break,
                    Ok(Some(Ok(_))) => {} // ping/pong handled by the transport
                }
            }
        }
    }

    info!(player_id = %conn.player_id, room_id = %conn.room_id, "ws close");
    gateway.close_connection(&conn, &ctl);
    writer.abort();
}

/// Ephemeral `[a-z0-9]{8}` player id for dev mode.
fn ephemeral_player_id() -> String {
    const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    (0..8)
        .map(|_| CHARS[rng.gen_range(0..CHARS.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use base64::Engine;
    use hmac::{Hmac, Mac};
    use sha2::Sha256;

    /// Mint a valid token for `sub` signed with `key`.
    fn mint_token(sub: &str, key: &str) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(format!(r#"{{"sub":"{sub}","username":"{sub}"}}"#));
        let signed = format!("{header}.{body}");
        let mut mac = Hmac::<Sha256>::new_from_slice(key.as_bytes()).unwrap();
        mac.update(signed.as_bytes());
        format!("{signed}.{}", URL_SAFE_NO_PAD.encode(&mac.finalize().into_bytes()[..]))
    }

    fn test_gateway(secret: Option<&str>) -> Gateway {
        let cfg = ServerConfig {
            max_rooms: 2,
            max_players_per_room: 2,
            ..Default::default()
        };
        Gateway::new(cfg, secret.map(String::from))
    }

    #[test]
    fn test_ephemeral_id_shape() {
        for _ in 0..50 {
            let id = ephemeral_player_id();
            assert_eq!(id.len(), 8);
            assert!(id
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_admit_dev_mode_assigns_identity() {
        let gateway = test_gateway(None);
        let conn = gateway.admit("r1", None).unwrap();
        assert_eq!(conn.player_name, "Player");
        assert_eq!(conn.player_id.len(), 8);
        assert_eq!(conn.room_id, "r1");
    }

    #[test]
    fn test_admit_bad_token_rejected() {
        let gateway = test_gateway(Some("secret"));
        let err = gateway.admit("r1", Some("not.a.token")).unwrap_err();
        assert_eq!(err.0, StatusCode::UNAUTHORIZED);
        assert_eq!(err.1, "Invalid or expired token");
    }

    #[test]
    fn test_admit_without_token_in_dev_mode_is_ephemeral() {
        // Key configured but no token supplied: connection still gets an
        // ephemeral identity.
        let gateway = test_gateway(Some("secret"));
        let conn = gateway.admit("r1", None).unwrap();
        assert_eq!(conn.player_name, "Player");
    }

    #[test]
    fn test_admit_room_capacity() {
        let gateway = test_gateway(None);
        gateway.admit("r1", None).unwrap();
        gateway.admit("r2", None).unwrap();

        let err = gateway.admit("r3", None).unwrap_err();
        assert_eq!(err.0, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.1, "Server at max room capacity");

        // Existing rooms still admit.
        assert!(gateway.admit("r1", None).is_ok());
    }

    #[test]
    fn test_admit_full_room_rejected() {
        let gateway = test_gateway(None);

        // Fill the room with two open connections.
        for _ in 0..2 {
            let conn = gateway.admit("r1", None).unwrap();
            let (tx, _rx) = mpsc::channel(8);
            let ctl = Arc::new(ConnCtl::default());
            assert!(gateway.open_connection(&conn, &tx, &ctl));
        }

        let err = gateway.admit("r1", None).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert_eq!(err.1, "Room is full");
    }

    #[test]
    fn test_admit_finished_room_rejected() {
        let gateway = test_gateway(None);
        {
            let mut registry = gateway.registry.lock().unwrap();
            let room = registry.get_or_create("r1").unwrap();
            room.add_player(Player::new("a", "A")).unwrap();
            room.remove_player("a"); // empties → finished
        }

        let err = gateway.admit("r1", None).unwrap_err();
        assert_eq!(err.0, StatusCode::FORBIDDEN);
        assert_eq!(err.1, "Room is finished");
    }

    #[test]
    fn test_reconnect_displaces_old_socket() {
        // A secret is configured so both connections resolve to the same
        // token subject.
        let gateway = test_gateway(Some("reconnect-secret"));
        let token = mint_token("u1", "reconnect-secret");

        let conn = gateway.admit("r1", Some(&token)).unwrap();
        assert_eq!(conn.player_id, "u1");
        let (tx, mut rx) = mpsc::channel(8);
        let ctl = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&conn, &tx, &ctl));
        while rx.try_recv().is_ok() {}

        // Second connection with the same token: the first socket is
        // tombstoned and force-closed, and the join proceeds as fresh.
        let reconn = gateway.admit("r1", Some(&token)).unwrap();
        assert_eq!(reconn.player_id, "u1");
        assert!(ctl.tombstoned.load(Ordering::SeqCst));

        let (tx2, _rx2) = mpsc::channel(8);
        let ctl2 = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&reconn, &tx2, &ctl2));

        // No player_left reached the displaced socket.
        while let Ok(frame) = rx.try_recv() {
            let v: serde_json::Value = serde_json::from_str(&frame).unwrap();
            assert_ne!(v["type"], "player_left");
        }

        // The old socket's close performs no cleanup: exactly one entry
        // for u1 remains.
        gateway.close_connection(&conn, &ctl);
        assert_eq!(gateway.info().players_online, 1);
        assert!(gateway
            .registry
            .lock()
            .unwrap()
            .get_mut("r1")
            .unwrap()
            .has_player("u1"));
    }

    #[test]
    fn test_close_removes_player_and_sweeps() {
        let gateway = test_gateway(None);
        let conn = gateway.admit("r1", None).unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let ctl = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&conn, &tx, &ctl));
        assert_eq!(gateway.info().players_online, 1);

        gateway.close_connection(&conn, &ctl);

        let info = gateway.info();
        assert_eq!(info.players_online, 0);
        assert_eq!(info.rooms_active, 0, "empty finished room must be swept");
    }

    #[test]
    fn test_open_sequence_frames() {
        let gateway = test_gateway(None);
        let conn = gateway.admit("r1", None).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let ctl = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&conn, &tx, &ctl));

        let first: serde_json::Value =
            serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(first["type"], "connected");
        assert_eq!(first["player_id"], conn.player_id.as_str());
        assert_eq!(first["server_tick"], 0);

        let second: serde_json::Value =
            serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(second["type"], "lobby_state");
        assert_eq!(second["players"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_frame_errors_are_answered_not_fatal() {
        let gateway = test_gateway(None);
        let conn = gateway.admit("r1", None).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let ctl = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&conn, &tx, &ctl));
        // Drain the open sequence.
        while rx.try_recv().is_ok() {}

        gateway.handle_frame(&conn, "not json");
        let err: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["code"], 400);
        assert_eq!(err["message"], "Invalid JSON");

        // The connection keeps working afterwards.
        gateway.handle_frame(&conn, r#"{"type":"ping"}"#);
        let pong: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(pong["type"], "pong");
    }

    #[test]
    fn test_frame_for_vanished_room() {
        let gateway = test_gateway(None);
        let conn = gateway.admit("r1", None).unwrap();
        let (tx, mut rx) = mpsc::channel(8);
        let ctl = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&conn, &tx, &ctl));
        while rx.try_recv().is_ok() {}

        // Drop the room behind the connection's back.
        {
            let mut registry = gateway.registry.lock().unwrap();
            let room = registry.get_mut("r1").unwrap();
            room.remove_player(&conn.player_id);
            registry.sweep();
        }

        gateway.handle_frame(&conn, r#"{"type":"ping"}"#);
        let err: serde_json::Value = serde_json::from_str(&rx.try_recv().unwrap()).unwrap();
        assert_eq!(err["type"], "error");
        assert_eq!(err["code"], 404);
        assert_eq!(err["message"], "Room not found");
    }

    #[test]
    fn test_info_counters() {
        let gateway = test_gateway(None);
        let a = gateway.admit("r1", None).unwrap();
        let (tx, _rx) = mpsc::channel(8);
        let ctl = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&a, &tx, &ctl));

        let b = gateway.admit("r1", None).unwrap();
        let (tx2, _rx2) = mpsc::channel(8);
        let ctl2 = Arc::new(ConnCtl::default());
        assert!(gateway.open_connection(&b, &tx2, &ctl2));

        gateway.handle_frame(&a, r#"{"type":"player_ready","ready":true}"#);
        gateway.handle_frame(&b, r#"{"type":"player_ready","ready":true}"#);

        let info = gateway.info();
        assert_eq!(info.rooms_active, 1);
        assert_eq!(info.rooms_playing, 1);
        assert_eq!(info.players_online, 2);
    }
}
