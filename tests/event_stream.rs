//! End-to-end event stream tests against a local axum WebSocket server.

#![allow(clippy::panic)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use tokio::sync::broadcast;
use url::Url;

use polycomp_sync::cache::{CacheKey, QueryCache, QueryKind};
use polycomp_sync::config::ClientConfig;
use polycomp_sync::domain::{GameEvent, GameId, ParticipantId, TransactionId};
use polycomp_sync::sync::{
    BackoffPolicy, ConnectionState, EventHandler, SyncContext, SyncManager, SyncUpdate, UpdateBus,
};

#[derive(Clone)]
struct ServerState {
    /// Frames sent on the first connection, which is then closed.
    first_frames: Arc<Vec<String>>,
    connections: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
    game_ids: Arc<Mutex<Vec<String>>>,
}

async fn ws_route(
    ws: WebSocketUpgrade,
    Query(query): Query<HashMap<String, String>>,
    State(state): State<ServerState>,
) -> impl IntoResponse {
    if let (Some(id), Ok(mut ids)) = (query.get("game_id"), state.game_ids.lock()) {
        ids.push(id.clone());
    }
    ws.on_upgrade(move |socket| serve(socket, state))
}

async fn serve(mut socket: WebSocket, state: ServerState) {
    let n = state.connections.fetch_add(1, Ordering::SeqCst);
    state.live.fetch_add(1, Ordering::SeqCst);

    if n == 0 {
        for frame in state.first_frames.iter() {
            if socket.send(Message::text(frame.clone())).await.is_err() {
                break;
            }
        }
        let _ = socket.send(Message::Close(None)).await;
    } else {
        while let Some(Ok(msg)) = socket.recv().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    }
    state.live.fetch_sub(1, Ordering::SeqCst);
}

async fn spawn_server(first_frames: Vec<String>) -> (SocketAddr, ServerState) {
    let state = ServerState {
        first_frames: Arc::new(first_frames),
        connections: Arc::new(AtomicUsize::new(0)),
        live: Arc::new(AtomicUsize::new(0)),
        game_ids: Arc::new(Mutex::new(Vec::new())),
    };
    let app = Router::new()
        .route("/ws", get(ws_route))
        .with_state(state.clone());
    let Ok(listener) = tokio::net::TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (addr, state)
}

#[derive(Default)]
struct Recorder(Mutex<Vec<GameEvent>>);

#[async_trait]
impl EventHandler for Recorder {
    async fn handle(&self, _game_id: GameId, event: GameEvent) {
        if let Ok(mut events) = self.0.lock() {
            events.push(event);
        }
    }
}

fn context(addr: SocketAddr, cache: &Arc<QueryCache>, bus: &UpdateBus) -> SyncContext {
    let Ok(base) = Url::parse(&format!("http://{addr}")) else {
        panic!("bad base url");
    };
    let mut config = ClientConfig::new(base);
    config.backoff = BackoffPolicy {
        enabled: true,
        initial_delay: Duration::from_millis(10),
        max_delay: Duration::from_millis(50),
        max_attempts: 0,
        jitter: 0.0,
    };
    SyncContext::from_config(&config, Arc::clone(cache), bus.clone())
}

async fn next_resync(rx: &mut broadcast::Receiver<SyncUpdate>) -> Option<usize> {
    let waited = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match rx.recv().await {
                Ok(SyncUpdate::Resynced { flushed, .. }) => return Some(flushed),
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    })
    .await;
    waited.ok().flatten()
}

#[tokio::test]
async fn frames_invalidate_forward_and_reconnect_resyncs() {
    let game_id = GameId::new();
    let transaction = serde_json::json!({
        "type": "TransactionCreated",
        "payload": {
            "id": TransactionId::new(),
            "game_id": game_id,
            "from_participant_id": null,
            "to_participant_id": ParticipantId::new(),
            "amount": "200.00",
            "description": "Salario",
            "created_at": "2025-03-01T10:00:00Z"
        }
    })
    .to_string();
    let frames = vec![
        "not even json".to_string(),
        transaction,
        r#"{"type":"ChatMessage","payload":{"text":"hola"}}"#.to_string(),
    ];
    let (addr, server) = spawn_server(frames).await;

    let cache = Arc::new(QueryCache::new());
    for kind in [QueryKind::Transactions, QueryKind::Trades] {
        cache
            .put_raw(CacheKey::new(kind, game_id), serde_json::json!([]))
            .await;
    }
    let bus = UpdateBus::new(64);
    let mut updates = bus.subscribe();

    let recorder = Arc::new(Recorder::default());
    let mut manager = SyncManager::new(context(addr, &cache, &bus));
    manager.set_handler(Arc::clone(&recorder) as Arc<dyn EventHandler>);
    let Ok(_) = manager.observe(game_id).await else {
        panic!("observe failed");
    };

    // The first socket delivers three frames and closes; the second open
    // flushes every cached view of the game.
    assert_eq!(next_resync(&mut updates).await, Some(2));

    let events = recorder.0.lock().map(|e| e.clone()).unwrap_or_default();
    assert_eq!(events.len(), 2, "malformed frame must be dropped");
    assert!(matches!(events.first(), Some(GameEvent::TransactionCreated(t)) if t.amount == 200));
    assert!(matches!(events.get(1), Some(GameEvent::Unknown { event_type, .. }) if event_type == "ChatMessage"));

    assert_eq!(
        cache.is_stale(CacheKey::new(QueryKind::Trades, game_id)).await,
        Some(true)
    );
    let ids = server.game_ids.lock().map(|ids| ids.clone()).unwrap_or_default();
    assert!(ids.iter().all(|id| *id == game_id.to_string()));

    manager.close().await;
    assert!(manager.active().is_none());
}

#[tokio::test]
async fn switching_games_leaves_no_socket_behind() {
    let (addr, server) = spawn_server(Vec::new()).await;
    // Burn the "first connection" slot so every socket stays open.
    server.connections.fetch_add(1, Ordering::SeqCst);

    let cache = Arc::new(QueryCache::new());
    let bus = UpdateBus::new(64);
    let mut manager = SyncManager::new(context(addr, &cache, &bus));

    for _ in 0..3 {
        let Ok(sync) = manager.observe(GameId::new()).await else {
            panic!("observe failed");
        };
        let mut state = sync.state_changes();
        let opened = tokio::time::timeout(
            Duration::from_secs(5),
            state.wait_for(|s| *s == ConnectionState::Open),
        )
        .await;
        assert!(matches!(opened, Ok(Ok(_))));
    }
    manager.close().await;

    // One burned slot plus one socket per observed game, all closed.
    let drained = tokio::time::timeout(Duration::from_secs(2), async {
        while server.connections.load(Ordering::SeqCst) < 4 || server.live.load(Ordering::SeqCst) > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(drained.is_ok(), "server still sees open sockets");
    assert_eq!(server.connections.load(Ordering::SeqCst), 4);
}
