//! Mock Telegram Bot API server for integration tests.
//!
//! Serves `getMe` and `getUpdates` for a single token:
//! - Queued updates are returned while `update_id >= offset`
//! - Every `getUpdates` offset is recorded
//! - Requests with any other token get `401 Unauthorized`

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

struct MockState {
    token: String,
    updates: Mutex<Vec<Value>>,
    offsets: Mutex<Vec<Option<i64>>>,
}

/// A mock Bot API server bound to an ephemeral port.
pub struct MockTelegramServer {
    addr: SocketAddr,
    state: Arc<MockState>,
    shutdown_tx: oneshot::Sender<()>,
}

impl MockTelegramServer {
    /// Start a new mock server accepting `token`.
    pub async fn start(token: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(MockState {
            token: token.to_string(),
            updates: Mutex::new(Vec::new()),
            offsets: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route("/{bot}/getMe", get(get_me))
            .route("/{bot}/getUpdates", get(get_updates))
            .with_state(state.clone());

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await;
        });

        Self {
            addr,
            state,
            shutdown_tx,
        }
    }

    /// Base URL to hand to `TelegramClient`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Queue a raw update object.
    pub fn push_update(&self, update: Value) {
        self.state.updates.lock().push(update);
    }

    /// Offsets received by `getUpdates`, in call order.
    pub fn offsets(&self) -> Vec<Option<i64>> {
        self.state.offsets.lock().clone()
    }

    /// Shutdown the server.
    pub fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
    }
}

fn authorized(state: &MockState, bot: &str) -> bool {
    bot.strip_prefix("bot") == Some(state.token.as_str())
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"ok": false, "error_code": 401, "description": "Unauthorized"})),
    )
}

async fn get_me(
    State(state): State<Arc<MockState>>,
    Path(bot): Path<String>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&state, &bot) {
        return unauthorized();
    }
    (
        StatusCode::OK,
        Json(json!({
            "ok": true,
            "result": {"id": 1000, "is_bot": true, "first_name": "relay", "username": "relay_bot"}
        })),
    )
}

async fn get_updates(
    State(state): State<Arc<MockState>>,
    Path(bot): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> (StatusCode, Json<Value>) {
    if !authorized(&state, &bot) {
        return unauthorized();
    }
    let offset = query.get("offset").and_then(|o| o.parse::<i64>().ok());
    state.offsets.lock().push(offset);

    let result: Vec<Value> = state
        .updates
        .lock()
        .iter()
        .filter(|u| {
            let id = u.get("update_id").and_then(Value::as_i64).unwrap_or(0);
            offset.map_or(true, |o| id >= o)
        })
        .cloned()
        .collect();

    (StatusCode::OK, Json(json!({"ok": true, "result": result})))
}
