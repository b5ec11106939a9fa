use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{ws::{Message, WebSocket, WebSocketUpgrade}, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tokio::time;
use uuid::Uuid;

use crate::error::ClientError;
use crate::matchmaker::{Matchmaker, Snapshot};
use crate::protocol::ClientEvent;
use crate::registry::ConnectionId;

#[derive(Clone)]
pub struct AppState {
    pub matchmaker: Arc<Matchmaker>,
    pub ping_interval: Duration,
}

#[derive(serde::Serialize)]
struct HealthReport {
    status: &'static str,
    #[serde(flatten)]
    snapshot: Snapshot,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/pulse", get(ws_handler))
        .route("/health", get(health))
        .with_state(state)
}

/// Serves until `shutdown` resolves, then ends every queue entry and call.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let matchmaker = Arc::clone(&state.matchmaker);
    let signal = async move {
        shutdown.await;
        matchmaker.shutdown();
    };

    axum::serve(listener, router(state))
        .with_graceful_shutdown(signal)
        .await
}

async fn health(State(state): State<AppState>) -> Json<HealthReport> {
    Json(HealthReport {
        status: "ok",
        snapshot: state.matchmaker.snapshot(),
    })
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let id = Uuid::new_v4();
    let matchmaker = state.matchmaker;

    matchmaker.connect(id, tx);

    // Writer: outbound events and keepalive pings
    let ping_every = state.ping_interval;
    let send_task = tokio::spawn(async move {
        let mut ping_interval = time::interval(ping_every);
        loop {
            tokio::select! {
                Some(event) = rx.recv() => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(err) => {
                            tracing::error!(connection_id = %id, error = %err, "Dropping unserializable event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() { break; }
                }
                _ = ping_interval.tick() => {
                    if sender.send(Message::Ping(vec![].into())).await.is_err() { break; }
                }
            }
        }
    });

    // Runs on every exit path, including a panicking handler
    let _teardown = Teardown {
        matchmaker: Arc::clone(&matchmaker),
        id,
        writer: send_task.abort_handle(),
    };

    while let Some(Ok(msg)) = receiver.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientEvent>(text.as_str()) {
                Ok(event) => matchmaker.handle(id, event),
                Err(err) => {
                    tracing::warn!(connection_id = %id, error = %err, "Malformed message");
                    matchmaker.reject(&id, ClientError::Malformed);
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }
}

/// Removes the connection from the matchmaker and stops its writer when dropped.
struct Teardown {
    matchmaker: Arc<Matchmaker>,
    id: ConnectionId,
    writer: AbortHandle,
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.matchmaker.disconnect(&self.id);
        self.writer.abort();
    }
}
