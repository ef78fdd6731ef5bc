/// WebSocket push channel for real-time notification delivery
///
/// A client connects with its user id and holds the socket open; the
/// connection is registered with the ConnectionRegistry for its lifetime
/// and receives serialized Notification payloads as they are emitted.
///
/// The channel between fan-out and socket is bounded: a slow consumer
/// fills the buffer and subsequent pushes are misses, not back-pressure on
/// the emitting request. Send timeouts and ping/pong detect dead peers.
use crate::{context::AppContext, metrics};
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
    routing::get,
    Router,
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::{
    sync::mpsc,
    time::{interval, timeout, Duration, Instant},
};

/// Push channel configuration constants
const BUFFER_SIZE: usize = 100; // Pending payloads per connection
const SEND_TIMEOUT_MS: u64 = 5000; // Timeout for sending a message
const PING_INTERVAL_SECS: u64 = 30; // Send ping every 30 seconds

/// Connection parameters
#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    #[serde(rename = "userId")]
    pub user_id: i64,
}

/// Build the push channel route
pub fn routes() -> Router<AppContext> {
    Router::new().route("/ws", get(connect))
}

/// WebSocket upgrade handler
async fn connect(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(ctx): State<AppContext>,
) -> Response {
    ws.on_upgrade(move |socket| handle_connection(socket, params.user_id, ctx))
}

/// Drive one registered connection until the peer goes away
async fn handle_connection(socket: WebSocket, user_id: i64, ctx: AppContext) {
    let (mut sender, mut receiver) = socket.split();

    let (tx, mut rx) = mpsc::channel::<String>(BUFFER_SIZE);
    let connection_id = ctx.connections.register(user_id, tx).await;
    metrics::WS_CONNECTIONS_ACTIVE.inc();
    tracing::debug!("Push channel opened for user {}", user_id);

    let mut ping_interval = interval(Duration::from_secs(PING_INTERVAL_SECS));
    let mut last_activity = Instant::now();

    loop {
        tokio::select! {
            // Deliver buffered notification payloads
            Some(payload) = rx.recv() => {
                match send_with_timeout(&mut sender, payload).await {
                    Ok(()) => {
                        last_activity = Instant::now();
                    }
                    Err(SendError::Timeout) => {
                        tracing::warn!("Send timeout for user {}, client may be slow", user_id);
                        break;
                    }
                    Err(SendError::Disconnected) => {
                        tracing::debug!("Client disconnected during send");
                        break;
                    }
                }
            }

            // Send periodic pings
            _ = ping_interval.tick() => {
                if last_activity.elapsed() > Duration::from_secs(PING_INTERVAL_SECS) {
                    if sender.send(Message::Ping(vec![])).await.is_err() {
                        break;
                    }
                }
            }

            // Handle client messages
            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Close(_))) => {
                        tracing::debug!("Client closed connection");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Pong(_))) => {
                        last_activity = Instant::now();
                    }
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        tracing::debug!("Client disconnected");
                        break;
                    }
                    _ => {}
                }
            }
        }
    }

    ctx.connections.unregister(user_id, connection_id).await;
    metrics::WS_CONNECTIONS_ACTIVE.dec();
    tracing::debug!("Push channel closed for user {}", user_id);
}

/// Error type for sending frames
#[derive(Debug)]
enum SendError {
    Timeout,
    Disconnected,
}

/// Send a payload with timeout
async fn send_with_timeout(
    sender: &mut futures::stream::SplitSink<WebSocket, Message>,
    payload: String,
) -> Result<(), SendError> {
    match timeout(
        Duration::from_millis(SEND_TIMEOUT_MS),
        sender.send(Message::Text(payload)),
    )
    .await
    {
        Ok(Ok(_)) => Ok(()),
        Ok(Err(_)) => Err(SendError::Disconnected),
        Err(_) => Err(SendError::Timeout),
    }
}
