//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::relay::Relay;
use crate::util::rate_limit::PeerRateLimiter;
use crate::ws::protocol::{ClientMsg, PeerId, ServerMsg};

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    // Subscribe before connecting so nothing between the two is missed
    let fanout_rx = state.relay.subscribe();
    let conn_id = state.relay.connect();

    let (ws_sink, ws_stream) = socket.split();

    run_session(
        conn_id,
        &state.relay,
        state.peer_limiter(),
        ws_sink,
        ws_stream,
        fanout_rx,
    )
    .await;

    // Cleanup on disconnect
    state.relay.disconnect(conn_id);

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Run the WebSocket session with read/write split
async fn run_session(
    conn_id: PeerId,
    relay: &Relay,
    rate_limiter: PeerRateLimiter,
    mut ws_sink: futures::stream::SplitSink<WebSocket, Message>,
    mut ws_stream: futures::stream::SplitStream<WebSocket>,
    mut fanout_rx: broadcast::Receiver<ServerMsg>,
) {
    // Spawn writer task: relay fan-out -> WebSocket
    let writer_handle = tokio::spawn(async move {
        loop {
            match fanout_rx.recv().await {
                Ok(msg) => {
                    if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                        debug!(conn_id = %conn_id, error = %e, "WebSocket send failed");
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(
                        conn_id = %conn_id,
                        lagged_count = n,
                        "Peer lagged, skipping {} events", n
                    );
                    // Continue - don't disconnect for lag
                }
                Err(broadcast::error::RecvError::Closed) => {
                    debug!(conn_id = %conn_id, "Fan-out channel closed");
                    break;
                }
            }
        }
    });

    // Reader loop: WebSocket -> relay
    while let Some(result) = ws_stream.next().await {
        match result {
            Ok(Message::Text(text)) => {
                handle_text(conn_id, relay, &rate_limiter, &text);
            }
            Ok(Message::Binary(_)) => {
                debug!(conn_id = %conn_id, "Received binary message, ignoring");
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
            Ok(Message::Close(_)) => {
                info!(conn_id = %conn_id, "Peer initiated close");
                break;
            }
            Err(e) => {
                error!(conn_id = %conn_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    // Abort writer task
    writer_handle.abort();
}

/// Validate one inbound frame and hand it to the relay. Anything malformed is dropped quietly.
pub fn handle_text(
    conn_id: PeerId,
    relay: &Relay,
    rate_limiter: &PeerRateLimiter,
    text: &str,
) -> Option<ServerMsg> {
    if !rate_limiter.check_input() {
        debug!(conn_id = %conn_id, "Rate limited inbound message");
        return None;
    }

    match ClientMsg::parse(text) {
        Ok(msg) => relay.handle(conn_id, msg),
        Err(e) => {
            debug!(conn_id = %conn_id, error = %e, "Dropping malformed frame");
            None
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
