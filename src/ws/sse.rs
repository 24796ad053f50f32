//! Server-sent-events transport, the fallback when a WebSocket cannot be established.
//!
//! `GET /sse` opens the stream: a `session` event carrying the connection id, then one `message`
//! event per relay broadcast. The peer posts its own frames to `POST /sse/{id}`. Dropping the
//! stream is the disconnect.

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
};
use dashmap::DashMap;
use futures::stream::Stream;
use tokio_stream::wrappers::{errors::BroadcastStreamRecvError, BroadcastStream};
use tokio_stream::StreamExt;
use tracing::warn;

use crate::app::AppState;
use crate::http::routes::AppError;
use crate::relay::Relay;
use crate::util::rate_limit::PeerRateLimiter;
use crate::ws::handler::handle_text;
use crate::ws::protocol::{PeerId, SessionInfo};

/// Tears the session down when the stream is dropped
struct SessionGuard {
    conn_id: PeerId,
    relay: Arc<Relay>,
    sessions: Arc<DashMap<PeerId, PeerRateLimiter>>,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.sessions.remove(&self.conn_id);
        self.relay.disconnect(self.conn_id);
    }
}

/// GET /sse
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.relay.subscribe();
    let conn_id = state.relay.connect();
    state.sse_sessions.insert(conn_id, state.peer_limiter());

    let guard = SessionGuard {
        conn_id,
        relay: Arc::clone(&state.relay),
        sessions: Arc::clone(&state.sse_sessions),
    };

    let session = serde_json::to_string(&SessionInfo { id: conn_id }).unwrap_or_default();
    let opening = tokio_stream::once(Ok(Event::default().event("session").data(session)));

    let updates = BroadcastStream::new(rx).filter_map(move |result| {
        let _guard = &guard;
        match result {
            Ok(msg) => match serde_json::to_string(&msg) {
                Ok(json) => Some(Ok(Event::default().event("message").data(json))),
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to encode event");
                    None
                }
            },
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!(conn_id = %conn_id, lagged_count = n, "Event-stream peer lagged");
                None
            }
        }
    });

    Sse::new(opening.chain(updates)).keep_alive(KeepAlive::default())
}

/// POST /sse/:id - one client frame per request
pub async fn post_frame(
    State(state): State<AppState>,
    Path(conn_id): Path<PeerId>,
    body: String,
) -> Result<StatusCode, AppError> {
    let limiter = state
        .sse_sessions
        .get(&conn_id)
        .map(|entry| entry.value().clone())
        .ok_or_else(|| AppError::NotFound(format!("no open session {conn_id}")))?;

    // Malformed frames are accepted and dropped, same as on the socket
    handle_text(conn_id, &state.relay, &limiter, &body);
    Ok(StatusCode::NO_CONTENT)
}
