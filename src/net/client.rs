//! Relay client with WebSocket and event-stream transports
//!
//! A [`Connection`] hides the transport behind two channels: frames to send and relay events
//! received. Background tasks own the socket; when it closes, `recv` returns `None` and the
//! caller reconnects through [`connect`] again.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};

use super::event_stream::SseDecoder;
use crate::ws::protocol::{ClientMsg, PeerId, ServerMsg, SessionInfo};

/// Buffered frames per direction
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    WebSocket,
    EventStream,
}

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Transport::WebSocket => write!(f, "websocket"),
            Transport::EventStream => write!(f, "event-stream"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid relay url: {0}")]
    InvalidUrl(String),

    #[error("websocket failed: {0}")]
    WebSocket(Box<tokio_tungstenite::tungstenite::Error>),

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("event stream ended before the session event")]
    MissingSession,

    #[error("bad frame: {0}")]
    Json(#[from] serde_json::Error),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection closed")]
    Closed,

    #[error("gave up after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

impl From<tokio_tungstenite::tungstenite::Error> for TransportError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        TransportError::WebSocket(Box::new(e))
    }
}

/// Bounded reconnect, alternating transports between attempts
#[derive(Debug, Clone)]
pub struct ReconnectPolicy {
    pub transports: Vec<Transport>,
    pub max_attempts: u32,
    pub connect_timeout: Duration,
    pub backoff: Duration,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            transports: vec![Transport::WebSocket, Transport::EventStream],
            max_attempts: 5,
            connect_timeout: Duration::from_secs(7),
            backoff: Duration::from_millis(500),
        }
    }
}

impl ReconnectPolicy {
    /// Only ever use one transport
    pub fn only(transport: Transport) -> Self {
        Self {
            transports: vec![transport],
            ..Self::default()
        }
    }

    /// Transport for a zero-based attempt number
    pub fn transport_for(&self, attempt: u32) -> Transport {
        if self.transports.is_empty() {
            return Transport::WebSocket;
        }
        self.transports[attempt as usize % self.transports.len()]
    }
}

/// An open relay connection
pub struct Connection {
    pub transport: Transport,
    /// Only known on the event-stream transport, where the relay announces it
    pub session: Option<PeerId>,
    outgoing: mpsc::Sender<ClientMsg>,
    incoming: mpsc::Receiver<ServerMsg>,
    tasks: Vec<JoinHandle<()>>,
}

impl Connection {
    pub async fn send(&self, msg: ClientMsg) -> Result<(), TransportError> {
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| TransportError::Closed)
    }

    /// Next relay event; `None` once the transport is gone
    pub async fn recv(&mut self) -> Option<ServerMsg> {
        self.incoming.recv().await
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

/// Connect to the relay at `base_url` (`http://host:port`) following `policy`
pub async fn connect(base_url: &str, policy: &ReconnectPolicy) -> Result<Connection, TransportError> {
    let base = base_url.trim_end_matches('/');

    for attempt in 0..policy.max_attempts {
        let transport = policy.transport_for(attempt);
        let result = match tokio::time::timeout(policy.connect_timeout, open(base, transport)).await {
            Ok(result) => result,
            Err(_) => Err(TransportError::Timeout(policy.connect_timeout)),
        };

        match result {
            Ok(conn) => {
                info!(transport = %transport, attempt = attempt + 1, "Connected to relay");
                return Ok(conn);
            }
            Err(e) => {
                warn!(
                    transport = %transport,
                    attempt = attempt + 1,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Relay connect failed"
                );
                if attempt + 1 < policy.max_attempts {
                    tokio::time::sleep(policy.backoff).await;
                }
            }
        }
    }

    Err(TransportError::Exhausted {
        attempts: policy.max_attempts,
    })
}

async fn open(base: &str, transport: Transport) -> Result<Connection, TransportError> {
    match transport {
        Transport::WebSocket => open_websocket(base).await,
        Transport::EventStream => open_event_stream(base).await,
    }
}

/// `http://host` -> `ws://host/ws`
pub fn websocket_url(base: &str) -> Result<String, TransportError> {
    let base = base.trim_end_matches('/');
    if let Some(rest) = base.strip_prefix("https://") {
        Ok(format!("wss://{rest}/ws"))
    } else if let Some(rest) = base.strip_prefix("http://") {
        Ok(format!("ws://{rest}/ws"))
    } else {
        Err(TransportError::InvalidUrl(base.to_string()))
    }
}

async fn open_websocket(base: &str) -> Result<Connection, TransportError> {
    let url = websocket_url(base)?;
    let (stream, _) = connect_async(url.as_str()).await?;
    let (mut sink, mut source) = stream.split();

    let (out_tx, mut out_rx) = mpsc::channel::<ClientMsg>(CHANNEL_CAPACITY);
    let (in_tx, in_rx) = mpsc::channel::<ServerMsg>(CHANNEL_CAPACITY);

    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode frame");
                    continue;
                }
            };
            if let Err(e) = sink.send(Message::Text(json)).await {
                debug!(error = %e, "WebSocket send failed");
                break;
            }
        }
        let _ = sink.close().await;
    });

    let reader = tokio::spawn(async move {
        while let Some(result) = source.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    if !forward(&in_tx, &text).await {
                        break;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
            }
        }
    });

    Ok(Connection {
        transport: Transport::WebSocket,
        session: None,
        outgoing: out_tx,
        incoming: in_rx,
        tasks: vec![writer, reader],
    })
}

async fn open_event_stream(base: &str) -> Result<Connection, TransportError> {
    if !base.starts_with("http://") && !base.starts_with("https://") {
        return Err(TransportError::InvalidUrl(base.to_string()));
    }

    let http = reqwest::Client::new();
    let response = http
        .get(format!("{base}/sse"))
        .header(reqwest::header::ACCEPT, "text/event-stream")
        .send()
        .await?
        .error_for_status()?;
    let mut body = response.bytes_stream();
    let mut decoder = SseDecoder::new();

    // The session event comes first; anything queued behind it in the same chunk is kept
    let (session, mut backlog) = loop {
        let chunk = body.next().await.ok_or(TransportError::MissingSession)??;
        let mut events = decoder.push(&chunk).into_iter();
        if let Some(first) = events.next() {
            if first.event != "session" {
                return Err(TransportError::MissingSession);
            }
            let info: SessionInfo = serde_json::from_str(&first.data)?;
            break (info.id, events.collect::<Vec<_>>());
        }
    };
    debug!(conn_id = %session, "Event-stream session opened");

    let (out_tx, mut out_rx) = mpsc::channel::<ClientMsg>(CHANNEL_CAPACITY);
    let (in_tx, in_rx) = mpsc::channel::<ServerMsg>(CHANNEL_CAPACITY);

    let post_url = format!("{base}/sse/{session}");
    let writer = tokio::spawn(async move {
        while let Some(msg) = out_rx.recv().await {
            let json = match serde_json::to_string(&msg) {
                Ok(json) => json,
                Err(e) => {
                    warn!(error = %e, "Failed to encode frame");
                    continue;
                }
            };
            match http.post(&post_url).body(json).send().await {
                Ok(resp) if resp.status().is_success() => {}
                Ok(resp) => {
                    debug!(status = %resp.status(), "Relay refused posted frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "Posting frame failed");
                    break;
                }
            }
        }
    });

    let reader = tokio::spawn(async move {
        for event in backlog.drain(..) {
            if event.event == "message" && !forward(&in_tx, &event.data).await {
                return;
            }
        }
        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    debug!(error = %e, "Event stream read failed");
                    break;
                }
            };
            for event in decoder.push(&chunk) {
                if event.event == "message" && !forward(&in_tx, &event.data).await {
                    return;
                }
            }
        }
    });

    Ok(Connection {
        transport: Transport::EventStream,
        session: Some(session),
        outgoing: out_tx,
        incoming: in_rx,
        tasks: vec![writer, reader],
    })
}

/// Decode one relay frame and hand it on. Returns false once the receiver is gone.
async fn forward(tx: &mpsc::Sender<ServerMsg>, text: &str) -> bool {
    match serde_json::from_str::<ServerMsg>(text) {
        Ok(msg) => tx.send(msg).await.is_ok(),
        Err(e) => {
            debug!(error = %e, "Dropping undecodable relay frame");
            true
        }
    }
}
