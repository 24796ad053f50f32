//! Peer transports: WebSocket (primary) and server-sent events (fallback)

pub mod handler;
pub mod protocol;
pub mod sse;
