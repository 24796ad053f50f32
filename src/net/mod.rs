//! Peer-side relay client: transports, reconnect policy and the event-stream decoder

pub mod client;
pub mod event_stream;

pub use client::{connect, Connection, ReconnectPolicy, Transport, TransportError};
