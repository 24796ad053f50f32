//! Application state shared across routes

use std::sync::Arc;

use dashmap::DashMap;

use crate::config::Config;
use crate::relay::Relay;
use crate::util::rate_limit::PeerRateLimiter;
use crate::ws::protocol::PeerId;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub relay: Arc<Relay>,
    /// Open event-stream sessions, keyed by the id handed out in the `session` event
    pub sse_sessions: Arc<DashMap<PeerId, PeerRateLimiter>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let config = Arc::new(config);

        // Initialize the relay hub
        let relay = Arc::new(Relay::new(config.broadcast_capacity));

        Self {
            config,
            relay,
            sse_sessions: Arc::new(DashMap::new()),
        }
    }

    /// Fresh inbound limiter for a new connection
    pub fn peer_limiter(&self) -> PeerRateLimiter {
        PeerRateLimiter::new(self.config.input_rate_limit)
    }
}
