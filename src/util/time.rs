//! Time utilities for the relay and the simulation loop

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(std::time::Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Render/update loop rate. One logical step per frame.
pub const FRAME_TPS: u32 = 60;
/// Round countdown ticks once per second
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);
/// A new fruit every two seconds while running
pub const SPAWN_PERIOD: Duration = Duration::from_secs(2);

/// Fixed logical step in seconds, independent of real frame jitter
pub fn frame_delta() -> f32 {
    // Slash lifetimes and cut-fade timings are tuned against 0.016, not 1/60
    0.016
}

/// Wall-clock duration of one frame
pub fn frame_period() -> Duration {
    Duration::from_micros(1_000_000 / FRAME_TPS as u64)
}
