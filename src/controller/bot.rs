//! Scripted controller: drives a virtual touchpad along a fixed path
//!
//! Useful for demos without phones and for loading a relay with many peers.

use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use super::Touchpad;
use crate::net::{connect, Connection, ReconnectPolicy, TransportError};
use crate::util::time::unix_millis;
use crate::ws::protocol::ClientMsg;

#[derive(Debug, Clone)]
pub struct BotConfig {
    pub name: String,
    pub pad_width: f64,
    pub pad_height: f64,
    /// Time between two path samples
    pub step: Duration,
    /// Release (and so slash) every this many samples
    pub slash_every: u64,
    /// Path phase offset, so several bots do not overlap
    pub phase: f64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "bot".to_string(),
            pad_width: 360.0,
            pad_height: 640.0,
            step: Duration::from_millis(50),
            slash_every: 20,
            phase: 0.0,
        }
    }
}

/// Lissajous sample on the pad, kept inside a 10% border
pub fn path_point(step: u64, config: &BotConfig) -> (f64, f64) {
    let t = step as f64 * 0.05 + config.phase;
    let x = 0.5 + 0.4 * (t * 3.0).sin();
    let y = 0.5 + 0.4 * (t * 2.0).cos();
    (x * config.pad_width, y * config.pad_height)
}

/// Run until the reconnect policy gives up
pub async fn run(
    base_url: &str,
    policy: &ReconnectPolicy,
    config: BotConfig,
) -> Result<(), TransportError> {
    // Unmeasured until the first connection, like a page that has not laid out yet
    let mut pad = Touchpad::default();
    pad.save_name(&config.name);
    let mut step = 0u64;

    loop {
        let mut conn = connect(base_url, policy).await?;
        info!(name = %pad.name(), transport = %conn.transport, "Bot connected");
        pad.resize(config.pad_width, config.pad_height);

        if let Err(e) = drive(&mut conn, &mut pad, &config, &mut step).await {
            warn!(error = %e, "Bot lost its connection");
        }
        pad.on_disconnect();
    }
}

async fn drive(
    conn: &mut Connection,
    pad: &mut Touchpad,
    config: &BotConfig,
    step: &mut u64,
) -> Result<(), TransportError> {
    send(conn, pad.on_connect()).await?;

    let (x, y) = path_point(*step, config);
    send(conn, pad.press(x, y)).await?;

    let mut ticker = interval(config.step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut received = 0u64;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                *step += 1;
                let (x, y) = path_point(*step, config);
                if config.slash_every > 0 && *step % config.slash_every == 0 {
                    send(conn, pad.drag(x, y)).await?;
                    send(conn, pad.release()).await?;
                    // a quick double tap every other slash
                    if (*step / config.slash_every) % 2 == 0 {
                        let now = unix_millis();
                        send(conn, pad.tap(now)).await?;
                        send(conn, pad.tap(now + 100)).await?;
                    }
                    send(conn, pad.press(x, y)).await?;
                } else {
                    send(conn, pad.drag(x, y)).await?;
                }
            }
            msg = conn.recv() => {
                match msg {
                    Some(msg) => {
                        received += 1;
                        if received % 500 == 0 {
                            debug!(received, last_peer = %msg.peer_id(), "Bot still hearing the relay");
                        }
                    }
                    None => return Err(TransportError::Closed),
                }
            }
        }
    }
}

async fn send(conn: &Connection, frame: Option<ClientMsg>) -> Result<(), TransportError> {
    match frame {
        Some(msg) => conn.send(msg).await,
        None => Ok(()),
    }
}
