//! Headless projector: the rendering authority for a shared canvas
//!
//! One task owns the [`Game`]. A `tokio::select!` multiplexes the frame clock, the two round
//! timers, relay events and operator commands. The round timers only fire while the round is
//! running and restart together whenever it (re)starts, so a paused round resumes with full
//! periods ahead of it.
//!
//! The relay connection is never on the critical path: (re)connecting runs in its own task and
//! the round keeps ticking offline until it succeeds.

use std::str::FromStr;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval, Interval, MissedTickBehavior};
use tracing::{debug, info, trace, warn, Level};

use crate::game::{Game, GameTuning, RoundPhase};
use crate::net::{connect, Connection, ReconnectPolicy, TransportError};
use crate::ws::protocol::ServerMsg;
use crate::render::{compose, Hud};
use crate::util::time::{frame_delta, frame_period, unix_millis, COUNTDOWN_PERIOD, SPAWN_PERIOD};

/// Operator commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    /// Pause or resume
    Pause,
    Reset,
    Restart,
    Quit,
}

#[derive(Debug, thiserror::Error)]
#[error("unknown command: {0} (try start, pause, reset, restart, quit)")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" | "s" => Ok(Command::Start),
            "pause" | "resume" | "p" => Ok(Command::Pause),
            "reset" => Ok(Command::Reset),
            "restart" | "r" => Ok(Command::Restart),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ProjectorConfig {
    pub relay_url: String,
    pub policy: ReconnectPolicy,
    pub tuning: GameTuning,
    pub seed: u64,
    /// Wait before starting over once the reconnect policy gives up
    pub offline_retry: Duration,
}

/// Default wait between reconnect rounds while offline
pub const OFFLINE_RETRY: Duration = Duration::from_secs(15);

type PendingConnect = JoinHandle<Result<Connection, TransportError>>;

fn spawn_connect(config: &ProjectorConfig, delay: Duration) -> PendingConnect {
    let url = config.relay_url.clone();
    let policy = config.policy.clone();
    tokio::spawn(async move {
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        connect(&url, &policy).await
    })
}

/// Next relay event, or never while offline
async fn next_event(conn: &mut Option<Connection>) -> Option<ServerMsg> {
    match conn {
        Some(conn) => conn.recv().await,
        None => std::future::pending().await,
    }
}

/// Outcome of the pending connect, or never when none is in flight
async fn connected(pending: &mut Option<PendingConnect>) -> Result<Connection, TransportError> {
    match pending {
        Some(task) => task.await.unwrap_or(Err(TransportError::Closed)),
        None => std::future::pending().await,
    }
}

/// Round timers, gated by the running flag
struct RoundClock {
    countdown: Interval,
    spawn: Interval,
}

impl RoundClock {
    fn new() -> Self {
        let mut countdown = interval(COUNTDOWN_PERIOD);
        let mut spawn = interval(SPAWN_PERIOD);
        countdown.set_missed_tick_behavior(MissedTickBehavior::Delay);
        spawn.set_missed_tick_behavior(MissedTickBehavior::Delay);
        Self { countdown, spawn }
    }

    /// Next ticks one full period from now
    fn restart(&mut self) {
        self.countdown.reset();
        self.spawn.reset();
    }
}

/// Run until `quit` or the command channel closes. Returns the final game state.
pub async fn run(config: ProjectorConfig, mut commands: mpsc::Receiver<Command>) -> Game {
    let mut game = Game::new(config.tuning, config.seed);
    let mut conn: Option<Connection> = None;
    let mut pending = Some(spawn_connect(&config, Duration::ZERO));

    let mut frames = interval(frame_period());
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut clock = RoundClock::new();
    let mut last_hud = Hud::of(&game);

    info!(
        width = config.tuning.width,
        height = config.tuning.height,
        seed = config.seed,
        "Projector ready, type `start` to begin"
    );

    loop {
        let running = game.is_running();

        tokio::select! {
            _ = frames.tick() => {
                for cut in game.step(unix_millis(), frame_delta()) {
                    debug!(
                        fruit = cut.kind.symbol(),
                        slashed_by = %cut.slashed_by,
                        credited = ?cut.credited,
                        bonus = cut.bonus,
                        "Fruit cut"
                    );
                }

                let hud = Hud::of(&game);
                if hud != last_hud {
                    info!(
                        phase = hud.phase,
                        score = hud.score,
                        combo = hud.combo,
                        time_left = hud.time_left,
                        participants = game.registry().len(),
                        "HUD"
                    );
                    last_hud = hud;
                }

                if tracing::enabled!(Level::TRACE) {
                    if let Ok(json) = serde_json::to_string(&compose(&game)) {
                        trace!(frame = %json, "Frame");
                    }
                }
            }

            _ = clock.countdown.tick(), if running => {
                if let Some(summary) = game.tick_countdown() {
                    for line in summary.lines() {
                        println!("{line}");
                    }
                }
            }

            _ = clock.spawn.tick(), if running => {
                game.spawn_fruit();
            }

            msg = next_event(&mut conn) => {
                match msg {
                    Some(msg) => game.apply(&msg, unix_millis()),
                    None => {
                        warn!("Relay connection lost, reconnecting in the background");
                        conn = None;
                        pending = Some(spawn_connect(&config, Duration::ZERO));
                    }
                }
            }

            result = connected(&mut pending) => {
                pending = None;
                match result {
                    Ok(new_conn) => {
                        info!(transport = %new_conn.transport, "Projector online");
                        conn = Some(new_conn);
                    }
                    Err(e) => {
                        warn!(
                            error = %e,
                            retry_in = ?config.offline_retry,
                            "Relay unreachable, round continues offline"
                        );
                        pending = Some(spawn_connect(&config, config.offline_retry));
                    }
                }
            }

            cmd = commands.recv() => {
                let Some(cmd) = cmd else {
                    info!("Command input closed");
                    break;
                };
                if !apply_command(&mut game, &mut clock, cmd) {
                    break;
                }
            }
        }
    }

    if let Some(task) = pending {
        task.abort();
    }
    game
}

/// Apply one operator command. Returns false on quit.
fn apply_command(game: &mut Game, clock: &mut RoundClock, cmd: Command) -> bool {
    match cmd {
        Command::Start | Command::Restart => {
            let started = if cmd == Command::Start {
                game.start()
            } else {
                game.restart()
            };
            if started {
                clock.restart();
            } else {
                warn!(phase = ?game.phase(), "Round already in progress");
            }
        }
        Command::Pause => {
            if game.toggle_pause() == RoundPhase::Running {
                clock.restart();
            }
        }
        Command::Reset => game.reset(),
        Command::Quit => {
            info!("Projector quitting");
            return false;
        }
    }
    true
}
