//! Fruit Party - relay server and headless clients
//!
//! - `serve` (default): the relay, WebSocket and event-stream transports, pages and health
//! - `projector`: headless rendering authority driven from stdin commands
//! - `controller`: scripted touchpad bots

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use fruit_party::app::AppState;
use fruit_party::config::Config;
use fruit_party::controller::bot::{self, BotConfig};
use fruit_party::game::GameTuning;
use fruit_party::http::build_router;
use fruit_party::net::{ReconnectPolicy, Transport};
use fruit_party::projector::{self, Command, ProjectorConfig, OFFLINE_RETRY};
use fruit_party::util::time::{init_server_time, unix_millis};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    mode: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Run the relay server
    Serve,

    /// Run a headless projector against a relay
    Projector {
        /// Relay base URL
        #[arg(short = 'u', long, env = "RELAY_URL", default_value = "http://127.0.0.1:3000")]
        relay_url: String,

        /// Render surface width
        #[arg(long, default_value = "1280")]
        width: f32,

        /// Render surface height
        #[arg(long, default_value = "720")]
        height: f32,

        /// Simulation seed, defaults to the clock
        #[arg(long, env = "GAME_SEED")]
        seed: Option<u64>,

        #[arg(short = 't', long, value_enum, default_value_t = TransportArg::Auto)]
        transport: TransportArg,
    },

    /// Run scripted controller bots against a relay
    Controller {
        /// Relay base URL
        #[arg(short = 'u', long, env = "RELAY_URL", default_value = "http://127.0.0.1:3000")]
        relay_url: String,

        /// Display name; bots past the first get a numeric suffix
        #[arg(short = 'n', long, default_value = "bot")]
        name: String,

        /// How many bots to run
        #[arg(short = 'b', long, default_value = "1")]
        bots: usize,

        /// Milliseconds between cursor updates
        #[arg(long, default_value = "50")]
        step_ms: u64,

        #[arg(short = 't', long, value_enum, default_value_t = TransportArg::Auto)]
        transport: TransportArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TransportArg {
    /// Alternate WebSocket and event stream on every attempt
    Auto,
    Websocket,
    EventStream,
}

impl TransportArg {
    fn policy(self) -> ReconnectPolicy {
        match self {
            TransportArg::Auto => ReconnectPolicy::default(),
            TransportArg::Websocket => ReconnectPolicy::only(Transport::WebSocket),
            TransportArg::EventStream => ReconnectPolicy::only(Transport::EventStream),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.mode.unwrap_or(Mode::Serve) {
        Mode::Serve => {
            // Server settings are only read when serving
            let config = Config::from_env()?;
            init_tracing(&config.log_level);
            serve(config).await
        }
        Mode::Projector {
            relay_url,
            width,
            height,
            seed,
            transport,
        } => {
            init_tracing(&client_log_level());
            let config = ProjectorConfig {
                relay_url,
                policy: transport.policy(),
                tuning: GameTuning::default().with_surface(width, height),
                seed: seed.unwrap_or_else(unix_millis),
                offline_retry: OFFLINE_RETRY,
            };
            run_projector(config).await
        }
        Mode::Controller {
            relay_url,
            name,
            bots,
            step_ms,
            transport,
        } => {
            init_tracing(&client_log_level());
            run_bots(relay_url, name, bots, step_ms, transport.policy()).await
        }
    }
}

/// Log level for the client modes, which take no server configuration
fn client_log_level() -> String {
    std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string())
}

async fn serve(config: Config) -> anyhow::Result<()> {
    // Initialize server time tracking
    init_server_time();

    info!("Starting Fruit Party relay");
    info!("Server address: {}", config.server_addr);

    // Create application state
    let state = AppState::new(config.clone());

    // Build router
    let router = build_router(state);

    // Start server
    let addr = config.server_addr;
    let listener = TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);
    info!("Health check: http://{}/health", addr);
    info!("WebSocket endpoint: ws://{}/ws", addr);
    info!("Event stream endpoint: http://{}/sse", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn run_projector(config: ProjectorConfig) -> anyhow::Result<()> {
    let (tx, rx) = mpsc::channel::<Command>(16);

    // Operator commands, one per line
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line.trim().is_empty() {
                continue;
            }
            match line.parse::<Command>() {
                Ok(cmd) => {
                    if tx.send(cmd).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            }
        }
    });

    tokio::select! {
        game = projector::run(config, rx) => {
            info!(phase = ?game.phase(), score = game.round().score, "Projector stopped");
        }
        _ = shutdown_signal() => {}
    }
    Ok(())
}

async fn run_bots(
    relay_url: String,
    name: String,
    bots: usize,
    step_ms: u64,
    policy: ReconnectPolicy,
) -> anyhow::Result<()> {
    let mut set = JoinSet::new();
    for i in 0..bots.max(1) {
        let config = BotConfig {
            name: if i == 0 {
                name.clone()
            } else {
                format!("{name}-{}", i + 1)
            },
            step: Duration::from_millis(step_ms.max(1)),
            phase: i as f64 * 0.7,
            ..BotConfig::default()
        };
        let relay_url = relay_url.clone();
        let policy = policy.clone();
        set.spawn(async move { bot::run(&relay_url, &policy, config).await });
    }
    info!(bots = set.len(), "Controller bots running");

    tokio::select! {
        Some(joined) = set.join_next() => joined??,
        _ = shutdown_signal() => {}
    }
    Ok(())
}

/// Initialize tracing/logging. `LOG_FORMAT=json` switches to structured output.
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json().with_target(true)))
        .with((!json).then(|| tracing_subscriber::fmt::layer().with_target(true)))
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_modes_ignore_server_settings() {
        std::env::set_var("PORT", "not-a-port");
        std::env::set_var("INPUT_RATE_LIMIT", "lots");
        std::env::set_var("LOG_LEVEL", "debug");

        assert!(Config::from_env().is_err());
        assert_eq!(client_log_level(), "debug");

        let cli = Cli::try_parse_from(["fruit_party", "projector", "--seed", "3"]).unwrap();
        assert!(matches!(cli.mode, Some(Mode::Projector { seed: Some(3), .. })));

        std::env::remove_var("LOG_LEVEL");
        assert_eq!(client_log_level(), "info");
    }
}
