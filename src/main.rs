//! framerelay - diagnostic TCP relay
//!
//! Sits between a client tool and a backend process, forwards every byte in
//! both directions and dumps each chunk with the FEED/BEEF frames decoded.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::IpAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use framerelay::{
    config::{CliOverrides, ConfigManager},
    Config, DiagnosticReporter, RelayEngine, SessionEnd, ShutdownCoordinator,
};

/// CLI arguments for framerelay
#[derive(Parser, Debug)]
#[command(name = "framerelay")]
#[command(about = "Diagnostic TCP relay that dumps traffic and decodes FEED/BEEF frames")]
#[command(version)]
#[command(long_about = "
Diagnostic TCP relay that dumps traffic and decodes FEED/BEEF frames.

Accepts one client on LISTEN_PORT, connects it to TARGET_HOST:TARGET_PORT and
forwards all bytes unmodified. Every chunk is printed as a hex dump followed by
any FE ED .. BE EF frames found in it.

Configuration priority (highest to lowest):
1. Command-line arguments
2. Configuration file (or, without one, environment variables)
3. Built-in defaults

Environment variables:
  FRAMERELAY_LISTEN_ADDR       - Listen address (e.g., 0.0.0.0:12340)
  FRAMERELAY_TARGET_HOST       - Target host (e.g., localhost)
  FRAMERELAY_TARGET_PORT       - Target port
  FRAMERELAY_BUFFER_SIZE       - Read buffer size in bytes
  FRAMERELAY_CONNECT_TIMEOUT   - Target connect timeout (e.g., 10s)
  FRAMERELAY_LOG_LEVEL         - Log level (trace, debug, info, warn, error)
")]
pub struct CliArgs {
    /// Port to accept the client on
    #[arg(value_name = "LISTEN_PORT")]
    pub listen_port: Option<u16>,

    /// Port of the backend to relay to
    #[arg(value_name = "TARGET_PORT")]
    pub target_port: Option<u16>,

    /// Configuration file path
    #[arg(short, long, default_value = "framerelay.toml", help = "Path to configuration file")]
    pub config: PathBuf,

    /// Listen IP (overrides config file)
    #[arg(short, long, help = "IP address to listen on (e.g., 127.0.0.1)")]
    pub bind: Option<IpAddr>,

    /// Target host (overrides config file)
    #[arg(long, help = "Host of the backend to relay to")]
    pub target_host: Option<String>,

    /// Read buffer size in bytes
    #[arg(long, help = "Read buffer size in bytes")]
    pub buffer_size: Option<usize>,

    /// Target connect timeout in seconds
    #[arg(long, help = "Target connect timeout in seconds")]
    pub connect_timeout: Option<u64>,

    /// Skip the hex dump of each chunk
    #[arg(long, help = "Do not print hex dumps")]
    pub no_hex_dump: bool,

    /// Skip frame decoding
    #[arg(long, help = "Do not decode FEED/BEEF frames")]
    pub no_decode: bool,

    /// Write diagnostics to stderr instead of stdout
    #[arg(long, help = "Write diagnostics to stderr")]
    pub stderr: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, help = "Log level")]
    pub log_level: Option<String>,

    /// Enable verbose logging (sets log level to debug)
    #[arg(short, long, help = "Enable verbose logging")]
    pub verbose: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration and exit")]
    pub validate_config: bool,
}

impl CliArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            listen_port: self.listen_port,
            target_port: self.target_port,
            bind: self.bind,
            target_host: self.target_host.clone(),
            buffer_size: self.buffer_size,
            connect_timeout: self.connect_timeout,
            no_hex_dump: self.no_hex_dump,
            no_decode: self.no_decode,
            stderr: self.stderr,
            log_level: if self.verbose { Some("debug".to_string()) } else { self.log_level.clone() },
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            // Logging is not up yet
            eprintln!("framerelay: {:#}", e);
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config);

    if args.validate_config {
        info!("Configuration is valid");
        info!("  Listen address: {}", config.relay.listen_addr);
        info!("  Target: {}", config.relay.target_endpoint());
        info!("  Buffer size: {} bytes", config.relay.buffer_size);
        info!("  Poll interval: {:?}", config.relay.poll_interval);
        info!("  Hex dump: {}", if config.diagnostics.hex_dump { "enabled" } else { "disabled" });
        info!("  Frame decoding: {}", if config.diagnostics.decode_frames { "enabled" } else { "disabled" });
        return ExitCode::SUCCESS;
    }

    info!("Starting framerelay v{}", env!("CARGO_PKG_VERSION"));

    let coordinator = ShutdownCoordinator::new();
    let mut shutdown_rx = coordinator.subscribe();
    let signal_task = tokio::spawn(async move {
        if let Err(e) = coordinator.listen_for_signals().await {
            error!("Error setting up signal handlers: {}", e);
        }
    });

    let engine = RelayEngine::new(config.relay.clone());
    let mut reporter = DiagnosticReporter::from_config(&config.diagnostics);

    let result = engine.run(&mut reporter, &mut shutdown_rx).await;
    signal_task.abort();

    match result {
        Ok(outcome) => {
            match outcome.end {
                SessionEnd::Interrupted => info!("Relay stopped by operator"),
                end => info!("Relay finished: {}", end),
            }
            if let Some(stats) = outcome.stats {
                info!(
                    "Relayed {} bytes ({} up, {} down), {} frames in {}ms",
                    stats.total_bytes(), stats.bytes_up, stats.bytes_down, stats.frames, stats.duration_ms
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) if e.is_setup() => {
            error!("Relay setup failed: {}", e);
            ExitCode::FAILURE
        }
        Err(e) => {
            error!("Relay session failed: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Load configuration with priority: CLI args > config file / environment > defaults
fn load_config(args: &CliArgs) -> Result<Config> {
    let mut config = ConfigManager::load_from_file(&args.config)?;

    config.merge_with_cli_args(&args.overrides());

    config
        .validate()
        .context("Final configuration validation failed")?;

    Ok(config)
}

/// Initialize tracing/logging on stderr, keeping stdout for diagnostics
fn init_tracing(config: &Config) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .with_ansi(true),
        )
        .with(env_filter)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positional_ports() {
        let args = CliArgs::parse_from(["framerelay", "12340", "12344"]);
        let overrides = args.overrides();
        assert_eq!(overrides.listen_port, Some(12340));
        assert_eq!(overrides.target_port, Some(12344));
    }

    #[test]
    fn test_verbose_forces_debug() {
        let args = CliArgs::parse_from(["framerelay", "--verbose", "--log-level", "warn"]);
        assert_eq!(args.overrides().log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_flags() {
        let args = CliArgs::parse_from([
            "framerelay",
            "--no-hex-dump",
            "--stderr",
            "--target-host",
            "qemu.local",
            "--bind",
            "127.0.0.1",
        ]);
        let overrides = args.overrides();
        assert!(overrides.no_hex_dump);
        assert!(!overrides.no_decode);
        assert!(overrides.stderr);
        assert_eq!(overrides.target_host.as_deref(), Some("qemu.local"));
        assert_eq!(overrides.bind, Some("127.0.0.1".parse::<IpAddr>().unwrap()));
    }
}
