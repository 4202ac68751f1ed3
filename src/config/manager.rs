//! Configuration Manager

use super::{Config, DiagnosticsOutput};
use crate::Result;
use anyhow::{Context, bail};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

const MIN_BUFFER_SIZE: usize = 16;
const MAX_BUFFER_SIZE: usize = 1024 * 1024;
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(10);
const MAX_POLL_INTERVAL: Duration = Duration::from_secs(60);
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Overrides collected from the command line
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub listen_port: Option<u16>,
    pub target_port: Option<u16>,
    pub bind: Option<IpAddr>,
    pub target_host: Option<String>,
    pub buffer_size: Option<usize>,
    pub connect_timeout: Option<u64>,
    pub no_hex_dump: bool,
    pub no_decode: bool,
    pub stderr: bool,
    pub log_level: Option<String>,
}

/// Manages configuration loading and validation
pub struct ConfigManager;

impl ConfigManager {
    /// Load configuration from file
    pub fn load_from_file(path: &Path) -> Result<Config> {
        if path.exists() {
            tracing::info!("Loading configuration from: {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;

            let config = Self::load_from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

            config.validate()
                .with_context(|| "Configuration validation failed")?;

            tracing::info!("Configuration loaded and validated successfully");
            Ok(config)
        } else {
            tracing::debug!("Configuration file not found at {}, using environment and defaults", path.display());
            Self::load_from_env()
        }
    }

    /// Parse configuration from TOML text; missing keys keep their defaults
    pub fn load_from_str(content: &str) -> Result<Config> {
        let config: Config = toml::from_str(content)
            .context("Invalid configuration TOML")?;
        Ok(config)
    }

    /// Load configuration from environment variables
    pub fn load_from_env() -> Result<Config> {
        Self::load_with_lookup(|key| std::env::var(key).ok())
    }

    /// Apply `FRAMERELAY_*` variables resolved through `lookup` over the defaults
    pub fn load_with_lookup<F>(lookup: F) -> Result<Config>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(listen_addr) = lookup("FRAMERELAY_LISTEN_ADDR") {
            config.relay.listen_addr = listen_addr.parse::<SocketAddr>()
                .with_context(|| format!("Invalid FRAMERELAY_LISTEN_ADDR: {}", listen_addr))?;
        }

        if let Some(target_host) = lookup("FRAMERELAY_TARGET_HOST") {
            config.relay.target_host = target_host;
        }

        if let Some(target_port) = lookup("FRAMERELAY_TARGET_PORT") {
            config.relay.target_port = target_port.parse::<u16>()
                .with_context(|| format!("Invalid FRAMERELAY_TARGET_PORT: {}", target_port))?;
        }

        if let Some(buffer_size) = lookup("FRAMERELAY_BUFFER_SIZE") {
            config.relay.buffer_size = buffer_size.parse::<usize>()
                .with_context(|| format!("Invalid FRAMERELAY_BUFFER_SIZE: {}", buffer_size))?;
        }

        if let Some(timeout) = lookup("FRAMERELAY_CONNECT_TIMEOUT") {
            config.relay.connect_timeout = humantime::parse_duration(&timeout)
                .with_context(|| format!("Invalid FRAMERELAY_CONNECT_TIMEOUT: {}", timeout))?;
        }

        if let Some(log_level) = lookup("FRAMERELAY_LOG_LEVEL") {
            config.logging.level = log_level;
        }

        Ok(config)
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.validate_relay_config()
            .with_context(|| "Relay configuration validation failed")?;

        self.validate_diagnostics_config()
            .with_context(|| "Diagnostics configuration validation failed")?;

        self.validate_logging_config()
            .with_context(|| "Logging configuration validation failed")?;

        Ok(())
    }

    fn validate_relay_config(&self) -> Result<()> {
        let relay = &self.relay;

        if relay.target_host.trim().is_empty() {
            bail!("target_host must not be empty");
        }

        if relay.target_port == 0 {
            bail!("target_port must be greater than 0");
        }

        if relay.buffer_size < MIN_BUFFER_SIZE {
            bail!("buffer_size must be at least {} bytes", MIN_BUFFER_SIZE);
        }

        if relay.buffer_size > MAX_BUFFER_SIZE {
            bail!("buffer_size cannot exceed 1MB");
        }

        if relay.poll_interval < MIN_POLL_INTERVAL || relay.poll_interval > MAX_POLL_INTERVAL {
            bail!("poll_interval must be between 10ms and 60s");
        }

        if relay.connect_timeout.is_zero() {
            bail!("connect_timeout must be greater than 0");
        }

        Ok(())
    }

    fn validate_diagnostics_config(&self) -> Result<()> {
        if self.diagnostics.client_name.is_empty() || self.diagnostics.target_name.is_empty() {
            bail!("client_name and target_name must not be empty");
        }

        Ok(())
    }

    fn validate_logging_config(&self) -> Result<()> {
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            bail!("logging.level must be one of: {}", VALID_LOG_LEVELS.join(", "));
        }

        Ok(())
    }

    /// Merge with CLI arguments
    pub fn merge_with_cli_args(&mut self, cli: &CliOverrides) {
        if let Some(ip) = cli.bind {
            self.relay.listen_addr.set_ip(ip);
            tracing::info!("CLI override: listen address set to {}", self.relay.listen_addr);
        }

        if let Some(port) = cli.listen_port {
            self.relay.listen_addr.set_port(port);
            tracing::info!("CLI override: listen port set to {}", port);
        }

        if let Some(host) = &cli.target_host {
            self.relay.target_host = host.clone();
            tracing::info!("CLI override: target host set to {}", host);
        }

        if let Some(port) = cli.target_port {
            self.relay.target_port = port;
            tracing::info!("CLI override: target port set to {}", port);
        }

        if let Some(buffer_size) = cli.buffer_size {
            self.relay.buffer_size = buffer_size;
            tracing::info!("CLI override: buffer size set to {} bytes", buffer_size);
        }

        if let Some(timeout_secs) = cli.connect_timeout {
            self.relay.connect_timeout = Duration::from_secs(timeout_secs);
            tracing::info!("CLI override: connect timeout set to {}s", timeout_secs);
        }

        if cli.no_hex_dump {
            self.diagnostics.hex_dump = false;
        }

        if cli.no_decode {
            self.diagnostics.decode_frames = false;
        }

        if cli.stderr {
            self.diagnostics.output = DiagnosticsOutput::Stderr;
        }

        if let Some(level) = &cli.log_level {
            self.logging.level = level.clone();
        }
    }
}
