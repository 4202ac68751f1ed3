//! Relay Engine

use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::net::{lookup_host, TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use super::session::{RelaySession, SessionEnd, SessionStats};
use crate::config::RelayConfig;
use crate::diagnostics::DiagnosticReporter;
use crate::error::{RelayError, RelayResult};

/// Result of a relay run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayOutcome {
    pub end: SessionEnd,
    /// `None` when interrupted before a client connected
    pub stats: Option<SessionStats>,
}

/// Accepts one client, connects it to the target and relays between them
pub struct RelayEngine {
    config: RelayConfig,
}

impl RelayEngine {
    /// Create a new relay engine
    pub fn new(config: RelayConfig) -> Self {
        Self { config }
    }

    /// Bind the listening socket
    pub async fn bind(&self) -> RelayResult<TcpListener> {
        let addr = self.config.listen_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| RelayError::Bind { addr, source })?;

        let local = listener.local_addr().unwrap_or(addr);
        info!("Relay listening on {} -> {}", local, self.config.target_endpoint());
        Ok(listener)
    }

    /// Bind, then serve exactly one session
    pub async fn run(
        &self,
        reporter: &mut DiagnosticReporter,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> RelayResult<RelayOutcome> {
        let listener = self.bind().await?;
        self.serve(listener, reporter, shutdown).await
    }

    /// Accept one client on `listener` and relay it to the target.
    ///
    /// The listener stays open, unserviced, until the session ends.
    pub async fn serve(
        &self,
        listener: TcpListener,
        reporter: &mut DiagnosticReporter,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> RelayResult<RelayOutcome> {
        let (client, client_addr) = match self.accept_client(&listener, shutdown).await? {
            Some(accepted) => accepted,
            None => {
                info!("Interrupted while waiting for a client");
                reporter.notice("Relay stopped");
                return Ok(RelayOutcome { end: SessionEnd::Interrupted, stats: None });
            }
        };
        reporter.notice(&format!("Client connected from {}", client_addr));

        let (target, target_addr) = self.connect_to_target().await?;
        reporter.notice(&format!("Connected to target {}", target_addr));

        self.configure_stream(&client, "client");
        self.configure_stream(&target, "target");

        let mut session = RelaySession::new(
            session_id(client_addr),
            client_addr,
            target_addr,
            self.config.buffer_size,
            self.config.poll_interval,
        );

        let result = session.run(client, target, reporter, shutdown).await;
        drop(listener);
        debug!("Released listening socket");

        let end = result?;
        Ok(RelayOutcome { end, stats: Some(session.to_stats()) })
    }

    /// Wait for the single client, or `None` if interrupted first
    async fn accept_client(
        &self,
        listener: &TcpListener,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> RelayResult<Option<(TcpStream, SocketAddr)>> {
        tokio::select! {
            accepted = listener.accept() => {
                let (stream, addr) = accepted.map_err(RelayError::Accept)?;
                debug!("Accepted client {}", addr);
                Ok(Some((stream, addr)))
            }
            signal = shutdown.recv() => {
                match signal {
                    Err(broadcast::error::RecvError::Closed) => {
                        // Nobody can interrupt any more; only the accept is left
                        let (stream, addr) = listener.accept().await.map_err(RelayError::Accept)?;
                        debug!("Accepted client {}", addr);
                        Ok(Some((stream, addr)))
                    }
                    _ => Ok(None),
                }
            }
        }
    }

    /// Establish connection to the target, trying each resolved address
    pub async fn connect_to_target(&self) -> RelayResult<(TcpStream, SocketAddr)> {
        let endpoint = self.config.target_endpoint();
        debug!("Attempting to connect to target: {}", endpoint);

        let addrs = self.resolve_target().await?;

        let mut last_error = None;
        for addr in addrs {
            match timeout(self.config.connect_timeout, TcpStream::connect(addr)).await {
                Ok(Ok(stream)) => {
                    info!("Connected to target {}", addr);
                    return Ok((stream, addr));
                }
                Ok(Err(e)) => {
                    warn!("Failed to connect to {}: {}", addr, e);
                    last_error = Some(e.to_string());
                }
                Err(_) => {
                    warn!("Connection to {} timed out after {:?}", addr, self.config.connect_timeout);
                    last_error = Some("connection timed out".to_string());
                }
            }
        }

        Err(RelayError::Connect {
            target: endpoint,
            reason: last_error.unwrap_or_else(|| "no addresses resolved".to_string()),
        })
    }

    async fn resolve_target(&self) -> RelayResult<Vec<SocketAddr>> {
        let endpoint = self.config.target_endpoint();
        let host_port = (self.config.target_host.as_str(), self.config.target_port);

        match timeout(self.config.connect_timeout, lookup_host(host_port)).await {
            Ok(Ok(addrs)) => {
                let resolved: Vec<SocketAddr> = addrs.collect();
                if resolved.is_empty() {
                    return Err(RelayError::Resolve {
                        target: endpoint,
                        reason: "no addresses returned".to_string(),
                    });
                }
                debug!("Resolved {} to {} addresses", endpoint, resolved.len());
                Ok(resolved)
            }
            Ok(Err(e)) => Err(RelayError::Resolve { target: endpoint, reason: e.to_string() }),
            Err(_) => Err(RelayError::Resolve {
                target: endpoint,
                reason: "resolution timed out".to_string(),
            }),
        }
    }

    fn configure_stream(&self, stream: &TcpStream, side: &str) {
        if self.config.nodelay {
            if let Err(e) = stream.set_nodelay(true) {
                warn!("Failed to set TCP_NODELAY on {} socket: {}", side, e);
            }
        }
    }
}

fn session_id(client_addr: SocketAddr) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("relay_{}_{}", timestamp, client_addr.port())
}
