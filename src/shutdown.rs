//! Interrupt Handling
//!
//! Turns SIGINT/SIGTERM (or Ctrl+C on Windows) into a broadcast the relay
//! loop selects on, so both sockets and the listener are closed before exit.

use tokio::signal;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::Result;

/// Broadcasts an operator interrupt to the relay
pub struct ShutdownCoordinator {
    shutdown_tx: broadcast::Sender<()>,
}

impl ShutdownCoordinator {
    /// Create a new shutdown coordinator
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(1);
        Self { shutdown_tx }
    }

    /// Get a receiver that fires once an interrupt is observed.
    ///
    /// Subscribe before the interrupt can happen; earlier broadcasts are not replayed.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Broadcast the interrupt without waiting for a signal
    pub fn trigger(&self) {
        if self.shutdown_tx.send(()).is_err() {
            debug!("Interrupt raised with no active subscribers");
        }
    }

    /// Wait for SIGTERM/SIGINT, then broadcast the interrupt
    pub async fn listen_for_signals(&self) -> Result<()> {
        debug!("Starting interrupt signal listener");

        #[cfg(unix)]
        {
            let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
            let mut sigint = signal::unix::signal(signal::unix::SignalKind::interrupt())?;

            tokio::select! {
                _ = sigterm.recv() => {
                    info!("Received SIGTERM, stopping relay");
                }
                _ = sigint.recv() => {
                    info!("Received SIGINT, stopping relay");
                }
            }
        }

        #[cfg(windows)]
        {
            signal::ctrl_c().await?;
            info!("Received Ctrl+C, stopping relay");
        }

        self.trigger();
        Ok(())
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}
