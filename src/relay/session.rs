//! Relay Session
//!
//! One client/target pair relayed by a single readiness loop. Bytes are
//! forwarded before any diagnostics run, and diagnostics cannot fail the
//! session.

use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, error, info, trace};

use crate::diagnostics::DiagnosticReporter;
use crate::error::{RelayError, RelayResult};
use crate::protocol::{Chunk, Direction};

/// Why a session stopped relaying
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// Zero-length read on the client socket
    ClientClosed,
    /// Zero-length read on the target socket
    TargetClosed,
    /// Operator interrupt
    Interrupted,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionEnd::ClientClosed => write!(f, "client closed the connection"),
            SessionEnd::TargetClosed => write!(f, "target closed the connection"),
            SessionEnd::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// Statistics for a finished session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStats {
    pub session_id: String,
    pub client_addr: SocketAddr,
    pub target_addr: SocketAddr,
    pub duration_ms: u64,
    pub bytes_up: u64,
    pub bytes_down: u64,
    pub chunks_up: u64,
    pub chunks_down: u64,
    pub frames: u64,
}

impl SessionStats {
    pub fn total_bytes(&self) -> u64 {
        self.bytes_up + self.bytes_down
    }
}

/// Represents the relay session between the accepted client and the target
#[derive(Debug)]
pub struct RelaySession {
    pub session_id: String,
    pub client_addr: SocketAddr,
    pub target_addr: SocketAddr,
    start_time: Instant,
    buffer_size: usize,
    poll_interval: Duration,
    bytes_up: u64,
    bytes_down: u64,
    chunks_up: u64,
    chunks_down: u64,
    frames: u64,
}

impl RelaySession {
    /// Create a new relay session; its clock starts now
    pub fn new(
        session_id: String,
        client_addr: SocketAddr,
        target_addr: SocketAddr,
        buffer_size: usize,
        poll_interval: Duration,
    ) -> Self {
        debug!("Creating relay session: {} ({} -> {})", session_id, client_addr, target_addr);

        Self {
            session_id,
            client_addr,
            target_addr,
            start_time: Instant::now(),
            buffer_size,
            poll_interval,
            bytes_up: 0,
            bytes_down: 0,
            chunks_up: 0,
            chunks_down: 0,
            frames: 0,
        }
    }

    /// Get session duration
    pub fn duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Relay until either side closes, a transport error occurs, or an
    /// interrupt arrives on `shutdown`. Both streams are closed on return.
    pub async fn run<C, T>(
        &mut self,
        mut client: C,
        mut target: T,
        reporter: &mut DiagnosticReporter,
        shutdown: &mut broadcast::Receiver<()>,
    ) -> RelayResult<SessionEnd>
    where
        C: AsyncRead + AsyncWrite + Unpin,
        T: AsyncRead + AsyncWrite + Unpin,
    {
        info!("Starting relay session {} ({} <-> {})", self.session_id, self.client_addr, self.target_addr);

        let mut client_buf = vec![0u8; self.buffer_size];
        let mut target_buf = vec![0u8; self.buffer_size];
        let mut idle = time::interval_at(time::Instant::now() + self.poll_interval, self.poll_interval);
        idle.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut interrupt_armed = true;

        let outcome = loop {
            tokio::select! {
                signal = shutdown.recv(), if interrupt_armed => {
                    match signal {
                        Ok(()) | Err(RecvError::Lagged(_)) => break Ok(SessionEnd::Interrupted),
                        Err(RecvError::Closed) => {
                            debug!("Interrupt channel closed, relaying without it");
                            interrupt_armed = false;
                        }
                    }
                }
                read = client.read(&mut client_buf) => {
                    match self.relay_chunk(Direction::ClientToTarget, read, &client_buf, &mut target, reporter).await {
                        Ok(None) => {}
                        Ok(Some(end)) => break Ok(end),
                        Err(e) => break Err(e),
                    }
                }
                read = target.read(&mut target_buf) => {
                    match self.relay_chunk(Direction::TargetToClient, read, &target_buf, &mut client, reporter).await {
                        Ok(None) => {}
                        Ok(Some(end)) => break Ok(end),
                        Err(e) => break Err(e),
                    }
                }
                _ = idle.tick() => {
                    trace!("Session {} idle at {:?}", self.session_id, self.duration());
                }
            }
        };

        let elapsed = self.duration().as_secs_f64();
        match &outcome {
            Ok(SessionEnd::Interrupted) => {
                reporter.notice(&format!("[t={:.1}s] Relay stopped", elapsed));
            }
            Ok(end) => {
                info!("Session {} ended: {}", self.session_id, end);
                reporter.notice(&format!("[t={:.1}s] Connection closed ({})", elapsed, end));
            }
            Err(e) => {
                error!("Session {} failed: {}", self.session_id, e);
                reporter.notice(&format!("[t={:.1}s] Connection error: {}", elapsed, e));
            }
        }

        close_stream(&mut client, "client").await;
        close_stream(&mut target, "target").await;
        drop(client);
        drop(target);

        self.log_stats();
        outcome
    }

    /// Forward one read result to `peer`, then hand the chunk to the reporter.
    /// Returns the session end on a zero-length read.
    async fn relay_chunk<W>(
        &mut self,
        direction: Direction,
        read: io::Result<usize>,
        buf: &[u8],
        peer: &mut W,
        reporter: &mut DiagnosticReporter,
    ) -> RelayResult<Option<SessionEnd>>
    where
        W: AsyncWrite + Unpin,
    {
        let n = read.map_err(|source| RelayError::Transport { direction, source })?;
        if n == 0 {
            let end = match direction {
                Direction::ClientToTarget => SessionEnd::ClientClosed,
                Direction::TargetToClient => SessionEnd::TargetClosed,
            };
            return Ok(Some(end));
        }

        let chunk = Chunk::new(direction, self.duration(), Bytes::copy_from_slice(&buf[..n]));

        // write_all keeps writing until the peer has accepted every byte
        peer.write_all(chunk.data())
            .await
            .map_err(|source| RelayError::Transport { direction: direction.reverse(), source })?;
        peer.flush()
            .await
            .map_err(|source| RelayError::Transport { direction: direction.reverse(), source })?;

        match direction {
            Direction::ClientToTarget => {
                self.bytes_up += n as u64;
                self.chunks_up += 1;
            }
            Direction::TargetToClient => {
                self.bytes_down += n as u64;
                self.chunks_down += 1;
            }
        }

        self.frames += reporter.report(&chunk) as u64;
        Ok(None)
    }

    /// Generate session statistics
    pub fn to_stats(&self) -> SessionStats {
        SessionStats {
            session_id: self.session_id.clone(),
            client_addr: self.client_addr,
            target_addr: self.target_addr,
            duration_ms: self.duration().as_millis() as u64,
            bytes_up: self.bytes_up,
            bytes_down: self.bytes_down,
            chunks_up: self.chunks_up,
            chunks_down: self.chunks_down,
            frames: self.frames,
        }
    }

    /// Log session statistics
    pub fn log_stats(&self) {
        let stats = self.to_stats();

        info!(
            session_id = %stats.session_id,
            client_addr = %stats.client_addr,
            target_addr = %stats.target_addr,
            duration_ms = stats.duration_ms,
            bytes_up = stats.bytes_up,
            bytes_down = stats.bytes_down,
            chunks_up = stats.chunks_up,
            chunks_down = stats.chunks_down,
            frames = stats.frames,
            "Relay session completed"
        );
    }
}

async fn close_stream<S>(stream: &mut S, side: &str)
where
    S: AsyncWrite + Unpin,
{
    if let Err(e) = stream.shutdown().await {
        debug!("Closing {} stream: {}", side, e);
    }
}
