//! # Query Server
//!
//! Answers status queries on one UDP socket.
//!
//! # Architecture
//!
//! `workers` tasks share the socket and each loops on:
//!
//! ```text
//! 1. recv_from
//! 2. parse the request (too short: warn, no reply)
//! 3. take the read lock, encode all three phases, release the lock
//! 4. send every frame to the requester, in order
//! ```
//!
//! No lock guard is alive across an `.await`: encoding happens inside a
//! closure passed to [`SharedState::read`], sending happens after it returns.
//!
//! # Failures
//!
//! A bad request or a failed send only affects that request. An encoder
//! defect is logged at `error` level and the request is dropped. Receive
//! errors are logged and the worker keeps going.
//!
//! # Example
//!
//! ```rust,no_run
//! use gsemu_game::SharedState;
//! use gsemu_network::{NetworkConfig, QueryServer};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> gsemu_core::Result<()> {
//!     let server = QueryServer::bind(NetworkConfig::default(), SharedState::default()).await?;
//!     server.run(CancellationToken::new()).await
//! }
//! ```

use crate::config::NetworkConfig;
use bytes::Bytes;
use gsemu_core::{GsEmuError, Result};
use gsemu_game::SharedState;
use gsemu_protocol::{Encoder, PhaseSelection, QueryRequest};
use socket2::{Domain, Protocol, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Receive buffer per worker; requests are a handful of bytes
const RECV_BUFFER_LEN: usize = 2048;

/// Pause after a receive error before trying again
const RECV_ERROR_BACKOFF: Duration = Duration::from_millis(10);

/// UDP status query server
///
/// Cheap to clone: every clone shares the socket and the state.
#[derive(Debug, Clone)]
pub struct QueryServer {
    socket: Arc<UdpSocket>,
    state: SharedState,
    config: NetworkConfig,
}

impl QueryServer {
    /// Validate `config` and bind the socket
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    /// - `Config` if the configuration is invalid
    /// - `Io` if the socket cannot be created or bound
    pub async fn bind(config: NetworkConfig, state: SharedState) -> Result<Self> {
        config
            .validate()
            .map_err(|e| GsEmuError::Config(format!("Invalid configuration: {}", e)))?;

        let socket = bind_socket(&config).map_err(|e| {
            GsEmuError::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to bind to {}: {}", config.bind_address, e),
            ))
        })?;
        let socket = UdpSocket::from_std(socket)?;

        tracing::info!("Query server listening on {}", socket.local_addr()?);
        tracing::info!(
            "Configuration: workers={}, datagram_size={}",
            config.workers,
            config.datagram_size
        );

        Ok(Self {
            socket: Arc::new(socket),
            state,
            config,
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Turn one request datagram into the reply datagrams
    ///
    /// The read lock is held only while encoding.
    ///
    /// # Errors
    /// - `Protocol` if the request is too short
    /// - `Encoder` if encoding hit an internal defect
    pub fn handle_datagram(&self, data: &[u8]) -> Result<Vec<Bytes>> {
        let request = QueryRequest::parse(data)?;
        let capacity = self.config.frame_capacity();

        let frames = self.state.read(|state| {
            Encoder::new(state, request.timestamp)
                .with_capacity(capacity)
                .encode(PhaseSelection::ALL)
        })?;
        Ok(frames)
    }

    /// Run the worker tasks until `cancel` fires
    ///
    /// Returns once every worker has stopped.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        tracing::info!("Query server starting {} workers", self.config.workers);

        let mut workers = JoinSet::new();
        for id in 0..self.config.workers {
            let server = self.clone();
            let cancel = cancel.clone();
            workers.spawn(async move { server.worker(id, cancel).await });
        }

        while let Some(result) = workers.join_next().await {
            if let Err(e) = result {
                tracing::error!("Query worker task failed: {}", e);
            }
        }

        tracing::info!("Query server stopped");
        Ok(())
    }

    async fn worker(&self, id: usize, cancel: CancellationToken) {
        tracing::debug!("Worker {} started", id);
        let mut buffer = [0u8; RECV_BUFFER_LEN];

        loop {
            let received = tokio::select! {
                _ = cancel.cancelled() => break,
                received = self.socket.recv_from(&mut buffer) => received,
            };

            match received {
                Ok((len, peer)) => self.serve(&buffer[..len], peer).await,
                Err(e) => {
                    tracing::error!("Worker {}: receive error: {}", id, e);
                    tokio::time::sleep(RECV_ERROR_BACKOFF).await;
                }
            }
        }

        tracing::debug!("Worker {} stopped", id);
    }

    /// Answer one datagram from `peer`
    async fn serve(&self, data: &[u8], peer: SocketAddr) {
        tracing::debug!("Received request from {}", peer);
        tracing::trace!("Request bytes: {:02X?}", data);

        let frames = match self.handle_datagram(data) {
            Ok(frames) => frames,
            Err(e) if e.is_internal() => {
                tracing::error!("Dropping request from {}: {}", peer, e);
                return;
            }
            Err(e) => {
                tracing::warn!("Dropping request from {}: {}", peer, e);
                return;
            }
        };

        for frame in &frames {
            tracing::trace!("Reply bytes: {:02X?}", &frame[..]);
            if let Err(e) = self.socket.send_to(frame, peer).await {
                tracing::warn!("Failed to send reply to {}: {}", peer, e);
                return;
            }
        }
        tracing::debug!("Sent {} frame(s) to {}", frames.len(), peer);
    }
}

/// Create the UDP socket with reuse and the configured receive buffer
fn bind_socket(config: &NetworkConfig) -> std::io::Result<std::net::UdpSocket> {
    let socket = Socket::new(
        Domain::for_address(config.bind_address),
        Type::DGRAM,
        Some(Protocol::UDP),
    )?;
    socket.set_reuse_address(true)?;
    if let Err(e) = socket.set_recv_buffer_size(config.recv_buffer_size) {
        tracing::warn!(
            "Could not set receive buffer to {} bytes: {}",
            config.recv_buffer_size,
            e
        );
    }
    socket.set_nonblocking(true)?;
    socket.bind(&config.bind_address.into())?;
    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gsemu_core::Timestamp;
    use gsemu_game::{GameState, Target};
    use gsemu_protocol::{Layout, QueryReply, ReplyFrame, FRAME_HEADER_LEN, LAST_FRAME_FLAG};

    const REQUEST: [u8; 11] = [0xFE, 0xFD, 0x00, 0xAA, 0xBB, 0xCC, 0xDD, 0xFF, 0xFF, 0xFF, 0x01];

    fn local_config() -> NetworkConfig {
        NetworkConfig {
            bind_address: "127.0.0.1:0".parse().unwrap(),
            workers: 2,
            ..Default::default()
        }
    }

    async fn receive_burst(client: &UdpSocket) -> Vec<ReplyFrame> {
        let mut frames = Vec::new();
        let mut buf = [0u8; 2048];
        loop {
            let len = tokio::time::timeout(Duration::from_secs(5), client.recv(&mut buf))
                .await
                .expect("reply timed out")
                .unwrap();
            let frame = ReplyFrame::parse(&buf[..len]).unwrap();
            let last = frame.last;
            frames.push(frame);
            if last {
                return frames;
            }
        }
    }

    #[tokio::test]
    async fn test_handle_datagram() {
        let server = QueryServer::bind(local_config(), SharedState::default())
            .await
            .unwrap();

        let frames = server.handle_datagram(&REQUEST).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(&frames[0][1..5], &[0xAA, 0xBB, 0xCC, 0xDD]);
        assert_eq!(frames[0][FRAME_HEADER_LEN - 1], LAST_FRAME_FLAG);
    }

    #[tokio::test]
    async fn test_short_request_rejected() {
        let server = QueryServer::bind(local_config(), SharedState::default())
            .await
            .unwrap();
        let err = server.handle_datagram(&REQUEST[..6]).unwrap_err();
        assert!(matches!(err, GsEmuError::Protocol(_)));
        assert!(!err.is_internal());
    }

    #[tokio::test]
    async fn test_small_datagrams_split_reply() {
        let config = NetworkConfig {
            datagram_size: 200,
            ..local_config()
        };
        let state = SharedState::default();
        let server = QueryServer::bind(config, state.clone()).await.unwrap();

        let frames = server.handle_datagram(&REQUEST).unwrap();
        assert!(frames.len() > 1);
        assert!(frames.iter().all(|frame| frame.len() <= 200));

        let parsed = frames
            .iter()
            .map(|frame| ReplyFrame::parse(frame).unwrap())
            .collect();
        let reply = QueryReply::assemble(parsed, Layout::of(&state.snapshot())).unwrap();
        assert_eq!(reply.header("gamename"), Some("battlefield2"));
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let config = NetworkConfig {
            workers: 0,
            ..local_config()
        };
        let err = QueryServer::bind(config, SharedState::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GsEmuError::Config(_)));
    }

    #[tokio::test]
    async fn test_udp_round_trip() {
        let state = SharedState::new(GameState::default());
        let server = QueryServer::bind(local_config(), state.clone())
            .await
            .unwrap();
        let addr = server.local_addr().unwrap();

        let cancel = CancellationToken::new();
        let task = {
            let server = server.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move { server.run(cancel).await })
        };

        let client = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        client.connect(addr).await.unwrap();

        // Too short: no reply at all
        client.send(&REQUEST[..6]).await.unwrap();
        let mut buf = [0u8; 64];
        let silent =
            tokio::time::timeout(Duration::from_millis(200), client.recv(&mut buf)).await;
        assert!(silent.is_err());

        // Edits made between queries show up in the next reply
        state
            .write(|state| state.set(Target::Player(4), "player_", "Foxtrot"))
            .unwrap();
        client.send(&REQUEST).await.unwrap();
        let frames = receive_burst(&client).await;
        assert!(frames
            .iter()
            .all(|frame| frame.timestamp == Timestamp::new([0xAA, 0xBB, 0xCC, 0xDD])));

        let reply = QueryReply::assemble(frames, Layout::of(&state.snapshot())).unwrap();
        assert_eq!(reply.header("hostname"), Some("A PR Server"));
        assert_eq!(reply.player_column("player_").unwrap()[4], "Foxtrot");
        assert_eq!(reply.team_column("team_t").unwrap().len(), 2);

        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
