//! Single-connection event-loop driver.
//!
//! Owns a [`ConnectionManager`] with one connection bound to a connected
//! UDP socket, and converts the outside world into the engine's three
//! stimuli: datagram arrival (socket readable), input readiness (the
//! [`send`](StreamDriver::send)/[`finish`](StreamDriver::finish) methods),
//! and the periodic retransmission tick.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::{self, Interval, MissedTickBehavior};

use crate::core::{DEFAULT_TICK_INTERVAL, RivuletError};
use crate::engine::{Config, ConnectionId, ConnectionManager, Disposition, EngineError};

use super::channel::DatagramChannel;
use super::socket::DEFAULT_RECV_BUFFER_SIZE;

/// Driver tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverConfig {
    /// Per-connection engine configuration.
    pub connection: Config,

    /// Period of the retransmission sweep. Typically finer-grained than
    /// the retransmission timeout itself.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            connection: Config::default(),
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }
}

/// Event loop binding one connection to a UDP peer.
///
/// Delivered bytes survive teardown: whatever the peer sent is readable
/// via [`receive`](Self::receive) even after the connection itself has
/// been destroyed.
#[derive(Debug)]
pub struct StreamDriver {
    manager: ConnectionManager<DatagramChannel>,
    id: ConnectionId,
    socket: Arc<UdpSocket>,
    tick: Interval,
    recv_buffer: Vec<u8>,
    delivered: Vec<u8>,
    peer_finished: bool,
}

impl StreamDriver {
    /// Bind `local`, lock the socket to `peer`, and establish the
    /// connection.
    pub async fn connect(
        local: SocketAddr,
        peer: SocketAddr,
        config: DriverConfig,
    ) -> Result<Self, RivuletError> {
        let socket = UdpSocket::bind(local).await?;
        socket.connect(peer).await?;
        Ok(Self::from_socket(socket, config))
    }

    /// Establish the connection over an already-connected socket.
    pub fn from_socket(socket: UdpSocket, config: DriverConfig) -> Self {
        let socket = Arc::new(socket);

        let channel = DatagramChannel::new(Arc::clone(&socket));
        let mut manager = ConnectionManager::new();
        let id = manager.create(channel, config.connection);

        let mut tick = time::interval(config.tick_interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

        Self {
            manager,
            id,
            socket,
            tick,
            recv_buffer: vec![0u8; DEFAULT_RECV_BUFFER_SIZE],
            delivered: Vec::new(),
            peer_finished: false,
        }
    }

    /// Get the local address.
    pub fn local_addr(&self) -> Result<SocketAddr, RivuletError> {
        Ok(self.socket.local_addr()?)
    }

    /// Queue application bytes and run the input pump.
    pub fn send(&mut self, bytes: &[u8]) -> Result<(), RivuletError> {
        self.channel_mut()?.push_input(bytes);
        self.manager.on_input_ready(self.id)?;
        Ok(())
    }

    /// Declare the local outbound stream finished.
    pub fn finish(&mut self) -> Result<(), RivuletError> {
        self.channel_mut()?.close_input();
        self.manager.on_input_ready(self.id)?;
        Ok(())
    }

    /// Drain every byte the peer has delivered so far.
    pub fn receive(&mut self) -> Vec<u8> {
        let mut bytes = std::mem::take(&mut self.delivered);
        if let Some(connection) = self.manager.get_mut(self.id) {
            bytes.extend(connection.transport_mut().take_output());
        }
        bytes
    }

    /// Whether the peer has finished its direction of the stream.
    pub fn peer_finished(&self) -> bool {
        self.peer_finished
            || self
                .manager
                .get(self.id)
                .is_some_and(|c| c.transport().is_output_closed())
    }

    /// Whether the teardown handshake has completed.
    pub fn is_closed(&self) -> bool {
        !self.manager.contains(self.id)
    }

    /// Process one stimulus: the next datagram or timer tick.
    pub async fn drive_once(&mut self) -> Result<(), RivuletError> {
        tokio::select! {
            _ = self.tick.tick() => {
                self.manager.on_timer_tick();
            }
            received = self.socket.recv(&mut self.recv_buffer) => {
                let n = received?;
                let datagram = self.recv_buffer[..n].to_vec();
                if self.manager.contains(self.id) {
                    match self.manager.on_segment_received(self.id, &datagram)? {
                        Disposition::Closed(channel) => self.collect(channel),
                        Disposition::Open => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Drive until the teardown handshake completes.
    pub async fn run_until_closed(&mut self) -> Result<(), RivuletError> {
        while !self.is_closed() {
            self.drive_once().await?;
        }
        Ok(())
    }

    /// Salvage delivered bytes from a released transport binding.
    fn collect(&mut self, mut channel: DatagramChannel) {
        self.delivered.extend(channel.take_output());
        self.peer_finished = self.peer_finished || channel.is_output_closed();
    }

    fn channel_mut(&mut self) -> Result<&mut DatagramChannel, EngineError> {
        self.manager
            .get_mut(self.id)
            .map(|connection| connection.transport_mut())
            .ok_or(EngineError::UnknownConnection)
    }
}
