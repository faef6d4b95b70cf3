//! Connection lifecycle manager.
//!
//! Owns the registry of live connections and exposes the three protocol
//! entry points: datagram received, input ready, timer tick. Destruction
//! is automatic: after any entry point that can satisfy the teardown
//! predicate, the connection is unlinked and its transport binding is
//! released to the caller via [`Disposition::Closed`]. A destroyed
//! [`ConnectionId`] is invalid from that moment on; further operations
//! report [`EngineError::UnknownConnection`].

use std::collections::HashMap;
use std::fmt;
use std::time::Instant;

use thiserror::Error;

use crate::core::Transport;
use crate::wire::{Segment, SegmentKind};

use super::connection::{Config, Connection};

/// Opaque handle identifying one live connection in a
/// [`ConnectionManager`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Errors from the connection lifecycle manager.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    /// Operation on a connection that was never created or has already
    /// been destroyed.
    #[error("unknown or destroyed connection")]
    UnknownConnection,
}

/// Outcome of one entry point.
#[derive(Debug)]
pub enum Disposition<T> {
    /// The connection is still registered.
    Open,
    /// The teardown handshake completed: the connection was destroyed and
    /// its transport binding is released to the caller.
    Closed(T),
}

impl<T> Disposition<T> {
    /// Check if the connection is still registered.
    pub fn is_open(&self) -> bool {
        matches!(self, Disposition::Open)
    }
}

/// Registry and dispatcher for live connections.
///
/// The registry is an owned map; iteration order is irrelevant, it exists
/// only so the retransmission sweep and an external shutdown path can
/// reach every active connection.
#[derive(Debug)]
pub struct ConnectionManager<T: Transport> {
    connections: HashMap<ConnectionId, Connection<T>>,
    next_id: u64,
}

impl<T: Transport> ConnectionManager<T> {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 0,
        }
    }

    /// Number of live connections.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Check if no connections are live.
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Check if a connection is still registered.
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Handles of every live connection, in no particular order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    /// Borrow a live connection.
    pub fn get(&self, id: ConnectionId) -> Option<&Connection<T>> {
        self.connections.get(&id)
    }

    /// Mutably borrow a live connection.
    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection<T>> {
        self.connections.get_mut(&id)
    }

    /// Establish a new connection around its transport binding.
    pub fn create(&mut self, transport: T, config: Config) -> ConnectionId {
        let id = ConnectionId(self.next_id);
        self.next_id += 1;
        self.connections.insert(id, Connection::new(transport, config));
        id
    }

    /// Entry point: one raw datagram arrived for this connection.
    ///
    /// A datagram that fails validation is dropped silently: corruption is
    /// indistinguishable from loss and heals the same way, through the
    /// peer's retransmission timeout.
    pub fn on_segment_received(
        &mut self,
        id: ConnectionId,
        datagram: &[u8],
    ) -> Result<Disposition<T>, EngineError> {
        self.on_segment_received_at(id, datagram, Instant::now())
    }

    /// [`on_segment_received`](Self::on_segment_received) against an
    /// explicit clock.
    pub fn on_segment_received_at(
        &mut self,
        id: ConnectionId,
        datagram: &[u8],
        now: Instant,
    ) -> Result<Disposition<T>, EngineError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(EngineError::UnknownConnection)?;

        if let Ok(segment) = Segment::decode(datagram) {
            match segment.kind() {
                SegmentKind::Ack => connection.on_ack_at(segment.ack_number(), now),
                SegmentKind::Data | SegmentKind::Eof => connection.on_data(segment),
            }
        }

        Ok(self.reap(id))
    }

    /// Entry point: the application may have bytes ready to send.
    pub fn on_input_ready(&mut self, id: ConnectionId) -> Result<Disposition<T>, EngineError> {
        self.on_input_ready_at(id, Instant::now())
    }

    /// [`on_input_ready`](Self::on_input_ready) against an explicit clock.
    pub fn on_input_ready_at(
        &mut self,
        id: ConnectionId,
        now: Instant,
    ) -> Result<Disposition<T>, EngineError> {
        let connection = self
            .connections
            .get_mut(&id)
            .ok_or(EngineError::UnknownConnection)?;

        connection.on_input_ready_at(now);
        Ok(self.reap(id))
    }

    /// Entry point: periodic timer tick. Runs the retransmission sweep
    /// over every live connection.
    pub fn on_timer_tick(&mut self) {
        self.on_timer_tick_at(Instant::now());
    }

    /// [`on_timer_tick`](Self::on_timer_tick) against an explicit clock.
    pub fn on_timer_tick_at(&mut self, now: Instant) {
        for connection in self.connections.values_mut() {
            connection.sweep_at(now);
        }
    }

    /// Tear down every connection regardless of protocol state, releasing
    /// the transport bindings. External shutdown path only; an orderly
    /// close goes through the end-of-stream handshake instead.
    pub fn shutdown(&mut self) -> Vec<T> {
        self.connections
            .drain()
            .map(|(_, connection)| connection.into_transport())
            .collect()
    }

    /// Destroy the connection if its teardown predicate holds.
    fn reap(&mut self, id: ConnectionId) -> Disposition<T> {
        let finished = self
            .connections
            .get(&id)
            .is_some_and(Connection::is_finished);
        if finished {
            if let Some(connection) = self.connections.remove(&id) {
                return Disposition::Closed(connection.into_transport());
            }
        }
        Disposition::Open
    }
}

impl<T: Transport> Default for ConnectionManager<T> {
    fn default() -> Self {
        Self::new()
    }
}
