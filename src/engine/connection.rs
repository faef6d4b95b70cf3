//! Per-connection state and the retransmission sweep.
//!
//! A [`Connection`] holds both halves of one bidirectional stream: the
//! sender window (`snd_una..snd_next`), the receiver cursor (`rcv_next`),
//! the two pending-segment queues, and the teardown flags. It is created
//! and uniquely owned by the
//! [`ConnectionManager`](super::ConnectionManager); the sender and
//! receiver operations live in their own modules but mutate this state.

use std::time::{Duration, Instant};

use crate::core::{DEFAULT_RETRANSMIT_TIMEOUT, DEFAULT_WINDOW, FIRST_SEQUENCE, Transport};
use crate::wire::Segment;

use super::queue::SegmentQueue;

/// Per-connection tunables, supplied at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum outstanding (sent but unacknowledged) segments. Also bounds
    /// the receive window, so buffer growth is capped on both sides.
    pub window: u32,

    /// Age at which an unacknowledged segment is retransmitted.
    pub retransmit_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            retransmit_timeout: DEFAULT_RETRANSMIT_TIMEOUT,
        }
    }
}

/// A segment sent but not yet acknowledged.
#[derive(Debug, Clone)]
pub(crate) struct InFlight {
    /// The segment as transmitted. Encoding is deterministic, so a
    /// retransmission reproduces the exact original bytes.
    pub segment: Segment,
    /// Time of the most recent (re)transmission.
    pub sent_at: Instant,
}

/// State of one live connection.
///
/// The connection owns its [`Transport`] collaborator; the binding is
/// released when the connection is destroyed.
#[derive(Debug)]
pub struct Connection<T: Transport> {
    pub(crate) transport: T,
    pub(crate) config: Config,

    // Sender half.
    pub(crate) snd_una: u32,
    pub(crate) snd_next: u32,
    pub(crate) unacked: SegmentQueue<InFlight>,

    // Receiver half.
    pub(crate) rcv_next: u32,
    pub(crate) reorder: SegmentQueue<Segment>,

    // Teardown handshake.
    pub(crate) eof_sent: bool,
    pub(crate) eof_received: bool,
    pub(crate) eof_acked: bool,
    pub(crate) eof_seq: u32,
    pub(crate) flushing: bool,
}

impl<T: Transport> Connection<T> {
    /// Create a fresh connection around its transport binding.
    pub fn new(transport: T, config: Config) -> Self {
        Self {
            transport,
            config,
            snd_una: FIRST_SEQUENCE,
            snd_next: FIRST_SEQUENCE,
            unacked: SegmentQueue::new(),
            rcv_next: FIRST_SEQUENCE,
            reorder: SegmentQueue::new(),
            eof_sent: false,
            eof_received: false,
            eof_acked: false,
            eof_seq: 0,
            flushing: false,
        }
    }

    /// The configuration supplied at creation.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Lowest sequence number not yet acknowledged by the peer.
    pub fn snd_una(&self) -> u32 {
        self.snd_una
    }

    /// Next sequence number to assign.
    pub fn snd_next(&self) -> u32 {
        self.snd_next
    }

    /// Next sequence number expected from the peer.
    pub fn rcv_next(&self) -> u32 {
        self.rcv_next
    }

    /// Segments currently in flight.
    pub fn window_in_use(&self) -> u32 {
        self.snd_next - self.snd_una
    }

    /// Whether the local end-of-stream marker has been sent.
    pub fn eof_sent(&self) -> bool {
        self.eof_sent
    }

    /// Whether the peer's end-of-stream marker has been flushed.
    pub fn eof_received(&self) -> bool {
        self.eof_received
    }

    /// Whether the peer has acknowledged the local end-of-stream marker.
    pub fn eof_acked(&self) -> bool {
        self.eof_acked
    }

    /// Borrow the transport collaborator.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Mutably borrow the transport collaborator.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Consume the connection, releasing its transport binding.
    pub fn into_transport(self) -> T {
        self.transport
    }

    /// Teardown predicate: both directions have delivered and acknowledged
    /// end-of-stream, nothing is mid-flush, and no segment awaits an ack.
    ///
    /// If the peer never learns that its final ack arrived, its own
    /// retransmitted end-of-stream segment is the only recovery path; the
    /// stale-segment re-ack rule is what lets the slower side converge.
    pub fn is_finished(&self) -> bool {
        self.eof_sent
            && self.eof_received
            && self.eof_acked
            && !self.flushing
            && self.unacked.is_empty()
    }

    /// Retransmit every unacknowledged segment older than the configured
    /// timeout, restamping each one.
    ///
    /// Timeouts are per segment, not per connection: several losses inside
    /// one window are all repaired by a single sweep instead of waiting a
    /// round trip each.
    pub fn sweep(&mut self) {
        self.sweep_at(Instant::now());
    }

    /// [`sweep`](Self::sweep) against an explicit clock.
    pub fn sweep_at(&mut self, now: Instant) {
        let timeout = self.config.retransmit_timeout;
        for (_, entry) in self.unacked.iter_mut() {
            if now.duration_since(entry.sent_at) >= timeout {
                self.transport.send(&entry.segment.encode());
                entry.sent_at = now;
            }
        }
    }

    /// Send a fresh cumulative acknowledgment for `rcv_next`.
    pub(crate) fn emit_ack(&mut self) {
        let ack = Segment::ack(self.rcv_next);
        self.transport.send(&ack.encode());
    }
}
