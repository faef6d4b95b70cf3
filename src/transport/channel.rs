//! Datagram channel: the production [`Transport`] implementation.
//!
//! Bridges three things into the engine's collaborator boundary: a
//! connected UDP socket for the peer-facing side, an in-memory queue of
//! application bytes waiting to be sent, and a bounded buffer of delivered
//! bytes waiting for the application to collect.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::net::UdpSocket;

use crate::core::{ReadInput, Transport};

/// Default capacity of the delivered-bytes buffer.
///
/// Once full, the engine stops accepting segments from the peer, which
/// surfaces to the sender as backpressure through withheld acks.
pub const DEFAULT_OUTPUT_CAPACITY: usize = 64 * 1024;

/// [`Transport`] implementation over a connected UDP socket with in-memory
/// application byte queues.
#[derive(Debug)]
pub struct DatagramChannel {
    socket: Arc<UdpSocket>,
    input: VecDeque<u8>,
    input_closed: bool,
    output: VecDeque<u8>,
    output_capacity: usize,
    output_closed: bool,
}

impl DatagramChannel {
    /// Create a channel over a connected socket with the default output
    /// capacity.
    pub fn new(socket: Arc<UdpSocket>) -> Self {
        Self::with_output_capacity(socket, DEFAULT_OUTPUT_CAPACITY)
    }

    /// Create a channel with an explicit output capacity.
    pub fn with_output_capacity(socket: Arc<UdpSocket>, capacity: usize) -> Self {
        Self {
            socket,
            input: VecDeque::new(),
            input_closed: false,
            output: VecDeque::new(),
            output_capacity: capacity,
            output_closed: false,
        }
    }

    /// Queue application bytes for transmission.
    ///
    /// Ignored after [`close_input`](Self::close_input).
    pub fn push_input(&mut self, bytes: &[u8]) {
        if !self.input_closed {
            self.input.extend(bytes);
        }
    }

    /// Declare the application's outbound stream finished. Queued bytes
    /// still drain first; the end-of-stream marker follows them.
    pub fn close_input(&mut self) {
        self.input_closed = true;
    }

    /// Bytes queued but not yet pulled by the engine.
    pub fn pending_input(&self) -> usize {
        self.input.len()
    }

    /// Take every delivered byte collected so far.
    pub fn take_output(&mut self) -> Vec<u8> {
        self.output.drain(..).collect()
    }

    /// Whether the peer has finished its direction of the stream.
    pub fn is_output_closed(&self) -> bool {
        self.output_closed
    }
}

impl Transport for DatagramChannel {
    fn send(&mut self, datagram: &[u8]) {
        // Best-effort by contract: a full socket buffer or transient error
        // counts as datagram loss and is repaired by the retransmission
        // sweep.
        let _ = self.socket.try_send(datagram);
    }

    fn read_input(&mut self, buf: &mut [u8]) -> ReadInput {
        if self.input.is_empty() {
            return if self.input_closed {
                ReadInput::Eof
            } else {
                ReadInput::Empty
            };
        }

        let n = buf.len().min(self.input.len());
        for (slot, byte) in buf[..n].iter_mut().zip(self.input.drain(..n)) {
            *slot = byte;
        }
        ReadInput::Data(n)
    }

    fn output_space(&self) -> usize {
        self.output_capacity - self.output.len()
    }

    fn write_output(&mut self, bytes: &[u8]) {
        self.output.extend(bytes);
    }

    fn output_eof(&mut self) {
        self.output_closed = true;
    }
}
