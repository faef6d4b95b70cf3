//! Shared test double for the collaborator boundary.
//!
//! Datagrams handed to [`MockTransport::send`] pile up in `sent` for the
//! test to inspect or carry to a peer; application input is served from
//! queued chunks; delivered output accumulates in `output`.

use std::collections::VecDeque;

use crate::core::{ReadInput, Transport};
use crate::wire::Segment;

#[derive(Debug)]
pub(crate) struct MockTransport {
    /// Datagrams handed to the channel, oldest first.
    pub sent: Vec<Vec<u8>>,
    /// Application input chunks, consumed front to back.
    pub input: VecDeque<Vec<u8>>,
    /// Whether the source reports end-of-stream once `input` drains.
    pub input_eof: bool,
    /// Bytes delivered to the application sink.
    pub output: Vec<u8>,
    /// Total sink capacity; the available space is whatever `output` has
    /// not yet consumed.
    pub capacity: usize,
    /// Whether end-of-stream was signaled to the sink.
    pub eof_signaled: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            input: VecDeque::new(),
            input_eof: false,
            output: Vec::new(),
            capacity: usize::MAX,
            eof_signaled: false,
        }
    }

    pub fn with_input(chunks: &[&[u8]], eof: bool) -> Self {
        let mut transport = Self::new();
        transport.input = chunks.iter().map(|c| c.to_vec()).collect();
        transport.input_eof = eof;
        transport
    }

    /// Every sent datagram, decoded. Panics on corrupt output; the engine
    /// must never emit an invalid segment.
    pub fn decoded_sent(&self) -> Vec<Segment> {
        self.sent
            .iter()
            .map(|raw| Segment::decode(raw).expect("engine emitted invalid segment"))
            .collect()
    }

    /// Ack numbers of every pure acknowledgment sent, in order.
    pub fn acks_sent(&self) -> Vec<u32> {
        self.decoded_sent()
            .iter()
            .filter(|s| s.is_ack())
            .map(Segment::ack_number)
            .collect()
    }

    /// Take all sent datagrams, e.g. to carry them to a peer.
    pub fn drain_sent(&mut self) -> Vec<Vec<u8>> {
        self.sent.drain(..).collect()
    }
}

impl Transport for MockTransport {
    fn send(&mut self, datagram: &[u8]) {
        self.sent.push(datagram.to_vec());
    }

    fn read_input(&mut self, buf: &mut [u8]) -> ReadInput {
        let Some(mut chunk) = self.input.pop_front() else {
            return if self.input_eof {
                ReadInput::Eof
            } else {
                ReadInput::Empty
            };
        };

        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            chunk.drain(..n);
            self.input.push_front(chunk);
        }
        ReadInput::Data(n)
    }

    fn output_space(&self) -> usize {
        self.capacity - self.output.len()
    }

    fn write_output(&mut self, bytes: &[u8]) {
        self.output.extend_from_slice(bytes);
    }

    fn output_eof(&mut self) {
        self.eof_signaled = true;
    }
}
