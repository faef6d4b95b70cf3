//! Collaborator traits for the RIVULET protocol engine.
//!
//! The engine never touches a socket or an application buffer directly; it
//! drives everything through [`Transport`], the single boundary to the
//! outside world. One implementation is bound per connection.

/// Outcome of pulling bytes from the application source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadInput {
    /// `n > 0` bytes were copied into the caller's buffer.
    Data(usize),
    /// No bytes available right now; try again on the next readiness signal.
    Empty,
    /// The source is exhausted and will never produce bytes again.
    Eof,
}

/// The outside world as seen from one connection.
///
/// Covers both sides of the engine: the datagram channel toward the peer
/// and the byte source/sink toward the application.
///
/// # Requirements
///
/// - `send` is best-effort: the channel may lose, duplicate, reorder, or
///   corrupt datagrams, and `send` must never block or fail loudly.
/// - `read_input` returning [`ReadInput::Empty`] or `output_space` returning
///   less than a payload's size are backpressure signals, not errors; the
///   engine retries on a later stimulus.
/// - `write_output` is only invoked with at most `output_space()` bytes.
pub trait Transport {
    /// Hand one encoded segment to the datagram channel, best-effort.
    fn send(&mut self, datagram: &[u8]);

    /// Pull up to `buf.len()` bytes from the application source.
    fn read_input(&mut self, buf: &mut [u8]) -> ReadInput;

    /// Bytes the application sink can currently accept.
    fn output_space(&self) -> usize;

    /// Deliver in-order payload bytes to the application sink.
    fn write_output(&mut self, bytes: &[u8]);

    /// Signal end-of-stream to the application sink.
    fn output_eof(&mut self);
}
