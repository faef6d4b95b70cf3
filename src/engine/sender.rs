//! Sender engine: the window-bounded input pump and cumulative-ack
//! retirement.

use std::time::Instant;

use crate::core::{MAX_PAYLOAD, ReadInput, Transport};
use crate::wire::Segment;

use super::connection::{Connection, InFlight};

impl<T: Transport> Connection<T> {
    /// Pull application bytes and transmit them as data segments while the
    /// window has room.
    ///
    /// Invoked when the application signals input readiness, and internally
    /// whenever an acknowledgment frees window space. The loop ends when
    /// the window fills, the source has nothing right now, or end-of-stream
    /// has been sent; none of these is an error, the pump simply resumes on
    /// the next stimulus.
    pub fn on_input_ready(&mut self) {
        self.on_input_ready_at(Instant::now());
    }

    /// [`on_input_ready`](Self::on_input_ready) against an explicit clock.
    pub fn on_input_ready_at(&mut self, now: Instant) {
        while self.window_in_use() < self.config.window && !self.eof_sent {
            let mut buf = [0u8; MAX_PAYLOAD];
            let segment = match self.transport.read_input(&mut buf) {
                ReadInput::Empty => return,
                ReadInput::Eof => {
                    self.eof_sent = true;
                    self.eof_seq = self.snd_next;
                    Segment::eof(self.snd_next, self.rcv_next)
                }
                ReadInput::Data(n) => {
                    debug_assert!(n > 0 && n <= MAX_PAYLOAD);
                    Segment::data(self.snd_next, self.rcv_next, buf[..n].to_vec())
                }
            };

            let raw = segment.encode();
            self.unacked
                .insert_if_absent(self.snd_next, InFlight { segment, sent_at: now });
            self.transport.send(&raw);
            self.snd_next += 1;
        }
    }

    /// Process a cumulative acknowledgment: retire every covered segment,
    /// advance `snd_una`, and re-run the input pump with the freed window.
    ///
    /// Re-delivery of the same acknowledgment is a no-op.
    pub fn on_ack(&mut self, ack_number: u32) {
        self.on_ack_at(ack_number, Instant::now());
    }

    /// [`on_ack`](Self::on_ack) against an explicit clock.
    pub fn on_ack_at(&mut self, ack_number: u32, now: Instant) {
        // An ack covering segments never sent carries no information; drop
        // it rather than corrupt the window accounting.
        if ack_number > self.snd_next {
            return;
        }

        while let Some(sequence) = self.unacked.first_sequence() {
            if sequence >= ack_number {
                break;
            }
            self.unacked.remove(sequence);
        }

        self.snd_una = self.snd_una.max(ack_number);

        if self.eof_sent && ack_number > self.eof_seq {
            self.eof_acked = true;
        }

        self.on_input_ready_at(now);
    }
}
