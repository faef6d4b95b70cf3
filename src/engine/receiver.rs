//! Receiver engine: validation, reorder buffering, in-order flush, and
//! acknowledgment emission.

use crate::core::Transport;
use crate::wire::Segment;

use super::connection::Connection;

impl<T: Transport> Connection<T> {
    /// Process one received data or end-of-stream segment.
    ///
    /// Pure acknowledgments go to [`on_ack`](Self::on_ack) instead; the
    /// [`ConnectionManager`](super::ConnectionManager) dispatches on the
    /// decoded segment kind.
    ///
    /// A segment the sink currently has no room for is simply not accepted:
    /// no ack is emitted, so the peer's retransmission becomes the
    /// backpressure signal.
    pub fn on_data(&mut self, segment: Segment) {
        let sequence = segment.sequence_number();

        if sequence < self.rcv_next {
            // Stale copy of something already delivered; our ack evidently
            // got lost. Answer again so the peer's retransmission timer can
            // retire the segment. Sequence zero is the one exception and is
            // never re-acknowledged: valid numbering starts at one, so a
            // zero can only come from traffic that is malformed yet passed
            // the checksum.
            if sequence != 0 {
                self.emit_ack();
            }
            return;
        }

        if sequence - self.rcv_next >= self.config.window {
            // Outside the receive window. Drop without acking; the peer's
            // timeout retries once the window has advanced.
            return;
        }

        if !self.reorder.contains(sequence)
            && self.transport.output_space() >= segment.payload().len()
        {
            self.reorder.insert_if_absent(sequence, segment);
        }

        self.flush_ready();
    }

    /// Drain the reorder buffer to the sink while it stays contiguous.
    ///
    /// The loop exits when the next expected segment is missing or the
    /// sink runs out of room, never on a batch size: the drain is lazy,
    /// restartable, and idempotent. Each flushed segment produces its own
    /// cumulative acknowledgment.
    pub(crate) fn flush_ready(&mut self) {
        loop {
            let flushable = match self.reorder.peek_first() {
                Some((sequence, segment)) if sequence == self.rcv_next => {
                    segment.is_eof() || self.transport.output_space() >= segment.payload().len()
                }
                _ => false,
            };
            if !flushable {
                return;
            }
            let Some((_, segment)) = self.reorder.pop_first() else {
                return;
            };

            if segment.is_eof() {
                self.transport.output_eof();
                self.rcv_next += 1;
                self.eof_received = true;
            } else {
                self.flushing = true;
                self.transport.write_output(segment.payload());
                self.rcv_next += 1;
                self.flushing = false;
            }
            self.emit_ack();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::super::connection::Config;
    use super::super::testkit::MockTransport;
    use super::*;

    fn test_connection(window: u32) -> Connection<MockTransport> {
        let config = Config {
            window,
            retransmit_timeout: Duration::from_millis(100),
        };
        Connection::new(MockTransport::new(), config)
    }

    fn data(sequence: u32, payload: &[u8]) -> Segment {
        Segment::data(sequence, 1, payload.to_vec())
    }

    #[test]
    fn test_in_order_delivery() {
        let mut connection = test_connection(4);

        connection.on_data(data(1, b"one"));
        connection.on_data(data(2, b"two"));

        assert_eq!(connection.transport().output, b"onetwo");
        assert_eq!(connection.rcv_next(), 3);
        assert_eq!(connection.transport().acks_sent(), vec![2, 3]);
    }

    #[test]
    fn test_out_of_order_held_then_flushed_together() {
        let mut connection = test_connection(4);

        connection.on_data(data(1, b"A"));
        assert_eq!(connection.transport().output, b"A");
        assert_eq!(connection.transport().acks_sent(), vec![2]);

        // Segment 3 arrives early: buffered, nothing written, no ack.
        connection.on_data(data(3, b"C"));
        assert_eq!(connection.transport().output, b"A");
        assert_eq!(connection.transport().acks_sent(), vec![2]);

        // Segment 2 closes the gap: 2 and 3 flush back-to-back, each with
        // its own cumulative ack.
        connection.on_data(data(2, b"B"));
        assert_eq!(connection.transport().output, b"ABC");
        assert_eq!(connection.transport().acks_sent(), vec![2, 3, 4]);
    }

    #[test]
    fn test_duplicate_of_delivered_segment_reacked_not_rewritten() {
        let mut connection = test_connection(4);

        connection.on_data(data(1, b"once"));
        assert_eq!(connection.transport().output, b"once");

        connection.on_data(data(1, b"once"));

        // No second sink write, but a fresh ack for the peer's timer.
        assert_eq!(connection.transport().output, b"once");
        assert_eq!(connection.transport().acks_sent(), vec![2, 2]);
    }

    #[test]
    fn test_duplicate_of_buffered_segment_suppressed() {
        let mut connection = test_connection(4);

        connection.on_data(data(2, b"later"));
        connection.on_data(data(2, b"later"));
        assert_eq!(connection.reorder.len(), 1);

        connection.on_data(data(1, b"first"));
        assert_eq!(connection.transport().output, b"firstlater");
    }

    #[test]
    fn test_sequence_zero_never_reacked() {
        let mut connection = test_connection(4);

        connection.on_data(data(0, b"bogus"));

        assert!(connection.transport().sent.is_empty());
        assert!(connection.transport().output.is_empty());
        assert_eq!(connection.rcv_next(), 1);
    }

    #[test]
    fn test_beyond_window_dropped_silently() {
        let mut connection = test_connection(4);

        // rcv_next = 1, window = 4: sequence 5 is the first out of range.
        connection.on_data(data(5, b"far"));

        assert!(connection.transport().sent.is_empty());
        assert_eq!(connection.reorder.len(), 0);
    }

    #[test]
    fn test_window_edge_accepted() {
        let mut connection = test_connection(4);

        connection.on_data(data(4, b"edge"));
        assert_eq!(connection.reorder.len(), 1);
    }

    #[test]
    fn test_backpressure_rejects_without_ack() {
        let mut connection = test_connection(4);
        connection.transport_mut().capacity = 3;

        connection.on_data(data(1, b"toolarge"));

        // Not accepted, not acked: the peer's retransmission is the retry.
        assert!(connection.transport().sent.is_empty());
        assert!(connection.transport().output.is_empty());
        assert_eq!(connection.rcv_next(), 1);

        // Once the sink drains, the retransmitted copy goes through.
        connection.transport_mut().capacity = 64;
        connection.on_data(data(1, b"toolarge"));
        assert_eq!(connection.transport().output, b"toolarge");
        assert_eq!(connection.transport().acks_sent(), vec![2]);
    }

    #[test]
    fn test_flush_stops_at_sink_capacity() {
        let mut connection = test_connection(4);
        connection.transport_mut().capacity = 3;

        connection.on_data(data(2, b"bb"));
        connection.on_data(data(1, b"aa"));

        // Both passed the space check on arrival, but after "aa" lands the
        // sink only has one byte left: the flush stalls before "bb".
        assert_eq!(connection.transport().output, b"aa");
        assert_eq!(connection.rcv_next(), 2);
        assert_eq!(connection.reorder.len(), 1);

        // Space frees up; the peer's retransmission of segment 2 restarts
        // the stalled drain.
        connection.transport_mut().capacity = 8;
        connection.on_data(data(2, b"bb"));
        assert_eq!(connection.transport().output, b"aabb");
        assert_eq!(connection.rcv_next(), 3);
        assert_eq!(connection.transport().acks_sent(), vec![2, 3]);
    }

    #[test]
    fn test_eof_flush_signals_sink() {
        let mut connection = test_connection(4);

        connection.on_data(data(1, b"tail"));
        connection.on_data(Segment::eof(2, 1));

        assert!(connection.transport().eof_signaled);
        assert!(connection.eof_received());
        assert_eq!(connection.rcv_next(), 3);
        assert_eq!(connection.transport().acks_sent(), vec![2, 3]);
    }

    #[test]
    fn test_eof_out_of_order_waits_for_gap() {
        let mut connection = test_connection(4);

        connection.on_data(Segment::eof(2, 1));
        assert!(!connection.eof_received());
        assert!(!connection.transport().eof_signaled);

        connection.on_data(data(1, b"body"));
        assert!(connection.eof_received());
        assert_eq!(connection.transport().output, b"body");
    }

    #[test]
    fn test_rcv_next_monotonic() {
        let mut connection = test_connection(4);
        let mut floor = connection.rcv_next();

        let arrivals = [
            data(2, b"b"),
            data(0, b"z"),
            data(1, b"a"),
            data(1, b"a"),
            data(9, b"far"),
            data(3, b"c"),
        ];
        for segment in arrivals {
            connection.on_data(segment);
            assert!(connection.rcv_next() >= floor);
            floor = connection.rcv_next();
        }
        assert_eq!(connection.rcv_next(), 4);
    }
}
