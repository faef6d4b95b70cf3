//! Protocol constants.
//!
//! These values are fixed by the wire format and MUST NOT be changed.

use std::time::Duration;

// =============================================================================
// WIRE FORMAT
// =============================================================================

/// Header size of a pure acknowledgment segment (checksum + length + ackno).
pub const ACK_HEADER_SIZE: usize = 8;

/// Header size of a data segment (checksum + length + ackno + seqno).
pub const DATA_HEADER_SIZE: usize = 12;

/// Maximum payload bytes a single data segment may carry.
pub const MAX_PAYLOAD: usize = 500;

/// Maximum total segment size on the wire.
pub const MAX_SEGMENT_SIZE: usize = DATA_HEADER_SIZE + MAX_PAYLOAD;

/// First sequence number assigned on a fresh connection.
///
/// Sequence numbers are per-segment ordinals, not byte offsets; zero is
/// never assigned.
pub const FIRST_SEQUENCE: u32 = 1;

// =============================================================================
// DEFAULT TUNABLES
// =============================================================================

/// Default cap on outstanding (sent but unacknowledged) segments.
pub const DEFAULT_WINDOW: u32 = 8;

/// Default per-segment retransmission timeout.
pub const DEFAULT_RETRANSMIT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default period of the retransmission sweep.
///
/// Finer-grained than the retransmission timeout so that an expired segment
/// is picked up promptly by the next sweep.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);
