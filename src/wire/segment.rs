//! Segment codec.
//!
//! Wire format, all multi-byte fields big-endian:
//!
//! ```text
//! +----------+----------+------------------+--------------------+
//! | Checksum | Length   | Ack Number       | Sequence Number    |
//! | 2 bytes  | 2 bytes  | 4 bytes          | 4 bytes            |
//! +----------+----------+------------------+--------------------+
//! | Payload (Length - 12 bytes, data segments only)             |
//! +-------------------------------------------------------------+
//! ```
//!
//! The `Length` field is the total segment size and doubles as the kind
//! discriminator: `8` is a pure acknowledgment (no sequence number on the
//! wire), `12` a zero-payload end-of-stream marker, `13..=512` a data
//! segment. Every other value is corruption.
//!
//! The checksum is the RFC 1071 Internet checksum computed over the whole
//! segment with the checksum field zeroed. A segment that fails length or
//! checksum validation is indistinguishable from a lost one; callers drop
//! it and rely on the peer's retransmission timeout, never on a negative
//! acknowledgment.

use thiserror::Error;

use crate::core::{ACK_HEADER_SIZE, DATA_HEADER_SIZE, MAX_PAYLOAD, MAX_SEGMENT_SIZE};

// Byte offsets of the header fields.
const OFF_CHECKSUM: usize = 0;
const OFF_LENGTH: usize = 2;
const OFF_ACK: usize = 4;
const OFF_SEQ: usize = 8;

/// Logical kind of a segment, derived from its `Length` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// Pure cumulative acknowledgment; carries no sequence number.
    Ack,
    /// Data segment carrying payload bytes.
    Data,
    /// Zero-payload data segment marking end-of-stream. Occupies one
    /// sequence number like any other data segment.
    Eof,
}

/// One wire-format unit: an acknowledgment or a data/end-of-stream carrier.
///
/// Construct via [`Segment::ack`], [`Segment::data`], or [`Segment::eof`];
/// parse incoming datagrams with [`Segment::decode`]. Encoding is
/// deterministic, so re-encoding a stored segment reproduces the exact
/// bytes originally sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    kind: SegmentKind,
    ack_number: u32,
    sequence_number: u32,
    payload: Vec<u8>,
}

impl Segment {
    /// Build a pure acknowledgment carrying the cumulative `ack_number`
    /// ("I have everything before this sequence number").
    pub fn ack(ack_number: u32) -> Self {
        Self {
            kind: SegmentKind::Ack,
            ack_number,
            sequence_number: 0,
            payload: Vec::new(),
        }
    }

    /// Build a data segment.
    ///
    /// `payload` must be non-empty and at most [`MAX_PAYLOAD`] bytes; an
    /// empty payload is the end-of-stream marker, built with
    /// [`Segment::eof`]. The `ack_number` piggybacks the sender's current
    /// cumulative acknowledgment; receivers treat it as informational.
    pub fn data(sequence_number: u32, ack_number: u32, payload: Vec<u8>) -> Self {
        debug_assert!(!payload.is_empty() && payload.len() <= MAX_PAYLOAD);
        Self {
            kind: SegmentKind::Data,
            ack_number,
            sequence_number,
            payload,
        }
    }

    /// Build the zero-payload end-of-stream marker.
    pub fn eof(sequence_number: u32, ack_number: u32) -> Self {
        Self {
            kind: SegmentKind::Eof,
            ack_number,
            sequence_number,
            payload: Vec::new(),
        }
    }

    /// Logical kind of this segment.
    pub fn kind(&self) -> SegmentKind {
        self.kind
    }

    /// Check if this is a pure acknowledgment.
    pub fn is_ack(&self) -> bool {
        self.kind == SegmentKind::Ack
    }

    /// Check if this is the end-of-stream marker.
    pub fn is_eof(&self) -> bool {
        self.kind == SegmentKind::Eof
    }

    /// Cumulative acknowledgment number.
    ///
    /// Authoritative only in pure acknowledgment segments; in data segments
    /// it is an informational piggyback.
    pub fn ack_number(&self) -> u32 {
        self.ack_number
    }

    /// Per-segment sequence ordinal (zero for pure acknowledgments).
    pub fn sequence_number(&self) -> u32 {
        self.sequence_number
    }

    /// Payload bytes (empty for acknowledgments and end-of-stream markers).
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Total on-wire size.
    pub fn wire_size(&self) -> usize {
        match self.kind {
            SegmentKind::Ack => ACK_HEADER_SIZE,
            SegmentKind::Eof => DATA_HEADER_SIZE,
            SegmentKind::Data => DATA_HEADER_SIZE + self.payload.len(),
        }
    }

    /// Serialize to wire format, computing and embedding the checksum.
    pub fn encode(&self) -> Vec<u8> {
        let size = self.wire_size();
        let mut buf = vec![0u8; size];

        buf[OFF_LENGTH..OFF_LENGTH + 2].copy_from_slice(&(size as u16).to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.ack_number.to_be_bytes());
        if self.kind != SegmentKind::Ack {
            buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.sequence_number.to_be_bytes());
            buf[DATA_HEADER_SIZE..].copy_from_slice(&self.payload);
        }

        // Checksum field is zero while the checksum is computed.
        let checksum = internet_checksum(&buf);
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&checksum.to_be_bytes());

        buf
    }

    /// Parse and validate a segment from one received datagram.
    ///
    /// Fails when the declared length disagrees with the datagram size,
    /// when the checksum does not verify, or when the length classifies as
    /// no segment kind. No partial recovery is attempted.
    pub fn decode(raw: &[u8]) -> Result<Self, SegmentError> {
        if raw.len() < ACK_HEADER_SIZE {
            return Err(SegmentError::TooShort { actual: raw.len() });
        }

        let stored =
            u16::from_be_bytes([raw[OFF_CHECKSUM], raw[OFF_CHECKSUM + 1]]);
        let length = u16::from_be_bytes([raw[OFF_LENGTH], raw[OFF_LENGTH + 1]]);

        if length as usize != raw.len() {
            return Err(SegmentError::LengthMismatch {
                declared: length,
                actual: raw.len(),
            });
        }

        // Verify checksum: zero the stored field, recompute, compare.
        let mut scratch = raw.to_vec();
        scratch[OFF_CHECKSUM..OFF_CHECKSUM + 2].fill(0);
        let computed = internet_checksum(&scratch);
        if computed != stored {
            return Err(SegmentError::ChecksumMismatch { stored, computed });
        }

        let ack_number = u32::from_be_bytes([
            raw[OFF_ACK],
            raw[OFF_ACK + 1],
            raw[OFF_ACK + 2],
            raw[OFF_ACK + 3],
        ]);

        // The length field is a total discriminator; anything outside the
        // three accepted shapes is corruption.
        let kind = match length as usize {
            ACK_HEADER_SIZE => {
                return Ok(Self::ack(ack_number));
            }
            DATA_HEADER_SIZE => SegmentKind::Eof,
            n if n > DATA_HEADER_SIZE && n <= MAX_SEGMENT_SIZE => SegmentKind::Data,
            _ => return Err(SegmentError::InvalidLength(length)),
        };

        let sequence_number = u32::from_be_bytes([
            raw[OFF_SEQ],
            raw[OFF_SEQ + 1],
            raw[OFF_SEQ + 2],
            raw[OFF_SEQ + 3],
        ]);

        Ok(Self {
            kind,
            ack_number,
            sequence_number,
            payload: raw[DATA_HEADER_SIZE..].to_vec(),
        })
    }
}

/// Segment validation errors.
///
/// At the protocol layer every variant means the same thing (the segment
/// is treated as lost), but the codec reports them distinctly for
/// diagnostics and tests.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SegmentError {
    /// Datagram shorter than the smallest possible segment.
    #[error("segment too short: {actual} bytes")]
    TooShort {
        /// Actual bytes received.
        actual: usize,
    },

    /// Declared length disagrees with the number of bytes received.
    #[error("length mismatch: declared {declared}, received {actual} bytes")]
    LengthMismatch {
        /// The on-wire length field.
        declared: u16,
        /// Actual bytes received.
        actual: usize,
    },

    /// Checksum did not match the recomputed value.
    #[error("checksum mismatch: stored {stored:#06x}, computed {computed:#06x}")]
    ChecksumMismatch {
        /// The on-wire checksum field.
        stored: u16,
        /// Checksum recomputed with the field zeroed.
        computed: u16,
    },

    /// Length classifies as no segment kind.
    #[error("invalid segment length: {0}")]
    InvalidLength(u16),
}

/// Compute the Internet checksum (RFC 1071) over `data`.
///
/// Sums consecutive 16-bit big-endian words, folds the carry, returns the
/// one's-complement. Any checksum field within `data` must already be zero.
fn internet_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    let mut chunks = data.chunks_exact(2);
    for word in &mut chunks {
        sum += u32::from(u16::from_be_bytes([word[0], word[1]]));
    }
    // Odd trailing byte is padded with zero on the right.
    if let [last] = chunks.remainder() {
        sum += u32::from(*last) << 8;
    }

    while sum >> 16 != 0 {
        sum = (sum & 0xffff) + (sum >> 16);
    }

    !(sum as u16)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ack_wire_layout() {
        // checksum | length=8 | ackno=2, big-endian throughout
        let encoded = Segment::ack(2).encode();
        assert_eq!(encoded, hex::decode("fff5000800000002").unwrap());
    }

    #[test]
    fn test_data_wire_layout() {
        let encoded = Segment::data(1, 1, b"hi".to_vec()).encode();
        assert_eq!(encoded, hex::decode("9786000e00000001000000016869").unwrap());
    }

    #[test]
    fn test_eof_wire_layout() {
        let encoded = Segment::eof(3, 1).encode();
        assert_eq!(encoded, hex::decode("ffef000c0000000100000003").unwrap());
    }

    #[test]
    fn test_roundtrip_ack() {
        let segment = Segment::ack(77);
        let decoded = Segment::decode(&segment.encode()).unwrap();
        assert!(decoded.is_ack());
        assert_eq!(decoded.ack_number(), 77);
        assert_eq!(decoded.sequence_number(), 0);
        assert_eq!(decoded, segment);
    }

    #[test]
    fn test_roundtrip_data() {
        let segment = Segment::data(42, 7, vec![0xde, 0xad, 0xbe, 0xef]);
        let decoded = Segment::decode(&segment.encode()).unwrap();
        assert_eq!(decoded.kind(), SegmentKind::Data);
        assert_eq!(decoded.sequence_number(), 42);
        assert_eq!(decoded.ack_number(), 7);
        assert_eq!(decoded.payload(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_roundtrip_eof() {
        let segment = Segment::eof(9, 4);
        let decoded = Segment::decode(&segment.encode()).unwrap();
        assert!(decoded.is_eof());
        assert_eq!(decoded.sequence_number(), 9);
        assert!(decoded.payload().is_empty());
    }

    #[test]
    fn test_roundtrip_odd_payload() {
        // Odd total length exercises the trailing-byte checksum padding.
        let segment = Segment::data(1, 0, b"abc".to_vec());
        assert_eq!(segment.wire_size() % 2, 1);
        let decoded = Segment::decode(&segment.encode()).unwrap();
        assert_eq!(decoded.payload(), b"abc");
    }

    #[test]
    fn test_roundtrip_max_payload() {
        let segment = Segment::data(1, 0, vec![0xa5; MAX_PAYLOAD]);
        assert_eq!(segment.wire_size(), MAX_SEGMENT_SIZE);
        let decoded = Segment::decode(&segment.encode()).unwrap();
        assert_eq!(decoded.payload().len(), MAX_PAYLOAD);
    }

    #[test]
    fn test_decode_too_short() {
        assert_eq!(
            Segment::decode(&[0u8; 4]),
            Err(SegmentError::TooShort { actual: 4 })
        );
        assert_eq!(Segment::decode(&[]), Err(SegmentError::TooShort { actual: 0 }));
    }

    #[test]
    fn test_decode_truncated() {
        let mut raw = Segment::data(1, 0, b"payload".to_vec()).encode();
        raw.pop();
        assert!(matches!(
            Segment::decode(&raw),
            Err(SegmentError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_flipped_bit() {
        let mut raw = Segment::data(5, 2, b"sensitive".to_vec()).encode();
        raw[14] ^= 0x01; // one payload bit
        assert!(matches!(
            Segment::decode(&raw),
            Err(SegmentError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_flipped_header_bit() {
        let mut raw = Segment::ack(1).encode();
        raw[5] ^= 0x80; // ack number field
        assert!(matches!(
            Segment::decode(&raw),
            Err(SegmentError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_unclassifiable_length() {
        // 10 bytes with a consistent length field and valid checksum: the
        // only remaining rejection is the kind discriminator itself.
        let mut raw = vec![0u8; 10];
        raw[OFF_LENGTH..OFF_LENGTH + 2].copy_from_slice(&10u16.to_be_bytes());
        let checksum = internet_checksum(&raw);
        raw[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&checksum.to_be_bytes());

        assert_eq!(Segment::decode(&raw), Err(SegmentError::InvalidLength(10)));
    }

    #[test]
    fn test_decode_oversized_length() {
        let oversize = MAX_SEGMENT_SIZE + 1;
        let mut raw = vec![0u8; oversize];
        raw[OFF_LENGTH..OFF_LENGTH + 2].copy_from_slice(&(oversize as u16).to_be_bytes());
        let checksum = internet_checksum(&raw);
        raw[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&checksum.to_be_bytes());

        assert_eq!(
            Segment::decode(&raw),
            Err(SegmentError::InvalidLength(oversize as u16))
        );
    }

    #[test]
    fn test_reencode_is_identical() {
        // Retransmission re-encodes the stored segment; the bytes must be
        // exactly those of the first transmission.
        let segment = Segment::data(3, 1, b"again".to_vec());
        assert_eq!(segment.encode(), segment.encode());
        let decoded = Segment::decode(&segment.encode()).unwrap();
        assert_eq!(decoded.encode(), segment.encode());
    }

    #[test]
    fn test_checksum_zero_data() {
        assert_eq!(internet_checksum(&[0, 0]), 0xffff);
        assert_eq!(internet_checksum(&[]), 0xffff);
    }
}
