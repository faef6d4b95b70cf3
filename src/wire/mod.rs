//! Wire format: segment encoding, decoding, and validation.
//!
//! Every datagram exchanged between peers is one [`Segment`]. No I/O
//! happens here; this module is pure data transformation.

mod segment;

pub use segment::*;
