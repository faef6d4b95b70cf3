//! # RIVULET Protocol
//!
//! A minimal reliable-transport protocol: reliable, in-order, exactly-once
//! byte delivery over an unreliable, lossy, packet-oriented datagram channel.
//!
//! The crate implements the protocol engine only:
//!
//! - **Sliding window**: at most a configured number of segments in flight
//! - **Cumulative acknowledgment**: "I have everything before this number"
//! - **Per-segment retransmission**: each outstanding segment has its own
//!   timeout, so multiple losses in one window heal in a single sweep
//! - **Out-of-order reassembly**: received segments are buffered and flushed
//!   to the application in sequence order
//! - **Teardown handshake**: a connection is destroyed only once both
//!   directions have delivered and acknowledged end-of-stream
//!
//! Raw socket I/O, the application byte source/sink, and the timer driver
//! are external collaborators behind the [`core::Transport`] trait. A
//! tokio-based UDP binding is available behind the `transport` feature.
//!
//! ## Feature Flags
//!
//! - `transport` (default): UDP socket wrapper, datagram channel, and
//!   event-loop driver
//!
//! ## Modules
//!
//! - [`core`]: constants, error types, and the collaborator trait
//! - [`wire`]: segment codec and validation
//! - [`engine`]: sender/receiver state machines, queues, lifecycle manager
//! - [`transport`]: UDP binding (requires `transport` feature)
//!
//! ## Example Usage
//!
//! ```rust
//! use rivulet_protocol::prelude::*;
//!
//! // A toy collaborator: datagrams pile up in `outbox` for the harness to
//! // carry, application bytes come from `input` and land in `output`.
//! #[derive(Default)]
//! struct Loopback {
//!     outbox: Vec<Vec<u8>>,
//!     input: Vec<u8>,
//!     input_done: bool,
//!     output: Vec<u8>,
//! }
//!
//! impl Transport for Loopback {
//!     fn send(&mut self, datagram: &[u8]) {
//!         self.outbox.push(datagram.to_vec());
//!     }
//!
//!     fn read_input(&mut self, buf: &mut [u8]) -> ReadInput {
//!         if self.input.is_empty() {
//!             return if self.input_done { ReadInput::Eof } else { ReadInput::Empty };
//!         }
//!         let n = self.input.len().min(buf.len());
//!         buf[..n].copy_from_slice(&self.input[..n]);
//!         self.input.drain(..n);
//!         ReadInput::Data(n)
//!     }
//!
//!     fn output_space(&self) -> usize {
//!         usize::MAX - self.output.len()
//!     }
//!
//!     fn write_output(&mut self, bytes: &[u8]) {
//!         self.output.extend_from_slice(bytes);
//!     }
//!
//!     fn output_eof(&mut self) {}
//! }
//!
//! let mut manager = ConnectionManager::new();
//! let sender = manager.create(
//!     Loopback { input: b"hello".to_vec(), input_done: true, ..Default::default() },
//!     Config::default(),
//! );
//! let receiver = manager.create(Loopback::default(), Config::default());
//!
//! // The application announces input readiness; the harness carries
//! // datagrams between the two endpoints until traffic dries up.
//! manager.on_input_ready(sender).unwrap();
//! loop {
//!     let batch: Vec<Vec<u8>> =
//!         manager.get_mut(sender).unwrap().transport_mut().outbox.drain(..).collect();
//!     if batch.is_empty() {
//!         break;
//!     }
//!     for datagram in batch {
//!         manager.on_segment_received(receiver, &datagram).unwrap();
//!     }
//!     let acks: Vec<Vec<u8>> =
//!         manager.get_mut(receiver).unwrap().transport_mut().outbox.drain(..).collect();
//!     for datagram in acks {
//!         manager.on_segment_received(sender, &datagram).unwrap();
//!     }
//! }
//!
//! let delivered = &manager.get(receiver).unwrap().transport().output;
//! assert_eq!(&delivered[..], b"hello");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

// Core module (always included)
pub mod core;

// Wire format (always included)
pub mod wire;

// Protocol engine (always included)
pub mod engine;

// Transport layer (feature-gated)
#[cfg(feature = "transport")]
#[cfg_attr(docsrs, doc(cfg(feature = "transport")))]
pub mod transport;

/// Prelude module for convenient imports.
pub mod prelude {
    // Core constants, errors, and traits
    pub use crate::core::*;

    // Wire types
    pub use crate::wire::{Segment, SegmentError, SegmentKind};

    // Engine types
    pub use crate::engine::{
        Config, Connection, ConnectionId, ConnectionManager, Disposition, EngineError,
        SegmentQueue,
    };

    // Transport types (when enabled)
    #[cfg(feature = "transport")]
    pub use crate::transport::{DatagramChannel, DriverConfig, StreamDriver, StreamSocket};
}

// Re-export commonly used items at crate root
pub use crate::core::{ReadInput, RivuletError, Transport};
pub use crate::engine::{Config, Connection, ConnectionId, ConnectionManager};
pub use crate::wire::{Segment, SegmentKind};
