//! Transport layer: UDP binding and event-loop driver.
//!
//! The engine itself is I/O-free; this module supplies the pieces that
//! connect it to a real network:
//!
//! - [`StreamSocket`]: async UDP socket wrapper sized for segments
//! - [`DatagramChannel`]: a [`Transport`](crate::core::Transport)
//!   implementation bridging a UDP socket and in-memory application byte
//!   queues
//! - [`StreamDriver`]: a single-connection event loop delivering the three
//!   protocol stimuli (datagram arrival, input readiness, timer tick)
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │           Application bytes             │
//! ├─────────────────────────────────────────┤
//! │         Protocol engine                 │
//! │   window, acks, retransmission          │
//! ├─────────────────────────────────────────┤
//! │         Transport layer                 │  ← this module
//! │   channel, driver, socket               │
//! ├─────────────────────────────────────────┤
//! │              UDP                        │
//! └─────────────────────────────────────────┘
//! ```

mod channel;
mod driver;
mod socket;

pub use channel::*;
pub use driver::*;
pub use socket::*;
