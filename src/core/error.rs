//! Error types for the RIVULET protocol.

use thiserror::Error;

/// Top-level RIVULET errors.
#[derive(Debug, Error)]
pub enum RivuletError {
    /// Segment codec error.
    #[error("segment error: {0}")]
    Segment(#[from] crate::wire::SegmentError),

    /// Protocol engine error.
    #[error("engine error: {0}")]
    Engine(#[from] crate::engine::EngineError),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
