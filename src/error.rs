//! Error types for the receiver core

use thiserror::Error;

/// Main error type for the application
#[derive(Error, Debug)]
pub enum Error {
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Per-block decode failures.
///
/// These are handled locally by the pipeline (logged, frame dropped) and
/// never unwind past it; subsequent blocks keep flowing.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Payload length does not match the configured block size. The codec
    /// is never invoked for such a block.
    #[error("wrong payload size: expected {expected} bytes, got {got}")]
    WrongSize { expected: usize, got: usize },

    /// The underlying codec signalled failure. Decoder history may be in an
    /// arbitrary state afterwards; callers decide whether to reset the
    /// session rather than silently continue.
    #[error("codec fault: {0}")]
    CodecFault(String),

    /// Decoder could not be set up for the configured rate/duration.
    #[error("decoder initialization failed: {0}")]
    SessionInit(String),
}

/// Audio sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("No output device available")]
    NoDevice,

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to open stream: {0}")]
    StreamError(String),

    #[error("Failed to start playback: {0}")]
    StartFailed(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;
