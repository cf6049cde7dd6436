//! Opus codec wrapper
//!
//! Decode-only: the receiver never encodes. One [`CodecSession`] per
//! connection, reset on disconnect so concealment history cannot leak
//! between sessions.

pub mod session;

pub use session::CodecSession;
