//! Error types for the bluesim library
//!
//! This module defines the error types used throughout the library.

use thiserror::Error;

/// Errors that can occur when decoding packet payloads
#[derive(Error, Debug)]
pub enum PacketError {
    #[error("Packet truncated: need {0} bytes, have {1}")]
    Truncated(usize, usize),

    #[error("Payload length mismatch: header says {0}, buffer has {1}")]
    LengthMismatch(usize, usize),

    #[error("Invalid packet format")]
    InvalidFormat,
}

/// Result type for packet decoding
pub type PacketResult<T> = Result<T, PacketError>;
