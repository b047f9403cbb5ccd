//! Conditions the endpoints reject locally.
//!
//! None of these ever reaches the application.  The endpoints log them, count
//! them in their statistics and carry on; recovery comes from the sender's
//! timeout and the receiver's duplicate reply.

use thiserror::Error;

#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum Rejection {
    #[error("checksum mismatch: stored {stored}, computed {computed}")]
    ChecksumMismatch { stored: u32, computed: u32 },

    #[error("out-of-order packet: expected seq {expected}, got {got}")]
    OutOfOrderSequence { expected: u32, got: u32 },

    #[error("stale or duplicate ack {acknum} (base {base})")]
    StaleOrDuplicateAck { acknum: u32, base: u32 },

    #[error("ack {acknum} is beyond the last sent packet {last_sent}")]
    AckBeyondWindow { acknum: u32, last_sent: u32 },

    #[error("payload length {0} exceeds the payload block")]
    InvalidLength(u8),

    #[error("send buffer exhausted: {outstanding} packets held, capacity {capacity}")]
    SendBufferExhausted { outstanding: u32, capacity: u32 },
}
