//! Application-level messages.
//!
//! A [`Message`] is the unit the application hands to the sender and the unit
//! the receiver delivers back up.  It holds at most [`PAYLOAD_LEN`] bytes and
//! always carries its length explicitly, so payloads containing zero bytes
//! survive the trip intact.

use std::fmt;

use thiserror::Error;

use crate::packet::PAYLOAD_LEN;

/// A fixed-capacity application message.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Message {
    data: [u8; PAYLOAD_LEN],
    len: usize,
}

impl Message {
    /// Wrap `bytes` in a message.
    pub fn new(bytes: &[u8]) -> Result<Self, MessageError> {
        if bytes.len() > PAYLOAD_LEN {
            return Err(MessageError::TooLong(bytes.len()));
        }
        let mut data = [0u8; PAYLOAD_LEN];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self {
            data,
            len: bytes.len(),
        })
    }

    /// Split `bytes` into consecutive messages of at most [`PAYLOAD_LEN`] bytes.
    pub fn chunk(bytes: &[u8]) -> Vec<Self> {
        bytes
            .chunks(PAYLOAD_LEN)
            .map(|c| {
                let mut data = [0u8; PAYLOAD_LEN];
                data[..c.len()].copy_from_slice(c);
                Self { data, len: c.len() }
            })
            .collect()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({:?})", String::from_utf8_lossy(self.as_bytes()))
    }
}

/// Errors raised when building a [`Message`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("message of {0} bytes exceeds the {max}-byte payload", max = PAYLOAD_LEN)]
    TooLong(usize),
}
