//! Packet layout, checksum and wire format.
//!
//! Every unit exchanged between the two endpoints is a [`Packet`].  This
//! module is responsible for:
//! - Defining the fixed-size packet (header fields + 20-byte payload block).
//! - Computing and checking the additive checksum both endpoints share.
//! - Serialising a [`Packet`] into a frame for the channel and parsing it back.
//!
//! No I/O happens here — this is pure data transformation.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Sequence Number                        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                    Acknowledgment Number                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                           Checksum                            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |    Length     |            Payload (20 bytes) ...             |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total frame size: [`FRAME_LEN`] = 33 bytes.
//! seq(4) + ack(4) + checksum(4) + len(1) + payload(20)

use thiserror::Error;

use crate::message::Message;

/// Size of the fixed payload block carried by every packet.
pub const PAYLOAD_LEN: usize = 20;

/// Byte length of the header on the wire.
pub const HEADER_LEN: usize = 13;

/// Byte length of a complete encoded packet.
pub const FRAME_LEN: usize = HEADER_LEN + PAYLOAD_LEN;

// Byte offsets of each field within the serialised frame.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 4;
const OFF_CHECKSUM: usize = 8;
const OFF_LEN: usize = 12;

/// A protocol packet: data from A to B, or an acknowledgment from B to A.
///
/// Acknowledgments carry `seqnum = 0`, `len = 0` and a zeroed payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Packet {
    /// Sequence number of this data packet (first packet is 1).
    pub seqnum: u32,
    /// Cumulative acknowledgment: every packet up to and including this
    /// sequence number has been delivered.
    pub acknum: u32,
    /// Additive checksum over every other field, see [`Packet::compute_checksum`].
    pub checksum: u32,
    /// Number of meaningful bytes at the front of `payload`.
    pub len: u8,
    pub payload: [u8; PAYLOAD_LEN],
}

impl Packet {
    /// Build a sealed data packet carrying `message` under sequence number `seqnum`.
    pub fn data(seqnum: u32, message: &Message) -> Self {
        let mut payload = [0u8; PAYLOAD_LEN];
        let bytes = message.as_bytes();
        payload[..bytes.len()].copy_from_slice(bytes);
        Self {
            seqnum,
            acknum: 0,
            checksum: 0,
            len: bytes.len() as u8,
            payload,
        }
        .sealed()
    }

    /// Build a sealed cumulative acknowledgment for `acknum`.
    pub fn ack(acknum: u32) -> Self {
        Self {
            acknum,
            ..Self::default()
        }
        .sealed()
    }

    /// Return a copy of this packet with the checksum recomputed.
    pub fn sealed(mut self) -> Self {
        self.checksum = self.compute_checksum();
        self
    }

    /// Sum of the sequence number, acknowledgment number, length and every
    /// payload byte, wrapping on overflow.
    pub fn compute_checksum(&self) -> u32 {
        self.payload.iter().fold(
            self.seqnum
                .wrapping_add(self.acknum)
                .wrapping_add(u32::from(self.len)),
            |sum, &b| sum.wrapping_add(u32::from(b)),
        )
    }

    /// `true` when the stored checksum matches the packet's contents.
    pub fn is_valid(&self) -> bool {
        self.checksum == self.compute_checksum()
    }

    /// The meaningful prefix of the payload block.
    ///
    /// Returns `None` when `len` exceeds the payload block.
    pub fn data_bytes(&self) -> Option<&[u8]> {
        self.payload.get(..usize::from(self.len))
    }

    /// Serialise this packet into a newly allocated frame.
    ///
    /// The stored checksum is written as-is; seal the packet first.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = vec![0u8; FRAME_LEN];

        buf[OFF_SEQ..OFF_SEQ + 4].copy_from_slice(&self.seqnum.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 4].copy_from_slice(&self.acknum.to_be_bytes());
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 4].copy_from_slice(&self.checksum.to_be_bytes());
        buf[OFF_LEN] = self.len;
        buf[HEADER_LEN..].copy_from_slice(&self.payload);

        buf
    }

    /// Parse a [`Packet`] from a raw frame.
    ///
    /// Only the frame length is checked here.  A packet that was corrupted in
    /// transit decodes fine; detecting that is the endpoints' job via
    /// [`Packet::is_valid`].
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() < HEADER_LEN {
            return Err(PacketError::BufferTooShort(buf.len()));
        }
        if buf.len() != FRAME_LEN {
            return Err(PacketError::LengthMismatch(buf.len()));
        }

        let mut payload = [0u8; PAYLOAD_LEN];
        payload.copy_from_slice(&buf[HEADER_LEN..]);

        Ok(Packet {
            seqnum: read_u32(buf, OFF_SEQ),
            acknum: read_u32(buf, OFF_ACK),
            checksum: read_u32(buf, OFF_CHECKSUM),
            len: buf[OFF_LEN],
            payload,
        })
    }
}

fn read_u32(buf: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

/// Errors that can arise when parsing a raw frame.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("frame of {0} bytes is too short to contain a header")]
    BufferTooShort(usize),
    #[error("frame of {0} bytes does not match the fixed packet size of {len}", len = FRAME_LEN)]
    LengthMismatch(usize),
}
