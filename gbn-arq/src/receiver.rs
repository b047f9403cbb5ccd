//! Go-Back-N receive-side state machine (entity B).
//!
//! [`Receiver`] implements the receiver side of Go-Back-N:
//!
//! - Only the **in-order** packet (`seqnum == expect_seq`) with a valid
//!   checksum is accepted and delivered.
//! - Anything else (corrupt, duplicate, or ahead of a gap) is discarded
//!   without buffering.
//! - Every arrival is answered.  An accepted packet gets a fresh cumulative
//!   ACK; a rejected one gets the previous ACK again, verbatim.  That repeated
//!   ACK is the only negative feedback in the protocol.
//!
//! B has no timer of its own.

use crate::error::Rejection;
use crate::host::ReceiverContext;
use crate::message::Message;
use crate::packet::Packet;
use crate::stats::ReceiverStats;

// ---------------------------------------------------------------------------
// Receiver
// ---------------------------------------------------------------------------

/// Go-Back-N receiver state.
#[derive(Debug)]
pub struct Receiver {
    /// Sequence number of the next packet to deliver.
    expect_seq: u32,
    /// The most recent acknowledgment sent, repeated on every rejection.
    last_reply: Packet,
    stats: ReceiverStats,
}

impl Default for Receiver {
    fn default() -> Self {
        Self::new()
    }
}

impl Receiver {
    /// Create a receiver expecting sequence number 1.  Until then its cached
    /// reply acknowledges 0, which the sender always treats as stale.
    pub fn new() -> Self {
        Self {
            expect_seq: 1,
            last_reply: Packet::ack(0),
            stats: ReceiverStats::default(),
        }
    }

    pub fn expect_seq(&self) -> u32 {
        self.expect_seq
    }

    pub fn last_reply(&self) -> &Packet {
        &self.last_reply
    }

    pub fn stats(&self) -> &ReceiverStats {
        &self.stats
    }

    /// Handle a packet arriving from A.
    pub fn on_receive<C: ReceiverContext>(&mut self, packet: &Packet, ctx: &mut C) {
        match self.check(packet) {
            Ok(message) => {
                log::debug!("[B] ← DATA seq={} len={}", packet.seqnum, message.len());
                ctx.deliver_to_application(message);
                self.stats.delivered += 1;

                self.last_reply = Packet::ack(self.expect_seq);
                self.reply(ctx);
                self.expect_seq += 1;
            }
            Err(rejection) => {
                log::debug!(
                    "[B] rejecting packet: {rejection}; repeating ack {}",
                    self.last_reply.acknum
                );
                self.stats.record(&rejection);
                self.reply(ctx);
            }
        }
    }

    fn reply<C: ReceiverContext>(&mut self, ctx: &mut C) {
        ctx.send_to_channel(self.last_reply);
        self.stats.replies_sent += 1;
    }

    fn check(&self, packet: &Packet) -> Result<Message, Rejection> {
        if !packet.is_valid() {
            return Err(Rejection::ChecksumMismatch {
                stored: packet.checksum,
                computed: packet.compute_checksum(),
            });
        }
        if packet.seqnum != self.expect_seq {
            return Err(Rejection::OutOfOrderSequence {
                expected: self.expect_seq,
                got: packet.seqnum,
            });
        }
        packet
            .data_bytes()
            .and_then(|bytes| Message::new(bytes).ok())
            .ok_or(Rejection::InvalidLength(packet.len))
    }

    /// B holds no timer; this exists so hosts can treat both sides alike.
    pub fn on_timeout(&mut self) {}
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
