//! Sender-side packet ring.
//!
//! Every accepted message lives here as a sealed packet from the moment it is
//! accepted until the window base moves past it.  Slots are addressed by
//! `seq % capacity`; the sender's `base` and `buffer_next` counters are the
//! only occupancy bookkeeping, so the ring itself never tracks which slots are
//! live.
//!
//! ```text
//!  base        nextseq      buffer_next
//!   │             │              │
//!   ▼             ▼              ▼
//!  ─┼─────────────┼──────────────┼──────▶ seq space
//!   │<─ in flight ▶│<─ queued ──▶│
//!   │<──────── held (< capacity) ▶│
//! ```

use crate::error::Rejection;
use crate::packet::Packet;

#[derive(Debug)]
pub struct PacketRing {
    slots: Box<[Packet]>,
}

impl PacketRing {
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: u32) -> Self {
        assert!(capacity >= 1, "ring capacity must be at least 1");
        Self {
            slots: vec![Packet::default(); capacity as usize].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> u32 {
        self.slots.len() as u32
    }

    /// Store `packet` in the slot for `packet.seqnum`.
    ///
    /// `base` is the oldest sequence number still held.  Fails without
    /// touching the ring when storing would overwrite a held packet.
    pub fn store(&mut self, base: u32, packet: Packet) -> Result<(), Rejection> {
        debug_assert!(packet.seqnum >= base, "storing below the window base");
        let outstanding = packet.seqnum - base;
        if outstanding >= self.capacity() {
            return Err(Rejection::SendBufferExhausted {
                outstanding,
                capacity: self.capacity(),
            });
        }
        let idx = self.index(packet.seqnum);
        self.slots[idx] = packet;
        Ok(())
    }

    /// The packet stored for `seq`.
    ///
    /// Callers must only ask for sequence numbers currently held, i.e. in
    /// `[base, buffer_next)`.
    pub fn get(&self, seq: u32) -> &Packet {
        let packet = &self.slots[self.index(seq)];
        debug_assert_eq!(packet.seqnum, seq, "ring slot holds a different packet");
        packet
    }

    fn index(&self, seq: u32) -> usize {
        (seq % self.capacity()) as usize
    }
}
