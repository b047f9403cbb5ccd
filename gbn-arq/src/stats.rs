//! Per-endpoint counters.

use crate::error::Rejection;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SenderStats {
    /// First transmissions of data packets.
    pub transmitted: u64,
    /// Data packets re-sent after a timeout.
    pub retransmitted: u64,
    /// Acknowledgments that advanced the window.
    pub acks_accepted: u64,
    /// Acknowledgments ignored as corrupt, stale or out of range.
    pub acks_rejected: u64,
    /// Application messages dropped because the packet ring was full.
    pub messages_dropped: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReceiverStats {
    pub delivered: u64,
    /// Packets rejected for a bad checksum or an impossible length.
    pub corrupt: u64,
    /// Intact packets that were not the one expected.
    pub out_of_order: u64,
    /// Acknowledgments sent, fresh or repeated.
    pub replies_sent: u64,
}

impl ReceiverStats {
    pub(crate) fn record(&mut self, rejection: &Rejection) {
        match rejection {
            Rejection::OutOfOrderSequence { .. } => self.out_of_order += 1,
            _ => self.corrupt += 1,
        }
    }
}
