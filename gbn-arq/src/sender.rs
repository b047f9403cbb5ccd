//! Go-Back-N send-side state machine (entity A).
//!
//! [`Sender`] accepts application messages, keeps up to `window_size` of them
//! in flight, and recovers from loss by retransmitting the whole outstanding
//! window whenever its single timer expires.
//!
//! # Protocol contract
//!
//! - At most `window_size` packets are in flight at once.
//! - ACKs are **cumulative**: `acknum = K` means B has delivered every packet
//!   up to and including `K`.
//! - On timeout **all** packets in `[base, nextseq)` are re-sent, oldest
//!   first, and the timer is re-armed.
//! - The timer runs exactly while packets are in flight.
//!
//! All I/O goes through the [`SenderContext`] passed to each handler.
//!
//! # Sequence-number layout
//!
//! ```text
//!  base          nextseq         buffer_next
//!   │               │                 │
//!  ─┼───────────────┼─────────────────┼────▶ seq space
//!   │<─ in flight ─▶│<─ accepted, ───▶│
//!                      waiting for window
//! ```

use crate::config::ProtocolConfig;
use crate::error::Rejection;
use crate::host::SenderContext;
use crate::message::Message;
use crate::packet::Packet;
use crate::ring::PacketRing;
use crate::stats::SenderStats;
use crate::timer::RetransmitTimer;

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Go-Back-N sender state.
#[derive(Debug)]
pub struct Sender {
    /// Oldest unacknowledged sequence number (left window edge).
    base: u32,
    /// Next sequence number to put on the wire.
    nextseq: u32,
    /// Sequence number the next accepted message will get.
    buffer_next: u32,
    window_size: u32,
    timer: RetransmitTimer,
    ring: PacketRing,
    stats: SenderStats,
}

impl Sender {
    /// Create a sender with an empty window; the first packet gets sequence
    /// number 1.
    ///
    /// # Panics
    ///
    /// Panics if `config` fails [`ProtocolConfig::validate`].
    pub fn new(config: &ProtocolConfig) -> Self {
        if let Err(e) = config.validate() {
            panic!("invalid sender configuration: {e}");
        }
        Self {
            base: 1,
            nextseq: 1,
            buffer_next: 1,
            window_size: config.window_size,
            timer: RetransmitTimer::new(config.timer_duration),
            ring: PacketRing::new(config.buffer_capacity),
            stats: SenderStats::default(),
        }
    }

    pub fn base(&self) -> u32 {
        self.base
    }

    pub fn nextseq(&self) -> u32 {
        self.nextseq
    }

    pub fn buffer_next(&self) -> u32 {
        self.buffer_next
    }

    pub fn window_size(&self) -> u32 {
        self.window_size
    }

    /// Packets sent but not yet acknowledged.
    pub fn in_flight(&self) -> u32 {
        self.nextseq - self.base
    }

    /// Accepted messages still waiting for room in the window.
    pub fn queued(&self) -> u32 {
        self.buffer_next - self.nextseq
    }

    /// `true` once every accepted message has been acknowledged.
    pub fn is_idle(&self) -> bool {
        self.base == self.buffer_next
    }

    pub fn is_timer_running(&self) -> bool {
        self.timer.is_running()
    }

    pub fn stats(&self) -> &SenderStats {
        &self.stats
    }

    /// Take a message from the application.
    ///
    /// The message is packetised under the next free sequence number and sent
    /// as soon as the window allows.  If the packet ring is full the message
    /// is dropped; this is logged and counted but not reported to the caller.
    pub fn accept<C: SenderContext>(&mut self, message: &Message, ctx: &mut C) {
        let packet = Packet::data(self.buffer_next, message);
        if let Err(rejection) = self.ring.store(self.base, packet) {
            log::warn!("[A] dropping message: {rejection}");
            self.stats.messages_dropped += 1;
            return;
        }
        log::debug!(
            "[A] accepted seq={} len={} queued={}",
            self.buffer_next,
            message.len(),
            self.queued() + 1
        );
        self.buffer_next += 1;
        self.transmit_window(ctx);
    }

    /// Send every buffered packet the window currently has room for.
    fn transmit_window<C: SenderContext>(&mut self, ctx: &mut C) {
        while self.nextseq < self.buffer_next && self.nextseq < self.base + self.window_size {
            let packet = *self.ring.get(self.nextseq);
            log::debug!("[A] → DATA seq={} len={}", packet.seqnum, packet.len);
            ctx.send_to_channel(packet);
            self.stats.transmitted += 1;
            if self.base == self.nextseq {
                self.timer.start(ctx);
            }
            self.nextseq += 1;
        }
    }

    /// Handle an acknowledgment arriving from B.
    pub fn on_ack<C: SenderContext>(&mut self, packet: &Packet, ctx: &mut C) {
        let acknum = match self.check_ack(packet) {
            Ok(acknum) => acknum,
            Err(rejection) => {
                log::debug!("[A] ignoring ack: {rejection}");
                self.stats.acks_rejected += 1;
                return;
            }
        };

        self.base = acknum + 1;
        self.stats.acks_accepted += 1;
        log::debug!(
            "[A] ← ACK {} base={} in_flight={}",
            acknum,
            self.base,
            self.in_flight()
        );

        if self.base == self.nextseq {
            self.timer.stop(ctx);
        } else {
            self.timer.restart(ctx);
        }
        self.transmit_window(ctx);
    }

    fn check_ack(&self, packet: &Packet) -> Result<u32, Rejection> {
        if !packet.is_valid() {
            return Err(Rejection::ChecksumMismatch {
                stored: packet.checksum,
                computed: packet.compute_checksum(),
            });
        }
        let acknum = packet.acknum;
        if acknum < self.base {
            return Err(Rejection::StaleOrDuplicateAck {
                acknum,
                base: self.base,
            });
        }
        if acknum >= self.nextseq {
            return Err(Rejection::AckBeyondWindow {
                acknum,
                last_sent: self.nextseq - 1,
            });
        }
        Ok(acknum)
    }

    /// Handle expiry of the retransmission timer: go back N.
    pub fn on_timeout<C: SenderContext>(&mut self, ctx: &mut C) {
        if !self.timer.expired() || self.base == self.nextseq {
            log::warn!(
                "[A] spurious timeout with {} packets in flight",
                self.in_flight()
            );
            if self.base < self.nextseq {
                self.timer.start(ctx);
            }
            return;
        }

        log::debug!(
            "[A] timeout: resending seq {}..{}",
            self.base,
            self.nextseq
        );
        for seq in self.base..self.nextseq {
            ctx.send_to_channel(*self.ring.get(seq));
            self.stats.retransmitted += 1;
        }
        self.timer.start(ctx);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    use super::*;
    use crate::host::testing::{Recorder, TimerCall};

    const T: Duration = Duration::from_millis(15);

    fn msg(i: u32) -> Message {
        Message::new(format!("msg-{i:02}").as_bytes()).unwrap()
    }

    fn sender() -> Sender {
        Sender::new(&ProtocolConfig::default())
    }

    fn small(window_size: u32, buffer_capacity: u32) -> Sender {
        Sender::new(&ProtocolConfig {
            window_size,
            buffer_capacity,
            ..Default::default()
        })
    }

    fn accept_n(s: &mut Sender, host: &mut Recorder, n: u32) {
        for i in 0..n {
            s.accept(&msg(i), host);
        }
    }

    #[test]
    fn initial_state() {
        let s = sender();
        assert_eq!(s.base(), 1);
        assert_eq!(s.nextseq(), 1);
        assert_eq!(s.buffer_next(), 1);
        assert_eq!(s.window_size(), 8);
        assert!(s.is_idle());
        assert!(!s.is_timer_running());
    }

    #[test]
    fn first_accept_sends_and_starts_timer() {
        let mut host = Recorder::default();
        let mut s = sender();
        s.accept(&msg(0), &mut host);

        assert_eq!(host.sent_seqs(), vec![1]);
        assert!(host.sent[0].is_valid());
        assert_eq!(host.sent[0].data_bytes(), Some(&b"msg-00"[..]));
        assert_eq!(host.timer, vec![TimerCall::Start(T)]);
        assert_eq!(s.nextseq(), 2);
        assert_eq!(s.buffer_next(), 2);
    }

    #[test]
    fn timer_started_once_per_window() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 5);
        assert_eq!(host.timer, vec![TimerCall::Start(T)]);
    }

    #[test]
    fn window_limits_transmission() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 10);

        assert_eq!(host.sent_seqs(), (1..=8).collect::<Vec<_>>());
        assert_eq!(s.in_flight(), 8);
        assert_eq!(s.queued(), 2);
        assert_eq!(s.buffer_next(), 11);
    }

    #[test]
    fn cumulative_ack_slides_window() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 10);
        host.clear();

        s.on_ack(&Packet::ack(2), &mut host);
        assert_eq!(s.base(), 3);
        // two slots opened for the queued packets
        assert_eq!(host.sent_seqs(), vec![9, 10]);
        assert_eq!(host.timer, vec![TimerCall::Stop, TimerCall::Start(T)]);
        assert!(s.is_timer_running());
    }

    #[test]
    fn final_ack_stops_timer() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 3);
        host.clear();

        s.on_ack(&Packet::ack(3), &mut host);
        assert_eq!(s.base(), 4);
        assert!(s.is_idle());
        assert!(!s.is_timer_running());
        assert_eq!(host.timer, vec![TimerCall::Stop]);
        assert!(host.sent.is_empty());
    }

    #[test]
    fn draining_ack_releases_queued_packets() {
        let mut host = Recorder::default();
        let mut s = small(2, 16);
        accept_n(&mut s, &mut host, 4);
        assert_eq!(host.sent_seqs(), vec![1, 2]);
        host.clear();

        s.on_ack(&Packet::ack(2), &mut host);
        assert_eq!(host.sent_seqs(), vec![3, 4]);
        assert_eq!(host.timer, vec![TimerCall::Stop, TimerCall::Start(T)]);
        assert!(s.is_timer_running());
        assert_eq!(s.in_flight(), 2);
    }

    #[test]
    fn corrupt_ack_is_ignored() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 3);
        host.clear();

        let mut ack = Packet::ack(2);
        ack.acknum = 3;
        s.on_ack(&ack, &mut host);

        assert_eq!(s.base(), 1);
        assert!(host.timer.is_empty());
        assert_eq!(s.stats().acks_rejected, 1);
    }

    #[test]
    fn duplicate_ack_does_not_move_base() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 4);

        s.on_ack(&Packet::ack(2), &mut host);
        assert_eq!(s.base(), 3);
        host.clear();

        for acknum in [0, 1, 2, 2] {
            s.on_ack(&Packet::ack(acknum), &mut host);
            assert_eq!(s.base(), 3);
        }
        assert!(host.sent.is_empty());
        assert!(host.timer.is_empty());
        assert_eq!(s.stats().acks_rejected, 4);
    }

    #[test]
    fn ack_beyond_last_sent_is_ignored() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 2);

        s.on_ack(&Packet::ack(50), &mut host);
        assert_eq!(s.base(), 1);
        assert!(s.is_timer_running());
    }

    #[test]
    fn timeout_resends_whole_window() {
        let mut host = Recorder::default();
        let mut s = sender();
        accept_n(&mut s, &mut host, 10);
        s.on_ack(&Packet::ack(3), &mut host);
        host.clear();

        s.on_timeout(&mut host);
        assert_eq!(host.sent_seqs(), (4..=10).collect::<Vec<_>>());
        assert!(host.sent.iter().all(Packet::is_valid));
        assert_eq!(host.timer, vec![TimerCall::Start(T)]);
        assert_eq!(s.stats().retransmitted, 7);
        assert_eq!(s.base(), 4);
    }

    #[test]
    fn spurious_timeout_on_empty_window_does_nothing() {
        let mut host = Recorder::default();
        let mut s = sender();
        s.on_timeout(&mut host);
        assert!(host.sent.is_empty());
        assert!(host.timer.is_empty());
        assert!(!s.is_timer_running());
    }

    #[test]
    fn full_ring_drops_messages() {
        let mut host = Recorder::default();
        let mut s = small(2, 3);
        accept_n(&mut s, &mut host, 5);

        assert_eq!(s.buffer_next(), 4);
        assert_eq!(s.stats().messages_dropped, 2);
        assert_eq!(host.sent_seqs(), vec![1, 2]);

        // room again once the base moves
        s.on_ack(&Packet::ack(1), &mut host);
        s.accept(&msg(9), &mut host);
        assert_eq!(s.buffer_next(), 5);
    }

    #[test]
    fn invariants_hold_under_random_events() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut host = Recorder::default();
        let mut s = small(4, 12);

        for _ in 0..2_000 {
            match rng.gen_range(0..3) {
                0 => s.accept(&msg(rng.gen_range(0..100)), &mut host),
                1 => {
                    let acknum = rng.gen_range(0..s.nextseq() + 2);
                    s.on_ack(&Packet::ack(acknum), &mut host);
                }
                _ => {
                    if s.is_timer_running() {
                        s.on_timeout(&mut host);
                    }
                }
            }
            assert!(s.base() <= s.nextseq());
            assert!(s.nextseq() <= s.buffer_next());
            assert!(s.nextseq() - s.base() <= s.window_size());
            assert_eq!(s.is_timer_running(), s.base() < s.nextseq());
        }
    }
}
