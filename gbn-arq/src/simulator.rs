//! Discrete-event network simulator for driving the two endpoints.
//!
//! The simulator plays every role outside the endpoints: it generates
//! application messages for A, carries packets across a channel that loses,
//! corrupts and delays them (but never reorders), runs each side's timer, and
//! collects what B delivers.  Time is virtual, so a run is instant and fully
//! reproducible from its seed.
//!
//! | Fault       | Description                                               |
//! |-------------|-----------------------------------------------------------|
//! | Loss        | Drop a packet with probability `loss_prob`.               |
//! | Corruption  | XOR one random byte of the frame with a non-zero mask,    |
//! |             | with probability `corrupt_prob`.                          |
//! | Delay       | Arrive `1 + 9·U(0,1)` units after the later of now and    |
//! |             | the previous arrival in the same direction.               |
//! | Scripted    | Drop or corrupt the n-th packet a side sends.             |
//!
//! Packets cross the channel as encoded frames, so corruption can hit any
//! header field as well as the payload.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ConfigError, ProtocolConfig, TIME_UNIT};
use crate::host::{ReceiverContext, SenderContext};
use crate::message::Message;
use crate::packet::Packet;
use crate::receiver::Receiver;
use crate::sender::Sender;
use crate::stats::{ReceiverStats, SenderStats};

/// One of the two endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    fn idx(self) -> usize {
        match self {
            Side::A => 0,
            Side::B => 1,
        }
    }

    fn peer(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Drop,
    Corrupt,
}

/// A fault applied to one specific packet instead of a random draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScriptedFault {
    /// The side sending the packet.
    pub from: Side,
    /// Zero-based index among the packets `from` has handed to the channel,
    /// retransmissions included.
    pub index: usize,
    pub kind: FaultKind,
}

/// Channel and workload parameters.
///
/// All probabilities are in the range `[0.0, 1.0]`.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Probability that any given packet is silently dropped.
    pub loss_prob: f64,
    /// Probability that a packet which survives is corrupted.
    pub corrupt_prob: f64,
    /// Mean time between application messages.
    pub mean_interval: Duration,
    /// Events scheduled after this instant are not processed.
    pub max_time: Duration,
    pub seed: u64,
    pub faults: Vec<ScriptedFault>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        // No faults by default — a perfect, order-preserving channel.
        Self {
            loss_prob: 0.0,
            corrupt_prob: 0.0,
            mean_interval: TIME_UNIT * 10,
            max_time: TIME_UNIT * 1_000_000,
            seed: 1,
            faults: Vec::new(),
        }
    }
}

impl ChannelConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [("loss", self.loss_prob), ("corruption", self.corrupt_prob)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Probability { name, value });
            }
        }
        Ok(())
    }
}

/// What the channel did to the packets handed to it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStats {
    pub packets_sent: u64,
    pub lost: u64,
    pub corrupted: u64,
}

/// Outcome of [`Simulator::run`].
#[derive(Debug, Clone)]
pub struct SimReport {
    /// Messages B delivered during this run, in delivery order.
    pub delivered: Vec<Message>,
    /// `true` when the event queue drained before `max_time` with every
    /// accepted message acknowledged.
    pub completed: bool,
    /// Virtual time of the last processed event.
    pub finished_at: Duration,
    pub channel: ChannelStats,
    pub sender: SenderStats,
    pub receiver: ReceiverStats,
    pub sender_base: u32,
    /// Whether A's timer was still armed, as seen by the simulator.
    pub timer_running: bool,
}

impl SimReport {
    /// Concatenated payloads of every delivered message.
    pub fn delivered_bytes(&self) -> Vec<u8> {
        self.delivered
            .iter()
            .flat_map(|m| m.as_bytes().iter().copied())
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Event queue
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Event {
    AppMessage(Message),
    Arrival { to: Side, frame: Vec<u8> },
    TimerExpired { side: Side, generation: u64 },
}

#[derive(Debug)]
struct Scheduled {
    at: Duration,
    /// Insertion counter; breaks ties so equal-time events run FIFO.
    order: u64,
    event: Event,
}

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.at == other.at && self.order == other.order
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    // Reversed: BinaryHeap is a max-heap and the earliest event must pop first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .at
            .cmp(&self.at)
            .then_with(|| other.order.cmp(&self.order))
    }
}

#[derive(Debug, Default)]
struct TimerSlot {
    generation: u64,
    armed: bool,
}

// ---------------------------------------------------------------------------
// World: everything except the endpoints
// ---------------------------------------------------------------------------

struct World {
    now: Duration,
    rng: StdRng,
    queue: BinaryHeap<Scheduled>,
    next_order: u64,
    channel: ChannelConfig,
    /// Latest scheduled arrival per destination side.
    last_arrival: [Duration; 2],
    /// Packets handed to the channel per sending side.
    sent_count: [usize; 2],
    timers: [TimerSlot; 2],
    delivered: Vec<Message>,
    stats: ChannelStats,
}

impl World {
    fn new(channel: ChannelConfig) -> Self {
        Self {
            now: Duration::ZERO,
            rng: StdRng::seed_from_u64(channel.seed),
            queue: BinaryHeap::new(),
            next_order: 0,
            channel,
            last_arrival: [Duration::ZERO; 2],
            sent_count: [0; 2],
            timers: Default::default(),
            delivered: Vec::new(),
            stats: ChannelStats::default(),
        }
    }

    fn schedule(&mut self, at: Duration, event: Event) {
        self.queue.push(Scheduled {
            at,
            order: self.next_order,
            event,
        });
        self.next_order += 1;
    }

    fn next_interval(&mut self) -> Duration {
        self.channel
            .mean_interval
            .mul_f64(2.0 * self.rng.gen::<f64>())
    }

    fn transmit(&mut self, from: Side, packet: Packet) {
        let index = self.sent_count[from.idx()];
        self.sent_count[from.idx()] += 1;
        self.stats.packets_sent += 1;

        let scripted = self
            .channel
            .faults
            .iter()
            .find(|f| f.from == from && f.index == index)
            .map(|f| f.kind);

        let lost = match scripted {
            Some(kind) => kind == FaultKind::Drop,
            None => self.rng.gen_bool(self.channel.loss_prob),
        };
        if lost {
            log::debug!("[sim] {from:?} packet #{index} lost");
            self.stats.lost += 1;
            return;
        }

        let mut frame = packet.encode();
        let corrupt = match scripted {
            Some(kind) => kind == FaultKind::Corrupt,
            None => self.rng.gen_bool(self.channel.corrupt_prob),
        };
        if corrupt {
            let at = self.rng.gen_range(0..frame.len());
            let mask: u8 = self.rng.gen_range(1..=255);
            frame[at] ^= mask;
            log::debug!("[sim] {from:?} packet #{index} corrupted at byte {at}");
            self.stats.corrupted += 1;
        }

        let to = from.peer();
        let delay = TIME_UNIT.mul_f64(1.0 + 9.0 * self.rng.gen::<f64>());
        let at = self.now.max(self.last_arrival[to.idx()]) + delay;
        self.last_arrival[to.idx()] = at;
        self.schedule(at, Event::Arrival { to, frame });
    }

    fn start_timer(&mut self, side: Side, duration: Duration) {
        let slot = &mut self.timers[side.idx()];
        if slot.armed {
            log::warn!("[sim] {side:?} started a timer that is already running; re-arming");
        }
        slot.generation += 1;
        slot.armed = true;
        let generation = slot.generation;
        self.schedule(self.now + duration, Event::TimerExpired { side, generation });
    }

    fn stop_timer(&mut self, side: Side) {
        let slot = &mut self.timers[side.idx()];
        if !slot.armed {
            log::warn!("[sim] {side:?} stopped a timer that is not running");
        }
        slot.generation += 1;
        slot.armed = false;
    }

    /// `true` if the expiry belongs to the currently armed timer.
    fn fire_timer(&mut self, side: Side, generation: u64) -> bool {
        let slot = &mut self.timers[side.idx()];
        if slot.armed && slot.generation == generation {
            slot.armed = false;
            true
        } else {
            false
        }
    }

    fn host(&mut self, side: Side) -> Host<'_> {
        Host { world: self, side }
    }
}

/// One side's view of the world, handed to that side's handlers.
struct Host<'a> {
    world: &'a mut World,
    side: Side,
}

impl SenderContext for Host<'_> {
    fn send_to_channel(&mut self, packet: Packet) {
        self.world.transmit(self.side, packet);
    }

    fn start_timer(&mut self, duration: Duration) {
        self.world.start_timer(self.side, duration);
    }

    fn stop_timer(&mut self) {
        self.world.stop_timer(self.side);
    }
}

impl ReceiverContext for Host<'_> {
    fn send_to_channel(&mut self, packet: Packet) {
        self.world.transmit(self.side, packet);
    }

    fn deliver_to_application(&mut self, message: Message) {
        self.world.delivered.push(message);
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// A sender and a receiver wired together through a simulated channel.
pub struct Simulator {
    sender: Sender,
    receiver: Receiver,
    world: World,
}

impl Simulator {
    pub fn new(protocol: &ProtocolConfig, channel: ChannelConfig) -> Result<Self, ConfigError> {
        protocol.validate()?;
        channel.validate()?;
        Ok(Self {
            sender: Sender::new(protocol),
            receiver: Receiver::new(),
            world: World::new(channel),
        })
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn now(&self) -> Duration {
        self.world.now
    }

    /// Feed `messages` to A at random intervals and run until the channel
    /// goes quiet or `max_time` is reached.
    pub fn run<I>(&mut self, messages: I) -> SimReport
    where
        I: IntoIterator<Item = Message>,
    {
        let mut at = self.world.now;
        let mut scheduled = 0usize;
        for message in messages {
            at += self.world.next_interval();
            self.world.schedule(at, Event::AppMessage(message));
            scheduled += 1;
        }
        let delivered_before = self.world.delivered.len();
        log::info!("[sim] running {scheduled} messages from t={:?}", self.world.now);

        let mut truncated = false;
        loop {
            match self.world.queue.peek() {
                None => break,
                Some(next) if next.at > self.world.channel.max_time => {
                    truncated = true;
                    break;
                }
                Some(_) => {}
            }
            let Some(Scheduled { at, event, .. }) = self.world.queue.pop() else {
                break;
            };
            self.world.now = at;
            self.dispatch(event);
        }

        let report = SimReport {
            delivered: self.world.delivered[delivered_before..].to_vec(),
            completed: !truncated && self.sender.is_idle(),
            finished_at: self.world.now,
            channel: self.world.stats,
            sender: *self.sender.stats(),
            receiver: *self.receiver.stats(),
            sender_base: self.sender.base(),
            timer_running: self.world.timers[Side::A.idx()].armed,
        };
        if truncated {
            log::warn!(
                "[sim] stopped at t={:?} with {} packets in flight",
                report.finished_at,
                self.sender.in_flight()
            );
        }
        log::info!(
            "[sim] delivered {}/{} messages by t={:?} ({} sent, {} lost, {} corrupted)",
            report.delivered.len(),
            scheduled,
            report.finished_at,
            report.channel.packets_sent,
            report.channel.lost,
            report.channel.corrupted
        );
        report
    }

    fn dispatch(&mut self, event: Event) {
        match event {
            Event::AppMessage(message) => {
                self.sender.accept(&message, &mut self.world.host(Side::A));
            }
            Event::Arrival { to, frame } => {
                let packet = match Packet::decode(&frame) {
                    Ok(packet) => packet,
                    Err(e) => {
                        log::error!("[sim] dropping undecodable frame for {to:?}: {e}");
                        return;
                    }
                };
                match to {
                    Side::A => self.sender.on_ack(&packet, &mut self.world.host(Side::A)),
                    Side::B => self
                        .receiver
                        .on_receive(&packet, &mut self.world.host(Side::B)),
                }
            }
            Event::TimerExpired { side, generation } => {
                if !self.world.fire_timer(side, generation) {
                    // cancelled or superseded
                    return;
                }
                match side {
                    Side::A => self.sender.on_timeout(&mut self.world.host(Side::A)),
                    Side::B => self.receiver.on_timeout(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(n: usize) -> Vec<Message> {
        (0..n)
            .map(|i| Message::new(format!("m{i}").as_bytes()).unwrap())
            .collect()
    }

    #[test]
    fn events_pop_in_time_then_insertion_order() {
        let mut w = World::new(ChannelConfig::default());
        w.schedule(TIME_UNIT * 5, Event::TimerExpired { side: Side::A, generation: 1 });
        w.schedule(TIME_UNIT * 2, Event::TimerExpired { side: Side::A, generation: 2 });
        w.schedule(TIME_UNIT * 5, Event::TimerExpired { side: Side::A, generation: 3 });

        let order: Vec<u64> = std::iter::from_fn(|| w.queue.pop())
            .map(|s| match s.event {
                Event::TimerExpired { generation, .. } => generation,
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(order, vec![2, 1, 3]);
    }

    #[test]
    fn stopped_timer_does_not_fire() {
        let mut w = World::new(ChannelConfig::default());
        w.start_timer(Side::A, TIME_UNIT * 15);
        let first = w.timers[0].generation;
        w.stop_timer(Side::A);
        assert!(!w.fire_timer(Side::A, first));

        w.start_timer(Side::A, TIME_UNIT * 15);
        let second = w.timers[0].generation;
        assert!(w.fire_timer(Side::A, second));
        assert!(!w.fire_timer(Side::A, second));
    }

    #[test]
    fn channel_preserves_order() {
        let mut w = World::new(ChannelConfig::default());
        for seq in 1..=20 {
            w.transmit(Side::A, Packet::ack(seq));
        }
        let mut last = Duration::ZERO;
        let mut acks = Vec::new();
        while let Some(s) = w.queue.pop() {
            assert!(s.at > last);
            last = s.at;
            if let Event::Arrival { to, frame } = s.event {
                assert_eq!(to, Side::B);
                acks.push(Packet::decode(&frame).unwrap().acknum);
            }
        }
        assert_eq!(acks, (1..=20).collect::<Vec<_>>());
    }

    #[test]
    fn scripted_faults_hit_the_indexed_packet() {
        let mut w = World::new(ChannelConfig {
            faults: vec![
                ScriptedFault { from: Side::B, index: 1, kind: FaultKind::Drop },
                ScriptedFault { from: Side::B, index: 2, kind: FaultKind::Corrupt },
            ],
            ..Default::default()
        });
        for acknum in 0..4 {
            w.transmit(Side::B, Packet::ack(acknum));
        }
        let arrived: Vec<Packet> = std::iter::from_fn(|| w.queue.pop())
            .filter_map(|s| match s.event {
                Event::Arrival { frame, .. } => Packet::decode(&frame).ok(),
                _ => None,
            })
            .collect();

        assert_eq!(arrived.len(), 3);
        assert!(arrived[0].is_valid());
        assert!(!arrived[1].is_valid());
        assert!(arrived[2].is_valid());
        assert_eq!(w.stats, ChannelStats { packets_sent: 4, lost: 1, corrupted: 1 });
    }

    #[test]
    fn invalid_probability_rejected() {
        let channel = ChannelConfig {
            loss_prob: 1.5,
            ..Default::default()
        };
        assert!(matches!(
            Simulator::new(&ProtocolConfig::default(), channel),
            Err(ConfigError::Probability { name: "loss", .. })
        ));
    }

    #[test]
    fn same_seed_same_run() {
        let channel = ChannelConfig {
            loss_prob: 0.3,
            corrupt_prob: 0.2,
            seed: 99,
            ..Default::default()
        };
        let run = |c: ChannelConfig| {
            let mut sim = Simulator::new(&ProtocolConfig::default(), c).unwrap();
            let r = sim.run(messages(30));
            (r.finished_at, r.channel, r.sender)
        };
        assert_eq!(run(channel.clone()), run(channel));
    }

    #[test]
    fn total_loss_stops_at_max_time() {
        let channel = ChannelConfig {
            loss_prob: 1.0,
            max_time: TIME_UNIT * 500,
            ..Default::default()
        };
        let mut sim = Simulator::new(&ProtocolConfig::default(), channel).unwrap();
        let report = sim.run(messages(3));

        assert!(!report.completed);
        assert!(report.delivered.is_empty());
        assert!(report.finished_at <= TIME_UNIT * 500);
        assert!(report.timer_running);
        assert!(sim.now() <= TIME_UNIT * 500);
    }
}
