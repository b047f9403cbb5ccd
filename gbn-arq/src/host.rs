//! Callbacks the endpoints issue to whatever hosts them.
//!
//! The endpoints never touch a channel, a clock or the application directly.
//! Each handler takes a host context and calls back into it; the simulator
//! implements these traits, and so do the recording hosts in the unit tests.

use std::time::Duration;

use crate::message::Message;
use crate::packet::Packet;

/// Outbound calls made by the sender (A).
pub trait SenderContext {
    // Hand a packet to the channel towards B.
    fn send_to_channel(&mut self, packet: Packet);

    // Arm the sender's retransmission timer.
    fn start_timer(&mut self, duration: Duration);

    // Cancel the sender's retransmission timer.
    fn stop_timer(&mut self);
}

/// Outbound calls made by the receiver (B).
pub trait ReceiverContext {
    // Hand a packet to the channel towards A.
    fn send_to_channel(&mut self, packet: Packet);

    // Pass an in-order, validated message up to the application.
    fn deliver_to_application(&mut self, message: Message);
}
