//! The sender's single retransmission timer.
//!
//! The countdown itself runs in the host; [`RetransmitTimer`] only tracks
//! whether the host currently has it armed, so the sender can keep the rule
//! "timer running ⇔ packets in flight" and never arm it twice.
//!
//! The timeout is fixed for the lifetime of the sender: there is no RTT
//! sampling and no back-off.

use std::time::Duration;

use crate::host::SenderContext;

#[derive(Debug)]
pub struct RetransmitTimer {
    duration: Duration,
    running: bool,
}

impl RetransmitTimer {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            running: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Arm the host timer.  A no-op if it is already armed.
    pub fn start<C: SenderContext>(&mut self, ctx: &mut C) {
        if self.running {
            log::warn!("[A] timer start requested while already running; ignored");
            return;
        }
        ctx.start_timer(self.duration);
        self.running = true;
    }

    /// Cancel the host timer if it is armed.
    pub fn stop<C: SenderContext>(&mut self, ctx: &mut C) {
        if self.running {
            ctx.stop_timer();
            self.running = false;
        }
    }

    /// Cancel and re-arm, giving the oldest packet a fresh timeout.
    pub fn restart<C: SenderContext>(&mut self, ctx: &mut C) {
        self.stop(ctx);
        self.start(ctx);
    }

    /// Record that the host timer fired.  Returns `false` for an expiry that
    /// arrives while the timer is not armed.
    pub fn expired(&mut self) -> bool {
        std::mem::replace(&mut self.running, false)
    }
}
