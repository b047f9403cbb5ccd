//! Protocol parameters.
//!
//! Time is virtual: one protocol time unit is one millisecond of simulated
//! time, so the default retransmission timeout of 15 units is
//! `Duration::from_millis(15)`.

use std::time::Duration;

use thiserror::Error;

/// One protocol time unit of simulated time.
pub const TIME_UNIT: Duration = Duration::from_millis(1);

/// Default number of packets allowed in flight.
pub const DEFAULT_WINDOW_SIZE: u32 = 8;

/// Default retransmission timeout (15 time units).
pub const DEFAULT_TIMER_DURATION: Duration = Duration::from_millis(15);

/// Default number of slots in the sender's packet ring.
pub const DEFAULT_BUFFER_CAPACITY: u32 = 1000;

/// Sender-side protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolConfig {
    /// Maximum number of packets in flight (N).
    pub window_size: u32,
    /// Retransmission timeout armed whenever the window becomes non-empty.
    pub timer_duration: Duration,
    /// Slots in the packet ring.  Must be larger than the window so that
    /// accepted-but-unsent messages can queue behind it.
    pub buffer_capacity: u32,
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            timer_duration: DEFAULT_TIMER_DURATION,
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

impl ProtocolConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        if self.buffer_capacity <= self.window_size {
            return Err(ConfigError::BufferTooSmall {
                capacity: self.buffer_capacity,
                window: self.window_size,
            });
        }
        if self.timer_duration.is_zero() {
            return Err(ConfigError::ZeroTimer);
        }
        Ok(())
    }
}

/// Invalid protocol or channel parameters.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window size must be at least 1")]
    ZeroWindow,

    #[error("buffer capacity {capacity} must exceed the window size {window}")]
    BufferTooSmall { capacity: u32, window: u32 },

    #[error("retransmission timeout must be non-zero")]
    ZeroTimer,

    #[error("{name} probability {value} is outside [0, 1]")]
    Probability { name: &'static str, value: f64 },
}
