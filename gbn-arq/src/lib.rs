//! `gbn-arq` — Go-Back-N reliable data transfer between two endpoints.
//!
//! # Architecture
//!
//! ```text
//!  application                                        application
//!      │ accept(msg)                                        ▲ deliver
//!  ┌───▼──────┐   data packets    ┌────────────┐      ┌─────┴────┐
//!  │ Sender A │──────────────────▶│  channel   │─────▶│ Receiver │
//!  │ window,  │                   │ (lossy,    │      │    B     │
//!  │ timer,   │◀──────────────────│  in-order) │◀─────│ cumul.   │
//!  │ ring     │  cumulative ACKs  └────────────┘      │ ACKs     │
//!  └──────────┘                                       └──────────┘
//! ```
//!
//! The endpoints share no state.  Each one is driven by its host through plain
//! method calls and talks back through a context trait ([`host`]); anything
//! that crosses from A to B travels by value inside a [`packet::Packet`].
//!
//! Each module has a single responsibility:
//! - [`packet`]     — packet layout, additive checksum, wire format
//! - [`message`]    — application messages with an explicit length
//! - [`ring`]       — the sender's fixed-capacity packet buffer
//! - [`timer`]      — the sender's single retransmission timer
//! - [`sender`]     — GBN send-side state machine (A)
//! - [`receiver`]   — GBN receive-side state machine (B)
//! - [`host`]       — callbacks the endpoints issue to their host
//! - [`config`]     — protocol parameters
//! - [`error`]      — locally handled rejections
//! - [`stats`]      — per-endpoint counters
//! - [`simulator`]  — discrete-event lossy channel for driving both sides

pub mod config;
pub mod error;
pub mod host;
pub mod message;
pub mod packet;
pub mod receiver;
pub mod ring;
pub mod sender;
pub mod simulator;
pub mod stats;
pub mod timer;

pub use config::{ConfigError, ProtocolConfig};
pub use message::{Message, MessageError};
pub use packet::{Packet, PacketError, PAYLOAD_LEN};
pub use receiver::Receiver;
pub use sender::Sender;
pub use simulator::{ChannelConfig, SimReport, Simulator};
