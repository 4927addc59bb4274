//! `arq-transport` — sliding-window ARQ over a simulated unreliable channel.
//!
//! # Architecture
//!
//! ```text
//!  application                              application
//!      │ send(msg)                              ▲ to_application
//!  ┌───▼──────┐   data packets     ┌──────────┐ │
//!  │  Sender  │───────────────────▶│ Receiver │─┘
//!  └───▲──────┘                    └────┬─────┘
//!      │          ACK / NACK            │
//!      └────────────────────────────────┘
//!            (lossy, corrupting, order-preserving channel)
//! ```
//!
//! One engine covers both classic variants: a window of one is the
//! alternating-bit protocol, a window of N is Go-Back-N.
//!
//! Each module has a single responsibility:
//! - [`packet`]     — `Message` / `Packet` data model and wire codec
//! - [`checksum`]   — 16-bit one's-complement checksum and the ACK test
//! - [`seq`]        — modular sequence-number arithmetic
//! - [`config`]     — protocol parameters and their validation
//! - [`context`]    — the seam to the driver (channel, timer, application)
//! - [`timer`]      — the sender's single retransmission deadline
//! - [`sender`]     — send-side window state machine
//! - [`receiver`]   — receive-side state machine
//! - [`simulator`]  — discrete-event driver with a lossy channel

pub mod checksum;
pub mod config;
pub mod context;
pub mod packet;
pub mod receiver;
pub mod sender;
pub mod seq;
pub mod simulator;
pub mod timer;

pub use config::{ArqConfig, ConfigError};
pub use context::{Context, Entity, Outbox, SimTime};
pub use packet::{Message, Packet, MSG_SIZE};
pub use receiver::{Receiver, RecvOutcome};
pub use sender::{SendError, Sender, SenderState};
pub use simulator::{SimConfig, SimReport, Simulator};
