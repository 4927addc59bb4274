//! Sliding-window send-side state machine.
//!
//! [`Sender`] keeps up to `window_size` packets in flight.  With a window of
//! one it is the alternating-bit protocol; with a larger window it is
//! Go-Back-N.  The logic is the same in both cases.
//!
//! # Protocol contract
//!
//! - At most `window_size` packets are unacknowledged at once.  A
//!   [`Sender::send`] on a full window is rejected with
//!   [`SendError::WindowFull`]; nothing is queued.
//! - The window slides one packet at a time, and only when an intact ACK
//!   names exactly the oldest outstanding sequence number.
//! - Any NACK (damaged packet, or `acknum != seqnum`) and any timeout
//!   retransmits **every** unacked packet in original order, unchanged.
//! - Any other intact ACK (duplicate, stale, or ahead of the oldest
//!   outstanding packet) changes nothing; the timer alone drives recovery.
//! - One timer covers the whole window.  It is stopped on every arriving
//!   packet and rearmed whenever packets remain outstanding.

use std::collections::VecDeque;

use thiserror::Error;

use crate::checksum::is_ack;
use crate::config::{ArqConfig, ConfigError};
use crate::context::{Context, Entity};
use crate::packet::{Message, Packet};
use crate::seq::SeqSpace;
use crate::timer::RetransmitTimer;

// ---------------------------------------------------------------------------
// SendEntry
// ---------------------------------------------------------------------------

/// A packet occupying one slot of the send window.
#[derive(Debug, Clone, PartialEq)]
pub struct SendEntry {
    /// The packet exactly as first transmitted; retransmissions reuse it.
    pub packet: Packet,
    /// Total number of times this packet has been handed to the channel.
    pub tx_count: u32,
}

// ---------------------------------------------------------------------------
// SenderState
// ---------------------------------------------------------------------------

/// Coarse state of the sender, derived from window occupancy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Nothing in flight.
    Idle,
    /// Some packets in flight, and room for more.
    AwaitingAck,
    /// Every slot is taken; `send` is rejected until an ACK arrives.
    WindowFull,
}

impl std::fmt::Display for SenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Caller misuse reported by [`Sender::send`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SendError {
    #[error("send window full ({window_size} packets in flight)")]
    WindowFull { window_size: usize },
}

// ---------------------------------------------------------------------------
// Sender
// ---------------------------------------------------------------------------

/// Send-side state for one simulation run.
///
/// # Sequence-number layout
///
/// ```text
///  last_ack_received+1     next_frame_to_send
///          │                      │
///  ────────┼──────────────────────┼─────────▶ seq space (mod seqnum_limit)
///          │ <──── unacked ──────▶│
/// ```
#[derive(Debug)]
pub struct Sender {
    space: SeqSpace,
    window_size: usize,

    /// Last sequence number confirmed by an ACK; `None` until the first one.
    last_ack_received: Option<u16>,

    /// Sequence number for the next new packet.
    next_frame_to_send: u16,

    /// In-flight packets in transmission order (front = oldest).
    unacked: VecDeque<SendEntry>,

    timer: RetransmitTimer,

    /// Packets resent because of a NACK or timeout.
    retransmissions: u64,
    /// Timer expiries that found packets outstanding.
    timeouts: u64,
}

impl Sender {
    /// Create a sender, failing fast on an unusable configuration.
    pub fn new(config: &ArqConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            space: SeqSpace::new(config.seqnum_limit)?,
            window_size: config.window_size,
            last_ack_received: None,
            next_frame_to_send: 0,
            unacked: VecDeque::with_capacity(config.window_size),
            timer: RetransmitTimer::new(config.timeout),
            retransmissions: 0,
            timeouts: 0,
        })
    }

    /// `true` when there is room for at least one more packet.
    pub fn can_send(&self) -> bool {
        self.unacked.len() < self.window_size
    }

    /// Number of packets awaiting acknowledgment.
    pub fn in_flight(&self) -> usize {
        self.unacked.len()
    }

    pub fn has_unacked(&self) -> bool {
        !self.unacked.is_empty()
    }

    pub fn state(&self) -> SenderState {
        if self.unacked.is_empty() {
            SenderState::Idle
        } else if self.can_send() {
            SenderState::AwaitingAck
        } else {
            SenderState::WindowFull
        }
    }

    pub fn last_ack_received(&self) -> Option<u16> {
        self.last_ack_received
    }

    pub fn next_frame_to_send(&self) -> u16 {
        self.next_frame_to_send
    }

    /// The ACK number that would slide the window.
    pub fn expected_ack(&self) -> u16 {
        self.last_ack_received.map_or(0, |seq| self.space.next(seq))
    }

    /// Iterate over in-flight packets from oldest to newest.
    pub fn unacked(&self) -> impl Iterator<Item = &SendEntry> {
        self.unacked.iter()
    }

    pub fn timer(&self) -> &RetransmitTimer {
        &self.timer
    }

    pub fn retransmissions(&self) -> u64 {
        self.retransmissions
    }

    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }

    /// Frame `message`, transmit it and place it in the window.
    ///
    /// Returns the sequence number assigned to the packet.
    pub fn send(&mut self, ctx: &mut dyn Context, message: Message) -> Result<u16, SendError> {
        if !self.can_send() {
            log::warn!(
                "[snd] window full ({}/{}); rejecting message",
                self.unacked.len(),
                self.window_size
            );
            return Err(SendError::WindowFull {
                window_size: self.window_size,
            });
        }

        let seq = self.next_frame_to_send;
        let packet = Packet::sealed(seq, seq, *message.data());
        self.next_frame_to_send = self.space.next(seq);
        self.unacked.push_back(SendEntry {
            packet,
            tx_count: 1,
        });

        log::debug!(
            "[snd] → DATA seq={} in_flight={}/{}",
            seq,
            self.unacked.len(),
            self.window_size
        );
        ctx.to_channel(packet);
        self.timer.arm_if_idle(ctx);
        Ok(seq)
    }

    /// Resend every in-flight packet, oldest first, and restart the timer.
    ///
    /// Returns the number of packets resent.
    fn retransmit_window(&mut self, ctx: &mut dyn Context) -> usize {
        if self.unacked.is_empty() {
            return 0;
        }
        for entry in self.unacked.iter_mut() {
            entry.tx_count += 1;
            ctx.to_channel(entry.packet);
        }
        let n = self.unacked.len();
        self.retransmissions += n as u64;
        self.timer.arm(ctx);
        n
    }

    /// Slide the window past the oldest packet and hand its payload up.
    fn slide(&mut self, ctx: &mut dyn Context) {
        if let Some(entry) = self.unacked.pop_front() {
            let seq = entry.packet.seqnum;
            self.last_ack_received = Some(seq);
            log::debug!(
                "[snd] ← ACK {} (slid; {} still in flight)",
                seq,
                self.unacked.len()
            );
            ctx.to_application(Message::new(entry.packet.payload));
        }
    }
}

impl Entity for Sender {
    fn recv(&mut self, ctx: &mut dyn Context, packet: Packet) {
        self.timer.cancel(ctx);

        if !is_ack(&packet) {
            let n = self.retransmit_window(ctx);
            log::debug!(
                "[snd] ← NACK seq={} ack={}; retransmitting {} packet(s)",
                packet.seqnum,
                packet.acknum,
                n
            );
        } else if self.unacked.front().map(|e| e.packet.seqnum) == Some(packet.acknum) {
            self.slide(ctx);
        } else {
            log::trace!(
                "[snd] ← ACK {} ignored (expecting {})",
                packet.acknum,
                self.expected_ack()
            );
        }

        if self.has_unacked() {
            self.timer.arm_if_idle(ctx);
        }
    }

    fn timer_interrupt(&mut self, ctx: &mut dyn Context) {
        self.timer.on_expired();
        if self.unacked.is_empty() {
            log::trace!("[snd] timer fired with nothing in flight");
            return;
        }
        self.timeouts += 1;
        let n = self.retransmit_window(ctx);
        log::debug!("[snd] timeout, retransmitting {} packet(s)", n);
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
