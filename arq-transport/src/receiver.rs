//! Receive-side state machine.
//!
//! [`Receiver`] holds a single counter, the last sequence number it
//! delivered.  For every arriving packet:
//!
//! - **Damaged** (bad checksum, or a seqnum outside the space): reply with a
//!   NACK, i.e. a packet whose `acknum` differs from its `seqnum`.  Nothing
//!   is delivered.
//! - **Expected** (`seqnum == last + 1`): deliver the payload upward, advance
//!   the counter, reply with an ACK for that seqnum.
//! - **Anything else** (duplicate or ahead of a gap): discard the payload but
//!   still ACK the seqnum that arrived.  The sender only slides on the ACK it
//!   is waiting for, so acking everything is safe and lets bulk
//!   retransmission converge.
//!
//! Replies echo the arriving payload unexamined.

use crate::checksum::verify;
use crate::config::ConfigError;
use crate::context::{Context, Entity};
use crate::packet::{Message, Packet};
use crate::seq::SeqSpace;

/// What the receiver did with one arriving packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecvOutcome {
    /// In order: delivered and acknowledged.
    Delivered(u16),
    /// Intact but not the expected seqnum: acknowledged only.
    Duplicate(u16),
    /// Damaged: answered with a NACK.
    Corrupt(u16),
}

/// Receive-side state for one simulation run.
#[derive(Debug)]
pub struct Receiver {
    space: SeqSpace,
    /// Last sequence number delivered upward; `None` until the first one.
    last_frame_received: Option<u16>,
}

impl Receiver {
    pub fn new(seqnum_limit: u16) -> Result<Self, ConfigError> {
        Ok(Self {
            space: SeqSpace::new(seqnum_limit)?,
            last_frame_received: None,
        })
    }

    pub fn last_frame_received(&self) -> Option<u16> {
        self.last_frame_received
    }

    /// Sequence number the receiver will deliver next.
    pub fn expected(&self) -> u16 {
        self.last_frame_received
            .map_or(0, |seq| self.space.next(seq))
    }

    /// Handle one packet and report what happened.
    pub fn handle(&mut self, ctx: &mut dyn Context, packet: Packet) -> RecvOutcome {
        if !verify(&packet) || !self.space.contains(packet.seqnum) {
            let nack = self.nack_for(&packet);
            log::debug!(
                "[rcv] damaged packet seq={}; → NACK ack={}",
                packet.seqnum,
                nack.acknum
            );
            ctx.to_channel(nack);
            RecvOutcome::Corrupt(nack.seqnum)
        } else {
            let seq = packet.seqnum;
            let outcome = if seq == self.expected() {
                ctx.to_application(Message::new(packet.payload));
                self.last_frame_received = Some(seq);
                log::debug!("[rcv] ← DATA seq={} delivered", seq);
                RecvOutcome::Delivered(seq)
            } else {
                log::debug!(
                    "[rcv] ← DATA seq={} discarded (expecting {})",
                    seq,
                    self.expected()
                );
                RecvOutcome::Duplicate(seq)
            };
            ctx.to_channel(Packet::sealed(seq, seq, packet.payload));
            outcome
        }
    }

    /// Build the NACK answering a damaged packet.
    ///
    /// The seqnum is echoed (reduced into the space, since the damage may
    /// have pushed it out of range).  The acknum is the seqnum's predecessor,
    /// or `1` when the seqnum is `0`, so it can never equal the seqnum.
    fn nack_for(&self, packet: &Packet) -> Packet {
        let seq = self.space.wrap(packet.seqnum);
        let fraud = if seq == 0 { 1 } else { self.space.prev(seq) };
        Packet::sealed(seq, fraud, packet.payload)
    }
}

impl Entity for Receiver {
    fn recv(&mut self, ctx: &mut dyn Context, packet: Packet) {
        self.handle(ctx, packet);
    }

    /// The receiver never arms a timer.
    fn timer_interrupt(&mut self, _ctx: &mut dyn Context) {}
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
