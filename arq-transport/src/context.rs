//! The seam between the protocol entities and whatever drives them.
//!
//! Entities never pick when they run.  A driver (the [`crate::simulator`],
//! or a test harness) calls into an [`Entity`] for each event and hands it a
//! [`Context`] through which the entity reaches the channel, its timer and
//! the application above it.  Each entity gets its own context, so none of
//! the calls need to name the caller.

use crate::packet::{Message, Packet};

/// Simulated time, in the driver's time units.
pub type SimTime = f64;

/// Services an entity may call while handling an event.
pub trait Context {
    /// Current simulated time.
    fn now(&self) -> SimTime;

    /// Arm this entity's one-shot timer `duration` units from now.
    ///
    /// Replaces any pending deadline; there is never more than one.
    fn start_timer(&mut self, duration: SimTime);

    /// Cancel the pending timer.  A no-op when none is pending.
    fn stop_timer(&mut self);

    /// Hand a packet to the unreliable, order-preserving channel.
    fn to_channel(&mut self, packet: Packet);

    /// Deliver a message to the application layer.
    fn to_application(&mut self, message: Message);
}

/// Events every protocol entity reacts to.
pub trait Entity {
    /// A packet arrived from the channel.
    fn recv(&mut self, ctx: &mut dyn Context, packet: Packet);

    /// This entity's timer expired.
    fn timer_interrupt(&mut self, ctx: &mut dyn Context);
}

// ---------------------------------------------------------------------------
// Outbox
// ---------------------------------------------------------------------------

/// One request an entity made of its [`Context`].
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    StartTimer(SimTime),
    StopTimer,
    ToChannel(Packet),
    ToApplication(Message),
}

/// A [`Context`] that records every request instead of acting on it.
///
/// Drivers hand an `Outbox` to the entity, then apply the recorded
/// [`Action`]s in order once the handler returns.
#[derive(Debug, Default)]
pub struct Outbox {
    now: SimTime,
    actions: Vec<Action>,
}

impl Outbox {
    /// An empty outbox whose clock reads `now`.
    pub fn at(now: SimTime) -> Self {
        Self {
            now,
            actions: Vec::new(),
        }
    }

    pub fn set_now(&mut self, now: SimTime) {
        self.now = now;
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    /// Take the recorded actions, leaving the outbox empty.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    /// Packets handed to the channel, in order.
    pub fn sent(&self) -> Vec<Packet> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::ToChannel(p) => Some(*p),
                _ => None,
            })
            .collect()
    }

    /// Messages delivered to the application, in order.
    pub fn delivered(&self) -> Vec<Message> {
        self.actions
            .iter()
            .filter_map(|a| match a {
                Action::ToApplication(m) => Some(*m),
                _ => None,
            })
            .collect()
    }
}

impl Context for Outbox {
    fn now(&self) -> SimTime {
        self.now
    }

    fn start_timer(&mut self, duration: SimTime) {
        self.actions.push(Action::StartTimer(duration));
    }

    fn stop_timer(&mut self) {
        self.actions.push(Action::StopTimer);
    }

    fn to_channel(&mut self, packet: Packet) {
        self.actions.push(Action::ToChannel(packet));
    }

    fn to_application(&mut self, message: Message) {
        self.actions.push(Action::ToApplication(message));
    }
}
