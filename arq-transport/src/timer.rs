//! Retransmission timer bookkeeping.
//!
//! The driver owns the actual clock and fires
//! [`crate::context::Entity::timer_interrupt`].  [`RetransmitTimer`] is the
//! sender's own record of whether a deadline is pending, so the sender can
//! avoid stacking timers and can tell when recovery needs a fresh one.
//!
//! Every arm/cancel goes through this type so the record and the driver's
//! timer never disagree.

use crate::context::{Context, SimTime};

/// Single-deadline retransmission timer.
#[derive(Debug, Clone)]
pub struct RetransmitTimer {
    /// Fixed timeout applied on every arm.
    timeout: SimTime,
    /// Absolute expiry of the pending timer, if any.
    deadline: Option<SimTime>,
}

impl RetransmitTimer {
    pub fn new(timeout: SimTime) -> Self {
        Self {
            timeout,
            deadline: None,
        }
    }

    /// Absolute time at which the pending timer fires, or `None` when idle.
    pub fn deadline(&self) -> Option<SimTime> {
        self.deadline
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// Start (or restart) the timer, replacing any pending deadline.
    pub fn arm(&mut self, ctx: &mut dyn Context) {
        ctx.start_timer(self.timeout);
        self.deadline = Some(ctx.now() + self.timeout);
    }

    /// Start the timer only if none is pending.
    pub fn arm_if_idle(&mut self, ctx: &mut dyn Context) {
        if !self.is_armed() {
            self.arm(ctx);
        }
    }

    /// Cancel the pending timer, if any.
    pub fn cancel(&mut self, ctx: &mut dyn Context) {
        ctx.stop_timer();
        self.deadline = None;
    }

    /// Record that the driver fired the timer.
    pub fn on_expired(&mut self) {
        self.deadline = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{Action, Outbox};

    #[test]
    fn arm_records_deadline() {
        let mut ctx = Outbox::at(5.0);
        let mut t = RetransmitTimer::new(20.0);
        assert!(!t.is_armed());

        t.arm(&mut ctx);
        assert_eq!(t.deadline(), Some(25.0));
        assert_eq!(ctx.actions(), &[Action::StartTimer(20.0)]);
    }

    #[test]
    fn arm_if_idle_does_not_restart() {
        let mut ctx = Outbox::at(0.0);
        let mut t = RetransmitTimer::new(10.0);
        t.arm_if_idle(&mut ctx);
        ctx.set_now(3.0);
        t.arm_if_idle(&mut ctx);

        assert_eq!(ctx.actions().len(), 1);
        assert_eq!(t.deadline(), Some(10.0));
    }

    #[test]
    fn cancel_and_expiry_clear_deadline() {
        let mut ctx = Outbox::default();
        let mut t = RetransmitTimer::new(10.0);

        t.arm(&mut ctx);
        t.cancel(&mut ctx);
        assert!(!t.is_armed());
        assert_eq!(ctx.actions().last(), Some(&Action::StopTimer));

        t.arm(&mut ctx);
        t.on_expired();
        assert!(!t.is_armed());
    }
}
