//! Discrete-event network simulator.
//!
//! Drives one [`Sender`] / [`Receiver`] pair over a channel that applies a
//! configurable fault model:
//!
//! | Fault       | Description                                               |
//! |-------------|-----------------------------------------------------------|
//! | Loss        | Drop a packet with probability `loss_prob`.               |
//! | Corruption  | With probability `corrupt_prob`, damage the payload (75%) |
//! |             | or overwrite the seqnum / acknum (12.5% each).            |
//! | Delay       | `1 + 9·U(0,1)` time units after the previous packet in    |
//! |             | the same direction, so delivery order is preserved.       |
//!
//! Above the sender, an application produces [`MSG_SIZE`]-byte messages
//! (`aaaa…`, `bbbb…`, …) at uniformly random intervals with mean
//! `avg_interarrival`.  Each side has one timer; arming it replaces the
//! pending deadline.
//!
//! All randomness comes from a seeded [`StdRng`], so a run is fully
//! reproducible from its [`SimConfig`].

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::{ArqConfig, ConfigError};
use crate::context::{Action, Entity, Outbox, SimTime};
use crate::packet::{Message, Packet, MSG_SIZE};
use crate::receiver::Receiver;
use crate::sender::Sender;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Parameters of one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub arq: ArqConfig,
    /// Number of messages the application generates.
    pub num_msgs: u64,
    /// Probability that a packet is lost.
    pub loss_prob: f64,
    /// Probability that a delivered packet is corrupted.
    pub corrupt_prob: f64,
    /// Mean time between messages from the application.
    pub avg_interarrival: SimTime,
    pub seed: u64,
    /// Events scheduled after this time are not processed.
    pub max_time: SimTime,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            arq: ArqConfig::default(),
            num_msgs: 10,
            loss_prob: 0.0,
            corrupt_prob: 0.0,
            avg_interarrival: 1000.0,
            seed: 1234,
            max_time: 1.0e7,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.arq.validate()?;
        for (name, value) in [
            ("loss_prob", self.loss_prob),
            ("corrupt_prob", self.corrupt_prob),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidProbability { name, value });
            }
        }
        if !(self.avg_interarrival.is_finite() && self.avg_interarrival > 0.0) {
            return Err(ConfigError::InvalidInterarrival(self.avg_interarrival));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// The two protocol entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Sender,
    Receiver,
}

impl Side {
    fn index(self) -> usize {
        match self {
            Side::Sender => 0,
            Side::Receiver => 1,
        }
    }

    pub fn peer(self) -> Side {
        match self {
            Side::Sender => Side::Receiver,
            Side::Receiver => Side::Sender,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum EventKind {
    FromApplication,
    FromChannel { to: Side, packet: Packet },
    TimerInterrupt { side: Side, generation: u64 },
}

#[derive(Debug, Clone, PartialEq)]
struct Event {
    time: SimTime,
    /// Insertion counter; breaks ties so equal-time events run FIFO.
    order: u64,
    kind: EventKind,
}

impl Eq for Event {}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; reverse for earliest-first.
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.order.cmp(&self.order))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Counters and deliveries collected over one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimReport {
    /// Messages produced by the application.
    pub generated: u64,
    /// Messages the sender refused because its window was full.
    pub rejected: u64,
    /// Messages the sender accepted, in order.
    pub accepted: Vec<Message>,
    /// Messages handed to the receiving application, in order.
    pub delivered: Vec<Message>,
    /// Messages the sender saw acknowledged.
    pub acked: u64,
    /// Packets put on the channel by the sender (including retransmissions).
    pub sender_packets: u64,
    /// Packets put on the channel by the receiver.
    pub receiver_packets: u64,
    pub lost: u64,
    pub corrupted: u64,
    pub retransmissions: u64,
    pub timeouts: u64,
    /// Time of the last processed event.
    pub end_time: SimTime,
    /// `true` if the run hit `max_time` with events still pending.
    pub truncated: bool,
}

impl SimReport {
    /// Every accepted message was delivered exactly once, in order, and
    /// acknowledged back to the sender.
    pub fn is_complete(&self) -> bool {
        !self.truncated
            && self.delivered == self.accepted
            && self.acked == self.accepted.len() as u64
    }
}

// ---------------------------------------------------------------------------
// Simulator
// ---------------------------------------------------------------------------

/// One simulation run.  Construct a fresh one per run; nothing is shared.
pub struct Simulator {
    config: SimConfig,
    sender: Sender,
    receiver: Receiver,

    queue: BinaryHeap<Event>,
    next_order: u64,
    time: SimTime,
    rng: StdRng,

    /// Generation of each side's pending timer, if any.
    timers: [Option<u64>; 2],
    timer_generation: u64,
    /// Latest scheduled arrival on the channel towards each side.
    last_arrival: [SimTime; 2],

    report: SimReport,
}

impl Simulator {
    pub fn new(config: SimConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let sender = Sender::new(&config.arq)?;
        let receiver = Receiver::new(config.arq.seqnum_limit)?;
        let rng = StdRng::seed_from_u64(config.seed);

        let mut sim = Self {
            config,
            sender,
            receiver,
            queue: BinaryHeap::new(),
            next_order: 0,
            time: 0.0,
            rng,
            timers: [None; 2],
            timer_generation: 0,
            last_arrival: [0.0; 2],
            report: SimReport::default(),
        };
        if sim.config.num_msgs > 0 {
            sim.schedule_app_message();
        }
        Ok(sim)
    }

    pub fn now(&self) -> SimTime {
        self.time
    }

    pub fn sender(&self) -> &Sender {
        &self.sender
    }

    pub fn receiver(&self) -> &Receiver {
        &self.receiver
    }

    pub fn report(&self) -> &SimReport {
        &self.report
    }

    /// Run until no events remain (or `max_time` is reached).
    pub fn run(mut self) -> SimReport {
        log::info!(
            "[sim] start: {} msgs, loss={}, corrupt={}, window={}, seqnum_limit={}",
            self.config.num_msgs,
            self.config.loss_prob,
            self.config.corrupt_prob,
            self.config.arq.window_size,
            self.config.arq.seqnum_limit
        );
        while self.step() {}
        self.report.retransmissions = self.sender.retransmissions();
        self.report.timeouts = self.sender.timeouts();
        log::info!(
            "[sim] done at t={:.3}: {} delivered, {} rejected",
            self.report.end_time,
            self.report.delivered.len(),
            self.report.rejected
        );
        self.report
    }

    /// Process the next event.  Returns `false` once the run is over.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.queue.pop() else {
            return false;
        };
        if let EventKind::TimerInterrupt { side, generation } = event.kind {
            if self.timers[side.index()] != Some(generation) {
                // Superseded or stopped.
                return true;
            }
        }
        if event.time > self.config.max_time {
            log::warn!("[sim] reached max_time {}; stopping", self.config.max_time);
            self.report.truncated = true;
            self.queue.clear();
            return false;
        }
        self.time = event.time;

        match event.kind {
            EventKind::FromApplication => {
                self.report.end_time = self.time;
                self.on_app_message();
            }
            EventKind::FromChannel { to, packet } => {
                self.report.end_time = self.time;
                log::trace!("[sim] t={:.3} {:?} ← {}", self.time, to, packet);
                let mut out = Outbox::at(self.time);
                match to {
                    Side::Sender => self.sender.recv(&mut out, packet),
                    Side::Receiver => self.receiver.recv(&mut out, packet),
                }
                self.apply(to, out.drain());
            }
            EventKind::TimerInterrupt { side, .. } => {
                self.report.end_time = self.time;
                self.timers[side.index()] = None;
                log::trace!("[sim] t={:.3} {:?} timer fired", self.time, side);
                let mut out = Outbox::at(self.time);
                match side {
                    Side::Sender => self.sender.timer_interrupt(&mut out),
                    Side::Receiver => self.receiver.timer_interrupt(&mut out),
                }
                self.apply(side, out.drain());
            }
        }
        true
    }

    fn push(&mut self, time: SimTime, kind: EventKind) {
        let order = self.next_order;
        self.next_order += 1;
        self.queue.push(Event { time, order, kind });
    }

    fn schedule_app_message(&mut self) {
        let gap = self.config.avg_interarrival * 2.0 * self.rng.random::<f64>();
        self.push(self.time + gap, EventKind::FromApplication);
    }

    fn on_app_message(&mut self) {
        let letter = b'a' + (self.report.generated % 26) as u8;
        let message = Message::new([letter; MSG_SIZE]);
        self.report.generated += 1;
        if self.report.generated < self.config.num_msgs {
            self.schedule_app_message();
        }

        let mut out = Outbox::at(self.time);
        match self.sender.send(&mut out, message) {
            Ok(seq) => {
                log::debug!("[sim] t={:.3} app → {} as seq {}", self.time, message, seq);
                self.report.accepted.push(message);
            }
            Err(e) => {
                log::info!("[sim] t={:.3} app message dropped: {}", self.time, e);
                self.report.rejected += 1;
            }
        }
        self.apply(Side::Sender, out.drain());
    }

    /// Carry out what an entity asked for while handling an event.
    fn apply(&mut self, side: Side, actions: Vec<Action>) {
        for action in actions {
            match action {
                Action::StartTimer(duration) => {
                    self.timer_generation += 1;
                    let generation = self.timer_generation;
                    self.timers[side.index()] = Some(generation);
                    self.push(
                        self.time + duration,
                        EventKind::TimerInterrupt { side, generation },
                    );
                }
                Action::StopTimer => self.timers[side.index()] = None,
                Action::ToChannel(packet) => self.transmit(side, packet),
                Action::ToApplication(message) => match side {
                    Side::Receiver => self.report.delivered.push(message),
                    Side::Sender => self.report.acked += 1,
                },
            }
        }
    }

    /// Put `packet` on the channel from `from` towards its peer.
    fn transmit(&mut self, from: Side, mut packet: Packet) {
        match from {
            Side::Sender => self.report.sender_packets += 1,
            Side::Receiver => self.report.receiver_packets += 1,
        }

        if self.rng.random::<f64>() < self.config.loss_prob {
            self.report.lost += 1;
            log::debug!("[sim] t={:.3} lost {}", self.time, packet);
            return;
        }

        if self.rng.random::<f64>() < self.config.corrupt_prob {
            self.report.corrupted += 1;
            let x = self.rng.random::<f64>();
            if x < 0.75 {
                packet.payload[0] = b'Z';
            } else if x < 0.875 {
                packet.seqnum = u16::MAX;
            } else {
                packet.acknum = u16::MAX;
            }
            log::debug!("[sim] t={:.3} corrupted → {}", self.time, packet);
        }

        let to = from.peer();
        let base = self.last_arrival[to.index()].max(self.time);
        let arrival = base + 1.0 + 9.0 * self.rng.random::<f64>();
        self.last_arrival[to.index()] = arrival;
        self.push(arrival, EventKind::FromChannel { to, packet });
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
