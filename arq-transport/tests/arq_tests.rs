//! Integration tests for the sender/receiver pair.
//!
//! The entities are driven by hand through a tiny in-process link: two FIFO
//! queues (one per direction) and an optional drop filter on the data path.
//! The sender's timer is fired only when both queues are empty, which is
//! the moment a real timeout would be the only thing left to happen.

use std::collections::VecDeque;

use arq_transport::checksum::{is_ack, verify};
use arq_transport::context::Action;
use arq_transport::{
    ArqConfig, ConfigError, Entity, Message, Outbox, Packet, Receiver, SendError, Sender,
    SenderState, MSG_SIZE,
};

fn msg(c: u8) -> Message {
    Message::new([c; MSG_SIZE])
}

fn gbn_8_4() -> ArqConfig {
    ArqConfig {
        seqnum_limit: 8,
        window_size: 4,
        timeout: 40.0,
    }
}

// ---------------------------------------------------------------------------
// Link helper
// ---------------------------------------------------------------------------

struct Link {
    sender: Sender,
    receiver: Receiver,
    to_receiver: VecDeque<Packet>,
    to_sender: VecDeque<Packet>,
    delivered: Vec<Message>,
    acked: Vec<Message>,
    /// Data transmissions seen so far (first sends and retransmissions).
    data_tx: usize,
    /// Indices (into the data transmission count) that the channel drops.
    drop_data: Vec<usize>,
    timer_fires: usize,
}

impl Link {
    fn new(config: &ArqConfig) -> Self {
        Self {
            sender: Sender::new(config).unwrap(),
            receiver: Receiver::new(config.seqnum_limit).unwrap(),
            to_receiver: VecDeque::new(),
            to_sender: VecDeque::new(),
            delivered: Vec::new(),
            acked: Vec::new(),
            data_tx: 0,
            drop_data: Vec::new(),
            timer_fires: 0,
        }
    }

    fn from_sender(&mut self, out: &mut Outbox) {
        for action in out.drain() {
            match action {
                Action::ToChannel(p) => {
                    let index = self.data_tx;
                    self.data_tx += 1;
                    if !self.drop_data.contains(&index) {
                        self.to_receiver.push_back(p);
                    }
                }
                Action::ToApplication(m) => self.acked.push(m),
                Action::StartTimer(_) | Action::StopTimer => {}
            }
        }
    }

    fn from_receiver(&mut self, out: &mut Outbox) {
        for action in out.drain() {
            match action {
                Action::ToChannel(p) => self.to_sender.push_back(p),
                Action::ToApplication(m) => self.delivered.push(m),
                Action::StartTimer(_) | Action::StopTimer => {}
            }
        }
    }

    fn send(&mut self, m: Message) -> Result<u16, SendError> {
        let mut out = Outbox::default();
        let r = self.sender.send(&mut out, m);
        self.from_sender(&mut out);
        r
    }

    /// Deliver queued packets (and fire timeouts) until nothing is left.
    fn settle(&mut self) {
        let mut out = Outbox::default();
        for _ in 0..10_000 {
            if let Some(p) = self.to_receiver.pop_front() {
                self.receiver.recv(&mut out, p);
                self.from_receiver(&mut out);
            } else if let Some(p) = self.to_sender.pop_front() {
                self.sender.recv(&mut out, p);
                self.from_sender(&mut out);
            } else if self.sender.has_unacked() {
                self.timer_fires += 1;
                self.sender.timer_interrupt(&mut out);
                self.from_sender(&mut out);
            } else {
                return;
            }
        }
        panic!("link did not settle");
    }
}

// ---------------------------------------------------------------------------
// Window bound and sliding (seqnum_limit = 8, window = 4)
// ---------------------------------------------------------------------------

#[test]
fn fifth_send_rejected_until_first_ack() {
    let mut s = Sender::new(&gbn_8_4()).unwrap();
    let mut r = Receiver::new(8).unwrap();
    let mut out = Outbox::default();

    for (i, c) in b"0123".iter().enumerate() {
        assert_eq!(s.send(&mut out, msg(*c)), Ok(i as u16));
    }
    assert_eq!(s.state(), SenderState::WindowFull);
    assert_eq!(
        s.send(&mut out, msg(b'4')),
        Err(SendError::WindowFull { window_size: 4 })
    );
    assert_eq!(s.in_flight(), 4);

    // Receiver gets seq 0 and acknowledges it.
    let data = out.sent();
    out.drain();
    r.recv(&mut out, data[0]);
    let ack0 = out.sent()[0];
    assert!(is_ack(&ack0));
    assert_eq!(ack0.acknum, 0);
    out.drain();

    s.recv(&mut out, ack0);
    assert_eq!(s.last_ack_received(), Some(0));
    assert_eq!(s.in_flight(), 3);
    out.drain();

    // Exactly one more send fits.
    assert_eq!(s.send(&mut out, msg(b'4')), Ok(4));
    assert!(s.send(&mut out, msg(b'5')).is_err());
}

#[test]
fn corrupt_data_triggers_nack_and_unchanged_retransmission() {
    let mut s = Sender::new(&gbn_8_4()).unwrap();
    let mut r = Receiver::new(8).unwrap();
    let mut out = Outbox::default();

    for c in b"abc" {
        s.send(&mut out, msg(*c)).unwrap();
    }
    let originals = out.sent();
    out.drain();

    let mut damaged = originals[2];
    damaged.payload[0] = b'Z';
    r.recv(&mut out, damaged);
    let nack = out.sent()[0];
    assert_eq!(nack.seqnum, 2);
    assert_ne!(nack.acknum, 2);
    assert!(!is_ack(&nack));
    assert!(out.delivered().is_empty());
    out.drain();

    s.recv(&mut out, nack);
    let resent = out.sent();
    assert_eq!(resent, originals);
    for (a, b) in resent.iter().zip(&originals) {
        assert_eq!(a.encode(), b.encode());
        assert!(verify(a));
    }
}

#[test]
fn misconfigured_window_fails_at_construction() {
    let cfg = ArqConfig {
        seqnum_limit: 6,
        window_size: 4,
        timeout: 40.0,
    };
    assert_eq!(
        Sender::new(&cfg).err(),
        Some(ConfigError::AmbiguousWindow { limit: 6, window: 4 })
    );
}

// ---------------------------------------------------------------------------
// Recovery over a lossy link
// ---------------------------------------------------------------------------

#[test]
fn clean_link_delivers_in_order() {
    let mut link = Link::new(&gbn_8_4());
    for c in b"abcd" {
        link.send(msg(*c)).unwrap();
    }
    link.settle();

    let expected: Vec<Message> = b"abcd".iter().map(|c| msg(*c)).collect();
    assert_eq!(link.delivered, expected);
    assert_eq!(link.acked, expected);
    assert_eq!(link.timer_fires, 0);
    assert_eq!(link.sender.state(), SenderState::Idle);
}

#[test]
fn single_drop_recovers_with_one_bulk_retransmission() {
    let mut link = Link::new(&gbn_8_4());
    // Drop the first transmission of seq 1.
    link.drop_data = vec![1];
    for c in b"abcd" {
        link.send(msg(*c)).unwrap();
    }
    link.settle();

    let expected: Vec<Message> = b"abcd".iter().map(|c| msg(*c)).collect();
    assert_eq!(link.delivered, expected);
    assert_eq!(link.acked, expected);
    assert_eq!(link.timer_fires, 1);
    // Seq 0 was acked before the timeout, so only 1..=3 were resent, once.
    assert_eq!(link.sender.retransmissions(), 3);
    assert_eq!(link.data_tx, 7);
}

#[test]
fn alternating_bit_survives_repeated_drops() {
    let mut link = Link::new(&ArqConfig::alternating_bit());
    link.drop_data = vec![0, 1, 3];
    let text = b"hello";
    for c in text {
        link.send(msg(*c)).unwrap();
        link.settle();
    }
    let expected: Vec<Message> = text.iter().map(|c| msg(*c)).collect();
    assert_eq!(link.delivered, expected);
    assert_eq!(link.timer_fires, 3);
}

#[test]
fn long_transfer_wraps_sequence_space() {
    let mut link = Link::new(&gbn_8_4());
    link.drop_data = vec![5, 17, 18, 40];
    let mut expected = Vec::new();
    for i in 0..40u8 {
        let m = msg(b'a' + i % 26);
        while link.send(m).is_err() {
            link.settle();
        }
        expected.push(m);
    }
    link.settle();

    assert_eq!(link.delivered, expected);
    assert_eq!(link.acked, expected);
}
