//! Data units exchanged between the layers.
//!
//! - [`Message`] is what the application hands down and gets back: exactly
//!   [`MSG_SIZE`] opaque bytes.
//! - [`Packet`] is what travels over the channel.  There is no packet-kind
//!   tag; data, ACK and NACK packets all share this one layout and are told
//!   apart by [`crate::checksum::is_ack`].
//!
//! No protocol logic happens here: only the data types and their byte codec.
//!
//! # Wire format
//!
//! All multi-byte integers are **big-endian**.
//!
//! ```text
//!  0               1               2               3
//!  0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7 0 1 2 3 4 5 6 7
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        Sequence Number        |     Acknowledgment Number     |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |           Checksum            |                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+                               +
//! |                     Payload (20 bytes) ...                    |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Total size: [`PACKET_LEN`] = 26 bytes.

use std::fmt;

use thiserror::Error;

/// Size of every application message and every packet payload.
pub const MSG_SIZE: usize = 20;

/// Byte length of the fixed header on the wire.
pub const HEADER_LEN: usize = 6;

/// Byte length of an encoded packet.
pub const PACKET_LEN: usize = HEADER_LEN + MSG_SIZE;

// Byte offsets of each field within the serialised packet.
const OFF_SEQ: usize = 0;
const OFF_ACK: usize = 2;
const OFF_CHECKSUM: usize = 4;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

/// Application data unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Message {
    data: [u8; MSG_SIZE],
}

impl Message {
    pub fn new(data: [u8; MSG_SIZE]) -> Self {
        Self { data }
    }

    pub fn data(&self) -> &[u8; MSG_SIZE] {
        &self.data
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Msg(data={})", String::from_utf8_lossy(&self.data))
    }
}

// ---------------------------------------------------------------------------
// Packet
// ---------------------------------------------------------------------------

/// The unit exchanged over the channel.
///
/// A plain value type: each entity builds or copies its own packets and
/// never holds a reference into the peer's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Packet {
    /// Sequence number, in `[0, seqnum_limit)` when sent by a well-behaved entity.
    pub seqnum: u16,
    /// Acknowledgment number.  Equal to `seqnum` on data packets and positive
    /// ACKs; deliberately different on NACKs.
    pub acknum: u16,
    /// One's-complement checksum over `seqnum`, `acknum` and `payload`.
    pub checksum: u16,
    pub payload: [u8; MSG_SIZE],
}

impl Packet {
    /// Build a packet and stamp it with a freshly computed checksum.
    pub fn sealed(seqnum: u16, acknum: u16, payload: [u8; MSG_SIZE]) -> Self {
        let checksum = crate::checksum::checksum(seqnum, acknum, &payload);
        Self {
            seqnum,
            acknum,
            checksum,
            payload,
        }
    }

    /// Serialise this packet into its fixed-size wire form.
    ///
    /// The stored checksum is written as-is; it is never recomputed here.
    pub fn encode(&self) -> [u8; PACKET_LEN] {
        let mut buf = [0u8; PACKET_LEN];
        buf[OFF_SEQ..OFF_SEQ + 2].copy_from_slice(&self.seqnum.to_be_bytes());
        buf[OFF_ACK..OFF_ACK + 2].copy_from_slice(&self.acknum.to_be_bytes());
        buf[OFF_CHECKSUM..OFF_CHECKSUM + 2].copy_from_slice(&self.checksum.to_be_bytes());
        buf[HEADER_LEN..].copy_from_slice(&self.payload);
        buf
    }

    /// Parse a [`Packet`] from a raw byte slice.
    ///
    /// Only the length is validated.  A bad checksum is not a decode error:
    /// the receiving entity must see the packet to answer it with a NACK.
    pub fn decode(buf: &[u8]) -> Result<Self, PacketError> {
        if buf.len() != PACKET_LEN {
            return Err(PacketError::Length {
                expected: PACKET_LEN,
                actual: buf.len(),
            });
        }

        let field = |off: usize| u16::from_be_bytes([buf[off], buf[off + 1]]);
        let mut payload = [0u8; MSG_SIZE];
        payload.copy_from_slice(&buf[HEADER_LEN..]);

        Ok(Packet {
            seqnum: field(OFF_SEQ),
            acknum: field(OFF_ACK),
            checksum: field(OFF_CHECKSUM),
            payload,
        })
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Pkt(seqnum={}, acknum={}, checksum={:#06x}, payload={})",
            self.seqnum,
            self.acknum,
            self.checksum,
            String::from_utf8_lossy(&self.payload)
        )
    }
}

/// Errors that can arise when parsing a raw datagram.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PacketError {
    #[error("packet must be {expected} bytes, got {actual}")]
    Length { expected: usize, actual: usize },
}
