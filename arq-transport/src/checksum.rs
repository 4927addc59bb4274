//! 16-bit one's-complement packet checksum.
//!
//! The sum starts with one header word built from `seqnum` (high byte) and
//! `acknum` (low byte), then adds the bytes of the first half of the
//! payload (rounded up) one at a time.  Any carry out of bit 15 is folded
//! back into the low bits after every addition, and the result is the
//! complement of the final 16-bit sum.
//!
//! This exact fold is what the peer implementation computes, so it must not
//! be "improved" into a full RFC 1071 sum over every payload byte.
//!
//! # Blind spots
//!
//! - Bytes in the second half of the payload do not contribute.
//! - The header word only has room for one-byte fields.  Wider values
//!   alias (`(0, 256)` and `(1, 0)` sum the same), so [`verify`] refuses
//!   any packet whose `seqnum` or `acknum` does not fit in a byte.
//! - Like any one's-complement sum, equal and opposite changes cancel:
//!   `+1` on one covered byte and `-1` on another leave the sum unchanged,
//!   and swapping two covered bytes is invisible.

use crate::packet::Packet;

/// Largest `seqnum` / `acknum` the header word can hold without aliasing.
const HEADER_FIELD_MAX: u16 = 0xFF;

/// Add `value` to `sum`, folding a carry out of 16 bits back into bit 0.
#[inline]
fn add_folded(sum: u32, value: u32) -> u32 {
    let sum = sum + value;
    if sum & 0xFFFF_0000 != 0 {
        (sum & 0xFFFF) + 1
    } else {
        sum
    }
}

/// Compute the checksum over the header fields and payload.
pub fn checksum(seqnum: u16, acknum: u16, payload: &[u8]) -> u16 {
    let header = (u32::from(seqnum) << 8) | u32::from(acknum);
    let mut sum = add_folded(0, header);

    for &byte in &payload[..payload.len().div_ceil(2)] {
        sum = add_folded(sum, u32::from(byte));
    }

    !(sum as u16)
}

/// `true` iff the header fields fit the one-byte header lanes and the
/// packet's stored checksum matches its contents.
pub fn verify(packet: &Packet) -> bool {
    packet.seqnum <= HEADER_FIELD_MAX
        && packet.acknum <= HEADER_FIELD_MAX
        && checksum(packet.seqnum, packet.acknum, &packet.payload) == packet.checksum
}

/// `true` iff `packet` is an intact positive acknowledgment.
///
/// Both conditions are required: a NACK is an intact packet whose `acknum`
/// differs from its `seqnum`, and a damaged packet is negative no matter
/// what its fields say.
pub fn is_ack(packet: &Packet) -> bool {
    packet.acknum == packet.seqnum && verify(packet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::packet::MSG_SIZE;

    const A: [u8; MSG_SIZE] = [b'a'; MSG_SIZE];

    #[test]
    fn known_values() {
        // 10 * 0x61 = 0x03CA
        assert_eq!(checksum(0, 0, &A), !0x03CA);
        // 0x0101 + 0x03CA = 0x04CB
        assert_eq!(checksum(1, 1, &A), !0x04CB);
        assert_eq!(checksum(0, 0, &[0u8; MSG_SIZE]), 0xFFFF);
    }

    #[test]
    fn header_overflow_wraps_once() {
        // (0xFFFF << 8) | 0 = 0xFF_FF00 -> 0xFF00 + 1
        assert_eq!(checksum(u16::MAX, 0, &[0u8; MSG_SIZE]), !0xFF01);
    }

    #[test]
    fn payload_carry_is_folded() {
        // 0xFFFF header + 0xFF -> 0x1_00FE -> 0x00FE + 1 = 0x00FF
        let mut payload = [0u8; MSG_SIZE];
        payload[0] = 0xFF;
        assert_eq!(checksum(0xFF, 0xFF, &payload), !0x00FF);
    }

    #[test]
    fn single_bit_flips_in_covered_region_are_detected() {
        let pkt = Packet::sealed(2, 2, *b"abcdefghijklmnopqrst");
        assert!(verify(&pkt));

        for byte in 0..MSG_SIZE / 2 {
            for bit in 0..8 {
                let mut bad = pkt;
                bad.payload[byte] ^= 1 << bit;
                assert!(!verify(&bad), "flip byte {byte} bit {bit} undetected");
            }
        }
    }

    #[test]
    fn every_header_bit_flip_is_detected() {
        for (seq, ack) in [(0, 0), (1, 1), (2, 1), (255, 255), (129, 128)] {
            let pkt = Packet::sealed(seq, ack, A);
            assert!(verify(&pkt));
            for bit in 0..16 {
                let mut bad = pkt;
                bad.seqnum ^= 1 << bit;
                assert!(!verify(&bad), "({seq}, {ack}) seqnum bit {bit} undetected");
                let mut bad = pkt;
                bad.acknum ^= 1 << bit;
                assert!(!verify(&bad), "({seq}, {ack}) acknum bit {bit} undetected");
            }
        }
    }

    #[test]
    fn wide_header_fields_never_verify() {
        // These two sum to the same header word.
        assert_eq!(checksum(0, 256, &A), checksum(1, 0, &A));

        let wide = Packet::sealed(257, 257, A);
        assert!(!verify(&wide));
        assert!(!is_ack(&wide));
    }

    #[test]
    fn odd_length_payload_covers_middle_byte() {
        // ceil(3 / 2) = 2 bytes: 1 + 2
        assert_eq!(checksum(0, 0, &[1, 2, 3]), !3);
        assert_eq!(checksum(0, 0, &[7]), !7);
        assert_eq!(checksum(0, 0, &[]), 0xFFFF);
    }

    #[test]
    fn known_blind_spots() {
        let pkt = Packet::sealed(2, 2, *b"abcdefghijklmnopqrst");

        // Equal and opposite changes cancel.
        let mut cancelled = pkt;
        cancelled.payload[0] += 1;
        cancelled.payload[1] -= 1;
        assert!(verify(&cancelled));

        // Second half of the payload is not covered.
        let mut tail = pkt;
        tail.payload[MSG_SIZE - 1] = b'Z';
        assert!(verify(&tail));
    }

    #[test]
    fn is_ack_requires_equal_fields_and_valid_checksum() {
        let ack = Packet::sealed(4, 4, A);
        assert!(is_ack(&ack));

        let nack = Packet::sealed(4, 3, A);
        assert!(verify(&nack));
        assert!(!is_ack(&nack));

        let mut damaged = ack;
        damaged.payload[0] = b'Z';
        assert!(!is_ack(&damaged));
    }
}
