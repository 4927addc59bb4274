//! Modular sequence-number arithmetic.
//!
//! Sequence numbers live in `[0, limit)` and wrap back to `0`.  Unlike the
//! 32-bit TCP space there is no natural integer overflow to lean on, so
//! every step goes through [`SeqSpace`].

use crate::config::{check_seqnum_limit, ConfigError};

/// The sequence-number space `[0, limit)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeqSpace {
    limit: u16,
}

impl SeqSpace {
    /// Fails unless `2 <= limit <= 256`.
    pub fn new(limit: u16) -> Result<Self, ConfigError> {
        check_seqnum_limit(limit)?;
        Ok(Self { limit })
    }

    /// `true` when `seq` is a legal sequence number in this space.
    #[inline]
    pub fn contains(&self, seq: u16) -> bool {
        seq < self.limit
    }

    /// The successor of `seq`, wrapping at `limit`.
    #[inline]
    pub fn next(&self, seq: u16) -> u16 {
        self.add(seq, 1)
    }

    /// The predecessor of `seq`, wrapping at `limit`.
    #[inline]
    pub fn prev(&self, seq: u16) -> u16 {
        self.add(seq, self.limit - 1)
    }

    /// `(seq + n) mod limit`.
    #[inline]
    pub fn add(&self, seq: u16, n: u16) -> u16 {
        ((u32::from(seq) + u32::from(n)) % u32::from(self.limit)) as u16
    }

    /// Reduce an arbitrary value into the space.
    #[inline]
    pub fn wrap(&self, value: u16) -> u16 {
        value % self.limit
    }
}
