//! Protocol configuration.
//!
//! One [`ArqConfig`] covers both protocol variants: `window_size == 1`
//! is alternating-bit, anything larger is Go-Back-N.

use thiserror::Error;

use crate::context::SimTime;

/// Default retransmission timeout for Go-Back-N, in simulated time units.
pub const GBN_TIMEOUT: SimTime = 40.0;
/// Default retransmission timeout for alternating-bit.
pub const ABP_TIMEOUT: SimTime = 20.0;

/// Largest usable sequence space.  The checksum packs `seqnum` and `acknum`
/// into one byte each, so every seqnum must fit in `u8`.
pub const MAX_SEQNUM_LIMIT: u16 = 256;

/// Check that `limit` describes a usable sequence space.
pub(crate) fn check_seqnum_limit(limit: u16) -> Result<(), ConfigError> {
    if limit < 2 {
        return Err(ConfigError::SeqnumLimitTooSmall { limit });
    }
    if limit > MAX_SEQNUM_LIMIT {
        return Err(ConfigError::SeqnumLimitTooLarge { limit });
    }
    Ok(())
}

/// Parameters fixed for the lifetime of a sender/receiver pair.
#[derive(Debug, Clone, PartialEq)]
pub struct ArqConfig {
    /// Number of distinct sequence numbers.  All seqnums and acknums on the
    /// channel are in `[0, seqnum_limit)`.
    pub seqnum_limit: u16,
    /// Maximum number of unacknowledged packets in flight.
    pub window_size: usize,
    /// Retransmission timeout.
    pub timeout: SimTime,
}

impl Default for ArqConfig {
    fn default() -> Self {
        Self::go_back_n(2)
    }
}

impl ArqConfig {
    /// Window of one over the two-value space `{0, 1}`.
    pub fn alternating_bit() -> Self {
        Self {
            seqnum_limit: 2,
            window_size: 1,
            timeout: ABP_TIMEOUT,
        }
    }

    /// Window of `window_size` over the smallest space that keeps
    /// cumulative acks unambiguous.
    pub fn go_back_n(window_size: usize) -> Self {
        Self {
            seqnum_limit: u16::try_from(window_size.saturating_mul(2)).unwrap_or(u16::MAX),
            window_size,
            timeout: GBN_TIMEOUT,
        }
    }

    /// Check the invariants the state machines rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::ZeroWindow);
        }
        check_seqnum_limit(self.seqnum_limit)?;
        if usize::from(self.seqnum_limit) < self.window_size.saturating_mul(2) {
            return Err(ConfigError::AmbiguousWindow {
                limit: self.seqnum_limit,
                window: self.window_size,
            });
        }
        if !(self.timeout.is_finite() && self.timeout > 0.0) {
            return Err(ConfigError::InvalidTimeout(self.timeout));
        }
        Ok(())
    }
}

/// Fatal misconfiguration, reported at construction time.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("window_size must be at least 1")]
    ZeroWindow,
    #[error("seqnum_limit must be at least 2, got {limit}")]
    SeqnumLimitTooSmall { limit: u16 },
    #[error("seqnum_limit must be at most 256, got {limit}")]
    SeqnumLimitTooLarge { limit: u16 },
    #[error("seqnum_limit {limit} is less than 2 x window_size ({window})")]
    AmbiguousWindow { limit: u16, window: usize },
    #[error("timeout must be a positive, finite duration, got {0}")]
    InvalidTimeout(SimTime),
    #[error("{name} must be a probability in [0, 1], got {value}")]
    InvalidProbability { name: &'static str, value: f64 },
    #[error("average interarrival time must be positive and finite, got {0}")]
    InvalidInterarrival(SimTime),
}
