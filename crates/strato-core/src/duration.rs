//! ISO 8601 duration parsing for update-policy pause times.
//!
//! Supports the subset `PnW`, `PnD`, `T nH nM nS` and combinations
//! (e.g. `PT1S`, `PT1M30S`, `P1DT2H`). Year and month designators are
//! rejected rather than approximated: a pause time feeds the stack
//! timeout feasibility estimate, which must stay exact.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

const SECS_PER_MINUTE: u64 = 60;
const SECS_PER_HOUR: u64 = 3600;
const SECS_PER_DAY: u64 = 86_400;
const SECS_PER_WEEK: u64 = 604_800;

/// A non-negative duration expressed in the ISO 8601 subset used by
/// update policies. Only the magnitude is significant; rendering is
/// normalized to `PnDTnHnMnS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IsoDuration {
    secs: u64,
}

impl IsoDuration {
    /// The zero duration (`PT0S`).
    pub const ZERO: IsoDuration = IsoDuration { secs: 0 };

    /// Build a duration from whole seconds.
    pub fn from_secs(secs: u64) -> Self {
        Self { secs }
    }

    /// Parse an ISO 8601 duration of the form `PnW nD T nH nM nS`.
    ///
    /// Components must appear in order and at most once. At least one
    /// component is required. Any year or month designator fails.
    pub fn parse(text: &str) -> ValidationResult<Self> {
        let invalid = || ValidationError::InvalidDuration(text.to_string());

        let mut chars = text.chars().peekable();
        if chars.next() != Some('P') {
            return Err(invalid());
        }

        // Unit ranks enforce ordering: W < D < T-marker < H < M < S.
        let mut last_rank = 0u8;
        let mut in_time_part = false;
        let mut seen_component = false;
        let mut secs: u64 = 0;

        while let Some(&c) = chars.peek() {
            if c == 'T' {
                if in_time_part || last_rank > 2 {
                    return Err(invalid());
                }
                in_time_part = true;
                last_rank = 3;
                chars.next();
                continue;
            }

            let mut digits = String::new();
            while let Some(&d) = chars.peek() {
                if d.is_ascii_digit() {
                    digits.push(d);
                    chars.next();
                } else {
                    break;
                }
            }
            if digits.is_empty() {
                return Err(invalid());
            }
            let value: u64 = digits.parse().map_err(|_| invalid())?;

            let unit = chars.next().ok_or_else(invalid)?;
            let (rank, unit_secs) = match (unit, in_time_part) {
                ('W', false) => (1, SECS_PER_WEEK),
                ('D', false) => (2, SECS_PER_DAY),
                ('H', true) => (4, SECS_PER_HOUR),
                ('M', true) => (5, SECS_PER_MINUTE),
                ('S', true) => (6, 1),
                // 'Y' anywhere and 'M' in the date part are the
                // unsupported year/month designators.
                _ => return Err(invalid()),
            };
            if rank <= last_rank {
                return Err(invalid());
            }
            last_rank = rank;
            seen_component = true;
            secs = secs
                .checked_add(value.checked_mul(unit_secs).ok_or_else(invalid)?)
                .ok_or_else(invalid)?;
        }

        if !seen_component {
            return Err(invalid());
        }
        Ok(Self { secs })
    }

    /// Total magnitude in whole seconds.
    pub fn as_secs(&self) -> u64 {
        self.secs
    }

    /// Convert to a `std::time::Duration` for sleeping and arithmetic.
    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.secs)
    }

    pub fn is_zero(&self) -> bool {
        self.secs == 0
    }
}

impl Default for IsoDuration {
    fn default() -> Self {
        Self::ZERO
    }
}

impl fmt::Display for IsoDuration {
    /// Render the normalized `PnDTnHnMnS` form, omitting zero components.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.secs == 0 {
            return write!(f, "PT0S");
        }

        let days = self.secs / SECS_PER_DAY;
        let hours = (self.secs % SECS_PER_DAY) / SECS_PER_HOUR;
        let minutes = (self.secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
        let seconds = self.secs % SECS_PER_MINUTE;

        write!(f, "P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if hours > 0 || minutes > 0 || seconds > 0 {
            write!(f, "T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if seconds > 0 {
                write!(f, "{seconds}S")?;
            }
        }
        Ok(())
    }
}

impl From<IsoDuration> for String {
    fn from(d: IsoDuration) -> Self {
        d.to_string()
    }
}

impl TryFrom<String> for IsoDuration {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        IsoDuration::parse(&value)
    }
}
