//! The bounded, saturating reputation score.

use std::fmt;
use std::ops::Neg;

use thiserror::Error;

/// Raised when a value does not fit the score domain `[-32767, 32767]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("score {0} out of range [-32767, 32767]")]
pub struct ScoreError(pub i64);

/// A signed reputation score in `[-32767, 32767]`.
///
/// The range is symmetric: `i16::MIN` is excluded so that negation can never
/// overflow. `0` means "no information"; a freshly allocated slot holds it.
/// Every arithmetic operation saturates at the bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Score(i16);

impl Score {
    /// Smallest representable score.
    pub const MIN: Score = Score(-32767);
    /// Largest representable score.
    pub const MAX: Score = Score(32767);
    /// The "no information" value.
    pub const ZERO: Score = Score(0);

    /// Validates `value` against the score domain.
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        if value < i64::from(Self::MIN.0) || value > i64::from(Self::MAX.0) {
            return Err(ScoreError(value));
        }
        Ok(Score(value as i16))
    }

    /// Clamps `value` into the score domain.
    #[must_use]
    pub fn saturating(value: i64) -> Self {
        Score(value.clamp(i64::from(Self::MIN.0), i64::from(Self::MAX.0)) as i16)
    }

    /// Wraps a raw slot value. Slots only ever hold values that came from a
    /// `Score`, so no range check is needed.
    #[inline]
    pub(crate) const fn from_raw(raw: i16) -> Self {
        Score(raw)
    }

    #[inline]
    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }

    #[inline]
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `self + delta`, clamped to `[MIN, MAX]`.
    #[inline]
    #[must_use]
    pub fn saturating_add(self, delta: Score) -> Score {
        Score::saturating(i64::from(self.0) + i64::from(delta.0))
    }

    /// Applies one decay step: multiply by `factor`, truncate toward zero,
    /// and collapse to zero when the magnitude falls within `deadzone`.
    #[must_use]
    pub fn decayed(self, factor: f64, deadzone: u16) -> Score {
        let scaled = (f64::from(self.0) * factor).trunc() as i64;
        if scaled.unsigned_abs() <= u64::from(deadzone) {
            Score::ZERO
        } else {
            Score::saturating(scaled)
        }
    }
}

impl Neg for Score {
    type Output = Score;

    fn neg(self) -> Score {
        Score(-self.0)
    }
}

impl TryFrom<i16> for Score {
    type Error = ScoreError;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        Score::new(i64::from(value))
    }
}

impl TryFrom<i32> for Score {
    type Error = ScoreError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Score::new(i64::from(value))
    }
}

impl From<Score> for i16 {
    fn from(score: Score) -> i16 {
        score.0
    }
}

impl From<Score> for i32 {
    fn from(score: Score) -> i32 {
        i32::from(score.0)
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
