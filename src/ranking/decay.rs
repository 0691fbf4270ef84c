use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

use crate::error::{Error, Result};

const SECS_PER_HOUR: f64 = 60.0 * 60.0;

/// Exponential half-life weighting for frecency scores.
///
/// A visit of age `a` contributes `max(0.5^(a / half_life), floor)`: a fresh
/// visit is worth 1.0, one half-life later 0.5, and past the cutoff age every
/// visit keeps contributing `floor`, so a long history never counts for zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayPolicy {
    half_life_secs: f64,
    floor: f64,
}

impl Default for DecayPolicy {
    /// One week half-life, 5% floor (reached after ~4.3 half-lives, about a month).
    fn default() -> Self {
        Self {
            half_life_secs: 7.0 * 24.0 * SECS_PER_HOUR,
            floor: 0.05,
        }
    }
}

impl DecayPolicy {
    /// # Errors
    /// `Config` if the half-life is zero or `floor` is outside `0.0..=1.0`.
    pub fn new(half_life: Duration, floor: f64) -> Result<Self> {
        let half_life_secs = half_life.as_secs_f64();
        if half_life_secs <= 0.0 {
            return Err(Error::Config("half-life must be positive".to_owned()));
        }
        if !(0.0..=1.0).contains(&floor) {
            return Err(Error::Config(format!(
                "decay floor must be between 0 and 1, got {floor}"
            )));
        }
        Ok(Self {
            half_life_secs,
            floor,
        })
    }

    /// # Errors
    /// Same as [`DecayPolicy::new`]; also rejects non-finite hours.
    pub fn from_hours(half_life_hours: f64, floor: f64) -> Result<Self> {
        if !half_life_hours.is_finite() || half_life_hours <= 0.0 {
            return Err(Error::Config(format!(
                "half-life must be a positive number of hours, got {half_life_hours}"
            )));
        }
        let half_life = Duration::try_from_secs_f64(half_life_hours * SECS_PER_HOUR)
            .map_err(|_| {
                Error::Config(format!("half-life of {half_life_hours} hours is too large"))
            })?;
        Self::new(half_life, floor)
    }

    pub const fn floor(&self) -> f64 {
        self.floor
    }

    pub fn half_life(&self) -> Duration {
        Duration::try_from_secs_f64(self.half_life_secs).unwrap_or(Duration::MAX)
    }

    /// Age after which a visit only contributes the floor. `None` when the
    /// floor is zero or the age does not fit in a `Duration`.
    pub fn cutoff(&self) -> Option<Duration> {
        if self.floor <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(self.half_life_secs * (1.0 / self.floor).log2()).ok()
    }

    /// Weight of one visit of the given age. Future timestamps count as age zero.
    pub fn weight(&self, age: TimeDelta) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let age_secs = age.num_milliseconds().max(0) as f64 / 1000.0;
        0.5_f64.powf(age_secs / self.half_life_secs).max(self.floor)
    }

    /// Sum of visit weights relative to `now`.
    ///
    /// Visits are summed oldest first so the result does not depend on the
    /// order rows came back from the store.
    pub fn score(&self, now: DateTime<Utc>, visits: &mut [DateTime<Utc>]) -> f64 {
        visits.sort_unstable();
        visits.iter().map(|&at| self.weight(now - at)).sum()
    }
}
