//! Prediction windows.
//!
//! A window is a start, an end and a sampling interval. Target timestamps
//! follow inclusive date-range semantics: the first target is `start`, each
//! next target is the previous plus the interval, and the last target is the
//! largest one not after `end`.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{Result, TideError};

/// Unit of a sampling interval.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum IntervalUnit {
    #[default]
    Hours,
    Minutes,
}

impl IntervalUnit {
    /// Length of one unit in minutes.
    pub fn minutes(&self) -> i64 {
        match self {
            Self::Hours => 60,
            Self::Minutes => 1,
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = TideError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hours" | "hour" | "h" => Ok(Self::Hours),
            "minutes" | "minute" | "min" | "m" => Ok(Self::Minutes),
            other => Err(TideError::configuration(
                "interval unit",
                format!("unknown unit '{other}', expected 'hours' or 'minutes'"),
            )),
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours => write!(f, "hours"),
            Self::Minutes => write!(f, "minutes"),
        }
    }
}

/// A positive sampling interval with a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SamplingInterval {
    value: u32,
    unit: IntervalUnit,
}

impl SamplingInterval {
    /// Create an interval.
    ///
    /// # Errors
    ///
    /// `Configuration` if `value` is zero.
    pub fn new(value: u32, unit: IntervalUnit) -> Result<Self> {
        if value == 0 {
            return Err(TideError::configuration(
                "interval",
                "sampling interval must be positive",
            ));
        }
        Ok(Self { value, unit })
    }

    /// Interval of `value` hours.
    pub fn hours(value: u32) -> Result<Self> {
        Self::new(value, IntervalUnit::Hours)
    }

    /// Interval of `value` minutes.
    pub fn minutes(value: u32) -> Result<Self> {
        Self::new(value, IntervalUnit::Minutes)
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// Interval as a chrono duration.
    pub fn as_duration(&self) -> TimeDelta {
        TimeDelta::minutes(self.value as i64 * self.unit.minutes())
    }

    /// Interval length in hours.
    pub fn in_hours(&self) -> f64 {
        (self.value as i64 * self.unit.minutes()) as f64 / 60.0
    }
}

impl fmt::Display for SamplingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, self.unit)
    }
}

/// Time window over which a fitted model is reconstructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PredictionWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
    interval: SamplingInterval,
}

impl PredictionWindow {
    /// Create a window.
    ///
    /// # Errors
    ///
    /// `Configuration` if `start` is after `end`.
    pub fn new(
        start: NaiveDateTime,
        end: NaiveDateTime,
        interval: SamplingInterval,
    ) -> Result<Self> {
        if start > end {
            return Err(TideError::configuration(
                "prediction window",
                format!("start {start} is after end {end}"),
            ));
        }
        Ok(Self {
            start,
            end,
            interval,
        })
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn interval(&self) -> SamplingInterval {
        self.interval
    }

    /// Number of target timestamps: `floor((end - start) / interval) + 1`.
    pub fn len(&self) -> usize {
        let span_ms = (self.end - self.start).num_milliseconds();
        let step_ms = self.interval.as_duration().num_milliseconds();
        (span_ms / step_ms) as usize + 1
    }

    /// A window always holds at least its start timestamp.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Ordered target timestamps.
    pub fn targets(&self) -> Vec<NaiveDateTime> {
        let step = self.interval.as_duration();
        let n = self.len();
        let mut out = Vec::with_capacity(n);
        let mut t = self.start;
        out.push(t);
        // never step past the last target, which may sit at the calendar limit
        for _ in 1..n {
            t += step;
            out.push(t);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn day(d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_hourly_inclusive_range() {
        let w = PredictionWindow::new(day(1), day(2), SamplingInterval::hours(1).unwrap()).unwrap();
        let targets = w.targets();
        assert_eq!(targets.len(), 25);
        assert_eq!(targets[0], day(1));
        assert_eq!(*targets.last().unwrap(), day(2));
    }

    #[test]
    fn test_last_target_not_after_end() {
        let w = PredictionWindow::new(day(1), day(2), SamplingInterval::hours(5).unwrap()).unwrap();
        let targets = w.targets();
        // 24 / 5 = 4 full steps
        assert_eq!(targets.len(), 5);
        assert!(*targets.last().unwrap() <= day(2));
        for pair in targets.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn test_minutes() {
        let interval = SamplingInterval::minutes(10).unwrap();
        let w = PredictionWindow::new(day(1), day(1) + TimeDelta::hours(1), interval).unwrap();
        assert_eq!(w.len(), 7);
        assert!((w.interval().in_hours() - 1.0 / 6.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_point_window() {
        let w = PredictionWindow::new(day(3), day(3), SamplingInterval::hours(1).unwrap()).unwrap();
        assert_eq!(w.targets(), vec![day(3)]);
    }

    #[test]
    fn test_window_ending_at_calendar_limit() {
        let end = NaiveDateTime::MAX;
        let start = end - TimeDelta::hours(2);
        let w = PredictionWindow::new(start, end, SamplingInterval::hours(1).unwrap()).unwrap();
        let targets = w.targets();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0], start);
        assert_eq!(targets[2], end);
    }

    #[test]
    fn test_start_after_end_rejected() {
        let interval = SamplingInterval::hours(1).unwrap();
        let err = PredictionWindow::new(day(2), day(1), interval).unwrap_err();
        assert!(matches!(err, TideError::Configuration { .. }));
    }

    #[test]
    fn test_zero_interval_rejected() {
        assert!(matches!(
            SamplingInterval::hours(0),
            Err(TideError::Configuration { .. })
        ));
    }

    #[test]
    fn test_parse_unit() {
        assert_eq!("hours".parse::<IntervalUnit>().unwrap(), IntervalUnit::Hours);
        assert_eq!("Minutes".parse::<IntervalUnit>().unwrap(), IntervalUnit::Minutes);
        assert!("days".parse::<IntervalUnit>().is_err());
    }
}
