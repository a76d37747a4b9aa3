//! Numeric time axis shared by fitting and reconstruction.
//!
//! Timestamps are converted to fractional days since 1970-01-01T00:00:00.
//! Both strategies use this single representation, so a model fitted on one
//! series predicts at the same instants it was asked for.

use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};

/// Milliseconds per day.
const MS_PER_DAY: f64 = 86_400_000.0;

/// The datenum epoch (1970-01-01T00:00:00).
pub fn epoch() -> NaiveDateTime {
    DateTime::<Utc>::UNIX_EPOCH.naive_utc()
}

/// Convert a timestamp to fractional days since the epoch.
pub fn to_datenum(t: &NaiveDateTime) -> f64 {
    let delta = *t - epoch();
    match delta.num_microseconds() {
        Some(us) => us as f64 / (MS_PER_DAY * 1000.0),
        None => delta.num_milliseconds() as f64 / MS_PER_DAY,
    }
}

/// Convert fractional days since the epoch back to a timestamp.
///
/// Rounded to the nearest millisecond.
pub fn from_datenum(days: f64) -> NaiveDateTime {
    let ms = (days * MS_PER_DAY).round() as i64;
    epoch() + TimeDelta::milliseconds(ms)
}

/// Convert a slice of timestamps to datenums.
pub fn to_datenums(times: &[NaiveDateTime]) -> Vec<f64> {
    times.iter().map(to_datenum).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn test_epoch_is_zero() {
        assert_eq!(to_datenum(&epoch()), 0.0);
    }

    #[test]
    fn test_one_day() {
        assert!((to_datenum(&at(1970, 1, 2, 0, 0)) - 1.0).abs() < 1e-12);
        assert!((to_datenum(&at(1970, 1, 1, 6, 0)) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_before_epoch_is_negative() {
        assert!((to_datenum(&at(1969, 12, 31, 0, 0)) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_round_trip_to_the_minute() {
        let t = at(2020, 4, 3, 13, 47);
        assert_eq!(from_datenum(to_datenum(&t)), t);
    }
}
