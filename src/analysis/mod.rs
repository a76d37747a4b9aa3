//! Tidal harmonic analysis of observed water levels.
//!
//! This module provides:
//! - [`ObservationSeries`]: loaded (timestamp, depth) samples
//! - Two harmonic fitting strategies behind a common interface:
//!   [`ConstituentFitA`] (T_Tide-style) and [`ConstituentFitB`] (UTide-style)
//! - [`Analyzer`]: the fit → reconstruct lifecycle around a strategy
//!
//! # Mathematical Background
//!
//! Both strategies fit
//! ```text
//! η(t) = η₀ [+ β (t - t_ref)] + Σᵢ fᵢ Aᵢ cos(ωᵢ t + uᵢ - gᵢ)
//! ```
//! by linear least squares on the cosine/sine coefficients, where fᵢ and uᵢ
//! are nodal corrections (unity/zero when no latitude is supplied).
//!
//! # Example
//!
//! ```ignore
//! use tide_rs::analysis::{Analyzer, Strategy, StrategyKind};
//!
//! let mut analyzer = Analyzer::new(Strategy::from_kind(StrategyKind::ConstituentFitB));
//! analyzer.fit(&series, None)?;
//! let predicted = analyzer.reconstruct(&window.targets())?;
//! ```

mod constituents;
mod lsq;
mod nodal;
mod strategy;
mod ttide;
mod utide;

pub use constituents::{CATALOGUE, Constituent, NodalClass, find_constituent, select_constituents};
pub use lsq::{FittedConstituent, LeastSquaresFit, fit_harmonics};
pub use nodal::{NodalFactors, lunar_node_longitude, nodal_factors};
pub use strategy::{
    Analyzer, ConstituentDiagnostics, Diagnostics, HarmonicModel, SolverOutput, Strategy,
    StrategyKind,
};
pub use ttide::{ConstituentFitA, TTideConfig, TTideModel};
pub use utide::{ConstituentFitB, ReconstructOptions, UTideConfig, UTideModel, UTideReconstruction};

use chrono::{NaiveDateTime, TimeDelta};

use crate::error::{Result, TideError};
use crate::time::to_datenum;

/// A single observed sample.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ObservationSample {
    /// Observation time (timezone-naive)
    pub time: NaiveDateTime,
    /// Water depth / level; `NaN` marks a missing value
    pub depth: f64,
}

/// Observed water-level series.
///
/// Timestamps are strictly increasing. The series is immutable once built.
#[derive(Clone, Debug)]
pub struct ObservationSeries {
    data: Vec<ObservationSample>,
    /// Optional name (usually the source file stem)
    pub name: Option<String>,
}

impl ObservationSeries {
    /// Create a series from parallel arrays of times and depths.
    ///
    /// # Errors
    ///
    /// `Analysis` if the arrays differ in length or the times are not
    /// strictly increasing.
    pub fn new(times: &[NaiveDateTime], depths: &[f64]) -> Result<Self> {
        if times.len() != depths.len() {
            return Err(TideError::analysis(format!(
                "times and depths must have same length ({} vs {})",
                times.len(),
                depths.len()
            )));
        }

        let data = times
            .iter()
            .zip(depths.iter())
            .map(|(&time, &depth)| ObservationSample { time, depth })
            .collect();

        Self::from_samples(data)
    }

    /// Create a series from samples.
    pub fn from_samples(data: Vec<ObservationSample>) -> Result<Self> {
        if let Some(i) = (1..data.len()).find(|&i| data[i].time <= data[i - 1].time) {
            return Err(TideError::analysis(format!(
                "timestamps must be strictly increasing (sample {} at {})",
                i, data[i].time
            )));
        }
        Ok(Self { data, name: None })
    }

    /// Attach a name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Access the samples.
    pub fn samples(&self) -> &[ObservationSample] {
        &self.data
    }

    /// Timestamps as a vector.
    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.data.iter().map(|p| p.time).collect()
    }

    /// Depths as a vector.
    pub fn depths(&self) -> Vec<f64> {
        self.data.iter().map(|p| p.depth).collect()
    }

    /// Timestamps on the numeric datenum axis.
    pub fn datenums(&self) -> Vec<f64> {
        self.data.iter().map(|p| to_datenum(&p.time)).collect()
    }

    /// First and last timestamp.
    pub fn time_range(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        Some((self.data.first()?.time, self.data.last()?.time))
    }

    /// Duration covered by the series.
    pub fn duration(&self) -> TimeDelta {
        self.time_range()
            .map(|(t0, t1)| t1 - t0)
            .unwrap_or_else(TimeDelta::zero)
    }

    /// Sampling interval derived from the first two samples.
    ///
    /// The whole series is assumed to share this interval.
    pub fn sampling_interval(&self) -> Option<TimeDelta> {
        match self.data.as_slice() {
            [first, second, ..] => Some(second.time - first.time),
            _ => None,
        }
    }

    /// Number of non-missing depth values.
    pub fn valid_count(&self) -> usize {
        self.data.iter().filter(|p| !p.depth.is_nan()).count()
    }

    /// Mean depth over non-missing values.
    pub fn mean(&self) -> f64 {
        let n = self.valid_count();
        if n == 0 {
            return f64::NAN;
        }
        self.valid_depths().sum::<f64>() / n as f64
    }

    /// Sample variance over non-missing values.
    pub fn variance(&self) -> f64 {
        let n = self.valid_count();
        if n < 2 {
            return 0.0;
        }
        let mean = self.mean();
        self.valid_depths().map(|d| (d - mean).powi(2)).sum::<f64>() / (n - 1) as f64
    }

    /// Summary statistics.
    pub fn summary(&self) -> SeriesSummary {
        let (start, end) = match self.time_range() {
            Some((s, e)) => (Some(s), Some(e)),
            None => (None, None),
        };
        SeriesSummary {
            samples: self.len(),
            missing: self.len() - self.valid_count(),
            start,
            end,
            interval: self.sampling_interval(),
            mean: self.mean(),
            min: self.valid_depths().fold(f64::INFINITY, f64::min),
            max: self.valid_depths().fold(f64::NEG_INFINITY, f64::max),
        }
    }

    fn valid_depths(&self) -> impl Iterator<Item = f64> + '_ {
        self.data.iter().map(|p| p.depth).filter(|d| !d.is_nan())
    }
}

/// Summary statistics of an observation series.
#[derive(Clone, Copy, Debug)]
pub struct SeriesSummary {
    pub samples: usize,
    pub missing: usize,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub interval: Option<TimeDelta>,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Geographic latitude in decimal degrees, within [-90, 90].
///
/// Zero is the equator, not "unset"; use `Option<Latitude>` for absence.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Latitude(f64);

impl Latitude {
    /// Create a latitude.
    ///
    /// # Errors
    ///
    /// `Configuration` if the value is outside [-90, 90] or not finite.
    pub fn new(degrees: f64) -> Result<Self> {
        if !degrees.is_finite() || !(-90.0..=90.0).contains(&degrees) {
            return Err(TideError::configuration(
                "latitude",
                format!("{degrees} is outside [-90, 90]"),
            ));
        }
        Ok(Self(degrees))
    }

    pub fn degrees(&self) -> f64 {
        self.0
    }
}

/// Wrap an angle in degrees to [0, 360).
pub fn wrap_degrees(angle: f64) -> f64 {
    let a = angle.rem_euclid(360.0);
    if a >= 360.0 { 0.0 } else { a }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn hour(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_series_creation() {
        let ts = ObservationSeries::new(&[hour(0), hour(1), hour(2)], &[1.0, 2.0, 1.5]).unwrap();
        assert_eq!(ts.len(), 3);
        assert_eq!(ts.duration(), TimeDelta::hours(2));
        assert_eq!(ts.sampling_interval(), Some(TimeDelta::hours(1)));
    }

    #[test]
    fn test_statistics_skip_missing() {
        let times = [hour(0), hour(1), hour(2), hour(3)];
        let ts = ObservationSeries::new(&times, &[1.0, f64::NAN, 3.0, 2.0]).unwrap();
        assert_eq!(ts.valid_count(), 3);
        assert!((ts.mean() - 2.0).abs() < 1e-12);
        assert!((ts.variance() - 1.0).abs() < 1e-12);

        let summary = ts.summary();
        assert_eq!(summary.missing, 1);
        assert_eq!(summary.min, 1.0);
        assert_eq!(summary.max, 3.0);
    }

    #[test]
    fn test_non_increasing_rejected() {
        let err = ObservationSeries::new(&[hour(1), hour(1)], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, TideError::Analysis(_)));
    }

    #[test]
    fn test_length_mismatch_rejected() {
        assert!(ObservationSeries::new(&[hour(1)], &[1.0, 2.0]).is_err());
    }

    #[test]
    fn test_single_sample_has_no_interval() {
        let ts = ObservationSeries::new(&[hour(1)], &[1.0]).unwrap();
        assert_eq!(ts.sampling_interval(), None);
    }

    #[test]
    fn test_latitude_range() {
        assert!(Latitude::new(0.0).is_ok());
        assert!(Latitude::new(-90.0).is_ok());
        assert!(Latitude::new(90.5).is_err());
        assert!(Latitude::new(f64::NAN).is_err());
    }

    #[test]
    fn test_wrap_degrees() {
        assert!((wrap_degrees(-30.0) - 330.0).abs() < 1e-12);
        assert!((wrap_degrees(725.0) - 5.0).abs() < 1e-12);
        assert_eq!(wrap_degrees(0.0), 0.0);
    }
}
