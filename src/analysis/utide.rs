//! UTide-style harmonic analysis (`ConstituentFitB`).
//!
//! Works directly on the datenum time axis: no sampling interval or start
//! time is passed in. The mean and an optional linear trend are fitted
//! alongside the constituents, referenced to the central time of the record.
//! Reconstruction returns a record whose `h` field holds the prediction.

use tracing::{debug, warn};

use super::constituents::select_constituents;
use super::lsq::{LeastSquaresFit, fit_harmonics};
use super::nodal::factors_for;
use super::strategy::{
    ConstituentDiagnostics, Diagnostics, HarmonicModel, SolverOutput, StrategyKind, hours,
    validate_series,
};
use super::{Latitude, ObservationSeries};
use crate::error::{Result, TideError};

/// Settings for [`ConstituentFitB`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct UTideConfig {
    /// Fit a linear trend
    pub trend: bool,
    /// Rayleigh criterion factor for constituent selection
    pub rayleigh: f64,
    /// Options used when reconstructing through [`HarmonicModel`]
    pub reconstruct: ReconstructOptions,
}

impl Default for UTideConfig {
    fn default() -> Self {
        Self {
            trend: true,
            rayleigh: 1.0,
            reconstruct: ReconstructOptions::default(),
        }
    }
}

impl UTideConfig {
    pub fn with_trend(mut self, trend: bool) -> Self {
        self.trend = trend;
        self
    }

    pub fn with_rayleigh(mut self, rayleigh: f64) -> Self {
        self.rayleigh = rayleigh;
        self
    }

    pub fn with_min_snr(mut self, min_snr: f64) -> Self {
        self.reconstruct.min_snr = min_snr;
        self
    }
}

/// Reconstruction options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ReconstructOptions {
    /// Constituents with SNR below this are excluded (0 = include all)
    pub min_snr: f64,
}

impl Default for ReconstructOptions {
    fn default() -> Self {
        Self { min_snr: 0.0 }
    }
}

/// Reconstructed signal at the requested times.
#[derive(Clone, Debug, PartialEq)]
pub struct UTideReconstruction {
    /// Datenum times
    pub t: Vec<f64>,
    /// Predicted water level
    pub h: Vec<f64>,
}

/// UTide-style constituent fit.
#[derive(Clone, Debug, Default)]
pub struct ConstituentFitB {
    config: UTideConfig,
}

impl ConstituentFitB {
    pub fn new(config: UTideConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &UTideConfig {
        &self.config
    }

    /// Fit a series.
    pub fn fit(
        &self,
        series: &ObservationSeries,
        latitude: Option<Latitude>,
    ) -> Result<UTideModel> {
        let dt = validate_series(series)?;
        self.solve(&series.datenums(), &series.depths(), hours(dt), latitude)
    }

    /// Fit samples at datenum times `t`.
    ///
    /// `dt_hours` only bounds the constituent frequencies (Nyquist).
    pub fn solve(
        &self,
        t: &[f64],
        depths: &[f64],
        dt_hours: f64,
        latitude: Option<Latitude>,
    ) -> Result<UTideModel> {
        if t.len() != depths.len() {
            return Err(TideError::analysis("times and depths must have same length"));
        }

        let (times, values): (Vec<f64>, Vec<f64>) = t
            .iter()
            .zip(depths)
            .filter(|(_, d)| !d.is_nan())
            .map(|(&t, &d)| (t, d))
            .unzip();

        if values.len() < 2 {
            return Err(TideError::analysis(format!(
                "need at least 2 non-missing samples, got {}",
                values.len()
            )));
        }

        let (t_min, t_max) = (times[0], times[times.len() - 1]);
        if t_max <= t_min {
            return Err(TideError::analysis("series covers a zero-length time span"));
        }
        let reftime = (t_min + t_max) / 2.0;
        let record_hours = (t_max - t_min) * 24.0;

        let n_base = 1 + self.config.trend as usize;
        if values.len() < n_base {
            return Err(TideError::analysis(format!(
                "need at least {} samples for mean and trend, got {}",
                n_base,
                values.len()
            )));
        }
        let constituents = select_constituents(
            record_hours,
            dt_hours,
            self.config.rayleigh,
            (values.len() - n_base) / 2,
        );
        if constituents.is_empty() {
            warn!(record_hours, "record too short to resolve any constituent");
        }

        let hours_from_ref: Vec<f64> = times.iter().map(|&t| (t - reftime) * 24.0).collect();
        let nodal = factors_for(&constituents, reftime, latitude.is_some());
        let fit = fit_harmonics(
            &hours_from_ref,
            &values,
            &constituents,
            &nodal,
            true,
            self.config.trend,
        )?;

        debug!(
            constituents = fit.constituents.len(),
            mean = fit.mean,
            r_squared = fit.r_squared,
            "utide fit complete"
        );

        Ok(UTideModel {
            config: self.config,
            reftime,
            latitude,
            n_samples: t.len(),
            fit,
        })
    }
}

/// Model produced by [`ConstituentFitB`].
#[derive(Clone, Debug)]
pub struct UTideModel {
    config: UTideConfig,
    reftime: f64,
    latitude: Option<Latitude>,
    n_samples: usize,
    fit: LeastSquaresFit,
}

impl UTideModel {
    /// Datenum the trend and phases are referenced to.
    pub fn reftime(&self) -> f64 {
        self.reftime
    }

    pub fn mean(&self) -> f64 {
        self.fit.mean
    }

    /// Trend in units per day.
    pub fn slope(&self) -> f64 {
        self.fit.slope * 24.0
    }

    pub fn latitude(&self) -> Option<Latitude> {
        self.latitude
    }

    pub fn fit(&self) -> &LeastSquaresFit {
        &self.fit
    }

    /// Reconstruct at datenum times.
    pub fn reconstruct(&self, t: &[f64], options: &ReconstructOptions) -> UTideReconstruction {
        if t.is_empty() {
            return UTideReconstruction {
                t: Vec::new(),
                h: Vec::new(),
            };
        }
        let centre = (t[0] + t[t.len() - 1]) / 2.0;
        let constituents: Vec<_> = self.fit.constituents.iter().map(|c| c.constituent).collect();
        let nodal = factors_for(&constituents, centre, self.latitude.is_some());

        let h = t
            .iter()
            .map(|&ti| {
                self.fit
                    .evaluate((ti - self.reftime) * 24.0, &nodal, options.min_snr)
            })
            .collect();

        UTideReconstruction { t: t.to_vec(), h }
    }

    /// Percent of the total constituent energy in each constituent.
    fn percent_energy(&self) -> Vec<f64> {
        let total: f64 = self
            .fit
            .constituents
            .iter()
            .map(|c| c.amplitude * c.amplitude)
            .sum();
        self.fit
            .constituents
            .iter()
            .map(|c| {
                if total > 0.0 {
                    100.0 * c.amplitude * c.amplitude / total
                } else {
                    0.0
                }
            })
            .collect()
    }
}

impl HarmonicModel for UTideModel {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConstituentFitB
    }

    fn predict(&self, times: &[f64]) -> Result<SolverOutput> {
        Ok(SolverOutput::Record(
            self.reconstruct(times, &self.config.reconstruct),
        ))
    }

    fn diagnostics(&self) -> Diagnostics {
        let mut scalars = vec![
            ("mean", self.fit.mean),
            ("mean_ci", self.fit.mean_ci),
            ("slope", self.slope()),
            ("reftime", self.reftime),
            ("n_samples", self.n_samples as f64),
            ("residual_variance", self.fit.residual_variance),
            ("r_squared", self.fit.r_squared),
        ];
        if let Some(lat) = self.latitude {
            scalars.push(("latitude", lat.degrees()));
        }

        let constituents = self
            .fit
            .constituents
            .iter()
            .zip(self.percent_energy())
            .map(|(c, pe)| ConstituentDiagnostics {
                name: c.constituent.name.to_string(),
                fields: vec![
                    ("frequency", c.constituent.frequency),
                    ("A", c.amplitude),
                    ("A_ci", c.amplitude_ci),
                    ("g", c.phase),
                    ("g_ci", c.phase_ci),
                    ("SNR", c.snr),
                    ("PE", pe),
                ],
            })
            .collect();

        Diagnostics {
            scalars,
            constituents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::find_constituent;

    fn signal(t: &[f64]) -> Vec<f64> {
        let m2 = find_constituent("M2").unwrap();
        let o1 = find_constituent("O1").unwrap();
        t.iter()
            .map(|&d| {
                let h = (d - 19000.0) * 24.0;
                1.5 + 0.9 * (m2.angular_frequency() * h - 1.0).cos()
                    + 0.25 * (o1.angular_frequency() * h - 0.3).cos()
            })
            .collect()
    }

    fn hourly(days: usize) -> Vec<f64> {
        (0..days * 24).map(|i| 19000.0 + i as f64 / 24.0).collect()
    }

    #[test]
    fn test_fit_and_reconstruct() {
        let t = hourly(30);
        let h = signal(&t);
        let model = ConstituentFitB::default().solve(&t, &h, 1.0, None).unwrap();

        assert!((model.mean() - 1.5).abs() < 0.01);
        assert!(model.slope().abs() < 1e-3);
        let m2 = model.fit().get_constituent("M2").unwrap();
        assert!((m2.amplitude - 0.9).abs() < 1e-3);

        let rec = model.reconstruct(&t, &ReconstructOptions::default());
        assert_eq!(rec.t, t);
        for (a, b) in rec.h.iter().zip(&h) {
            assert!((a - b).abs() < 1e-3);
        }
    }

    #[test]
    fn test_two_samples_fit_mean_and_trend() {
        let t = [19000.0, 19000.0 + 1.0 / 24.0];
        let model = ConstituentFitB::default()
            .solve(&t, &[1.0, 1.2], 1.0, None)
            .unwrap();
        assert!(model.fit().constituents.is_empty());
        let rec = model.reconstruct(&t, &ReconstructOptions::default());
        assert!((rec.h[0] - 1.0).abs() < 1e-9);
        assert!((rec.h[1] - 1.2).abs() < 1e-9);
    }

    #[test]
    fn test_min_snr_excludes_constituents() {
        let t = hourly(30);
        let h: Vec<f64> = signal(&t)
            .iter()
            .enumerate()
            .map(|(i, v)| v + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        let model = ConstituentFitB::new(UTideConfig::default().with_trend(false))
            .solve(&t, &h, 1.0, None)
            .unwrap();

        let everything = model.reconstruct(&t[..3], &ReconstructOptions { min_snr: 0.0 });
        let nothing = model.reconstruct(&t[..3], &ReconstructOptions { min_snr: f64::MAX });
        for v in &nothing.h {
            assert!((v - model.mean()).abs() < 1e-12);
        }
        assert!(everything.h.iter().any(|v| (v - model.mean()).abs() > 0.1));
    }

    #[test]
    fn test_percent_energy_sums_to_100() {
        let t = hourly(30);
        let model = ConstituentFitB::default()
            .solve(&t, &signal(&t), 1.0, Some(Latitude::new(-33.9).unwrap()))
            .unwrap();
        let d = model.diagnostics();
        let total: f64 = d.constituents.iter().filter_map(|c| c.get("PE")).sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(d.scalar("latitude"), Some(-33.9));
        assert_eq!(
            d.field_names(),
            vec!["frequency", "A", "A_ci", "g", "g_ci", "SNR", "PE"]
        );
    }

    #[test]
    fn test_prediction_is_record() {
        let t = hourly(2);
        let model = ConstituentFitB::default().solve(&t, &signal(&t), 1.0, None).unwrap();
        match model.predict(&t[..5]).unwrap() {
            SolverOutput::Record(rec) => assert_eq!(rec.h.len(), 5),
            SolverOutput::Array(_) => panic!("expected record output"),
        }
    }
}
