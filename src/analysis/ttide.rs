//! T_Tide-style harmonic analysis (`ConstituentFitA`).
//!
//! The solver is handed an explicit sampling interval in hours and the
//! datenum of the first sample; sample `i` is taken to lie at
//! `stime + i * dt`. The series mean is removed before fitting, so the solver
//! itself predicts anomalies and the strategy adds the mean back.

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
use crate::time::to_datenum;

/// Settings for [`ConstituentFitA`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TTideConfig {
    /// Minimum SNR for a constituent to enter the prediction (0 = all)
    pub synth: f64,
    /// Rayleigh criterion factor for constituent selection
    pub rayleigh: f64,
}

impl Default for TTideConfig {
    fn default() -> Self {
        Self {
            synth: 0.0,
            rayleigh: 1.0,
        }
    }
}

impl TTideConfig {
    pub fn with_synth(mut self, synth: f64) -> Self {
        self.synth = synth;
        self
    }

    pub fn with_rayleigh(mut self, rayleigh: f64) -> Self {
        self.rayleigh = rayleigh;
        self
    }
}

/// T_Tide-style constituent fit.
#[derive(Clone, Debug, Default)]
pub struct ConstituentFitA {
    config: TTideConfig,
}

impl ConstituentFitA {
    pub fn new(config: TTideConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TTideConfig {
        &self.config
    }

    /// Fit a series, deriving the interval from its first two samples.
    pub fn fit(
        &self,
        series: &ObservationSeries,
        latitude: Option<Latitude>,
    ) -> Result<TTideModel> {
        let dt = validate_series(series)?;
        let stime = to_datenum(&series.samples()[0].time);
        self.solve(&series.depths(), hours(dt), stime, latitude)
    }

    /// Fit evenly spaced samples.
    ///
    /// `dt_hours` is the sampling interval and `stime` the datenum of the
    /// first sample. `NaN` values are gaps.
    pub fn solve(
        &self,
        depths: &[f64],
        dt_hours: f64,
        stime: f64,
        latitude: Option<Latitude>,
    ) -> Result<TTideModel> {
        if !(dt_hours > 0.0) {
            return Err(TideError::analysis(format!(
                "sampling interval must be positive, got {dt_hours} h"
            )));
        }

        let (times, values): (Vec<f64>, Vec<f64>) = depths
            .iter()
            .enumerate()
            .filter(|(_, d)| !d.is_nan())
            .map(|(i, &d)| (i as f64 * dt_hours, d))
            .unzip();

        if values.len() < 2 {
            return Err(TideError::analysis(format!(
                "need at least 2 non-missing samples, got {}",
                values.len()
            )));
        }

        let mean = values.iter().sum::<f64>() / values.len() as f64;
        let demeaned: Vec<f64> = values.iter().map(|v| v - mean).collect();

        let record_hours = dt_hours * (depths.len() - 1) as f64;
        let constituents = select_constituents(
            record_hours,
            dt_hours,
            self.config.rayleigh,
            values.len() / 2,
        );
        if constituents.is_empty() {
            warn!(record_hours, "record too short to resolve any constituent, fitting mean only");
        }

        let centre = stime + record_hours / 48.0;
        let nodal = factors_for(&constituents, centre, latitude.is_some());
        let fit = fit_harmonics(&times, &demeaned, &constituents, &nodal, false, false)?;

        debug!(
            constituents = fit.constituents.len(),
            r_squared = fit.r_squared,
            "t_tide fit complete"
        );

        Ok(TTideModel {
            config: self.config,
            stime,
            dt_hours,
            mean,
            latitude,
            n_samples: depths.len(),
            fit,
        })
    }
}

/// Model produced by [`ConstituentFitA`].
#[derive(Clone, Debug)]
pub struct TTideModel {
    config: TTideConfig,
    stime: f64,
    dt_hours: f64,
    mean: f64,
    latitude: Option<Latitude>,
    n_samples: usize,
    fit: LeastSquaresFit,
}

impl TTideModel {
    /// Mean removed before fitting.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Datenum of the first fitted sample.
    pub fn start_time(&self) -> f64 {
        self.stime
    }

    pub fn interval_hours(&self) -> f64 {
        self.dt_hours
    }

    pub fn latitude(&self) -> Option<Latitude> {
        self.latitude
    }

    pub fn fit(&self) -> &LeastSquaresFit {
        &self.fit
    }

    /// Solver prediction at datenum times, without the mean.
    pub fn predict_anomaly(&self, times: &[f64]) -> Vec<f64> {
        if times.is_empty() {
            return Vec::new();
        }
        let centre = (times[0] + times[times.len() - 1]) / 2.0;
        let constituents: Vec<_> = self.fit.constituents.iter().map(|c| c.constituent).collect();
        let nodal = factors_for(&constituents, centre, self.latitude.is_some());

        times
            .iter()
            .map(|&t| self.fit.evaluate((t - self.stime) * 24.0, &nodal, self.config.synth))
            .collect()
    }
}

impl HarmonicModel for TTideModel {
    fn kind(&self) -> StrategyKind {
        StrategyKind::ConstituentFitA
    }

    fn predict(&self, times: &[f64]) -> Result<SolverOutput> {
        let anomaly = self.predict_anomaly(times);
        Ok(SolverOutput::Array(anomaly.into_iter().map(|h| h + self.mean).collect()))
    }

    fn diagnostics(&self) -> Diagnostics {
        let mut scalars = vec![
            ("mean", self.mean),
            ("dt_hours", self.dt_hours),
            ("stime", self.stime),
            ("n_samples", self.n_samples as f64),
            ("residual_variance", self.fit.residual_variance),
            ("r_squared", self.fit.r_squared),
            ("synth", self.config.synth),
        ];
        if let Some(lat) = self.latitude {
            scalars.push(("latitude", lat.degrees()));
        }

        let constituents = self
            .fit
            .constituents
            .iter()
            .map(|c| ConstituentDiagnostics {
                name: c.constituent.name.to_string(),
                fields: vec![
                    ("freq", c.constituent.frequency),
                    ("amp", c.amplitude),
                    ("amp_err", c.amplitude_ci),
                    ("pha", c.phase),
                    ("pha_err", c.phase_ci),
                    ("snr", c.snr),
                ],
            })
            .collect();

        Diagnostics {
            scalars,
            constituents,
        }
    }
}
