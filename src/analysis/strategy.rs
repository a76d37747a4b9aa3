//! Strategy selection and the fit → reconstruct lifecycle.
//!
//! Fitting strategies are chosen by an explicit [`StrategyKind`] and produce
//! a model behind the narrow [`HarmonicModel`] interface, so the loader and
//! the emitter never depend on a particular solver.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, info};

use super::ttide::{ConstituentFitA, TTideConfig};
use super::utide::{ConstituentFitB, UTideConfig, UTideReconstruction};
use super::{Latitude, ObservationSeries};
use crate::error::{Result, TideError};
use crate::io::{ReconstructedSeries, normalize};
use crate::time::to_datenums;

/// Which harmonic analysis strategy to run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum StrategyKind {
    /// T_Tide-style: explicit interval and start time, mean added back on prediction
    ConstituentFitA,
    /// UTide-style: datenum time axis, SNR-filtered reconstruction
    #[default]
    ConstituentFitB,
}

impl StrategyKind {
    /// Tag used in output file names.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::ConstituentFitA => "ttide",
            Self::ConstituentFitB => "utide",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ConstituentFitA => "T Tide",
            Self::ConstituentFitB => "U Tide",
        }
    }
}

impl FromStr for StrategyKind {
    type Err = TideError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | '-'))
            .collect::<String>()
            .to_lowercase();
        match key.as_str() {
            "ttide" | "a" | "constituentfita" => Ok(Self::ConstituentFitA),
            "utide" | "b" | "constituentfitb" => Ok(Self::ConstituentFitB),
            _ => Err(TideError::configuration(
                "method",
                format!("unknown analysis method '{s}', expected 'ttide' or 'utide'"),
            )),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag())
    }
}

/// Raw prediction as returned by a solver, before normalization.
#[derive(Clone, Debug)]
pub enum SolverOutput {
    /// Predicted values as a plain array
    Array(Vec<f64>),
    /// Predicted values in a record with a named `h` field
    Record(UTideReconstruction),
}

/// Diagnostic fields for one fitted constituent.
#[derive(Clone, Debug, PartialEq)]
pub struct ConstituentDiagnostics {
    pub name: String,
    pub fields: Vec<(&'static str, f64)>,
}

impl ConstituentDiagnostics {
    /// Look up a field by name.
    pub fn get(&self, field: &str) -> Option<f64> {
        self.fields
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, v)| *v)
    }
}

/// Named diagnostic values of a fitted model.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Model-wide values (mean, residual variance, ...)
    pub scalars: Vec<(&'static str, f64)>,
    /// Per-constituent values, ordered by frequency
    pub constituents: Vec<ConstituentDiagnostics>,
}

impl Diagnostics {
    /// Look up a model-wide value.
    pub fn scalar(&self, name: &str) -> Option<f64> {
        self.scalars
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, v)| *v)
    }

    /// Look up a constituent by name.
    pub fn constituent(&self, name: &str) -> Option<&ConstituentDiagnostics> {
        self.constituents.iter().find(|c| c.name == name)
    }

    /// Field names of the per-constituent table, in order.
    pub fn field_names(&self) -> Vec<&'static str> {
        self.constituents
            .first()
            .map(|c| c.fields.iter().map(|(n, _)| *n).collect())
            .unwrap_or_default()
    }
}

/// A fitted harmonic model.
pub trait HarmonicModel: fmt::Debug + Send + Sync {
    /// Strategy that produced this model.
    fn kind(&self) -> StrategyKind;

    /// Evaluate the solver at datenum times.
    fn predict(&self, times: &[f64]) -> Result<SolverOutput>;

    /// Diagnostic parameters of the fit.
    fn diagnostics(&self) -> Diagnostics;

    /// Reconstruct the water level at the target timestamps.
    fn reconstruct(&self, targets: &[NaiveDateTime]) -> Result<ReconstructedSeries> {
        let output = self.predict(&to_datenums(targets))?;
        normalize(targets, output)
    }
}

/// A configured fitting strategy.
#[derive(Clone, Debug)]
pub enum Strategy {
    A(ConstituentFitA),
    B(ConstituentFitB),
}

impl Strategy {
    /// Strategy of the given kind with default settings.
    pub fn from_kind(kind: StrategyKind) -> Self {
        match kind {
            StrategyKind::ConstituentFitA => Self::A(ConstituentFitA::new(TTideConfig::default())),
            StrategyKind::ConstituentFitB => Self::B(ConstituentFitB::new(UTideConfig::default())),
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::A(_) => StrategyKind::ConstituentFitA,
            Self::B(_) => StrategyKind::ConstituentFitB,
        }
    }

    /// Fit a model to the series.
    pub fn fit(
        &self,
        series: &ObservationSeries,
        latitude: Option<Latitude>,
    ) -> Result<Box<dyn HarmonicModel>> {
        let model: Box<dyn HarmonicModel> = match self {
            Self::A(s) => Box::new(s.fit(series, latitude)?),
            Self::B(s) => Box::new(s.fit(series, latitude)?),
        };
        Ok(model)
    }
}

impl From<ConstituentFitA> for Strategy {
    fn from(s: ConstituentFitA) -> Self {
        Self::A(s)
    }
}

impl From<ConstituentFitB> for Strategy {
    fn from(s: ConstituentFitB) -> Self {
        Self::B(s)
    }
}

/// Holds a strategy and, once fitted, its model.
///
/// Reconstruction before a successful fit is an error.
#[derive(Debug)]
pub struct Analyzer {
    strategy: Strategy,
    model: Option<Box<dyn HarmonicModel>>,
}

impl Analyzer {
    pub fn new(strategy: impl Into<Strategy>) -> Self {
        Self {
            strategy: strategy.into(),
            model: None,
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    pub fn is_fitted(&self) -> bool {
        self.model.is_some()
    }

    /// Fit the strategy, replacing any previous model.
    pub fn fit(
        &mut self,
        series: &ObservationSeries,
        latitude: Option<Latitude>,
    ) -> Result<&dyn HarmonicModel> {
        self.model = None;
        info!(
            method = self.strategy.kind().tag(),
            samples = series.len(),
            latitude = latitude.map(|l| l.degrees()),
            "fitting harmonic model"
        );
        let model = self.strategy.fit(series, latitude)?;
        Ok(&**self.model.insert(model))
    }

    /// The fitted model.
    pub fn model(&self) -> Result<&dyn HarmonicModel> {
        self.model
            .as_deref()
            .ok_or_else(|| TideError::analysis("model has not been fitted"))
    }

    /// Reconstruct at the target timestamps.
    pub fn reconstruct(&self, targets: &[NaiveDateTime]) -> Result<ReconstructedSeries> {
        let model = self.model()?;
        debug!(targets = targets.len(), "reconstructing");
        model.reconstruct(targets)
    }

    /// Diagnostics of the fitted model.
    pub fn diagnostics(&self) -> Result<Diagnostics> {
        Ok(self.model()?.diagnostics())
    }
}

/// Check that a series can be fitted and return its sampling interval.
pub(crate) fn validate_series(series: &ObservationSeries) -> Result<TimeDelta> {
    if series.len() < 2 {
        return Err(TideError::analysis(format!(
            "need at least 2 samples, got {}",
            series.len()
        )));
    }
    if series.valid_count() < 2 {
        return Err(TideError::analysis(format!(
            "need at least 2 non-missing samples, got {}",
            series.valid_count()
        )));
    }
    if series.duration() <= TimeDelta::zero() {
        return Err(TideError::analysis("series covers a zero-length time span"));
    }
    match series.sampling_interval() {
        Some(dt) if dt > TimeDelta::zero() => Ok(dt),
        _ => Err(TideError::analysis("derived sampling interval is not positive")),
    }
}

/// Interval in fractional hours.
pub(crate) fn hours(dt: TimeDelta) -> f64 {
    dt.num_milliseconds() as f64 / 3_600_000.0
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
    fn test_parse_kind() {
        assert_eq!("ttide".parse::<StrategyKind>().unwrap(), StrategyKind::ConstituentFitA);
        assert_eq!("T Tide".parse::<StrategyKind>().unwrap(), StrategyKind::ConstituentFitA);
        assert_eq!("U_Tide".parse::<StrategyKind>().unwrap(), StrategyKind::ConstituentFitB);
        assert_eq!("b".parse::<StrategyKind>().unwrap(), StrategyKind::ConstituentFitB);
    }

    #[test]
    fn test_unknown_kind_is_configuration_error() {
        let err = "xtide".parse::<StrategyKind>().unwrap_err();
        assert!(matches!(err, TideError::Configuration { ref field, .. } if field == "method"));
    }

    #[test]
    fn test_reconstruct_before_fit_fails() {
        for kind in [StrategyKind::ConstituentFitA, StrategyKind::ConstituentFitB] {
            let analyzer = Analyzer::new(Strategy::from_kind(kind));
            assert!(!analyzer.is_fitted());
            let err = analyzer.reconstruct(&[hour(0)]).unwrap_err();
            assert!(matches!(err, TideError::Analysis(_)));
            assert!(analyzer.diagnostics().is_err());
        }
    }

    #[test]
    fn test_failed_fit_clears_previous_model() {
        let mut analyzer = Analyzer::new(Strategy::from_kind(StrategyKind::ConstituentFitB));
        let good = ObservationSeries::new(&[hour(0), hour(1)], &[1.0, 1.2]).unwrap();
        analyzer.fit(&good, None).unwrap();
        assert!(analyzer.is_fitted());

        let bad = ObservationSeries::new(&[hour(0)], &[1.0]).unwrap();
        assert!(analyzer.fit(&bad, None).is_err());
        assert!(!analyzer.is_fitted());
    }

    #[test]
    fn test_validate_series() {
        let one = ObservationSeries::new(&[hour(0)], &[1.0]).unwrap();
        assert!(validate_series(&one).is_err());

        let missing = ObservationSeries::new(&[hour(0), hour(1)], &[1.0, f64::NAN]).unwrap();
        assert!(validate_series(&missing).is_err());

        let ok = ObservationSeries::new(&[hour(0), hour(2)], &[1.0, 2.0]).unwrap();
        assert_eq!(validate_series(&ok).unwrap(), TimeDelta::hours(2));
    }

    #[test]
    fn test_diagnostics_lookup() {
        let d = Diagnostics {
            scalars: vec![("mean", 1.5)],
            constituents: vec![ConstituentDiagnostics {
                name: "M2".into(),
                fields: vec![("A", 0.5), ("g", 12.0)],
            }],
        };
        assert_eq!(d.scalar("mean"), Some(1.5));
        assert_eq!(d.constituent("M2").unwrap().get("g"), Some(12.0));
        assert_eq!(d.field_names(), vec!["A", "g"]);
        assert!(d.constituent("S2").is_none());
    }
}
