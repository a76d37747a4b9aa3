//! Pipeline configuration and runner.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, info_span};

use crate::analysis::{
    Analyzer, Latitude, ObservationSeries, SeriesSummary, Strategy, StrategyKind,
};
use crate::error::{Result, TideError};
use crate::io::{
    LoaderOptions, OutputPaths, PredictionFormat, ReconstructedSeries, format_report,
    load_observations, output_paths, write_outputs,
};
use crate::time::PredictionWindow;

// =============================================================================
// Pipeline Configuration
// =============================================================================

/// Configuration for a pipeline run.
#[derive(Clone, Debug)]
pub struct PipelineConfig {
    /// How to read the observation file.
    pub input: LoaderOptions,
    /// Latitude of the gauge; enables nodal corrections when set.
    pub latitude: Option<Latitude>,
    /// Fitting strategy.
    pub strategy: Strategy,
    /// Base path for output files; results are only returned when unset.
    pub output: Option<PathBuf>,
    /// Layout of the prediction file.
    pub format: PredictionFormat,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input: LoaderOptions::default(),
            latitude: None,
            strategy: Strategy::from_kind(StrategyKind::default()),
            output: None,
            format: PredictionFormat::default(),
        }
    }
}

impl PipelineConfig {
    pub fn with_input(mut self, input: LoaderOptions) -> Self {
        self.input = input;
        self
    }

    pub fn with_latitude(mut self, latitude: Option<Latitude>) -> Self {
        self.latitude = latitude;
        self
    }

    pub fn with_strategy(mut self, strategy: impl Into<Strategy>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_output(mut self, base: impl Into<PathBuf>) -> Self {
        self.output = Some(base.into());
        self
    }

    pub fn with_format(mut self, format: PredictionFormat) -> Self {
        self.format = format;
        self
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Result of fitting without prediction.
#[derive(Clone, Debug)]
pub struct AnalysisOutcome {
    pub series: ObservationSeries,
    /// Rendered report text
    pub report: String,
    /// Where the report was written, if an output base was configured
    pub report_path: Option<PathBuf>,
}

/// Result of a full fit and reconstruction.
#[derive(Clone, Debug)]
pub struct PredictionOutcome {
    pub report: String,
    pub prediction: ReconstructedSeries,
    /// Files written, if an output base was configured
    pub paths: Option<OutputPaths>,
}

// =============================================================================
// Pipeline
// =============================================================================

/// Loader → strategy → emitter driver.
///
/// Each call owns its series and model; nothing is cached between calls.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Load the input and summarize it.
    pub fn inspect(&self, input: &Path) -> Result<SeriesSummary> {
        let series = load_observations(input, &self.config.input)?;
        Ok(series.summary())
    }

    /// Load and fit the input, writing the report if an output is set.
    pub fn analyse(&self, input: &Path) -> Result<AnalysisOutcome> {
        let _span = info_span!("analyse", input = %input.display()).entered();

        let series = load_observations(input, &self.config.input)?;
        let mut analyzer = Analyzer::new(self.config.strategy.clone());
        let model = analyzer.fit(&series, self.config.latitude)?;
        let report = format_report(model);

        let report_path = match &self.config.output {
            Some(base) => {
                let path = output_paths(base, model.kind()).report;
                fs::write(&path, &report).map_err(|e| TideError::io(&path, e))?;
                info!(report = %path.display(), "wrote report");
                Some(path)
            }
            None => None,
        };

        Ok(AnalysisOutcome {
            series,
            report,
            report_path,
        })
    }

    /// Load, fit and reconstruct over a window.
    pub fn predict(&self, input: &Path, window: &PredictionWindow) -> Result<PredictionOutcome> {
        let _span = info_span!("predict", input = %input.display()).entered();

        let series = load_observations(input, &self.config.input)?;
        self.predict_series(&series, window)
    }

    /// Fit an already loaded series and reconstruct over a window.
    pub fn predict_series(
        &self,
        series: &ObservationSeries,
        window: &PredictionWindow,
    ) -> Result<PredictionOutcome> {
        let mut analyzer = Analyzer::new(self.config.strategy.clone());
        analyzer.fit(series, self.config.latitude)?;

        let targets = window.targets();
        info!(
            start = %window.start(),
            end = %window.end(),
            interval = %window.interval(),
            targets = targets.len(),
            "reconstructing prediction window"
        );
        let prediction = analyzer.reconstruct(&targets)?;
        let model = analyzer.model()?;
        let report = format_report(model);

        let paths = match &self.config.output {
            Some(base) => Some(write_outputs(base, model, &prediction, &self.config.format)?),
            None => None,
        };

        Ok(PredictionOutcome {
            report,
            prediction,
            paths,
        })
    }
}
