//! # tide-rs
//!
//! Tidal prediction from observed water-level time series.
//!
//! This crate provides the building blocks of a load → fit → predict run:
//! - Delimited observation file loading with day/month disambiguation
//! - Two least-squares harmonic analysis strategies (T_Tide-style and
//!   UTide-style) behind a common model interface
//! - Nodal corrections for lunar constituents
//! - Prediction windows and the datenum time axis
//! - Diagnostic reports and tab-separated prediction files

pub mod analysis;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod time;

// Re-export main types for convenience
pub use analysis::{
    Analyzer, ConstituentFitA, ConstituentFitB, Diagnostics, HarmonicModel, Latitude,
    ObservationSeries, ReconstructOptions, Strategy, StrategyKind, TTideConfig, UTideConfig,
};
pub use error::{Result, TideError};
pub use io::{
    LoaderOptions, OutputPaths, PredictionFormat, ReconstructedSeries, Separator, format_prediction,
    format_report, load_observations, output_paths, write_outputs,
};
pub use pipeline::{Pipeline, PipelineConfig};
pub use time::{IntervalUnit, PredictionWindow, SamplingInterval};
