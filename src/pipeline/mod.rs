//! End-to-end tidal prediction runs.
//!
//! Ties the loader, an analysis strategy and the emitter together:
//!
//! ```text
//! load_observations → Analyzer::fit → Analyzer::reconstruct → write_outputs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use tide_rs::pipeline::{Pipeline, PipelineConfig};
//! use tide_rs::time::{PredictionWindow, SamplingInterval};
//!
//! let pipeline = Pipeline::new(PipelineConfig::default().with_output("out/bergen.txt"));
//! let window = PredictionWindow::new(start, end, SamplingInterval::hours(1)?)?;
//! let outcome = pipeline.predict(Path::new("bergen.txt"), &window)?;
//! println!("{} rows", outcome.prediction.len());
//! ```

mod runner;

pub use runner::{AnalysisOutcome, Pipeline, PipelineConfig, PredictionOutcome};
