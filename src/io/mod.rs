//! Reading observations and writing analysis results.
//!
//! This module provides:
//! - **Loader**: delimited (time, depth) files into an [`ObservationSeries`]
//! - **Report**: strategy-specific diagnostic text
//! - **Prediction**: normalized reconstructions as `timestamp<TAB>depth` rows
//! - **Naming**: output file names derived from a base path
//!
//! # File Formats
//!
//! ## Observation Files
//!
//! One header row, separator one of tab, comma, space or semicolon:
//!
//! ```text
//! Time,Depth
//! 04/03/2020 00:00,1.02
//! 04/03/2020 01:00,1.31
//! ```
//!
//! ## Prediction Files
//!
//! ```text
//! 2020-03-04 00:00:00	1.0214
//! 2020-03-04 01:00:00	1.3377
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use tide_rs::io::{LoaderOptions, Separator, load_observations};
//!
//! let options = LoaderOptions::new("Time", "Depth").with_separator(Separator::Comma);
//! let series = load_observations(Path::new("gauge.csv"), &options)?;
//! println!("{} samples", series.len());
//! ```
//!
//! [`ObservationSeries`]: crate::analysis::ObservationSeries

mod loader;
mod naming;
mod prediction;
mod report;

pub use loader::{
    LoaderOptions, Separator, format_observations, load_observations, parse_timestamp,
    write_observations,
};
pub use naming::{OutputPaths, output_paths, write_outputs};
pub use prediction::{PredictionFormat, ReconstructedSeries, format_prediction, normalize};
pub use report::{format_report, write_report};
