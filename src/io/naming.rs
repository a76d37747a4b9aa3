//! Output file naming and writing.
//!
//! For a base path `dir/name.ext` and strategy tag `ttide`:
//! - report: `dir/name_ttide_report.ext`
//! - prediction: `dir/name_ttide.ext`
//!
//! A base path without an extension gets `.txt`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::prediction::{PredictionFormat, ReconstructedSeries, format_prediction};
use super::report::format_report;
use crate::analysis::{HarmonicModel, StrategyKind};
use crate::error::{Result, TideError};

const DEFAULT_EXTENSION: &str = "txt";

/// Paths of the two output files.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputPaths {
    pub report: PathBuf,
    pub prediction: PathBuf,
}

/// Derive output paths from a base path and strategy.
pub fn output_paths(base: &Path, kind: StrategyKind) -> OutputPaths {
    let stem = base
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let ext = base
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string());
    let tag = kind.tag();

    OutputPaths {
        report: base.with_file_name(format!("{stem}_{tag}_report.{ext}")),
        prediction: base.with_file_name(format!("{stem}_{tag}.{ext}")),
    }
}

/// Write the report and prediction files next to `base`.
///
/// Existing files are truncated.
pub fn write_outputs(
    base: &Path,
    model: &dyn HarmonicModel,
    prediction: &ReconstructedSeries,
    format: &PredictionFormat,
) -> Result<OutputPaths> {
    let paths = output_paths(base, model.kind());

    fs::write(&paths.report, format_report(model)).map_err(|e| TideError::io(&paths.report, e))?;
    fs::write(&paths.prediction, format_prediction(prediction, format))
        .map_err(|e| TideError::io(&paths.prediction, e))?;

    info!(
        report = %paths.report.display(),
        prediction = %paths.prediction.display(),
        rows = prediction.len(),
        "wrote outputs"
    );
    Ok(paths)
}
