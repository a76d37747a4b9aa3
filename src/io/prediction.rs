//! Reconstructed series and the prediction file format.
//!
//! ```text
//! 2020-03-04 00:00:00	1.0214
//! 2020-03-04 01:00:00	1.3377
//! ```

use chrono::NaiveDateTime;

use crate::analysis::SolverOutput;
use crate::error::{Result, TideError};

/// Timestamp layout of prediction rows.
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Predicted depths aligned one-to-one with the requested timestamps.
#[derive(Clone, Debug, PartialEq)]
pub struct ReconstructedSeries {
    samples: Vec<(NaiveDateTime, f64)>,
}

impl ReconstructedSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[(NaiveDateTime, f64)] {
        &self.samples
    }

    pub fn times(&self) -> Vec<NaiveDateTime> {
        self.samples.iter().map(|(t, _)| *t).collect()
    }

    pub fn depths(&self) -> Vec<f64> {
        self.samples.iter().map(|(_, d)| *d).collect()
    }
}

/// Pair a solver's raw output with the target timestamps.
///
/// Accepts both output shapes: a plain array or a record whose `h` field
/// holds the prediction.
///
/// # Errors
///
/// `Analysis` if the number of predicted values differs from the number of
/// targets.
pub fn normalize(targets: &[NaiveDateTime], output: SolverOutput) -> Result<ReconstructedSeries> {
    let values = match output {
        SolverOutput::Array(values) => values,
        SolverOutput::Record(record) => record.h,
    };

    if values.len() != targets.len() {
        return Err(TideError::analysis(format!(
            "solver returned {} values for {} target times",
            values.len(),
            targets.len()
        )));
    }

    Ok(ReconstructedSeries {
        samples: targets.iter().copied().zip(values).collect(),
    })
}

/// Layout options for the prediction file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PredictionFormat {
    /// Emit a `Time<TAB>Depth` header row
    pub header: bool,
}

impl PredictionFormat {
    pub fn with_header(mut self, header: bool) -> Self {
        self.header = header;
        self
    }
}

/// Render a reconstructed series as `timestamp<TAB>depth` rows.
pub fn format_prediction(series: &ReconstructedSeries, format: &PredictionFormat) -> String {
    let mut out = String::with_capacity(32 * (series.len() + 1));
    if format.header {
        out.push_str("Time\tDepth\n");
    }
    for (t, d) in series.samples() {
        out.push_str(&format!("{}\t{}\n", t.format(TIME_FORMAT), d));
    }
    out
}
