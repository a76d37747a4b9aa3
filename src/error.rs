//! Error types for the tidal prediction pipeline.
//!
//! Every failure is one of four kinds. All of them are fatal to the pipeline
//! invocation that raised them and carry enough context (field, file, row)
//! to produce a user-facing message.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, TideError>;

/// Errors that can occur while loading, analysing or emitting tidal data.
#[derive(Debug, Error)]
pub enum TideError {
    /// Invalid or unsupported configuration choice.
    #[error("Configuration error in '{field}': {message}")]
    Configuration { field: String, message: String },

    /// Input data does not match the expected layout.
    #[error(
        "Data format error in {}{}{}: {message}",
        .path.display(),
        row_suffix(.row),
        column_suffix(.column)
    )]
    DataFormat {
        path: PathBuf,
        row: Option<usize>,
        column: Option<String>,
        message: String,
    },

    /// File could not be opened, read or written.
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Degenerate input or numerical failure inside a strategy.
    #[error("Analysis error: {0}")]
    Analysis(String),
}

impl TideError {
    /// Create a configuration error.
    pub fn configuration(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a data format error for a whole file.
    pub fn data_format(path: &Path, message: impl Into<String>) -> Self {
        Self::DataFormat {
            path: path.to_path_buf(),
            row: None,
            column: None,
            message: message.into(),
        }
    }

    /// Create a data format error for a specific row and column.
    pub fn bad_field(
        path: &Path,
        row: usize,
        column: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::DataFormat {
            path: path.to_path_buf(),
            row: Some(row),
            column: Some(column.into()),
            message: message.into(),
        }
    }

    /// Wrap an I/O error with the path it occurred on.
    pub fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an analysis error.
    pub fn analysis(message: impl Into<String>) -> Self {
        Self::Analysis(message.into())
    }

    /// Short name of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::DataFormat { .. } => "data_format",
            Self::Io { .. } => "io",
            Self::Analysis(_) => "analysis",
        }
    }
}

fn row_suffix(row: &Option<usize>) -> String {
    match row {
        Some(r) => format!(", row {r}"),
        None => String::new(),
    }
}

fn column_suffix(column: &Option<String>) -> String {
    match column {
        Some(c) => format!(", column '{c}'"),
        None => String::new(),
    }
}
