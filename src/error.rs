//! Error types for the compilation pipeline.
//!
//! Only batch-fatal conditions live here; degrade-and-warn situations are
//! collected as plain warning strings by each stage and logged by the driver.

use std::path::PathBuf;

use thiserror::Error;

/// Fatal errors that abort the whole compilation batch.
#[derive(Debug, Error)]
pub enum Error {
    /// The spec directory does not exist or is not a directory.
    #[error("specification directory does not exist: {}", .0.display())]
    SpecDirMissing(PathBuf),

    /// The spec directory contained no parseable documents.
    #[error("no valid specifications found in {}", .0.display())]
    EmptySpecSet(PathBuf),

    /// One document in the batch failed to parse; the whole batch aborts.
    #[error("failed to parse specification {}: {message}", .path.display())]
    SpecParse { path: PathBuf, message: String },

    /// An array schema referenced a model before the object pass created it.
    /// This is a pass-ordering invariant violation, not a data problem.
    #[error("referenced model '{target}' not found while creating array '{array}'")]
    MissingArrayTarget { array: String, target: String },

    /// A configuration file (rename table, wrapper list) failed to load.
    #[error("failed to load config {}: {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an I/O error with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
