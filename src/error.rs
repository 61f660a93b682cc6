use std::path::PathBuf;

use thiserror::Error;

/// Everything that can abort a report. All variants are fatal to the
/// invocation: a run either fully parses or no report is produced.
#[derive(Error, Debug)]
pub enum CovlensError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{path}:{line}: unrecognized coverage record: {content:?}")]
    MalformedRecord {
        path: PathBuf,
        /// Physical line number within the record file (1-based).
        line: usize,
        content: String,
    },

    #[error("{path}: expected line {expected}, found line {found}")]
    Sequence {
        path: PathBuf,
        expected: u32,
        found: u32,
    },

    #[error("duplicate coverage for '{source_file}': {first} and {second}")]
    DuplicateFile {
        /// The logical source path declared by both record files.
        source_file: String,
        first: PathBuf,
        second: PathBuf,
    },
}

impl CovlensError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CovlensError>;
