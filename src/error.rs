use std::path::PathBuf;
use thiserror::Error;

use crate::batch::RecordFailure;

/// Conditions that end a conversion run. Problems with a single record or
/// catalog never show up here; they are collected or logged instead.
#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Cannot read killmails from {description}")]
    Source {
        description: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("No valid killmail data found ({records} records, {} failed)", failures.len())]
    NoData {
        records: usize,
        failures: Vec<RecordFailure>,
    },

    #[error("Failed to write {path:?}")]
    Write {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
