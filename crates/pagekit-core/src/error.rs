//! Error type for pagekit-core operations

use std::path::PathBuf;

use thiserror::Error;

use crate::sanitize::ValidationReport;

#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    /// At least one node has no data envelope; nothing was serialized.
    #[error(
        "editor state is corrupted: {} node(s) have no data envelope",
        .report.unrecoverable_count()
    )]
    UnrecoverableState { report: ValidationReport },

    /// Save metadata failed validation before the state was touched.
    #[error("invalid draft: {0}")]
    InvalidDraft(String),

    /// A save was requested while another one is still in flight.
    #[error("a save is already in progress")]
    SaveInFlight,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// The validation report carried by an unrecoverable-state failure.
    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Error::UnrecoverableState { report } => Some(report),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
