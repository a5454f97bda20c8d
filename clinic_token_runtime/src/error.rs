//! Runtime error types.

use std::path::PathBuf;

use clinic_token_engine::validation::ValidationError;
use thiserror::Error;

/// Errors raised by ledger persistence and session operations.
///
/// `Validation` is the only recoverable class: the caller shows the
/// message and the receptionist resubmits. Everything else is a storage
/// failure of the triggering action.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger row {row}: cannot parse Date {value:?} as a timestamp")]
    Timestamp { row: usize, value: String },

    #[error("Ledger header mismatch: expected {expected:?}, found {found:?}")]
    Header { expected: String, found: String },

    #[error("Ledger {} was modified by another session; reload and resubmit", .path.display())]
    ConcurrentModification { path: PathBuf },

    #[error("Session lock poisoned by a panicked thread")]
    LockPoisoned,

    #[error("Settings error: {0}")]
    Settings(String),
}

impl LedgerError {
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }
}

impl From<config::ConfigError> for LedgerError {
    fn from(err: config::ConfigError) -> Self {
        LedgerError::Settings(err.to_string())
    }
}
