//! Error types for the vax_core library.

use std::io;

use chrono::NaiveDate;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for vax_core operations
///
/// The `Display` output of each variant is the single outcome line the
/// shell prints when a command fails.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Malformed arguments, bad date/number format, weak password
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session/role precondition not met
    #[error("{0}")]
    Unauthorized(String),

    /// Unknown vaccine or username
    #[error("{0} not found!")]
    NotFound(String),

    /// Duplicate username or duplicate availability
    #[error("{0}")]
    Conflict(String),

    /// Vaccine exists but has no doses left
    #[error("There are 0 doses of the {0} vaccine available!")]
    OutOfStock(String),

    /// No caregiver has an open slot on the requested date
    #[error("There are no caregivers available on {0}!")]
    NoAvailability(NaiveDate),

    /// Underlying persistence error
    #[error("Storage failure: {0}")]
    Storage(#[from] rusqlite::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Error category, independent of the message payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    NotFound,
    Conflict,
    OutOfStock,
    NoAvailability,
    StorageFailure,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Unauthorized(_) => ErrorKind::Unauthorized,
            Error::NotFound(_) => ErrorKind::NotFound,
            Error::Conflict(_) => ErrorKind::Conflict,
            Error::OutOfStock(_) => ErrorKind::OutOfStock,
            Error::NoAvailability(_) => ErrorKind::NoAvailability,
            Error::Storage(_) => ErrorKind::StorageFailure,
            Error::Io(_) | Error::Json(_) | Error::Csv(_) | Error::Toml(_) | Error::Config(_) => {
                ErrorKind::Other
            }
        }
    }
}

/// Returns true if `err` is a UNIQUE or PRIMARY KEY violation.
///
/// Foreign-key and CHECK failures are not duplicates and stay storage errors.
pub(crate) fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
