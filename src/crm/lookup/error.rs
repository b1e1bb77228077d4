use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, LookupError>;

/// Error type covering every failure the lookup tool can surface to the user.
///
/// Each variant renders as a single human-readable message; none of them is
/// fatal to the interactive shell.
#[derive(Debug, Error)]
pub enum LookupError {
    /// Bad credentials, a rejected token exchange, or a failed identity fetch.
    #[error("login failed: {0}")]
    AuthenticationFailure(String),

    /// A query was attempted without a live session.
    #[error("please login first")]
    Unauthenticated,

    /// The user dismissed a prompt that the current action depends on.
    #[error("cancelled by user")]
    UserCancelled,

    /// Writing an export file failed. A partially written file may remain.
    #[error("could not write {path}: {reason}")]
    ExportWrite { path: PathBuf, reason: String },

    /// Export was requested before any query produced a table.
    #[error("no query results to export")]
    NothingToExport,

    /// The remote service answered with a non-success status.
    #[error("remote service error ({status}): {message}")]
    Remote { status: u16, message: String },

    /// Transport level failures (DNS, TLS, timeouts).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Errors bubbled up from the CSV writer.
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    /// Errors bubbled up from the Excel writer implementation.
    #[error("Excel write error: {0}")]
    ExcelWrite(#[from] rust_xlsxwriter::XlsxError),

    /// Raised when a SOAP response cannot be parsed.
    #[error("XML error: {0}")]
    Xml(String),

    /// Wrapper for IO failures outside of exports.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the app registration cannot be assembled from its sources.
    #[error("configuration error: {0}")]
    Config(#[from] figment::Error),

    /// Raised when typed input does not name anything the tool knows.
    #[error("{0}")]
    InvalidInput(String),

    /// Raised when an export destination has no recognised format.
    #[error("unsupported export format: {0}")]
    UnsupportedFormat(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl From<quick_xml::Error> for LookupError {
    fn from(error: quick_xml::Error) -> Self {
        LookupError::Xml(error.to_string())
    }
}
