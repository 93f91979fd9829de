use std::fmt::Write;
use thiserror::Error;

/// Formats an error and its entire source chain with each error on a new line
///
/// This produces output like:
/// ```
/// Error message
///   Caused by: First cause
///   Caused by: Second cause
///   Caused by: Root cause
/// ```
pub fn format_error_chain(err: &dyn std::error::Error) -> String {
    let mut output = String::new();
    write!(&mut output, "{}", err).ok();

    let mut source = err.source();
    while let Some(err) = source {
        write!(&mut output, "\n  Caused by: {}", err).ok();
        source = err.source();
    }

    output
}

impl PartialEq for AppError {
    fn eq(&self, _other: &Self) -> bool {
        false
    }
}

/// The four error kinds described in the control plane's error handling
/// design, in order of severity. Queue and cron handlers inspect this to
/// decide whether to delete an inbound message or leave it for redelivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    NotFound,
    BadRequest,
    Unexpected,
    UpstreamDegraded,
}

/// Central application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    #[error("Database migration error: {0}")]
    DatabaseMigration(String),

    /// Queue client errors (send/receive/delete against the inbound or
    /// scheduler queue)
    #[error("Queue error: {0}")]
    Queue(String),

    /// Blob store errors (plan upload)
    #[error("Blob store error: {0}")]
    Blob(String),

    /// Artifact repository errors
    #[error("Artifact repository error: {0}")]
    Artifactory(String),

    /// HTTP client errors (callback POSTs, artifact repository calls)
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/Deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// Parsing errors (version specifiers, etc.)
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Chrono parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors with context
    #[error("Internal error: {0}")]
    Internal(String),

    /// Not found errors
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A queue message named a command this worker doesn't handle
    #[error("Unrecognized command: {0}")]
    UnrecognizedCommand(String),

    /// An HTTP callback to a caller-supplied URL failed
    #[error("Callback delivery failed: {0}")]
    CallbackFailed(String),
}

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn severity(&self) -> Severity {
        match self {
            AppError::NotFound(_) => Severity::NotFound,
            AppError::InvalidInput(_) | AppError::Parse(_) | AppError::UnrecognizedCommand(_) => {
                Severity::BadRequest
            }
            AppError::CallbackFailed(_) => Severity::UpstreamDegraded,
            _ => Severity::Unexpected,
        }
    }
}

// Implement From for common error types that don't have automatic conversion
impl From<String> for AppError {
    fn from(s: String) -> Self {
        AppError::Internal(s)
    }
}

impl From<&str> for AppError {
    fn from(s: &str) -> Self {
        AppError::Internal(s.to_string())
    }
}
