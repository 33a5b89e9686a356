//! Error types for ingest operations

use symtree_domain::DomainError;

/// Result type alias for ingest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for ingest operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A line that does not parse as the expected record
    #[error("Invalid record on line {line}: {message}")]
    InvalidRecord {
        /// 1-based line number in the feed
        line: usize,
        /// Error description
        message: String,
    },

    /// A line that is not valid UTF-8
    #[error("UTF-8 conversion failed on line {line}: {message}")]
    Utf8 {
        /// 1-based line number in the feed
        line: usize,
        /// Error description
        message: String,
    },

    /// The byte source failed
    #[error("Source error: {0}")]
    Source(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Unusable configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Input arrived after the ingest reached a terminal state
    #[error("Ingest already finished")]
    Finished,

    /// The task running a build panicked or was cancelled
    #[error("Build task failed: {0}")]
    Task(String),

    /// Error raised by the tree builder
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl Error {
    /// Create an invalid record error
    pub fn invalid_record(line: usize, message: impl Into<String>) -> Self {
        Self::InvalidRecord {
            line,
            message: message.into(),
        }
    }

    /// Create a UTF-8 error
    pub fn utf8(line: usize, message: impl Into<String>) -> Self {
        Self::Utf8 {
            line,
            message: message.into(),
        }
    }

    /// Create a source error
    pub fn source(message: impl Into<String>) -> Self {
        Self::Source(message.into())
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// True for errors caused by the input data rather than the setup
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidRecord { .. } | Self::Utf8 { .. } | Self::Source(_) | Self::Io(_)
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}
