//! Error types and result aliases for scout.
//!
//! Errors are structured for programmatic handling: configuration problems
//! are fatal at startup, upstream failures are tolerated and logged, and
//! storage failures on the callback path must surface to the caller.

/// The result type used throughout scout.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in scout operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid or missing configuration detected at startup.
    #[error("configuration error: {message}")]
    Config {
        /// Description of what is wrong with the configuration.
        message: String,
    },

    /// A result-store operation failed.
    #[error("storage error: {message}")]
    Storage {
        /// Description of the storage failure.
        message: String,
        /// The underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A serialization or deserialization error occurred.
    #[error("serialization error: {message}")]
    Serialization {
        /// Description of the serialization failure.
        message: String,
    },

    /// A call to the external task-execution API failed.
    #[error("upstream error: {message}")]
    Upstream {
        /// Description of the upstream failure.
        message: String,
    },

    /// The requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An internal error occurred that should not happen in normal operation.
    #[error("internal error: {message}")]
    Internal {
        /// Description of the internal error.
        message: String,
    },
}

impl Error {
    /// Creates a new configuration error with the given message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a new storage error with the given message.
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new storage error with a source cause.
    #[must_use]
    pub fn storage_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Creates a new upstream error with the given message.
    #[must_use]
    pub fn upstream(message: impl Into<String>) -> Self {
        Self::Upstream {
            message: message.into(),
        }
    }
}
