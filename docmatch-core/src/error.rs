//! Error types for configuration and setup.
//!
//! The matching algorithms themselves never fail on data: malformed or sparse input
//! degrades to a smaller mapping. Errors only arise while loading configuration or
//! compiling the configured pattern lists.

/// Result type alias for fallible setup operations.
pub type Result<T> = std::result::Result<T, ReconcileError>;

#[derive(Debug, thiserror::Error)]
pub enum ReconcileError {
    /// A configured regex failed to compile
    #[error("Invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
