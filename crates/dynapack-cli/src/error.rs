//! Error types for dynapack-cli

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

/// Errors that can occur in CLI operations
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Error from dynapack-core
    #[error(transparent)]
    Core(#[from] dynapack_core::Error),

    /// Error from dynapack-meta
    #[error(transparent)]
    Meta(#[from] dynapack_meta::Error),

    /// A requested package did not load
    #[error(transparent)]
    Load(#[from] dynapack_core::LoadFailure),

    /// Descriptor could not be rendered
    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Standard I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
