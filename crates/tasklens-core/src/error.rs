use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the tasklens engine.
#[derive(Error, Debug)]
pub enum TasklensError {
    /// A source's column set is missing one or more required canonical
    /// fields. The whole source is rejected; other sources in the same
    /// upload are unaffected.
    // The field is `source_name`, not `source`: thiserror reserves `source`
    // for the error cause, and a plain String cannot be one.
    #[error("Source \"{source_name}\" is missing required field(s): {}", missing.join(", "))]
    SchemaMismatch {
        source_name: String,
        missing: Vec<String>,
    },

    /// A source file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Convenience alias used throughout the tasklens crates.
pub type Result<T> = std::result::Result<T, TasklensError>;
