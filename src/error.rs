use std::path::PathBuf;
use thiserror::Error;

/// Error taxonomy for the engagement pipeline. Transformer and loader return
/// these directly; nothing is swallowed except the documented duplicate-key
/// skip in the loader, which is policy, not failure.
#[derive(Debug, Error)]
pub enum Error {
    /// A caller-supplied parameter failed a precondition.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The referenced source file does not exist.
    #[error("source file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// The source exists but could not be parsed as tabular data.
    #[error("source `{path}` is not parseable as tabular data: {reason}")]
    Malformed { path: PathBuf, reason: String },

    /// The source parsed, but an expected column is absent.
    #[error("expected column `{0}` is missing from the source")]
    Schema(String),

    /// Could not open a connection to the relational store.
    #[error("database connection failed")]
    Connection(#[source] duckdb::Error),

    /// A persistence statement failed; the whole batch is aborted.
    #[error("database write failed")]
    Write(#[source] duckdb::Error),

    #[error("i/o error")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
