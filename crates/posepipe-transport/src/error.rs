use std::path::PathBuf;

/// Errors that can occur while opening or creating stream endpoints.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Failed to open the endpoint for reading or writing.
    #[error("failed to open {path}: {source}")]
    Open {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Failed to create a named pipe.
    #[error("failed to create fifo {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The path exists but is not a named pipe.
    #[error("existing path is not a fifo: {path}")]
    NotAFifo { path: PathBuf },

    /// The path cannot be represented as a C string.
    #[error("invalid endpoint path: {path}")]
    InvalidPath { path: PathBuf },

    /// An I/O error occurred on an open stream.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
