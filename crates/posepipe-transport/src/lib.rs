//! Stream endpoints for the frame and landmark pipes.
//!
//! An endpoint is either a filesystem path (a named pipe, or a regular file
//! for recorded streams) or the process's own stdin/stdout. Everything above
//! this crate only sees [`PipeReader`] and [`PipeWriter`].

pub mod endpoint;
pub mod error;
pub mod stream;

#[cfg(unix)]
pub mod fifo;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use stream::{PipeReader, PipeWriter};

#[cfg(unix)]
pub use fifo::{create_fifo, is_fifo, DEFAULT_FIFO_MODE};
