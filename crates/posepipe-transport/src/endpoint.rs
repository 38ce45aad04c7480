use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::{PipeReader, PipeWriter};

/// Where a stream comes from or goes to.
///
/// `-` selects the process's stdin (for reading) or stdout (for writing).
/// Any other value is a filesystem path: a named pipe in normal operation,
/// or a regular file when replaying or recording a stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    Stdio,
    Path(PathBuf),
}

impl Endpoint {
    /// Open the endpoint for reading.
    ///
    /// Opening a named pipe blocks until a writer opens the other end.
    pub fn open_reader(&self) -> Result<PipeReader> {
        match self {
            Endpoint::Stdio => {
                debug!("reading from stdin");
                Ok(PipeReader::stdin())
            }
            Endpoint::Path(path) => {
                debug!(?path, "opening endpoint for reading");
                let file = std::fs::File::open(path).map_err(|e| open_error(path, e))?;
                Ok(PipeReader::from_file(file, path.display().to_string()))
            }
        }
    }

    /// Open the endpoint for writing.
    ///
    /// Opening a named pipe blocks until a reader opens the other end. A
    /// missing path is created as a regular file.
    pub fn open_writer(&self) -> Result<PipeWriter> {
        match self {
            Endpoint::Stdio => {
                debug!("writing to stdout");
                Ok(PipeWriter::stdout())
            }
            Endpoint::Path(path) => {
                debug!(?path, "opening endpoint for writing");
                let file = std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .map_err(|e| open_error(path, e))?;
                Ok(PipeWriter::from_file(file, path.display().to_string()))
            }
        }
    }

    /// The filesystem path, if this endpoint is not stdio.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Endpoint::Stdio => None,
            Endpoint::Path(path) => Some(path),
        }
    }
}

fn open_error(path: &Path, source: std::io::Error) -> TransportError {
    TransportError::Open {
        path: path.to_path_buf(),
        source,
    }
}

impl FromStr for Endpoint {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        if s == "-" {
            Ok(Endpoint::Stdio)
        } else {
            Ok(Endpoint::Path(PathBuf::from(s)))
        }
    }
}

impl From<PathBuf> for Endpoint {
    fn from(path: PathBuf) -> Self {
        Endpoint::Path(path)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Stdio => f.write_str("-"),
            Endpoint::Path(path) => write!(f, "{}", path.display()),
        }
    }
}
