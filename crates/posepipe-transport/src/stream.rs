use std::io::{Read, Write};

/// The inbound half of a pipeline: a readable byte stream.
///
/// Wraps a named pipe or regular file, or the process's stdin.
pub struct PipeReader {
    inner: PipeReaderInner,
    label: String,
}

enum PipeReaderInner {
    File(std::fs::File),
    Stdin(std::io::Stdin),
}

impl PipeReader {
    /// Wrap an open file (named pipe or regular file).
    pub fn from_file(file: std::fs::File, label: impl Into<String>) -> Self {
        Self {
            inner: PipeReaderInner::File(file),
            label: label.into(),
        }
    }

    /// Read from the process's stdin.
    pub fn stdin() -> Self {
        Self {
            inner: PipeReaderInner::Stdin(std::io::stdin()),
            label: "stdin".to_string(),
        }
    }

    /// Human-readable name of the endpoint for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            PipeReaderInner::File(file) => file.read(buf),
            PipeReaderInner::Stdin(stdin) => stdin.read(buf),
        }
    }
}

impl std::fmt::Debug for PipeReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.inner {
            PipeReaderInner::File(_) => "file",
            PipeReaderInner::Stdin(_) => "stdin",
        };
        f.debug_struct("PipeReader")
            .field("type", &kind)
            .field("label", &self.label)
            .finish()
    }
}

/// The outbound half of a pipeline: a writable byte stream.
pub struct PipeWriter {
    inner: PipeWriterInner,
    label: String,
}

enum PipeWriterInner {
    File(std::fs::File),
    Stdout(std::io::Stdout),
}

impl PipeWriter {
    /// Wrap an open file (named pipe or regular file).
    pub fn from_file(file: std::fs::File, label: impl Into<String>) -> Self {
        Self {
            inner: PipeWriterInner::File(file),
            label: label.into(),
        }
    }

    /// Write to the process's stdout.
    pub fn stdout() -> Self {
        Self {
            inner: PipeWriterInner::Stdout(std::io::stdout()),
            label: "stdout".to_string(),
        }
    }

    /// Human-readable name of the endpoint for diagnostics.
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Write for PipeWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.inner {
            PipeWriterInner::File(file) => file.write(buf),
            PipeWriterInner::Stdout(stdout) => stdout.write(buf),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.inner {
            PipeWriterInner::File(file) => file.flush(),
            PipeWriterInner::Stdout(stdout) => stdout.flush(),
        }
    }
}

impl std::fmt::Debug for PipeWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.inner {
            PipeWriterInner::File(_) => "file",
            PipeWriterInner::Stdout(_) => "stdout",
        };
        f.debug_struct("PipeWriter")
            .field("type", &kind)
            .field("label", &self.label)
            .finish()
    }
}
