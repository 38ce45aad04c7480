use std::fmt;
use std::io;

use posepipe::pipeline::{FailureKind, PipelineError, PipelineFailure};
use posepipe::transport::TransportError;
use posepipe::wire::FrameError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    CliError::new(io_code(&err), format!("{context}: {err}"))
}

fn io_code(err: &io::Error) -> i32 {
    match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        _ => TRANSPORT_ERROR,
    }
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    let code = match &err {
        TransportError::Open { source, .. }
        | TransportError::Create { source, .. }
        | TransportError::Io(source) => io_code(source),
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Io(source) => io_error(context, source),
        FrameError::ConnectionClosed => CliError::new(TRANSPORT_ERROR, format!("{context}: {err}")),
        FrameError::InvalidGeometry(_) => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::FrameAllocation { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn pipeline_error(context: &str, err: PipelineError) -> CliError {
    match err {
        PipelineError::Wire(err) => frame_error(context, err),
        PipelineError::Transport(err) => transport_error(context, err),
        PipelineError::Estimation { .. } => CliError::new(FAILURE, format!("{context}: {err}")),
        PipelineError::Config(_) => CliError::new(USAGE, format!("{context}: {err}")),
    }
}

pub fn pipeline_failure(failure: PipelineFailure) -> CliError {
    let kind: FailureKind = failure.error.kind();
    let context = format!(
        "pipeline failed [{kind}] after {} frames",
        failure.report.frames_processed
    );
    pipeline_error(&context, failure.error)
}
