use std::fmt;

use posepipe_wire::FrameError;

use crate::estimator::EstimatorError;
use crate::pipeline::PipelineReport;

/// Errors that end a pipeline session.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Frame or message level failure (truncation, malformed payload, I/O).
    #[error(transparent)]
    Wire(#[from] FrameError),

    /// Failed to open a stream endpoint.
    #[error(transparent)]
    Transport(#[from] posepipe_transport::TransportError),

    /// The estimator reported an unrecoverable error, or too many
    /// recoverable ones in a row.
    #[error("estimation failed on frame {frame}: {source}")]
    Estimation {
        frame: u64,
        #[source]
        source: EstimatorError,
    },

    /// The pipeline was configured with unusable parameters.
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl PipelineError {
    /// Classify the error for diagnostics and exit codes.
    pub fn kind(&self) -> FailureKind {
        match self {
            PipelineError::Wire(err) => match err {
                FrameError::TruncatedFrame { .. } | FrameError::FrameSizeMismatch { .. } => {
                    FailureKind::TruncatedFrame
                }
                FrameError::MalformedPayload { .. }
                | FrameError::TooManyLandmarks { .. }
                | FrameError::PayloadTooLarge { .. }
                | FrameError::TruncatedMessage { .. } => FailureKind::MalformedPayload,
                FrameError::InvalidGeometry(_) | FrameError::FrameAllocation { .. } => {
                    FailureKind::Config
                }
                FrameError::Io(_) | FrameError::ConnectionClosed => FailureKind::Io,
            },
            PipelineError::Transport(_) => FailureKind::Io,
            PipelineError::Estimation { .. } => FailureKind::EstimationFailure,
            PipelineError::Config(_) => FailureKind::Config,
        }
    }
}

/// Coarse classification of a fatal pipeline error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    TruncatedFrame,
    MalformedPayload,
    Io,
    EstimationFailure,
    Config,
}

impl FailureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::TruncatedFrame => "truncated-frame",
            FailureKind::MalformedPayload => "malformed-payload",
            FailureKind::Io => "io-error",
            FailureKind::EstimationFailure => "estimation-failure",
            FailureKind::Config => "config-error",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A failed session: the error that ended it and what was done before.
#[derive(Debug, thiserror::Error)]
#[error("pipeline failed [{}] after {} frames: {error}", .error.kind(), .report.frames_processed)]
pub struct PipelineFailure {
    #[source]
    pub error: PipelineError,
    pub report: PipelineReport,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
