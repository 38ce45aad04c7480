//! The posepipe pipeline loop.
//!
//! Reads one raw frame, hands it to a [`PoseEstimator`], encodes the
//! resulting landmark set and writes it as one framed message, then repeats
//! until the inbound stream ends or a fatal error occurs. One frame is in
//! flight at a time.

pub mod error;
pub mod estimator;
pub mod pipeline;
pub mod replay;
pub mod shutdown;

pub use error::{FailureKind, PipelineError, PipelineFailure, Result};
pub use estimator::{from_fn, EstimatorError, FnEstimator, NoPoseEstimator, PoseEstimator};
pub use pipeline::{
    Pipeline, PipelineConfig, PipelineReport, PipelineState, StepOutcome,
    DEFAULT_MAX_CONSECUTIVE_FAILURES,
};
pub use replay::{ReplayEntry, ReplayEstimator, ReplayFailure};
pub use shutdown::ShutdownSignal;
