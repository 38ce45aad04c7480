use posepipe_wire::{LandmarkSet, RawFrame};

/// Error reported by a pose estimator.
#[derive(Debug, thiserror::Error)]
pub enum EstimatorError {
    /// The frame could not be processed but the next one may succeed.
    #[error("transient estimator error: {0}")]
    Transient(String),

    /// The estimator cannot continue (model load failure, lost device, ...).
    #[error("fatal estimator error: {0}")]
    Fatal(String),
}

impl EstimatorError {
    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient(message.into())
    }

    pub fn fatal(message: impl Into<String>) -> Self {
        Self::Fatal(message.into())
    }

    /// Whether the pipeline may skip this frame and keep going.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Transient(_))
    }
}

/// The external pose-estimation capability.
///
/// Constructed once, before the loop starts, and owned by the pipeline for
/// the whole session. Frames always arrive in RGB order.
pub trait PoseEstimator {
    /// Produce the landmarks for one frame. An empty set means no pose.
    fn estimate(&mut self, frame: &RawFrame) -> Result<LandmarkSet, EstimatorError>;

    /// Short name for diagnostics.
    fn name(&self) -> &str {
        "estimator"
    }
}

impl<E: PoseEstimator + ?Sized> PoseEstimator for Box<E> {
    fn estimate(&mut self, frame: &RawFrame) -> Result<LandmarkSet, EstimatorError> {
        (**self).estimate(frame)
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Estimator that never detects a pose.
///
/// Useful for exercising the transport without a model.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPoseEstimator;

impl PoseEstimator for NoPoseEstimator {
    fn estimate(&mut self, _frame: &RawFrame) -> Result<LandmarkSet, EstimatorError> {
        Ok(LandmarkSet::empty())
    }

    fn name(&self) -> &str {
        "none"
    }
}

/// Estimator backed by a closure. See [`from_fn`].
pub struct FnEstimator<F> {
    f: F,
}

/// Wrap a closure as a [`PoseEstimator`].
pub fn from_fn<F>(f: F) -> FnEstimator<F>
where
    F: FnMut(&RawFrame) -> Result<LandmarkSet, EstimatorError>,
{
    FnEstimator { f }
}

impl<F> PoseEstimator for FnEstimator<F>
where
    F: FnMut(&RawFrame) -> Result<LandmarkSet, EstimatorError>,
{
    fn estimate(&mut self, frame: &RawFrame) -> Result<LandmarkSet, EstimatorError> {
        (self.f)(frame)
    }

    fn name(&self) -> &str {
        "closure"
    }
}
