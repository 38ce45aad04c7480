use std::io::{Read, Write};

use posepipe_transport::{Endpoint, PipeReader, PipeWriter};
use posepipe_wire::{
    ColorOrder, FrameGeometry, FrameReader, InboundLayout, LandmarkSet, MessageWriter, WireConfig,
};
use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::error::{PipelineError, PipelineFailure, Result};
use crate::estimator::PoseEstimator;
use crate::shutdown::ShutdownSignal;

/// Transient estimator failures tolerated in a row before the session fails.
pub const DEFAULT_MAX_CONSECUTIVE_FAILURES: u32 = 5;

/// Configuration for a pipeline session.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Inbound frame dimensions. Default: 640x480, 3 channels.
    pub geometry: FrameGeometry,
    /// Colour order the producer writes. Frames are converted to RGB before
    /// they reach the estimator.
    pub color_order: ColorOrder,
    /// How inbound frames are delimited.
    pub inbound_layout: InboundLayout,
    /// Outbound message limits.
    pub wire: WireConfig,
    /// Transient estimator failures tolerated in a row. 0 makes every
    /// estimator error fatal.
    pub max_consecutive_estimation_failures: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            geometry: FrameGeometry::default(),
            color_order: ColorOrder::default(),
            inbound_layout: InboundLayout::default(),
            wire: WireConfig::default(),
            max_consecutive_estimation_failures: DEFAULT_MAX_CONSECUTIVE_FAILURES,
        }
    }
}

/// Lifecycle of a pipeline session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PipelineState {
    #[default]
    Running,
    /// The inbound stream ended (or shutdown was requested); streams are
    /// being released and the session ends normally.
    Draining,
    /// A fatal error ended the session.
    Failed,
}

/// What a session did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub frames_processed: u64,
    pub messages_written: u64,
    /// Frames for which the estimator found no pose.
    pub empty_detections: u64,
    /// Transient estimator failures answered with an empty result.
    pub recovered_failures: u64,
    pub state: PipelineState,
}

/// Result of processing one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    /// A frame was read and its result written.
    Processed {
        frame: u64,
        landmarks: usize,
        recovered: bool,
    },
    /// The inbound stream ended cleanly.
    EndOfStream,
    /// A shutdown was requested before the next frame.
    ShutdownRequested,
}

/// Reads frames, runs the estimator, writes one landmark message per frame.
///
/// Owns both streams and the estimator for the whole session. Streams are
/// released when the pipeline is dropped, which [`Pipeline::run`] does on
/// every exit path.
pub struct Pipeline<R, W, E> {
    frames: FrameReader<R>,
    results: MessageWriter<W>,
    estimator: E,
    config: PipelineConfig,
    state: PipelineState,
    report: PipelineReport,
    consecutive_failures: u32,
    shutdown: ShutdownSignal,
}

impl<E: PoseEstimator> Pipeline<PipeReader, PipeWriter, E> {
    /// Open both endpoints and build a pipeline over them.
    ///
    /// The frame endpoint is opened first. With named pipes the producer
    /// must open its ends in the same order or both sides block.
    pub fn open(
        frames: &Endpoint,
        points: &Endpoint,
        estimator: E,
        config: PipelineConfig,
    ) -> Result<Self> {
        config.geometry.frame_size()?;
        let reader = frames.open_reader()?;
        debug!(endpoint = reader.label(), "frame stream open");
        let writer = points.open_writer()?;
        debug!(endpoint = writer.label(), "landmark stream open");
        Self::new(reader, writer, estimator, config)
    }
}

impl<R: Read, W: Write, E: PoseEstimator> Pipeline<R, W, E> {
    /// Build a pipeline over already-open streams.
    pub fn new(frames: R, results: W, estimator: E, config: PipelineConfig) -> Result<Self> {
        let reader = FrameReader::new(frames, config.geometry)?
            .with_color_order(config.color_order)
            .with_layout(config.inbound_layout);
        let writer = MessageWriter::with_config(results, config.wire.clone());

        Ok(Self {
            frames: reader,
            results: writer,
            estimator,
            config,
            state: PipelineState::Running,
            report: PipelineReport::default(),
            consecutive_failures: 0,
            shutdown: ShutdownSignal::new(),
        })
    }

    /// Stop between frames when `signal` is requested.
    pub fn with_shutdown(mut self, signal: ShutdownSignal) -> Self {
        self.shutdown = signal;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn report(&self) -> &PipelineReport {
        &self.report
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process one frame.
    ///
    /// Any error moves the pipeline to [`PipelineState::Failed`]; end of
    /// stream and shutdown move it to [`PipelineState::Draining`].
    pub fn step(&mut self) -> Result<StepOutcome> {
        match self.state {
            PipelineState::Running => {}
            PipelineState::Draining => return Ok(StepOutcome::EndOfStream),
            PipelineState::Failed => {
                return Err(PipelineError::Config(
                    "pipeline has already failed".to_string(),
                ))
            }
        }

        let outcome = self.process_next();
        self.state = match &outcome {
            Ok(StepOutcome::Processed { .. }) => PipelineState::Running,
            Ok(StepOutcome::EndOfStream | StepOutcome::ShutdownRequested) => {
                PipelineState::Draining
            }
            Err(_) => PipelineState::Failed,
        };
        self.report.state = self.state;
        outcome
    }

    fn process_next(&mut self) -> Result<StepOutcome> {
        if self.shutdown.is_requested() {
            info!(frames = self.report.frames_processed, "shutdown requested");
            return Ok(StepOutcome::ShutdownRequested);
        }

        let Some(frame) = self.frames.read_frame()? else {
            debug!(frames = self.report.frames_processed, "frame stream ended");
            return Ok(StepOutcome::EndOfStream);
        };

        let frame = frame.into_rgb();
        let index = frame.index();

        let (landmarks, recovered) = match self.estimator.estimate(&frame) {
            Ok(set) => {
                self.consecutive_failures = 0;
                (set, false)
            }
            Err(err)
                if err.is_recoverable()
                    && self.consecutive_failures
                        < self.config.max_consecutive_estimation_failures =>
            {
                self.consecutive_failures += 1;
                self.report.recovered_failures += 1;
                warn!(
                    frame = index,
                    error = %err,
                    consecutive = self.consecutive_failures,
                    "estimator failed; writing empty result for frame"
                );
                (LandmarkSet::empty(), true)
            }
            Err(source) => {
                return Err(PipelineError::Estimation {
                    frame: index,
                    source,
                })
            }
        };
        drop(frame);

        self.results.send_landmarks(&landmarks)?;

        self.report.frames_processed += 1;
        self.report.messages_written = self.results.messages_written();
        if landmarks.is_empty() && !recovered {
            self.report.empty_detections += 1;
        }
        trace!(frame = index, landmarks = landmarks.len(), "frame processed");

        Ok(StepOutcome::Processed {
            frame: index,
            landmarks: landmarks.len(),
            recovered,
        })
    }

    /// Run until the frame stream ends, shutdown is requested, or a fatal
    /// error occurs. Both streams are released before this returns.
    pub fn run(mut self) -> std::result::Result<PipelineReport, PipelineFailure> {
        info!(
            geometry = %self.config.geometry,
            estimator = self.estimator.name(),
            "pipeline running"
        );

        loop {
            match self.step() {
                Ok(StepOutcome::Processed { .. }) => continue,
                Ok(StepOutcome::EndOfStream | StepOutcome::ShutdownRequested) => break,
                Err(err) => return Err(self.fail(err)),
            }
        }

        if let Err(err) = self.results.flush() {
            self.state = PipelineState::Failed;
            self.report.state = PipelineState::Failed;
            return Err(self.fail(err.into()));
        }

        let report = self.report.clone();
        drop(self);
        info!(
            frames = report.frames_processed,
            empty = report.empty_detections,
            recovered = report.recovered_failures,
            "pipeline drained"
        );
        Ok(report)
    }

    fn fail(self, error: PipelineError) -> PipelineFailure {
        let report = self.report.clone();
        drop(self);
        debug!(
            kind = %error.kind(),
            error = %error,
            frames = report.frames_processed,
            "pipeline failed"
        );
        PipelineFailure { error, report }
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, ErrorKind};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use posepipe_wire::{LandmarkPoint, MessageReader, RawFrame, MAX_LANDMARKS};

    use super::*;
    use crate::error::FailureKind;
    use crate::estimator::{from_fn, EstimatorError, NoPoseEstimator};

    const WIDTH: u32 = 4;
    const HEIGHT: u32 = 2;
    const FRAME_SIZE: usize = (WIDTH * HEIGHT) as usize * 3;

    fn config() -> PipelineConfig {
        PipelineConfig {
            geometry: FrameGeometry::rgb(WIDTH, HEIGHT),
            ..PipelineConfig::default()
        }
    }

    fn frames(count: usize) -> Vec<u8> {
        (0..count).flat_map(|i| vec![i as u8; FRAME_SIZE]).collect()
    }

    fn decode_all(wire: Vec<u8>) -> Vec<LandmarkSet> {
        let mut reader = MessageReader::new(Cursor::new(wire));
        let mut sets = Vec::new();
        while let Some(set) = reader.read_landmarks().unwrap() {
            sets.push(set);
        }
        sets
    }

    fn one_point_per_frame(frame: &RawFrame) -> std::result::Result<LandmarkSet, EstimatorError> {
        let x = frame.index() as f64;
        let y = f64::from(frame.data()[0]);
        Ok(LandmarkSet::new(vec![LandmarkPoint::new(x, y, -x)]).unwrap())
    }

    #[test]
    fn processes_exactly_n_frames_then_drains() {
        let mut out = Vec::new();
        let mut seen = Vec::new();
        let estimator = from_fn(|frame: &RawFrame| {
            seen.push(frame.index());
            one_point_per_frame(frame)
        });

        let pipeline =
            Pipeline::new(Cursor::new(frames(5)), &mut out, estimator, config()).unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(report.frames_processed, 5);
        assert_eq!(report.messages_written, 5);
        assert_eq!(report.state, PipelineState::Draining);
        assert_eq!(seen, vec![0, 1, 2, 3, 4]);

        let sets = decode_all(out);
        assert_eq!(sets.len(), 5);
        for (i, set) in sets.iter().enumerate() {
            assert_eq!(set.points()[0].x, i as f64);
            assert_eq!(set.points()[0].y, i as f64);
        }
    }

    #[test]
    fn empty_input_drains_without_messages() {
        let mut out = Vec::new();
        let pipeline =
            Pipeline::new(Cursor::new(Vec::new()), &mut out, NoPoseEstimator, config()).unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(report.frames_processed, 0);
        assert!(out.is_empty());
    }

    #[test]
    fn truncated_final_frame_fails() {
        let mut wire = frames(3);
        wire.extend_from_slice(&[0xEE; FRAME_SIZE - 1]);
        let mut out = Vec::new();

        let pipeline = Pipeline::new(Cursor::new(wire), &mut out, NoPoseEstimator, config())
            .unwrap();
        let failure = pipeline.run().unwrap_err();

        assert_eq!(failure.error.kind(), FailureKind::TruncatedFrame);
        assert_eq!(failure.report.state, PipelineState::Failed);
        assert_eq!(failure.report.frames_processed, 3);
        assert_eq!(decode_all(out).len(), 3);
    }

    #[test]
    fn empty_detection_is_still_a_message() {
        let mut out = Vec::new();
        let pipeline =
            Pipeline::new(Cursor::new(frames(2)), &mut out, NoPoseEstimator, config()).unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(report.empty_detections, 2);
        assert_eq!(out, vec![0u8; 8]);
    }

    #[test]
    fn transient_failure_is_recovered_with_empty_result() {
        let mut out = Vec::new();
        let estimator = from_fn(|frame: &RawFrame| {
            if frame.index() == 1 {
                Err(EstimatorError::transient("blurred"))
            } else {
                one_point_per_frame(frame)
            }
        });

        let pipeline =
            Pipeline::new(Cursor::new(frames(3)), &mut out, estimator, config()).unwrap();
        let report = pipeline.run().unwrap();

        assert_eq!(report.frames_processed, 3);
        assert_eq!(report.recovered_failures, 1);
        assert_eq!(report.empty_detections, 0);
        let sets = decode_all(out);
        assert_eq!(sets.len(), 3);
        assert!(sets[1].is_empty());
        assert_eq!(sets[2].points()[0].x, 2.0);
    }

    #[test]
    fn consecutive_transient_failures_end_session() {
        let mut out = Vec::new();
        let estimator = from_fn(|_: &RawFrame| Err(EstimatorError::transient("no signal")));
        let cfg = PipelineConfig {
            max_consecutive_estimation_failures: 2,
            ..config()
        };

        let pipeline = Pipeline::new(Cursor::new(frames(10)), &mut out, estimator, cfg).unwrap();
        let failure = pipeline.run().unwrap_err();

        assert_eq!(failure.error.kind(), FailureKind::EstimationFailure);
        assert_eq!(failure.report.recovered_failures, 2);
        assert_eq!(failure.report.frames_processed, 2);
        assert!(matches!(
            failure.error,
            PipelineError::Estimation { frame: 2, .. }
        ));
    }

    #[test]
    fn success_resets_failure_streak() {
        let mut out = Vec::new();
        let estimator = from_fn(|frame: &RawFrame| {
            if frame.index() % 2 == 0 {
                Err(EstimatorError::transient("every other frame"))
            } else {
                Ok(LandmarkSet::empty())
            }
        });
        let cfg = PipelineConfig {
            max_consecutive_estimation_failures: 1,
            ..config()
        };

        let pipeline = Pipeline::new(Cursor::new(frames(6)), &mut out, estimator, cfg).unwrap();
        let report = pipeline.run().unwrap();
        assert_eq!(report.recovered_failures, 3);
        assert_eq!(report.frames_processed, 6);
    }

    #[test]
    fn fatal_estimator_error_fails_without_writing() {
        let mut out = Vec::new();
        let estimator = from_fn(|frame: &RawFrame| {
            if frame.index() == 2 {
                Err(EstimatorError::fatal("model unloaded"))
            } else {
                Ok(LandmarkSet::empty())
            }
        });

        let pipeline =
            Pipeline::new(Cursor::new(frames(5)), &mut out, estimator, config()).unwrap();
        let failure = pipeline.run().unwrap_err();

        assert_eq!(failure.error.kind(), FailureKind::EstimationFailure);
        assert_eq!(failure.report.frames_processed, 2);
        assert_eq!(decode_all(out).len(), 2);
    }

    #[test]
    fn zero_tolerance_makes_transient_fatal() {
        let mut out = Vec::new();
        let estimator = from_fn(|_: &RawFrame| Err(EstimatorError::transient("glitch")));
        let cfg = PipelineConfig {
            max_consecutive_estimation_failures: 0,
            ..config()
        };
        let pipeline = Pipeline::new(Cursor::new(frames(1)), &mut out, estimator, cfg).unwrap();
        assert!(pipeline.run().is_err());
        assert!(out.is_empty());
    }

    #[test]
    fn bgr_frames_reach_estimator_as_rgb() {
        let mut wire = Vec::new();
        for _ in 0..(WIDTH * HEIGHT) {
            wire.extend_from_slice(&[10, 20, 30]);
        }
        let mut out = Vec::new();
        let mut first_pixel = None;
        let estimator = from_fn(|frame: &RawFrame| {
            first_pixel = Some([frame.data()[0], frame.data()[1], frame.data()[2]]);
            Ok(LandmarkSet::empty())
        });
        let cfg = PipelineConfig {
            color_order: ColorOrder::Bgr,
            ..config()
        };

        Pipeline::new(Cursor::new(wire), &mut out, estimator, cfg)
            .unwrap()
            .run()
            .unwrap();
        assert_eq!(first_pixel, Some([30, 20, 10]));
    }

    #[test]
    fn shutdown_stops_between_frames() {
        let signal = ShutdownSignal::new();
        let trigger = signal.clone();
        let mut out = Vec::new();
        let estimator = from_fn(|_: &RawFrame| {
            trigger.request();
            Ok(LandmarkSet::empty())
        });

        let report = Pipeline::new(Cursor::new(frames(10)), &mut out, estimator, config())
            .unwrap()
            .with_shutdown(signal)
            .run()
            .unwrap();

        assert_eq!(report.frames_processed, 1);
        assert_eq!(report.state, PipelineState::Draining);
        assert_eq!(decode_all(out).len(), 1);
    }

    #[test]
    fn write_failure_is_io_error() {
        let pipeline =
            Pipeline::new(Cursor::new(frames(2)), FailingWriter, NoPoseEstimator, config())
                .unwrap();
        let failure = pipeline.run().unwrap_err();
        assert_eq!(failure.error.kind(), FailureKind::Io);
        assert_eq!(failure.report.frames_processed, 0);
    }

    #[test]
    fn step_reports_each_transition() {
        let mut out = Vec::new();
        let mut pipeline = Pipeline::new(
            Cursor::new(frames(1)),
            &mut out,
            from_fn(one_point_per_frame),
            config(),
        )
        .unwrap();

        assert_eq!(
            pipeline.step().unwrap(),
            StepOutcome::Processed {
                frame: 0,
                landmarks: 1,
                recovered: false
            }
        );
        assert_eq!(pipeline.state(), PipelineState::Running);
        assert_eq!(pipeline.step().unwrap(), StepOutcome::EndOfStream);
        assert_eq!(pipeline.state(), PipelineState::Draining);
        assert_eq!(pipeline.step().unwrap(), StepOutcome::EndOfStream);
    }

    #[test]
    fn step_after_failure_is_rejected() {
        let mut out = Vec::new();
        let mut pipeline =
            Pipeline::new(Cursor::new(vec![1u8]), &mut out, NoPoseEstimator, config()).unwrap();
        assert!(pipeline.step().is_err());
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(matches!(pipeline.step(), Err(PipelineError::Config(_))));
    }

    #[test]
    fn invalid_geometry_rejected() {
        let cfg = PipelineConfig {
            geometry: FrameGeometry::rgb(0, 480),
            ..PipelineConfig::default()
        };
        let result = Pipeline::new(Cursor::new(Vec::new()), Vec::new(), NoPoseEstimator, cfg);
        assert!(matches!(result, Err(ref e) if e.kind() == FailureKind::Config));
    }

    #[test]
    #[cfg(unix)]
    fn stalled_consumer_delays_frame_reads() {
        let (left, mut right) = std::os::unix::net::UnixStream::pair().unwrap();
        let total = 20_000usize;
        let estimated = Arc::new(AtomicU64::new(0));

        let runner = {
            let estimated = Arc::clone(&estimated);
            std::thread::spawn(move || {
                let full = LandmarkSet::new(vec![LandmarkPoint::default(); MAX_LANDMARKS]).unwrap();
                let estimator = from_fn(move |_: &RawFrame| {
                    estimated.fetch_add(1, Ordering::SeqCst);
                    Ok(full.clone())
                });
                let cfg = PipelineConfig {
                    geometry: FrameGeometry::rgb(1, 1),
                    ..PipelineConfig::default()
                };
                Pipeline::new(Cursor::new(vec![0u8; total * 3]), left, estimator, cfg)
                    .unwrap()
                    .run()
                    .unwrap()
            })
        };

        std::thread::sleep(Duration::from_millis(300));
        assert!(!runner.is_finished());
        assert!(estimated.load(Ordering::SeqCst) < total as u64);

        let mut drained = Vec::new();
        right.read_to_end(&mut drained).unwrap();
        let report = runner.join().unwrap();
        assert_eq!(report.frames_processed, total as u64);
        assert_eq!(drained.len(), total * (4 + MAX_LANDMARKS * 24));
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::from(ErrorKind::BrokenPipe))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
}
