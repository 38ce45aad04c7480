use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use posepipe::pipeline::{ShutdownSignal, DEFAULT_MAX_CONSECUTIVE_FAILURES};
use posepipe::transport::Endpoint;
use posepipe::wire::{ColorOrder, FrameGeometry};

use crate::exit::{CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod feed;
pub mod listen;
pub mod mkfifo;
pub mod run;
pub mod version;

/// Exit status after a second interrupt.
const INTERRUPTED: i32 = 130;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the pipeline: read frames, estimate, write landmark sets.
    Run(RunArgs),
    /// Read landmark messages and print them.
    Listen(ListenArgs),
    /// Write raw frames into a frame stream.
    Feed(FeedArgs),
    /// Create named pipes.
    Mkfifo(MkfifoArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Run(args) => run::run(args, format),
        Command::Listen(args) => listen::run(args, format),
        Command::Feed(args) => feed::run(args),
        Command::Mkfifo(args) => mkfifo::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug, Clone, Copy)]
pub struct GeometryArgs {
    /// Frame width in pixels.
    #[arg(long, env = "POSEPIPE_WIDTH", default_value_t = 640)]
    pub width: u32,
    /// Frame height in pixels.
    #[arg(long, env = "POSEPIPE_HEIGHT", default_value_t = 480)]
    pub height: u32,
}

impl GeometryArgs {
    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry::rgb(self.width, self.height)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum EstimatorKind {
    /// Never detects a pose.
    None,
    /// Replays recorded results from a JSON file.
    Replay,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Frame stream to read ("-" for stdin).
    #[arg(long, env = "POSEPIPE_FRAMES", default_value = "frame_pipe")]
    pub frames: Endpoint,
    /// Landmark stream to write ("-" for stdout).
    #[arg(long, env = "POSEPIPE_POINTS", default_value = "points_pipe")]
    pub points: Endpoint,
    #[command(flatten)]
    pub geometry: GeometryArgs,
    /// Channel order of inbound frames (rgb or bgr).
    #[arg(long, env = "POSEPIPE_COLOR", default_value = "rgb")]
    pub color: ColorOrder,
    /// Each frame is preceded by a u32 little-endian byte count.
    #[arg(long, env = "POSEPIPE_SIZE_PREFIXED")]
    pub size_prefixed: bool,
    /// Pose estimator backend.
    #[arg(long, value_enum, env = "POSEPIPE_ESTIMATOR", default_value = "none")]
    pub estimator: EstimatorKind,
    /// Recorded results for the replay estimator.
    #[arg(
        long,
        value_name = "FILE",
        env = "POSEPIPE_REPLAY",
        required_if_eq("estimator", "replay")
    )]
    pub replay: Option<PathBuf>,
    /// Restart the recording when it runs out.
    #[arg(long = "loop")]
    pub looping: bool,
    /// Transient estimator failures tolerated in a row (0: none).
    #[arg(
        long,
        env = "POSEPIPE_MAX_ESTIMATION_FAILURES",
        default_value_t = DEFAULT_MAX_CONSECUTIVE_FAILURES
    )]
    pub max_estimation_failures: u32,
    /// Create missing named pipes for both endpoints before opening them.
    #[arg(long)]
    pub create_fifos: bool,
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Landmark stream to read ("-" for stdin).
    #[arg(long, env = "POSEPIPE_POINTS", default_value = "points_pipe")]
    pub points: Endpoint,
    /// Exit after printing N landmark sets.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct FeedArgs {
    /// Frame stream to write ("-" for stdout).
    #[arg(long, env = "POSEPIPE_FRAMES", default_value = "frame_pipe")]
    pub frames: Endpoint,
    #[command(flatten)]
    pub geometry: GeometryArgs,
    /// Copy raw frames from a file.
    #[arg(
        long,
        value_name = "FILE",
        conflicts_with = "synthetic",
        required_unless_present = "synthetic"
    )]
    pub input: Option<PathBuf>,
    /// Generate N test-pattern frames.
    #[arg(long, value_name = "N")]
    pub synthetic: Option<u64>,
}

#[derive(Args, Debug)]
pub struct MkfifoArgs {
    /// Paths of the named pipes to create.
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// First Ctrl-C requests a shutdown between frames; a second one exits.
fn install_ctrlc_handler(signal: ShutdownSignal) -> CliResult<()> {
    ctrlc::set_handler(move || {
        if signal.is_requested() {
            std::process::exit(INTERRUPTED);
        }
        signal.request();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
