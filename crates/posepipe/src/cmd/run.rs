use tracing::info;

use posepipe::pipeline::{
    NoPoseEstimator, Pipeline, PipelineConfig, PoseEstimator, ReplayEstimator, ShutdownSignal,
};
use posepipe::transport::Endpoint;
use posepipe::wire::InboundLayout;

use crate::cmd::{install_ctrlc_handler, EstimatorKind, RunArgs};
use crate::exit::{
    frame_error, pipeline_error, pipeline_failure, CliError, CliResult, FAILURE, SUCCESS,
};
use crate::output::{print_report, OutputFormat};

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    let config = PipelineConfig {
        geometry: args.geometry.geometry(),
        color_order: args.color,
        inbound_layout: if args.size_prefixed {
            InboundLayout::SizePrefixed
        } else {
            InboundLayout::Raw
        },
        max_consecutive_estimation_failures: args.max_estimation_failures,
        ..PipelineConfig::default()
    };
    config
        .geometry
        .frame_size()
        .map_err(|err| frame_error("setup", err))?;

    if args.create_fifos {
        create_fifos(&[&args.frames, &args.points])?;
    }

    let estimator = build_estimator(&args)?;
    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    info!(
        frames = %args.frames,
        points = %args.points,
        "opening streams"
    );
    let pipeline = Pipeline::open(&args.frames, &args.points, estimator, config)
        .map_err(|err| pipeline_error("pipeline setup failed", err))?
        .with_shutdown(shutdown);

    let report = pipeline.run().map_err(pipeline_failure)?;

    // Stdout carries the landmark stream in that case.
    if args.points != Endpoint::Stdio {
        print_report(&report, format);
    }
    Ok(SUCCESS)
}

fn build_estimator(args: &RunArgs) -> CliResult<Box<dyn PoseEstimator>> {
    match args.estimator {
        EstimatorKind::None => Ok(Box::new(NoPoseEstimator)),
        EstimatorKind::Replay => {
            let Some(path) = &args.replay else {
                return Err(CliError::new(
                    crate::exit::USAGE,
                    "--replay is required with --estimator replay",
                ));
            };
            let estimator = ReplayEstimator::from_path(path)
                .map_err(|err| CliError::new(FAILURE, format!("estimator setup failed: {err}")))?
                .looping(args.looping);
            Ok(Box::new(estimator))
        }
    }
}

#[cfg(unix)]
fn create_fifos(endpoints: &[&Endpoint]) -> CliResult<()> {
    use posepipe::transport::{create_fifo, DEFAULT_FIFO_MODE};

    for path in endpoints.iter().filter_map(|endpoint| endpoint.path()) {
        create_fifo(path, DEFAULT_FIFO_MODE)
            .map_err(|err| crate::exit::transport_error("fifo setup failed", err))?;
    }
    Ok(())
}

#[cfg(not(unix))]
fn create_fifos(_endpoints: &[&Endpoint]) -> CliResult<()> {
    Err(CliError::new(
        crate::exit::USAGE,
        "--create-fifos is only supported on unix",
    ))
}
