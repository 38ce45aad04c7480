//! In-process loopback: a producer thread writes frames, the pipeline runs a
//! toy "brightest pixel" estimator, and a consumer thread prints the results.
//!
//! Run with:
//!   cargo run --example loopback --features pipeline

use std::io::Write;
use std::os::unix::net::UnixStream;
use std::thread;

use posepipe::pipeline::{from_fn, EstimatorError, Pipeline, PipelineConfig};
use posepipe::wire::{FrameGeometry, LandmarkPoint, LandmarkSet, MessageReader, RawFrame};

const WIDTH: u32 = 32;
const HEIGHT: u32 = 24;
const FRAMES: u32 = 8;

fn brightest_pixel(frame: &RawFrame) -> Result<LandmarkSet, EstimatorError> {
    let geometry = frame.geometry();
    let Some((index, _)) = frame
        .data()
        .chunks_exact(geometry.channels)
        .enumerate()
        .max_by_key(|(_, px)| px.iter().map(|&c| u32::from(c)).sum::<u32>())
    else {
        return Ok(LandmarkSet::empty());
    };

    let x = (index as u32 % geometry.width) as f64 / f64::from(geometry.width);
    let y = (index as u32 / geometry.width) as f64 / f64::from(geometry.height);
    LandmarkSet::new(vec![LandmarkPoint::new(x, y, 0.0)])
        .map_err(|err| EstimatorError::fatal(err.to_string()))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (mut frame_tx, frame_rx) = UnixStream::pair()?;
    let (points_tx, points_rx) = UnixStream::pair()?;

    let producer = thread::spawn(move || -> std::io::Result<()> {
        for i in 0..FRAMES {
            let mut frame = vec![0u8; (WIDTH * HEIGHT * 3) as usize];
            // One white pixel walking along the diagonal.
            let pixel = ((i * (WIDTH + 1)) % (WIDTH * HEIGHT)) as usize * 3;
            frame[pixel..pixel + 3].copy_from_slice(&[255, 255, 255]);
            frame_tx.write_all(&frame)?;
        }
        Ok(())
    });

    let consumer = thread::spawn(move || {
        for (i, set) in MessageReader::new(points_rx).enumerate() {
            match set.map(|payload| posepipe::wire::decode_landmarks(&payload)) {
                Ok(Ok(set)) => eprintln!("frame {i}: {:?}", set.points()),
                Ok(Err(e)) | Err(e) => {
                    eprintln!("bad message: {e}");
                    break;
                }
            }
        }
    });

    let config = PipelineConfig {
        geometry: FrameGeometry::rgb(WIDTH, HEIGHT),
        ..PipelineConfig::default()
    };
    let report = Pipeline::new(frame_rx, points_tx, from_fn(brightest_pixel), config)?.run()?;

    producer.join().map_err(|_| "producer panicked")??;
    consumer.join().map_err(|_| "consumer panicked")?;
    eprintln!(
        "processed {} frames, {} messages",
        report.frames_processed, report.messages_written
    );
    Ok(())
}
