use std::fs::File;
use std::io::{self, Write};

use posepipe::wire::{FrameGeometry, RGB_CHANNELS};
use tracing::{info, warn};

use crate::cmd::FeedArgs;
use crate::exit::{frame_error, io_error, transport_error, CliResult, SUCCESS};

pub fn run(args: FeedArgs) -> CliResult<i32> {
    let geometry = args.geometry.geometry();
    let frame_size = geometry
        .frame_size()
        .map_err(|err| frame_error("setup", err))?;

    let mut writer = args
        .frames
        .open_writer()
        .map_err(|err| transport_error("open failed", err))?;

    let bytes = match (&args.input, args.synthetic) {
        (Some(path), _) => {
            let mut file = File::open(path)
                .map_err(|err| io_error(&format!("failed reading {}", path.display()), err))?;
            io::copy(&mut file, &mut writer).map_err(|err| io_error("write failed", err))?
        }
        (None, Some(count)) => {
            for index in 0..count {
                writer
                    .write_all(&test_pattern(geometry, index))
                    .map_err(|err| io_error("write failed", err))?;
            }
            count.saturating_mul(frame_size as u64)
        }
        (None, None) => 0,
    };
    writer.flush().map_err(|err| io_error("flush failed", err))?;

    let remainder = bytes % frame_size as u64;
    if remainder != 0 {
        warn!(
            bytes,
            frame_size, remainder, "input is not a whole number of frames"
        );
    }
    info!(
        frames = bytes / frame_size as u64,
        bytes,
        geometry = %geometry,
        "frames written"
    );
    Ok(SUCCESS)
}

/// Diagonal gradient shifted by the frame index, so frames differ.
fn test_pattern(geometry: FrameGeometry, index: u64) -> Vec<u8> {
    let width = geometry.width as usize;
    let height = geometry.height as usize;
    let mut frame = Vec::with_capacity(width * height * RGB_CHANNELS);
    for y in 0..height {
        for x in 0..width {
            let base = (x + y) as u64 + index;
            frame.push(base as u8);
            frame.push((base / 2) as u8);
            frame.push(index as u8);
        }
    }
    frame
}
