use posepipe::pipeline::ShutdownSignal;
use posepipe::wire::MessageReader;
use tracing::debug;

use crate::cmd::{install_ctrlc_handler, ListenArgs};
use crate::exit::{frame_error, transport_error, CliResult, SUCCESS};
use crate::output::{print_landmarks, OutputFormat};

pub fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let reader = args
        .points
        .open_reader()
        .map_err(|err| transport_error("open failed", err))?;
    let mut messages = MessageReader::new(reader);

    let shutdown = ShutdownSignal::new();
    install_ctrlc_handler(shutdown.clone())?;

    let mut printed = 0u64;

    while !shutdown.is_requested() {
        let Some(set) = messages
            .read_landmarks()
            .map_err(|err| frame_error("receive failed", err))?
        else {
            debug!(messages = printed, "landmark stream ended");
            break;
        };

        print_landmarks(printed, &set, format);
        printed = printed.saturating_add(1);

        if let Some(count) = args.count {
            if printed >= count as u64 {
                break;
            }
        }
    }

    Ok(SUCCESS)
}
