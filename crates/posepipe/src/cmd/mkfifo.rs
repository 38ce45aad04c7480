use crate::cmd::MkfifoArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::OutputFormat;

#[cfg(unix)]
pub fn run(args: MkfifoArgs, format: OutputFormat) -> CliResult<i32> {
    use posepipe::transport::{create_fifo, DEFAULT_FIFO_MODE};

    use crate::exit::transport_error;
    use crate::output::print_fifo;

    for path in &args.paths {
        let created = create_fifo(path, DEFAULT_FIFO_MODE)
            .map_err(|err| transport_error("mkfifo failed", err))?;
        print_fifo(path, created, format);
    }
    Ok(SUCCESS)
}

#[cfg(not(unix))]
pub fn run(_args: MkfifoArgs, _format: OutputFormat) -> CliResult<i32> {
    Err(crate::exit::CliError::new(
        crate::exit::USAGE,
        "named pipes are only supported on unix",
    ))
}
