use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("posepipe {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: posepipe");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("POSEPIPE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("wire: u32-le length prefix, f64-le landmark triples");
    println!("max_landmarks: {}", posepipe::wire::MAX_LANDMARKS);
    println!(
        "features: pipeline={}, async={}, cli=true",
        cfg!(feature = "pipeline"),
        cfg!(feature = "async")
    );

    Ok(SUCCESS)
}
