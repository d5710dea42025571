use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("shellwire {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: shellwire");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "target: {}",
        option_env!("SHELLWIRE_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "profile: {}",
        option_env!("SHELLWIRE_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "default_engine: {}",
        shellwire_process::default_executable().display()
    );
    println!(
        "frame_sentinels: {} {}",
        shellwire_frame::DEFAULT_HEAD,
        shellwire_frame::DEFAULT_TAIL
    );
    println!("features: pipeline={}, cli=true", cfg!(feature = "pipeline"));

    Ok(SUCCESS)
}
