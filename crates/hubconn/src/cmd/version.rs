use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    println!("hubconn {}", env!("CARGO_PKG_VERSION"));
    if args.extended {
        println!(
            "target: {}",
            option_env!("HUBCONN_BUILD_TARGET").unwrap_or("unknown")
        );
        println!("protocols: json");
        println!("async codec: {}", cfg!(feature = "async"));
    }
    Ok(SUCCESS)
}
