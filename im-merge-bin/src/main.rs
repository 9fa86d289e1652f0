mod args;

use std::error::Error as _;
use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args = <args::Args as clap::Parser>::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(args.level()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match im_merge::build(&args.job()) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            match e.source() {
                Some(cause) => tracing::error!("{e}: {cause}"),
                None => tracing::error!("{e}"),
            }
            ExitCode::from(e.exit_code())
        },
    }
}
