// src/main.rs
use std::process::ExitCode;

use clap::Parser;
use colorful::Colorful;

use voicecheckr::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli::run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red(), err);
            ExitCode::from(1)
        }
    }
}

/// `RUST_LOG` wins; otherwise info, raised by each -v
fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_millis()
        .init();
}
