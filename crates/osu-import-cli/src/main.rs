//! osu-import - Import osu! beatmap sets into a local beatmap database
//!
//! Usage:
//!   osu-import <command> [options]
//!   osu-import --help       Show help

use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod cli;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.is_empty() || args.iter().any(|a| a == "--help" || a == "-h") {
        cli::print_help();
        return Ok(());
    }

    match cli::parse_args(&args) {
        Ok((command, options)) => {
            init_logging(options.verbose);
            cli::run(command, options)
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            eprintln!();
            cli::print_help();
            std::process::exit(1);
        }
    }
}

fn init_logging(verbose: bool) {
    // RUST_LOG wins over --verbose; stdout is reserved for command output
    let default_level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.to_string()));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
