//! Command line front end for NEAR outcome proof verification and diagnosis.

use clap::{command, Parser, Subcommand};
use tracing::{error, info, subscriber::set_global_default};
use tracing_subscriber::filter::EnvFilter;

mod diagnose;
mod epoch;
mod format;
mod inspect;
mod rebuild;
mod verify;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Logging level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand, Clone, Debug)]
enum Commands {
    /// Verify a proof against a trusted block merkle root
    Verify(verify::VerifyArgs),
    /// Print a decoded proof as JSON
    Inspect(inspect::InspectArgs),
    /// Verify a receipt's proof from a chain snapshot and locate the failing level
    Diagnose(diagnose::DiagnoseArgs),
    /// Find the first block of a new epoch in a height interval
    FindEpochChange(epoch::FindEpochChangeArgs),
    /// Rebuild a block's merkle root from the blocks before it
    RebuildRoot(rebuild::RebuildRootArgs),
}

fn init_tracing(log_level: &str) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber_builder =
        tracing_subscriber::fmt::Subscriber::builder().with_env_filter(env_filter);

    let subscriber = subscriber_builder.with_writer(std::io::stderr).finish();
    if let Err(err) = set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", err);
    }
}

fn main() {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let res = match cli.command {
        Commands::Verify(args) => verify::run(args),
        Commands::Inspect(args) => inspect::run(args),
        Commands::Diagnose(args) => diagnose::run(args),
        Commands::FindEpochChange(args) => epoch::run(args),
        Commands::RebuildRoot(args) => rebuild::run(args),
    };

    match res {
        Ok(_) => {
            info!("NEAR proof client has exited without errors");
            std::process::exit(0);
        }
        Err(err) => {
            error!("NEAR proof client has exited with error: {:#}", err);
            std::process::exit(1);
        }
    }
}
