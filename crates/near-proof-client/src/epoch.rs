//! CLI wrapper for the epoch boundary search

use std::path::PathBuf;

use clap::Args;
use tracing::info;

use near_proof_debug::{find_epoch_change, CachedProvider, DebugConfig, SnapshotProvider};

/// CLI arguments for the `find-epoch-change` subcommand
#[derive(Clone, Debug, Args)]
pub struct FindEpochChangeArgs {
    /// Chain snapshot (JSON) to read blocks from
    #[arg(long, env = "NEAR_CHAIN_SNAPSHOT")]
    snapshot: PathBuf,
    /// Lower end of the height interval
    #[arg(long)]
    from: u64,
    /// Upper end of the height interval
    #[arg(long)]
    to: u64,
    /// Heights probed past a skipped one before giving up
    #[arg(long, default_value_t = DebugConfig::default().max_height_probes)]
    max_probes: u64,
}

/// Run the `find-epoch-change` subcommand
pub fn run(args: FindEpochChangeArgs) -> Result<(), anyhow::Error> {
    let provider = CachedProvider::new(SnapshotProvider::from_json_file(&args.snapshot)?);

    match find_epoch_change(&provider, args.from, args.to, args.max_probes)? {
        Some(block) => println!("{}", serde_json::to_string_pretty(&block)?),
        None => info!(
            "Heights {} and {} belong to the same epoch",
            args.from, args.to
        ),
    }
    Ok(())
}
