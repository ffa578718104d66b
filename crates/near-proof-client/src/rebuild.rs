//! CLI wrapper for rebuilding a block's merkle root from its ancestors

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use tracing::info;

use near_proof_debug::{
    rebuild_block_merkle_root, CachedProvider, ChainDataProvider, DebugConfig, SnapshotProvider,
};

/// CLI arguments for the `rebuild-root` subcommand
#[derive(Clone, Debug, Args)]
pub struct RebuildRootArgs {
    /// Chain snapshot (JSON) to read blocks from
    #[arg(long, env = "NEAR_CHAIN_SNAPSHOT")]
    snapshot: PathBuf,
    /// Height of the block whose root is rebuilt
    #[arg(long)]
    height: u64,
    /// Number of blocks produced before it
    #[arg(long)]
    ordinal: u64,
    /// Debug config (JSON); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Run the `rebuild-root` subcommand
pub fn run(args: RebuildRootArgs) -> Result<(), anyhow::Error> {
    let config = match &args.config {
        Some(path) => DebugConfig::from_json_file(path)?,
        None => DebugConfig::default(),
    };
    let provider = CachedProvider::new(SnapshotProvider::from_json_file(&args.snapshot)?);

    let root = rebuild_block_merkle_root(&provider, args.height, args.ordinal, &config)?;
    println!("{}", root);

    let block = provider.block_by_height(args.height)?;
    if root != block.block_merkle_root {
        bail!(
            "Block {} records block merkle root {}",
            block.hash,
            block.block_merkle_root
        );
    }
    info!("Rebuilt root matches block {}", block.hash);
    Ok(())
}
