//! CLI wrapper for proof diagnosis against recorded chain history

use std::path::PathBuf;

use anyhow::bail;
use clap::Args;
use tracing::{info, warn};

use crate::format::{format_report, format_verification};
use near_proof_debug::{
    diagnose_receipt, CachedProvider, ChainDataProvider, DebugConfig, Diagnosis, LevelOutcome,
    SnapshotProvider,
};
use near_proof_verify::{CryptoHash, FullOutcomeProof};

/// CLI arguments for the `diagnose` subcommand
#[derive(Clone, Debug, Args)]
pub struct DiagnoseArgs {
    /// Chain snapshot (JSON) to read blocks and proofs from
    #[arg(long, env = "NEAR_CHAIN_SNAPSHOT")]
    snapshot: PathBuf,
    /// Receipt whose inclusion proof is checked (base58 or hex)
    #[arg(long, value_parser = CryptoHash::parse_any)]
    receipt_id: CryptoHash,
    /// Height whose block merkle root is trusted
    #[arg(long)]
    checkpoint_height: u64,
    /// Debug config (JSON); defaults apply to missing fields
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the diagnosis as JSON instead of a table
    #[arg(long, default_value = "false")]
    json: bool,
}

/// Run the `diagnose` subcommand
pub fn run(args: DiagnoseArgs) -> Result<(), anyhow::Error> {
    let config = match &args.config {
        Some(path) => DebugConfig::from_json_file(path)?,
        None => DebugConfig::default(),
    };
    let provider = CachedProvider::new(SnapshotProvider::from_json_file(&args.snapshot)?);

    let diagnosis = diagnose_receipt(
        &provider,
        &args.receipt_id,
        args.checkpoint_height,
        &config,
    )?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&diagnosis)?);
    }

    match diagnosis {
        Diagnosis::Verified(result) => {
            if !args.json {
                // Served from the cache filled by the diagnosis
                let bytes = provider
                    .inclusion_proof_bytes(&args.receipt_id, args.checkpoint_height)?;
                let proof = FullOutcomeProof::from_bytes(&bytes)?;
                println!("{}", format_verification(&proof, &result));
            }
            info!("Proof verifies against checkpoint {}", args.checkpoint_height);
            Ok(())
        }
        Diagnosis::OutcomeRootMismatch { computed, expected } => {
            bail!(
                "Outcome does not hash up to its block: computed {}, header commits to {}",
                computed,
                expected
            )
        }
        Diagnosis::BlockProof(report) => {
            if !args.json {
                println!("{}", format_report(&report));
            }
            let inconclusive = report
                .levels
                .iter()
                .filter(|l| matches!(l.outcome, LevelOutcome::Inconclusive { .. }))
                .count();
            if inconclusive > 0 {
                warn!("{} levels could not be rebuilt within the configured bounds", inconclusive);
            }
            match report.first_divergence {
                Some(level) => bail!("Block path diverges from chain history at level {}", level),
                None => bail!(
                    "Block path reaches {} instead of {}, no diverging level found",
                    report.computed_root,
                    report.expected_root
                ),
            }
        }
    }
}
