//! Decoded view of a proof, with the roots it implies

use anyhow::Context;
use clap::Args;
use serde::Serialize;

use crate::verify::load_proof_bytes;
use near_proof_verify::{block_root_of, outcome_root_of, CryptoHash, FullOutcomeProof};

/// CLI arguments for the `inspect` subcommand
#[derive(Clone, Debug, Args)]
pub struct InspectArgs {
    /// Proof bytes as hex, or a path to a file holding them
    #[arg(long)]
    proof: String,
}

#[derive(Serialize)]
struct Inspection<'a> {
    size: usize,
    /// Outcome root implied by the outcome paths
    outcome_root: CryptoHash,
    /// Block merkle root implied by the block path
    block_merkle_root: CryptoHash,
    proof: &'a FullOutcomeProof,
}

/// Run the `inspect` subcommand: print the decoded proof as JSON
pub fn run(args: InspectArgs) -> Result<(), anyhow::Error> {
    let bytes = load_proof_bytes(&args.proof)?;
    let proof = FullOutcomeProof::from_bytes(&bytes).context("Failed to decode proof")?;

    let inspection = Inspection {
        size: bytes.len(),
        outcome_root: outcome_root_of(&proof),
        block_merkle_root: block_root_of(&proof),
        proof: &proof,
    };
    println!("{}", serde_json::to_string_pretty(&inspection)?);
    Ok(())
}
