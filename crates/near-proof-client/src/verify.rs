//! CLI wrapper for the verify functionality

use std::path::Path;

use anyhow::Context;
use clap::Args;
use tracing::info;

use crate::format::format_verification;
use near_proof_verify::{verify_full_outcome_proof, CryptoHash, FullOutcomeProof};

/// CLI arguments for the `verify` subcommand
#[derive(Clone, Debug, Args)]
pub struct VerifyArgs {
    /// Proof bytes as hex, or a path to a file holding them
    #[arg(long)]
    proof: String,
    /// Block merkle root the light client recorded at the checkpoint height (base58 or hex)
    #[arg(long, env = "NEAR_BLOCK_MERKLE_ROOT", value_parser = CryptoHash::parse_any)]
    block_merkle_root: CryptoHash,
    /// Print the result as JSON instead of a table
    #[arg(long, default_value = "false")]
    json: bool,
}

/// Run the `verify` subcommand: decode a proof and verify it against a trusted root
pub fn run(args: VerifyArgs) -> Result<(), anyhow::Error> {
    let bytes = load_proof_bytes(&args.proof)?;
    info!("Decoding outcome proof ({} bytes) ...", bytes.len());
    let proof = FullOutcomeProof::from_bytes(&bytes).context("Failed to decode proof")?;

    let result = verify_full_outcome_proof(&proof, &args.block_merkle_root)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!("{}", format_verification(&proof, &result));
    }
    Ok(())
}

/// Read proof bytes given either inline as hex or as a file path.
///
/// Files may hold hex text or the raw Borsh bytes.
pub fn load_proof_bytes(source: &str) -> Result<Vec<u8>, anyhow::Error> {
    let path = Path::new(source);
    if path.is_file() {
        info!("Reading proof from {}", path.display());
        let contents = std::fs::read(path)
            .with_context(|| format!("Failed to read proof file {}", path.display()))?;
        return Ok(match std::str::from_utf8(&contents) {
            Ok(text) => match decode_hex(text) {
                Ok(bytes) => bytes,
                Err(_) => contents,
            },
            Err(_) => contents,
        });
    }
    decode_hex(source).context("Proof is neither an existing file nor valid hex")
}

fn decode_hex(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let text = text.trim();
    hex::decode(text.strip_prefix("0x").unwrap_or(text))
}
