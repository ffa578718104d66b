//! Terminal rendering of verification results and block path reports.

use chrono::DateTime;
use near_proof_debug::{BlockProofReport, LevelOutcome};
use near_proof_verify::{ExecutionStatus, FullOutcomeProof, VerificationResult};

const WIDTH: usize = 96;

/// Format a verified outcome for terminal display
pub fn format_verification(proof: &FullOutcomeProof, result: &VerificationResult) -> String {
    let outcome = &proof.outcome_proof.outcome_with_id.outcome;
    let header = &proof.block_header_lite.inner_lite;

    let mut output = String::new();
    output.push('\n');
    output.push_str(&top_border("Verified Outcome"));
    output.push_str(&row(&format!("\x1b[33mID:\x1b[0m {}", result.outcome_id)));
    output.push_str(&separator());

    output.push_str(&row("\x1b[33mOUTCOME:\x1b[0m"));
    output.push_str(&row(&format!(
        "Executor: {}",
        String::from_utf8_lossy(&outcome.executor_id)
    )));
    output.push_str(&row(&format!("Status: {}", format_status(&outcome.status))));
    output.push_str(&row(&format!("Gas burnt: {}", outcome.gas_burnt)));
    output.push_str(&row(&format!("Tokens burnt: {} yoctoNEAR", outcome.tokens_burnt)));
    output.push_str(&row(&format!("Receipts: {}", outcome.receipt_ids.len())));
    for log in &outcome.logs {
        output.push_str(&row(&format!(
            "\x1b[90m  {}\x1b[0m",
            String::from_utf8_lossy(log)
        )));
    }
    output.push_str(&separator());

    output.push_str(&row("\x1b[33mBLOCK:\x1b[0m"));
    output.push_str(&row(&format!("Block hash: {}", result.block_hash)));
    output.push_str(&row(&format!("Block height: {}", result.block_height)));
    output.push_str(&row(&format!(
        "Block timestamp: {}",
        format_timestamp_nanos(header.timestamp)
    )));
    output.push_str(&row(&format!("Outcome root: {}", result.outcome_root)));
    output.push_str(&row(&format!(
        "Block merkle root: {}",
        result.block_merkle_root
    )));
    output.push_str(&bottom_border());

    output
}

/// Format a level-by-level block path report
pub fn format_report(report: &BlockProofReport) -> String {
    let mut output = String::new();
    output.push('\n');
    output.push_str(&top_border("Block Path Check"));
    output.push_str(&row(&format!(
        "Block {} at height {}",
        report.block_hash, report.block_height
    )));
    output.push_str(&separator());

    for level in &report.levels {
        let outcome = match &level.outcome {
            LevelOutcome::Match => "\x1b[32mmatch\x1b[0m".to_string(),
            LevelOutcome::Mismatch { recomputed } => {
                format!("\x1b[31mmismatch\x1b[0m, chain gives {}", recomputed)
            }
            LevelOutcome::Skipped => "\x1b[90mskipped\x1b[0m".to_string(),
            LevelOutcome::Inconclusive { reason } => {
                format!("\x1b[90minconclusive\x1b[0m ({})", reason)
            }
        };
        output.push_str(&row(&format!(
            "{:>2} {:<5} {:>8} blocks  {}",
            level.level,
            format!("{:?}", level.direction),
            level.size,
            outcome
        )));
    }
    output.push_str(&separator());

    match report.first_divergence {
        Some(level) => output.push_str(&row(&format!(
            "\x1b[31mFirst divergence at level {}\x1b[0m",
            level
        ))),
        None => output.push_str(&row("No diverging level found")),
    }
    output.push_str(&row(&format!("Path reaches: {}", report.computed_root)));
    output.push_str(&row(&format!("Expected:     {}", report.expected_root)));
    output.push_str(&bottom_border());

    output
}

fn format_status(status: &ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Unknown => "unknown".to_string(),
        ExecutionStatus::Failure => "failure".to_string(),
        ExecutionStatus::SuccessValue(value) => {
            format!("success, {} byte value", value.len())
        }
        ExecutionStatus::SuccessReceiptId(id) => format!("success, receipt {}", id),
    }
}

fn top_border(title: &str) -> String {
    let label = format!("─ {} ", title);
    let fill = (WIDTH + 2).saturating_sub(label.chars().count());
    format!("┌{}{}┐\n", label, "─".repeat(fill))
}

fn separator() -> String {
    format!("├{}┤\n", "─".repeat(WIDTH + 2))
}

fn bottom_border() -> String {
    format!("└{}┘\n", "─".repeat(WIDTH + 2))
}

fn row(content: &str) -> String {
    format!("│ {} │\n", format_column_content(content, WIDTH))
}

/// Format content for a column with proper padding
fn format_column_content(content: &str, width: usize) -> String {
    // Remove ANSI color codes for length calculation
    let visible_len = strip_ansi_codes(content).chars().count();

    if visible_len <= width {
        format!("{}{}", content, " ".repeat(width - visible_len))
    } else {
        content.to_string()
    }
}

/// Remove ANSI color codes from a string for length calculation
fn strip_ansi_codes(s: &str) -> String {
    let mut result = String::new();
    let mut chars = s.chars();

    while let Some(c) = chars.next() {
        if c == '\x1b' {
            for next_c in chars.by_ref() {
                if next_c == 'm' {
                    break;
                }
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Format a nanosecond Unix timestamp
fn format_timestamp_nanos(timestamp: u64) -> String {
    let seconds = (timestamp / 1_000_000_000) as i64;
    let nanos = (timestamp % 1_000_000_000) as u32;
    match DateTime::from_timestamp(seconds, nanos) {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S%.3f UTC").to_string(),
        None => format!("{} ns", timestamp),
    }
}
