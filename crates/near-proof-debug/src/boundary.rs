//! Binary search for the height at which some chain property changes.

use tracing::{debug, info};

use crate::provider::{resolve_block_at_or_after, BlockRecord, ChainDataProvider, ProviderError};

/// Height in `(lo, hi]` at which `oracle` first differs from `oracle(lo)`.
///
/// Returns `None` when the oracle agrees at both ends. The oracle is assumed to step once
/// inside the interval; otherwise the result is some transition, not necessarily the first.
pub fn find_boundary<T, E, F>(lo: u64, hi: u64, mut oracle: F) -> Result<Option<u64>, E>
where
    T: PartialEq,
    F: FnMut(u64) -> Result<T, E>,
{
    if lo >= hi {
        return Ok(None);
    }
    let value_lo = oracle(lo)?;
    if oracle(hi)? == value_lo {
        return Ok(None);
    }

    let (mut lo, mut hi) = (lo, hi);
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        if oracle(mid)? == value_lo {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    Ok(Some(hi))
}

/// Every height in `(lo, hi]` at which `oracle` differs from its value at the previous
/// height, ascending.
///
/// Sub-intervals whose endpoints agree are assumed constant and are not explored.
pub fn find_all_boundaries<T, E, F>(lo: u64, hi: u64, mut oracle: F) -> Result<Vec<u64>, E>
where
    T: PartialEq,
    F: FnMut(u64) -> Result<T, E>,
{
    if lo >= hi {
        return Ok(Vec::new());
    }
    let value_lo = oracle(lo)?;
    let value_hi = oracle(hi)?;
    transitions(lo, &value_lo, hi, &value_hi, &mut oracle)
}

fn transitions<T, E, F>(
    lo: u64,
    value_lo: &T,
    hi: u64,
    value_hi: &T,
    oracle: &mut F,
) -> Result<Vec<u64>, E>
where
    T: PartialEq,
    F: FnMut(u64) -> Result<T, E>,
{
    if value_lo == value_hi {
        return Ok(Vec::new());
    }
    if hi - lo == 1 {
        return Ok(vec![hi]);
    }

    let mid = lo + (hi - lo) / 2;
    let value_mid = oracle(mid)?;
    let mut found = transitions(lo, value_lo, mid, &value_mid, oracle)?;
    found.extend(transitions(mid, &value_mid, hi, value_hi, oracle)?);
    Ok(found)
}

/// First block of the epoch that starts in `(lo, hi]`, if any.
///
/// Each height is evaluated at the first block produced at or after it.
pub fn find_epoch_change<P: ChainDataProvider + ?Sized>(
    provider: &P,
    lo: u64,
    hi: u64,
    max_probes: u64,
) -> Result<Option<BlockRecord>, ProviderError> {
    info!("Searching for an epoch change between heights {} and {} ...", lo, hi);
    let boundary = find_boundary(lo, hi, |height| {
        let block = resolve_block_at_or_after(provider, height, max_probes)?;
        debug!("Height {} resolves to epoch {}", height, block.epoch_id);
        Ok::<_, ProviderError>(block.epoch_id)
    })?;

    match boundary {
        Some(height) => {
            let block = resolve_block_at_or_after(provider, height, max_probes)?;
            info!(
                "Epoch {} starts at block {} (height {})",
                block.epoch_id, block.hash, block.height
            );
            Ok(Some(block))
        }
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;

    use crate::provider::SnapshotProvider;
    use crate::testing::{synthetic_chain, test_epoch_id};

    fn step(k: u64) -> impl FnMut(u64) -> Result<u8, Infallible> {
        move |i| Ok(if i < k { 0 } else { 1 })
    }

    #[test]
    fn test_step_function() {
        let n = 100;
        for k in 1..n {
            assert_eq!(find_boundary(0, n, step(k)).unwrap(), Some(k));
        }
    }

    #[test]
    fn test_no_boundary() {
        assert_eq!(find_boundary(0, 50, step(80)).unwrap(), None);
        assert_eq!(find_boundary(10, 10, step(5)).unwrap(), None);
    }

    #[test]
    fn test_search_is_logarithmic() {
        let mut calls = 0;
        let boundary = find_boundary(0, 1 << 20, |i| {
            calls += 1;
            Ok::<_, Infallible>(i >= 12345)
        })
        .unwrap();
        assert_eq!(boundary, Some(12345));
        assert!(calls <= 22, "{} oracle calls", calls);
    }

    #[test]
    fn test_oracle_errors_propagate() {
        let result = find_boundary(0, 10, |i| if i == 5 { Err("boom") } else { Ok(i > 5) });
        assert_eq!(result, Err("boom"));
    }

    #[test]
    fn test_find_all_boundaries() {
        let changes = [7u64, 19, 20, 63];
        let oracle = |i: u64| Ok::<_, Infallible>(changes.iter().filter(|c| **c <= i).count());
        assert_eq!(find_all_boundaries(0, 100, oracle).unwrap(), vec![7, 19, 20, 63]);
        assert_eq!(find_all_boundaries(21, 62, oracle).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn test_find_epoch_change_over_skipped_heights() {
        // Epochs are 50 heights long; the first block of the second epoch is skipped
        let provider = SnapshotProvider::new(synthetic_chain(20..=90, &[50, 51], 50)).unwrap();
        let block = find_epoch_change(&provider, 20, 90, 10).unwrap().unwrap();
        assert_eq!(block.height, 52);
        assert_eq!(block.epoch_id, test_epoch_id(52, 50));

        assert!(find_epoch_change(&provider, 55, 90, 10).unwrap().is_none());
    }
}
