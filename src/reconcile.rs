//! Recursive range-hash reconciliation: given two key/value stores that each
//! expose [`RangeSource`], compute the minimum coalesced list of key ranges
//! over which they differ.

use crate::error::DepotResult;
use crate::store::{Edge, RangeDigest, Store};

/// A half-open key range `[first, last)` that must be exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DivergentRange {
    pub first: Edge,
    pub last: Edge,
}

/// The minimum contract `reconcile` needs from a key/value store: compute a
/// range digest for a bucket. Implemented by [`Store`]; reconciliation is
/// generic over this trait rather than hard-wiring two concrete stores
/// (replacing the reference's dynamic KV-engine polymorphism with a small
/// explicit interface).
pub trait RangeSource {
    fn range_digest(&self, bucket: &str, first: &Edge, last: &Edge) -> DepotResult<RangeDigest>;
}

impl RangeSource for Store {
    fn range_digest(&self, bucket: &str, first: &Edge, last: &Edge) -> DepotResult<RangeDigest> {
        Store::range_digest(self, bucket, first, last)
    }
}

/// Compute the minimum coalesced list of ranges in which `local` and
/// `remote` differ, within `[first, last)` of `bucket`.
pub fn reconcile<L, R>(
    bucket: &str,
    first: &Edge,
    last: &Edge,
    local: &L,
    remote: &R,
) -> DepotResult<Vec<DivergentRange>>
where
    L: RangeSource,
    R: RangeSource,
{
    let raw = reconcile_recursive(bucket, first, last, local, remote)?;
    Ok(coalesce(raw))
}

fn reconcile_recursive<L, R>(
    bucket: &str,
    first: &Edge,
    last: &Edge,
    local: &L,
    remote: &R,
) -> DepotResult<Vec<DivergentRange>>
where
    L: RangeSource,
    R: RangeSource,
{
    let local_digest = local.range_digest(bucket, first, last)?;
    let remote_digest = remote.range_digest(bucket, first, last)?;

    if local_digest.count == 0 && remote_digest.count > 0 {
        return Ok(vec![DivergentRange {
            first: first.clone(),
            last: last.clone(),
        }]);
    }

    if local_digest.digest == remote_digest.digest {
        tracing::debug!(bucket, "range converged");
        return Ok(Vec::new());
    }

    if local_digest.count == 1 {
        tracing::debug!(bucket, "irreducible divergent leaf");
        return Ok(vec![DivergentRange {
            first: first.clone(),
            last: last.clone(),
        }]);
    }

    let median = Edge::Key(local_digest.median.clone());
    tracing::debug!(bucket, ?median, "bisecting divergent range");
    let mut left = reconcile_recursive(bucket, first, &median, local, remote)?;
    let right = reconcile_recursive(bucket, &median, last, local, remote)?;
    left.extend(right);
    Ok(left)
}

/// Merge adjacent ranges where `prev.last == next.first`.
fn coalesce(ranges: Vec<DivergentRange>) -> Vec<DivergentRange> {
    let mut out: Vec<DivergentRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if let Some(prev) = out.last_mut() {
            if prev.last == range.first {
                prev.last = range.last;
                continue;
            }
        }
        out.push(range);
    }
    out
}

/// Does `range` cover `key` under the half-open `[first, last)` convention?
#[cfg(test)]
fn range_covers(range: &DivergentRange, key: &[u8]) -> bool {
    let above_first = match &range.first {
        Edge::First => true,
        Edge::Key(k) => k.as_slice() <= key,
        Edge::Last => false,
    };
    let below_last = match &range.last {
        Edge::Last => true,
        Edge::Key(k) => key < k.as_slice(),
        Edge::First => false,
    };
    above_first && below_last
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_store(keys: &[&str]) -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("depot.redb")).unwrap();
        store.create_bucket("mail").unwrap();
        for k in keys {
            store.put("mail", k.as_bytes(), b"").unwrap();
        }
        (dir, store)
    }

    #[test]
    fn s4_identical_stores_converge() {
        let keys = ["hello0", "hello1", "hello2", "hello3", "hello4", "hello5"];
        let (_d1, a) = seeded_store(&keys);
        let (_d2, b) = seeded_store(&keys);

        let result = reconcile("mail", &Edge::First, &Edge::Last, &a, &b).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn s5_one_missing_key_is_found() {
        let (_d1, a) = seeded_store(&["hello0", "hello1", "hello2", "hello3", "hello4", "hello5"]);
        let (_d2, b) = seeded_store(&["hello0", "hello1", "hello3", "hello4", "hello5"]);

        let result = reconcile("mail", &Edge::First, &Edge::Last, &a, &b).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].first, Edge::key(*b"hello2"));
        assert_eq!(result[0].last, Edge::key(*b"hello3"));
    }

    #[test]
    fn empty_local_nonempty_remote_returns_whole_range() {
        let (_d1, a) = seeded_store(&[]);
        let (_d2, b) = seeded_store(&["hello0", "hello1"]);

        let result = reconcile("mail", &Edge::First, &Edge::Last, &a, &b).unwrap();
        assert_eq!(result, vec![DivergentRange { first: Edge::First, last: Edge::Last }]);
    }

    #[test]
    fn coalescing_merges_adjacent_leaves() {
        let ranges = vec![
            DivergentRange { first: Edge::key(*b"a"), last: Edge::key(*b"b") },
            DivergentRange { first: Edge::key(*b"b"), last: Edge::key(*b"c") },
            DivergentRange { first: Edge::key(*b"d"), last: Edge::key(*b"e") },
        ];
        let coalesced = coalesce(ranges);
        assert_eq!(
            coalesced,
            vec![
                DivergentRange { first: Edge::key(*b"a"), last: Edge::key(*b"c") },
                DivergentRange { first: Edge::key(*b"d"), last: Edge::key(*b"e") },
            ]
        );
    }

    #[test]
    fn no_further_coalescing_possible_in_result() {
        let (_d1, a) = seeded_store(&["hello0", "hello1", "hello2", "hello3", "hello4", "hello5"]);
        let (_d2, b) = seeded_store(&["hello0", "hello5"]);

        let result = reconcile("mail", &Edge::First, &Edge::Last, &a, &b).unwrap();
        for pair in result.windows(2) {
            assert_ne!(pair[0].last, pair[1].first);
        }
    }

    #[test]
    fn reconcile_terminates_on_large_single_sided_divergence() {
        let keys: Vec<String> = (0..200).map(|i| format!("key{:04}", i)).collect();
        let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
        let (_d1, a) = seeded_store(&key_refs);
        let (_d2, b) = seeded_store(&[]);

        let result = reconcile("mail", &Edge::First, &Edge::Last, &a, &b).unwrap();
        assert_eq!(result, vec![DivergentRange { first: Edge::First, last: Edge::Last }]);
    }

    proptest::proptest! {
        #![proptest_config(proptest::prelude::ProptestConfig::with_cases(32))]

        /// Every key present in exactly one of the two stores must fall
        /// within some returned divergent range: reconciliation never
        /// reports convergence over a range that actually differs.
        #[test]
        fn every_asymmetric_key_is_covered(
            local_mask in proptest::collection::vec(proptest::prelude::any::<bool>(), 20),
            remote_mask in proptest::collection::vec(proptest::prelude::any::<bool>(), 20),
        ) {
            let universe: Vec<String> = (0..20).map(|i| format!("key{:02}", i)).collect();
            let local_keys: Vec<&str> = universe.iter().zip(&local_mask).filter(|(_, m)| **m).map(|(k, _)| k.as_str()).collect();
            let remote_keys: Vec<&str> = universe.iter().zip(&remote_mask).filter(|(_, m)| **m).map(|(k, _)| k.as_str()).collect();

            let (_d1, a) = seeded_store(&local_keys);
            let (_d2, b) = seeded_store(&remote_keys);

            let result = reconcile("mail", &Edge::First, &Edge::Last, &a, &b).unwrap();

            for (key, (in_local, in_remote)) in universe.iter().zip(local_mask.iter().zip(&remote_mask)) {
                if in_local != in_remote {
                    let covered = result.iter().any(|r| range_covers(r, key.as_bytes()));
                    proptest::prop_assert!(covered, "key {} differs but is not covered by {:?}", key, result);
                }
            }
        }
    }
}
