//! crates/match/src/parallel.rs
//!
//! Partitioned parallel scanning over an in-memory target.

use std::cmp::Reverse;

use rayon::prelude::*;
#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::index::ChunkIndex;
use crate::scanner::{Match, ScanError, scan};

/// Default partition length for [`scan_parallel`], in bytes.
pub const DEFAULT_PARTITION_LEN: usize = 8 * 1024 * 1024;

/// Scans an in-memory target with one rolling scan per partition.
///
/// Equivalent to [`scan_parallel_with_partition_len`] with
/// [`DEFAULT_PARTITION_LEN`].
///
/// # Errors
///
/// Returns the first [`ScanError`] raised by any partition scan.
#[cfg_attr(
    feature = "tracing",
    instrument(skip_all, fields(target_len = target.len()))
)]
pub fn scan_parallel(target: &[u8], index: &ChunkIndex<'_>) -> Result<Vec<Match>, ScanError> {
    scan_parallel_with_partition_len(target, index, DEFAULT_PARTITION_LEN)
}

/// Scans an in-memory target split into `partition_len`-byte partitions,
/// each scanned independently on the rayon thread pool.
///
/// Every partition is extended by `max_chunk_length - 1` bytes of the
/// following one, so a chunk occurrence straddling a partition boundary is
/// still seen by the partition it starts in; matches beginning inside the
/// extension belong to the next partition and are dropped. Results are
/// merged and sorted by `(target_offset, longest first)`, ready for
/// [`crate::assemble`].
///
/// A partitioned scan may report hits a single serial scan skips over
/// (greedy skipping does not cross partition boundaries); the assembled
/// coverage is equivalent.
///
/// # Errors
///
/// Returns the first [`ScanError`] raised by any partition scan.
pub fn scan_parallel_with_partition_len(
    target: &[u8],
    index: &ChunkIndex<'_>,
    partition_len: usize,
) -> Result<Vec<Match>, ScanError> {
    let max_length = index.max_length();
    if max_length == 0 || target.len() <= partition_len.max(max_length) {
        return scan(target, index).collect();
    }

    let partition_len = partition_len.max(max_length);
    let overlap = max_length - 1;

    let starts: Vec<usize> = (0..target.len()).step_by(partition_len).collect();
    let mut merged: Vec<Match> = starts
        .into_par_iter()
        .map(|start| {
            let end = (start + partition_len).min(target.len());
            let extended_end = (end + overlap).min(target.len());
            let mut local = Vec::new();
            for item in scan(&target[start..extended_end], index) {
                let mut m = item?;
                m.target_offset += start as u64;
                if m.target_offset < end as u64 {
                    local.push(m);
                }
            }
            Ok(local)
        })
        .collect::<Result<Vec<Vec<Match>>, ScanError>>()?
        .into_iter()
        .flatten()
        .collect();

    merged.sort_unstable_by_key(|m| (m.target_offset, Reverse(m.length)));
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assemble;
    use checksums::StrongHash;
    use chunkset::{BoundaryPolicy, ChunkSet, extract};

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i.wrapping_mul(41) % 249) as u8).collect()
    }

    fn chunk_set(data: &[u8], len: u64) -> ChunkSet {
        extract(data, &BoundaryPolicy::fixed_size(len), StrongHash::Sha256)
            .expect("extraction succeeds")
    }

    #[test]
    fn small_target_falls_back_to_a_serial_scan() {
        let data = sample(500);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        let parallel = scan_parallel(&data, &index).expect("scan succeeds");
        let serial: Vec<Match> = scan(data.as_slice(), &index)
            .collect::<Result<_, _>>()
            .expect("scan succeeds");
        assert_eq!(parallel, serial);
    }

    #[test]
    fn partitioned_scan_covers_the_reference_completely() {
        let data = sample(10_000);
        let set = chunk_set(&data, 512);
        let index = ChunkIndex::new(&set);

        let matches =
            scan_parallel_with_partition_len(&data, &index, 1024).expect("scan succeeds");
        let map = assemble(matches, data.len() as u64);
        assert!(map.is_complete());
        assert_eq!(map.matched_len(), data.len() as u64);
    }

    #[test]
    fn boundary_straddling_occurrences_are_not_missed() {
        let block = sample(300);
        let set = chunk_set(&block, 300);
        let index = ChunkIndex::new(&set);

        // Place the chunk so it straddles the 1024-byte partition boundary.
        let mut target = vec![0u8; 900];
        target.extend_from_slice(&block);
        target.extend(vec![0u8; 900]);

        let matches =
            scan_parallel_with_partition_len(&target, &index, 1024).expect("scan succeeds");
        assert!(matches.iter().any(|m| m.target_offset == 900));
    }

    #[test]
    fn assembled_coverage_matches_the_serial_scan() {
        let data = sample(8_000);
        let set = chunk_set(&data, 256);
        let index = ChunkIndex::new(&set);

        // Shift the content so matches land at odd offsets.
        let mut target = vec![0x55; 33];
        target.extend_from_slice(&data);

        let serial: Vec<Match> = scan(target.as_slice(), &index)
            .collect::<Result<_, _>>()
            .expect("scan succeeds");
        let parallel =
            scan_parallel_with_partition_len(&target, &index, 2048).expect("scan succeeds");

        let serial_map = assemble(serial, target.len() as u64);
        let parallel_map = assemble(parallel, target.len() as u64);
        assert_eq!(serial_map.matched_len(), parallel_map.matched_len());
        assert_eq!(serial_map.gaps(), parallel_map.gaps());
    }

    #[test]
    fn matches_are_sorted_after_the_merge() {
        let data = sample(6_000);
        let set = chunk_set(&data, 200);
        let index = ChunkIndex::new(&set);

        let matches =
            scan_parallel_with_partition_len(&data, &index, 1000).expect("scan succeeds");
        for pair in matches.windows(2) {
            assert!(
                (pair[0].target_offset, Reverse(pair[0].length))
                    <= (pair[1].target_offset, Reverse(pair[1].length))
            );
        }
    }

    #[test]
    fn empty_index_yields_no_matches() {
        let set = chunk_set(&[], 100);
        let index = ChunkIndex::new(&set);
        let target = sample(5_000);

        assert!(scan_parallel(&target, &index)
            .expect("scan succeeds")
            .is_empty());
    }
}
