#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Chunk-set extraction and rolling-hash matching for delta transfers.
//!
//! This facade re-exports the workspace crates and wires them into one
//! pipeline: extract chunks from a reference under a boundary policy, index
//! them by weak checksum, scan a target for byte-exact occurrences at
//! arbitrary offsets, and assemble the hits into a coverage map of matched
//! ranges and unmatched gaps.
//!
//! ```
//! use deltamap::{BoundaryPolicy, StrongHash, coverage};
//!
//! let reference = b"the quick brown fox jumps over the lazy dog.....";
//! let mut target = b"prefix--".to_vec();
//! target.extend_from_slice(reference);
//!
//! let map = coverage(
//!     reference.as_slice(),
//!     &target,
//!     &BoundaryPolicy::fixed_size(16),
//!     StrongHash::Sha256,
//! )?;
//! assert_eq!(map.unmatched_len(), 8);
//! # Ok::<(), deltamap::Error>(())
//! ```

use thiserror::Error;

pub use checksums::{RollingChecksum, RollingError, StrongHash, StrongHasher};
pub use chunkset::{
    BoundaryPolicy, ByteSource, Chunk, ChunkId, ChunkSet, ExtractError, PolicyError, extract,
    extract_auto, extract_parallel,
};
pub use matching::{
    ChunkIndex, CoverageMap, Match, RollingScanner, ScanError, assemble, scan, scan_parallel,
};

/// Top-level error for the combined extract-scan-assemble pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// Chunk extraction from the reference failed.
    #[error(transparent)]
    Extract(#[from] ExtractError),
    /// Scanning the target failed.
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// Builds a weak-checksum index over an extracted chunk set.
///
/// Thin alias for [`ChunkIndex::new`], kept so the whole pipeline reads as
/// free functions: [`extract`], [`build_index`], [`scan`], [`assemble`].
#[must_use]
pub fn build_index(set: &ChunkSet) -> ChunkIndex<'_> {
    ChunkIndex::new(set)
}

/// Runs the full pipeline: extracts chunks from `reference`, scans `target`
/// for their occurrences, and assembles the resulting coverage map.
///
/// Extraction parallelism is chosen automatically by reference size; the
/// scan itself is serial. Callers that reuse one reference against many
/// targets should instead extract and index once and call [`scan`] per
/// target.
///
/// # Errors
///
/// Returns [`Error::Extract`] when the policy is invalid or the reference
/// cannot be read, and [`Error::Scan`] when reading the target fails.
pub fn coverage(
    reference: &[u8],
    target: &[u8],
    policy: &BoundaryPolicy,
    algorithm: StrongHash,
) -> Result<CoverageMap, Error> {
    let set = extract_auto(reference, policy, algorithm)?;
    let index = build_index(&set);
    let matches = scan(target, &index).collect::<Result<Vec<_>, _>>()?;
    Ok(assemble(matches, target.len() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i.wrapping_mul(43) % 247) as u8).collect()
    }

    #[test]
    fn pipeline_covers_an_identical_target_completely() {
        let data = sample(1024);
        let map = coverage(
            &data,
            &data,
            &BoundaryPolicy::fixed_size(128),
            StrongHash::Sha256,
        )
        .expect("pipeline succeeds");

        assert!(map.is_complete());
        assert_eq!(map.matched_len(), 1024);
    }

    #[test]
    fn pipeline_reports_unmatched_bytes_as_gaps() {
        let data = sample(512);
        let mut target = data.clone();
        target.extend(vec![0xFF; 64]);

        let map = coverage(
            &data,
            &target,
            &BoundaryPolicy::fixed_size(128),
            StrongHash::Sha256,
        )
        .expect("pipeline succeeds");

        assert_eq!(map.gaps(), &[512..576]);
    }

    #[test]
    fn extraction_errors_surface_through_the_facade() {
        let data = sample(128);
        let result = coverage(
            &data,
            &data,
            &BoundaryPolicy::fixed_size(0),
            StrongHash::Sha256,
        );
        assert!(matches!(result, Err(Error::Extract(_))));
    }
}
