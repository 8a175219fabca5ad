//! crates/chunkset/src/extract.rs
//!
//! Chunk extraction from a reference byte source.

use std::io;

use rayon::prelude::*;
use thiserror::Error;
#[cfg(feature = "tracing")]
use tracing::instrument;

use checksums::{RollingChecksum, StrongHash};

use crate::chunk::{Chunk, ChunkId, ChunkSet};
use crate::policy::{BoundaryPolicy, PolicyError};
use crate::source::ByteSource;

/// Errors returned when extracting a chunk set from a reference.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The boundary policy was malformed for the given reference.
    #[error("invalid boundary policy: {0}")]
    InvalidPolicy(
        #[from]
        #[source]
        PolicyError,
    ),
    /// Underlying I/O failure raised while reading reference bytes.
    #[error("failed to read reference bytes during extraction: {0}")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),
    /// A single chunk was too large to buffer on this platform.
    #[error("chunk of {length} bytes at offset {offset} exceeds addressable memory")]
    ChunkTooLarge {
        /// Offset of the oversized chunk in the reference.
        offset: u64,
        /// Length of the oversized chunk in bytes.
        length: u64,
    },
    /// The policy produced more chunks than ids can address.
    #[error("boundary policy produced {0} chunks which exceeds the chunk id range")]
    TooManyChunks(u64),
}

/// Extracts a [`ChunkSet`] covering the entire reference, in order, with no gaps.
///
/// Chunks are read sequentially through the [`ByteSource`]; each chunk is
/// visited exactly once and both its weak rolling checksum and its strong
/// digest are recorded. An empty reference yields an empty chunk set, which
/// is not an error.
///
/// # Errors
///
/// - [`ExtractError::InvalidPolicy`] when the boundary policy is malformed
///   for this reference.
/// - [`ExtractError::Io`] when the byte source fails; extraction aborts and
///   no partial chunk set is returned.
#[cfg_attr(
    feature = "tracing",
    instrument(skip(source), fields(source_len = source.len(), algorithm = ?algorithm))
)]
pub fn extract<S: ByteSource + ?Sized>(
    source: &S,
    policy: &BoundaryPolicy,
    algorithm: StrongHash,
) -> Result<ChunkSet, ExtractError> {
    let source_len = source.len();
    let boundaries = policy.boundaries(source_len)?;
    let chunk_count = boundaries.len().saturating_sub(1);
    check_chunk_count(chunk_count)?;

    let mut chunks = Vec::with_capacity(chunk_count);
    let mut buffer = Vec::new();
    let mut rolling = RollingChecksum::new();

    for (id, bounds) in boundaries.windows(2).enumerate() {
        let (offset, end) = (bounds[0], bounds[1]);
        let length = chunk_length(offset, end)?;

        buffer.resize(length, 0);
        source.read_at(offset, &mut buffer[..])?;

        rolling.update_from_block(&buffer);
        let strong = algorithm.compute(&buffer);
        chunks.push(Chunk::new(
            id as ChunkId,
            offset,
            length,
            rolling.value(),
            strong,
        ));
    }

    Ok(ChunkSet::new(
        chunks,
        policy.clone(),
        algorithm,
        source_len,
    ))
}

/// Extracts a [`ChunkSet`] from an in-memory reference using parallel checksum computation.
///
/// Produces output identical to [`extract`] but computes per-chunk checksums
/// concurrently with rayon. Worthwhile when the reference has many chunks
/// and the strong digest is CPU-bound; for small references the scheduling
/// overhead dominates, so prefer [`extract_auto`] unless the input size is
/// known in advance.
///
/// # Errors
///
/// Returns [`ExtractError::InvalidPolicy`] when the boundary policy is
/// malformed for this reference.
#[cfg_attr(
    feature = "tracing",
    instrument(skip(bytes), fields(source_len = bytes.len(), algorithm = ?algorithm))
)]
pub fn extract_parallel(
    bytes: &[u8],
    policy: &BoundaryPolicy,
    algorithm: StrongHash,
) -> Result<ChunkSet, ExtractError> {
    let source_len = bytes.len() as u64;
    let boundaries = policy.boundaries(source_len)?;
    check_chunk_count(boundaries.len().saturating_sub(1))?;

    let chunks: Vec<Chunk> = boundaries
        .par_windows(2)
        .enumerate()
        .map(|(id, bounds)| {
            let (offset, end) = (bounds[0] as usize, bounds[1] as usize);
            let data = &bytes[offset..end];
            let mut rolling = RollingChecksum::new();
            rolling.update(data);
            Chunk::new(
                id as ChunkId,
                offset as u64,
                data.len(),
                rolling.value(),
                algorithm.compute(data),
            )
        })
        .collect();

    Ok(ChunkSet::new(
        chunks,
        policy.clone(),
        algorithm,
        source_len,
    ))
}

/// Minimum reference size (in bytes) where parallel extraction is beneficial.
///
/// Below this threshold the sequential path avoids rayon's work-stealing
/// overhead; above it, strong-digest computation dominates and parallelism
/// pays for itself.
pub const PARALLEL_THRESHOLD_BYTES: u64 = 256 * 1024;

/// Extracts a chunk set, automatically choosing the parallel or sequential path.
///
/// # Errors
///
/// See [`extract`].
pub fn extract_auto(
    bytes: &[u8],
    policy: &BoundaryPolicy,
    algorithm: StrongHash,
) -> Result<ChunkSet, ExtractError> {
    if bytes.len() as u64 >= PARALLEL_THRESHOLD_BYTES {
        extract_parallel(bytes, policy, algorithm)
    } else {
        extract(bytes, policy, algorithm)
    }
}

fn chunk_length(offset: u64, end: u64) -> Result<usize, ExtractError> {
    let length = end - offset;
    usize::try_from(length).map_err(|_| ExtractError::ChunkTooLarge { offset, length })
}

fn check_chunk_count(count: usize) -> Result<(), ExtractError> {
    if u64::try_from(count).ok().and_then(|c| ChunkId::try_from(c).ok()).is_none() {
        return Err(ExtractError::TooManyChunks(count as u64));
    }
    Ok(())
}
