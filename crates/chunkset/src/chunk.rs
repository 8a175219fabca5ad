//! crates/chunkset/src/chunk.rs
//!
//! Chunk and chunk-set containers.

use checksums::StrongHash;

use crate::policy::BoundaryPolicy;

/// Identifier of a chunk within the [`ChunkSet`] that produced it.
///
/// Ids are the ordinal position of the chunk in extraction order. A
/// coverage map refers back to chunks by id only; it never owns them.
pub type ChunkId = u32;

/// A contiguous, immutable byte range of the reference, identified by its checksums.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Chunk {
    id: ChunkId,
    source_offset: u64,
    length: usize,
    weak: u32,
    strong: Vec<u8>,
}

impl Chunk {
    pub(crate) const fn new(
        id: ChunkId,
        source_offset: u64,
        length: usize,
        weak: u32,
        strong: Vec<u8>,
    ) -> Self {
        Self {
            id,
            source_offset,
            length,
            weak,
            strong,
        }
    }

    /// Returns the ordinal id of the chunk within its set.
    #[inline]
    #[must_use]
    pub const fn id(&self) -> ChunkId {
        self.id
    }

    /// Returns the byte offset of the chunk in the reference.
    #[inline]
    #[must_use]
    pub const fn source_offset(&self) -> u64 {
        self.source_offset
    }

    /// Returns the chunk length in bytes.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Reports whether the chunk covers an empty range.
    ///
    /// Extraction never produces empty chunks; this exists for API symmetry.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns the weak rolling-checksum value of the chunk bytes.
    #[inline]
    #[must_use]
    pub const fn weak(&self) -> u32 {
        self.weak
    }

    /// Returns the strong digest of the chunk bytes.
    #[inline]
    #[must_use]
    pub fn strong(&self) -> &[u8] {
        &self.strong
    }
}

/// Ordered, gapless, non-overlapping chunks extracted from one reference.
///
/// A chunk set is immutable once built and may be shared read-only across
/// any number of concurrent scans; derived lookup structures are rebuilt
/// from it rather than mutated chunk-by-chunk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ChunkSet {
    chunks: Vec<Chunk>,
    policy: BoundaryPolicy,
    algorithm: StrongHash,
    source_len: u64,
    distinct_lengths: Vec<usize>,
}

impl ChunkSet {
    pub(crate) fn new(
        chunks: Vec<Chunk>,
        policy: BoundaryPolicy,
        algorithm: StrongHash,
        source_len: u64,
    ) -> Self {
        let mut distinct_lengths: Vec<usize> = chunks.iter().map(Chunk::len).collect();
        distinct_lengths.sort_unstable();
        distinct_lengths.dedup();
        Self {
            chunks,
            policy,
            algorithm,
            source_len,
            distinct_lengths,
        }
    }

    /// Returns the chunks in extraction order.
    #[inline]
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Returns the chunk with the given id, if present.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ChunkId) -> Option<&Chunk> {
        self.chunks.get(id as usize)
    }

    /// Returns the number of chunks in the set.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Reports whether the set contains no chunks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Returns the boundary policy that produced this set.
    #[inline]
    #[must_use]
    pub const fn policy(&self) -> &BoundaryPolicy {
        &self.policy
    }

    /// Returns the strong-hash algorithm used for every chunk in the set.
    #[inline]
    #[must_use]
    pub const fn algorithm(&self) -> StrongHash {
        self.algorithm
    }

    /// Returns the length in bytes of the reference the set was extracted from.
    #[inline]
    #[must_use]
    pub const fn source_len(&self) -> u64 {
        self.source_len
    }

    /// Returns the distinct chunk lengths present in the set, ascending.
    ///
    /// A scan runs one rolling pass per entry, so this is usually one or two
    /// values (a uniform grid plus a shorter final chunk).
    #[inline]
    #[must_use]
    pub fn distinct_lengths(&self) -> &[usize] {
        &self.distinct_lengths
    }

    /// Returns the largest chunk length in the set, or zero for an empty set.
    #[inline]
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.distinct_lengths.last().copied().unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: ChunkId, offset: u64, length: usize) -> Chunk {
        Chunk::new(id, offset, length, 0xdead_beef, vec![id as u8; 4])
    }

    #[test]
    fn accessors_expose_fields() {
        let c = chunk(3, 128, 64);
        assert_eq!(c.id(), 3);
        assert_eq!(c.source_offset(), 128);
        assert_eq!(c.len(), 64);
        assert!(!c.is_empty());
        assert_eq!(c.weak(), 0xdead_beef);
        assert_eq!(c.strong(), &[3, 3, 3, 3]);
    }

    #[test]
    fn distinct_lengths_are_sorted_and_deduplicated() {
        let set = ChunkSet::new(
            vec![chunk(0, 0, 8), chunk(1, 8, 8), chunk(2, 16, 3)],
            BoundaryPolicy::fixed_size(8),
            StrongHash::Sha256,
            19,
        );
        assert_eq!(set.distinct_lengths(), &[3, 8]);
        assert_eq!(set.max_length(), 8);
    }

    #[test]
    fn get_resolves_ids_in_order() {
        let set = ChunkSet::new(
            vec![chunk(0, 0, 4), chunk(1, 4, 4)],
            BoundaryPolicy::fixed_size(4),
            StrongHash::Sha256,
            8,
        );
        assert_eq!(set.get(1).map(Chunk::source_offset), Some(4));
        assert!(set.get(2).is_none());
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn empty_set_has_zero_max_length() {
        let set = ChunkSet::new(
            Vec::new(),
            BoundaryPolicy::fixed_size(4),
            StrongHash::Sha256,
            0,
        );
        assert!(set.is_empty());
        assert_eq!(set.max_length(), 0);
        assert!(set.distinct_lengths().is_empty());
    }
}
