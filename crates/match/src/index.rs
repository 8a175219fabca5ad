//! crates/match/src/index.rs
//!
//! Weak-checksum lookup index over a chunk set.

use rustc_hash::FxHashMap;
#[cfg(feature = "tracing")]
use tracing::instrument;

use checksums::StrongHash;
use chunkset::{ChunkId, ChunkSet};

/// Read-only lookup structure mapping weak checksum values to candidate chunks.
///
/// Construction is O(number of chunks). Multiple chunks may share a weak
/// value, either by checksum collision or because the reference contains
/// byte-identical content at several offsets; every one of them is kept as a
/// separate candidate because each corresponds to a distinct source offset.
///
/// The index borrows the [`ChunkSet`] it was built from and is never mutated
/// afterwards, so it can be shared freely across concurrent scans.
#[derive(Clone, Debug)]
pub struct ChunkIndex<'set> {
    set: &'set ChunkSet,
    by_weak: FxHashMap<u32, Vec<ChunkId>>,
}

impl<'set> ChunkIndex<'set> {
    /// Builds an index over `set`.
    #[cfg_attr(
        feature = "tracing",
        instrument(skip(set), fields(chunks = set.len()))
    )]
    #[must_use]
    pub fn new(set: &'set ChunkSet) -> Self {
        let mut by_weak: FxHashMap<u32, Vec<ChunkId>> = FxHashMap::default();
        for chunk in set.chunks() {
            by_weak.entry(chunk.weak()).or_default().push(chunk.id());
        }
        Self { set, by_weak }
    }

    /// Returns the chunk set this index was built from.
    #[inline]
    #[must_use]
    pub const fn chunk_set(&self) -> &'set ChunkSet {
        self.set
    }

    /// Returns the candidate chunk ids sharing the given weak checksum value.
    ///
    /// Candidates appear in extraction order; the list may legitimately hold
    /// several entries and may match chunks of different lengths.
    #[inline]
    #[must_use]
    pub fn candidates(&self, weak: u32) -> &[ChunkId] {
        self.by_weak.get(&weak).map_or(&[], Vec::as_slice)
    }

    /// Returns the distinct chunk lengths present in the underlying set, ascending.
    #[inline]
    #[must_use]
    pub fn distinct_lengths(&self) -> &[usize] {
        self.set.distinct_lengths()
    }

    /// Returns the largest chunk length in the underlying set, or zero when empty.
    #[inline]
    #[must_use]
    pub fn max_length(&self) -> usize {
        self.set.max_length()
    }

    /// Returns the strong-hash algorithm chunks in this index were hashed with.
    #[inline]
    #[must_use]
    pub fn algorithm(&self) -> StrongHash {
        self.set.algorithm()
    }

    /// Reports whether the index holds no chunks at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    /// Confirms a weak-checksum hit against the window bytes.
    ///
    /// The window is supplied as the two halves of a ring buffer. The strong
    /// digest of the window is computed lazily and at most once per call, no
    /// matter how many candidates share the weak value; candidates of a
    /// different length than the current pass are skipped without hashing.
    ///
    /// Returns the first candidate (in extraction order) whose strong digest
    /// matches, or `None` when every candidate fails verification — a failed
    /// verification is not an error, it simply means no match here.
    pub(crate) fn find_match(
        &self,
        weak: u32,
        length: usize,
        window: (&[u8], &[u8]),
    ) -> Option<ChunkId> {
        let candidates = self.candidates(weak);
        if candidates.is_empty() {
            return None;
        }

        debug_assert_eq!(window.0.len() + window.1.len(), length);

        let mut window_strong: Option<Vec<u8>> = None;
        for &id in candidates {
            let chunk = self.set.get(id)?;
            if chunk.len() != length {
                continue;
            }
            let strong = window_strong.get_or_insert_with(|| {
                let mut hasher = self.algorithm().hasher();
                hasher.update(window.0);
                hasher.update(window.1);
                hasher.finalize()
            });
            if chunk.strong() == strong.as_slice() {
                return Some(id);
            }
        }
        None
    }
}
