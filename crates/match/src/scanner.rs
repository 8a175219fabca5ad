//! crates/match/src/scanner.rs
//!
//! Rolling-checksum scan of a target byte stream.

use std::collections::VecDeque;
use std::io;

use thiserror::Error;

use checksums::{RollingChecksum, RollingError};
use chunkset::{ByteSource, ChunkId};

use crate::index::ChunkIndex;

/// Buffer length for forward reads from the target byte source.
const READ_BUFFER_LEN: usize = 128 * 1024;

/// A confirmed whole-chunk occurrence in the target.
///
/// `length` always equals the matched chunk's length; partial-chunk matches
/// are never emitted. The match refers back to the chunk set by id only.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub struct Match {
    /// Id of the matched chunk in the set the scan's index was built from.
    pub chunk_id: ChunkId,
    /// Byte offset in the target where the chunk occurs.
    pub target_offset: u64,
    /// Length of the matched chunk in bytes.
    pub length: usize,
}

impl Match {
    /// Returns the exclusive end offset of the match in the target.
    #[inline]
    #[must_use]
    pub const fn end(&self) -> u64 {
        self.target_offset + self.length as u64
    }
}

/// Errors surfaced while scanning a target.
///
/// Weak-checksum collisions and failed strong verifications are not errors;
/// they are filtered silently and scanning continues.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Underlying I/O failure raised while reading target bytes.
    ///
    /// Matches already yielded before the failure remain the valid and
    /// complete result up to the failure point.
    #[error("failed to read target bytes during scan: {0}")]
    Io(
        #[from]
        #[source]
        io::Error,
    ),
    /// The rolling checksum state was driven into an invalid configuration.
    #[error("rolling checksum failed during scan: {0}")]
    Rolling(
        #[from]
        #[source]
        RollingError,
    ),
}

/// Creates a lazy scan of `target` against `index`.
///
/// Equivalent to [`RollingScanner::new`]; see the type documentation for the
/// algorithm and ordering guarantees.
pub fn scan<'a, S: ByteSource + ?Sized>(
    target: &'a S,
    index: &'a ChunkIndex<'a>,
) -> RollingScanner<'a, S> {
    RollingScanner::new(target, index)
}

/// Lazy iterator over confirmed chunk matches in a target byte stream.
///
/// One logically independent rolling pass runs per distinct chunk length in
/// the index, interleaved in a single forward traversal: the iterator always
/// yields the earliest pending match across all passes, so matches arrive in
/// nondecreasing `target_offset` order (longest first among equal offsets).
///
/// Per pass, the scan window advances one byte at a time with an O(1)
/// rolling update, probing the index at every position. A weak hit is
/// verified with the strong checksum; on confirmation the pass emits the
/// match and skips past the consumed region, recomputing its rolling state
/// from scratch (the checksum cannot roll across a skip). Matched regions
/// are assumed accounted for, so nothing inside them is rescanned by that
/// pass; overlapping candidates across different lengths are deferred to
/// the assembler.
///
/// The iterator is finite and fused: after yielding an error it yields
/// nothing further, and a fresh scan can be restarted from scratch.
pub struct RollingScanner<'a, S: ByteSource + ?Sized> {
    target: &'a S,
    index: &'a ChunkIndex<'a>,
    passes: Vec<LengthPass>,
    pending: Vec<Option<Match>>,
    deferred_error: Option<ScanError>,
    started: bool,
    failed: bool,
}

impl<'a, S: ByteSource + ?Sized> RollingScanner<'a, S> {
    /// Creates a scanner; no target bytes are read until the first item is
    /// requested.
    #[must_use]
    pub fn new(target: &'a S, index: &'a ChunkIndex<'a>) -> Self {
        let passes: Vec<LengthPass> = index
            .distinct_lengths()
            .iter()
            .filter(|&&length| length > 0)
            .map(|&length| LengthPass::new(length))
            .collect();
        let pending = vec![None; passes.len()];
        Self {
            target,
            index,
            passes,
            pending,
            deferred_error: None,
            started: false,
            failed: false,
        }
    }

    fn start(&mut self) -> Result<(), ScanError> {
        for (pass, slot) in self.passes.iter_mut().zip(self.pending.iter_mut()) {
            *slot = pass.advance(self.target, self.index)?;
        }
        Ok(())
    }

    /// Index of the pending match that must be emitted next: smallest target
    /// offset, longest length among equal offsets.
    fn earliest_pending(&self) -> Option<usize> {
        let mut best: Option<(usize, (u64, core::cmp::Reverse<usize>))> = None;
        for (slot_index, slot) in self.pending.iter().enumerate() {
            if let Some(m) = slot {
                let key = (m.target_offset, core::cmp::Reverse(m.length));
                if best.is_none_or(|(_, best_key)| key < best_key) {
                    best = Some((slot_index, key));
                }
            }
        }
        best.map(|(slot_index, _)| slot_index)
    }
}

impl<S: ByteSource + ?Sized> Iterator for RollingScanner<'_, S> {
    type Item = Result<Match, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return self.deferred_error.take().map(Err);
        }

        if !self.started {
            self.started = true;
            if let Err(error) = self.start() {
                self.failed = true;
                return Some(Err(error));
            }
        }

        let slot_index = self.earliest_pending()?;
        let emitted = self.pending[slot_index].take()?;

        match self.passes[slot_index].advance(self.target, self.index) {
            Ok(next) => self.pending[slot_index] = next,
            Err(error) => {
                // Emit the already-confirmed match first; the error follows
                // on the next call and then the iterator fuses.
                self.failed = true;
                self.deferred_error = Some(error);
            }
        }

        Some(Ok(emitted))
    }
}

/// Rolling state for one distinct chunk length.
struct LengthPass {
    length: usize,
    /// Target offset of the current window start.
    offset: u64,
    window: VecDeque<u8>,
    rolling: RollingChecksum,
    reader: ForwardReader,
    scratch: Vec<u8>,
    /// Reseed failure held back so an already-confirmed match is not lost.
    pending_error: Option<io::Error>,
    seeded: bool,
    done: bool,
}

impl LengthPass {
    fn new(length: usize) -> Self {
        Self {
            length,
            offset: 0,
            window: VecDeque::with_capacity(length),
            rolling: RollingChecksum::new(),
            reader: ForwardReader::new(),
            scratch: Vec::new(),
            pending_error: None,
            seeded: false,
            done: false,
        }
    }

    /// Advances the pass to its next confirmed match, or to the end of the
    /// target.
    fn advance<S: ByteSource + ?Sized>(
        &mut self,
        target: &S,
        index: &ChunkIndex<'_>,
    ) -> Result<Option<Match>, ScanError> {
        if let Some(error) = self.pending_error.take() {
            return Err(error.into());
        }

        if !self.seeded {
            self.seeded = true;
            self.reseed_at(target, 0)?;
        }

        while !self.done {
            let weak = self.rolling.value();
            let (front, back) = self.window.as_slices();
            if let Some(chunk_id) = index.find_match(weak, self.length, (front, back)) {
                let confirmed = Match {
                    chunk_id,
                    target_offset: self.offset,
                    length: self.length,
                };
                // Skip past the consumed region; the rolling state cannot
                // roll across a skip, so it is recomputed from scratch.
                if let Err(error) = self.reseed_at(target, confirmed.end()) {
                    self.done = true;
                    self.pending_error = Some(error);
                }
                return Ok(Some(confirmed));
            }

            match self.reader.next_byte(target)? {
                Some(incoming) => {
                    let Some(outgoing) = self.window.pop_front() else {
                        self.done = true;
                        break;
                    };
                    self.rolling.roll(outgoing, incoming)?;
                    self.window.push_back(incoming);
                    self.offset += 1;
                }
                None => {
                    // Fewer than `length` bytes remain: this pass is finished.
                    self.done = true;
                }
            }
        }

        Ok(None)
    }

    /// Positions the window at `offset` and recomputes the rolling checksum
    /// from scratch, marking the pass done when fewer than `length` bytes
    /// remain.
    fn reseed_at<S: ByteSource + ?Sized>(&mut self, target: &S, offset: u64) -> io::Result<()> {
        self.window.clear();
        self.rolling.reset();

        let remaining = target.len().saturating_sub(offset);
        if remaining < self.length as u64 {
            self.done = true;
            return Ok(());
        }

        self.scratch.resize(self.length, 0);
        target.read_at(offset, &mut self.scratch)?;
        self.rolling.update(&self.scratch);
        self.window.extend(self.scratch.iter().copied());
        self.offset = offset;
        self.reader.seek(offset + self.length as u64);
        Ok(())
    }
}

/// Buffered forward reads over a random-access byte source.
struct ForwardReader {
    buf: Vec<u8>,
    buf_offset: u64,
    pos: u64,
}

impl ForwardReader {
    fn new() -> Self {
        Self {
            buf: Vec::new(),
            buf_offset: 0,
            pos: 0,
        }
    }

    /// Repositions the reader; any buffered bytes stay valid for reuse.
    fn seek(&mut self, pos: u64) {
        self.pos = pos;
    }

    fn next_byte<S: ByteSource + ?Sized>(&mut self, source: &S) -> io::Result<Option<u8>> {
        let total = source.len();
        if self.pos >= total {
            return Ok(None);
        }

        let buffered = self.buf_offset..self.buf_offset + self.buf.len() as u64;
        if !buffered.contains(&self.pos) {
            let want = READ_BUFFER_LEN.min((total - self.pos) as usize);
            self.buf.resize(want, 0);
            source.read_at(self.pos, &mut self.buf)?;
            self.buf_offset = self.pos;
        }

        let byte = self.buf[(self.pos - self.buf_offset) as usize];
        self.pos += 1;
        Ok(Some(byte))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use checksums::StrongHash;
    use chunkset::{BoundaryPolicy, ChunkSet, extract};

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i.wrapping_mul(37) % 251) as u8).collect()
    }

    fn chunk_set(data: &[u8], len: u64) -> ChunkSet {
        extract(data, &BoundaryPolicy::fixed_size(len), StrongHash::Sha256)
            .expect("extraction succeeds")
    }

    fn collect_matches(target: &[u8], index: &ChunkIndex<'_>) -> Vec<Match> {
        scan(target, index)
            .collect::<Result<Vec<_>, _>>()
            .expect("in-memory scan cannot fail")
    }

    #[test]
    fn scanning_the_reference_finds_every_chunk_in_place() {
        let data = sample(1000);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        let matches = collect_matches(&data, &index);
        assert_eq!(matches.len(), set.len());
        for (chunk, m) in set.chunks().iter().zip(&matches) {
            assert_eq!(m.chunk_id, chunk.id());
            assert_eq!(m.target_offset, chunk.source_offset());
            assert_eq!(m.length, chunk.len());
        }
    }

    #[test]
    fn matches_are_found_at_shifted_offsets() {
        let data = sample(300);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        // Insert 7 bytes of noise in front: every chunk shifts by 7.
        let mut target = vec![0xAA; 7];
        target.extend_from_slice(&data);

        let matches = collect_matches(&target, &index);
        assert_eq!(matches.len(), 3);
        for (chunk, m) in set.chunks().iter().zip(&matches) {
            assert_eq!(m.chunk_id, chunk.id());
            assert_eq!(m.target_offset, chunk.source_offset() + 7);
        }
    }

    #[test]
    fn unrelated_target_produces_no_matches() {
        let data = sample(400);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        let target: Vec<u8> = data.iter().map(|b| b.wrapping_add(1)).collect();
        assert!(collect_matches(&target, &index).is_empty());
    }

    #[test]
    fn short_target_yields_nothing() {
        let data = sample(200);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        // 99 bytes cannot hold a 100-byte chunk.
        assert!(collect_matches(&data[..99], &index).is_empty());
    }

    #[test]
    fn empty_target_yields_empty_match_sequence() {
        let data = sample(200);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        assert!(collect_matches(&[], &index).is_empty());
    }

    #[test]
    fn matches_arrive_in_nondecreasing_offset_order() {
        // Two distinct lengths: 100-byte grid chunks plus a 57-byte tail.
        let data = sample(457);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);
        assert_eq!(index.distinct_lengths(), &[57, 100]);

        let matches = collect_matches(&data, &index);
        assert!(!matches.is_empty());
        for pair in matches.windows(2) {
            assert!(pair[0].target_offset <= pair[1].target_offset);
        }
        // Full self-coverage across both lengths.
        assert_eq!(matches.len(), set.len());
    }

    #[test]
    fn duplicate_content_yields_exactly_one_match_per_occurrence() {
        let block = sample(100);
        let mut reference = block.clone();
        reference.extend_from_slice(&block);
        let set = chunk_set(&reference, 100);
        let index = ChunkIndex::new(&set);

        // Target holds a single occurrence of the duplicated content.
        let matches = collect_matches(&block, &index);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].target_offset, 0);
        // Either duplicate id is acceptable; extraction order makes it the first.
        assert_eq!(matches[0].chunk_id, 0);
    }

    /// Byte source that fails once reads move past a cutoff offset.
    struct FailingSource {
        data: Vec<u8>,
        fail_after: u64,
    }

    impl ByteSource for FailingSource {
        fn len(&self) -> u64 {
            self.data.len() as u64
        }

        fn read_at(&self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
            if offset + buf.len() as u64 > self.fail_after {
                return Err(io::Error::other("backing store went away"));
            }
            self.data.as_slice().read_at(offset, buf)
        }
    }

    #[test]
    fn io_failure_surfaces_after_matches_already_found() {
        let data = sample(400);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        let target = FailingSource {
            data: data.clone(),
            fail_after: 250,
        };

        let mut matches = Vec::new();
        let mut saw_error = false;
        for item in scan(&target, &index) {
            match item {
                Ok(m) => matches.push(m),
                Err(error) => {
                    assert!(matches!(error, ScanError::Io(_)));
                    saw_error = true;
                }
            }
        }

        assert!(saw_error);
        // Matches yielded before the failure are valid up to that point.
        for m in &matches {
            assert!(m.end() <= 250);
        }
    }

    #[test]
    fn scanner_is_fused_after_an_error() {
        let data = sample(300);
        let set = chunk_set(&data, 100);
        let index = ChunkIndex::new(&set);

        let target = FailingSource {
            data,
            fail_after: 0,
        };

        let mut scanner = scan(&target, &index);
        assert!(matches!(scanner.next(), Some(Err(ScanError::Io(_)))));
        assert!(scanner.next().is_none());
        assert!(scanner.next().is_none());
    }
}
