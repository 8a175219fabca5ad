//! crates/match/src/assemble.rs
//!
//! Greedy assembly of raw matches into a coverage map.

use std::cmp::Reverse;
use std::ops::Range;

use crate::scanner::Match;

/// Final assignment of target byte ranges to reference chunks.
///
/// Matches are sorted by target offset and pairwise disjoint; together with
/// the recorded gaps they exactly cover `[0, target_len)`. The map holds no
/// backing reference to the chunk set beyond chunk ids.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CoverageMap {
    matches: Vec<Match>,
    gaps: Vec<Range<u64>>,
    target_len: u64,
}

impl CoverageMap {
    /// Returns the accepted matches in ascending target-offset order.
    #[inline]
    #[must_use]
    pub fn matches(&self) -> &[Match] {
        &self.matches
    }

    /// Returns the unmatched `[start, end)` byte ranges, ascending and non-empty.
    #[inline]
    #[must_use]
    pub fn gaps(&self) -> &[Range<u64>] {
        &self.gaps
    }

    /// Returns the length in bytes of the target the map covers.
    #[inline]
    #[must_use]
    pub const fn target_len(&self) -> u64 {
        self.target_len
    }

    /// Returns the total number of target bytes covered by matches.
    #[must_use]
    pub fn matched_len(&self) -> u64 {
        self.matches.iter().map(|m| m.length as u64).sum()
    }

    /// Returns the total number of target bytes left uncovered.
    #[must_use]
    pub fn unmatched_len(&self) -> u64 {
        self.gaps.iter().map(|gap| gap.end - gap.start).sum()
    }

    /// Reports whether the whole target is covered by matches.
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.gaps.is_empty()
    }
}

/// Resolves a raw match stream into a [`CoverageMap`] over a target of
/// `target_len` bytes.
///
/// The stream may contain overlapping hits from multiple scan passes or
/// partitioned workers, in any order. Matches are sorted by
/// `(target_offset, longest first)` and accepted in a single greedy forward
/// pass: a match starting before the end of the last accepted match is
/// discarded, so earlier-starting matches win and, among equal starts,
/// longer matches win. Every byte not covered by an accepted match is
/// recorded as a gap.
///
/// This greedy longest-first policy is deterministic but not a provably
/// optimal covering; it mirrors the assumption that an accepted region is
/// already accounted for and nothing inside it needs reconsidering.
///
/// Feeding an already-disjoint, sorted match sequence through this function
/// returns it unchanged.
#[must_use]
pub fn assemble<I>(matches: I, target_len: u64) -> CoverageMap
where
    I: IntoIterator<Item = Match>,
{
    let mut ordered: Vec<Match> = matches.into_iter().collect();
    ordered.sort_unstable_by_key(|m| (m.target_offset, Reverse(m.length)));

    let mut accepted: Vec<Match> = Vec::with_capacity(ordered.len());
    let mut cursor = 0u64;
    for m in ordered {
        if m.target_offset >= cursor {
            cursor = m.end();
            accepted.push(m);
        }
    }

    let mut gaps = Vec::new();
    let mut previous_end = 0u64;
    for m in &accepted {
        if m.target_offset > previous_end {
            gaps.push(previous_end..m.target_offset);
        }
        previous_end = m.end();
    }
    if previous_end < target_len {
        gaps.push(previous_end..target_len);
    }

    CoverageMap {
        matches: accepted,
        gaps,
        target_len,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(chunk_id: u32, target_offset: u64, length: usize) -> Match {
        Match {
            chunk_id,
            target_offset,
            length,
        }
    }

    #[test]
    fn disjoint_sorted_input_is_returned_unchanged() {
        let input = vec![m(0, 0, 10), m(1, 10, 10), m(2, 25, 5)];
        let map = assemble(input.clone(), 30);
        assert_eq!(map.matches(), input.as_slice());
        assert_eq!(map.gaps(), &[20..25]);
    }

    #[test]
    fn assembly_is_idempotent() {
        let input = vec![m(0, 0, 10), m(1, 10, 10), m(2, 25, 5)];
        let once = assemble(input, 30);
        let twice = assemble(once.matches().to_vec(), 30);
        assert_eq!(once, twice);
    }

    #[test]
    fn overlapping_match_is_discarded() {
        let map = assemble(vec![m(0, 0, 10), m(1, 5, 10)], 20);
        assert_eq!(map.matches(), &[m(0, 0, 10)]);
        assert_eq!(map.gaps(), &[10..20]);
    }

    #[test]
    fn longer_match_wins_among_equal_starts() {
        let map = assemble(vec![m(0, 0, 5), m(1, 0, 10)], 10);
        assert_eq!(map.matches(), &[m(1, 0, 10)]);
        assert!(map.is_complete());
    }

    #[test]
    fn earlier_start_wins_over_longer_later_match() {
        let map = assemble(vec![m(1, 2, 100), m(0, 0, 5)], 102);
        assert_eq!(map.matches(), &[m(0, 0, 5)]);
        assert_eq!(map.gaps(), &[5..102]);
    }

    #[test]
    fn unsorted_input_is_ordered_before_the_greedy_pass() {
        let map = assemble(vec![m(2, 20, 10), m(0, 0, 10), m(1, 10, 10)], 30);
        let offsets: Vec<u64> = map.matches().iter().map(|m| m.target_offset).collect();
        assert_eq!(offsets, vec![0, 10, 20]);
        assert!(map.is_complete());
    }

    #[test]
    fn gaps_cover_the_complement_exactly() {
        let map = assemble(vec![m(0, 5, 10), m(1, 20, 5)], 40);
        assert_eq!(map.gaps(), &[0..5, 15..20, 25..40]);
        assert_eq!(map.matched_len() + map.unmatched_len(), map.target_len());
    }

    #[test]
    fn empty_input_is_one_big_gap() {
        let map = assemble(Vec::new(), 100);
        assert!(map.matches().is_empty());
        assert_eq!(map.gaps(), &[0..100]);
        assert_eq!(map.unmatched_len(), 100);
    }

    #[test]
    fn empty_target_has_no_matches_and_no_gap_bytes() {
        let map = assemble(Vec::new(), 0);
        assert!(map.matches().is_empty());
        assert!(map.gaps().is_empty());
        assert_eq!(map.unmatched_len(), 0);
        assert!(map.is_complete());
    }

    #[test]
    fn matches_and_gaps_partition_the_target() {
        let map = assemble(
            vec![m(0, 0, 8), m(1, 8, 8), m(2, 12, 8), m(3, 30, 8)],
            50,
        );
        // m(2) overlaps m(1) and is discarded.
        let mut covered = 0u64;
        let mut events: Vec<(u64, u64)> = map
            .matches()
            .iter()
            .map(|m| (m.target_offset, m.end()))
            .chain(map.gaps().iter().map(|g| (g.start, g.end)))
            .collect();
        events.sort_unstable();
        for (start, end) in events {
            assert_eq!(start, covered, "no overlap and no hole");
            covered = end;
        }
        assert_eq!(covered, map.target_len());
    }
}
