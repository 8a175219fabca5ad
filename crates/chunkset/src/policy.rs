//! crates/chunkset/src/policy.rs
//!
//! Boundary policies controlling where chunk splits occur.

use thiserror::Error;

/// Errors raised when a boundary policy is malformed for a given reference.
///
/// A malformed policy is fatal to the extraction call that used it and has
/// no effect on other chunk sets.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum PolicyError {
    /// A fixed-size policy was configured with a chunk length of zero.
    #[error("fixed-size policy requires a non-zero chunk length")]
    ZeroChunkLength,
    /// An explicit offset list was not strictly increasing.
    #[error("explicit offset {offset} at position {index} is not strictly increasing")]
    UnsortedOffset {
        /// Position of the offending entry in the offset list.
        index: usize,
        /// Offset value that broke the ordering.
        offset: u64,
    },
    /// An explicit offset appeared more than once.
    #[error("explicit offset {offset} appears more than once")]
    DuplicateOffset {
        /// Offset value that was duplicated.
        offset: u64,
    },
    /// An explicit offset would create a zero-length chunk or fall outside the reference.
    #[error("explicit offset {offset} lies outside the open interval (0, {source_len})")]
    OffsetOutOfRange {
        /// Offset value that was rejected.
        offset: u64,
        /// Length of the reference the policy was applied to.
        source_len: u64,
    },
}

/// Rule determining where chunk splits occur in a reference.
///
/// The policy is a parameter of extraction, not a property of the matching
/// side: a scanner never needs to know how boundaries were chosen.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum BoundaryPolicy {
    /// Split every `len` bytes, with a possibly-shorter final chunk.
    FixedSize {
        /// Chunk length in bytes; must be non-zero.
        len: u64,
    },
    /// Split exactly at the supplied offsets.
    ///
    /// Offsets must be strictly increasing and strictly inside
    /// `(0, reference length)`; the implicit boundaries at `0` and at the
    /// reference length are always present and must not be repeated here.
    ExplicitOffsets {
        /// Interior breakpoints in ascending order.
        offsets: Vec<u64>,
    },
}

impl BoundaryPolicy {
    /// Convenience constructor for [`BoundaryPolicy::FixedSize`].
    #[must_use]
    pub const fn fixed_size(len: u64) -> Self {
        Self::FixedSize { len }
    }

    /// Convenience constructor for [`BoundaryPolicy::ExplicitOffsets`].
    #[must_use]
    pub const fn explicit_offsets(offsets: Vec<u64>) -> Self {
        Self::ExplicitOffsets { offsets }
    }

    /// Computes the full breakpoint list for a reference of `source_len` bytes.
    ///
    /// The returned list starts at `0`, ends at `source_len`, and is strictly
    /// increasing, so consecutive entries delimit the chunks of a gapless,
    /// non-overlapping cover. An empty reference yields an empty list (and
    /// therefore zero chunks) once the policy itself validates.
    ///
    /// # Errors
    ///
    /// Returns a [`PolicyError`] describing the first violation encountered.
    pub fn boundaries(&self, source_len: u64) -> Result<Vec<u64>, PolicyError> {
        match self {
            Self::FixedSize { len } => {
                if *len == 0 {
                    return Err(PolicyError::ZeroChunkLength);
                }
                if source_len == 0 {
                    return Ok(Vec::new());
                }
                let full_chunks = source_len / len;
                let remainder = source_len % len;
                let count = full_chunks + u64::from(remainder != 0);
                let mut points = Vec::with_capacity(count as usize + 1);
                let mut offset = 0;
                while offset < source_len {
                    points.push(offset);
                    offset = offset.saturating_add(*len);
                }
                points.push(source_len);
                Ok(points)
            }
            Self::ExplicitOffsets { offsets } => {
                if source_len == 0 {
                    return match offsets.first() {
                        None => Ok(Vec::new()),
                        Some(&offset) => Err(PolicyError::OffsetOutOfRange {
                            offset,
                            source_len,
                        }),
                    };
                }
                let mut points = Vec::with_capacity(offsets.len() + 2);
                points.push(0);
                for (index, &offset) in offsets.iter().enumerate() {
                    if offset == 0 || offset >= source_len {
                        return Err(PolicyError::OffsetOutOfRange { offset, source_len });
                    }
                    match points.last() {
                        Some(&previous) if offset == previous => {
                            return Err(PolicyError::DuplicateOffset { offset });
                        }
                        Some(&previous) if offset < previous => {
                            return Err(PolicyError::UnsortedOffset { index, offset });
                        }
                        _ => points.push(offset),
                    }
                }
                points.push(source_len);
                Ok(points)
            }
        }
    }
}
