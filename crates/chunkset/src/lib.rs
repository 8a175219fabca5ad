#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Chunk-set extraction for delta matching.
//!
//! A reference byte sequence is split into an ordered, gapless,
//! non-overlapping sequence of [`Chunk`]s according to a [`BoundaryPolicy`],
//! and both a weak rolling checksum and a strong digest are recorded per
//! chunk. The resulting [`ChunkSet`] is immutable and may be shared
//! read-only across any number of concurrent scans.
//!
//! Boundaries are a parameter rather than a fixed rule: the producer may
//! split on a fixed grid, at container-format boundaries, or at points of
//! known historical divergence, and the matching side never needs to
//! rediscover them.

mod chunk;
mod extract;
mod policy;
mod source;

pub use chunk::{Chunk, ChunkId, ChunkSet};
pub use extract::{
    ExtractError, PARALLEL_THRESHOLD_BYTES, extract, extract_auto, extract_parallel,
};
pub use policy::{BoundaryPolicy, PolicyError};
pub use source::ByteSource;
