#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Chunk matching against an arbitrary byte stream.
//!
//! This crate locates byte-exact occurrences of previously extracted chunks
//! inside a target, at arbitrary offsets, in time roughly linear in the
//! target size:
//!
//! - [`ChunkIndex`] maps weak checksum values to candidate chunk ids.
//! - [`RollingScanner`] slides a window per distinct chunk length across the
//!   target, probing the index and confirming candidates with the strong
//!   checksum.
//! - [`assemble`] resolves the raw hit stream into a [`CoverageMap`] of
//!   non-overlapping matches plus the complementary unmatched gaps.
//!
//! The index is a read-only view over a [`chunkset::ChunkSet`]; both may be
//! shared across any number of concurrent scans. [`scan_parallel`] runs
//! partitioned scans over an in-memory target with overlapped partition
//! boundaries so no straddling chunk occurrence is missed.

mod assemble;
mod index;
mod parallel;
mod scanner;

pub use assemble::{CoverageMap, assemble};
pub use index::ChunkIndex;
pub use parallel::{DEFAULT_PARTITION_LEN, scan_parallel, scan_parallel_with_partition_len};
pub use scanner::{Match, RollingScanner, ScanError, scan};
