#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! Checksum primitives for chunk-based delta matching.
//!
//! Two families of checksums are provided:
//!
//! - [`RollingChecksum`] is the weak checksum: cheap to compute, cheap to
//!   slide across a byte stream one position at a time, and deliberately
//!   collision-prone. It filters candidate positions during a scan.
//! - [`StrongHash`] selects the strong checksum: a digest with negligible
//!   collision probability for chunk-sized inputs, computed only to confirm
//!   a weak-checksum hit as a byte-exact match.
//!
//! Weak collisions are expected and must be tolerated by callers; strong
//! collisions are treated as never occurring in practice.

mod rolling;
pub mod strong;

pub use rolling::{RollingChecksum, RollingError};
pub use strong::{StrongHash, StrongHasher};
