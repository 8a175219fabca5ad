//! crates/checksums/src/strong.rs
//!
//! Strong checksum strategies used to confirm weak-checksum hits.
//!
//! The strong checksum is only ever computed for a window whose rolling
//! checksum already matched a candidate chunk, so the per-call cost matters
//! far less than collision resistance. SHA-256 is the default; MD5 and
//! XXH3/128 are available for callers that prefer speed over cryptographic
//! margins on trusted inputs.

use digest::Digest;

/// Strong checksum algorithms supported by chunk extraction and matching.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StrongHash {
    /// SHA-256, the default. Collisions are treated as never occurring.
    Sha256,
    /// MD5, faster but without cryptographic collision margins.
    Md5,
    /// XXH3/128 with an explicit seed, for trusted inputs where throughput dominates.
    Xxh3_128 {
        /// Seed applied to the XXH3/128 instance.
        seed: u64,
    },
}

impl StrongHash {
    /// Returns the digest width produced by the algorithm in bytes.
    #[inline]
    #[must_use]
    pub const fn digest_len(self) -> usize {
        match self {
            StrongHash::Sha256 => 32,
            StrongHash::Md5 | StrongHash::Xxh3_128 { .. } => 16,
        }
    }

    /// Computes the strong digest of `data` in one shot.
    #[must_use]
    pub fn compute(self, data: &[u8]) -> Vec<u8> {
        let mut hasher = self.hasher();
        hasher.update(data);
        hasher.finalize()
    }

    /// Creates a streaming hasher for this algorithm.
    ///
    /// Used when the window bytes are not contiguous in memory, e.g. the two
    /// halves of a ring buffer.
    #[must_use]
    pub fn hasher(self) -> StrongHasher {
        match self {
            StrongHash::Sha256 => StrongHasher::Sha256(sha2::Sha256::new()),
            StrongHash::Md5 => StrongHasher::Md5(md5::Md5::new()),
            StrongHash::Xxh3_128 { seed } => {
                StrongHasher::Xxh3_128(xxhash_rust::xxh3::Xxh3::with_seed(seed))
            }
        }
    }
}

impl Default for StrongHash {
    fn default() -> Self {
        StrongHash::Sha256
    }
}

/// Streaming state for a [`StrongHash`] computation.
#[derive(Clone)]
pub enum StrongHasher {
    /// SHA-256 state.
    Sha256(sha2::Sha256),
    /// MD5 state.
    Md5(md5::Md5),
    /// XXH3/128 state.
    Xxh3_128(xxhash_rust::xxh3::Xxh3),
}

impl StrongHasher {
    /// Feeds additional bytes into the hasher.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        match self {
            StrongHasher::Sha256(inner) => Digest::update(inner, data),
            StrongHasher::Md5(inner) => Digest::update(inner, data),
            StrongHasher::Xxh3_128(inner) => inner.update(data),
        }
    }

    /// Consumes the hasher and returns the digest bytes.
    #[must_use]
    pub fn finalize(self) -> Vec<u8> {
        match self {
            StrongHasher::Sha256(inner) => inner.finalize().to_vec(),
            StrongHasher::Md5(inner) => inner.finalize().to_vec(),
            StrongHasher::Xxh3_128(inner) => inner.digest128().to_be_bytes().to_vec(),
        }
    }
}
