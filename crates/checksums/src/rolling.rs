//! crates/checksums/src/rolling.rs
//!
//! Rolling checksum used for weak chunk matching.
//!
//! The checksum maintains two 16-bit components (a plain byte sum and a
//! position-weighted sum) that can be updated in O(1) as a window slides
//! over data by one byte. The window length is simply the number of bytes
//! fed into the state, so the same type serves every chunk length a scan
//! needs without baking a fixed window size into the implementation.

use core::fmt;

/// Errors that can occur while updating the rolling checksum state.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RollingError {
    /// The checksum window is empty, preventing the rolling update from making progress.
    EmptyWindow,
    /// The checksum window length exceeds what can be represented in 32 bits.
    WindowTooLarge {
        /// Number of bytes present in the rolling window when the error was raised.
        len: usize,
    },
}

impl fmt::Display for RollingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyWindow => write!(f, "rolling checksum requires a non-empty window"),
            Self::WindowTooLarge { len } => write!(
                f,
                "rolling checksum window of {len} bytes exceeds 32-bit limit"
            ),
        }
    }
}

impl std::error::Error for RollingError {}

/// Weak rolling checksum over a sliding byte window.
///
/// `s1` accumulates the byte sum and `s2` accumulates prefix sums, both
/// truncated to 16 bits. The packed [`value`](Self::value) is used as the
/// lookup key when probing a chunk index; collisions are expected and are
/// filtered by a strong checksum afterwards.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    s1: u32,
    s2: u32,
    len: usize,
}

impl RollingChecksum {
    /// Creates a new rolling checksum with zeroed state.
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::RollingChecksum;
    ///
    /// let checksum = RollingChecksum::new();
    /// assert!(checksum.is_empty());
    /// assert_eq!(checksum.len(), 0);
    /// ```
    #[must_use]
    pub const fn new() -> Self {
        Self {
            s1: 0,
            s2: 0,
            len: 0,
        }
    }

    /// Resets the checksum back to its initial state.
    pub const fn reset(&mut self) {
        self.s1 = 0;
        self.s2 = 0;
        self.len = 0;
    }

    /// Returns the number of bytes that contributed to the current state.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Returns `true` if no bytes have been observed yet.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Updates the checksum with an additional slice of bytes.
    ///
    /// Splitting the input across multiple calls yields the same state as a
    /// single call over the concatenation.
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::RollingChecksum;
    ///
    /// let mut checksum = RollingChecksum::new();
    /// checksum.update(b"Hello, ");
    /// checksum.update(b"chunk!");
    ///
    /// let mut full = RollingChecksum::new();
    /// full.update(b"Hello, chunk!");
    /// assert_eq!(checksum.value(), full.value());
    /// ```
    #[inline]
    pub fn update(&mut self, chunk: &[u8]) {
        let (s1, s2) = accumulate_chunk(self.s1, self.s2, chunk);
        self.s1 = s1 & 0xffff;
        self.s2 = s2 & 0xffff;
        self.len = self.len.saturating_add(chunk.len());
    }

    /// Clears the state and updates with `block`.
    ///
    /// Convenience for hashing a complete chunk in one call.
    pub fn update_from_block(&mut self, block: &[u8]) {
        self.reset();
        self.update(block);
    }

    /// Rolls the checksum by removing one byte and adding another.
    ///
    /// This enables O(1) sliding window updates during a scan. The window
    /// length remains constant after rolling.
    ///
    /// # Examples
    ///
    /// ```
    /// use checksums::RollingChecksum;
    ///
    /// let data = b"ABCDE";
    ///
    /// let mut rolling = RollingChecksum::new();
    /// rolling.update(&data[0..3]); // "ABC"
    ///
    /// // Slide window: remove 'A', add 'D' -> now covers "BCD"
    /// rolling.roll(data[0], data[3]).unwrap();
    ///
    /// let mut fresh = RollingChecksum::new();
    /// fresh.update(&data[1..4]); // "BCD"
    /// assert_eq!(rolling.value(), fresh.value());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`RollingError::EmptyWindow`] if no bytes have been processed
    /// and [`RollingError::WindowTooLarge`] when the window length cannot be
    /// represented in 32 bits.
    #[inline]
    pub fn roll(&mut self, outgoing: u8, incoming: u8) -> Result<(), RollingError> {
        let window_len = self.window_len_u32()?;

        let out = u32::from(outgoing);
        let inn = u32::from(incoming);

        let new_s1 = self.s1.wrapping_sub(out).wrapping_add(inn) & 0xffff;
        let new_s2 = self
            .s2
            .wrapping_sub(window_len.wrapping_mul(out))
            .wrapping_add(new_s1)
            & 0xffff;

        self.s1 = new_s1;
        self.s2 = new_s2;
        Ok(())
    }

    /// Returns the rolling checksum value packed into 32 bits.
    ///
    /// The format is `(s2 << 16) | s1`. Use this value for index lookups
    /// during a scan.
    #[inline]
    #[must_use]
    pub const fn value(&self) -> u32 {
        (self.s2 << 16) | self.s1
    }

    /// Returns the current window length as a 32-bit value while validating invariants.
    #[inline]
    fn window_len_u32(&self) -> Result<u32, RollingError> {
        if self.len == 0 {
            return Err(RollingError::EmptyWindow);
        }
        u32::try_from(self.len).map_err(|_| RollingError::WindowTooLarge { len: self.len })
    }
}

#[inline]
fn accumulate_chunk(mut s1: u32, mut s2: u32, chunk: &[u8]) -> (u32, u32) {
    let mut iter = chunk.chunks_exact(4);
    for block in &mut iter {
        s1 = s1.wrapping_add(u32::from(block[0]));
        s2 = s2.wrapping_add(s1);

        s1 = s1.wrapping_add(u32::from(block[1]));
        s2 = s2.wrapping_add(s1);

        s1 = s1.wrapping_add(u32::from(block[2]));
        s2 = s2.wrapping_add(s1);

        s1 = s1.wrapping_add(u32::from(block[3]));
        s2 = s2.wrapping_add(s1);
    }

    for &byte in iter.remainder() {
        s1 = s1.wrapping_add(u32::from(byte));
        s2 = s2.wrapping_add(s1);
    }

    (s1, s2)
}
