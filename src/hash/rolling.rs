// Rolling weak checksum over a sliding byte window.
//
// Adler-style pair of 16-bit accumulators with a fixed character offset,
// matching the rdiff/librsync "rollsum":
//   s1 = sum of window bytes            + offset * window_len
//   s2 = sum of successive s1 prefixes  + offset * len*(len+1)/2
//
// Both accumulators wrap modulo 2^16 on purpose; the wraparound is part of
// the wire format. The digest packs s2 in the high 16 bits and s1 in the
// low 16 bits, serialized big-endian.
//
// Two ways to advance the state:
//   - `absorb_block` folds a whole byte sequence in from a clean state
//     (signature generation, one call per block).
//   - `rotate` slides the window forward by exactly one byte in O(1)
//     (delta scanning, one call per input byte).
// Rotating byte-by-byte across a window must produce the identical digest
// as absorbing the final window contents from scratch.

/// Character offset folded into both accumulators.
///
/// Keeps the checksum of all-zero input away from zero. The value 31 is
/// the rdiff/librsync constant and is load-bearing for wire compatibility.
pub const CHAR_OFFSET: u16 = 31;

/// Width of the serialized weak sum in bytes.
pub const WEAK_SUM_LEN: usize = 4;

/// Rolling weak checksum state.
///
/// Owned exclusively by the scan loop that created it; reset per block in
/// signature generation, rolled continuously in delta scanning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RollingChecksum {
    count: usize,
    s1: u16,
    s2: u16,
}

impl RollingChecksum {
    /// Fresh state with zeroed accumulators.
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the accumulators to a clean state.
    pub fn init(&mut self) {
        self.count = 0;
        self.s1 = 0;
        self.s2 = 0;
    }

    /// Number of bytes currently covered by the window.
    pub fn len(&self) -> usize {
        self.count
    }

    /// True if no bytes have been absorbed.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fold an entire byte sequence into the checksum.
    ///
    /// The per-byte loop accumulates raw sums; the offset contribution is
    /// applied in bulk afterwards (`len * offset` into s1, the triangular
    /// term into s2), which is equivalent to adding the offset per byte.
    pub fn absorb_block(&mut self, block: &[u8]) {
        let mut s1 = self.s1 as u64;
        let mut s2 = self.s2 as u64;

        for &b in block {
            s1 += b as u64;
            s2 += s1;
        }

        let len = block.len() as u64;
        s1 += len * CHAR_OFFSET as u64;
        s2 += len * (len + 1) / 2 * CHAR_OFFSET as u64;

        self.count += block.len();
        self.s1 = s1 as u16;
        self.s2 = s2 as u16;
    }

    /// Slide the window forward by one byte in O(1).
    ///
    /// Drops `outgoing` from the front and adds `incoming` at the back;
    /// the window length is unchanged.
    #[inline(always)]
    pub fn rotate(&mut self, outgoing: u8, incoming: u8) {
        self.s1 = self
            .s1
            .wrapping_add(incoming as u16)
            .wrapping_sub(outgoing as u16);
        self.s2 = self.s2.wrapping_add(self.s1).wrapping_sub(
            (self.count as u16).wrapping_mul((outgoing as u16).wrapping_add(CHAR_OFFSET)),
        );
    }

    /// Current 32-bit weak-sum value: `s2` high, `s1` low.
    ///
    /// Big-endian serialization of this value yields the wire byte order
    /// (s2-high, s2-low, s1-high, s1-low).
    #[inline(always)]
    pub fn digest(&self) -> u32 {
        ((self.s2 as u32) << 16) | self.s1 as u32
    }
}

/// One-shot weak sum of a byte sequence.
pub fn weak_sum(block: &[u8]) -> u32 {
    let mut r = RollingChecksum::new();
    r.absorb_block(block);
    r.digest()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_block_digest_is_zero() {
        let mut r = RollingChecksum::new();
        r.absorb_block(b"");
        assert_eq!(r.digest(), 0);
        assert_eq!(r.len(), 0);
    }

    #[test]
    fn all_zero_input_is_nonzero() {
        // The char offset keeps zero-filled windows away from a zero sum.
        assert_ne!(weak_sum(&[0u8; 64]), 0);
    }

    #[test]
    fn absorb_is_length_sensitive() {
        assert_ne!(weak_sum(&[0u8; 8]), weak_sum(&[0u8; 9]));
    }

    #[test]
    fn init_clears_state() {
        let mut r = RollingChecksum::new();
        r.absorb_block(b"some window");
        r.init();
        assert_eq!(r.digest(), 0);
        assert!(r.is_empty());
    }

    #[test]
    fn split_absorb_equals_single_absorb() {
        let data = b"the quick brown fox jumps over the lazy dog";
        let mut split = RollingChecksum::new();
        split.absorb_block(&data[..17]);
        split.absorb_block(&data[17..]);
        assert_eq!(split.digest(), weak_sum(data));
    }

    #[test]
    fn rotate_equals_fresh_absorb() {
        let data = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let window = 8;

        let mut r = RollingChecksum::new();
        r.absorb_block(&data[..window]);

        for i in 0..data.len() - window {
            r.rotate(data[i], data[i + window]);
            let expected = weak_sum(&data[i + 1..i + 1 + window]);
            assert_eq!(r.digest(), expected, "mismatch after rotating past {i}");
        }
    }

    #[test]
    fn rotate_survives_accumulator_wraparound() {
        // High-valued windows push both 16-bit accumulators through wraps.
        let data: Vec<u8> = (0..4096).map(|i| (i * 37 % 251) as u8 | 0x80).collect();
        let window = 512;

        let mut r = RollingChecksum::new();
        r.absorb_block(&data[..window]);

        for i in 0..data.len() - window {
            r.rotate(data[i], data[i + window]);
        }
        let tail = &data[data.len() - window..];
        assert_eq!(r.digest(), weak_sum(tail));
    }

    #[test]
    fn digest_byte_order() {
        // Single byte 0x01: s1 = 1 + 31, s2 = 1 + 31.
        let d = weak_sum(&[0x01]);
        assert_eq!(d.to_be_bytes(), [0x00, 0x20, 0x00, 0x20]);
    }

    #[test]
    fn known_block_is_stable() {
        // Regression pin: digest of "ABCD" must never drift.
        // s1 = 65+66+67+68 + 4*31 = 390; s2 = 65+131+198+266 + 10*31 = 970.
        assert_eq!(weak_sum(b"ABCD"), (970 << 16) | 390);
    }
}
