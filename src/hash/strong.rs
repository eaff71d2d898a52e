// Strong block hashes confirming weak-sum matches.
//
// The weak rolling checksum filters almost all non-matches; the strong sum
// only has to disambiguate within a weak-sum collision chain, which is why
// the signature stores a truncated digest (default 8 of MD4's 16 bytes).
//
// Algorithms form a closed set dispatched on the identifier carried in the
// signature header, so a new hash can be added without touching block or
// delta logic.

use digest::Digest;
use md4::Md4;

/// Maximum truncated digest width usable with [`StrongAlgorithm::Md4`].
pub const MD4_DIGEST_LEN: usize = 16;

/// Strong-hash algorithms this build can serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrongAlgorithm {
    /// MD4, as used by rdiff signature/delta files.
    Md4,
}

impl StrongAlgorithm {
    /// Full digest width in bytes, before truncation.
    pub fn digest_len(self) -> usize {
        match self {
            Self::Md4 => MD4_DIGEST_LEN,
        }
    }

    /// Fresh hasher state for this algorithm.
    pub fn hasher(self) -> StrongHasher {
        match self {
            Self::Md4 => StrongHasher::Md4(Md4::new()),
        }
    }
}

/// Incremental strong-hash state: reset, absorb, finalize.
#[derive(Clone)]
pub enum StrongHasher {
    Md4(Md4),
}

impl StrongHasher {
    /// Reset to a clean state, keeping the algorithm.
    pub fn reset(&mut self) {
        match self {
            Self::Md4(h) => Digest::reset(h),
        }
    }

    /// Fold bytes into the digest. May be called repeatedly per block.
    pub fn absorb(&mut self, bytes: &[u8]) {
        match self {
            Self::Md4(h) => h.update(bytes),
        }
    }

    /// Finalize into `out`, truncating the digest to `out.len()` bytes.
    ///
    /// The state is reset afterwards so the hasher can be reused for the
    /// next block. `out` must not be wider than the full digest.
    pub fn finalize_truncated_into(&mut self, out: &mut [u8]) {
        match self {
            Self::Md4(h) => {
                debug_assert!(out.len() <= MD4_DIGEST_LEN);
                let digest = h.finalize_reset();
                out.copy_from_slice(&digest[..out.len()]);
            }
        }
    }
}

/// One-shot truncated strong sum of a block.
pub fn strong_sum(algorithm: StrongAlgorithm, block: &[u8], len: usize) -> Vec<u8> {
    let mut h = algorithm.hasher();
    h.absorb(block);
    let mut out = vec![0u8; len];
    h.finalize_truncated_into(&mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn md4_known_vector() {
        // RFC 1320 test vector: MD4("abc").
        let sum = strong_sum(StrongAlgorithm::Md4, b"abc", 16);
        assert_eq!(
            sum,
            [
                0xa4, 0x48, 0x01, 0x7a, 0xaf, 0x21, 0xd8, 0x52, 0x5f, 0xc1, 0x0a, 0xe8, 0x7a,
                0xa6, 0x72, 0x9d
            ]
        );
    }

    #[test]
    fn truncation_is_a_prefix() {
        let full = strong_sum(StrongAlgorithm::Md4, b"block data", 16);
        let short = strong_sum(StrongAlgorithm::Md4, b"block data", 8);
        assert_eq!(short, full[..8]);
    }

    #[test]
    fn absorb_is_chunkable() {
        let mut h = StrongAlgorithm::Md4.hasher();
        h.absorb(b"block ");
        h.absorb(b"data");
        let mut chunked = [0u8; 16];
        h.finalize_truncated_into(&mut chunked);
        assert_eq!(chunked.to_vec(), strong_sum(StrongAlgorithm::Md4, b"block data", 16));
    }

    #[test]
    fn finalize_resets_state() {
        let mut h = StrongAlgorithm::Md4.hasher();
        h.absorb(b"first");
        let mut a = [0u8; 16];
        h.finalize_truncated_into(&mut a);

        h.absorb(b"second");
        let mut b = [0u8; 16];
        h.finalize_truncated_into(&mut b);
        assert_eq!(b.to_vec(), strong_sum(StrongAlgorithm::Md4, b"second", 16));
    }

    #[test]
    fn reset_discards_absorbed_bytes() {
        let mut h = StrongAlgorithm::Md4.hasher();
        h.absorb(b"garbage");
        h.reset();
        h.absorb(b"abc");
        let mut out = [0u8; 16];
        h.finalize_truncated_into(&mut out);
        assert_eq!(out.to_vec(), strong_sum(StrongAlgorithm::Md4, b"abc", 16));
    }
}
