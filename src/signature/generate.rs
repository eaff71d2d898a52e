// Signature generation: split a baseline stream into blocks and emit one
// weak+strong record per block.
//
// Reads at most `block_size` bytes per block, honoring short reads from
// the underlying stream; a read of zero bytes is clean end of input, a
// partially filled block is the final block. Any read/write failure aborts
// and invalidates whatever output was already written.

use std::io::{Read, Write};

use log::{debug, trace};

use crate::error::{Error, Phase, Result, StreamRole};
use crate::hash::RollingChecksum;
use crate::signature::header::SignatureHeader;

/// Counters describing one signature run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SignatureStats {
    /// Number of block records written.
    pub blocks: u64,
    /// Total baseline bytes consumed.
    pub baseline_len: u64,
}

/// Computes signatures for a fixed header configuration.
#[derive(Debug, Clone)]
pub struct SignatureBuilder {
    header: SignatureHeader,
}

impl SignatureBuilder {
    /// Builder using the given (already validated) header parameters.
    pub fn new(header: SignatureHeader) -> Self {
        Self { header }
    }

    /// The header this builder writes.
    pub fn header(&self) -> &SignatureHeader {
        &self.header
    }

    /// Compute a signature of `baseline`, writing the stream to `signature`.
    pub fn compute<R: Read, W: Write>(
        &self,
        baseline: &mut R,
        signature: &mut W,
    ) -> Result<SignatureStats> {
        self.header.validate()?;
        debug!(
            "signature: block_size={} strong_len={}",
            self.header.block_size, self.header.strong_len
        );

        self.header
            .encode(signature)
            .map_err(|e| Error::io(Phase::Signature, StreamRole::Signature, e))?;

        let block_size = self.header.block_size as usize;
        let strong_len = self.header.strong_len as usize;

        let mut block = vec![0u8; block_size];
        let mut record = vec![0u8; self.header.record_len()];
        let mut roller = RollingChecksum::new();
        let mut strong = self.header.algorithm.hasher();
        let mut stats = SignatureStats::default();

        loop {
            let filled = read_block(baseline, &mut block)
                .map_err(|e| Error::io(Phase::Signature, StreamRole::Baseline, e))?;
            if filled == 0 {
                break;
            }

            roller.init();
            roller.absorb_block(&block[..filled]);
            strong.absorb(&block[..filled]);

            record[..4].copy_from_slice(&roller.digest().to_be_bytes());
            strong.finalize_truncated_into(&mut record[4..4 + strong_len]);

            signature
                .write_all(&record)
                .map_err(|e| Error::io(Phase::Signature, StreamRole::Signature, e))?;

            trace!(
                "signature: block {} len {} weak {:#010x}",
                stats.blocks,
                filled,
                roller.digest()
            );
            stats.blocks += 1;
            stats.baseline_len += filled as u64;

            if filled < block_size {
                // Short block: end of the baseline.
                break;
            }
        }

        debug!(
            "signature: {} blocks over {} baseline bytes",
            stats.blocks, stats.baseline_len
        );
        Ok(stats)
    }
}

/// Fill `buf` from `r`, tolerating short reads.
///
/// Returns the number of bytes placed in `buf`; less than `buf.len()` only
/// at end of stream.
fn read_block<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::rolling::weak_sum;
    use crate::hash::strong::{strong_sum, StrongAlgorithm};
    use crate::signature::header::HEADER_LEN;

    fn signature_of(baseline: &[u8], block_size: u32, strong_len: u32) -> (Vec<u8>, SignatureStats) {
        let builder = SignatureBuilder::new(SignatureHeader::new(block_size, strong_len).unwrap());
        let mut out = Vec::new();
        let stats = builder.compute(&mut &baseline[..], &mut out).unwrap();
        (out, stats)
    }

    #[test]
    fn empty_baseline_is_header_only() {
        let (sig, stats) = signature_of(b"", 2048, 8);
        assert_eq!(sig.len(), HEADER_LEN);
        assert_eq!(stats.blocks, 0);
        assert_eq!(stats.baseline_len, 0);
    }

    #[test]
    fn exact_multiple_has_no_trailing_empty_block() {
        let (sig, stats) = signature_of(&[7u8; 12], 4, 8);
        assert_eq!(stats.blocks, 3);
        assert_eq!(sig.len(), HEADER_LEN + 3 * (4 + 8));
    }

    #[test]
    fn short_final_block_is_recorded() {
        let (sig, stats) = signature_of(&[7u8; 10], 4, 8);
        assert_eq!(stats.blocks, 3);
        assert_eq!(stats.baseline_len, 10);
        assert_eq!(sig.len(), HEADER_LEN + 3 * (4 + 8));
    }

    #[test]
    fn records_carry_per_block_sums() {
        let baseline = b"ABCDEFGH";
        let (sig, _) = signature_of(baseline, 4, 8);

        let rec0 = &sig[HEADER_LEN..HEADER_LEN + 12];
        assert_eq!(&rec0[..4], &weak_sum(b"ABCD").to_be_bytes());
        assert_eq!(&rec0[4..], &strong_sum(StrongAlgorithm::Md4, b"ABCD", 8)[..]);

        let rec1 = &sig[HEADER_LEN + 12..HEADER_LEN + 24];
        assert_eq!(&rec1[..4], &weak_sum(b"EFGH").to_be_bytes());
        assert_eq!(&rec1[4..], &strong_sum(StrongAlgorithm::Md4, b"EFGH", 8)[..]);
    }

    #[test]
    fn signature_is_deterministic() {
        let baseline: Vec<u8> = (0..10_000).map(|i| (i % 253) as u8).collect();
        let (a, _) = signature_of(&baseline, 512, 8);
        let (b, _) = signature_of(&baseline, 512, 8);
        assert_eq!(a, b);
    }

    #[test]
    fn chunky_reader_matches_slice_reader() {
        // A reader that returns one byte at a time must yield the same
        // signature as a plain slice.
        struct OneByte<'a>(&'a [u8]);
        impl Read for OneByte<'_> {
            fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
                if self.0.is_empty() || buf.is_empty() {
                    return Ok(0);
                }
                buf[0] = self.0[0];
                self.0 = &self.0[1..];
                Ok(1)
            }
        }

        let baseline = b"block boundaries should not depend on read sizes";
        let builder = SignatureBuilder::new(SignatureHeader::new(8, 8).unwrap());

        let mut from_slice = Vec::new();
        builder
            .compute(&mut &baseline[..], &mut from_slice)
            .unwrap();

        let mut from_chunky = Vec::new();
        builder
            .compute(&mut OneByte(baseline), &mut from_chunky)
            .unwrap();

        assert_eq!(from_slice, from_chunky);
    }

    #[test]
    fn read_failure_aborts_with_baseline_role() {
        struct Failing;
        impl Read for Failing {
            fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::new(std::io::ErrorKind::Other, "boom"))
            }
        }

        let builder = SignatureBuilder::new(SignatureHeader::default());
        let err = builder.compute(&mut Failing, &mut Vec::new()).unwrap_err();
        match err {
            Error::Io { phase, role, .. } => {
                assert_eq!(phase, Phase::Signature);
                assert_eq!(role, StreamRole::Baseline);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
