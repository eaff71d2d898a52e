// Signature stream header: 12 bytes, rdiff-compatible.
//
// Layout:
//   0..2   magic        b"rs"
//   2      format id    0x01  (signature stream)
//   3      algorithm id 0x36  (rolling weak sum + MD4 strong sum)
//   4..8   block size   u32 BE
//   8..12  strong len   u32 BE
//
// A truncated or wrong-magic header is a malformed signature; a good magic
// with an unknown format/algorithm pair is an unsupported algorithm.

use std::io::{self, Read, Write};

use crate::error::{Error, Phase, Result, StreamRole};
use crate::hash::StrongAlgorithm;

/// Two-byte stream magic shared by signature and delta files.
pub const MAGIC: [u8; 2] = *b"rs";

/// Format identifier for signature streams.
pub const FORMAT_SIGNATURE: u8 = 0x01;

/// Algorithm identifier: rolling weak sum + MD4 strong sum.
pub const ALG_ROLLSUM_MD4: u8 = 0x36;

/// Serialized header width.
pub const HEADER_LEN: usize = 12;

/// Default block size in bytes.
pub const DEFAULT_BLOCK_SIZE: u32 = 2048;

/// Default truncated strong-sum width in bytes.
pub const DEFAULT_STRONG_LEN: u32 = 8;

/// Parsed signature header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignatureHeader {
    /// Baseline split granularity; every block but the last has this size.
    pub block_size: u32,
    /// Stored width of each truncated strong sum.
    pub strong_len: u32,
    /// Strong-hash algorithm selected by the algorithm identifier.
    pub algorithm: StrongAlgorithm,
}

impl Default for SignatureHeader {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            strong_len: DEFAULT_STRONG_LEN,
            algorithm: StrongAlgorithm::Md4,
        }
    }
}

impl SignatureHeader {
    /// Header with explicit parameters, validated.
    pub fn new(block_size: u32, strong_len: u32) -> Result<Self> {
        let header = Self {
            block_size,
            strong_len,
            algorithm: StrongAlgorithm::Md4,
        };
        header.validate()?;
        Ok(header)
    }

    /// Reject parameter combinations the format cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.block_size == 0 {
            return Err(Error::InvalidParameters(
                "block size must be non-zero".into(),
            ));
        }
        let max = self.algorithm.digest_len() as u32;
        if self.strong_len == 0 || self.strong_len > max {
            return Err(Error::InvalidParameters(format!(
                "strong-sum length {} outside 1..={max}",
                self.strong_len
            )));
        }
        Ok(())
    }

    /// Width of one signature record: weak sum + truncated strong sum.
    pub fn record_len(&self) -> usize {
        crate::hash::WEAK_SUM_LEN + self.strong_len as usize
    }

    /// Serialize the 12-byte header.
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        let mut buf = [0u8; HEADER_LEN];
        buf[0..2].copy_from_slice(&MAGIC);
        buf[2] = FORMAT_SIGNATURE;
        buf[3] = match self.algorithm {
            StrongAlgorithm::Md4 => ALG_ROLLSUM_MD4,
        };
        buf[4..8].copy_from_slice(&self.block_size.to_be_bytes());
        buf[8..12].copy_from_slice(&self.strong_len.to_be_bytes());
        w.write_all(&buf)
    }

    /// Parse and validate a header from the front of a signature stream.
    pub fn decode<R: Read>(r: &mut R) -> Result<Self> {
        let mut buf = [0u8; HEADER_LEN];
        let mut filled = 0;
        while filled < HEADER_LEN {
            let n = r
                .read(&mut buf[filled..])
                .map_err(|e| Error::io(Phase::Index, StreamRole::Signature, e))?;
            if n == 0 {
                return Err(Error::MalformedSignature(format!(
                    "header truncated at {filled} of {HEADER_LEN} bytes"
                )));
            }
            filled += n;
        }

        if buf[0..2] != MAGIC {
            return Err(Error::MalformedSignature(format!(
                "bad magic {:#04x} {:#04x}",
                buf[0], buf[1]
            )));
        }
        if buf[2] != FORMAT_SIGNATURE || buf[3] != ALG_ROLLSUM_MD4 {
            return Err(Error::UnsupportedAlgorithm {
                format: buf[2],
                algorithm: buf[3],
            });
        }

        let block_size = u32::from_be_bytes([buf[4], buf[5], buf[6], buf[7]]);
        let strong_len = u32::from_be_bytes([buf[8], buf[9], buf[10], buf[11]]);

        let header = Self {
            block_size,
            strong_len,
            algorithm: StrongAlgorithm::Md4,
        };
        header.validate().map_err(|_| {
            Error::MalformedSignature(format!(
                "header parameters out of range: block size {block_size}, strong len {strong_len}"
            ))
        })?;
        Ok(header)
    }
}
