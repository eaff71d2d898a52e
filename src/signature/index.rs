// In-memory signature index: weak sum -> candidate baseline blocks.
//
// Parses a signature stream once and is read-only afterwards. Strong sums
// are stored in one flat buffer with a fixed stride; the map keeps block
// indices per weak sum in baseline order, so a collision chain is walked
// in insertion order during matching.

use std::collections::HashMap;
use std::io::Read;

use log::debug;

use crate::error::{Error, Phase, Result, StreamRole};
use crate::hash::WEAK_SUM_LEN;
use crate::signature::header::SignatureHeader;

/// Parsed, immutable signature lookup structure.
#[derive(Debug, Clone)]
pub struct SignatureIndex {
    header: SignatureHeader,
    /// Truncated strong sums, `strong_len` bytes per block, in block order.
    strong_sums: Vec<u8>,
    /// Weak sum -> block indices sharing it, in baseline block order.
    by_weak: HashMap<u32, Vec<u32>>,
    blocks: u32,
}

impl SignatureIndex {
    /// Parse a signature stream into an index.
    ///
    /// Fails with `MalformedSignature` on a bad or truncated header and on
    /// a trailing partial record; `UnsupportedAlgorithm` on identifiers
    /// this build cannot serve.
    pub fn parse<R: Read>(signature: &mut R) -> Result<Self> {
        let header = SignatureHeader::decode(signature)?;
        let strong_len = header.strong_len as usize;

        let mut strong_sums = Vec::new();
        let mut by_weak: HashMap<u32, Vec<u32>> = HashMap::new();
        let mut blocks: u32 = 0;

        let mut record = vec![0u8; header.record_len()];
        loop {
            let filled = read_record(signature, &mut record)
                .map_err(|e| Error::io(Phase::Index, StreamRole::Signature, e))?;
            if filled == 0 {
                break;
            }
            if filled != record.len() {
                return Err(Error::MalformedSignature(format!(
                    "partial record: {filled} of {} bytes at block {blocks}",
                    record.len()
                )));
            }

            let weak = u32::from_be_bytes([record[0], record[1], record[2], record[3]]);
            strong_sums.extend_from_slice(&record[WEAK_SUM_LEN..WEAK_SUM_LEN + strong_len]);
            // Append, never overwrite: colliding blocks chain in baseline order.
            by_weak.entry(weak).or_default().push(blocks);

            blocks = blocks.checked_add(1).ok_or_else(|| {
                Error::MalformedSignature("more than u32::MAX block records".into())
            })?;
        }

        debug!(
            "index: {} blocks, {} distinct weak sums, block_size={}",
            blocks,
            by_weak.len(),
            header.block_size
        );

        Ok(Self {
            header,
            strong_sums,
            by_weak,
            blocks,
        })
    }

    /// Header the index was parsed from.
    pub fn header(&self) -> &SignatureHeader {
        &self.header
    }

    /// Baseline split granularity.
    pub fn block_size(&self) -> usize {
        self.header.block_size as usize
    }

    /// Number of indexed blocks.
    pub fn block_count(&self) -> u32 {
        self.blocks
    }

    /// True if the baseline had no blocks (zero-length baseline).
    pub fn is_empty(&self) -> bool {
        self.blocks == 0
    }

    /// Candidate block indices for a weak sum, in baseline block order.
    #[inline]
    pub fn candidates(&self, weak: u32) -> &[u32] {
        self.by_weak.get(&weak).map_or(&[], Vec::as_slice)
    }

    /// Stored truncated strong sum of block `index`.
    #[inline]
    pub fn strong_sum(&self, index: u32) -> &[u8] {
        let stride = self.header.strong_len as usize;
        let start = index as usize * stride;
        &self.strong_sums[start..start + stride]
    }

    /// Baseline byte offset of block `index`.
    #[inline]
    pub fn block_offset(&self, index: u32) -> u64 {
        index as u64 * self.header.block_size as u64
    }
}

/// Fill `buf` from `r`, tolerating short reads; returns bytes placed.
fn read_record<R: Read>(r: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
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
