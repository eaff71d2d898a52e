// Delta generation: scan an updated stream against a signature index and
// emit an ordered COPY/LITERAL instruction stream.
//
// The scan holds one window of at most block_size bytes:
//
//   FILLING_WINDOW  accumulate up to block_size bytes
//   SCANNING        per step: weak lookup, strong confirmation; on a match
//                   flush pending literals, emit COPY, discard the window
//                   and refill it wholesale (matched regions are skipped in
//                   one stride); on a miss move the window's oldest byte to
//                   the pending literal buffer, pull one input byte, and
//                   advance the weak sum with an O(1) rotate
//   EOF_FLUSH       input exhausted: remaining window bytes plus pending
//                   literals leave as one final LITERAL
//
// A COPY is only ever emitted after the window's strong sum matched a
// stored block sum; weak-sum agreement alone never authorizes one. Within
// a collision chain the first strong match wins.

use std::collections::VecDeque;
use std::io::{Read, Write};

use log::{debug, trace};

use crate::delta::format;
use crate::error::{Error, Phase, Result, StreamRole};
use crate::hash::{RollingChecksum, StrongHasher};
use crate::signature::SignatureIndex;

/// Counters describing one delta run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeltaStats {
    /// COPY instructions emitted.
    pub copies: u64,
    /// Updated-file bytes covered by COPY instructions.
    pub copy_bytes: u64,
    /// LITERAL instructions emitted.
    pub literals: u64,
    /// Updated-file bytes embedded verbatim.
    pub literal_bytes: u64,
}

impl DeltaStats {
    /// Total updated-file bytes accounted for.
    pub fn updated_len(&self) -> u64 {
        self.copy_bytes + self.literal_bytes
    }
}

/// Scan `updated` against `index`, writing the delta stream to `delta`.
pub fn compute<R: Read, W: Write>(
    index: &SignatureIndex,
    updated: &mut R,
    delta: &mut W,
) -> Result<DeltaStats> {
    // Parsing already pinned the index to the closed algorithm set; this
    // re-checks the hash configuration before any scanning happens.
    index.header().validate()?;

    format::write_header(delta).map_err(|e| Error::io(Phase::Delta, StreamRole::Delta, e))?;

    debug!(
        "delta: scanning against {} blocks, block_size={}",
        index.block_count(),
        index.block_size()
    );

    let mut scanner = Scanner::new(index);
    scanner.fill_window(updated)?;

    while !scanner.window.is_empty() {
        if let Some((offset, len)) = scanner.find_match() {
            scanner.flush_literal(delta)?;
            scanner.emit_copy(delta, offset, len)?;
            scanner.fill_window(updated)?;
            continue;
        }

        match read_byte(updated).map_err(|e| Error::io(Phase::Delta, StreamRole::Updated, e))? {
            Some(incoming) => scanner.slide(incoming),
            None => {
                // EOF_FLUSH: whatever is left becomes one final literal.
                let tail: Vec<u8> = scanner.window.drain(..).collect();
                scanner.literal.extend_from_slice(&tail);
                break;
            }
        }
    }

    scanner.flush_literal(delta)?;

    debug!(
        "delta: {} copies ({} bytes), {} literals ({} bytes)",
        scanner.stats.copies,
        scanner.stats.copy_bytes,
        scanner.stats.literals,
        scanner.stats.literal_bytes
    );
    Ok(scanner.stats)
}

/// Per-run scan state. Owned by a single `compute` call; nothing here
/// outlives or is shared across invocations.
struct Scanner<'a> {
    index: &'a SignatureIndex,
    window: VecDeque<u8>,
    roller: RollingChecksum,
    strong: StrongHasher,
    /// Scratch for the window's truncated strong sum.
    strong_buf: Vec<u8>,
    /// Scratch for wholesale window refills.
    fill_buf: Vec<u8>,
    /// Unmatched bytes not yet emitted.
    literal: Vec<u8>,
    stats: DeltaStats,
}

impl<'a> Scanner<'a> {
    fn new(index: &'a SignatureIndex) -> Self {
        Self {
            index,
            window: VecDeque::with_capacity(index.block_size()),
            roller: RollingChecksum::new(),
            strong: index.header().algorithm.hasher(),
            strong_buf: vec![0u8; index.header().strong_len as usize],
            fill_buf: vec![0u8; index.block_size()],
            literal: Vec::new(),
            stats: DeltaStats::default(),
        }
    }

    /// Discard the window and refill it with up to block_size fresh bytes.
    ///
    /// Also used for the initial fill. A refill shorter than block_size
    /// (including zero) means the input is near or at its end; a short
    /// window still participates in matching, which is how a short final
    /// baseline block gets copied instead of flushed as a literal.
    fn fill_window<R: Read>(&mut self, updated: &mut R) -> Result<()> {
        debug_assert!(self.window.is_empty());

        let mut filled = 0;
        while filled < self.fill_buf.len() {
            match updated.read(&mut self.fill_buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::io(Phase::Delta, StreamRole::Updated, e)),
            }
        }

        self.window.extend(&self.fill_buf[..filled]);
        self.roller.init();
        self.roller.absorb_block(&self.fill_buf[..filled]);
        Ok(())
    }

    /// Weak lookup plus strong confirmation of the current window.
    ///
    /// Returns the matched block's baseline offset and the window length.
    /// The window's strong sum is computed at most once per step, and only
    /// when the weak sum has a non-empty collision chain.
    fn find_match(&mut self) -> Option<(u64, u64)> {
        let candidates = self.index.candidates(self.roller.digest());
        if candidates.is_empty() {
            return None;
        }

        self.strong.reset();
        let (front, back) = self.window.as_slices();
        self.strong.absorb(front);
        self.strong.absorb(back);
        self.strong.finalize_truncated_into(&mut self.strong_buf);

        for &block in candidates {
            if self.index.strong_sum(block) == self.strong_buf.as_slice() {
                return Some((self.index.block_offset(block), self.window.len() as u64));
            }
        }
        None
    }

    /// Miss path: oldest window byte becomes pending literal, `incoming`
    /// enters at the back, weak sum rotates in O(1).
    ///
    /// Only called while the window is non-empty.
    fn slide(&mut self, incoming: u8) {
        debug_assert!(!self.window.is_empty());
        if let Some(outgoing) = self.window.pop_front() {
            self.literal.push(outgoing);
            self.roller.rotate(outgoing, incoming);
        }
        self.window.push_back(incoming);
    }

    fn emit_copy<W: Write>(&mut self, delta: &mut W, offset: u64, len: u64) -> Result<()> {
        trace!("delta: COPY offset={offset} len={len}");
        format::write_copy(delta, offset, len)
            .map_err(|e| Error::io(Phase::Delta, StreamRole::Delta, e))?;
        self.stats.copies += 1;
        self.stats.copy_bytes += len;
        self.window.clear();
        Ok(())
    }

    /// Emit pending literals as one LITERAL instruction; no-op when empty.
    fn flush_literal<W: Write>(&mut self, delta: &mut W) -> Result<()> {
        if self.literal.is_empty() {
            return Ok(());
        }
        trace!("delta: LITERAL len={}", self.literal.len());
        format::write_literal(delta, &self.literal)
            .map_err(|e| Error::io(Phase::Delta, StreamRole::Delta, e))?;
        self.stats.literals += 1;
        self.stats.literal_bytes += self.literal.len() as u64;
        self.literal.clear();
        Ok(())
    }
}

/// Read exactly one byte, or `None` at end of stream.
fn read_byte<R: Read>(r: &mut R) -> std::io::Result<Option<u8>> {
    let mut buf = [0u8; 1];
    loop {
        match r.read(&mut buf) {
            Ok(0) => return Ok(None),
            Ok(_) => return Ok(Some(buf[0])),
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
}
