// High-level orchestration over pre-opened streams.
//
// The engine never opens or creates files; callers (the CLI, embedders,
// tests) hand in `Read`/`Write` implementations and an index, and get a
// typed result back. In-memory helpers wrap the same paths for callers
// holding byte slices.

use std::io::{Read, Write};

use crate::delta::{self, DeltaStats};
use crate::error::Result;
use crate::signature::{SignatureBuilder, SignatureHeader, SignatureIndex, SignatureStats};

/// Compute a signature of `baseline` into `signature`.
pub fn signature<R: Read, W: Write>(
    baseline: &mut R,
    signature: &mut W,
    header: SignatureHeader,
) -> Result<SignatureStats> {
    SignatureBuilder::new(header).compute(baseline, signature)
}

/// Parse a signature stream and scan `updated` against it into `delta`.
pub fn delta<S: Read, R: Read, W: Write>(
    signature: &mut S,
    updated: &mut R,
    delta: &mut W,
) -> Result<DeltaStats> {
    let index = SignatureIndex::parse(signature)?;
    delta::compute(&index, updated, delta)
}

/// Replay `delta` against `baseline`, writing the updated file to `out`.
pub fn apply<R: Read, W: Write>(baseline: &[u8], delta: &mut R, out: &mut W) -> Result<u64> {
    delta::apply(baseline, delta, out)
}

/// In-memory signature of a byte slice.
pub fn signature_in_memory(baseline: &[u8], header: SignatureHeader) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    signature(&mut &baseline[..], &mut out, header)?;
    Ok(out)
}

/// In-memory delta from a signature and an updated byte slice.
pub fn delta_in_memory(signature_bytes: &[u8], updated: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    delta(&mut &signature_bytes[..], &mut &updated[..], &mut out)?;
    Ok(out)
}

/// In-memory delta application.
pub fn apply_in_memory(baseline: &[u8], delta_bytes: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    apply(baseline, &mut &delta_bytes[..], &mut out)?;
    Ok(out)
}
