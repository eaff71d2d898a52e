// Delta application: mechanical replay of a COPY/LITERAL stream against
// the baseline's random-access bytes.
//
// COPY ranges are bounds-checked against the baseline before any bytes
// move; a range the baseline cannot serve means the delta was computed
// against a different baseline (or corrupted) and is rejected.

use std::io::{Read, Write};

use log::debug;

use crate::delta::format::{self, DeltaInstruction};
use crate::error::{Error, Phase, Result, StreamRole};

/// Replay `delta` against `baseline`, writing the updated file to `out`.
///
/// Returns the number of bytes written.
pub fn apply<R: Read, W: Write>(baseline: &[u8], delta: &mut R, out: &mut W) -> Result<u64> {
    format::read_header(delta)?;

    let mut written: u64 = 0;
    while let Some(inst) = format::read_instruction(delta)? {
        match inst {
            DeltaInstruction::Copy { offset, len } => {
                let range = checked_range(baseline, offset, len)?;
                out.write_all(&baseline[range])
                    .map_err(|e| Error::io(Phase::Apply, StreamRole::Output, e))?;
                written += len;
            }
            DeltaInstruction::Literal(bytes) => {
                out.write_all(&bytes)
                    .map_err(|e| Error::io(Phase::Apply, StreamRole::Output, e))?;
                written += bytes.len() as u64;
            }
        }
    }

    debug!("apply: wrote {written} bytes");
    Ok(written)
}

fn checked_range(baseline: &[u8], offset: u64, len: u64) -> Result<std::ops::Range<usize>> {
    let start = usize::try_from(offset);
    let count = usize::try_from(len);
    match (start, count) {
        (Ok(start), Ok(count)) if start.checked_add(count).is_some_and(|end| end <= baseline.len()) => {
            Ok(start..start + count)
        }
        _ => Err(Error::MalformedDelta(format!(
            "COPY range {offset}+{len} outside baseline of {} bytes",
            baseline.len()
        ))),
    }
}
