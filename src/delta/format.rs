// Delta stream wire format.
//
// Header: b"rs", format id 0x02, algorithm id 0x36 (same algorithm byte as
// the signature the delta was computed against). Then instructions until
// end of stream, no terminator record:
//
//   COPY    = 0x01 || baseline offset u64 BE || length u64 BE
//   LITERAL = 0x02 || byte count u64 BE      || raw bytes
//
// The stream is self-describing: replaying it needs only the baseline's
// random-access bytes.

use std::io::{self, Read, Write};

use crate::error::{Error, Phase, Result, StreamRole};
use crate::signature::header::{ALG_ROLLSUM_MD4, MAGIC};

/// Format identifier for delta streams.
pub const FORMAT_DELTA: u8 = 0x02;

/// Serialized delta header width.
pub const DELTA_HEADER_LEN: usize = 4;

/// Instruction opcode: copy a baseline range.
pub const OP_COPY: u8 = 0x01;

/// Instruction opcode: literal bytes follow.
pub const OP_LITERAL: u8 = 0x02;

/// One decoded delta instruction.
///
/// Concatenating the resolved content of all instructions, in order,
/// reproduces the updated file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaInstruction {
    /// Copy `len` bytes from the baseline starting at `offset`.
    Copy { offset: u64, len: u64 },
    /// Embed the bytes verbatim.
    Literal(Vec<u8>),
}

/// Write the 4-byte delta header.
pub fn write_header<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(&[MAGIC[0], MAGIC[1], FORMAT_DELTA, ALG_ROLLSUM_MD4])
}

/// Read and validate the delta header.
pub fn read_header<R: Read>(r: &mut R) -> Result<()> {
    let mut buf = [0u8; DELTA_HEADER_LEN];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::MalformedDelta("header truncated".into())
        } else {
            Error::io(Phase::Apply, StreamRole::Delta, e)
        }
    })?;
    if buf[0..2] != MAGIC || buf[2] != FORMAT_DELTA {
        return Err(Error::MalformedDelta(format!(
            "bad magic {:#04x} {:#04x} {:#04x}",
            buf[0], buf[1], buf[2]
        )));
    }
    if buf[3] != ALG_ROLLSUM_MD4 {
        return Err(Error::UnsupportedAlgorithm {
            format: buf[2],
            algorithm: buf[3],
        });
    }
    Ok(())
}

/// Write a COPY instruction.
pub fn write_copy<W: Write>(w: &mut W, offset: u64, len: u64) -> io::Result<()> {
    let mut buf = [0u8; 17];
    buf[0] = OP_COPY;
    buf[1..9].copy_from_slice(&offset.to_be_bytes());
    buf[9..17].copy_from_slice(&len.to_be_bytes());
    w.write_all(&buf)
}

/// Write a LITERAL instruction with its payload.
pub fn write_literal<W: Write>(w: &mut W, bytes: &[u8]) -> io::Result<()> {
    let mut buf = [0u8; 9];
    buf[0] = OP_LITERAL;
    buf[1..9].copy_from_slice(&(bytes.len() as u64).to_be_bytes());
    w.write_all(&buf)?;
    w.write_all(bytes)
}

/// Read the next instruction, or `None` at clean end of stream.
///
/// A stream ending in the middle of an instruction is malformed.
pub fn read_instruction<R: Read>(r: &mut R) -> Result<Option<DeltaInstruction>> {
    let mut op = [0u8; 1];
    loop {
        match r.read(&mut op) {
            Ok(0) => return Ok(None),
            Ok(_) => break,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::io(Phase::Apply, StreamRole::Delta, e)),
        }
    }

    match op[0] {
        OP_COPY => {
            let offset = read_u64(r)?;
            let len = read_u64(r)?;
            Ok(Some(DeltaInstruction::Copy { offset, len }))
        }
        OP_LITERAL => {
            let len = read_u64(r)?;
            let len = usize::try_from(len)
                .map_err(|_| Error::MalformedDelta(format!("literal length {len} unaddressable")))?;
            let mut bytes = vec![0u8; len];
            r.read_exact(&mut bytes).map_err(|e| {
                if e.kind() == io::ErrorKind::UnexpectedEof {
                    Error::MalformedDelta("literal payload truncated".into())
                } else {
                    Error::io(Phase::Apply, StreamRole::Delta, e)
                }
            })?;
            Ok(Some(DeltaInstruction::Literal(bytes)))
        }
        other => Err(Error::MalformedDelta(format!("unknown opcode {other:#04x}"))),
    }
}

fn read_u64<R: Read>(r: &mut R) -> Result<u64> {
    let mut buf = [0u8; 8];
    r.read_exact(&mut buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            Error::MalformedDelta("instruction truncated".into())
        } else {
            Error::io(Phase::Apply, StreamRole::Delta, e)
        }
    })?;
    Ok(u64::from_be_bytes(buf))
}

/// Decode an entire delta stream into instructions (test/debug helper).
pub fn read_all_instructions<R: Read>(r: &mut R) -> Result<Vec<DeltaInstruction>> {
    read_header(r)?;
    let mut out = Vec::new();
    while let Some(inst) = read_instruction(r)? {
        out.push(inst);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        assert_eq!(buf, [b'r', b's', 0x02, 0x36]);
        read_header(&mut buf.as_slice()).unwrap();
    }

    #[test]
    fn signature_format_byte_is_rejected() {
        let buf = [b'r', b's', 0x01, 0x36];
        let err = read_header(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedDelta(_)), "{err}");
    }

    #[test]
    fn instruction_roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        write_literal(&mut buf, b"X").unwrap();
        write_copy(&mut buf, 0, 4).unwrap();
        write_copy(&mut buf, 4, 4).unwrap();
        write_literal(&mut buf, b"Y").unwrap();

        let insts = read_all_instructions(&mut buf.as_slice()).unwrap();
        assert_eq!(
            insts,
            vec![
                DeltaInstruction::Literal(b"X".to_vec()),
                DeltaInstruction::Copy { offset: 0, len: 4 },
                DeltaInstruction::Copy { offset: 4, len: 4 },
                DeltaInstruction::Literal(b"Y".to_vec()),
            ]
        );
    }

    #[test]
    fn empty_instruction_stream_is_valid() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        let insts = read_all_instructions(&mut buf.as_slice()).unwrap();
        assert!(insts.is_empty());
    }

    #[test]
    fn truncated_copy_is_malformed() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        write_copy(&mut buf, 100, 200).unwrap();
        buf.truncate(buf.len() - 3);
        let err = read_all_instructions(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedDelta(_)), "{err}");
    }

    #[test]
    fn truncated_literal_payload_is_malformed() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        write_literal(&mut buf, b"payload").unwrap();
        buf.truncate(buf.len() - 2);
        let err = read_all_instructions(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedDelta(_)), "{err}");
    }

    #[test]
    fn unknown_opcode_is_malformed() {
        let mut buf = Vec::new();
        write_header(&mut buf).unwrap();
        buf.push(0x7F);
        let err = read_all_instructions(&mut buf.as_slice()).unwrap_err();
        assert!(matches!(err, Error::MalformedDelta(_)), "{err}");
    }
}
