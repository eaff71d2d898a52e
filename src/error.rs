// Typed errors shared by the signature and delta engines.
//
// Every failure aborts the current operation; nothing in the core retries
// or continues after an I/O error. The I/O variant carries the operation
// phase and the role of the stream involved so callers can produce a
// message without inspecting internals.

use std::fmt;
use std::io;

use thiserror::Error;

/// Which engine operation was running when an error was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Computing a signature from a baseline stream.
    Signature,
    /// Parsing a signature stream into an index.
    Index,
    /// Scanning an updated stream into a delta.
    Delta,
    /// Replaying a delta against a baseline.
    Apply,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signature => write!(f, "signature generation"),
            Self::Index => write!(f, "signature indexing"),
            Self::Delta => write!(f, "delta generation"),
            Self::Apply => write!(f, "delta application"),
        }
    }
}

/// Role of the stream an I/O failure occurred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamRole {
    Baseline,
    Updated,
    Signature,
    Delta,
    Output,
}

impl fmt::Display for StreamRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Baseline => write!(f, "baseline"),
            Self::Updated => write!(f, "updated"),
            Self::Signature => write!(f, "signature"),
            Self::Delta => write!(f, "delta"),
            Self::Output => write!(f, "output"),
        }
    }
}

/// Errors produced by the signature/delta core.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed invocation of an engine entry point.
    #[error("invalid parameters: {0}")]
    InvalidParameters(String),

    /// Signature header or record stream failed validation.
    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    /// Signature carries format/algorithm identifiers this build cannot serve.
    #[error("unsupported algorithm: format {format:#04x}, algorithm {algorithm:#04x}")]
    UnsupportedAlgorithm { format: u8, algorithm: u8 },

    /// Delta header or instruction stream failed validation.
    #[error("malformed delta: {0}")]
    MalformedDelta(String),

    /// Underlying read/write failure.
    #[error("I/O failure during {phase} on {role} stream: {source}")]
    Io {
        phase: Phase,
        role: StreamRole,
        source: io::Error,
    },
}

impl Error {
    /// Wrap an `io::Error` with operation context.
    pub fn io(phase: Phase, role: StreamRole, source: io::Error) -> Self {
        Self::Io {
            phase,
            role,
            source,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
