//! Rudiff: rdiff-style binary diffs from signatures and deltas.
//!
//! The crate provides:
//! - Rolling weak checksums and MD4 strong sums (`hash`)
//! - Signature generation, parsing and indexing (`signature`)
//! - Delta generation and application (`delta`)
//! - Stream-oriented orchestration APIs (`engine`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use rudiff::engine;
//! use rudiff::signature::SignatureHeader;
//!
//! let baseline = b"hello old world";
//! let updated = b"hello new world";
//!
//! let sig = engine::signature_in_memory(baseline, SignatureHeader::new(4, 8)?)?;
//! let delta = engine::delta_in_memory(&sig, updated)?;
//! let reconstructed = engine::apply_in_memory(baseline, &delta)?;
//! assert_eq!(reconstructed, updated);
//! # Ok::<(), rudiff::Error>(())
//! ```

pub mod delta;
pub mod engine;
pub mod error;
pub mod hash;
pub mod signature;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Phase, Result, StreamRole};
