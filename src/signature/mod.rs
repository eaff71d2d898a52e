// Signature streams: per-block weak/strong fingerprints of a baseline.

pub mod generate;
pub mod header;
pub mod index;

pub use generate::{SignatureBuilder, SignatureStats};
pub use header::SignatureHeader;
pub use index::SignatureIndex;
