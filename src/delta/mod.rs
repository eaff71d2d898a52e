// Delta streams: ordered COPY/LITERAL recipes reconstructing an updated
// file from a baseline plus embedded new bytes.

pub mod apply;
pub mod encoder;
pub mod format;

pub use apply::apply;
pub use encoder::{compute, DeltaStats};
pub use format::DeltaInstruction;
