// Checksum primitives for block matching.
//
// - Rolling weak checksum (cheap pre-filter, O(1) window slide)
// - Strong block hashes (collision-chain disambiguation)

pub mod rolling;
pub mod strong;

pub use rolling::{RollingChecksum, CHAR_OFFSET, WEAK_SUM_LEN};
pub use strong::{StrongAlgorithm, StrongHasher};
