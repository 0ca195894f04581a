//! Scalar types shared by every other crate in the workspace: fixed-width
//! hashes, the compact proof-of-work representation and the big integer used
//! to accumulate chain work.

pub mod bigint;
pub mod compact;
pub mod hash;

pub use bigint::U256;
pub use compact::Compact;
pub use hash::{H160, H256};
