//! Adapter to the project's hash primitive.
//!
//! The hash primitive itself (§1 non-goals) is an external collaborator; the
//! chain crate only needs the two operations it uses — hashing a header and
//! hashing a transaction — expressed as a trait so a real deployment can
//! plug in whatever primitive the wider node uses. `DoubleSha256` is the
//! concrete adapter used by tests and by the default wiring in the `talon`
//! binary.

use sha2::{Digest, Sha256};
use talon_primitives::hash::H256;

pub trait BlockHasher: Send + Sync {
	fn hash(&self, bytes: &[u8]) -> H256;
}

#[derive(Default, Clone, Copy)]
pub struct DoubleSha256;

impl BlockHasher for DoubleSha256 {
	fn hash(&self, bytes: &[u8]) -> H256 {
		let first = Sha256::digest(bytes);
		let second = Sha256::digest(&first);
		H256::from_slice(&second)
	}
}

/// Convenience free function used internally by header/transaction hashing,
/// equivalent to `DoubleSha256.hash(bytes)`.
pub fn dhash256(bytes: &[u8]) -> H256 {
	DoubleSha256.hash(bytes)
}
