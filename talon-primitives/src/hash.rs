//! Fixed-width hash types.
//!
//! `H256` is the block/transaction hash width; `H160` is the address hash
//! width (`ripemd160(sha256(pubkey))`, per the wallet's key derivation, which
//! is out of scope here and only referenced by width).

use fixed_hash::construct_fixed_hash;

construct_fixed_hash! {
	/// 160-bit hash, used for address hashes (credit/debit index keys).
	pub struct H160(20);
}

construct_fixed_hash! {
	/// 256-bit hash, used for block and transaction hashes.
	pub struct H256(32);
}

impl H256 {
	/// Byte-reversed copy, matching the big-endian hex notation block
	/// explorers and the wire protocol display for hashes.
	pub fn reversed(&self) -> Self {
		let mut bytes = self.0;
		bytes.reverse();
		H256(bytes)
	}

	/// Hex string of the reversed byte order.
	pub fn to_reversed_str(&self) -> String {
		format!("{:x}", self.reversed())
	}
}

#[cfg(test)]
mod tests {
	use super::H256;

	#[test]
	fn reversed_is_involutive() {
		let h = H256::from([7u8; 32]);
		assert_eq!(h.reversed().reversed(), h);
	}

	#[test]
	fn zero_hash_is_zero() {
		assert!(H256::zero().is_zero());
		assert!(!H256::from([1u8; 32]).is_zero());
	}
}
