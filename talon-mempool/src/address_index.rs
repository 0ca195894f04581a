use talon_primitives::hash::H160;

/// Recognizes a standard pay-to-pubkey-hash output
/// (`OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`) and pulls out
/// the address hash. This is pattern matching on a fixed byte template, not
/// script execution, so it stays within the bounds of the script
/// interpreter being out of scope (§1): the mempool's asset index only
/// needs to recognize the one output shape it indexes by.
pub fn p2pkh_hash(script: &[u8]) -> Option<H160> {
	const PREFIX: [u8; 3] = [0x76, 0xa9, 0x14];
	const SUFFIX: [u8; 2] = [0x88, 0xac];

	if script.len() != 25 || script[0..3] != PREFIX || script[23..25] != SUFFIX {
		return None;
	}
	let mut buf = [0u8; 20];
	buf.copy_from_slice(&script[3..23]);
	Some(H160::from(buf))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn recognizes_p2pkh_template() {
		let mut script = vec![0x76, 0xa9, 0x14];
		script.extend_from_slice(&[7u8; 20]);
		script.extend_from_slice(&[0x88, 0xac]);
		assert_eq!(p2pkh_hash(&script), Some(H160::from([7u8; 20])));
	}

	#[test]
	fn rejects_anything_else() {
		assert_eq!(p2pkh_hash(&[0x51]), None);
	}
}
