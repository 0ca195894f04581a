use crate::hasher::dhash256;
use talon_primitives::hash::H256;

fn merkle_node_hash(left: &H256, right: &H256) -> H256 {
	let mut bytes = Vec::with_capacity(64);
	bytes.extend_from_slice(left.as_bytes());
	bytes.extend_from_slice(right.as_bytes());
	dhash256(&bytes)
}

/// Standard Bitcoin-style merkle root: pairwise-hash each level, duplicating
/// the last element of an odd-length level.
pub fn merkle_root(hashes: &[H256]) -> H256 {
	if hashes.is_empty() {
		return H256::zero();
	}
	let mut level: Vec<H256> = hashes.to_vec();
	while level.len() > 1 {
		if level.len() % 2 == 1 {
			let last = level.last().cloned().unwrap();
			level.push(last);
		}
		level = level
			.chunks(2)
			.map(|pair| merkle_node_hash(&pair[0], &pair[1]))
			.collect();
	}
	level[0]
}

#[cfg(test)]
mod tests {
	use super::merkle_root;
	use talon_primitives::hash::H256;

	#[test]
	fn single_hash_is_its_own_root() {
		let h = H256::from([1u8; 32]);
		assert_eq!(merkle_root(&[h]), h);
	}

	#[test]
	fn odd_count_duplicates_last() {
		let a = H256::from([1u8; 32]);
		let b = H256::from([2u8; 32]);
		let c = H256::from([3u8; 32]);
		// [a, b, c] should equal merkle_root([a, b, c, c])
		let odd = merkle_root(&[a, b, c]);
		let even = merkle_root(&[a, b, c, c]);
		assert_eq!(odd, even);
	}
}
