use talon_primitives::hash::H256;

/// Addresses a block either by height in the best chain or by hash.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum BlockRef {
	Number(u32),
	Hash(H256),
}

impl From<u32> for BlockRef {
	fn from(number: u32) -> Self {
		BlockRef::Number(number)
	}
}

impl From<H256> for BlockRef {
	fn from(hash: H256) -> Self {
		BlockRef::Hash(hash)
	}
}
