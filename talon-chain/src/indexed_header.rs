use crate::block_header::{block_header_hash, BlockHeader};
use std::cmp;
use std::fmt;
use talon_primitives::hash::H256;

/// A header together with its (already computed) hash, so downstream code
/// never has to re-hash it.
#[derive(Clone)]
pub struct IndexedBlockHeader {
	pub hash: H256,
	pub raw: BlockHeader,
}

impl fmt::Debug for IndexedBlockHeader {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("IndexedBlockHeader")
			.field("hash", &self.hash.to_reversed_str())
			.field("raw", &self.raw)
			.finish()
	}
}

impl cmp::PartialEq for IndexedBlockHeader {
	fn eq(&self, other: &Self) -> bool {
		self.hash == other.hash
	}
}

impl IndexedBlockHeader {
	pub fn new(hash: H256, header: BlockHeader) -> Self {
		IndexedBlockHeader { hash, raw: header }
	}

	pub fn from_raw(header: BlockHeader) -> Self {
		IndexedBlockHeader::new(block_header_hash(&header), header)
	}
}

impl From<BlockHeader> for IndexedBlockHeader {
	fn from(header: BlockHeader) -> Self {
		IndexedBlockHeader::from_raw(header)
	}
}
