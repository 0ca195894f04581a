use talon_chain::{IndexedBlock, IndexedBlockHeader};
use talon_primitives::hash::H256;

use crate::block_ref::BlockRef;

/// Read access to confirmed block headers, keyed by height or hash.
///
/// Implemented by `talon_db::BlockChainDatabase` and by the in-memory
/// fixtures `talon-test-data` builds for unit tests.
pub trait BlockHeaderProvider {
	fn block_header(&self, block_ref: BlockRef) -> Option<IndexedBlockHeader>;

	fn block_hash(&self, number: u32) -> Option<H256>;

	fn block_number(&self, hash: &H256) -> Option<u32>;
}

/// Read access to whole confirmed blocks.
pub trait BlockProvider: BlockHeaderProvider {
	fn block(&self, block_ref: BlockRef) -> Option<IndexedBlock>;

	fn contains_block(&self, block_ref: BlockRef) -> bool {
		self.block_header(block_ref).is_some()
	}
}
