use talon_chain::IndexedBlockHeader;
use talon_primitives::hash::H256;

use crate::block_provider::BlockHeaderProvider;
use crate::block_ref::BlockRef;

/// Walks a chain of headers backwards from some starting point, following
/// `previous_header_hash` one hop at a time. Used for coinbase maturity
/// checks, median-time-past, and checkpoint validation, none of which need
/// more than a forward-only walk toward genesis.
pub struct BlockAncestors<'a> {
	block_provider: &'a dyn BlockHeaderProvider,
	next: Option<H256>,
}

impl<'a> BlockAncestors<'a> {
	pub fn new(start: BlockRef, block_provider: &'a dyn BlockHeaderProvider) -> Self {
		let next = block_provider.block_header(start).map(|h| h.hash);
		BlockAncestors { block_provider, next }
	}

	/// Same as `new`, but the first item yielded is the parent of `start`
	/// rather than `start` itself.
	pub fn new_excluding_self(start: BlockRef, block_provider: &'a dyn BlockHeaderProvider) -> Self {
		let next = block_provider
			.block_header(start)
			.map(|h| h.raw.previous_header_hash.clone());
		BlockAncestors { block_provider, next }
	}
}

impl<'a> Iterator for BlockAncestors<'a> {
	type Item = IndexedBlockHeader;

	fn next(&mut self) -> Option<Self::Item> {
		let current_hash = self.next.take()?;
		let header = self.block_provider.block_header(BlockRef::Hash(current_hash))?;
		self.next = Some(header.raw.previous_header_hash.clone());
		Some(header)
	}
}
