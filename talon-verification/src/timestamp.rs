use talon_chain::BlockHeader;
use talon_storage::{BlockAncestors, BlockHeaderProvider, BlockRef};

const MEDIAN_TIMESPAN: usize = 11;

/// Median of the timestamps of `header`'s previous `MEDIAN_TIMESPAN`
/// ancestors (spec §4.3 step 4: `block.time > median(past 11 ancestors'
/// times)`). Fewer ancestors than that (near genesis) just median over
/// what exists; `None` when there is no ancestor at all (the genesis
/// block), since there is then nothing the new timestamp could violate.
pub fn median_timestamp(header: &BlockHeader, store: &dyn BlockHeaderProvider) -> Option<u32> {
	let mut timestamps: Vec<u32> = BlockAncestors::new(BlockRef::Hash(header.previous_header_hash), store)
		.take(MEDIAN_TIMESPAN)
		.map(|ancestor| ancestor.raw.time)
		.collect();

	if timestamps.is_empty() {
		return None;
	}

	timestamps.sort_unstable();
	Some(timestamps[timestamps.len() / 2])
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use talon_chain::IndexedBlockHeader;
	use talon_primitives::compact::Compact;
	use talon_primitives::hash::H256;

	struct FakeStore(HashMap<H256, IndexedBlockHeader>);

	impl BlockHeaderProvider for FakeStore {
		fn block_header(&self, block_ref: BlockRef) -> Option<IndexedBlockHeader> {
			match block_ref {
				BlockRef::Hash(hash) => self.0.get(&hash).cloned(),
				BlockRef::Number(_) => None,
			}
		}

		fn block_hash(&self, _number: u32) -> Option<H256> {
			None
		}

		fn block_number(&self, _hash: &H256) -> Option<u32> {
			None
		}
	}

	fn header(prev: H256, time: u32) -> BlockHeader {
		BlockHeader {
			version: 1,
			previous_header_hash: prev,
			merkle_root: H256::zero(),
			time,
			bits: Compact::max_value(),
			nonce: 0,
		}
	}

	#[test]
	fn medians_over_available_ancestors() {
		let mut store = HashMap::new();
		let genesis = header(H256::zero(), 100);
		let genesis_indexed = IndexedBlockHeader::from_raw(genesis);
		store.insert(genesis_indexed.hash, genesis_indexed.clone());

		let h1 = header(genesis_indexed.hash, 200);
		let h1_indexed = IndexedBlockHeader::from_raw(h1);
		store.insert(h1_indexed.hash, h1_indexed.clone());

		let h2 = header(h1_indexed.hash, 300);
		let fake_store = FakeStore(store);

		assert_eq!(median_timestamp(&h2, &fake_store), Some(200));
	}

	#[test]
	fn is_none_for_a_header_with_no_indexed_ancestors() {
		let fake_store = FakeStore(HashMap::new());
		let orphan = header(H256::zero(), 100);
		assert_eq!(median_timestamp(&orphan, &fake_store), None);
	}
}
