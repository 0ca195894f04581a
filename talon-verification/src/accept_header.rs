use talon_chainparams::ConsensusParams;
use talon_storage::BlockHeaderProvider;

use crate::canon::CanonHeader;
use crate::error::Error;
use crate::timestamp::median_timestamp;
use crate::work::work_required;

/// Full (contextual) header verification: acceptBlock steps 3, 4 and 6
/// (retarget rule, median timestamp, checkpoint). Composed of independent
/// checker structs so each rule stays testable on its own.
pub struct HeaderAcceptor<'a> {
	pub work: HeaderWork<'a>,
	pub median_timestamp: HeaderMedianTimestamp<'a>,
	pub checkpoint: HeaderCheckpoint<'a>,
}

impl<'a> HeaderAcceptor<'a> {
	pub fn new(store: &'a dyn BlockHeaderProvider, consensus: &'a ConsensusParams, header: CanonHeader<'a>, height: u32) -> Self {
		HeaderAcceptor {
			work: HeaderWork::new(header, store, height, consensus),
			median_timestamp: HeaderMedianTimestamp::new(header, store),
			checkpoint: HeaderCheckpoint::new(header, height, consensus),
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.work.check()?;
		self.median_timestamp.check()?;
		self.checkpoint.check()?;
		Ok(())
	}
}

pub struct HeaderWork<'a> {
	header: CanonHeader<'a>,
	store: &'a dyn BlockHeaderProvider,
	height: u32,
	consensus: &'a ConsensusParams,
}

impl<'a> HeaderWork<'a> {
	fn new(header: CanonHeader<'a>, store: &'a dyn BlockHeaderProvider, height: u32, consensus: &'a ConsensusParams) -> Self {
		HeaderWork { header, store, height, consensus }
	}

	fn check(&self) -> Result<(), Error> {
		let required = work_required(self.header.raw().previous_header_hash, self.height, self.store, self.consensus);
		if required == self.header.raw().bits {
			Ok(())
		} else {
			Err(Error::BadProofOfWork)
		}
	}
}

pub struct HeaderMedianTimestamp<'a> {
	header: CanonHeader<'a>,
	store: &'a dyn BlockHeaderProvider,
}

impl<'a> HeaderMedianTimestamp<'a> {
	fn new(header: CanonHeader<'a>, store: &'a dyn BlockHeaderProvider) -> Self {
		HeaderMedianTimestamp { header, store }
	}

	fn check(&self) -> Result<(), Error> {
		match median_timestamp(self.header.raw(), self.store) {
			// No indexed ancestors: the genesis block, which has nothing to
			// be "after" yet.
			None => Ok(()),
			Some(median) if self.header.raw().time > median => Ok(()),
			Some(_) => Err(Error::BadTimestamp),
		}
	}
}

pub struct HeaderCheckpoint<'a> {
	header: CanonHeader<'a>,
	height: u32,
	consensus: &'a ConsensusParams,
}

impl<'a> HeaderCheckpoint<'a> {
	fn new(header: CanonHeader<'a>, height: u32, consensus: &'a ConsensusParams) -> Self {
		HeaderCheckpoint { header, height, consensus }
	}

	fn check(&self) -> Result<(), Error> {
		match self.consensus.checkpoint(self.height) {
			Some(expected) if &expected != self.header.hash() => Err(Error::BadCheckpoint),
			_ => Ok(()),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use talon_chain::IndexedBlockHeader;
	use talon_chainparams::Network;
	use talon_primitives::hash::H256;
	use talon_storage::BlockRef;

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

	#[test]
	fn checkpoint_mismatch_is_rejected() {
		let mut consensus = ConsensusParams::new(Network::Unitest);
		let genesis = consensus.genesis_block();
		let indexed = IndexedBlockHeader::from_raw(genesis.header.clone());
		consensus.checkpoints.insert(0, H256::from([9u8; 32]));

		let canon = CanonHeader::new(&indexed);
		let checkpoint = HeaderCheckpoint::new(canon, 0, &consensus);
		assert_eq!(checkpoint.check(), Err(Error::BadCheckpoint));
	}

	#[test]
	fn median_timestamp_passes_for_a_header_with_no_indexed_ancestors() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let genesis = consensus.genesis_block();
		let genesis_indexed = IndexedBlockHeader::from_raw(genesis.header.clone());
		let fake_store = FakeStore(HashMap::new());

		let canon = CanonHeader::new(&genesis_indexed);
		let median = HeaderMedianTimestamp::new(canon, &fake_store);
		assert_eq!(median.check(), Ok(()));
	}

	#[test]
	fn work_mismatch_is_rejected() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let genesis = consensus.genesis_block();
		let genesis_indexed = IndexedBlockHeader::from_raw(genesis.header.clone());
		let mut store = HashMap::new();
		store.insert(genesis_indexed.hash, genesis_indexed.clone());

		let mut child = genesis.header.clone();
		child.previous_header_hash = genesis_indexed.hash;
		child.bits = talon_primitives::compact::Compact::new(0x1d00ffff);
		let child_indexed = IndexedBlockHeader::from_raw(child);

		let fake_store = FakeStore(store);
		let canon = CanonHeader::new(&child_indexed);
		let work = HeaderWork::new(canon, &fake_store, 1, &consensus);
		assert_eq!(work.check(), Err(Error::BadProofOfWork));
	}
}
