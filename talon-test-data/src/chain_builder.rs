use talon_chain::{Block, IndexedBlock, Transaction};
use talon_primitives::hash::H256;
use talon_serialization::Serializable;

use crate::block_builder::block_builder;

/// Accumulates a sequence of blocks built against each other's hash, so
/// test fixtures can assemble a small chain (or two competing branches for
/// reorg tests) without hand-threading `previous_header_hash` everywhere.
#[derive(Debug, Default, Clone)]
pub struct ChainBuilder {
	pub blocks: Vec<Block>,
}

impl ChainBuilder {
	pub fn new() -> Self {
		ChainBuilder::default()
	}

	pub fn at(&self, index: usize) -> Block {
		self.blocks[index].clone()
	}

	pub fn hash(&self, index: usize) -> H256 {
		self.blocks[index].hash()
	}

	pub fn tip_hash(&self) -> H256 {
		self.blocks.last().map(Block::hash).unwrap_or_else(H256::zero)
	}

	pub fn push(&mut self, block: Block) -> &mut Self {
		self.blocks.push(block);
		self
	}

	/// Appends a block extending the current tip, carrying a single
	/// coinbase paying `reward` plus whatever extra transactions are given.
	pub fn extend_with_coinbase(&mut self, reward: u64, extra: Vec<Transaction>) -> &mut Self {
		let parent = self.tip_hash();
		let mut builder = block_builder()
			.header()
			.parent(parent)
			.time(self.blocks.len() as u32 + 1)
			.build()
			.transaction()
			.coinbase()
			.output()
			.value(reward)
			.build()
			.build();
		for tx in extra {
			builder = builder.with_transaction(tx);
		}
		self.blocks.push(builder.build());
		self
	}

	pub fn indexed(&self, index: usize) -> IndexedBlock {
		IndexedBlock::from(self.blocks[index].clone())
	}

	pub fn total_size(&self) -> usize {
		self.blocks.iter().map(|block| block.serialized_size()).sum()
	}
}
