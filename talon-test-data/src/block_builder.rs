use talon_chain::{Block, BlockHeader, IndexedBlock, Transaction};
use talon_primitives::compact::Compact;
use talon_primitives::hash::H256;

use crate::transaction_builder::TransactionBuilder;

/// Entry point for the fluent block-construction API: `block_builder()
/// .header().parent(prev).nonce(1).build().transaction().output()
/// .value(10).build().build()`, mirroring the nested builder-returns-to-
/// parent shape test fixtures in this family of codebases use.
pub fn block_builder() -> BlockBuilder {
	BlockBuilder::default()
}

#[derive(Debug, Default, Clone)]
pub struct BlockBuilder {
	header: BlockHeader,
	transactions: Vec<Transaction>,
}

impl BlockBuilder {
	pub fn header(self) -> BlockHeaderBuilder {
		BlockHeaderBuilder { parent: self, header: BlockHeader::default() }
	}

	pub fn with_transaction(mut self, transaction: Transaction) -> Self {
		self.transactions.push(transaction);
		self
	}

	pub fn transaction(self) -> BlockTransactionBuilder {
		BlockTransactionBuilder { parent: self, builder: TransactionBuilder::default() }
	}

	pub fn build(mut self) -> Block {
		if self.header.merkle_root == H256::zero() && !self.transactions.is_empty() {
			let hashes: Vec<H256> = self.transactions.iter().map(Transaction::hash).collect();
			self.header.merkle_root = talon_chain::merkle_root(&hashes);
		}
		Block { header: self.header, transactions: self.transactions }
	}

	pub fn build_indexed(self) -> IndexedBlock {
		IndexedBlock::from(self.build())
	}
}

pub struct BlockHeaderBuilder {
	parent: BlockBuilder,
	header: BlockHeader,
}

impl BlockHeaderBuilder {
	pub fn parent(mut self, hash: H256) -> Self {
		self.header.previous_header_hash = hash;
		self
	}

	pub fn time(mut self, time: u32) -> Self {
		self.header.time = time;
		self
	}

	pub fn bits(mut self, bits: Compact) -> Self {
		self.header.bits = bits;
		self
	}

	pub fn nonce(mut self, nonce: u32) -> Self {
		self.header.nonce = nonce;
		self
	}

	pub fn version(mut self, version: u32) -> Self {
		self.header.version = version;
		self
	}

	pub fn build(mut self) -> BlockBuilder {
		self.parent.header = self.header;
		self.parent
	}
}

pub struct BlockTransactionBuilder {
	parent: BlockBuilder,
	builder: TransactionBuilder,
}

impl BlockTransactionBuilder {
	pub fn coinbase(mut self) -> Self {
		self.builder = TransactionBuilder::coinbase();
		self
	}

	pub fn output(self) -> BlockTransactionOutputBuilder {
		BlockTransactionOutputBuilder { parent: self, value: 0 }
	}

	pub fn input(mut self, transaction: &Transaction, output_index: u32) -> Self {
		self.builder = self.builder.add_input(transaction, output_index);
		self
	}

	pub fn build(mut self) -> BlockBuilder {
		self.parent.transactions.push(self.builder.build());
		self.parent
	}
}

pub struct BlockTransactionOutputBuilder {
	parent: BlockTransactionBuilder,
	value: u64,
}

impl BlockTransactionOutputBuilder {
	pub fn value(mut self, value: u64) -> Self {
		self.value = value;
		self
	}

	pub fn build(mut self) -> BlockTransactionBuilder {
		self.parent.builder = self.parent.builder.add_output(self.value);
		self.parent
	}
}
