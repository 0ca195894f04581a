use crate::block::Block;
use crate::indexed_header::IndexedBlockHeader;
use crate::indexed_transaction::IndexedTransaction;
use talon_primitives::hash::H256;

#[derive(Debug, Clone, PartialEq)]
pub struct IndexedBlock {
	pub header: IndexedBlockHeader,
	pub transactions: Vec<IndexedTransaction>,
}

impl IndexedBlock {
	pub fn new(header: IndexedBlockHeader, transactions: Vec<IndexedTransaction>) -> Self {
		IndexedBlock {
			header,
			transactions,
		}
	}

	pub fn hash(&self) -> &H256 {
		&self.header.hash
	}

	pub fn to_raw_block(&self) -> Block {
		Block {
			header: self.header.raw.clone(),
			transactions: self.transactions.iter().map(|tx| tx.raw.clone()).collect(),
		}
	}
}

impl From<Block> for IndexedBlock {
	fn from(block: Block) -> Self {
		let header = IndexedBlockHeader::from_raw(block.header);
		let transactions = block
			.transactions
			.into_iter()
			.map(IndexedTransaction::from_raw)
			.collect();
		IndexedBlock::new(header, transactions)
	}
}
