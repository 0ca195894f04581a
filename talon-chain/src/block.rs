use crate::block_header::{block_header_hash, BlockHeader};
use crate::indexed_transaction::IndexedTransaction;
use crate::merkle_root::merkle_root;
use crate::transaction::Transaction;
use talon_primitives::hash::H256;
use talon_serialization::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Block {
	pub header: BlockHeader,
	pub transactions: Vec<Transaction>,
}

impl Serializable for Block {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.header).append_list(&self.transactions);
	}
}

impl Deserializable for Block {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(Block {
			header: reader.read()?,
			transactions: reader.read_list()?,
		})
	}
}

impl Block {
	pub fn hash(&self) -> H256 {
		block_header_hash(&self.header)
	}

	pub fn merkle_root(&self) -> H256 {
		let hashes: Vec<H256> = self.transactions.iter().map(Transaction::hash).collect();
		merkle_root(&hashes)
	}

	pub fn indexed_transactions(&self) -> Vec<IndexedTransaction> {
		self.transactions
			.iter()
			.cloned()
			.map(IndexedTransaction::from_raw)
			.collect()
	}
}
