use crate::transaction::Transaction;
use std::cmp;
use std::fmt;
use talon_primitives::hash::H256;

#[derive(Clone)]
pub struct IndexedTransaction {
	pub hash: H256,
	pub raw: Transaction,
}

impl fmt::Debug for IndexedTransaction {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("IndexedTransaction")
			.field("hash", &self.hash.to_reversed_str())
			.field("raw", &self.raw)
			.finish()
	}
}

impl cmp::PartialEq for IndexedTransaction {
	fn eq(&self, other: &Self) -> bool {
		self.hash == other.hash
	}
}

impl IndexedTransaction {
	pub fn new(hash: H256, transaction: Transaction) -> Self {
		IndexedTransaction {
			hash,
			raw: transaction,
		}
	}

	pub fn from_raw(transaction: Transaction) -> Self {
		let hash = transaction.hash();
		IndexedTransaction::new(hash, transaction)
	}
}

impl From<Transaction> for IndexedTransaction {
	fn from(transaction: Transaction) -> Self {
		IndexedTransaction::from_raw(transaction)
	}
}
