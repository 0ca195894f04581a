use talon_chain::{BlockHeader, IndexedBlock, IndexedBlockHeader, IndexedTransaction, Transaction};
use talon_primitives::hash::H256;

/// Marks a header that has already passed pre-verification (`VerifyHeader`
/// in the two-phase split): `accept_header` checks are only meaningful once
/// the header's own well-formedness is no longer in question.
#[derive(Clone, Copy)]
pub struct CanonHeader<'a> {
	header: &'a IndexedBlockHeader,
}

impl<'a> CanonHeader<'a> {
	pub fn new(header: &'a IndexedBlockHeader) -> Self {
		CanonHeader { header }
	}

	pub fn hash(&self) -> &H256 {
		&self.header.hash
	}

	pub fn raw(&self) -> &BlockHeader {
		&self.header.raw
	}
}

impl<'a> std::ops::Deref for CanonHeader<'a> {
	type Target = IndexedBlockHeader;

	fn deref(&self) -> &IndexedBlockHeader {
		self.header
	}
}

/// Marks a transaction that has already passed pre-verification.
#[derive(Clone, Copy)]
pub struct CanonTransaction<'a> {
	transaction: &'a IndexedTransaction,
}

impl<'a> CanonTransaction<'a> {
	pub fn new(transaction: &'a IndexedTransaction) -> Self {
		CanonTransaction { transaction }
	}

	pub fn hash(&self) -> &H256 {
		&self.transaction.hash
	}

	pub fn raw(&self) -> &Transaction {
		&self.transaction.raw
	}
}

impl<'a> std::ops::Deref for CanonTransaction<'a> {
	type Target = IndexedTransaction;

	fn deref(&self) -> &IndexedTransaction {
		self.transaction
	}
}

/// Marks a whole block that has already passed pre-verification.
#[derive(Clone, Copy)]
pub struct CanonBlock<'a> {
	block: &'a IndexedBlock,
}

impl<'a> CanonBlock<'a> {
	pub fn new(block: &'a IndexedBlock) -> Self {
		CanonBlock { block }
	}

	pub fn hash(&self) -> &H256 {
		&self.block.header.hash
	}

	pub fn header(&self) -> CanonHeader<'a> {
		CanonHeader::new(&self.block.header)
	}

	pub fn transactions(&self) -> Vec<CanonTransaction<'a>> {
		self.block.transactions.iter().map(CanonTransaction::new).collect()
	}

	pub fn raw(&self) -> &'a IndexedBlock {
		self.block
	}
}

impl<'a> std::ops::Deref for CanonBlock<'a> {
	type Target = IndexedBlock;

	fn deref(&self) -> &IndexedBlock {
		self.block
	}
}
