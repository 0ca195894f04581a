use talon_chain::{IndexedBlock, OutPoint, Transaction, TransactionOutput};
use talon_primitives::hash::H256;

use crate::transaction_meta::TransactionMeta;

/// Resolves an `OutPoint` to the output it references, without regard to
/// whether that output has already been spent. Implemented both by the
/// confirmed store and by the mempool, so verification can be asked to
/// look through both at once (see `DuplexTransactionOutputProvider`).
pub trait TransactionOutputProvider {
	fn transaction_output(&self, outpoint: &OutPoint, transaction_index: usize) -> Option<TransactionOutput>;

	fn is_spent(&self, outpoint: &OutPoint) -> bool;
}

/// Full transaction lookup by hash, used by RPC-shaped callers and by
/// `block_ancestors`/reorg bookkeeping. Not every store needs to support
/// this (a pruned node wouldn't), so it is split out from the output
/// lookup that verification actually depends on.
pub trait TransactionProvider {
	fn transaction(&self, hash: &H256) -> Option<Transaction>;
}

/// Per-transaction confirmation metadata (height, coinbase flag, spent
/// bitmap) keyed by txid.
pub trait TransactionMetaProvider {
	fn transaction_meta(&self, hash: &H256) -> Option<TransactionMeta>;
}

/// Looks an outpoint up in one provider, falling back to a second.
///
/// `accept_transaction` uses this to check mempool inputs against "the
/// confirmed chain, or an earlier transaction already admitted to the
/// same mempool batch" without caring which one actually held it.
#[derive(Clone, Copy)]
pub struct DuplexTransactionOutputProvider<'a> {
	first: &'a dyn TransactionOutputProvider,
	second: &'a dyn TransactionOutputProvider,
}

impl<'a> DuplexTransactionOutputProvider<'a> {
	pub fn new(first: &'a dyn TransactionOutputProvider, second: &'a dyn TransactionOutputProvider) -> Self {
		DuplexTransactionOutputProvider { first, second }
	}
}

impl<'a> TransactionOutputProvider for DuplexTransactionOutputProvider<'a> {
	fn transaction_output(&self, outpoint: &OutPoint, transaction_index: usize) -> Option<TransactionOutput> {
		self.first
			.transaction_output(outpoint, transaction_index)
			.or_else(|| self.second.transaction_output(outpoint, transaction_index))
	}

	fn is_spent(&self, outpoint: &OutPoint) -> bool {
		self.first.is_spent(outpoint) || self.second.is_spent(outpoint)
	}
}

/// A `TransactionOutputProvider` that knows nothing. Used where the API
/// requires one but the caller has already resolved inputs another way
/// (e.g. a header-only context).
pub struct NoopStore;

/// Lets a block still being verified act as an output provider for its own
/// transactions, so `connectInputs` can resolve an input that spends an
/// earlier transaction in the same block before that transaction has been
/// persisted anywhere.
impl TransactionOutputProvider for IndexedBlock {
	fn transaction_output(&self, outpoint: &OutPoint, transaction_index: usize) -> Option<TransactionOutput> {
		self.transactions
			.iter()
			.take(transaction_index)
			.find(|candidate| candidate.hash == outpoint.hash)
			.and_then(|candidate| candidate.raw.outputs.get(outpoint.index as usize).cloned())
	}

	fn is_spent(&self, _outpoint: &OutPoint) -> bool {
		false
	}
}

impl TransactionOutputProvider for NoopStore {
	fn transaction_output(&self, _outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
		None
	}

	fn is_spent(&self, _outpoint: &OutPoint) -> bool {
		false
	}
}
