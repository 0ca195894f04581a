use std::sync::Arc;

use crate::best_block::BestBlock;
use crate::block_provider::BlockProvider;
use crate::transaction_provider::{TransactionMetaProvider, TransactionOutputProvider, TransactionProvider};

/// Everything the verification, mempool and template-builder layers need
/// to read from the confirmed chain. `talon_db::BlockChainDatabase` is the
/// production implementation; `talon-test-data` provides an in-memory one
/// for unit tests.
pub trait Store:
	BlockProvider + TransactionProvider + TransactionMetaProvider + TransactionOutputProvider + Send + Sync
{
	/// Current best chain tip. `BestBlock::default()` (height 0, zero hash)
	/// before the genesis block has been accepted.
	fn best_block(&self) -> BestBlock;

	/// Hash of the genesis block, as configured by `talon_chainparams`.
	fn genesis_hash(&self) -> talon_primitives::hash::H256;
}

/// A `Store` behind an `Arc`, the shape every long-lived collaborator
/// (engine, mempool, miner, RPC-equivalent callers) actually holds.
pub type SharedStore = Arc<dyn Store>;

/// Narrows a `SharedStore` down to just the sub-trait a given piece of
/// code needs, so e.g. the template builder can be handed something that
/// looks like a `TransactionOutputProvider` without depending on the rest
/// of `Store`.
pub trait AsSubstore: TransactionOutputProvider {
	fn as_transaction_output_provider(&self) -> &dyn TransactionOutputProvider;
}

impl<T> AsSubstore for T
where
	T: Store,
{
	fn as_transaction_output_provider(&self) -> &dyn TransactionOutputProvider {
		self
	}
}
