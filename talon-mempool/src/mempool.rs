use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;
use talon_chain::constants::MIN_TRANSACTION_SIZE;
use talon_chain::{IndexedBlock, IndexedTransaction, OutPoint, Transaction};
use talon_chainparams::ConsensusParams;
use talon_primitives::hash::{H160, H256};
use talon_serialization::Serializable;
use talon_storage::{AsSubstore, DuplexTransactionOutputProvider, Store, TransactionOutputProvider};
use talon_verification::{
	checked_transaction_fee, transaction_sigops, CanonTransaction, MemoryPoolTransactionAcceptor, SignatureVerifier,
	TransactionError,
};

use crate::address_index::p2pkh_hash;
use crate::rate_limiter::FreeRateLimiter;
use crate::Error;

/// A transaction still sitting in the pool, with just enough to answer
/// `TransactionOutputProvider` queries for later arrivals that spend it,
/// and the fee it paid (computed once, at admission) so the template
/// builder does not need to re-resolve every input a second time.
struct Entry {
	transaction: Transaction,
	size: usize,
	fee: u64,
	admitted_at: u32,
}

/// A snapshot of one pooled transaction, handed out by `MemPool::entries`
/// for the template builder to order and fit into a block.
#[derive(Debug, Clone)]
pub struct PooledEntry {
	pub hash: H256,
	pub transaction: Transaction,
	pub size: usize,
	pub fee: u64,
	pub admitted_at: u32,
}

/// How `MemPool::iter` orders its snapshot. The block assembler wants
/// `ByTransactionScore` (highest fee-rate first, its own priority pass
/// re-sorts on top of this); simple inspection call sites just want
/// insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingStrategy {
	ByTransactionScore,
	ByTimestamp,
}

/// The node's unconfirmed-transaction pool (spec §4.4). Everything lives
/// behind one lock: `BlockChainDatabase` takes the equivalent approach for
/// its own indices, and the pool is small enough that a single writer at a
/// time is no real bottleneck.
pub struct MemPool {
	consensus: ConsensusParams,
	state: RwLock<State>,
}

struct State {
	transaction_index: HashMap<H256, Entry>,
	/// Which pooled transaction (and at which input) currently spends a
	/// given outpoint; used both for the "no double spend" rejection
	/// (step 7) and to undo the debit/credit indices on eviction.
	transaction_connections: HashMap<OutPoint, H256>,
	/// Coins a pooled transaction would create, indexed by the recognized
	/// recipient.
	credit_index: HashMap<H160, HashSet<OutPoint>>,
	/// Coins a pooled transaction spends, indexed by the recognized sender
	/// (the previous output's script, if it matches the template).
	debit_index: HashMap<H160, HashSet<OutPoint>>,
	rate_limiter: FreeRateLimiter,
}

/// Free-transaction burst budget, in bytes per minute (§4.4 step 9). A
/// production deployment would make this operator-configurable; the value
/// here matches the historical Bitcoin Core default.
const FREE_RATE_LIMIT_BYTES_PER_MINUTE: f64 = 15_000.0;

impl MemPool {
	pub fn new(consensus: ConsensusParams) -> Self {
		MemPool {
			consensus,
			state: RwLock::new(State {
				transaction_index: HashMap::new(),
				transaction_connections: HashMap::new(),
				credit_index: HashMap::new(),
				debit_index: HashMap::new(),
				rate_limiter: FreeRateLimiter::new(FREE_RATE_LIMIT_BYTES_PER_MINUTE),
			}),
		}
	}

	pub fn contains(&self, hash: &H256) -> bool {
		self.state.read().transaction_index.contains_key(hash)
	}

	pub fn len(&self) -> usize {
		self.state.read().transaction_index.len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// All pooled transactions, highest-fee-rate considerations aside; the
	/// template builder imposes its own ordering over this snapshot.
	pub fn transactions(&self) -> Vec<Transaction> {
		self.state.read().transaction_index.values().map(|entry| entry.transaction.clone()).collect()
	}

	/// A snapshot of every pooled transaction along with its cached fee,
	/// for the template builder to rank and fit into a block.
	pub fn entries(&self) -> Vec<PooledEntry> {
		self.state
			.read()
			.transaction_index
			.iter()
			.map(|(hash, entry)| PooledEntry {
				hash: hash.clone(),
				transaction: entry.transaction.clone(),
				size: entry.size,
				fee: entry.fee,
				admitted_at: entry.admitted_at,
			})
			.collect()
	}

	/// `entries()` ordered for a particular consumer: `ByTransactionScore`
	/// ranks by fee rate (satoshis per byte) descending, the same quantity
	/// the template builder's priority pass starts from; `ByTimestamp`
	/// returns admission order, oldest first, which is what an eviction
	/// policy or a diagnostics listing wants.
	pub fn iter(&self, strategy: OrderingStrategy) -> Vec<PooledEntry> {
		let mut entries = self.entries();
		match strategy {
			OrderingStrategy::ByTransactionScore => entries.sort_by(|a, b| {
				let rate_a = a.fee as f64 / a.size.max(1) as f64;
				let rate_b = b.fee as f64 / b.size.max(1) as f64;
				rate_b.partial_cmp(&rate_a).unwrap_or(std::cmp::Ordering::Equal)
			}),
			OrderingStrategy::ByTimestamp => entries.sort_by_key(|entry| entry.admitted_at),
		}
		entries
	}

	/// Admission (spec §4.4, steps 1-10). `store` resolves confirmed-chain
	/// state; `verifier` is the script/signature interpreter collaborator.
	/// `height`/`time` are the best chain's, used for coinbase maturity and
	/// the rate limiter's clock.
	pub fn accept<S: Store>(
		&self,
		store: &S,
		verifier: &dyn SignatureVerifier,
		tx: Transaction,
		check_inputs: bool,
		height: u32,
		time: u32,
	) -> Result<H256, Error> {
		let result = self.accept_checked(store, verifier, tx, check_inputs, height, time);
		match &result {
			Ok(hash) => tracing::debug!(hash = %hash.to_reversed_str(), pool_size = self.len(), "accepted transaction into the pool"),
			Err(err) => tracing::debug!(%err, "rejected transaction"),
		}
		result
	}

	fn accept_checked<S: Store>(
		&self,
		store: &S,
		verifier: &dyn SignatureVerifier,
		tx: Transaction,
		check_inputs: bool,
		height: u32,
		time: u32,
	) -> Result<H256, Error> {
		well_formed(&tx)?;

		if tx.is_coinbase() {
			return Err(Error::Coinbase);
		}

		if tx.lock_time > talon_chain::constants::LOCKTIME_MAX {
			return Err(Error::LockTimeOverflow);
		}

		let size = tx.serialized_size();
		let sigops = transaction_sigops(&tx);
		if size < MIN_TRANSACTION_SIZE || sigops > size / 34 {
			return Err(Error::OversizedOrExcessiveSigops);
		}

		if !self.consensus.is_standard(&tx) {
			return Err(Error::NonStandard);
		}

		let hash = tx.hash();

		{
			let state = self.state.read();
			if state.transaction_index.contains_key(&hash) {
				return Err(Error::Duplicate);
			}
			if store.transaction_meta(&hash).is_some() {
				return Err(Error::Duplicate);
			}
			if tx.inputs.iter().any(|input| state.transaction_connections.contains_key(&input.previous_output)) {
				return Err(Error::DoubleSpend);
			}
		}

		let fee = if check_inputs {
			let indexed = IndexedTransaction::from_raw(tx.clone());
			let canon = CanonTransaction::new(&indexed);
			let pool_outputs = PoolOutputProvider { state: &self.state };
			let dup = DuplexTransactionOutputProvider::new(store.as_transaction_output_provider(), &pool_outputs);
			let acceptor = MemoryPoolTransactionAcceptor::new(store, dup, verifier, &self.consensus, canon, height);
			acceptor.check().map_err(Error::Malformed)?;

			checked_transaction_fee(&dup, usize::max_value(), &tx).map_err(Error::Malformed)?
		} else {
			checked_transaction_fee(store.as_transaction_output_provider(), usize::max_value(), &tx).unwrap_or(0)
		};

		if check_inputs {
			let min_fee = self.consensus.min_relay_fee(size);
			if fee < min_fee {
				if size > FREE_TRANSACTION_SIZE_LIMIT {
					return Err(Error::FeeTooLow(fee, min_fee));
				}
				let mut state = self.state.write();
				if !state.rate_limiter.record(time, size) {
					return Err(Error::RateLimited);
				}
			}
		}

		// Resolve each input's sender for the debit index. Best-effort: the
		// coin may already be gone from both providers by the time we look
		// (a racing eviction), in which case that one input is just left out
		// of the index rather than failing the whole admission.
		let pool_outputs = PoolOutputProvider { state: &self.state };
		let dup = DuplexTransactionOutputProvider::new(store.as_transaction_output_provider(), &pool_outputs);
		let debits: Vec<(OutPoint, H160)> = tx
			.inputs
			.iter()
			.filter_map(|input| {
				dup.transaction_output(&input.previous_output, usize::max_value())
					.and_then(|output| p2pkh_hash(&output.script_pubkey))
					.map(|sender| (input.previous_output.clone(), sender))
			})
			.collect();

		self.insert(hash.clone(), tx, size, fee, time, debits);
		Ok(hash)
	}

	fn insert(&self, hash: H256, tx: Transaction, size: usize, fee: u64, admitted_at: u32, debits: Vec<(OutPoint, H160)>) {
		let mut state = self.state.write();
		for input in &tx.inputs {
			state.transaction_connections.insert(input.previous_output.clone(), hash.clone());
		}
		for (outpoint, sender) in debits {
			state.debit_index.entry(sender).or_insert_with(HashSet::new).insert(outpoint);
		}
		for (index, output) in tx.outputs.iter().enumerate() {
			if let Some(recipient) = p2pkh_hash(&output.script_pubkey) {
				let outpoint = OutPoint { hash: hash.clone(), index: index as u32 };
				state.credit_index.entry(recipient).or_insert_with(HashSet::new).insert(outpoint);
			}
		}
		state.transaction_index.insert(hash, Entry { transaction: tx, size, fee, admitted_at });
	}

	/// Removes `hash` from every index. Used both for direct eviction and,
	/// via `onConnected`, for transactions the chain just confirmed.
	pub fn evict(&self, hash: &H256) -> Option<Transaction> {
		let mut state = self.state.write();
		let entry = state.transaction_index.remove(hash)?;
		for input in &entry.transaction.inputs {
			state.transaction_connections.remove(&input.previous_output);
		}
		state.debit_index.values_mut().for_each(|set| {
			set.retain(|outpoint| !entry.transaction.inputs.iter().any(|input| &input.previous_output == outpoint));
		});
		for (index, output) in entry.transaction.outputs.iter().enumerate() {
			if let Some(recipient) = p2pkh_hash(&output.script_pubkey) {
				if let Some(set) = state.credit_index.get_mut(&recipient) {
					set.remove(&OutPoint { hash: hash.clone(), index: index as u32 });
				}
			}
		}
		Some(entry.transaction)
	}

	/// Re-admits a transaction a reorg disconnected, skipping input checks:
	/// it was already verified once, against a chain state a fork just
	/// proved was live.
	pub fn resurrect<S: Store>(&self, store: &S, verifier: &dyn SignatureVerifier, tx: Transaction, height: u32, time: u32) {
		let _ = self.accept(store, verifier, tx, false, height, time);
	}

	/// A block just became part of the best chain: its non-coinbase
	/// transactions are no longer unconfirmed.
	pub fn on_connected(&self, block: &IndexedBlock) {
		for tx in block.transactions.iter().skip(1) {
			self.evict(&tx.hash);
		}
	}

	/// A block was disconnected during a reorg: put its non-coinbase
	/// transactions back in the pool.
	pub fn on_disconnected<S: Store>(&self, store: &S, verifier: &dyn SignatureVerifier, block: &IndexedBlock, height: u32, time: u32) {
		for tx in block.transactions.iter().skip(1) {
			self.resurrect(store, verifier, tx.raw.clone(), height, time);
		}
	}
}

/// Below this size a transaction paying less than the relay fee is still
/// offered to the free-rate limiter instead of rejected outright.
const FREE_TRANSACTION_SIZE_LIMIT: usize = 1_000;

fn well_formed(tx: &Transaction) -> Result<(), Error> {
	if tx.inputs.is_empty() || tx.outputs.is_empty() {
		return Err(Error::Malformed(TransactionError::Empty));
	}
	let mut total: u64 = 0;
	for output in &tx.outputs {
		if output.value > talon_chain::constants::MAX_MONEY {
			return Err(Error::Malformed(TransactionError::ValueOverflow));
		}
		total = total.checked_add(output.value).ok_or(Error::Malformed(TransactionError::OutputValueOverflow))?;
	}
	if total > talon_chain::constants::MAX_MONEY {
		return Err(Error::Malformed(TransactionError::OutputValueOverflow));
	}
	Ok(())
}

/// Lets later pool transactions resolve inputs spent by earlier pool
/// transactions, the mempool-local half of `DuplexTransactionOutputProvider`.
struct PoolOutputProvider<'a> {
	state: &'a RwLock<State>,
}

impl<'a> TransactionOutputProvider for PoolOutputProvider<'a> {
	fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<talon_chain::TransactionOutput> {
		let state = self.state.read();
		state
			.transaction_index
			.get(&outpoint.hash)
			.and_then(|entry| entry.transaction.outputs.get(outpoint.index as usize).cloned())
	}

	fn is_spent(&self, outpoint: &OutPoint) -> bool {
		self.state.read().transaction_connections.contains_key(outpoint)
	}
}

/// Lets the template builder resolve an input spending another pooled
/// transaction's output, the same way `accept` resolves them internally.
impl TransactionOutputProvider for MemPool {
	fn transaction_output(&self, outpoint: &OutPoint, transaction_index: usize) -> Option<talon_chain::TransactionOutput> {
		PoolOutputProvider { state: &self.state }.transaction_output(outpoint, transaction_index)
	}

	fn is_spent(&self, outpoint: &OutPoint) -> bool {
		PoolOutputProvider { state: &self.state }.is_spent(outpoint)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{TransactionInput, TransactionOutput};
	use talon_chainparams::Network;
	use talon_storage::{BlockHeaderProvider, BlockProvider, TransactionMeta, TransactionMetaProvider, TransactionProvider};
	use talon_storage::best_block::BestBlock;

	struct EmptyStore;

	impl BlockHeaderProvider for EmptyStore {
		fn block_header(&self, _block_ref: talon_storage::BlockRef) -> Option<talon_chain::IndexedBlockHeader> {
			None
		}
		fn block_hash(&self, _number: u32) -> Option<H256> {
			None
		}
		fn block_number(&self, _hash: &H256) -> Option<u32> {
			None
		}
	}
	impl BlockProvider for EmptyStore {
		fn block(&self, _block_ref: talon_storage::BlockRef) -> Option<talon_chain::IndexedBlock> {
			None
		}
	}
	impl TransactionProvider for EmptyStore {
		fn transaction(&self, _hash: &H256) -> Option<Transaction> {
			None
		}
	}
	impl TransactionMetaProvider for EmptyStore {
		fn transaction_meta(&self, _hash: &H256) -> Option<TransactionMeta> {
			None
		}
	}
	impl TransactionOutputProvider for EmptyStore {
		fn transaction_output(&self, _outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
			None
		}
		fn is_spent(&self, _outpoint: &OutPoint) -> bool {
			false
		}
	}
	impl Store for EmptyStore {
		fn best_block(&self) -> BestBlock {
			BestBlock::default()
		}
		fn genesis_hash(&self) -> H256 {
			H256::zero()
		}
	}

	struct AlwaysValid;
	impl SignatureVerifier for AlwaysValid {
		fn verify(&self, _script: &[u8], _transaction: &Transaction, _input_index: usize) -> bool {
			true
		}
	}

	fn sized_tx(extra_outputs: usize) -> Transaction {
		let mut outputs = vec![TransactionOutput { value: 1, script_pubkey: vec![0x51] }];
		outputs.extend((0..extra_outputs).map(|_| TransactionOutput { value: 1, script_pubkey: vec![0x51; 50] }));
		Transaction {
			version: 1,
			inputs: vec![TransactionInput { previous_output: OutPoint::null(), script_sig: vec![0; 200], sequence: 0 }],
			outputs,
			lock_time: 0,
		}
	}

	#[test]
	fn rejects_transactions_with_no_inputs() {
		let pool = MemPool::new(ConsensusParams::new(Network::Unitest));
		let tx = Transaction { version: 1, inputs: Vec::new(), outputs: vec![TransactionOutput::default()], lock_time: 0 };
		let result = pool.accept(&EmptyStore, &AlwaysValid, tx, false, 0, 0);
		assert_eq!(result, Err(Error::Malformed(TransactionError::Empty)));
	}

	#[test]
	fn accepts_a_well_formed_transaction_without_input_checks() {
		let pool = MemPool::new(ConsensusParams::new(Network::Unitest));
		let tx = sized_tx(5);
		let hash = tx.hash();
		assert_eq!(pool.accept(&EmptyStore, &AlwaysValid, tx, false, 0, 0), Ok(hash.clone()));
		assert!(pool.contains(&hash));
		assert_eq!(pool.len(), 1);
	}

	#[test]
	fn evict_removes_every_index_entry() {
		let pool = MemPool::new(ConsensusParams::new(Network::Unitest));
		let tx = sized_tx(5);
		let hash = pool.accept(&EmptyStore, &AlwaysValid, tx, false, 0, 0).unwrap();
		assert!(pool.evict(&hash).is_some());
		assert!(!pool.contains(&hash));
		assert!(pool.is_empty());
	}

	#[test]
	fn rejects_a_duplicate() {
		let pool = MemPool::new(ConsensusParams::new(Network::Unitest));
		let tx = sized_tx(5);
		pool.accept(&EmptyStore, &AlwaysValid, tx.clone(), false, 0, 0).unwrap();
		assert_eq!(pool.accept(&EmptyStore, &AlwaysValid, tx, false, 0, 0), Err(Error::Duplicate));
	}

	#[test]
	fn iter_by_timestamp_returns_admission_order() {
		let pool = MemPool::new(ConsensusParams::new(Network::Unitest));
		let first = sized_tx(1);
		let second = sized_tx(2);
		let first_hash = pool.accept(&EmptyStore, &AlwaysValid, first, false, 0, 10).unwrap();
		let second_hash = pool.accept(&EmptyStore, &AlwaysValid, second, false, 0, 20).unwrap();

		let ordered = pool.iter(OrderingStrategy::ByTimestamp);
		assert_eq!(ordered[0].hash, first_hash);
		assert_eq!(ordered[1].hash, second_hash);
	}

	#[test]
	fn rejects_a_conflicting_spend() {
		let pool = MemPool::new(ConsensusParams::new(Network::Unitest));
		let outpoint = OutPoint { hash: H256::from([9u8; 32]), index: 0 };
		let tx_a = Transaction {
			version: 1,
			inputs: vec![TransactionInput { previous_output: outpoint.clone(), script_sig: vec![0; 200], sequence: 0 }],
			outputs: vec![TransactionOutput { value: 1, script_pubkey: vec![0x51; 50] }],
			lock_time: 0,
		};
		let tx_b = Transaction {
			version: 2,
			inputs: vec![TransactionInput { previous_output: outpoint, script_sig: vec![0; 200], sequence: 0 }],
			outputs: vec![TransactionOutput { value: 1, script_pubkey: vec![0x51; 50] }],
			lock_time: 0,
		};
		pool.accept(&EmptyStore, &AlwaysValid, tx_a, false, 0, 0).unwrap();
		assert_eq!(pool.accept(&EmptyStore, &AlwaysValid, tx_b, false, 0, 0), Err(Error::DoubleSpend));
	}
}
