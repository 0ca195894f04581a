use std::collections::{HashMap, HashSet};

use talon_chain::constants::{MAX_BLOCK_SIGOPS, MAX_BLOCK_SIZE_GEN};
use talon_chain::{IndexedTransaction, OutPoint, Transaction, TransactionInput, TransactionOutput};
use talon_chainparams::ConsensusParams;
use talon_primitives::compact::Compact;
use talon_primitives::hash::H256;
use talon_mempool::{MemPool, PooledEntry};
use talon_storage::{DuplexTransactionOutputProvider, Store, TransactionOutputProvider};
use talon_verification::{checked_transaction_fee, transaction_sigops, work_required};

/// Historical Bitcoin "AllowFree" cutoff: above this priority a transaction
/// may skip the minimum relay fee while the block still has room (§4.5
/// step 3). Priority units are satoshi-confirmations per byte.
const FREE_PRIORITY_THRESHOLD: u64 = 100_000_000 * 144 / 250;

/// Below this many collected bytes, a transaction is free-eligible
/// regardless of priority.
const FREE_TRANSACTION_BLOCK_SIZE: usize = 4_000;

/// Byte/sigop budget the template starts at before the first mempool
/// transaction is even considered, matching §4.5 step 3's literal
/// `blockSize = 1000`/`sigops = 100`.
const INITIAL_BLOCK_SIZE: usize = 1_000;
const INITIAL_SIGOPS: usize = 100;

const BLOCK_VERSION: u32 = 1;

/// A candidate block, not yet hashed. `to_block` pairs it with a nonce for
/// the hasher to try.
pub struct BlockTemplate {
	pub version: u32,
	pub previous_header_hash: H256,
	pub time: u32,
	pub bits: Compact,
	pub height: u32,
	pub coinbase: IndexedTransaction,
	/// Everything but the coinbase, already ordered so that a transaction
	/// never appears before one of its own unconfirmed inputs.
	pub transactions: Vec<IndexedTransaction>,
}

impl BlockTemplate {
	pub fn to_block(&self, nonce: u32) -> talon_chain::Block {
		let mut hashes = Vec::with_capacity(self.transactions.len() + 1);
		hashes.push(self.coinbase.hash.clone());
		hashes.extend(self.transactions.iter().map(|tx| tx.hash.clone()));
		let merkle_root = talon_chain::merkle_root(&hashes);

		let mut transactions = Vec::with_capacity(hashes.len());
		transactions.push(self.coinbase.raw.clone());
		transactions.extend(self.transactions.iter().map(|tx| tx.raw.clone()));

		talon_chain::Block {
			header: talon_chain::BlockHeader {
				version: self.version,
				previous_header_hash: self.previous_header_hash.clone(),
				merkle_root,
				time: self.time,
				bits: self.bits,
				nonce,
			},
			transactions,
		}
	}
}

/// Builds `BlockTemplate`s out of the confirmed chain tip and a mempool
/// snapshot (§4.5). Mirrors the teacher's `BlockAssembler`: a plain struct
/// holding the block's size/sigop ceilings, with the ordering and
/// inclusion policy done in `create_new_block`.
pub struct TemplateBuilder {
	pub max_block_size: usize,
	pub max_block_sigops: usize,
}

impl Default for TemplateBuilder {
	fn default() -> Self {
		TemplateBuilder {
			max_block_size: MAX_BLOCK_SIZE_GEN,
			max_block_sigops: MAX_BLOCK_SIGOPS,
		}
	}
}

/// A mempool transaction not yet queued because one or more of its inputs
/// spend another still-unconfirmed, not-yet-included transaction. Its
/// priority is computed once, up front, counting only the inputs that
/// were already resolvable against the confirmed chain — an input that
/// depends on a sibling orphan never retroactively contributes weight,
/// matching the reference miner's behavior.
struct Orphan {
	entry: PooledEntry,
	priority: u64,
	depends_on: HashSet<H256>,
}

struct Candidate {
	entry: PooledEntry,
	priority: u64,
}

/// Resolves an input against transactions already included earlier in the
/// template under construction, the scratch pool named in §4.5 step 3.
struct ScratchProvider<'a> {
	included: &'a [IndexedTransaction],
}

impl<'a> TransactionOutputProvider for ScratchProvider<'a> {
	fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
		self.included
			.iter()
			.find(|tx| tx.hash == outpoint.hash)
			.and_then(|tx| tx.raw.outputs.get(outpoint.index as usize).cloned())
	}

	fn is_spent(&self, _outpoint: &OutPoint) -> bool {
		false
	}
}

impl TemplateBuilder {
	pub fn create_new_block<S: Store>(
		&self,
		store: &S,
		mempool: &MemPool,
		payout_script: Vec<u8>,
		time: u32,
		consensus: &ConsensusParams,
	) -> BlockTemplate {
		let best = store.best_block();
		let previous_header_hash = best.hash;
		let height = best.number + 1;
		let bits = work_required(previous_header_hash.clone(), height, store, consensus);

		let (mut queue, mut orphans, mut dependers) = self.prioritize(store, mempool, height, time);
		queue.sort_by(|a, b| b.priority.cmp(&a.priority));

		let mut included: Vec<IndexedTransaction> = Vec::new();
		let mut block_size = INITIAL_BLOCK_SIZE;
		let mut sigops = INITIAL_SIGOPS;
		let mut fees: u64 = 0;

		while !queue.is_empty() {
			let candidate = queue.remove(0);
			let PooledEntry { hash, transaction, size, .. } = candidate.entry;

			let tx_sigops = transaction_sigops(&transaction);
			if block_size + size >= self.max_block_size || sigops + tx_sigops >= self.max_block_sigops {
				continue;
			}

			let allow_free =
				block_size + size < FREE_TRANSACTION_BLOCK_SIZE || candidate.priority > FREE_PRIORITY_THRESHOLD;
			let required_fee = if allow_free { 0 } else { consensus.min_relay_fee(size) };

			let scratch = ScratchProvider { included: &included };
			let dup = DuplexTransactionOutputProvider::new(store.as_transaction_output_provider(), &scratch);
			let fee = match checked_transaction_fee(&dup, usize::max_value(), &transaction) {
				Ok(fee) => fee,
				Err(_) => continue,
			};
			if fee < required_fee {
				continue;
			}

			block_size += size;
			sigops += tx_sigops;
			fees = fees.saturating_add(fee);
			included.push(IndexedTransaction::new(hash.clone(), transaction));

			if let Some(dependent_hashes) = dependers.remove(&hash) {
				let mut promoted = false;
				for dependent_hash in dependent_hashes {
					if let Some(orphan) = orphans.get_mut(&dependent_hash) {
						orphan.depends_on.remove(&hash);
						if orphan.depends_on.is_empty() {
							let orphan = orphans.remove(&dependent_hash).expect("just matched above");
							queue.push(Candidate { entry: orphan.entry, priority: orphan.priority });
							promoted = true;
						}
					}
				}
				if promoted {
					queue.sort_by(|a, b| b.priority.cmp(&a.priority));
				}
			}
		}

		let reward = consensus.subsidy(height) + fees;
		let coinbase = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase(coinbase_script_sig(bits))],
			outputs: vec![TransactionOutput { value: reward, script_pubkey: payout_script }],
			lock_time: 0,
		};

		BlockTemplate {
			version: BLOCK_VERSION,
			previous_header_hash,
			time,
			bits,
			height,
			coinbase: IndexedTransaction::from_raw(coinbase),
			transactions: included,
		}
	}

	/// First pass over the mempool snapshot (§4.5 step 2): ranks every
	/// transaction whose inputs are already fully resolvable against the
	/// confirmed chain, and files the rest as orphans keyed by whichever
	/// still-unconfirmed parents they are missing.
	fn prioritize<S: Store>(
		&self,
		store: &S,
		mempool: &MemPool,
		height: u32,
		time: u32,
	) -> (Vec<Candidate>, HashMap<H256, Orphan>, HashMap<H256, Vec<H256>>) {
		let mut queue = Vec::new();
		let mut orphans: HashMap<H256, Orphan> = HashMap::new();
		let mut dependers: HashMap<H256, Vec<H256>> = HashMap::new();

		for entry in mempool.entries() {
			if !entry.transaction.is_final_in_block(height, time) {
				continue;
			}

			let mut weighted: u128 = 0;
			let mut depends_on: HashSet<H256> = HashSet::new();
			for input in &entry.transaction.inputs {
				match store.transaction_meta(&input.previous_output.hash) {
					Some(meta) => {
						if let Some(output) = store.transaction_output(&input.previous_output, usize::max_value()) {
							let confirmations = u128::from(height.saturating_sub(meta.height()));
							weighted += u128::from(output.value) * confirmations;
						}
					}
					None => {
						depends_on.insert(input.previous_output.hash.clone());
					}
				}
			}
			let priority = (weighted / (entry.size.max(1) as u128)) as u64;

			if depends_on.is_empty() {
				queue.push(Candidate { entry, priority });
			} else {
				for parent in &depends_on {
					dependers.entry(parent.clone()).or_insert_with(Vec::new).push(entry.hash.clone());
				}
				orphans.insert(entry.hash.clone(), Orphan { entry, priority, depends_on });
			}
		}

		(queue, orphans, dependers)
	}
}

/// Coinbase `scriptSig`: the previous block's compact target followed by a
/// nonce of our own, matching §4.5 step 1's `bits || extraNonce`. This is
/// raw bytes rather than a pushdata-encoded script, since building one
/// needs the script interpreter this project leaves out (§1).
fn coinbase_script_sig(bits: Compact) -> Vec<u8> {
	let mut script_sig = Vec::with_capacity(8);
	script_sig.extend_from_slice(&u32::from(bits).to_le_bytes());
	script_sig.extend_from_slice(&0u32.to_le_bytes());
	script_sig
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{BlockHeader, IndexedBlockHeader, OutPoint, TransactionInput, TransactionOutput};
	use talon_chainparams::Network;
	use talon_storage::best_block::BestBlock;
	use talon_storage::{BlockHeaderProvider, BlockProvider, BlockRef, TransactionMeta, TransactionMetaProvider, TransactionProvider};
	use talon_verification::SignatureVerifier;

	struct FixtureStore {
		best: BestBlock,
		metas: HashMap<H256, TransactionMeta>,
		outputs: HashMap<OutPoint, TransactionOutput>,
	}

	impl BlockHeaderProvider for FixtureStore {
		fn block_header(&self, _block_ref: BlockRef) -> Option<IndexedBlockHeader> {
			None
		}
		fn block_hash(&self, _number: u32) -> Option<H256> {
			None
		}
		fn block_number(&self, _hash: &H256) -> Option<u32> {
			None
		}
	}
	impl BlockProvider for FixtureStore {
		fn block(&self, _block_ref: BlockRef) -> Option<talon_chain::IndexedBlock> {
			None
		}
	}
	impl TransactionProvider for FixtureStore {
		fn transaction(&self, _hash: &H256) -> Option<Transaction> {
			None
		}
	}
	impl TransactionMetaProvider for FixtureStore {
		fn transaction_meta(&self, hash: &H256) -> Option<TransactionMeta> {
			self.metas.get(hash).cloned()
		}
	}
	impl TransactionOutputProvider for FixtureStore {
		fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
			self.outputs.get(outpoint).cloned()
		}
		fn is_spent(&self, _outpoint: &OutPoint) -> bool {
			false
		}
	}
	impl Store for FixtureStore {
		fn best_block(&self) -> BestBlock {
			self.best.clone()
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

	fn funded_tx(value: u64, extra_outputs: usize) -> (Transaction, OutPoint) {
		let funding_outpoint = OutPoint { hash: H256::from([7u8; 32]), index: 0 };
		let mut outputs = vec![TransactionOutput { value, script_pubkey: vec![0x51] }];
		outputs.extend((0..extra_outputs).map(|_| TransactionOutput { value: 1, script_pubkey: vec![0x51; 40] }));
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput { previous_output: funding_outpoint.clone(), script_sig: vec![0; 200], sequence: 0 }],
			outputs,
			lock_time: 0,
		};
		(tx, funding_outpoint)
	}

	#[test]
	fn builds_an_empty_template_with_no_mempool_transactions() {
		let store = FixtureStore { best: BestBlock { number: 5, hash: H256::from([1u8; 32]) }, metas: HashMap::new(), outputs: HashMap::new() };
		let consensus = ConsensusParams::new(Network::Unitest);
		let mempool = MemPool::new(consensus.clone());

		let template = TemplateBuilder::default().create_new_block(&store, &mempool, vec![0x51], 100, &consensus);

		assert_eq!(template.height, 6);
		assert!(template.transactions.is_empty());
		assert_eq!(template.coinbase.raw.outputs[0].value, consensus.subsidy(6));
	}

	#[test]
	fn includes_a_funded_mempool_transaction_and_its_fee() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let (tx, funding_outpoint) = funded_tx(1_000_000, 0);
		let tx_hash = tx.hash();

		let mut outputs = HashMap::new();
		outputs.insert(funding_outpoint.clone(), TransactionOutput { value: 1_100_000, script_pubkey: vec![0x51] });
		let mut metas = HashMap::new();
		metas.insert(funding_outpoint.hash.clone(), TransactionMeta::new(1, 1));
		let store = FixtureStore { best: BestBlock { number: 10, hash: H256::from([2u8; 32]) }, metas, outputs };

		let mempool = MemPool::new(consensus.clone());
		mempool.accept(&store, &AlwaysValid, tx, false, 11, 100).unwrap();

		let template = TemplateBuilder::default().create_new_block(&store, &mempool, vec![0x51], 100, &consensus);

		assert_eq!(template.transactions.len(), 1);
		assert_eq!(template.transactions[0].hash, tx_hash);
		let expected_fee = 100_000;
		assert_eq!(template.coinbase.raw.outputs[0].value, consensus.subsidy(11) + expected_fee);
	}

	#[test]
	fn excludes_a_transaction_whose_input_is_missing() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let (tx, _funding_outpoint) = funded_tx(1_000_000, 0);

		let store = FixtureStore { best: BestBlock { number: 10, hash: H256::from([3u8; 32]) }, metas: HashMap::new(), outputs: HashMap::new() };
		let mempool = MemPool::new(consensus.clone());
		// Admit the transaction without input checks, simulating a
		// confirmed output that later dropped out of the store (e.g. a
		// pruned ancestor); the template builder must still skip it.
		mempool.accept(&store, &AlwaysValid, tx, false, 11, 100).unwrap();

		let template = TemplateBuilder::default().create_new_block(&store, &mempool, vec![0x51], 100, &consensus);

		assert!(template.transactions.is_empty());
	}
}
