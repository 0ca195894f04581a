//! `ChainEngine`: the orchestration layer spec §4 describes as
//! `acceptBlock`/`addToBlockIndex`/`connectBlock`/`disconnectBlock`/
//! `reorganize`. Everything below it (`talon_db`) only ever does one
//! mechanical storage step at a time; everything beside it
//! (`talon_verification`) only ever judges whether a block or transaction
//! is valid against a snapshot. This is the only place that decides *when*
//! to call either, and the only place that holds the chain lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use talon_chain::{Block, BlockHeader, OutPoint};
use talon_chainparams::ConsensusParams;
use talon_db::{BlockChainDatabase, ChainUpdate, DiskPosition, KeyValueDatabase, NodeHandle, TxIndexEntry};
use talon_mempool::{p2pkh_hash, MemPool};
use talon_primitives::bigint::U256;
use talon_primitives::hash::H256;
use talon_storage::{BlockOrigin, BlockProvider, BlockRef, DuplexTransactionOutputProvider, SideChainOrigin, TransactionOutputProvider};
use talon_verification::{
	checked_transaction_fee, is_valid_proof_of_work, transaction_sigops, CanonHeader, ChainAcceptor, HeaderAcceptor, SignatureVerifier,
};

use crate::error::Error;

/// The single coarse-grained lock serializing every chain mutation (spec
/// §5): `accept_block` holds it start to finish, and the miner never
/// holds it while hashing, only while submitting a found block through
/// `BlockAcceptor`.
pub struct ChainEngine<T: KeyValueDatabase> {
	db: Arc<BlockChainDatabase<T>>,
	mempool: Arc<MemPool>,
	consensus: ConsensusParams,
	signature_verifier: Arc<dyn SignatureVerifier + Send + Sync>,
	lock: Mutex<()>,
}

impl<T: KeyValueDatabase + 'static> ChainEngine<T> {
	pub fn new(
		db: Arc<BlockChainDatabase<T>>,
		mempool: Arc<MemPool>,
		consensus: ConsensusParams,
		signature_verifier: Arc<dyn SignatureVerifier + Send + Sync>,
	) -> Self {
		ChainEngine { db, mempool, consensus, signature_verifier, lock: Mutex::new(()) }
	}

	pub fn db(&self) -> &Arc<BlockChainDatabase<T>> {
		&self.db
	}

	pub fn mempool(&self) -> &Arc<MemPool> {
		&self.mempool
	}

	pub fn consensus(&self) -> &ConsensusParams {
		&self.consensus
	}

	/// `acceptBlock` (spec §4.3): context-free checks, then `addToBlockIndex`,
	/// then either `connectBlock` or `reorganize` depending on where the
	/// block lands relative to the current best chain. Runs entirely under
	/// the chain lock.
	pub fn accept_block(&self, block: Block) -> Result<(), Error> {
		let _guard = self.lock.lock();

		let hash = block.hash();
		if self.db.handle_of(&hash).is_some() {
			return Err(talon_storage::Error::Duplicate.into());
		}

		let height = self.height_for(&block.header)?;
		self.check_block_structure(&block, height)?;
		self.check_header_context(&block.header, &hash, height)?;

		let new_work = block.header.bits.to_work();
		let origin = self.classify(&block.header, &hash, new_work)?;

		if !self.db.check_disk_space(talon_serialization::serialize(&block).len() as u64)? {
			return Err(Error::DiskSpace);
		}

		let position = self.db.write_block(&block, true)?;
		let handle = self.db.add_to_index(block.header.clone(), position)?;

		match origin {
			BlockOrigin::CanonChain { .. } => self.connect_block(handle, height)?,
			BlockOrigin::SideChainBecomingCanonChain(origin) => self.reorganize(handle, origin)?,
			BlockOrigin::SideChain(_) => {
				tracing::debug!(hash = %hash.to_reversed_str(), height, "indexed a side chain block; not on the best chain");
			}
		}

		Ok(())
	}

	fn height_for(&self, header: &BlockHeader) -> Result<u32, Error> {
		if header.previous_header_hash.is_zero() && self.db.best_handle().is_none() {
			return Ok(0);
		}
		let parent = self.db.handle_of(&header.previous_header_hash).ok_or(talon_storage::Error::UnknownParent)?;
		Ok(self.db.node(parent).height + 1)
	}

	/// Context-free checks (spec §4.3 step 2, "VerifyBlock"): shape of the
	/// block itself, independent of anything already on disk. Contextual
	/// header checks (retarget, median timestamp, checkpoint) run separately
	/// in `check_header_context`; per-transaction contextual checks run
	/// later still, inside `connect_block`, against the state the block
	/// would actually connect to.
	fn check_block_structure(&self, block: &Block, height: u32) -> Result<(), Error> {
		if block.transactions.is_empty() {
			return Err(Error::EmptyBlock);
		}
		if !block.transactions[0].is_coinbase() {
			return Err(Error::MissingCoinbase);
		}
		if let Some(index) = block.transactions.iter().skip(1).position(|tx| tx.is_coinbase()) {
			return Err(Error::DuplicateCoinbase(index + 1));
		}
		if block.merkle_root() != block.header.merkle_root {
			return Err(Error::BadMerkleRoot);
		}
		// The genesis block is hardcoded per network (spec §4.2), not mined
		// through the normal nonce search, so its hash is never checked
		// against its own target — only non-genesis blocks need to prove
		// the work that earned them their place in the chain.
		if height != 0 && !is_valid_proof_of_work(block.header.bits, &block.hash()) {
			return Err(talon_verification::Error::BadProofOfWork.into());
		}

		let size: usize = talon_serialization::serialize(block).len();
		let sigops: usize = block.transactions.iter().map(transaction_sigops).sum();
		if size > self.consensus.max_transaction_size || sigops > self.consensus.max_block_sigops {
			return Err(talon_verification::Error::OversizedOrExcessiveSigops.into());
		}

		for (index, tx) in block.transactions.iter().enumerate() {
			if !tx.is_final_in_block(height, block.header.time) {
				return Err(talon_verification::Error::NonFinal(index).into());
			}
		}

		Ok(())
	}

	/// Contextual header checks (spec §4.3 steps 3, 4, 6: retarget rule,
	/// median timestamp, checkpoint), run against whatever is already
	/// indexed for this block's parent. Applied to every accepted block
	/// before it is written to disk or added to the index — regardless of
	/// whether it lands on the best chain, extends a side chain, or triggers
	/// a reorg — so a block that fails here is never persisted (spec §4.3
	/// "Failure semantics").
	fn check_header_context(&self, header: &BlockHeader, hash: &H256, height: u32) -> Result<(), Error> {
		let indexed = talon_chain::IndexedBlockHeader::new(hash.clone(), header.clone());
		let canon = CanonHeader::new(&indexed);
		HeaderAcceptor::new(self.db.as_ref(), &self.consensus, canon, height).check()?;
		Ok(())
	}

	/// `addToBlockIndex`'s classification step: where does this block sit
	/// relative to the current best chain? Mirrors the teacher's
	/// `block_origin`, simplified because `BlockIndex` already tracks
	/// `cumulative_work` per node, so the new branch's prospective work is
	/// just `parent.cumulative_work + new_work` rather than a fresh sum
	/// over every ancestor header.
	fn classify(&self, header: &BlockHeader, hash: &H256, new_work: U256) -> Result<BlockOrigin, Error> {
		if header.previous_header_hash.is_zero() && self.db.best_handle().is_none() {
			return Ok(BlockOrigin::CanonChain { block_number: 0 });
		}

		let best = self.db.best_block();
		if best.hash == header.previous_header_hash {
			return Ok(BlockOrigin::CanonChain { block_number: best.number + 1 });
		}

		let parent_handle = self.db.handle_of(&header.previous_header_hash).ok_or(talon_storage::Error::UnknownParent)?;
		let best_handle = self.db.best_handle().expect("best_block().hash resolved, so its handle exists");

		let fork_handle = self.fork_point(parent_handle, best_handle);
		let fork_node = self.db.node(fork_handle);

		let mut ancestors = self.ancestor_headers(parent_handle, fork_handle);
		ancestors.push(talon_chain::IndexedBlockHeader::new(hash.clone(), header.clone()));

		let decanonized = self
			.ancestor_headers(best_handle, fork_handle)
			.into_iter()
			.rev()
			.map(|header| header.hash)
			.collect();

		let cumulative_work = self.db.node(parent_handle).cumulative_work + new_work;
		let best_work = self.db.node(best_handle).cumulative_work;

		let origin = SideChainOrigin {
			ancestors,
			fork_point_number: fork_node.height,
			fork_point_hash: fork_node.hash.clone(),
			decanonized,
		};

		if cumulative_work > best_work {
			Ok(BlockOrigin::SideChainBecomingCanonChain(origin))
		} else {
			Ok(BlockOrigin::SideChain(origin))
		}
	}

	/// Headers strictly between `fork_handle` (exclusive) and `handle`
	/// (inclusive), oldest first.
	fn ancestor_headers(&self, handle: NodeHandle, fork_handle: NodeHandle) -> Vec<talon_chain::IndexedBlockHeader> {
		let mut out = Vec::new();
		let mut cursor = handle;
		while cursor != fork_handle {
			let node = self.db.node(cursor);
			out.push(talon_chain::IndexedBlockHeader::new(node.hash.clone(), node.header.clone()));
			cursor = node.parent.expect("walk reaches the fork point before running off the genesis block");
		}
		out.reverse();
		out
	}

	/// Lowest common ancestor of two indexed nodes, found by walking the
	/// deeper side up until both are at the same height, then walking both
	/// up together.
	fn fork_point(&self, mut a: NodeHandle, mut b: NodeHandle) -> NodeHandle {
		loop {
			let node_a = self.db.node(a);
			let node_b = self.db.node(b);
			if node_a.hash == node_b.hash {
				return a;
			}
			if node_a.height > node_b.height {
				a = node_a.parent.expect("two indexed chains converge at or before genesis");
			} else if node_b.height > node_a.height {
				b = node_b.parent.expect("two indexed chains converge at or before genesis");
			} else {
				a = node_a.parent.expect("two indexed chains converge at or before genesis");
				b = node_b.parent.expect("two indexed chains converge at or before genesis");
			}
		}
	}

	/// `connectBlock` (spec §4.3 step 5 / §4.1 `connectInputs`): full
	/// contextual verification (the header checks were already gated on by
	/// `check_header_context` before this block was persisted; re-running
	/// them here is cheap and catches any block reaching this path some
	/// other way, such as during `reorganize`), then the index-level
	/// bookkeeping (marking spends, crediting/debiting addresses, inserting
	/// `TxIndex` entries) as one `ChainUpdate`, committed atomically.
	fn connect_block(&self, handle: NodeHandle, height: u32) -> Result<(), Error> {
		let node = self.db.node(handle);
		let indexed_block = self
			.db
			.block(BlockRef::Hash(node.hash.clone()))
			.expect("just written and indexed block must be readable back");

		let canon = talon_verification::CanonBlock::new(&indexed_block);
		let acceptor = ChainAcceptor::new(
			self.db.as_ref(),
			self.db.as_ref(),
			self.db.as_ref(),
			self.signature_verifier.as_ref(),
			&self.consensus,
			canon,
			height,
		);
		if let Err(err) = acceptor.check() {
			self.db.record_best_invalid_work(node.cumulative_work)?;
			return Err(err.into());
		}

		let dup = DuplexTransactionOutputProvider::new(self.db.as_ref(), &indexed_block);
		let mut update = ChainUpdate::new();
		let mut scratch: HashMap<H256, TxIndexEntry> = HashMap::new();
		let mut fees_total: u64 = 0;

		for (tx_index, tx) in indexed_block.transactions.iter().enumerate() {
			let is_coinbase = tx_index == 0;

			if !is_coinbase {
				let fee = checked_transaction_fee(&dup, tx_index, &tx.raw)
					.map_err(|err| Error::from(talon_verification::Error::BadTransaction(err)))?;
				fees_total = fees_total
					.checked_add(fee)
					.ok_or_else(|| Error::from(talon_verification::Error::CoinbaseOverspend))?;

				for input in &tx.raw.inputs {
					let mut entry = scratch
						.remove(&input.previous_output.hash)
						.or_else(|| self.db.tx_index(&input.previous_output.hash))
						.ok_or_else(|| {
							Error::from(talon_verification::Error::InputsUnavailable(
								tx_index,
								talon_verification::TransactionError::Input(0),
							))
						})?;

					let spender = DiskPosition::new(node.file, node.offset, tx_index as u32);
					if !entry.mark_spent(input.previous_output.index as usize, spender) {
						return Err(talon_verification::Error::DoubleSpend(tx_index).into());
					}
					scratch.insert(input.previous_output.hash.clone(), entry);

					if let Some(output) = dup.transaction_output(&input.previous_output, tx_index) {
						if let Some(sender) = p2pkh_hash(&output.script_pubkey) {
							update = update.debit(sender, input.previous_output.clone());
						}
					}
				}
			}

			let position = DiskPosition::new(node.file, node.offset, tx_index as u32);
			let entry = TxIndexEntry::new(position, height, is_coinbase, tx.raw.outputs.len());
			scratch.insert(tx.hash.clone(), entry);

			for (output_index, output) in tx.raw.outputs.iter().enumerate() {
				if let Some(recipient) = p2pkh_hash(&output.script_pubkey) {
					update = update.credit(recipient, OutPoint { hash: tx.hash.clone(), index: output_index as u32 });
				}
			}
		}

		let coinbase_value = indexed_block.transactions[0].raw.total_spends();
		let subsidy = self.consensus.subsidy(height);
		if coinbase_value > subsidy.saturating_add(fees_total) {
			return Err(talon_verification::Error::CoinbaseOverspend.into());
		}

		for (hash, entry) in scratch {
			update = update.upsert_tx_index(hash, entry);
		}
		update = update.set_best_chain(handle);
		if let Some(parent) = node.parent {
			update = update.link_next(parent, handle);
		}

		self.db.commit_chain_update(update)?;
		self.mempool.on_connected(&indexed_block);
		Ok(())
	}

	/// `disconnectBlock`: the inverse of `connect_block` — unmarks spent
	/// outputs, removes this block's own `TxIndex` entries and address
	/// credits/debits, and puts its non-coinbase transactions back in the
	/// mempool.
	fn disconnect_block(&self, handle: NodeHandle) -> Result<(), Error> {
		let node = self.db.node(handle);
		let indexed_block = self
			.db
			.block(BlockRef::Hash(node.hash.clone()))
			.expect("a connected block must still be readable");
		let parent = node.parent.expect("the genesis block is never disconnected");

		let mut update = ChainUpdate::new();
		let mut scratch: HashMap<H256, TxIndexEntry> = HashMap::new();

		for tx in &indexed_block.transactions {
			if !tx.raw.is_coinbase() {
				for input in &tx.raw.inputs {
					let mut entry = scratch
						.remove(&input.previous_output.hash)
						.or_else(|| self.db.tx_index(&input.previous_output.hash))
						.expect("an input spent while connected still has a TxIndex entry");
					entry.mark_unspent(input.previous_output.index as usize);
					scratch.insert(input.previous_output.hash.clone(), entry);

					if let Some(output) = self.db.transaction_output(&input.previous_output, usize::max_value()) {
						if let Some(sender) = p2pkh_hash(&output.script_pubkey) {
							update = update.undebit(sender, input.previous_output.clone());
						}
					}
				}
			}

			for (output_index, output) in tx.raw.outputs.iter().enumerate() {
				if let Some(recipient) = p2pkh_hash(&output.script_pubkey) {
					update = update.uncredit(recipient, OutPoint { hash: tx.hash.clone(), index: output_index as u32 });
				}
			}
			update = update.delete_tx_index(tx.hash.clone());
		}

		for (hash, entry) in scratch {
			update = update.upsert_tx_index(hash, entry);
		}
		update = update.unlink_next(parent).set_best_chain(parent);

		self.db.commit_chain_update(update)?;

		let parent_node = self.db.node(parent);
		self.mempool.on_disconnected(
			self.db.as_ref(),
			self.signature_verifier.as_ref(),
			&indexed_block,
			parent_node.height,
			parent_node.header.time,
		);
		Ok(())
	}

	/// `reorganize`: disconnects the current best chain down to the fork
	/// point, then connects the winning branch from the fork point up to
	/// the new tip. A failure partway through connecting the new branch is
	/// not rolled back (the single chain lock means no other reader can
	/// observe the partial state mid-reorg, and the failing block itself
	/// never becomes best); it is simply surfaced as `InvalidChainFound`,
	/// leaving the best chain at the last block that did connect.
	fn reorganize(&self, new_tip: NodeHandle, origin: SideChainOrigin) -> Result<(), Error> {
		let mut cursor = self.db.best_handle().expect("reorganize only runs once a best chain exists");
		while self.db.node(cursor).hash != origin.fork_point_hash {
			let parent = self.db.node(cursor).parent.expect("walk reaches the fork point before genesis");
			self.disconnect_block(cursor)?;
			cursor = parent;
		}

		// `classify` appends the new block's own header to `ancestors`
		// (matching `SideChainOrigin::ancestors`' doc: fork point exclusive,
		// new block inclusive), and the new block is already indexed by now,
		// so every entry here resolves through `handle_of` without needing
		// `new_tip` threaded in separately.
		let connect_handles: Vec<NodeHandle> = origin
			.ancestors
			.iter()
			.map(|header| self.db.handle_of(&header.hash).expect("ancestors were read back from the index"))
			.collect();
		debug_assert_eq!(connect_handles.last(), Some(&new_tip));

		for handle in connect_handles {
			let height = self.db.node(handle).height;
			if let Err(err) = self.connect_block(handle, height) {
				tracing::warn!(%err, "reorganization failed partway through connecting the winning branch");
				return Err(Error::InvalidChainFound);
			}
		}

		Ok(())
	}
}

impl<T: KeyValueDatabase + 'static> talon_miner::BlockAcceptor for ChainEngine<T> {
	fn accept_block(&self, block: Block) -> Result<(), String> {
		ChainEngine::accept_block(self, block).map_err(|err| err.to_string())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{Transaction, TransactionInput, TransactionOutput};
	use talon_chainparams::Network;
	use talon_db::block_file::BlockFile;
	use talon_db::kv::MemoryDatabase;

	struct AlwaysValid;
	impl talon_verification::SignatureVerifier for AlwaysValid {
		fn verify(&self, _script: &[u8], _transaction: &Transaction, _input_index: usize) -> bool {
			true
		}
	}

	fn engine(consensus: ConsensusParams) -> (ChainEngine<MemoryDatabase>, tempfile::TempDir) {
		let dir = tempfile::tempdir().unwrap();
		let block_file = BlockFile::open(dir.path()).unwrap();
		let db = Arc::new(BlockChainDatabase::open(MemoryDatabase::new(), block_file).unwrap());
		let mempool = Arc::new(MemPool::new(consensus.clone()));
		let verifier: Arc<dyn SignatureVerifier + Send + Sync> = Arc::new(AlwaysValid);
		(ChainEngine::new(db, mempool, consensus, verifier), dir)
	}

	/// Brute-forces a nonce satisfying `block.header.bits`'s raw target.
	/// `Unitest`'s permissive `pow_limit` (half the hash space) makes this a
	/// handful of tries rather than a real proof-of-work search.
	fn mined(mut block: Block) -> Block {
		loop {
			if is_valid_proof_of_work(block.header.bits, &block.hash()) {
				return block;
			}
			block.header.nonce += 1;
		}
	}

	fn coinbase_block(consensus: &ConsensusParams, parent: H256, time: u32, reward: u64) -> Block {
		let coinbase = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase(b"height-marker".to_vec())],
			outputs: vec![TransactionOutput { value: reward, script_pubkey: Vec::new() }],
			lock_time: 0,
		};
		let merkle_root = talon_chain::merkle_root(&[coinbase.hash()]);
		mined(Block {
			header: BlockHeader {
				version: 1,
				previous_header_hash: parent,
				merkle_root,
				time,
				bits: consensus.proof_of_work_limit(),
				nonce: 0,
			},
			transactions: vec![coinbase],
		})
	}

	/// End-to-end scenario 1 (spec §8): an empty store plus the network's
	/// genesis block becomes a one-block best chain at height 0. This is
	/// also the regression case for the genesis proof-of-work carve-out in
	/// `check_block_structure`: `Mainnet`'s `pow_limit` is tight enough that
	/// a deterministic, un-mined genesis would fail the raw hash check if it
	/// were held to the same standard as every other block.
	#[test]
	fn cold_start_accepts_the_hardcoded_genesis_block() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let (engine, _dir) = engine(consensus.clone());
		let genesis = consensus.genesis_block();
		let genesis_hash = genesis.hash();

		engine.accept_block(genesis).unwrap();

		let best = engine.db().best_block();
		assert_eq!(best.hash, genesis_hash);
		assert_eq!(best.number, 0);
	}

	#[test]
	fn accepting_the_same_block_twice_is_rejected_as_duplicate() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let (engine, _dir) = engine(consensus.clone());
		let genesis = consensus.genesis_block();

		engine.accept_block(genesis.clone()).unwrap();
		assert_eq!(engine.accept_block(genesis), Err(talon_storage::Error::Duplicate.into()));
	}

	/// End-to-end scenario 2 (spec §8): accepting two blocks in sequence on
	/// top of genesis extends the best chain and links each parent's `next`.
	#[test]
	fn two_block_extension_advances_the_best_chain_and_links_next() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let (engine, _dir) = engine(consensus.clone());
		let genesis = consensus.genesis_block();
		let genesis_hash = genesis.hash();
		engine.accept_block(genesis).unwrap();

		let b1 = coinbase_block(&consensus, genesis_hash.clone(), 1, consensus.subsidy(1));
		let b1_hash = b1.hash();
		engine.accept_block(b1).unwrap();

		let b2 = coinbase_block(&consensus, b1_hash.clone(), 2, consensus.subsidy(2));
		let b2_hash = b2.hash();
		engine.accept_block(b2).unwrap();

		let best = engine.db().best_block();
		assert_eq!(best.hash, b2_hash);
		assert_eq!(best.number, 2);

		let genesis_handle = engine.db().handle_of(&genesis_hash).unwrap();
		let b1_handle = engine.db().handle_of(&b1_hash).unwrap();
		assert_eq!(engine.db().node(genesis_handle).next, Some(b1_handle));
		assert_eq!(engine.db().node(b1_handle).next, engine.db().handle_of(&b2_hash));
	}

	/// End-to-end scenario 3 (spec §8): a heavier two-branch fork wins the
	/// reorg, and the losing branch's root loses its `next` link.
	#[test]
	fn reorganize_switches_the_best_chain_to_the_heavier_branch() {
		let consensus = ConsensusParams::new(Network::Unitest);
		let (engine, _dir) = engine(consensus.clone());
		let genesis = consensus.genesis_block();
		let genesis_hash = genesis.hash();
		engine.accept_block(genesis).unwrap();

		let a1 = coinbase_block(&consensus, genesis_hash.clone(), 10, consensus.subsidy(1));
		let a1_hash = a1.hash();
		engine.accept_block(a1).unwrap();
		let a2 = coinbase_block(&consensus, a1_hash.clone(), 11, consensus.subsidy(2));
		engine.accept_block(a2).unwrap();

		let b1 = coinbase_block(&consensus, genesis_hash.clone(), 20, consensus.subsidy(1));
		let b1_hash = b1.hash();
		engine.accept_block(b1).unwrap();
		let b2 = coinbase_block(&consensus, b1_hash.clone(), 21, consensus.subsidy(2));
		let b2_hash = b2.hash();
		engine.accept_block(b2).unwrap();
		let b3 = coinbase_block(&consensus, b2_hash.clone(), 22, consensus.subsidy(3));
		let b3_hash = b3.hash();
		engine.accept_block(b3).unwrap();

		let best = engine.db().best_block();
		assert_eq!(best.hash, b3_hash);
		assert_eq!(best.number, 3);

		let genesis_handle = engine.db().handle_of(&genesis_hash).unwrap();
		let a1_handle = engine.db().handle_of(&a1_hash).unwrap();
		let b1_handle = engine.db().handle_of(&b1_hash).unwrap();
		assert_eq!(engine.db().node(a1_handle).next, None);
		assert_eq!(engine.db().node(genesis_handle).next, Some(b1_handle));
	}

	/// A block extending the current best chain with a checkpoint-violating
	/// hash is rejected by `check_header_context` before `write_block`/
	/// `add_to_index` run, so it never shows up in the index at all.
	#[test]
	fn checkpoint_violation_on_the_canonical_path_is_rejected_before_persisting() {
		let mut consensus = ConsensusParams::new(Network::Unitest);
		let genesis = consensus.genesis_block();
		let genesis_hash = genesis.hash();

		let b1 = coinbase_block(&consensus, genesis_hash.clone(), 10, consensus.subsidy(1));
		let b1_hash = b1.hash();
		consensus.checkpoints.insert(1, H256::from([0xffu8; 32]));

		let (engine, _dir) = engine(consensus);
		engine.accept_block(genesis).unwrap();

		assert!(engine.accept_block(b1).is_err());
		assert!(engine.db().handle_of(&b1_hash).is_none());

		let best = engine.db().best_block();
		assert_eq!(best.hash, genesis_hash);
		assert_eq!(best.number, 0);
	}

	/// Same check, but for a block that lands on a side chain rather than
	/// extending the best chain: `BlockOrigin::SideChain` used to only log
	/// and persist such blocks unconditionally. It must be rejected, and
	/// left out of the index, exactly like a canonical-path failure.
	#[test]
	fn checkpoint_violation_on_a_side_chain_block_is_rejected_before_persisting() {
		let mut consensus = ConsensusParams::new(Network::Unitest);
		let genesis = consensus.genesis_block();
		let genesis_hash = genesis.hash();

		let a1 = coinbase_block(&consensus, genesis_hash.clone(), 10, consensus.subsidy(1));
		let a1_hash = a1.hash();
		let b1 = coinbase_block(&consensus, genesis_hash.clone(), 20, consensus.subsidy(1));
		let b1_hash = b1.hash();
		// Pin height 1 to a1's hash: b1 carries equal work and stays a side
		// chain, but must still fail the checkpoint it doesn't match.
		consensus.checkpoints.insert(1, a1_hash.clone());

		let (engine, _dir) = engine(consensus);
		engine.accept_block(genesis).unwrap();
		engine.accept_block(a1).unwrap();

		assert!(engine.accept_block(b1).is_err());
		assert!(engine.db().handle_of(&b1_hash).is_none());

		let best = engine.db().best_block();
		assert_eq!(best.hash, a1_hash);
		assert_eq!(best.number, 1);
	}
}
