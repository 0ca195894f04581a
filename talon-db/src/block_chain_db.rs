//! Ties `BlockFile`, `BlockIndex` and the persistent `TxIndex` records
//! together behind the `talon_storage::Store` contract, and exposes the
//! lower-level primitives `talon_engine::ChainEngine` orchestrates
//! (`acceptBlock`/`connectBlock`/`reorganize` all live one layer up; this
//! crate only ever does one mechanical step at a time).

use std::sync::Arc;

use talon_chain::{Block, IndexedBlock, IndexedBlockHeader, IndexedTransaction, OutPoint, Transaction, TransactionOutput};
use talon_primitives::bigint::U256;
use talon_primitives::hash::{H160, H256};
use talon_storage::{
	BestBlock, BlockHeaderProvider, BlockProvider, BlockRef, TransactionMeta, TransactionMetaProvider,
	TransactionOutputProvider, TransactionProvider,
};

use crate::block_file::{self, BlockFile};
use crate::block_index::{BlockIndex, IndexNode, NodeHandle};
use crate::disk_position::DiskPosition;
use crate::kv::{self, BlockIndexRecord, Key, KeyValueDatabase, Value, KEY_HASH_BEST_CHAIN};
use crate::tx_index::TxIndexEntry;

use display_derive::Display;
use parking_lot::RwLock;

#[derive(Debug, Display, PartialEq, Clone)]
pub enum Error {
	#[display(fmt = "database error: {}", _0)]
	Database(String),
	#[display(fmt = "block file error")]
	BlockFile,
	#[display(fmt = "unknown parent")]
	UnknownParent,
}

impl From<String> for Error {
	fn from(s: String) -> Self {
		Error::Database(s)
	}
}

impl From<block_file::Error> for Error {
	fn from(_: block_file::Error) -> Self {
		Error::BlockFile
	}
}

/// One `connectBlock`/`disconnectBlock` worth of index mutation, queued up
/// so `commit_chain_update` can apply it as a single key-value transaction
/// (spec §5: no in-memory linkage changes until that transaction has
/// committed). Built incrementally with the `with_*` methods, then handed
/// to `commit_chain_update` once.
#[derive(Default)]
pub struct ChainUpdate {
	tx_index_upserts: Vec<(H256, TxIndexEntry)>,
	tx_index_deletes: Vec<H256>,
	credit_adds: Vec<(H160, OutPoint)>,
	credit_removes: Vec<(H160, OutPoint)>,
	debit_adds: Vec<(H160, OutPoint)>,
	debit_removes: Vec<(H160, OutPoint)>,
	link_next: Option<(NodeHandle, NodeHandle)>,
	unlink_next: Option<NodeHandle>,
	set_best_chain: Option<NodeHandle>,
}

impl ChainUpdate {
	pub fn new() -> Self {
		ChainUpdate::default()
	}

	pub fn upsert_tx_index(mut self, hash: H256, entry: TxIndexEntry) -> Self {
		self.tx_index_upserts.push((hash, entry));
		self
	}

	pub fn delete_tx_index(mut self, hash: H256) -> Self {
		self.tx_index_deletes.push(hash);
		self
	}

	pub fn credit(mut self, address: H160, coin: OutPoint) -> Self {
		self.credit_adds.push((address, coin));
		self
	}

	pub fn uncredit(mut self, address: H160, coin: OutPoint) -> Self {
		self.credit_removes.push((address, coin));
		self
	}

	pub fn debit(mut self, address: H160, coin: OutPoint) -> Self {
		self.debit_adds.push((address, coin));
		self
	}

	pub fn undebit(mut self, address: H160, coin: OutPoint) -> Self {
		self.debit_removes.push((address, coin));
		self
	}

	pub fn link_next(mut self, parent: NodeHandle, child: NodeHandle) -> Self {
		self.link_next = Some((parent, child));
		self
	}

	pub fn unlink_next(mut self, parent: NodeHandle) -> Self {
		self.unlink_next = Some(parent);
		self
	}

	pub fn set_best_chain(mut self, handle: NodeHandle) -> Self {
		self.set_best_chain = Some(handle);
		self
	}
}

#[derive(Default)]
struct AddressChange {
	adds: Vec<OutPoint>,
	removes: Vec<OutPoint>,
}

pub struct BlockChainDatabase<T: KeyValueDatabase> {
	kv: T,
	block_file: BlockFile,
	index: RwLock<BlockIndex>,
	best: RwLock<BestBlock>,
}

impl<T: KeyValueDatabase> BlockChainDatabase<T> {
	/// Opens the store, replaying every persisted `BlockIndex` record in
	/// height order to rebuild the in-memory DAG (spec §4.2: "loaded...by
	/// iterating all records, then a second pass in height order assigns
	/// cumulativeWork").
	pub fn open(kv: T, block_file: BlockFile) -> Result<Self, Error> {
		let mut records = kv.all_block_index_records()?;
		records.sort_by_key(|(_, record)| record.height);

		let mut index = BlockIndex::new();
		for (hash, record) in records {
			let work = record.header.bits.to_work();
			if record.hash_prev.is_zero() && record.height == 0 {
				index.insert_genesis(hash, record.header, work, DiskPosition::for_block(record.file, record.offset));
			} else {
				let parent = index
					.handle_of(&record.hash_prev)
					.ok_or_else(|| Error::Database("orphan block index record at startup".into()))?;
				let handle = index.insert_child(
					hash,
					record.header,
					parent,
					work,
					DiskPosition::for_block(record.file, record.offset),
				);
				if record.hash_next.is_some() {
					index.link_next(parent, handle);
				}
			}
		}

		let best = Self::read_best_block(&kv, &index)?;
		Ok(BlockChainDatabase {
			kv,
			block_file,
			index: RwLock::new(index),
			best: RwLock::new(best),
		})
	}

	fn read_best_block(kv: &T, index: &BlockIndex) -> Result<BestBlock, Error> {
		let hash = kv
			.get(&Key::Meta(KEY_HASH_BEST_CHAIN))?
			.and_then(Value::as_meta)
			.and_then(|bytes| talon_serialization::deserialize::<H256>(&bytes).ok());
		Ok(match hash {
			Some(hash) => {
				let handle = index.handle_of(&hash).ok_or_else(|| Error::Database("best chain hash not indexed".into()))?;
				BestBlock {
					number: index.get(handle).height,
					hash,
				}
			}
			None => BestBlock::default(),
		})
	}

	pub fn block_file(&self) -> &BlockFile {
		&self.block_file
	}

	pub fn handle_of(&self, hash: &H256) -> Option<NodeHandle> {
		self.index.read().handle_of(hash)
	}

	pub fn node(&self, handle: NodeHandle) -> IndexNode {
		self.index.read().get(handle).clone()
	}

	pub fn best_block(&self) -> BestBlock {
		self.best.read().clone()
	}

	pub fn best_handle(&self) -> Option<NodeHandle> {
		let hash = self.best.read().hash;
		self.handle_of(&hash)
	}

	pub fn cumulative_work(&self, handle: NodeHandle) -> U256 {
		self.index.read().get(handle).cumulative_work
	}

	/// Implements spec §4.3 `addToBlockIndex` step 1-2: allocates the node
	/// (computing height/cumulative work from the parent, or treating this
	/// as genesis when the index is empty and the header has a zero
	/// previous hash) and persists the record.
	pub fn add_to_index(&self, header: talon_chain::BlockHeader, position: DiskPosition) -> Result<NodeHandle, Error> {
		let hash = talon_chain::block_header_hash(&header);
		let work = header.bits.to_work();

		let mut index = self.index.write();
		let handle = if header.previous_header_hash.is_zero() && index.is_empty() {
			index.insert_genesis(hash, header.clone(), work, position)
		} else {
			let parent = index.handle_of(&header.previous_header_hash).ok_or(Error::UnknownParent)?;
			index.insert_child(hash, header.clone(), parent, work, position)
		};
		drop(index);

		let index = self.index.read();
		let node = index.get(handle);
		let record = BlockIndexRecord {
			header: node.header.clone(),
			height: node.height,
			hash_prev: node.header.previous_header_hash,
			hash_next: None,
			file: node.file,
			offset: node.offset,
		};
		let mut tx = kv::Transaction::new();
		tx.insert(Key::BlockIndex(hash), Value::BlockIndex(record));
		self.kv.write(tx)?;
		Ok(handle)
	}

	pub fn link_next(&self, parent: NodeHandle, child: NodeHandle) -> Result<(), Error> {
		let mut index = self.index.write();
		index.link_next(parent, child);
		let parent_node = index.get(parent).clone();
		drop(index);
		self.persist_hash_next(&parent_node, Some(self.node(child).hash))
	}

	pub fn unlink_next(&self, parent: NodeHandle) -> Result<(), Error> {
		let mut index = self.index.write();
		index.unlink_next(parent);
		let parent_node = index.get(parent).clone();
		drop(index);
		self.persist_hash_next(&parent_node, None)
	}

	fn persist_hash_next(&self, parent: &IndexNode, hash_next: Option<H256>) -> Result<(), Error> {
		let record = BlockIndexRecord {
			header: parent.header.clone(),
			height: parent.height,
			hash_prev: parent.header.previous_header_hash,
			hash_next,
			file: parent.file,
			offset: parent.offset,
		};
		let mut tx = kv::Transaction::new();
		tx.insert(Key::BlockIndex(parent.hash.clone()), Value::BlockIndex(record));
		Ok(self.kv.write(tx)?)
	}

	/// Persists `"hashBestChain"` and updates the in-memory tip. Does not
	/// touch `next` pointers; the caller links those separately so a
	/// failure partway through a reorg leaves a coherent index.
	pub fn set_best_chain(&self, handle: NodeHandle) -> Result<(), Error> {
		let node = self.node(handle);
		let mut tx = kv::Transaction::new();
		tx.insert(Key::Meta(KEY_HASH_BEST_CHAIN), Value::Meta(talon_serialization::serialize(&node.hash)));
		self.kv.write(tx)?;
		*self.best.write() = BestBlock {
			number: node.height,
			hash: node.hash,
		};
		Ok(())
	}

	pub fn tx_index(&self, hash: &H256) -> Option<TxIndexEntry> {
		self.kv.get(&Key::TxIndex(hash.clone())).ok().flatten().and_then(Value::as_tx_index)
	}

	pub fn put_tx_index(&self, hash: H256, entry: TxIndexEntry) -> Result<(), Error> {
		let mut tx = kv::Transaction::new();
		tx.insert(Key::TxIndex(hash), Value::TxIndex(entry));
		Ok(self.kv.write(tx)?)
	}

	pub fn remove_tx_index(&self, hash: &H256) -> Result<(), Error> {
		let mut tx = kv::Transaction::new();
		tx.delete(Key::TxIndex(hash.clone()));
		Ok(self.kv.write(tx)?)
	}

	/// Applies every `TxIndex` upsert and deletion produced by connecting
	/// or disconnecting one block in a single key-value transaction, so a
	/// failure partway through leaves the previous state intact (spec
	/// §4.3 "Failure semantics").
	pub fn apply_tx_index_changes(&self, upserts: Vec<(H256, TxIndexEntry)>, deletes: Vec<H256>) -> Result<(), Error> {
		let mut tx = kv::Transaction::new();
		for (hash, entry) in upserts {
			tx.insert(Key::TxIndex(hash), Value::TxIndex(entry));
		}
		for hash in deletes {
			tx.delete(Key::TxIndex(hash));
		}
		Ok(self.kv.write(tx)?)
	}

	/// Coins touching `address` on the named side of the `("dr"|"cr",
	/// address)` index (spec §6). Empty if the address has never appeared.
	pub fn address_coins(&self, credit: bool, address: &H160) -> Vec<OutPoint> {
		let key = Self::address_key(credit, address);
		self.kv.get(&key).ok().flatten().and_then(Value::as_coins).unwrap_or_default()
	}

	fn address_key(credit: bool, address: &H160) -> Key {
		let encoded = format!("{:x}", address);
		if credit {
			Key::Credit(encoded)
		} else {
			Key::Debit(encoded)
		}
	}

	pub fn write_block(&self, block: &Block, commit: bool) -> Result<DiskPosition, Error> {
		Ok(self.block_file.write_block(block, commit)?)
	}

	/// Applies a whole `connectBlock`/`disconnectBlock` step as one
	/// key-value transaction, then mutates the in-memory index and best tip
	/// only once that transaction has committed — the same ordering the
	/// teacher's `canonize` uses (batch every key, write once, flip the tip
	/// last).
	pub fn commit_chain_update(&self, update: ChainUpdate) -> Result<(), Error> {
		let mut tx = kv::Transaction::new();

		for (hash, entry) in update.tx_index_upserts {
			tx.insert(Key::TxIndex(hash), Value::TxIndex(entry));
		}
		for hash in update.tx_index_deletes {
			tx.delete(Key::TxIndex(hash));
		}

		for (address, coins) in Self::merge_address_changes(update.credit_adds, update.credit_removes) {
			let mut current: std::collections::HashSet<OutPoint> = self.address_coins(true, &address).into_iter().collect();
			for coin in coins.adds {
				current.insert(coin);
			}
			for coin in coins.removes {
				current.remove(&coin);
			}
			tx.insert(Self::address_key(true, &address), Value::Coins(current.into_iter().collect()));
		}
		for (address, coins) in Self::merge_address_changes(update.debit_adds, update.debit_removes) {
			let mut current: std::collections::HashSet<OutPoint> = self.address_coins(false, &address).into_iter().collect();
			for coin in coins.adds {
				current.insert(coin);
			}
			for coin in coins.removes {
				current.remove(&coin);
			}
			tx.insert(Self::address_key(false, &address), Value::Coins(current.into_iter().collect()));
		}

		let index = self.index.read();
		if let Some((parent, _)) = update.link_next {
			let parent_node = index.get(parent).clone();
			tx.insert(
				Key::BlockIndex(parent_node.hash.clone()),
				Value::BlockIndex(BlockIndexRecord {
					header: parent_node.header.clone(),
					height: parent_node.height,
					hash_prev: parent_node.header.previous_header_hash,
					hash_next: update.link_next.map(|(_, child)| index.get(child).hash.clone()),
					file: parent_node.file,
					offset: parent_node.offset,
				}),
			);
		}
		if let Some(parent) = update.unlink_next {
			let parent_node = index.get(parent).clone();
			tx.insert(
				Key::BlockIndex(parent_node.hash.clone()),
				Value::BlockIndex(BlockIndexRecord {
					header: parent_node.header.clone(),
					height: parent_node.height,
					hash_prev: parent_node.header.previous_header_hash,
					hash_next: None,
					file: parent_node.file,
					offset: parent_node.offset,
				}),
			);
		}
		let best_target = update.set_best_chain.map(|handle| index.get(handle).clone());
		drop(index);
		if let Some(ref node) = best_target {
			tx.insert(Key::Meta(KEY_HASH_BEST_CHAIN), Value::Meta(talon_serialization::serialize(&node.hash)));
		}

		self.kv.write(tx)?;

		let mut index = self.index.write();
		if let Some((parent, child)) = update.link_next {
			index.link_next(parent, child);
		}
		if let Some(parent) = update.unlink_next {
			index.unlink_next(parent);
		}
		drop(index);
		if let Some(node) = best_target {
			*self.best.write() = BestBlock { number: node.height, hash: node.hash };
		}
		Ok(())
	}

	fn merge_address_changes(
		adds: Vec<(H160, OutPoint)>,
		removes: Vec<(H160, OutPoint)>,
	) -> std::collections::HashMap<H160, AddressChange> {
		let mut merged: std::collections::HashMap<H160, AddressChange> = std::collections::HashMap::new();
		for (address, coin) in adds {
			merged.entry(address).or_insert_with(AddressChange::default).adds.push(coin);
		}
		for (address, coin) in removes {
			merged.entry(address).or_insert_with(AddressChange::default).removes.push(coin);
		}
		merged
	}

	pub fn check_disk_space(&self, additional_bytes: u64) -> Result<bool, Error> {
		Ok(self.block_file.check_disk_space(additional_bytes)?)
	}

	pub fn best_invalid_work(&self) -> Option<U256> {
		self.kv
			.get(&Key::Meta(kv::KEY_BEST_INVALID_WORK))
			.ok()
			.flatten()
			.and_then(Value::as_meta)
			.and_then(|bytes| talon_serialization::deserialize::<U256>(&bytes).ok())
	}

	pub fn record_best_invalid_work(&self, work: U256) -> Result<(), Error> {
		let mut tx = kv::Transaction::new();
		tx.insert(Key::Meta(kv::KEY_BEST_INVALID_WORK), Value::Meta(talon_serialization::serialize(&work)));
		Ok(self.kv.write(tx)?)
	}
}

impl<T: KeyValueDatabase> BlockHeaderProvider for BlockChainDatabase<T> {
	fn block_header(&self, block_ref: BlockRef) -> Option<IndexedBlockHeader> {
		let handle = self.resolve(block_ref)?;
		let node = self.node(handle);
		Some(IndexedBlockHeader::new(node.hash, node.header))
	}

	fn block_hash(&self, number: u32) -> Option<H256> {
		self.block_header(BlockRef::Number(number)).map(|h| h.hash)
	}

	fn block_number(&self, hash: &H256) -> Option<u32> {
		self.handle_of(hash).map(|handle| self.node(handle).height)
	}
}

impl<T: KeyValueDatabase> BlockChainDatabase<T> {
	/// Resolves a `BlockRef::Number` by walking from the current best tip;
	/// `BlockRef::Hash` is a direct index lookup. This only ever returns
	/// best-chain blocks for `Number` refs, matching the rest of the
	/// workspace's assumption that height addressing means "on the best
	/// chain".
	fn resolve(&self, block_ref: BlockRef) -> Option<NodeHandle> {
		match block_ref {
			BlockRef::Hash(hash) => self.handle_of(&hash),
			BlockRef::Number(number) => {
				let mut handle = self.best_handle()?;
				loop {
					let node = self.node(handle);
					if node.height == number {
						return Some(handle);
					}
					if node.height < number {
						return None;
					}
					handle = node.parent?;
				}
			}
		}
	}
}

impl<T: KeyValueDatabase> BlockProvider for BlockChainDatabase<T> {
	fn block(&self, block_ref: BlockRef) -> Option<IndexedBlock> {
		let handle = self.resolve(block_ref)?;
		let node = self.node(handle);
		let raw = self.block_file.read_block(node.file, node.offset).ok()?;
		Some(IndexedBlock::new(
			IndexedBlockHeader::new(node.hash, node.header),
			raw.transactions
				.into_iter()
				.map(IndexedTransaction::from_raw)
				.collect(),
		))
	}
}

impl<T: KeyValueDatabase> TransactionProvider for BlockChainDatabase<T> {
	fn transaction(&self, hash: &H256) -> Option<Transaction> {
		let entry = self.tx_index(hash)?;
		self.block_file.read_tx(entry.position).ok()
	}
}

impl<T: KeyValueDatabase> TransactionMetaProvider for BlockChainDatabase<T> {
	fn transaction_meta(&self, hash: &H256) -> Option<TransactionMeta> {
		let entry = self.tx_index(hash)?;
		let mut meta = if entry.is_coinbase {
			TransactionMeta::new_coinbase(entry.height, entry.output_count())
		} else {
			TransactionMeta::new(entry.height, entry.output_count())
		};
		for i in 0..entry.output_count() {
			if entry.is_spent(i) {
				meta.note_spent(i);
			}
		}
		Some(meta)
	}
}

impl<T: KeyValueDatabase> TransactionOutputProvider for BlockChainDatabase<T> {
	fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
		let tx = self.transaction(&outpoint.hash)?;
		tx.outputs.into_iter().nth(outpoint.index as usize)
	}

	fn is_spent(&self, outpoint: &OutPoint) -> bool {
		self.tx_index(&outpoint.hash)
			.map(|entry| entry.is_spent(outpoint.index as usize))
			.unwrap_or(false)
	}
}

impl<T: KeyValueDatabase> talon_storage::Store for BlockChainDatabase<T> {
	fn best_block(&self) -> BestBlock {
		BlockChainDatabase::best_block(self)
	}

	fn genesis_hash(&self) -> H256 {
		self.index.read().genesis_hash().unwrap_or_else(H256::zero)
	}
}

/// Convenience for wiring a freshly opened database behind the `Arc<dyn
/// Store>` the rest of the workspace expects.
pub fn shared<T: KeyValueDatabase + 'static>(db: BlockChainDatabase<T>) -> talon_storage::SharedStore {
	Arc::new(db)
}
