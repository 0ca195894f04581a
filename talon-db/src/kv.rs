//! The persistent ordered key-value store is named as an external
//! collaborator (spec §1): production deployments would point this at
//! something like RocksDB. `MemoryDatabase` is the in-process stand-in the
//! rest of the workspace builds and tests against, mirroring the teacher's
//! own `kv::MemoryDatabase`.

use std::collections::BTreeMap;
use std::fmt;

use parking_lot::RwLock;
use talon_primitives::hash::H256;
use talon_serialization::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

use crate::tx_index::TxIndexEntry;

/// Record persisted at `("blockindex", hash)`: everything needed to
/// reconstruct a `BlockIndex` entry on startup without re-deriving
/// `cumulativeWork` (that still requires the second, height-ordered pass
/// described in spec §4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockIndexRecord {
	pub header: talon_chain::BlockHeader,
	pub height: u32,
	pub hash_prev: H256,
	pub hash_next: Option<H256>,
	pub file: u32,
	pub offset: u32,
}

impl Serializable for BlockIndexRecord {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.header)
			.append(&self.height)
			.append(&self.hash_prev)
			.append(&self.hash_next)
			.append(&self.file)
			.append(&self.offset);
	}
}

impl Deserializable for BlockIndexRecord {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(BlockIndexRecord {
			header: reader.read()?,
			height: reader.read()?,
			hash_prev: reader.read()?,
			hash_next: reader.read()?,
			file: reader.read()?,
			offset: reader.read()?,
		})
	}
}

/// One of the small number of record shapes this store actually holds.
/// Unlike the teacher's column-per-type RocksDB layout, keys here carry
/// their own tag (`Key`) rather than a column index, matching spec §6's
/// `("blockindex", hash)` / `("tx", hash)` / `("dr"|"cr", address)` scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
	BlockIndex(BlockIndexRecord),
	TxIndex(TxIndexEntry),
	/// Debit/credit asset index: coins (outpoints) touching an address.
	Coins(Vec<talon_chain::OutPoint>),
	Meta(Vec<u8>),
}

impl Value {
	pub fn as_block_index(self) -> Option<BlockIndexRecord> {
		match self {
			Value::BlockIndex(record) => Some(record),
			_ => None,
		}
	}

	pub fn as_tx_index(self) -> Option<TxIndexEntry> {
		match self {
			Value::TxIndex(entry) => Some(entry),
			_ => None,
		}
	}

	pub fn as_coins(self) -> Option<Vec<talon_chain::OutPoint>> {
		match self {
			Value::Coins(coins) => Some(coins),
			_ => None,
		}
	}

	pub fn as_meta(self) -> Option<Vec<u8>> {
		match self {
			Value::Meta(bytes) => Some(bytes),
			_ => None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
	BlockIndex(H256),
	TxIndex(H256),
	Debit(String),
	Credit(String),
	Meta(&'static str),
}

pub const KEY_HASH_BEST_CHAIN: &str = "hashBestChain";
pub const KEY_BEST_INVALID_WORK: &str = "bnBestInvalidWork";

/// A single mutation queued against the store. `Transaction::write` applies
/// a batch of these atomically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
	Insert(Key, Value),
	Delete(Key),
}

/// A batch of operations applied by a single call to
/// `KeyValueDatabase::write`. Spec §5: "every chain-state mutation that
/// spans multiple keys uses begin/commit/abort" — `Transaction` is the
/// `begin`, `write` is `commit`, and a transaction that is simply dropped
/// without being written is the `abort`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
	pub operations: Vec<Operation>,
}

impl Transaction {
	pub fn new() -> Self {
		Transaction::default()
	}

	pub fn insert(&mut self, key: Key, value: Value) {
		self.operations.push(Operation::Insert(key, value));
	}

	pub fn delete(&mut self, key: Key) {
		self.operations.push(Operation::Delete(key));
	}
}

pub trait KeyValueDatabase: Send + Sync {
	/// Applies every operation in `tx`, or none of them.
	fn write(&self, tx: Transaction) -> Result<(), String>;

	fn get(&self, key: &Key) -> Result<Option<Value>, String>;

	/// Every `("blockindex", *)` record, for the startup load described in
	/// spec §4.2. Order is unspecified; callers sort by height themselves.
	fn all_block_index_records(&self) -> Result<Vec<(H256, BlockIndexRecord)>, String>;
}

/// In-memory `KeyValueDatabase`, backed by a single `RwLock<BTreeMap>`.
/// `write` takes the lock once and applies the whole batch, which is
/// already all the atomicity a single-process store needs to give.
#[derive(Default)]
pub struct MemoryDatabase {
	data: RwLock<BTreeMap<Key, Value>>,
}

impl fmt::Debug for MemoryDatabase {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("MemoryDatabase").finish()
	}
}

impl MemoryDatabase {
	pub fn new() -> Self {
		MemoryDatabase::default()
	}
}

impl KeyValueDatabase for MemoryDatabase {
	fn write(&self, tx: Transaction) -> Result<(), String> {
		let mut data = self.data.write();
		for op in tx.operations {
			match op {
				Operation::Insert(key, value) => {
					data.insert(key, value);
				}
				Operation::Delete(key) => {
					data.remove(&key);
				}
			}
		}
		Ok(())
	}

	fn get(&self, key: &Key) -> Result<Option<Value>, String> {
		Ok(self.data.read().get(key).cloned())
	}

	fn all_block_index_records(&self) -> Result<Vec<(H256, BlockIndexRecord)>, String> {
		Ok(self
			.data
			.read()
			.iter()
			.filter_map(|(key, value)| match (key, value) {
				(Key::BlockIndex(hash), Value::BlockIndex(record)) => Some((hash.clone(), record.clone())),
				_ => None,
			})
			.collect())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{BlockHeader, OutPoint};
	use talon_primitives::compact::Compact;

	fn sample_header() -> BlockHeader {
		BlockHeader {
			version: 1,
			previous_header_hash: H256::from([1u8; 32]),
			merkle_root: H256::from([2u8; 32]),
			time: 100,
			bits: Compact::new(0x1d00ffff),
			nonce: 7,
		}
	}

	/// spec §8: serialize/deserialize on every persisted record type is the
	/// identity. `hash_next` covers both the "tip of the chain" (`None`) and
	/// "has a successor" (`Some`) shapes of the same record.
	#[test]
	fn block_index_record_roundtrips_with_and_without_a_successor() {
		let mut record = BlockIndexRecord {
			header: sample_header(),
			height: 12,
			hash_prev: H256::from([3u8; 32]),
			hash_next: None,
			file: 0,
			offset: 80,
		};
		let bytes = talon_serialization::serialize(&record);
		let back: BlockIndexRecord = talon_serialization::deserialize(&bytes).unwrap();
		assert_eq!(back, record);

		record.hash_next = Some(H256::from([4u8; 32]));
		let bytes = talon_serialization::serialize(&record);
		let back: BlockIndexRecord = talon_serialization::deserialize(&bytes).unwrap();
		assert_eq!(back, record);
	}

	/// The debit/credit asset index stores plain `Vec<OutPoint>` lists rather
	/// than a named wrapper type; round-tripping through the same
	/// list-of-`Serializable` machinery `Transaction` uses for its own
	/// input/output lists is enough to satisfy spec §8 for `Coins`.
	#[test]
	fn coins_list_roundtrips() {
		let coins = vec![
			OutPoint { hash: H256::from([5u8; 32]), index: 0 },
			OutPoint { hash: H256::from([6u8; 32]), index: 2 },
		];
		let mut stream = Stream::default();
		stream.append_list(&coins);
		let bytes = stream.out();
		let mut reader = Reader::new(&bytes);
		let back: Vec<OutPoint> = reader.read_list().unwrap();
		assert_eq!(back, coins);
	}
}
