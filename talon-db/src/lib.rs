//! Persistent storage for the chain: the key-value record layer, the
//! append-only block file, the in-memory block index arena, and the
//! `BlockChainDatabase` facade binding them to `talon_storage::Store`.
//!
//! `talon_engine::ChainEngine` is the only intended caller of the
//! mutation primitives exposed here (`add_to_index`, `link_next`,
//! `put_tx_index`, ...); consensus validation and the accept/connect/
//! reorganize orchestration live one layer up.

pub mod block_chain_db;
pub mod block_file;
pub mod block_index;
pub mod disk_position;
pub mod kv;
pub mod tx_index;

pub use block_chain_db::{shared, BlockChainDatabase, ChainUpdate, Error};
pub use block_file::BlockFile;
pub use block_index::{BlockIndex, IndexNode, NodeHandle};
pub use disk_position::DiskPosition;
pub use kv::{BlockIndexRecord, Key, KeyValueDatabase, MemoryDatabase, Operation, Transaction, Value};
pub use tx_index::TxIndexEntry;
