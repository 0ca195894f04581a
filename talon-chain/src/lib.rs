//! Consensus data types: headers, transactions, blocks, and the
//! hash-cached (`Indexed*`) wrappers the rest of the workspace passes
//! around to avoid re-hashing.

pub mod constants;

mod block;
mod block_header;
mod hasher;
mod indexed_block;
mod indexed_header;
mod indexed_transaction;
mod merkle_root;
mod transaction;

pub use talon_primitives::{bigint, compact, hash};

pub use block::Block;
pub use block_header::{block_header_hash, BlockHeader};
pub use hasher::{dhash256, BlockHasher, DoubleSha256};
pub use indexed_block::IndexedBlock;
pub use indexed_header::IndexedBlockHeader;
pub use indexed_transaction::IndexedTransaction;
pub use merkle_root::merkle_root;
pub use transaction::{OutPoint, Transaction, TransactionInput, TransactionOutput};
