//! Fluent fixture construction shared by every crate's test modules:
//! `block_builder()` for whole blocks, `TransactionBuilder` for one-off
//! transactions, `ChainBuilder` for a run of linked blocks.

mod block_builder;
mod chain_builder;
mod transaction_builder;

pub use block_builder::{block_builder, BlockBuilder, BlockHeaderBuilder, BlockTransactionBuilder, BlockTransactionOutputBuilder};
pub use chain_builder::ChainBuilder;
pub use transaction_builder::TransactionBuilder;
