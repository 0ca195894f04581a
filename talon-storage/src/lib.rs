//! Shared storage-facing interfaces: the traits `talon_db` implements and
//! everything else (`talon-verification`, `talon-mempool`, `talon-miner`,
//! `talon-engine`) programs against, plus the small value types that flow
//! across those traits.

pub mod best_block;
pub mod block_ancestors;
pub mod block_origin;
pub mod block_provider;
pub mod block_ref;
pub mod error;
pub mod store;
pub mod transaction_meta;
pub mod transaction_provider;

pub use best_block::BestBlock;
pub use block_ancestors::BlockAncestors;
pub use block_origin::{BlockOrigin, SideChainOrigin};
pub use block_provider::{BlockHeaderProvider, BlockProvider};
pub use block_ref::BlockRef;
pub use error::Error;
pub use store::{AsSubstore, SharedStore, Store};
pub use transaction_meta::TransactionMeta;
pub use transaction_provider::{
	DuplexTransactionOutputProvider, NoopStore, TransactionMetaProvider, TransactionOutputProvider, TransactionProvider,
};
