//! Consensus verification.
//!
//! Full block verification happens in two phases: pre-verification (context
//! free well-formedness, not modeled as its own module here since the
//! checks are small enough to live inline in `talon-engine`) and
//! full/contextual verification, done by the `*Acceptor` types in this
//! crate against a `talon_storage::Store` snapshot.
//!
//! Use cases:
//!
//! - new block from a peer or the miner: `ChainAcceptor` checks the header
//!   and every transaction against the chain the block would extend.
//! - new mempool transaction: `MemoryPoolTransactionAcceptor` checks it
//!   against the confirmed chain plus whatever else is already pooled.

mod accept_chain;
mod accept_header;
mod accept_transaction;
mod canon;
mod error;
mod fee;
mod sigops;
mod timestamp;
mod work;

pub use crate::accept_chain::ChainAcceptor;
pub use crate::accept_header::{HeaderAcceptor, HeaderCheckpoint, HeaderMedianTimestamp, HeaderWork};
pub use crate::accept_transaction::{MemoryPoolTransactionAcceptor, SignatureVerifier, TransactionAcceptor};
pub use crate::canon::{CanonBlock, CanonHeader, CanonTransaction};
pub use crate::error::{Error, TransactionError};
pub use crate::fee::checked_transaction_fee;
pub use crate::sigops::transaction_sigops;
pub use crate::timestamp::median_timestamp;
pub use crate::work::{is_valid_proof_of_work, work_required};
