//! The node's unconfirmed-transaction pool.
//!
//! Every admission goes through `MemPool::accept`, which mirrors the
//! well-formedness and policy checks a new block's transactions already
//! passed through `talon_verification`, plus the pool-specific rules
//! (standardness, anti-DoS size/sigop floor, no replacement, free-relay
//! rate limiting) that only apply before a transaction is confirmed.

mod address_index;
mod error;
mod mempool;
mod rate_limiter;

pub use crate::address_index::p2pkh_hash;
pub use crate::error::Error;
pub use crate::mempool::{MemPool, OrderingStrategy, PooledEntry};
pub use crate::rate_limiter::FreeRateLimiter;
