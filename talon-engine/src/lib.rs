//! Chain orchestration: the layer that decides *when* to call
//! `talon_verification` and `talon_db` rather than doing either job
//! itself.
//!
//! `ChainEngine::accept_block` is the single entry point a node (or a
//! test) ever needs: context-free structural checks, block-index
//! classification, then either a straight connect or a full
//! reorganization, all under one coarse-grained lock. It also implements
//! `talon_miner::BlockAcceptor`, so a `Miner` can submit a freshly mined
//! block through the exact same path a received block would take.

mod engine;
mod error;

pub use crate::engine::ChainEngine;
pub use crate::error::Error;
