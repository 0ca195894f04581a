//! Block template assembly and proof-of-work search.
//!
//! `TemplateBuilder` turns the current chain tip and mempool into a
//! candidate block; `Miner` drives a dedicated thread that repeatedly asks
//! for a fresh template and searches it for a valid nonce, submitting any
//! block it finds through a `BlockAcceptor`.

mod miner;
mod template;

pub use crate::miner::{BlockAcceptor, CpuHasher, Hasher, Miner};
pub use crate::template::{BlockTemplate, TemplateBuilder};
