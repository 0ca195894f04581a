//! Thin wiring binary: opens the block store, builds a `ChainEngine` and
//! `MemPool` over it, optionally starts the miner, and exposes a small
//! line-oriented console for driving the three by hand. Peer networking,
//! RPC and wallet management are out of scope (spec §1); this binary
//! exists to exercise the core those collaborators would otherwise drive.

mod cli;
mod repl;
mod verifier;

use std::io::{self, BufRead};
use std::sync::Arc;

use clap::Parser;
use rustc_hex::FromHex;
use tracing_subscriber::EnvFilter;

use talon_chainparams::ConsensusParams;
use talon_db::block_file::BlockFile;
use talon_db::kv::MemoryDatabase;
use talon_db::BlockChainDatabase;
use talon_engine::ChainEngine;
use talon_mempool::MemPool;
use talon_miner::{CpuHasher, Miner};
use talon_primitives::hash::H160;

use crate::cli::Cli;
use crate::verifier::NullSignatureVerifier;

fn main() {
	let cli = Cli::parse();

	let filter = if cli.quiet {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	} else {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
	};
	tracing_subscriber::fmt().with_env_filter(filter).init();

	if let Err(err) = run(cli) {
		tracing::error!(%err, "talon exited with an error");
		std::process::exit(1);
	}
}

fn run(cli: Cli) -> Result<(), String> {
	std::fs::create_dir_all(&cli.data_dir).map_err(|err| format!("could not create data directory: {}", err))?;

	let consensus = ConsensusParams::new(cli.network.into());
	let block_file = BlockFile::open(&cli.data_dir).map_err(|err| format!("could not open block store: {:?}", err))?;
	let kv = MemoryDatabase::new();
	let db = Arc::new(BlockChainDatabase::open(kv, block_file).map_err(|err| err.to_string())?);

	let mempool = Arc::new(MemPool::new(consensus.clone()));
	let verifier: Arc<dyn talon_verification::SignatureVerifier + Send + Sync> = Arc::new(NullSignatureVerifier);
	let engine = Arc::new(ChainEngine::new(db.clone(), mempool.clone(), consensus.clone(), verifier));

	if engine.db().best_handle().is_none() {
		let genesis = consensus.genesis_block();
		tracing::info!(hash = %genesis.hash().to_reversed_str(), "bootstrapping genesis block");
		engine.accept_block(genesis).map_err(|err| format!("failed to accept genesis block: {}", err))?;
	}

	let payout_script = match &cli.payout_address {
		Some(hex) => p2pkh_script(hex)?,
		None => Vec::new(),
	};

	let miner = Miner::new(
		db.clone(),
		mempool.clone(),
		consensus.clone(),
		engine.clone(),
		Arc::new(CpuHasher),
		payout_script,
	);
	if cli.mine {
		miner.set_generate(true);
	}

	tracing::info!(
		network = ?cli.network,
		data_dir = %cli.data_dir.display(),
		mining = cli.mine,
		"talon node ready"
	);

	let stdin = io::stdin();
	for line in stdin.lock().lines() {
		let line = line.map_err(|err| err.to_string())?;
		if !repl::dispatch(line.trim(), db.as_ref(), &mempool, &miner) {
			break;
		}
	}

	miner.shutdown();
	Ok(())
}

/// Builds a standard pay-to-pubkey-hash `scriptPubkey` for a 20-byte
/// hex-encoded address hash, the inverse of `talon_mempool::p2pkh_hash`.
fn p2pkh_script(hex: &str) -> Result<Vec<u8>, String> {
	let bytes: Vec<u8> = hex.from_hex().map_err(|err| format!("invalid payout address hex: {}", err))?;
	if bytes.len() != 20 {
		return Err(format!("payout address must be 20 bytes, got {}", bytes.len()));
	}
	let mut buf = [0u8; 20];
	buf.copy_from_slice(&bytes);
	let hash = H160::from(buf);

	let mut script = Vec::with_capacity(25);
	script.extend_from_slice(&[0x76, 0xa9, 0x14]);
	script.extend_from_slice(hash.as_bytes());
	script.extend_from_slice(&[0x88, 0xac]);
	Ok(script)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn builds_a_p2pkh_script_from_a_hex_address() {
		let script = p2pkh_script("0707070707070707070707070707070707070707").unwrap();
		assert_eq!(talon_mempool::p2pkh_hash(&script), Some(H160::from([7u8; 20])));
	}

	#[test]
	fn rejects_the_wrong_byte_length() {
		assert!(p2pkh_script("0707").is_err());
	}
}
