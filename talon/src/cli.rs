use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use talon_chainparams::Network;

/// Thin wiring layer over the core: opens (or creates) a data directory,
/// selects a network's consensus parameters, and optionally starts the
/// miner. Everything peer-networking- or RPC-shaped is out of scope (see
/// the crate's module doc); this binary exists to exercise the chain
/// engine, mempool and miner on their own.
#[derive(Parser, Debug)]
#[command(name = "talon", about = "Chain engine, mempool and miner core, without peer networking or RPC")]
pub struct Cli {
	/// Directory holding the block files and key-value store.
	#[arg(long, default_value = "./talon-data")]
	pub data_dir: PathBuf,

	/// Consensus network to run.
	#[arg(long, value_enum, default_value = "unitest")]
	pub network: NetworkArg,

	/// Start the miner immediately instead of waiting for a `generate on`
	/// command.
	#[arg(long)]
	pub mine: bool,

	/// 20-byte hex-encoded address hash the miner pays coinbase rewards
	/// to. Without one, mined blocks pay an empty (unspendable) script,
	/// which is still valid for exercising the chain engine.
	#[arg(long)]
	pub payout_address: Option<String>,

	/// Suppress the `tracing` subscriber's default `info` level, taking
	/// the level from `RUST_LOG` instead.
	#[arg(long)]
	pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum NetworkArg {
	Mainnet,
	Testnet,
	Unitest,
}

impl From<NetworkArg> for Network {
	fn from(arg: NetworkArg) -> Self {
		match arg {
			NetworkArg::Mainnet => Network::Mainnet,
			NetworkArg::Testnet => Network::Testnet,
			NetworkArg::Unitest => Network::Unitest,
		}
	}
}
