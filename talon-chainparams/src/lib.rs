//! Chain parameters: the concrete shape of the `Chain` collaborator contract
//! named in spec §6 (`dataDirSuffix`, `genesisBlock`, `networkId`,
//! `proofOfWorkLimit`, `subsidy`, `isStandard`, `checkPoints`,
//! `totalBlocksEstimate`). `nextWorkRequired` is deliberately not a method
//! here: it needs a `BlockHeaderProvider` to walk ancestors, so it lives as a
//! free function in `talon-verification::work`, taking `&ConsensusParams` as
//! a parameter — the same split the teacher crate uses between `network`
//! and `verification`.

use std::collections::BTreeMap;
use talon_chain::{Block, BlockHeader, Transaction, TransactionInput, TransactionOutput};
use talon_primitives::bigint::U256;
use talon_primitives::compact::Compact;
use talon_primitives::hash::H256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
	Mainnet,
	Testnet,
	/// Deterministic, low-difficulty network used by the test suite (mirrors
	/// the teacher's `Network::Unitest`).
	Unitest,
}

impl Network {
	pub fn data_dir_suffix(&self) -> &'static str {
		match *self {
			Network::Mainnet => "",
			Network::Testnet => "testnet3",
			Network::Unitest => "unitest",
		}
	}

	pub fn network_id(&self) -> u32 {
		match *self {
			Network::Mainnet => 0xD9B4_BEF9,
			Network::Testnet => 0x0709_110B,
			Network::Unitest => 0xDAB5_BFFA,
		}
	}
}

/// Consensus parameters for one network. Cheap to clone; held by value
/// wherever the spec's `Chain` contract is consumed.
#[derive(Debug, Clone)]
pub struct ConsensusParams {
	pub network: Network,
	pub pow_limit: U256,
	/// Blocks between proof-of-work retargets.
	pub retarget_interval: u32,
	/// Target number of seconds the `retarget_interval` should take.
	pub retarget_timespan: u32,
	/// Target spacing between blocks, in seconds.
	pub target_spacing: u32,
	pub subsidy_halving_interval: u32,
	pub initial_subsidy: u64,
	pub coinbase_maturity: u32,
	pub max_block_sigops: usize,
	pub max_transaction_size: usize,
	/// Relay policy, not consensus: satoshis required per started 1000
	/// bytes before the mempool will admit a transaction outright (§4.4
	/// step 8). Transactions under this stay eligible for the free-rate
	/// limiter instead of outright rejection.
	pub relay_fee_per_kb: u64,
	pub bip16_time: u32,
	pub bip65_height: u32,
	pub bip66_height: u32,
	pub checkpoints: BTreeMap<u32, H256>,
}

impl ConsensusParams {
	pub fn new(network: Network) -> Self {
		let pow_limit = match network {
			Network::Mainnet => U256::max_value() >> 32,
			Network::Testnet => U256::max_value() >> 28,
			Network::Unitest => U256::max_value() >> 1,
		};
		ConsensusParams {
			network,
			pow_limit,
			retarget_interval: 2016,
			retarget_timespan: 14 * 24 * 60 * 60,
			target_spacing: 10 * 60,
			subsidy_halving_interval: 210_000,
			initial_subsidy: 50_0000_0000,
			coinbase_maturity: talon_chain::constants::COINBASE_MATURITY,
			max_block_sigops: talon_chain::constants::MAX_BLOCK_SIGOPS,
			max_transaction_size: talon_chain::constants::MAX_BLOCK_SIZE,
			relay_fee_per_kb: 1_000,
			bip16_time: 0,
			bip65_height: 0,
			bip66_height: 0,
			checkpoints: BTreeMap::new(),
		}
	}

	pub fn proof_of_work_limit(&self) -> Compact {
		Compact::from_u256(self.pow_limit)
	}

	/// Block subsidy at `height`, halving every `subsidy_halving_interval`
	/// blocks, matching §3's `subsidy(height)` reference in invariant 7.
	pub fn subsidy(&self, height: u32) -> u64 {
		let halvings = height / self.subsidy_halving_interval;
		if halvings >= 64 {
			0
		} else {
			self.initial_subsidy >> halvings
		}
	}

	/// Conservative standardness check: caps script and transaction size.
	/// The real script-template recognizer is out of scope (§1); this is
	/// the anti-DoS shape the mempool and template builder actually need.
	pub fn is_standard(&self, tx: &Transaction) -> bool {
		use talon_serialization::Serializable;
		if tx.serialized_size() > self.max_transaction_size {
			return false;
		}
		tx.outputs
			.iter()
			.all(|output| output.script_pubkey.len() <= 10_000)
			&& tx
				.inputs
				.iter()
				.all(|input| input.script_sig.len() <= 1_650)
	}

	/// Minimum relay fee for a transaction of `size` bytes, rounded up to
	/// the next started kilobyte.
	pub fn min_relay_fee(&self, size: usize) -> u64 {
		let kilobytes = (size as u64 + 999) / 1000;
		self.relay_fee_per_kb * kilobytes.max(1)
	}

	pub fn checkpoint(&self, height: u32) -> Option<H256> {
		self.checkpoints.get(&height).cloned()
	}

	/// Rough estimate of the network's current block count, used to decide
	/// whether the node is still in initial block download (§4.3 step 7).
	/// A live deployment would feed this from peer `version` announcements;
	/// here it is just the highest checkpoint height, matching the teacher's
	/// fallback of "whatever we know about statically".
	pub fn total_blocks_estimate(&self) -> u32 {
		self.checkpoints.keys().next_back().cloned().unwrap_or(0)
	}

	/// Deterministic genesis block: single coinbase transaction paying the
	/// height-0 subsidy to an empty script, mined at the network's PoW
	/// floor. Real deployments hardcode a specific genesis; this one is
	/// reproducible from the parameters alone, which is what the test suite
	/// and the `Unitest`/`Testnet` networks need.
	pub fn genesis_block(&self) -> Block {
		let coinbase = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase(b"genesis".to_vec())],
			outputs: vec![TransactionOutput {
				value: self.subsidy(0),
				script_pubkey: Vec::new(),
			}],
			lock_time: 0,
		};
		let merkle_root = talon_chain::merkle_root(&[coinbase.hash()]);
		Block {
			header: BlockHeader {
				version: 1,
				previous_header_hash: H256::zero(),
				merkle_root,
				time: 0,
				bits: self.proof_of_work_limit(),
				nonce: 0,
			},
			transactions: vec![coinbase],
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn subsidy_halves_on_schedule() {
		let consensus = ConsensusParams::new(Network::Mainnet);
		let base = consensus.subsidy(0);
		assert_eq!(consensus.subsidy(consensus.subsidy_halving_interval), base / 2);
		assert_eq!(
			consensus.subsidy(consensus.subsidy_halving_interval * 2),
			base / 4
		);
	}

	#[test]
	fn genesis_is_deterministic() {
		let consensus = ConsensusParams::new(Network::Unitest);
		assert_eq!(
			consensus.genesis_block().hash(),
			consensus.genesis_block().hash()
		);
	}
}
