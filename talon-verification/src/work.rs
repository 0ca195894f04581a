use talon_chainparams::ConsensusParams;
use talon_primitives::bigint::U256;
use talon_primitives::compact::Compact;
use talon_primitives::hash::H256;
use talon_storage::{BlockHeaderProvider, BlockRef};

/// Retarget rule: every `retarget_interval` blocks, adjust `bits` so the
/// last interval would have taken `retarget_timespan` seconds, clamped to
/// a factor of 4 either way and floored at `pow_limit`. Between retargets
/// the previous block's `bits` simply carries forward. This is the
/// `Chain.nextWorkRequired(prevIndex)` named in spec §6, implemented here
/// (rather than on `ConsensusParams`) because it needs a header provider
/// to walk back to the start of the retarget window.
pub fn work_required(previous_header_hash: H256, height: u32, store: &dyn BlockHeaderProvider, consensus: &ConsensusParams) -> Compact {
	if height == 0 {
		return consensus.proof_of_work_limit();
	}

	let previous_header = match store.block_header(BlockRef::Hash(previous_header_hash)) {
		Some(header) => header,
		None => return consensus.proof_of_work_limit(),
	};

	if height % consensus.retarget_interval != 0 {
		return previous_header.raw.bits;
	}

	let retarget_start_height = height - consensus.retarget_interval;
	let retarget_start = match store.block_header(BlockRef::Number(retarget_start_height)) {
		Some(header) => header,
		None => return previous_header.raw.bits,
	};

	let actual_timespan = previous_header.raw.time.saturating_sub(retarget_start.raw.time);
	let target_timespan = consensus.retarget_timespan;
	let clamped = actual_timespan.max(target_timespan / 4).min(target_timespan * 4);

	let previous_target = match previous_header.raw.bits.to_u256() {
		Ok(target) => target,
		Err(_) => return consensus.proof_of_work_limit(),
	};

	let pow_limit = consensus.pow_limit;
	let new_target = match previous_target.checked_mul(U256::from(clamped)) {
		Some(scaled) => scaled / U256::from(target_timespan),
		None => pow_limit,
	};
	let bounded = if new_target > pow_limit { pow_limit } else { new_target };
	Compact::from_u256(bounded)
}

/// Checks that `hash` (the block's own hash, interpreted as a 256-bit
/// integer) does not exceed the target encoded by `bits`.
pub fn is_valid_proof_of_work(bits: Compact, hash: &H256) -> bool {
	let target = match bits.to_u256() {
		Ok(target) => target,
		Err(_) => return false,
	};
	let hash_as_u256 = U256::from_little_endian(hash.as_bytes());
	hash_as_u256 <= target
}
