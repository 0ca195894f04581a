use talon_primitives::hash::H256;

/// The tip of the best chain, as reported by `Store::best_block`.
#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct BestBlock {
	pub number: u32,
	pub hash: H256,
}
