use talon_chain::IndexedBlockHeader;
use talon_primitives::hash::H256;

/// Where a newly-indexed block sits relative to the current best chain,
/// as determined by `ChainEngine::addToBlockIndex` before any I/O against
/// the confirmed store happens.
#[derive(Debug, Clone)]
pub enum BlockOrigin {
	/// Extends the current best chain directly.
	CanonChain { block_number: u32 },
	/// Extends some other chain whose cumulative work is still behind the
	/// best chain; no reorganization is needed.
	SideChain(SideChainOrigin),
	/// Extends a side chain whose cumulative work now exceeds the best
	/// chain; `ChainEngine::reorganize` must run.
	SideChainBecomingCanonChain(SideChainOrigin),
}

/// Describes a side branch: the point where it forks off the main chain
/// and the headers leading from there down to the new block, from oldest
/// to newest.
#[derive(Debug, Clone)]
pub struct SideChainOrigin {
	/// Headers between the fork point (exclusive) and the new block
	/// (inclusive), oldest first.
	pub ancestors: Vec<IndexedBlockHeader>,
	/// Height of the fork point in the current best chain.
	pub fork_point_number: u32,
	/// Hash of the fork point.
	pub fork_point_hash: H256,
	/// Height of the best-chain blocks this side chain would replace, if
	/// it becomes canonical.
	pub decanonized: Vec<H256>,
}
