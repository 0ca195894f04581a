//! In-memory block header DAG (spec §4.2). Nodes live in a flat arena and
//! are addressed by `u32` handle rather than by `Rc`/`RefCell`, so parent
//! and next-in-best-chain back-references are plain indices with no
//! reference-counting or borrow-checking overhead at lookup time.

use std::collections::HashMap;

use talon_chain::BlockHeader;
use talon_primitives::bigint::U256;
use talon_primitives::hash::H256;

use crate::disk_position::DiskPosition;

pub type NodeHandle = u32;

#[derive(Debug, Clone)]
pub struct IndexNode {
	pub hash: H256,
	pub header: BlockHeader,
	pub height: u32,
	pub cumulative_work: U256,
	pub parent: Option<NodeHandle>,
	/// Set only while this node sits on the best chain; cleared on reorg
	/// for nodes that fall off it (spec invariant 3).
	pub next: Option<NodeHandle>,
	pub file: u32,
	pub offset: u32,
}

/// The in-memory DAG. Every accepted block (valid or on a losing fork)
/// gets a node here and keeps it forever — nodes are never removed, only
/// relinked, matching the "never destroyed" lifecycle in spec §3.
#[derive(Debug, Default)]
pub struct BlockIndex {
	nodes: Vec<IndexNode>,
	by_hash: HashMap<H256, NodeHandle>,
	genesis: Option<NodeHandle>,
}

impl BlockIndex {
	pub fn new() -> Self {
		BlockIndex::default()
	}

	pub fn genesis_handle(&self) -> Option<NodeHandle> {
		self.genesis
	}

	pub fn genesis_hash(&self) -> Option<H256> {
		self.genesis.map(|handle| self.get(handle).hash.clone())
	}

	pub fn get(&self, handle: NodeHandle) -> &IndexNode {
		&self.nodes[handle as usize]
	}

	pub fn get_mut(&mut self, handle: NodeHandle) -> &mut IndexNode {
		&mut self.nodes[handle as usize]
	}

	pub fn handle_of(&self, hash: &H256) -> Option<NodeHandle> {
		self.by_hash.get(hash).copied()
	}

	pub fn contains(&self, hash: &H256) -> bool {
		self.by_hash.contains_key(hash)
	}

	/// Inserts the genesis node: no parent, height 0, cumulative work
	/// equal to the genesis block's own work.
	pub fn insert_genesis(&mut self, hash: H256, header: BlockHeader, work: U256, position: DiskPosition) -> NodeHandle {
		let handle = self.insert_node(IndexNode {
			hash,
			header,
			height: 0,
			cumulative_work: work,
			parent: None,
			next: None,
			file: position.file,
			offset: position.offset,
		});
		self.genesis = Some(handle);
		handle
	}

	/// Inserts a node whose parent is already indexed, computing height and
	/// cumulative work from it.
	pub fn insert_child(
		&mut self,
		hash: H256,
		header: BlockHeader,
		parent: NodeHandle,
		block_work: U256,
		position: DiskPosition,
	) -> NodeHandle {
		let (height, cumulative_work) = {
			let parent_node = self.get(parent);
			(parent_node.height + 1, parent_node.cumulative_work + block_work)
		};
		self.insert_node(IndexNode {
			hash,
			header,
			height,
			cumulative_work,
			parent: Some(parent),
			next: None,
			file: position.file,
			offset: position.offset,
		})
	}

	fn insert_node(&mut self, node: IndexNode) -> NodeHandle {
		let handle = self.nodes.len() as NodeHandle;
		self.by_hash.insert(node.hash.clone(), handle);
		self.nodes.push(node);
		handle
	}

	/// Sets `parent.next := Some(child)`, extending the best chain through
	/// `parent`.
	pub fn link_next(&mut self, parent: NodeHandle, child: NodeHandle) {
		self.get_mut(parent).next = Some(child);
	}

	/// Clears `parent.next`, the inverse applied when `parent` falls off
	/// the best chain during a reorg.
	pub fn unlink_next(&mut self, parent: NodeHandle) {
		self.get_mut(parent).next = None;
	}

	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_primitives::compact::Compact;

	fn header(nonce: u32) -> BlockHeader {
		BlockHeader {
			version: 1,
			previous_header_hash: H256::zero(),
			merkle_root: H256::zero(),
			time: 0,
			bits: Compact::max_value(),
			nonce,
		}
	}

	#[test]
	fn child_inherits_height_and_work() {
		let mut index = BlockIndex::new();
		let genesis = index.insert_genesis(H256::from([1u8; 32]), header(0), U256::from(10u32), DiskPosition::for_block(0, 0));
		let child = index.insert_child(
			H256::from([2u8; 32]),
			header(1),
			genesis,
			U256::from(5u32),
			DiskPosition::for_block(0, 100),
		);
		assert_eq!(index.get(child).height, 1);
		assert_eq!(index.get(child).cumulative_work, U256::from(15u32));
	}

	#[test]
	fn link_and_unlink_next() {
		let mut index = BlockIndex::new();
		let genesis = index.insert_genesis(H256::from([1u8; 32]), header(0), U256::from(1u32), DiskPosition::for_block(0, 0));
		let child = index.insert_child(H256::from([2u8; 32]), header(1), genesis, U256::from(1u32), DiskPosition::for_block(0, 50));
		index.link_next(genesis, child);
		assert_eq!(index.get(genesis).next, Some(child));
		index.unlink_next(genesis);
		assert_eq!(index.get(genesis).next, None);
	}
}
