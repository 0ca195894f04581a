use bit_vec::BitVec;

/// Lightweight confirmed-transaction metadata used by the verification
/// layer for BIP30 (no duplicate unspent hashes) and coinbase maturity
/// checks. The authoritative spent-output record (including *where* the
/// spending transaction lives on disk) is `talon_db`'s `TxIndexEntry`; this
/// type only needs "is output `k` still unspent".
#[derive(Debug, Clone)]
pub struct TransactionMeta {
	height: u32,
	is_coinbase: bool,
	spent: BitVec,
}

impl TransactionMeta {
	pub fn new(height: u32, outputs: usize) -> Self {
		TransactionMeta {
			height,
			is_coinbase: false,
			spent: BitVec::from_elem(outputs, false),
		}
	}

	pub fn new_coinbase(height: u32, outputs: usize) -> Self {
		let mut meta = TransactionMeta::new(height, outputs);
		meta.is_coinbase = true;
		meta
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn is_coinbase(&self) -> bool {
		self.is_coinbase
	}

	pub fn is_spent(&self, index: usize) -> bool {
		self.spent.get(index).unwrap_or(true)
	}

	pub fn note_spent(&mut self, index: usize) {
		if index < self.spent.len() {
			self.spent.set(index, true);
		}
	}

	pub fn note_unspent(&mut self, index: usize) {
		if index < self.spent.len() {
			self.spent.set(index, false);
		}
	}

	pub fn is_fully_spent(&self) -> bool {
		self.spent.iter().all(|b| b)
	}
}

#[cfg(test)]
mod tests {
	use super::TransactionMeta;

	#[test]
	fn starts_fully_unspent() {
		let meta = TransactionMeta::new(10, 3);
		assert!(!meta.is_fully_spent());
		assert!(!meta.is_spent(0));
	}

	#[test]
	fn becomes_fully_spent() {
		let mut meta = TransactionMeta::new(10, 2);
		meta.note_spent(0);
		assert!(!meta.is_fully_spent());
		meta.note_spent(1);
		assert!(meta.is_fully_spent());
	}
}
