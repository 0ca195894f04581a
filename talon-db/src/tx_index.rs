use crate::disk_position::DiskPosition;
use talon_serialization::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

/// Persistent record backing spec §3's `TxIndex` entry: where the
/// transaction itself sits on disk, plus one spent-slot per output.
/// Invariant 1 (number of spent slots equals number of outputs) is
/// maintained by always constructing this with `new`, which sizes the
/// vector from the transaction being indexed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxIndexEntry {
	pub position: DiskPosition,
	pub height: u32,
	pub is_coinbase: bool,
	spent_slots: Vec<Option<DiskPosition>>,
}

impl TxIndexEntry {
	pub fn new(position: DiskPosition, height: u32, is_coinbase: bool, output_count: usize) -> Self {
		TxIndexEntry {
			position,
			height,
			is_coinbase,
			spent_slots: vec![None; output_count],
		}
	}

	pub fn output_count(&self) -> usize {
		self.spent_slots.len()
	}

	pub fn is_spent(&self, output_index: usize) -> bool {
		self.spent_slots.get(output_index).map(Option::is_some).unwrap_or(true)
	}

	pub fn spent_at(&self, output_index: usize) -> Option<DiskPosition> {
		self.spent_slots.get(output_index).copied().flatten()
	}

	/// Marks output `output_index` as spent by the transaction at
	/// `spender`. Returns `false` (and leaves the entry unchanged) if the
	/// slot was already spent, so callers can surface `DoubleSpend`.
	pub fn mark_spent(&mut self, output_index: usize, spender: DiskPosition) -> bool {
		match self.spent_slots.get_mut(output_index) {
			Some(slot @ None) => {
				*slot = Some(spender);
				true
			}
			_ => false,
		}
	}

	/// Clears a spent slot, the inverse applied by `disconnectBlock`.
	pub fn mark_unspent(&mut self, output_index: usize) {
		if let Some(slot) = self.spent_slots.get_mut(output_index) {
			*slot = None;
		}
	}

	pub fn is_fully_spent(&self) -> bool {
		self.spent_slots.iter().all(Option::is_some)
	}
}

impl Serializable for TxIndexEntry {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.position)
			.append(&self.height)
			.append(&(self.is_coinbase as u8))
			.append_list(&self.spent_slots);
	}
}

impl Deserializable for TxIndexEntry {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(TxIndexEntry {
			position: reader.read()?,
			height: reader.read()?,
			is_coinbase: reader.read_u8()? != 0,
			spent_slots: reader.read_list()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn marks_and_clears_spent_slots() {
		let mut entry = TxIndexEntry::new(DiskPosition::for_block(0, 0), 1, false, 2);
		assert!(!entry.is_spent(0));
		let spender = DiskPosition::new(1, 200, 3);
		assert!(entry.mark_spent(0, spender));
		assert!(entry.is_spent(0));
		assert_eq!(entry.spent_at(0), Some(spender));
		assert!(!entry.mark_spent(0, spender));
		entry.mark_unspent(0);
		assert!(!entry.is_spent(0));
	}

	#[test]
	fn fully_spent_requires_every_slot() {
		let mut entry = TxIndexEntry::new(DiskPosition::for_block(0, 0), 1, false, 2);
		entry.mark_spent(0, DiskPosition::new(1, 0, 0));
		assert!(!entry.is_fully_spent());
		entry.mark_spent(1, DiskPosition::new(1, 0, 1));
		assert!(entry.is_fully_spent());
	}

	#[test]
	fn serialize_roundtrip_with_mixed_spent_slots() {
		let mut entry = TxIndexEntry::new(DiskPosition::new(2, 512, 1), 9, true, 3);
		entry.mark_spent(1, DiskPosition::new(4, 0, 2));
		let bytes = talon_serialization::serialize(&entry);
		let back: TxIndexEntry = talon_serialization::deserialize(&bytes).unwrap();
		assert_eq!(back, entry);
	}
}
