use talon_serialization::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

/// Where some piece of confirmed data lives inside a `BlockFile` segment.
/// `tx_offset_in_block` lets a `TxIndex` entry's spent-slot record point
/// directly at the spending transaction without re-parsing the whole
/// block it landed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskPosition {
	pub file: u32,
	pub offset: u32,
	pub tx_offset_in_block: u32,
}

impl DiskPosition {
	pub fn new(file: u32, offset: u32, tx_offset_in_block: u32) -> Self {
		DiskPosition {
			file,
			offset,
			tx_offset_in_block,
		}
	}

	/// Position of the block itself (as opposed to one transaction within
	/// it): `tx_offset_in_block` is meaningless here and set to zero.
	pub fn for_block(file: u32, offset: u32) -> Self {
		DiskPosition {
			file,
			offset,
			tx_offset_in_block: 0,
		}
	}
}

impl Serializable for DiskPosition {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.file).append(&self.offset).append(&self.tx_offset_in_block);
	}
}

impl Deserializable for DiskPosition {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(DiskPosition {
			file: reader.read()?,
			offset: reader.read()?,
			tx_offset_in_block: reader.read()?,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serialize_roundtrip() {
		let position = DiskPosition::new(3, 1024, 7);
		let bytes = talon_serialization::serialize(&position);
		let back: DiskPosition = talon_serialization::deserialize(&bytes).unwrap();
		assert_eq!(back, position);
	}
}
