use crate::hasher::dhash256;
use talon_primitives::compact::Compact;
use talon_primitives::hash::H256;
use talon_serialization::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct BlockHeader {
	pub version: u32,
	pub previous_header_hash: H256,
	pub merkle_root: H256,
	pub time: u32,
	pub bits: Compact,
	pub nonce: u32,
}

impl Serializable for BlockHeader {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.version)
			.append(&self.previous_header_hash)
			.append(&self.merkle_root)
			.append(&self.time)
			.append(&u32::from(self.bits))
			.append(&self.nonce);
	}
}

impl Deserializable for BlockHeader {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(BlockHeader {
			version: reader.read()?,
			previous_header_hash: reader.read()?,
			merkle_root: reader.read()?,
			time: reader.read()?,
			bits: Compact::new(reader.read()?),
			nonce: reader.read()?,
		})
	}
}

/// Hash of the serialized header: the block hash.
pub fn block_header_hash(header: &BlockHeader) -> H256 {
	dhash256(&talon_serialization::serialize(header))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn serialize_roundtrip() {
		let header = BlockHeader {
			version: 1,
			previous_header_hash: H256::from([1u8; 32]),
			merkle_root: H256::from([2u8; 32]),
			time: 100,
			bits: Compact::new(0x1d00ffff),
			nonce: 42,
		};
		let bytes = talon_serialization::serialize(&header);
		let back: BlockHeader = talon_serialization::deserialize(&bytes).unwrap();
		assert_eq!(back, header);
	}

	#[test]
	fn different_nonce_changes_hash() {
		let mut header = BlockHeader::default();
		let h1 = block_header_hash(&header);
		header.nonce = 1;
		let h2 = block_header_hash(&header);
		assert_ne!(h1, h2);
	}
}
