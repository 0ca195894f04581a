//! Variable-length integer: 1, 3, 5 or 9 bytes depending on magnitude,
//! matching the wire protocol's `CompactSize`.

use crate::reader::{Deserializable, Error, Reader};
use crate::stream::{Serializable, Stream};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct CompactInteger(u64);

impl From<u64> for CompactInteger {
	fn from(u: u64) -> Self {
		CompactInteger(u)
	}
}

impl From<usize> for CompactInteger {
	fn from(u: usize) -> Self {
		CompactInteger(u as u64)
	}
}

impl From<CompactInteger> for u64 {
	fn from(i: CompactInteger) -> Self {
		i.0
	}
}

impl From<CompactInteger> for usize {
	fn from(i: CompactInteger) -> Self {
		i.0 as usize
	}
}

impl Serializable for CompactInteger {
	fn serialize(&self, stream: &mut Stream) {
		match self.0 {
			0..=0xfc => {
				stream.append_bytes(&[self.0 as u8]);
			}
			0xfd..=0xffff => {
				stream.append_bytes(&[0xfd]);
				stream.append_bytes(&(self.0 as u16).to_le_bytes());
			}
			0x10000..=0xffff_ffff => {
				stream.append_bytes(&[0xfe]);
				stream.append_bytes(&(self.0 as u32).to_le_bytes());
			}
			_ => {
				stream.append_bytes(&[0xff]);
				stream.append_bytes(&self.0.to_le_bytes());
			}
		}
	}
}

impl Deserializable for CompactInteger {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
		let first = reader.read_u8()?;
		let value = match first {
			0xff => reader.read_u64()?,
			0xfe => reader.read_u32()? as u64,
			0xfd => reader.read_u16()? as u64,
			_ => first as u64,
		};
		Ok(CompactInteger(value))
	}
}

#[cfg(test)]
mod tests {
	use super::CompactInteger;
	use crate::{deserialize, serialize};

	#[test]
	fn roundtrips_across_size_classes() {
		for value in [0u64, 0xfc, 0xfd, 0xffff, 0x1_0000, 0xffff_ffff, u64::max_value()] {
			let ci = CompactInteger::from(value);
			let bytes = serialize(&ci);
			let back: CompactInteger = deserialize(&bytes).unwrap();
			assert_eq!(back, ci);
		}
	}

	#[test]
	fn uses_shortest_encoding_for_small_values() {
		assert_eq!(serialize(&CompactInteger::from(5u64)).len(), 1);
		assert_eq!(serialize(&CompactInteger::from(0xfdu64)).len(), 3);
	}
}
