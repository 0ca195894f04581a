use byteorder::{LittleEndian, ReadBytesExt};
use std::io;
use talon_primitives::bigint::U256;
use talon_primitives::hash::{H160, H256};

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Error {
	UnexpectedEnd,
	UnreadData,
	MalformedData,
}

impl From<io::Error> for Error {
	fn from(_: io::Error) -> Self {
		Error::UnexpectedEnd
	}
}

pub struct Reader<'a> {
	buffer: &'a [u8],
	cursor: usize,
}

impl<'a> Reader<'a> {
	pub fn new(buffer: &'a [u8]) -> Self {
		Reader { buffer, cursor: 0 }
	}

	pub fn read<T: Deserializable>(&mut self) -> Result<T, Error> {
		T::deserialize(self)
	}

	pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
		if self.cursor + len > self.buffer.len() {
			return Err(Error::UnexpectedEnd);
		}
		let slice = &self.buffer[self.cursor..self.cursor + len];
		self.cursor += len;
		Ok(slice)
	}

	pub fn read_u8(&mut self) -> Result<u8, Error> {
		Ok(self.read_bytes(1)?[0])
	}

	pub fn read_u16(&mut self) -> Result<u16, Error> {
		let mut bytes = self.read_bytes(2)?;
		Ok(bytes.read_u16::<LittleEndian>()?)
	}

	pub fn read_u32(&mut self) -> Result<u32, Error> {
		let mut bytes = self.read_bytes(4)?;
		Ok(bytes.read_u32::<LittleEndian>()?)
	}

	pub fn read_u64(&mut self) -> Result<u64, Error> {
		let mut bytes = self.read_bytes(8)?;
		Ok(bytes.read_u64::<LittleEndian>()?)
	}

	pub fn read_i32(&mut self) -> Result<i32, Error> {
		let mut bytes = self.read_bytes(4)?;
		Ok(bytes.read_i32::<LittleEndian>()?)
	}

	pub fn read_i64(&mut self) -> Result<i64, Error> {
		let mut bytes = self.read_bytes(8)?;
		Ok(bytes.read_i64::<LittleEndian>()?)
	}

	/// Variable-length byte string: a `CompactInteger` length prefix followed
	/// by that many bytes.
	pub fn read_var_bytes(&mut self) -> Result<Vec<u8>, Error> {
		use crate::compact_integer::CompactInteger;
		let len: usize = self.read::<CompactInteger>()?.into();
		Ok(self.read_bytes(len)?.to_vec())
	}

	pub fn read_list<T: Deserializable>(&mut self) -> Result<Vec<T>, Error> {
		use crate::compact_integer::CompactInteger;
		let len: usize = self.read::<CompactInteger>()?.into();
		let mut result = Vec::with_capacity(len.min(1 << 20));
		for _ in 0..len {
			result.push(self.read()?);
		}
		Ok(result)
	}

	pub fn is_finished(&self) -> bool {
		self.cursor == self.buffer.len()
	}
}

pub trait Deserializable: Sized {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error>;
}

macro_rules! impl_deserializable_for_fixed {
	($ty:ty, $read:ident) => {
		impl Deserializable for $ty {
			fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
				reader.$read()
			}
		}
	};
}

impl_deserializable_for_fixed!(u8, read_u8);
impl_deserializable_for_fixed!(u16, read_u16);
impl_deserializable_for_fixed!(u32, read_u32);
impl_deserializable_for_fixed!(u64, read_u64);
impl_deserializable_for_fixed!(i32, read_i32);
impl_deserializable_for_fixed!(i64, read_i64);

impl Deserializable for H256 {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
		let bytes = reader.read_bytes(32)?;
		let mut buf = [0u8; 32];
		buf.copy_from_slice(bytes);
		Ok(H256::from(buf))
	}
}

impl Deserializable for H160 {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
		let bytes = reader.read_bytes(20)?;
		let mut buf = [0u8; 20];
		buf.copy_from_slice(bytes);
		Ok(H160::from(buf))
	}
}

impl Deserializable for U256 {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
		let bytes = reader.read_bytes(32)?;
		Ok(U256::from_little_endian(bytes))
	}
}

impl Deserializable for Vec<u8> {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
		reader.read_var_bytes()
	}
}

impl<T: Deserializable> Deserializable for Option<T> {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, Error> {
		match reader.read_u8()? {
			0 => Ok(None),
			1 => Ok(Some(reader.read()?)),
			_ => Err(Error::MalformedData),
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::{deserialize, serialize};

	#[test]
	fn option_roundtrips_both_variants() {
		let some: Option<u32> = Some(42);
		let bytes = serialize(&some);
		assert_eq!(deserialize::<Option<u32>>(&bytes).unwrap(), some);

		let none: Option<u32> = None;
		let bytes = serialize(&none);
		assert_eq!(deserialize::<Option<u32>>(&bytes).unwrap(), none);
	}
}
