use talon_primitives::bigint::U256;
use talon_primitives::hash::{H160, H256};

#[derive(Debug, Default)]
pub struct Stream {
	buffer: Vec<u8>,
}

impl Stream {
	pub fn append<T: Serializable>(&mut self, t: &T) -> &mut Self {
		t.serialize(self);
		self
	}

	pub fn append_bytes(&mut self, bytes: &[u8]) -> &mut Self {
		self.buffer.extend_from_slice(bytes);
		self
	}

	pub fn append_var_bytes(&mut self, bytes: &[u8]) -> &mut Self {
		use crate::compact_integer::CompactInteger;
		self.append(&CompactInteger::from(bytes.len()));
		self.append_bytes(bytes);
		self
	}

	pub fn append_list<T: Serializable>(&mut self, list: &[T]) -> &mut Self {
		use crate::compact_integer::CompactInteger;
		self.append(&CompactInteger::from(list.len()));
		for item in list {
			self.append(item);
		}
		self
	}

	pub fn out(self) -> Vec<u8> {
		self.buffer
	}
}

pub trait Serializable {
	fn serialize(&self, stream: &mut Stream);

	/// Serialized length in bytes. The default implementation is correct but
	/// allocates; types on a hot path (transactions, blocks) override it.
	fn serialized_size(&self) -> usize {
		let mut stream = Stream::default();
		self.serialize(&mut stream);
		stream.out().len()
	}
}

macro_rules! impl_serializable_for_fixed {
	($ty:ty) => {
		impl Serializable for $ty {
			fn serialize(&self, stream: &mut Stream) {
				stream.append_bytes(&self.to_le_bytes());
			}

			fn serialized_size(&self) -> usize {
				std::mem::size_of::<$ty>()
			}
		}
	};
}

impl_serializable_for_fixed!(u8);
impl_serializable_for_fixed!(u16);
impl_serializable_for_fixed!(u32);
impl_serializable_for_fixed!(u64);
impl_serializable_for_fixed!(i32);
impl_serializable_for_fixed!(i64);

impl Serializable for H256 {
	fn serialize(&self, stream: &mut Stream) {
		stream.append_bytes(self.as_bytes());
	}

	fn serialized_size(&self) -> usize {
		32
	}
}

impl Serializable for H160 {
	fn serialize(&self, stream: &mut Stream) {
		stream.append_bytes(self.as_bytes());
	}

	fn serialized_size(&self) -> usize {
		20
	}
}

impl Serializable for U256 {
	fn serialize(&self, stream: &mut Stream) {
		let mut bytes = [0u8; 32];
		self.to_little_endian(&mut bytes);
		stream.append_bytes(&bytes);
	}

	fn serialized_size(&self) -> usize {
		32
	}
}

impl Serializable for Vec<u8> {
	fn serialize(&self, stream: &mut Stream) {
		stream.append_var_bytes(self);
	}

	fn serialized_size(&self) -> usize {
		use crate::compact_integer::CompactInteger;
		CompactInteger::from(self.len()).serialized_size() + self.len()
	}
}

/// Presence flag followed by the value, for fields that are absent on some
/// records (e.g. a `BlockIndexRecord` with no successor yet).
impl<T: Serializable> Serializable for Option<T> {
	fn serialize(&self, stream: &mut Stream) {
		match self {
			Some(value) => {
				stream.append(&1u8).append(value);
			}
			None => {
				stream.append(&0u8);
			}
		}
	}
}
