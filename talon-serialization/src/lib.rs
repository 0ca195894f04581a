//! Serialization primitives shared by the persisted on-disk records and the
//! block-file container format: fixed-width little-endian scalars, a
//! Bitcoin-style variable-length integer and a reader/writer pair wrapping
//! `byteorder`.

mod compact_integer;
mod reader;
mod stream;

pub use compact_integer::CompactInteger;
pub use reader::{Deserializable, Error, Reader};
pub use stream::{Serializable, Stream};

/// Serializes `t` into a freshly allocated byte buffer.
pub fn serialize<T: Serializable>(t: &T) -> Vec<u8> {
	let mut stream = Stream::default();
	stream.append(t);
	stream.out()
}

/// Deserializes `T` from `buf`, requiring every byte to be consumed.
pub fn deserialize<T: Deserializable>(buf: &[u8]) -> Result<T, Error> {
	let mut reader = Reader::new(buf);
	let result = reader.read()?;
	if reader.is_finished() {
		Ok(result)
	} else {
		Err(Error::UnreadData)
	}
}
