//! Compact ("bits") representation of a proof-of-work target, and the
//! cumulative-work arithmetic derived from it.
//!
//! Wire format: the top byte is the exponent (in bytes), the bottom three
//! bytes are the mantissa, matching Bitcoin's `nBits` encoding.

use crate::bigint::U256;

#[derive(Debug, PartialEq, Eq, Clone, Copy, PartialOrd, Ord, Default, Hash)]
pub struct Compact(u32);

impl From<u32> for Compact {
	fn from(u: u32) -> Self {
		Compact(u)
	}
}

impl From<Compact> for u32 {
	fn from(c: Compact) -> Self {
		c.0
	}
}

impl Compact {
	pub fn new(u: u32) -> Self {
		Compact(u)
	}

	pub fn max_value() -> Self {
		Compact(u32::max_value())
	}

	/// Decode into a 256-bit target. Returns `None` when the encoded value
	/// overflows 256 bits (mirrors Bitcoin Core's overflow guard).
	pub fn to_u256(&self) -> Result<U256, Error> {
		let size = self.0 >> 24;
		let mut word = self.0 & 0x007fffff;

		let result = if size <= 3 {
			word >>= 8 * (3 - size);
			U256::from(word)
		} else {
			U256::from(word) << (8 * (size - 3))
		};

		let is_negative = word != 0 && (self.0 & 0x00800000) != 0;
		let is_overflow = (word != 0 && size > 34)
			|| (word > 0xff && size > 33)
			|| (word > 0xffff && size > 32);

		if is_negative {
			Err(Error::Negative)
		} else if is_overflow {
			Err(Error::Overflow)
		} else {
			Ok(result)
		}
	}

	/// Encode a 256-bit target into its compact representation.
	pub fn from_u256(value: U256) -> Self {
		let mut size = (value.bits() + 7) / 8;
		let mut compact = if size <= 3 {
			(value.low_u64() << (8 * (3 - size))) as u32
		} else {
			let bn = value >> (8 * (size - 3));
			bn.low_u32()
		};

		if (compact & 0x00800000) != 0 {
			compact >>= 8;
			size += 1;
		}

		assert_eq!(compact & !0x007fffff, 0);
		assert!(size < 256);
		Compact(compact | (size as u32) << 24)
	}

	/// Work contributed by a block with this target: `floor(2^256 / (target + 1))`.
	pub fn to_work(&self) -> U256 {
		match self.to_u256() {
			Ok(target) => match target.checked_add(U256::one()) {
				Some(target_plus_one) if !target_plus_one.is_zero() => {
					(!target / target_plus_one) + U256::one()
				}
				_ => U256::zero(),
			},
			Err(_) => U256::zero(),
		}
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Error {
	Negative,
	Overflow,
}

#[cfg(test)]
mod tests {
	use super::Compact;
	use crate::bigint::U256;

	#[test]
	fn roundtrips_typical_target() {
		let target = U256::from(1u64) << 200;
		let compact = Compact::from_u256(target);
		let decoded = compact.to_u256().unwrap();
		// compact encoding is lossy (24 bits of mantissa); decoded <= target
		assert!(decoded <= target);
	}

	#[test]
	fn lower_bits_mean_more_work() {
		let easy = Compact::from_u256(U256::max_value() >> 1);
		let hard = Compact::from_u256(U256::max_value() >> 8);
		assert!(hard.to_work() > easy.to_work());
	}
}
