//! 256-bit unsigned integer used for cumulative proof-of-work and difficulty
//! target arithmetic.

uint::construct_uint! {
	pub struct U256(4);
}
