use crate::constants::{LOCKTIME_THRESHOLD, SEQUENCE_FINAL};
use crate::hasher::dhash256;
use talon_primitives::hash::H256;
use talon_serialization::{Deserializable, Error as ReaderError, Reader, Serializable, Stream};

#[derive(Debug, PartialEq, Eq, Clone, Default, Hash)]
pub struct OutPoint {
	pub hash: H256,
	pub index: u32,
}

impl OutPoint {
	pub fn null() -> Self {
		OutPoint {
			hash: H256::zero(),
			index: u32::max_value(),
		}
	}

	pub fn is_null(&self) -> bool {
		self.hash.is_zero() && self.index == u32::max_value()
	}
}

impl Serializable for OutPoint {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.hash).append(&self.index);
	}
}

impl Deserializable for OutPoint {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(OutPoint {
			hash: reader.read()?,
			index: reader.read()?,
		})
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct TransactionInput {
	pub previous_output: OutPoint,
	pub script_sig: Vec<u8>,
	pub sequence: u32,
}

impl TransactionInput {
	/// Build the single input of a coinbase transaction.
	pub fn coinbase(script_sig: Vec<u8>) -> Self {
		TransactionInput {
			previous_output: OutPoint::null(),
			script_sig,
			sequence: SEQUENCE_FINAL,
		}
	}

	pub fn is_final(&self) -> bool {
		self.sequence == SEQUENCE_FINAL
	}
}

impl Serializable for TransactionInput {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.previous_output)
			.append(&self.script_sig)
			.append(&self.sequence);
	}
}

impl Deserializable for TransactionInput {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(TransactionInput {
			previous_output: reader.read()?,
			script_sig: reader.read_var_bytes()?,
			sequence: reader.read()?,
		})
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct TransactionOutput {
	pub value: u64,
	pub script_pubkey: Vec<u8>,
}

impl Serializable for TransactionOutput {
	fn serialize(&self, stream: &mut Stream) {
		stream.append(&self.value).append(&self.script_pubkey);
	}
}

impl Deserializable for TransactionOutput {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(TransactionOutput {
			value: reader.read()?,
			script_pubkey: reader.read_var_bytes()?,
		})
	}
}

#[derive(Debug, PartialEq, Eq, Clone, Default)]
pub struct Transaction {
	pub version: i32,
	pub inputs: Vec<TransactionInput>,
	pub outputs: Vec<TransactionOutput>,
	pub lock_time: u32,
}

impl Serializable for Transaction {
	fn serialize(&self, stream: &mut Stream) {
		stream
			.append(&self.version)
			.append_list(&self.inputs)
			.append_list(&self.outputs)
			.append(&self.lock_time);
	}
}

impl Deserializable for Transaction {
	fn deserialize<'a>(reader: &mut Reader<'a>) -> Result<Self, ReaderError> {
		Ok(Transaction {
			version: reader.read()?,
			inputs: reader.read_list()?,
			outputs: reader.read_list()?,
			lock_time: reader.read()?,
		})
	}
}

impl Transaction {
	pub fn hash(&self) -> H256 {
		dhash256(&talon_serialization::serialize(self))
	}

	pub fn is_coinbase(&self) -> bool {
		self.inputs.len() == 1 && self.inputs[0].previous_output.is_null()
	}

	/// Sum of all output values. Named to match the spend-side of the
	/// balance equation (§3 invariant 7): for a non-coinbase transaction this
	/// must be covered by the sum of its inputs' previous output values.
	pub fn total_spends(&self) -> u64 {
		self.outputs.iter().map(|output| output.value).sum()
	}

	/// Transaction finality per §4.3 step 5: either no lock time, or the
	/// lock time has passed (interpreted as height or timestamp depending on
	/// the threshold) and no input opts out of finality.
	pub fn is_final_in_block(&self, height: u32, block_time: u32) -> bool {
		if self.lock_time == 0 {
			return true;
		}
		let lock_time_reached = if self.lock_time < LOCKTIME_THRESHOLD {
			self.lock_time < height
		} else {
			self.lock_time < block_time
		};
		lock_time_reached && self.inputs.iter().all(TransactionInput::is_final)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn coinbase_roundtrip() {
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase(vec![1, 2, 3])],
			outputs: vec![TransactionOutput {
				value: 50_000_000,
				script_pubkey: vec![0xac],
			}],
			lock_time: 0,
		};
		assert!(tx.is_coinbase());
		let bytes = talon_serialization::serialize(&tx);
		let back: Transaction = talon_serialization::deserialize(&bytes).unwrap();
		assert_eq!(back, tx);
	}

	#[test]
	fn lock_time_zero_is_always_final() {
		let tx = Transaction::default();
		assert!(tx.is_final_in_block(0, 0));
	}

	#[test]
	fn height_locked_transaction_respects_threshold() {
		let mut tx = Transaction {
			lock_time: 100,
			inputs: vec![TransactionInput {
				previous_output: OutPoint::null(),
				script_sig: Vec::new(),
				sequence: SEQUENCE_FINAL,
			}],
			..Default::default()
		};
		assert!(!tx.is_final_in_block(100, 0));
		assert!(tx.is_final_in_block(101, 0));

		tx.lock_time = LOCKTIME_THRESHOLD + 100;
		assert!(!tx.is_final_in_block(1_000_000, LOCKTIME_THRESHOLD + 100));
		assert!(tx.is_final_in_block(1_000_000, LOCKTIME_THRESHOLD + 101));
	}

	#[test]
	fn non_final_input_blocks_finality_even_past_locktime() {
		let tx = Transaction {
			lock_time: 1,
			inputs: vec![TransactionInput {
				previous_output: OutPoint::null(),
				script_sig: Vec::new(),
				sequence: 0,
			}],
			..Default::default()
		};
		assert!(!tx.is_final_in_block(1_000, 0));
	}
}
