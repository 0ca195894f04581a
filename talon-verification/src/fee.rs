use talon_chain::Transaction;
use talon_storage::TransactionOutputProvider;

use crate::error::TransactionError;

/// Miner fee for `tx`: sum of its resolved inputs minus the sum of its
/// outputs (§3 invariant 7). `tx_idx` is the transaction's position within
/// the block or mempool batch being verified, passed through to the output
/// provider so it can resolve outputs created earlier in the same batch.
pub fn checked_transaction_fee(
	store: &dyn TransactionOutputProvider,
	tx_idx: usize,
	tx: &Transaction,
) -> Result<u64, TransactionError> {
	let mut incoming: u64 = 0;
	for (input_idx, input) in tx.inputs.iter().enumerate() {
		let prevout = match store.transaction_output(&input.previous_output, tx_idx) {
			Some(prevout) => prevout,
			None => return Err(TransactionError::Input(input_idx)),
		};
		incoming = incoming
			.checked_add(prevout.value)
			.ok_or(TransactionError::InputValueOverflow)?;
	}

	let spends = tx.total_spends();

	incoming.checked_sub(spends).ok_or(TransactionError::Overspend)
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{OutPoint, TransactionInput, TransactionOutput};

	struct FixedOutputs(Vec<(OutPoint, TransactionOutput)>);

	impl TransactionOutputProvider for FixedOutputs {
		fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
			self.0
				.iter()
				.find(|(candidate, _)| candidate == outpoint)
				.map(|(_, output)| output.clone())
		}

		fn is_spent(&self, _outpoint: &OutPoint) -> bool {
			false
		}
	}

	#[test]
	fn fee_is_inputs_minus_outputs() {
		let outpoint = OutPoint { hash: Default::default(), index: 0 };
		let store = FixedOutputs(vec![(
			outpoint.clone(),
			TransactionOutput { value: 1_000, script_pubkey: Vec::new() },
		)]);
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput { previous_output: outpoint, script_sig: Vec::new(), sequence: 0 }],
			outputs: vec![TransactionOutput { value: 900, script_pubkey: Vec::new() }],
			lock_time: 0,
		};
		assert_eq!(checked_transaction_fee(&store, 0, &tx).unwrap(), 100);
	}

	#[test]
	fn missing_input_is_an_error() {
		let store = FixedOutputs(Vec::new());
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput::default()],
			outputs: Vec::new(),
			lock_time: 0,
		};
		assert_eq!(
			checked_transaction_fee(&store, 0, &tx),
			Err(TransactionError::Input(0))
		);
	}

	#[test]
	fn overspend_is_an_error() {
		let outpoint = OutPoint { hash: Default::default(), index: 0 };
		let store = FixedOutputs(vec![(
			outpoint.clone(),
			TransactionOutput { value: 100, script_pubkey: Vec::new() },
		)]);
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput { previous_output: outpoint, script_sig: Vec::new(), sequence: 0 }],
			outputs: vec![TransactionOutput { value: 900, script_pubkey: Vec::new() }],
			lock_time: 0,
		};
		assert_eq!(checked_transaction_fee(&store, 0, &tx), Err(TransactionError::Overspend));
	}
}
