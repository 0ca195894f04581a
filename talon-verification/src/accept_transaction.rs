use talon_chain::Transaction;
use talon_chainparams::ConsensusParams;
use talon_serialization::Serializable;
use talon_storage::{DuplexTransactionOutputProvider, TransactionMetaProvider};

use crate::canon::CanonTransaction;
use crate::error::TransactionError;

/// The script/signature interpreter is an external collaborator (§1); this
/// is its named interface. A concrete implementation lives wherever the
/// node wires in the actual engine.
pub trait SignatureVerifier {
	fn verify(&self, previous_output_script: &[u8], transaction: &Transaction, input_index: usize) -> bool;
}

/// Full (contextual) transaction verification, composed of one checker
/// struct per rule, matching the order acceptBlock's step 5 and
/// `connectInputs` apply them in.
pub struct TransactionAcceptor<'a> {
	pub size: TransactionSize<'a>,
	pub missing_inputs: TransactionMissingInputs<'a>,
	pub maturity: TransactionMaturity<'a>,
	pub double_spend: TransactionDoubleSpend<'a>,
	pub eval: TransactionEval<'a>,
}

impl<'a> TransactionAcceptor<'a> {
	pub fn new(
		meta_store: &'a dyn TransactionMetaProvider,
		output_store: DuplexTransactionOutputProvider<'a>,
		signature_verifier: &'a dyn SignatureVerifier,
		consensus: &'a ConsensusParams,
		transaction: CanonTransaction<'a>,
		height: u32,
		transaction_index: usize,
	) -> Self {
		TransactionAcceptor {
			size: TransactionSize::new(transaction, consensus),
			missing_inputs: TransactionMissingInputs::new(transaction, output_store, transaction_index),
			maturity: TransactionMaturity::new(transaction, meta_store, height, consensus.coinbase_maturity),
			double_spend: TransactionDoubleSpend::new(transaction, output_store),
			eval: TransactionEval::new(transaction, output_store, signature_verifier),
		}
	}

	pub fn check(&self) -> Result<(), TransactionError> {
		self.size.check()?;
		self.missing_inputs.check()?;
		self.maturity.check()?;
		self.double_spend.check()?;
		self.eval.check()?;
		Ok(())
	}
}

/// The mempool's admission-time variant (spec §4.4 step 8): same checks,
/// minus BIP30-style duplicate-hash bookkeeping that only matters when
/// replaying a block.
pub struct MemoryPoolTransactionAcceptor<'a> {
	pub missing_inputs: TransactionMissingInputs<'a>,
	pub maturity: TransactionMaturity<'a>,
	pub double_spend: TransactionDoubleSpend<'a>,
	pub eval: TransactionEval<'a>,
}

impl<'a> MemoryPoolTransactionAcceptor<'a> {
	pub fn new(
		meta_store: &'a dyn TransactionMetaProvider,
		output_store: DuplexTransactionOutputProvider<'a>,
		signature_verifier: &'a dyn SignatureVerifier,
		consensus: &'a ConsensusParams,
		transaction: CanonTransaction<'a>,
		height: u32,
	) -> Self {
		let transaction_index = usize::max_value();
		MemoryPoolTransactionAcceptor {
			missing_inputs: TransactionMissingInputs::new(transaction, output_store, transaction_index),
			maturity: TransactionMaturity::new(transaction, meta_store, height, consensus.coinbase_maturity),
			double_spend: TransactionDoubleSpend::new(transaction, output_store),
			eval: TransactionEval::new(transaction, output_store, signature_verifier),
		}
	}

	pub fn check(&self) -> Result<(), TransactionError> {
		self.missing_inputs.check()?;
		self.maturity.check()?;
		self.double_spend.check()?;
		self.eval.check()?;
		Ok(())
	}
}

pub struct TransactionMissingInputs<'a> {
	transaction: CanonTransaction<'a>,
	store: DuplexTransactionOutputProvider<'a>,
	transaction_index: usize,
}

impl<'a> TransactionMissingInputs<'a> {
	fn new(transaction: CanonTransaction<'a>, store: DuplexTransactionOutputProvider<'a>, transaction_index: usize) -> Self {
		TransactionMissingInputs { transaction, store, transaction_index }
	}

	fn check(&self) -> Result<(), TransactionError> {
		let missing_index = self.transaction.raw().inputs.iter().position(|input| {
			!input.previous_output.is_null()
				&& self.store.transaction_output(&input.previous_output, self.transaction_index).is_none()
		});

		match missing_index {
			Some(index) => Err(TransactionError::Input(index)),
			None => Ok(()),
		}
	}
}

/// Coinbase maturity: an input spending a coinbase output must wait
/// `coinbase_maturity` confirmations (acceptBlock / `connectInputs`).
pub struct TransactionMaturity<'a> {
	transaction: CanonTransaction<'a>,
	store: &'a dyn TransactionMetaProvider,
	height: u32,
	coinbase_maturity: u32,
}

impl<'a> TransactionMaturity<'a> {
	fn new(transaction: CanonTransaction<'a>, store: &'a dyn TransactionMetaProvider, height: u32, coinbase_maturity: u32) -> Self {
		TransactionMaturity { transaction, store, height, coinbase_maturity }
	}

	fn check(&self) -> Result<(), TransactionError> {
		let immature_spend = self.transaction.raw().inputs.iter().any(|input| {
			match self.store.transaction_meta(&input.previous_output.hash) {
				Some(ref meta) if meta.is_coinbase() => self.height < meta.height() + self.coinbase_maturity,
				_ => false,
			}
		});

		if immature_spend {
			Err(TransactionError::Immature(self.coinbase_maturity))
		} else {
			Ok(())
		}
	}
}

pub struct TransactionDoubleSpend<'a> {
	transaction: CanonTransaction<'a>,
	store: DuplexTransactionOutputProvider<'a>,
}

impl<'a> TransactionDoubleSpend<'a> {
	fn new(transaction: CanonTransaction<'a>, store: DuplexTransactionOutputProvider<'a>) -> Self {
		TransactionDoubleSpend { transaction, store }
	}

	fn check(&self) -> Result<(), TransactionError> {
		for input in &self.transaction.raw().inputs {
			if self.store.is_spent(&input.previous_output) {
				return Err(TransactionError::Input(0));
			}
		}
		Ok(())
	}
}

/// Encoded size must stay within the chain's per-transaction ceiling.
pub struct TransactionSize<'a> {
	transaction: CanonTransaction<'a>,
	max_size: usize,
}

impl<'a> TransactionSize<'a> {
	fn new(transaction: CanonTransaction<'a>, consensus: &'a ConsensusParams) -> Self {
		TransactionSize { transaction, max_size: consensus.max_transaction_size }
	}

	fn check(&self) -> Result<(), TransactionError> {
		if self.transaction.raw().serialized_size() > self.max_size {
			Err(TransactionError::ValueOverflow)
		} else {
			Ok(())
		}
	}
}

/// Per-input script verification, delegating to the external collaborator.
pub struct TransactionEval<'a> {
	transaction: CanonTransaction<'a>,
	store: DuplexTransactionOutputProvider<'a>,
	verifier: &'a dyn SignatureVerifier,
}

impl<'a> TransactionEval<'a> {
	fn new(transaction: CanonTransaction<'a>, store: DuplexTransactionOutputProvider<'a>, verifier: &'a dyn SignatureVerifier) -> Self {
		TransactionEval { transaction, store, verifier }
	}

	fn check(&self) -> Result<(), TransactionError> {
		if self.transaction.raw().is_coinbase() {
			return Ok(());
		}

		for (index, input) in self.transaction.raw().inputs.iter().enumerate() {
			let output = match self.store.transaction_output(&input.previous_output, usize::max_value()) {
				Some(output) => output,
				None => return Err(TransactionError::Input(index)),
			};

			if !self.verifier.verify(&output.script_pubkey, self.transaction.raw(), index) {
				return Err(TransactionError::Input(index));
			}
		}

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{OutPoint, TransactionInput, TransactionOutput};
	use talon_storage::NoopStore;

	struct AlwaysValid;
	impl SignatureVerifier for AlwaysValid {
		fn verify(&self, _script: &[u8], _tx: &Transaction, _input_index: usize) -> bool {
			true
		}
	}

	struct AlwaysInvalid;
	impl SignatureVerifier for AlwaysInvalid {
		fn verify(&self, _script: &[u8], _tx: &Transaction, _input_index: usize) -> bool {
			false
		}
	}

	#[test]
	fn coinbase_skips_script_checks() {
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput::coinbase(Vec::new())],
			outputs: vec![TransactionOutput { value: 1, script_pubkey: Vec::new() }],
			lock_time: 0,
		};
		let indexed = talon_chain::IndexedTransaction::from_raw(tx);
		let canon = CanonTransaction::new(&indexed);
		let noop = NoopStore;
		let dup = DuplexTransactionOutputProvider::new(&noop, &noop);
		let eval = TransactionEval::new(canon, dup, &AlwaysInvalid);
		assert!(eval.check().is_ok());
	}

	#[test]
	fn failing_verifier_rejects_spend() {
		let outpoint = OutPoint { hash: Default::default(), index: 0 };
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput { previous_output: outpoint.clone(), script_sig: Vec::new(), sequence: 0 }],
			outputs: vec![TransactionOutput { value: 1, script_pubkey: Vec::new() }],
			lock_time: 0,
		};
		let indexed = talon_chain::IndexedTransaction::from_raw(tx);
		let canon = CanonTransaction::new(&indexed);

		struct OneOutput(OutPoint, TransactionOutput);
		impl talon_storage::TransactionOutputProvider for OneOutput {
			fn transaction_output(&self, outpoint: &OutPoint, _transaction_index: usize) -> Option<TransactionOutput> {
				if outpoint == &self.0 { Some(self.1.clone()) } else { None }
			}
			fn is_spent(&self, _outpoint: &OutPoint) -> bool {
				false
			}
		}
		let store = OneOutput(outpoint, TransactionOutput { value: 1, script_pubkey: Vec::new() });
		let noop = NoopStore;
		let dup = DuplexTransactionOutputProvider::new(&store, &noop);
		let eval = TransactionEval::new(canon, dup, &AlwaysValid);
		assert!(eval.check().is_ok());

		let dup_fail = DuplexTransactionOutputProvider::new(&store, &noop);
		let eval_fail = TransactionEval::new(canon, dup_fail, &AlwaysInvalid);
		assert_eq!(eval_fail.check(), Err(TransactionError::Input(0)));
	}
}
