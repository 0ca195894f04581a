use talon_chain::{IndexedTransaction, OutPoint, Transaction, TransactionInput, TransactionOutput};

/// Fluent transaction construction for tests. Consuming methods so a chain
/// of `.add_input(...).add_output(...)` reads like the transaction's actual
/// shape instead of a sequence of mutations.
#[derive(Debug, Default, Clone)]
pub struct TransactionBuilder {
	transaction: Transaction,
}

impl TransactionBuilder {
	pub fn coinbase() -> TransactionBuilder {
		let mut builder = TransactionBuilder::default();
		builder.transaction.inputs.push(TransactionInput::coinbase(Vec::new()));
		builder
	}

	pub fn with_version(version: i32) -> TransactionBuilder {
		TransactionBuilder::default().set_version(version)
	}

	pub fn with_output(value: u64) -> TransactionBuilder {
		TransactionBuilder::default().add_output(value)
	}

	pub fn with_input(transaction: &Transaction, output_index: u32) -> TransactionBuilder {
		TransactionBuilder::default().add_input(transaction, output_index)
	}

	pub fn set_version(mut self, version: i32) -> Self {
		self.transaction.version = version;
		self
	}

	pub fn set_lock_time(mut self, lock_time: u32) -> Self {
		self.transaction.lock_time = lock_time;
		self
	}

	pub fn add_output(mut self, value: u64) -> Self {
		self.transaction.outputs.push(TransactionOutput { value, script_pubkey: Vec::new() });
		self
	}

	pub fn add_input(mut self, transaction: &Transaction, output_index: u32) -> Self {
		self.transaction.inputs.push(TransactionInput {
			previous_output: OutPoint { hash: transaction.hash(), index: output_index },
			script_sig: Vec::new(),
			sequence: 0xffff_ffff,
		});
		self
	}

	pub fn add_outpoint_input(mut self, previous_output: OutPoint) -> Self {
		self.transaction.inputs.push(TransactionInput {
			previous_output,
			script_sig: Vec::new(),
			sequence: 0xffff_ffff,
		});
		self
	}

	pub fn lock(mut self) -> Self {
		if let Some(input) = self.transaction.inputs.first_mut() {
			input.sequence = 0;
		}
		self.transaction.lock_time = 500_000;
		self
	}

	pub fn build(self) -> Transaction {
		self.transaction
	}

	pub fn indexed(self) -> IndexedTransaction {
		IndexedTransaction::from_raw(self.transaction)
	}
}
