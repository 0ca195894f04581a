use talon_chain::Transaction;
use talon_verification::SignatureVerifier;

/// Stand-in for the script/signature interpreter, named in spec §1 as an
/// external collaborator this core consumes but never implements.
/// Accepts every input unconditionally, the same permissive shape the
/// engine and mempool test suites use for their own fixture verifiers —
/// good enough to exercise acceptance, connection and reorg logic without
/// a real script engine behind it.
pub struct NullSignatureVerifier;

impl SignatureVerifier for NullSignatureVerifier {
	fn verify(&self, _previous_output_script: &[u8], _transaction: &Transaction, _input_index: usize) -> bool {
		true
	}
}
