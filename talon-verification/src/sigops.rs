use talon_chain::constants::{SIGOPS_PER_CHECKMULTISIG, SIGOPS_PER_CHECKSIG};
use talon_chain::Transaction;

const OP_CHECKSIG: u8 = 0xac;
const OP_CHECKSIGVERIFY: u8 = 0xad;
const OP_CHECKMULTISIG: u8 = 0xae;
const OP_CHECKMULTISIGVERIFY: u8 = 0xaf;

/// Legacy (non-P2SH-aware, non-"accurate") sigop count: every
/// `OP_CHECKSIG`/`OP_CHECKSIGVERIFY` byte counts 1, every
/// `OP_CHECKMULTISIG`/`OP_CHECKMULTISIGVERIFY` byte counts 20. Counting
/// opcode bytes directly (rather than decoding push-data lengths to skip
/// over them) over-counts data that happens to contain those byte values,
/// but stays on the conservative side of the anti-DoS budget this feeds,
/// and needs no script interpreter (out of scope per this project).
pub fn transaction_sigops(tx: &Transaction) -> usize {
	let mut count = 0;
	for input in &tx.inputs {
		count += script_sigops(&input.script_sig);
	}
	for output in &tx.outputs {
		count += script_sigops(&output.script_pubkey);
	}
	count
}

fn script_sigops(script: &[u8]) -> usize {
	script
		.iter()
		.map(|&op| match op {
			OP_CHECKSIG | OP_CHECKSIGVERIFY => SIGOPS_PER_CHECKSIG,
			OP_CHECKMULTISIG | OP_CHECKMULTISIGVERIFY => SIGOPS_PER_CHECKMULTISIG,
			_ => 0,
		})
		.sum()
}

#[cfg(test)]
mod tests {
	use super::*;
	use talon_chain::{TransactionInput, TransactionOutput};

	#[test]
	fn counts_checksig_and_checkmultisig() {
		let tx = Transaction {
			version: 1,
			inputs: vec![TransactionInput { script_sig: vec![OP_CHECKSIG], ..Default::default() }],
			outputs: vec![TransactionOutput { value: 0, script_pubkey: vec![OP_CHECKMULTISIG] }],
			lock_time: 0,
		};
		assert_eq!(transaction_sigops(&tx), 1 + 20);
	}
}
