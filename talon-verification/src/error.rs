use display_derive::Display;

/// Error kinds surfaced by the core (spec §7). Consensus failures are
/// returned and logged; none of them mutate store state.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum Error {
	#[display(fmt = "block or transaction already known")]
	Duplicate,
	#[display(fmt = "parent block is unknown")]
	UnknownParent,
	#[display(fmt = "proof of work does not meet required difficulty")]
	BadProofOfWork,
	#[display(fmt = "block timestamp is not greater than the median of its ancestors")]
	BadTimestamp,
	#[display(fmt = "block hash does not match the checkpoint at this height")]
	BadCheckpoint,
	#[display(fmt = "transaction {} is not final", _0)]
	NonFinal(usize),
	#[display(fmt = "malformed transaction: {:?}", _0)]
	BadTransaction(TransactionError),
	#[display(fmt = "input unavailable for transaction {}: {:?}", _0, _1)]
	InputsUnavailable(usize, TransactionError),
	#[display(fmt = "script verification failed for transaction {}", _0)]
	ScriptVerifyFailed(usize),
	#[display(fmt = "double spend detected for transaction {}", _0)]
	DoubleSpend(usize),
	#[display(fmt = "coinbase pays out more than subsidy plus fees")]
	CoinbaseOverspend,
	#[display(fmt = "block exceeds the maximum size or sigop budget")]
	OversizedOrExcessiveSigops,
	#[display(fmt = "I/O error: {}", _0)]
	Io(String),
}

/// Reasons a single transaction fails well-formedness or input resolution
/// checks, nested inside `Error::BadTransaction` / `Error::InputsUnavailable`.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum TransactionError {
	#[display(fmt = "transaction has no inputs")]
	Empty,
	#[display(fmt = "loose coinbase transaction")]
	CoinbaseAsLoose,
	#[display(fmt = "output value out of range")]
	ValueOverflow,
	#[display(fmt = "input {} references an unknown or already-spent output", _0)]
	Input(usize),
	#[display(fmt = "sum of input values overflows")]
	InputValueOverflow,
	#[display(fmt = "sum of output values overflows")]
	OutputValueOverflow,
	#[display(fmt = "transaction spends more than it receives")]
	Overspend,
	#[display(fmt = "coinbase is not yet mature ({} confirmations required)", _0)]
	Immature(u32),
	#[display(fmt = "lock_time exceeds the 2038 guard")]
	LockTimeOverflow,
}
