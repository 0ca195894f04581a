use display_derive::Display;
use talon_verification::TransactionError;

/// Admission-time failures (spec §4.4). Distinct from
/// `talon_verification::Error`'s block-context kinds: a mempool rejection
/// never touches persisted state, so there is nothing to roll back.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum Error {
	#[display(fmt = "malformed transaction: {:?}", _0)]
	Malformed(TransactionError),
	#[display(fmt = "loose coinbase transaction")]
	Coinbase,
	#[display(fmt = "lock_time exceeds the 2038 guard")]
	LockTimeOverflow,
	#[display(fmt = "transaction below the minimum size or sigop budget")]
	OversizedOrExcessiveSigops,
	#[display(fmt = "transaction does not match a recognized standard template")]
	NonStandard,
	#[display(fmt = "transaction already known")]
	Duplicate,
	#[display(fmt = "conflicts with an already-pooled transaction")]
	DoubleSpend,
	#[display(fmt = "input {} is unavailable", _0)]
	InputsUnavailable(usize),
	#[display(fmt = "fee {} below the required minimum {}", _0, _1)]
	FeeTooLow(u64, u64),
	#[display(fmt = "rejected by the free-transaction rate limiter")]
	RateLimited,
}
