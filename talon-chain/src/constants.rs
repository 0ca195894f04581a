//! Chain-wide constants. Values match historical Bitcoin-style defaults; a
//! concrete deployment is free to override them through `ConsensusParams`
//! (see `talon-chainparams`) wherever the spec calls for a per-chain value.

/// Depth below the tip at which a coinbase output becomes spendable.
pub const COINBASE_MATURITY: u32 = 100;

/// `lockTime` values below this are interpreted as block heights, at or
/// above as unix timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// `lockTime` must never reach the 2038 rollover.
pub const LOCKTIME_MAX: u32 = i32::max_value() as u32;

/// Sequence number marking an input (and, if every input carries it, the
/// whole transaction) final regardless of `lockTime`.
pub const SEQUENCE_FINAL: u32 = 0xffff_ffff;

/// Maximum serialized block size accepted by the chain.
pub const MAX_BLOCK_SIZE: usize = 1_000_000;

/// Maximum size the template builder may fill when mining a new block;
/// Bitcoin historically reserved headroom above this for future growth.
pub const MAX_BLOCK_SIZE_GEN: usize = 750_000;

/// Maximum signature operations per block.
pub const MAX_BLOCK_SIGOPS: usize = MAX_BLOCK_SIZE / 50;

/// Minimum serialized transaction size accepted by the mempool (anti-DoS).
pub const MIN_TRANSACTION_SIZE: usize = 100;

/// Upper bound on any single value and on the sum of a transaction's
/// inputs or outputs (21 million coins, 8 decimal places).
pub const MAX_MONEY: u64 = 21_000_000 * 100_000_000;

/// Sigops charged per `OP_CHECKSIG`/`OP_CHECKSIGVERIFY`.
pub const SIGOPS_PER_CHECKSIG: usize = 1;

/// Sigops charged per `OP_CHECKMULTISIG`/`OP_CHECKMULTISIGVERIFY` outside of
/// "accurate" counting mode (which would need to decode the preceding
/// push to know how many keys are actually checked).
pub const SIGOPS_PER_CHECKMULTISIG: usize = 20;
