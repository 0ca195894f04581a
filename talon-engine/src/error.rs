use display_derive::Display;

/// Everything that can keep a block out of the index or off the best
/// chain. Wraps the lower layers' own error types rather than flattening
/// them, so a caller can still match on (say) `talon_storage::Error::Duplicate`
/// after unwrapping.
#[derive(Debug, Clone, PartialEq, Display)]
pub enum Error {
	#[display(fmt = "{}", _0)]
	Storage(talon_storage::Error),
	#[display(fmt = "{}", _0)]
	Database(talon_db::Error),
	#[display(fmt = "{}", _0)]
	Verification(talon_verification::Error),
	#[display(fmt = "block has no transactions")]
	EmptyBlock,
	#[display(fmt = "first transaction is not a coinbase")]
	MissingCoinbase,
	#[display(fmt = "transaction {} is a coinbase outside the first position", _0)]
	DuplicateCoinbase(usize),
	#[display(fmt = "merkle root does not match the block's transactions")]
	BadMerkleRoot,
	#[display(fmt = "not enough disk space to persist this block")]
	DiskSpace,
	#[display(fmt = "reorganization failed partway through; best chain left at the last successfully connected block")]
	InvalidChainFound,
}

impl From<talon_storage::Error> for Error {
	fn from(err: talon_storage::Error) -> Self {
		Error::Storage(err)
	}
}

impl From<talon_db::Error> for Error {
	fn from(err: talon_db::Error) -> Self {
		Error::Database(err)
	}
}

impl From<talon_verification::Error> for Error {
	fn from(err: talon_verification::Error) -> Self {
		Error::Verification(err)
	}
}
