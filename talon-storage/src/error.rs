use display_derive::Display;

#[derive(Debug, PartialEq, Clone, Display)]
pub enum Error {
	/// Low level database error.
	#[display(fmt = "Database error: {}", _0)]
	DatabaseError(String),
	/// A block was submitted whose parent is not known.
	#[display(fmt = "Block parent is unknown")]
	UnknownParent,
	/// A block is already present in the index.
	#[display(fmt = "Block already exists")]
	Duplicate,
	/// A side chain reaches back further than the index retains.
	#[display(fmt = "Fork is too long to proceed")]
	AncientFork,
	/// `connectBlock` failed partway through; the key-value transaction was
	/// aborted and no in-memory state was mutated.
	#[display(fmt = "Cannot connect block (invalid database state)")]
	CannotConnect,
	/// `disconnectBlock` failed partway through.
	#[display(fmt = "Cannot disconnect block (invalid database state)")]
	CannotDisconnect,
}

impl From<Error> for String {
	fn from(e: Error) -> String {
		format!("{}", e)
	}
}
