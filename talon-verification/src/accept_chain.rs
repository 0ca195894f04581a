use rayon::prelude::*;
use talon_chainparams::ConsensusParams;
use talon_storage::{BlockHeaderProvider, DuplexTransactionOutputProvider, TransactionMetaProvider, TransactionOutputProvider};

use crate::accept_header::HeaderAcceptor;
use crate::accept_transaction::{SignatureVerifier, TransactionAcceptor};
use crate::canon::CanonBlock;
use crate::error::{Error, TransactionError};

/// Full (contextual) block verification: header rules plus every
/// transaction's rules, the whole composed so `check_transactions` can run
/// the independent per-tx acceptors across threads (§5 notes this is the
/// one place validation parallelism is allowed).
pub struct ChainAcceptor<'a> {
	pub header: HeaderAcceptor<'a>,
	pub transactions: Vec<TransactionAcceptor<'a>>,
}

impl<'a> ChainAcceptor<'a> {
	pub fn new(
		tx_out_provider: &'a dyn TransactionOutputProvider,
		tx_meta_provider: &'a dyn TransactionMetaProvider,
		header_provider: &'a dyn BlockHeaderProvider,
		signature_verifier: &'a dyn SignatureVerifier,
		consensus: &'a ConsensusParams,
		block: CanonBlock<'a>,
		height: u32,
	) -> Self {
		let output_store = DuplexTransactionOutputProvider::new(tx_out_provider, block.raw());

		ChainAcceptor {
			header: HeaderAcceptor::new(header_provider, consensus, block.header(), height),
			transactions: block
				.transactions()
				.into_iter()
				.enumerate()
				.map(|(tx_index, tx)| {
					TransactionAcceptor::new(tx_meta_provider, output_store, signature_verifier, consensus, tx, height, tx_index)
				})
				.collect(),
		}
	}

	pub fn check(&self) -> Result<(), Error> {
		self.header.check()?;
		self.check_transactions()?;
		Ok(())
	}

	fn check_transactions(&self) -> Result<(), Error> {
		self.transactions
			.par_iter()
			.enumerate()
			.map(|(index, tx)| {
				tx.check().map_err(|err| match err {
					TransactionError::Input(_) => Error::InputsUnavailable(index, err),
					other => Error::BadTransaction(other),
				})
			})
			.reduce(|| Ok(()), |acc, check| acc.and(check))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_input_errors_carry_the_transaction_index() {
		let err: Result<(), Error> = Err(TransactionError::Input(2)).map_err(|err| match err {
			TransactionError::Input(_) => Error::InputsUnavailable(5, err),
			other => Error::BadTransaction(other),
		});
		assert_eq!(err, Err(Error::InputsUnavailable(5, TransactionError::Input(2))));
	}
}
