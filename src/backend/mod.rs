//! World-state abstraction consumed by the executor: a read-only view of
//! accounts, storage and block metadata, plus an apply seam for committing
//! the changes of a finished transaction.

mod memory;

pub use self::memory::{MemoryAccount, MemoryBackend, MemoryVicinity};

use crate::prelude::*;
use primitive_types::{H160, H256, U256};

/// Basic account information: balance and nonce.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Basic {
	/// Account balance.
	pub balance: U256,
	/// Account nonce.
	pub nonce: U256,
}

/// An event log emitted by a contract.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
	/// Emitting address.
	pub address: H160,
	/// Indexed topics.
	pub topics: Vec<H256>,
	/// Unindexed payload.
	pub data: Vec<u8>,
}

/// One account-level change of a finished transaction.
#[derive(Clone, Debug)]
pub enum Apply<I> {
	/// Modify or create an account.
	Modify {
		/// Address.
		address: H160,
		/// Resulting balance and nonce.
		basic: Basic,
		/// Change of the code, if any.
		code: Option<Vec<u8>>,
		/// Changed storage slots.
		storage: I,
		/// Whether the account storage is wiped before applying `storage`.
		reset_storage: bool,
	},
	/// Delete an account.
	Delete {
		/// Address.
		address: H160,
	},
}

/// Read-only world state and block environment.
#[auto_impl::auto_impl(&, &mut, Box)]
pub trait Backend {
	/// Gas price of the transaction.
	fn gas_price(&self) -> U256;
	/// Origin of the transaction.
	fn origin(&self) -> H160;
	/// Hash of a recent block by number.
	fn block_hash(&self, number: U256) -> H256;
	/// Current block number.
	fn block_number(&self) -> U256;
	/// Beneficiary of the current block.
	fn block_coinbase(&self) -> H160;
	/// Timestamp of the current block.
	fn block_timestamp(&self) -> U256;
	/// Difficulty of the current block.
	fn block_difficulty(&self) -> U256;
	/// Gas limit of the current block.
	fn block_gas_limit(&self) -> U256;
	/// Chain ID.
	fn chain_id(&self) -> U256;

	/// Whether the account exists.
	fn exists(&self, address: H160) -> bool;
	/// Balance and nonce of the account.
	fn basic(&self, address: H160) -> Basic;
	/// Code of the account.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Storage value of the account at `index`.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Storage value as of the beginning of the transaction, when known.
	fn original_storage(&self, address: H160, index: H256) -> Option<H256>;
}

/// A [`Backend`] that can commit the changes of a finished transaction.
pub trait ApplyBackend {
	/// Apply account changes and logs. When `delete_empty` is set, accounts
	/// left empty by the changes are removed.
	fn apply<A, I, L>(&mut self, values: A, logs: L, delete_empty: bool)
	where
		A: IntoIterator<Item = Apply<I>>,
		I: IntoIterator<Item = (H256, H256)>,
		L: IntoIterator<Item = Log>;
}
