//! The state-database capability the orchestrator consumes.

mod in_memory;

pub use self::in_memory::{MemoryAccount, MemoryBackend, MemoryVicinity};

use alloc::vec::Vec;

use evm_journal_interpreter::ExitError;
use primitive_types::{H160, H256, U256};

/// A log emitted through the state database.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Log {
	/// Emitting address.
	pub address: H160,
	/// Topics, zero to four of them.
	pub topics: Vec<H256>,
	/// Payload.
	pub data: Vec<u8>,
	/// Block number at emission time. Non-consensus, assigned here because
	/// the state layer does not know the current block.
	pub block_number: U256,
}

/// The state database and environment the executor runs against. The
/// interpreter never introspects the implementation; snapshot identifiers
/// are opaque and `revert_to` must restore every mutation performed since
/// the snapshot was taken, including suicides, logs and code deposits.
pub trait Backend {
	/// Environmental gas price.
	fn gas_price(&self) -> U256;
	/// Environmental transaction origin.
	fn origin(&self) -> H160;
	/// Hash of a previous block. The 256-block window rule is applied by
	/// the executor.
	fn block_hash(&self, number: U256) -> H256;
	/// Environmental block number.
	fn block_number(&self) -> U256;
	/// Environmental coinbase.
	fn block_coinbase(&self) -> H160;
	/// Environmental block timestamp.
	fn block_timestamp(&self) -> U256;
	/// Environmental block difficulty.
	fn block_difficulty(&self) -> U256;
	/// Environmental block randomness, where the fork provides one.
	fn block_randomness(&self) -> Option<H256>;
	/// Environmental block gas limit.
	fn block_gas_limit(&self) -> U256;
	/// Environmental block base fee.
	fn block_base_fee_per_gas(&self) -> U256;
	/// Environmental chain ID.
	fn chain_id(&self) -> U256;

	/// Balance of an account.
	fn balance(&self, address: H160) -> U256;
	/// Nonce of an account.
	fn nonce(&self, address: H160) -> U256;
	/// Code of an account.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Code hash of an account; zero for a non-existent account.
	fn code_hash(&self, address: H160) -> H256;
	/// Code size of an account.
	fn code_size(&self, address: H160) -> U256;
	/// Storage word of an account at a slot.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Storage word at transaction entry, for net gas metering.
	fn original_storage(&self, address: H160, index: H256) -> H256;
	/// Whether the account exists.
	fn exists(&self, address: H160) -> bool;
	/// Whether the account is empty: zero balance, zero nonce, no code.
	fn is_empty(&self, address: H160) -> bool;
	/// Whether the account was marked for deletion this transaction.
	fn deleted(&self, address: H160) -> bool;

	/// Credit an account, creating it if absent.
	fn add_balance(&mut self, address: H160, value: U256);
	/// Debit an account; fails with `OutOfFund` when the balance does not
	/// cover the value.
	fn sub_balance(&mut self, address: H160, value: U256) -> Result<(), ExitError>;
	/// Write a storage word.
	fn set_storage(&mut self, address: H160, index: H256, value: H256);
	/// Install code at an address.
	fn set_code(&mut self, address: H160, code: Vec<u8>);
	/// Bump an account nonce.
	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError>;
	/// Append a log record.
	fn add_log(&mut self, log: Log);
	/// Mark an account suicided: its balance is zeroed and it is removed
	/// at transaction end.
	fn suicide(&mut self, address: H160);
	/// Ensure an account exists.
	fn create_account(&mut self, address: H160);
	/// Register a keccak preimage.
	fn add_preimage(&mut self, hash: H256, preimage: Vec<u8>);

	/// Take a snapshot of the mutable state, returning an opaque
	/// identifier.
	fn snapshot(&mut self) -> usize;
	/// Roll back to a snapshot, discarding it and any later ones.
	fn revert_to(&mut self, snapshot: usize);

	/// Logs accumulated so far.
	fn logs(&self) -> &[Log];
}
