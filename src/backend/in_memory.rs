use alloc::collections::{BTreeMap, BTreeSet};
use alloc::vec::Vec;

use evm_journal_interpreter::ExitError;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use super::{Backend, Log};

/// Environment information of the in-memory backend.
#[derive(Clone, Debug)]
pub struct MemoryVicinity {
	/// Gas price.
	pub gas_price: U256,
	/// Origin.
	pub origin: H160,
	/// Chain ID.
	pub chain_id: U256,
	/// Hashes of recent blocks, most recent first: `block_hashes[0]` is
	/// the hash of `block_number - 1`.
	pub block_hashes: Vec<H256>,
	/// Current block number.
	pub block_number: U256,
	/// Coinbase.
	pub block_coinbase: H160,
	/// Timestamp.
	pub block_timestamp: U256,
	/// Difficulty.
	pub block_difficulty: U256,
	/// Randomness beacon, for post-merge forks.
	pub block_randomness: Option<H256>,
	/// Block gas limit.
	pub block_gas_limit: U256,
	/// Base fee.
	pub block_base_fee_per_gas: U256,
}

impl Default for MemoryVicinity {
	fn default() -> Self {
		Self {
			gas_price: U256::zero(),
			origin: H160::default(),
			chain_id: U256::one(),
			block_hashes: Vec::new(),
			block_number: U256::zero(),
			block_coinbase: H160::default(),
			block_timestamp: U256::zero(),
			block_difficulty: U256::zero(),
			block_randomness: None,
			block_gas_limit: U256::MAX,
			block_base_fee_per_gas: U256::zero(),
		}
	}
}

/// Account information of the in-memory backend.
#[derive(Clone, Debug, Default)]
pub struct MemoryAccount {
	/// Account nonce.
	pub nonce: U256,
	/// Account balance.
	pub balance: U256,
	/// Full account storage.
	pub storage: BTreeMap<H256, H256>,
	/// Account code.
	pub code: Vec<u8>,
}

#[derive(Clone, Debug, Default)]
struct MemoryState {
	accounts: BTreeMap<H160, MemoryAccount>,
	deleted: BTreeSet<H160>,
	logs: Vec<Log>,
}

/// An in-memory state database. Snapshots push a copy of the mutable
/// state; `revert_to` swaps it back and drops later snapshots.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
	vicinity: MemoryVicinity,
	state: MemoryState,
	originals: BTreeMap<(H160, H256), H256>,
	preimages: BTreeMap<H256, Vec<u8>>,
	snapshots: Vec<MemoryState>,
}

impl MemoryBackend {
	/// Create a new in-memory backend.
	#[must_use]
	pub fn new(vicinity: MemoryVicinity, accounts: BTreeMap<H160, MemoryAccount>) -> Self {
		Self {
			vicinity,
			state: MemoryState {
				accounts,
				deleted: BTreeSet::new(),
				logs: Vec::new(),
			},
			originals: BTreeMap::new(),
			preimages: BTreeMap::new(),
			snapshots: Vec::new(),
		}
	}

	/// The backing account map.
	#[must_use]
	pub fn accounts(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.state.accounts
	}

	/// Recorded keccak preimages.
	#[must_use]
	pub fn preimages(&self) -> &BTreeMap<H256, Vec<u8>> {
		&self.preimages
	}

	fn account_mut(&mut self, address: H160) -> &mut MemoryAccount {
		self.state.accounts.entry(address).or_default()
	}
}

impl Backend for MemoryBackend {
	fn gas_price(&self) -> U256 {
		self.vicinity.gas_price
	}

	fn origin(&self) -> H160 {
		self.vicinity.origin
	}

	fn block_hash(&self, number: U256) -> H256 {
		if number >= self.vicinity.block_number {
			return H256::default();
		}

		let age = self.vicinity.block_number - number - U256::one();
		if age > U256::from(usize::MAX) {
			return H256::default();
		}

		self.vicinity
			.block_hashes
			.get(age.as_usize())
			.copied()
			.unwrap_or_default()
	}

	fn block_number(&self) -> U256 {
		self.vicinity.block_number
	}

	fn block_coinbase(&self) -> H160 {
		self.vicinity.block_coinbase
	}

	fn block_timestamp(&self) -> U256 {
		self.vicinity.block_timestamp
	}

	fn block_difficulty(&self) -> U256 {
		self.vicinity.block_difficulty
	}

	fn block_randomness(&self) -> Option<H256> {
		self.vicinity.block_randomness
	}

	fn block_gas_limit(&self) -> U256 {
		self.vicinity.block_gas_limit
	}

	fn block_base_fee_per_gas(&self) -> U256 {
		self.vicinity.block_base_fee_per_gas
	}

	fn chain_id(&self) -> U256 {
		self.vicinity.chain_id
	}

	fn balance(&self, address: H160) -> U256 {
		self.state
			.accounts
			.get(&address)
			.map(|a| a.balance)
			.unwrap_or_default()
	}

	fn nonce(&self, address: H160) -> U256 {
		self.state
			.accounts
			.get(&address)
			.map(|a| a.nonce)
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state
			.accounts
			.get(&address)
			.map(|a| a.code.clone())
			.unwrap_or_default()
	}

	fn code_hash(&self, address: H160) -> H256 {
		match self.state.accounts.get(&address) {
			Some(account) => H256::from_slice(Keccak256::digest(&account.code).as_slice()),
			None => H256::default(),
		}
	}

	fn code_size(&self, address: H160) -> U256 {
		self.state
			.accounts
			.get(&address)
			.map(|a| U256::from(a.code.len()))
			.unwrap_or_default()
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state
			.accounts
			.get(&address)
			.and_then(|a| a.storage.get(&index).copied())
			.unwrap_or_default()
	}

	fn original_storage(&self, address: H160, index: H256) -> H256 {
		self.originals
			.get(&(address, index))
			.copied()
			.unwrap_or_else(|| self.storage(address, index))
	}

	fn exists(&self, address: H160) -> bool {
		self.state.accounts.contains_key(&address)
	}

	fn is_empty(&self, address: H160) -> bool {
		match self.state.accounts.get(&address) {
			Some(account) => {
				account.balance == U256::zero()
					&& account.nonce == U256::zero()
					&& account.code.is_empty()
			}
			None => true,
		}
	}

	fn deleted(&self, address: H160) -> bool {
		self.state.deleted.contains(&address)
	}

	fn add_balance(&mut self, address: H160, value: U256) {
		let account = self.account_mut(address);
		account.balance = account.balance.saturating_add(value);
	}

	fn sub_balance(&mut self, address: H160, value: U256) -> Result<(), ExitError> {
		let account = self.account_mut(address);
		if account.balance < value {
			return Err(ExitError::OutOfFund);
		}
		account.balance -= value;
		Ok(())
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) {
		let previous = self.storage(address, index);
		self.originals.entry((address, index)).or_insert(previous);

		if value == H256::default() {
			self.account_mut(address).storage.remove(&index);
		} else {
			self.account_mut(address).storage.insert(index, value);
		}
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) {
		self.account_mut(address).code = code;
	}

	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError> {
		let account = self.account_mut(address);
		if account.nonce == U256::from(u64::MAX) {
			return Err(ExitError::MaxNonce);
		}
		account.nonce += U256::one();
		Ok(())
	}

	fn add_log(&mut self, log: Log) {
		self.state.logs.push(log);
	}

	fn suicide(&mut self, address: H160) {
		self.account_mut(address).balance = U256::zero();
		self.state.deleted.insert(address);
	}

	fn create_account(&mut self, address: H160) {
		self.account_mut(address);
	}

	fn add_preimage(&mut self, hash: H256, preimage: Vec<u8>) {
		self.preimages.entry(hash).or_insert(preimage);
	}

	fn snapshot(&mut self) -> usize {
		self.snapshots.push(self.state.clone());
		self.snapshots.len() - 1
	}

	fn revert_to(&mut self, snapshot: usize) {
		if snapshot < self.snapshots.len() {
			self.state = self.snapshots[snapshot].clone();
			self.snapshots.truncate(snapshot);
		}
	}

	fn logs(&self) -> &[Log] {
		&self.state.logs
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn snapshots_restore_everything() {
		let mut backend = MemoryBackend::new(MemoryVicinity::default(), BTreeMap::new());
		let addr = H160::from_low_u64_be(1);

		backend.add_balance(addr, U256::from(10));
		backend.set_storage(addr, H256::from_low_u64_be(1), H256::from_low_u64_be(7));

		let snapshot = backend.snapshot();

		backend.set_storage(addr, H256::from_low_u64_be(1), H256::from_low_u64_be(9));
		backend.set_code(addr, vec![0x60]);
		backend.suicide(addr);
		backend.add_log(Log {
			address: addr,
			topics: vec![],
			data: vec![1],
			block_number: U256::zero(),
		});

		backend.revert_to(snapshot);

		assert_eq!(backend.balance(addr), U256::from(10));
		assert_eq!(
			backend.storage(addr, H256::from_low_u64_be(1)),
			H256::from_low_u64_be(7)
		);
		assert!(backend.code(addr).is_empty());
		assert!(!backend.deleted(addr));
		assert!(backend.logs().is_empty());
	}

	#[test]
	fn original_storage_is_pre_write() {
		let mut backend = MemoryBackend::new(MemoryVicinity::default(), BTreeMap::new());
		let addr = H160::from_low_u64_be(1);
		let slot = H256::from_low_u64_be(2);

		backend.set_storage(addr, slot, H256::from_low_u64_be(5));
		backend.set_storage(addr, slot, H256::from_low_u64_be(6));

		assert_eq!(backend.original_storage(addr, slot), H256::default());
		assert_eq!(backend.storage(addr, slot), H256::from_low_u64_be(6));
	}
}
