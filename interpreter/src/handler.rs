use alloc::vec::Vec;

use primitive_types::{H160, H256, U256};

use crate::context::{CallScheme, Context, CreateScheme, Transfer};
use crate::error::{ExitError, ExitReason, TracerError};
use crate::opcode::Opcode;
use crate::stack::Stack;

/// EVM context handler.
///
/// The orchestration layer implements this on top of the state database,
/// the gas rules and the tracer; opcode handlers never see anything else.
/// `call` and `create` run the nested frame synchronously and return once
/// it has exited.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Handler {
	/// Get balance of address.
	fn balance(&self, address: H160) -> U256;
	/// Get code size of address.
	fn code_size(&self, address: H160) -> U256;
	/// Get code hash of address.
	fn code_hash(&self, address: H160) -> H256;
	/// Get code of address.
	fn code(&self, address: H160) -> Vec<u8>;
	/// Get storage value of address at index.
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Check whether an address exists.
	fn exists(&self, address: H160) -> bool;

	/// Get the gas left value.
	fn gas_left(&self) -> U256;
	/// Get the gas price value.
	fn gas_price(&self) -> U256;
	/// Get execution origin.
	fn origin(&self) -> H160;
	/// Get environmental block hash.
	fn block_hash(&self, number: U256) -> H256;
	/// Get environmental block number.
	fn block_number(&self) -> U256;
	/// Get environmental coinbase.
	fn block_coinbase(&self) -> H160;
	/// Get environmental block timestamp.
	fn block_timestamp(&self) -> U256;
	/// Get environmental block difficulty.
	fn block_difficulty(&self) -> U256;
	/// Get environmental block randomness.
	fn block_randomness(&self) -> Option<H256>;
	/// Get environmental gas limit.
	fn block_gas_limit(&self) -> U256;
	/// Environmental block base fee.
	fn block_base_fee_per_gas(&self) -> U256;
	/// Get environmental chain ID.
	fn chain_id(&self) -> U256;

	/// Whether the current frame is read-only.
	fn is_static(&self) -> bool;
	/// Whether an outside observer has requested cancellation. Polled at
	/// the top of the dispatch loop and by `JUMP`/`JUMPI`; a relaxed
	/// atomic load is sufficient.
	fn aborted(&self) -> bool;

	/// Validate and charge an opcode before it executes: stack effect,
	/// writability under the read-only flag, static gas, dynamic gas and
	/// memory expansion gas.
	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		stack: &Stack,
	) -> Result<(), ExitError>;

	/// Set storage value of address at index.
	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
	/// Create a log owned by address with given topics and data.
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;
	/// Mark an address to be deleted, with funds transferred to target.
	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError>;
	/// Record a keccak preimage observed by `SHA3`, when preimage
	/// recording is enabled.
	fn record_preimage(&mut self, hash: H256, preimage: Vec<u8>);

	/// Invoke a call operation. Runs the callee synchronously and returns
	/// its exit reason and output.
	#[allow(clippy::too_many_arguments)]
	fn call(
		&mut self,
		caller: H160,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		scheme: CallScheme,
		context: Context,
	) -> (ExitReason, Vec<u8>);

	/// Invoke a create operation. Runs the constructor synchronously and
	/// returns the exit reason, the created address on success, and the
	/// revert data if any.
	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>);

	/// Register a storage key node: the relation between a state variable
	/// (or a nested index under `parent`) and its storage slot.
	fn journal_state_key(
		&mut self,
		address: H160,
		parent: Option<(H256, H256)>,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		label: Vec<u8>,
	) -> Result<(), TracerError>;

	/// Journal a typed value write against a registered storage key.
	fn journal_state_change(
		&mut self,
		address: H160,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		value: Vec<u8>,
	) -> Result<(), TracerError>;

	/// Apply the configured journal-failure policy: either surface the
	/// error to the interpreter or swallow it into a counter.
	fn journal_error(&mut self, error: TracerError) -> Result<(), ExitError>;
}
