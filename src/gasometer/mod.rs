//! Per-frame gas accounting and the opcode pricing tables.

mod consts;
mod costs;

pub use self::consts::{G_CODEDEPOSIT, G_JOURNAL, STACK_TABLE, STATIC_COST_TABLE};

use core::cmp::max;

use evm_journal_interpreter::{utils::h256_to_u256, ExitError, Opcode, Stack};
use primitive_types::{H160, H256, U256};

use crate::backend::Backend;
use crate::config::Config;

/// How a child frame's gasometer folds back into its parent.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MergeStrategy {
	/// The child succeeded: return unused gas and carry refunds.
	Commit,
	/// The child reverted: return unused gas, drop refunds.
	Revert,
	/// The child failed: everything forwarded is consumed.
	Discard,
}

/// A frame gasometer. Holds the frame's gas limit, the gas used so far,
/// the memory high-water cost and accumulated refunds, plus the frame's
/// read-only flag.
#[derive(Clone, Debug)]
pub struct Gasometer {
	gas_limit: u64,
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
	/// Whether this frame is read-only.
	pub is_static: bool,
}

impl Gasometer {
	/// Create a new gasometer with the given gas limit.
	#[must_use]
	pub const fn new(gas_limit: u64, is_static: bool) -> Self {
		Self {
			gas_limit,
			memory_gas: 0,
			used_gas: 0,
			refunded_gas: 0,
			is_static,
		}
	}

	/// Consume everything; the frame failed.
	pub fn fail(&mut self) {
		self.memory_gas = 0;
		self.refunded_gas = 0;
		self.used_gas = self.gas_limit;
	}

	/// Total used gas: explicit cost plus the memory high water.
	#[must_use]
	pub const fn total_used_gas(&self) -> u64 {
		self.used_gas + self.memory_gas
	}

	/// Remaining gas of the frame.
	#[must_use]
	pub const fn gas64(&self) -> u64 {
		self.gas_limit - self.memory_gas - self.used_gas
	}

	/// Remaining gas of the frame, widened.
	#[must_use]
	pub fn gas(&self) -> U256 {
		U256::from(self.gas64())
	}

	/// Accumulated refund.
	#[must_use]
	pub const fn refunded_gas(&self) -> i64 {
		self.refunded_gas
	}

	/// Record an explicit cost.
	pub fn record_gas64(&mut self, cost: u64) -> Result<(), ExitError> {
		let all_gas_cost = self.total_used_gas().checked_add(cost);
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => {
				self.used_gas += cost;
				Ok(())
			}
			_ => {
				self.fail();
				Err(ExitError::OutOfGas)
			}
		}
	}

	/// Record a refund.
	pub fn record_refund(&mut self, refund: i64) {
		self.refunded_gas += refund;
	}

	/// Record the code deposit charge of a successful create.
	pub fn record_codedeposit(&mut self, len: usize) -> Result<(), ExitError> {
		let cost = len as u64 * G_CODEDEPOSIT;
		match self.record_gas64(cost) {
			Ok(()) => Ok(()),
			Err(_) => Err(ExitError::CodeStoreOutOfGas),
		}
	}

	/// Raise the memory cost high water to `memory_cost`.
	pub fn set_memory_gas(&mut self, memory_cost: u64) -> Result<(), ExitError> {
		let all_gas_cost = self.used_gas.checked_add(memory_cost);
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => {
				self.memory_gas = memory_cost;
				Ok(())
			}
			_ => {
				self.fail();
				Err(ExitError::OutOfGas)
			}
		}
	}

	/// Fold a finished child gasometer back into this one.
	pub fn merge(&mut self, child: Self, strategy: MergeStrategy) {
		match strategy {
			MergeStrategy::Commit => {
				self.used_gas -= child.gas64();
				self.refunded_gas += child.refunded_gas;
			}
			MergeStrategy::Revert => {
				self.used_gas -= child.gas64();
			}
			MergeStrategy::Discard => {}
		}
	}

	/// Gas left after applying the capped refund, i.e. what a transaction
	/// returns to its sender.
	#[must_use]
	pub fn effective_gas(&self, config: &Config) -> u64 {
		let refunded = if self.refunded_gas >= 0 {
			self.refunded_gas as u64
		} else {
			0
		};

		self.gas_limit
			- (self.total_used_gas()
				- core::cmp::min(
					self.total_used_gas() / config.max_refund_quotient,
					refunded,
				))
	}
}

/// A memory operand of an opcode, for expansion pricing.
#[derive(Clone, Copy, Debug)]
pub struct MemoryCost {
	pub offset: U256,
	pub len: U256,
}

impl MemoryCost {
	/// The larger of two memory operands.
	#[must_use]
	pub fn join(self, other: Self) -> Self {
		if self.len == U256::zero() {
			return other;
		}
		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}

	/// Gas cost of expanding memory to cover this operand, or `None` when
	/// it does not touch memory.
	pub fn cost(&self) -> Result<Option<u64>, ExitError> {
		if self.len == U256::zero() {
			return Ok(None);
		}

		let end = self
			.offset
			.checked_add(self.len)
			.ok_or(ExitError::OutOfGas)?;

		Ok(Some(costs::memory_gas(end)?))
	}
}

/// Dynamic gas cost of an opcode, resolved from the stack operands.
#[derive(Clone, Copy, Debug)]
enum GasCost {
	Zero,
	Base,
	Low,
	VeryLow,
	Invalid(Opcode),
	Balance,
	ExtCodeSize,
	ExtCodeHash,
	BlockHash,
	SLoad,
	Sha3 { len: U256 },
	Exp { power: U256 },
	VeryLowCopy { len: U256 },
	ExtCodeCopy { len: U256 },
	Log { n: u8, len: U256 },
	Create,
	Create2 { len: U256 },
	SStore { original: H256, current: H256, new: H256 },
	Call { value: U256, target_exists: bool },
	CallCode { value: U256 },
	DelegateCall,
	StaticCall,
	Suicide { already_deleted: bool },
}

impl GasCost {
	fn cost(&self, gas_left: u64, config: &Config) -> Result<u64, ExitError> {
		Ok(match *self {
			GasCost::Zero => consts::G_ZERO,
			GasCost::Base => consts::G_BASE,
			GasCost::Low => consts::G_LOW,
			GasCost::VeryLow => consts::G_VERYLOW,
			GasCost::Invalid(opcode) => return Err(ExitError::InvalidCode(opcode)),
			GasCost::Balance => config.gas_balance,
			GasCost::ExtCodeSize => config.gas_ext_code,
			GasCost::ExtCodeHash => config.gas_ext_code_hash,
			GasCost::BlockHash => consts::G_BLOCKHASH,
			GasCost::SLoad => config.gas_sload,
			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::Exp { power } => costs::exp_cost(power, config)?,
			GasCost::VeryLowCopy { len } => costs::verylow_copy_cost(len)?,
			GasCost::ExtCodeCopy { len } => costs::extcodecopy_cost(len, config)?,
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::Create => consts::G_CREATE,
			GasCost::Create2 { len } => costs::create2_cost(len)?,
			GasCost::SStore { original, current, new } => {
				costs::sstore_cost(original, current, new, gas_left, config)?
			}
			GasCost::Call { value, target_exists } => {
				costs::call_cost(value, target_exists, config)
			}
			GasCost::CallCode { value } => costs::callcode_cost(value, config),
			GasCost::DelegateCall | GasCost::StaticCall => config.gas_call,
			GasCost::Suicide { .. } => config.gas_suicide,
		})
	}

	fn refund(&self, config: &Config) -> i64 {
		match *self {
			GasCost::SStore { original, current, new } => {
				costs::sstore_refund(original, current, new, config)
			}
			GasCost::Suicide { already_deleted } => {
				costs::suicide_refund(already_deleted, config)
			}
			_ => 0,
		}
	}
}

/// Intrinsic gas of a call transaction.
#[must_use]
pub fn call_transaction_cost(data: &[u8], config: &Config) -> u64 {
	costs::transaction_cost(config.gas_transaction_call, data, config)
}

/// Intrinsic gas of a create transaction.
#[must_use]
pub fn create_transaction_cost(init_code: &[u8], config: &Config) -> u64 {
	costs::transaction_cost(config.gas_transaction_create, init_code, config)
}

/// Validate and charge one opcode against the frame gasometer: stack
/// effect, writability under the read-only flag, static or dynamic gas and
/// memory expansion.
pub fn record_opcode<B: Backend>(
	gasometer: &mut Gasometer,
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	config: &Config,
	backend: &B,
) -> Result<(), ExitError> {
	if let Some((pops, pushes)) = STACK_TABLE[opcode.as_usize()] {
		if stack.len() < pops {
			gasometer.fail();
			return Err(ExitError::StackUnderflow);
		}
		if stack.len() - pops + pushes > config.stack_limit {
			gasometer.fail();
			return Err(ExitError::StackOverflow);
		}
	}

	if gasometer.is_static && consts::writes_state(opcode) {
		gasometer.fail();
		return Err(ExitError::WriteProtection);
	}

	if let Some(cost) = STATIC_COST_TABLE[opcode.as_usize()] {
		return gasometer.record_gas64(cost);
	}

	let (gas_cost, memory_cost) = dynamic_opcode_cost(address, opcode, stack, config, backend)?;

	let cost = match gas_cost.cost(gasometer.gas64(), config) {
		Ok(cost) => cost,
		Err(e) => {
			gasometer.fail();
			return Err(e);
		}
	};
	let refund = gas_cost.refund(config);

	gasometer.record_gas64(cost)?;
	gasometer.record_refund(refund);

	if let Some(memory_cost) = memory_cost {
		if let Some(memory_gas) = memory_cost.cost()? {
			gasometer.set_memory_gas(max(gasometer.memory_gas, memory_gas))?;
		}
	}

	Ok(())
}

#[allow(clippy::too_many_lines)]
fn dynamic_opcode_cost<B: Backend>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	config: &Config,
	backend: &B,
) -> Result<(GasCost, Option<MemoryCost>), ExitError> {
	let peek_u256 = |index: usize| -> Result<U256, ExitError> {
		stack.peek(index).map(h256_to_u256)
	};

	let gas_cost = match opcode {
		Opcode::RETURN => GasCost::Zero,
		Opcode::REVERT if config.has_revert => GasCost::Zero,
		Opcode::REVERT => GasCost::Invalid(opcode),

		Opcode::RETURNDATASIZE if config.has_return_data => GasCost::Base,
		Opcode::RETURNDATACOPY if config.has_return_data => GasCost::VeryLowCopy {
			len: peek_u256(2)?,
		},
		Opcode::RETURNDATASIZE | Opcode::RETURNDATACOPY => GasCost::Invalid(opcode),

		Opcode::SHL | Opcode::SHR | Opcode::SAR if config.has_bitwise_shifting => GasCost::VeryLow,
		Opcode::SHL | Opcode::SHR | Opcode::SAR => GasCost::Invalid(opcode),

		Opcode::CHAINID if config.has_chain_id => GasCost::Base,
		Opcode::CHAINID => GasCost::Invalid(opcode),

		Opcode::SELFBALANCE if config.has_self_balance => GasCost::Low,
		Opcode::SELFBALANCE => GasCost::Invalid(opcode),

		Opcode::BASEFEE if config.has_base_fee => GasCost::Base,
		Opcode::BASEFEE => GasCost::Invalid(opcode),

		Opcode::EXTCODEHASH if config.has_ext_code_hash => GasCost::ExtCodeHash,
		Opcode::EXTCODEHASH => GasCost::Invalid(opcode),

		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::EXP => GasCost::Exp {
			power: peek_u256(1)?,
		},
		Opcode::SHA3 => GasCost::Sha3 {
			len: peek_u256(1)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY => GasCost::VeryLowCopy {
			len: peek_u256(2)?,
		},
		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy {
			len: peek_u256(3)?,
		},
		Opcode::BALANCE => GasCost::Balance,
		Opcode::EXTCODESIZE => GasCost::ExtCodeSize,
		Opcode::BLOCKHASH => GasCost::BlockHash,
		Opcode::SLOAD => GasCost::SLoad,

		Opcode::SSTORE => {
			let index = stack.peek(0)?;
			let new = stack.peek(1)?;

			GasCost::SStore {
				original: backend.original_storage(address, index),
				current: backend.storage(address, index),
				new,
			}
		}

		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
			GasCost::Log {
				n: opcode.as_u8() - Opcode::LOG0.as_u8(),
				len: peek_u256(1)?,
			}
		}

		Opcode::CREATE => GasCost::Create,
		Opcode::CREATE2 if config.has_create2 => GasCost::Create2 {
			len: peek_u256(2)?,
		},
		Opcode::CREATE2 => GasCost::Invalid(opcode),

		Opcode::CALL => {
			let target: H160 = stack.peek(1)?.into();
			let target_exists = if config.empty_considered_exists {
				backend.exists(target)
			} else {
				!backend.is_empty(target)
			};

			GasCost::Call {
				value: peek_u256(2)?,
				target_exists,
			}
		}
		Opcode::CALLCODE => GasCost::CallCode {
			value: peek_u256(2)?,
		},
		Opcode::DELEGATECALL => GasCost::DelegateCall,
		Opcode::STATICCALL => GasCost::StaticCall,

		Opcode::SUICIDE => GasCost::Suicide {
			already_deleted: backend.deleted(address),
		},

		_ => GasCost::Invalid(opcode),
	};

	let memory_cost = match opcode {
		Opcode::SHA3 | Opcode::RETURN | Opcode::REVERT | Opcode::LOG0 | Opcode::LOG1
		| Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => Some(MemoryCost {
			offset: peek_u256(0)?,
			len: peek_u256(1)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: peek_u256(0)?,
			len: U256::from(32),
		}),
		Opcode::MSTORE8 => Some(MemoryCost {
			offset: peek_u256(0)?,
			len: U256::one(),
		}),

		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: peek_u256(0)?,
			len: peek_u256(2)?,
		}),
		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: peek_u256(1)?,
			len: peek_u256(3)?,
		}),

		Opcode::CREATE | Opcode::CREATE2 => Some(MemoryCost {
			offset: peek_u256(1)?,
			len: peek_u256(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: peek_u256(3)?,
				len: peek_u256(4)?,
			}
			.join(MemoryCost {
				offset: peek_u256(5)?,
				len: peek_u256(6)?,
			}),
		),
		Opcode::DELEGATECALL | Opcode::STATICCALL => Some(
			MemoryCost {
				offset: peek_u256(2)?,
				len: peek_u256(3)?,
			}
			.join(MemoryCost {
				offset: peek_u256(4)?,
				len: peek_u256(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, memory_cost))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn record_and_merge() {
		let config = Config::istanbul();
		let mut parent = Gasometer::new(100_000, false);
		parent.record_gas64(40_000).unwrap();

		let mut child = Gasometer::new(40_000, false);
		child.record_gas64(10_000).unwrap();
		child.record_refund(500);

		parent.merge(child, MergeStrategy::Commit);
		assert_eq!(parent.gas64(), 90_000);
		assert_eq!(parent.refunded_gas(), 500);
		assert_eq!(parent.effective_gas(&config), 90_500);
	}

	#[test]
	fn discard_burns_child_gas() {
		let mut parent = Gasometer::new(100_000, false);
		parent.record_gas64(40_000).unwrap();

		let mut child = Gasometer::new(40_000, false);
		child.record_gas64(10_000).unwrap();

		parent.merge(child, MergeStrategy::Discard);
		assert_eq!(parent.gas64(), 60_000);
	}

	#[test]
	fn out_of_gas_consumes_everything() {
		let mut gasometer = Gasometer::new(100, false);
		assert_eq!(gasometer.record_gas64(101), Err(ExitError::OutOfGas));
		assert_eq!(gasometer.gas64(), 0);
	}

	#[test]
	fn refund_is_capped() {
		let config = Config::istanbul();
		let mut gasometer = Gasometer::new(100_000, false);
		gasometer.record_gas64(10_000).unwrap();
		gasometer.record_refund(100_000);
		// Refund capped at used / 2.
		assert_eq!(gasometer.effective_gas(&config), 95_000);
	}
}
