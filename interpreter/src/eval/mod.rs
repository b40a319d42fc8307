//! Actual opcode evaluation implementations.

#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod journal;
mod misc;
mod system;

#[allow(unused_imports)]
use core::ops::{BitAnd, BitOr, BitXor};

use primitive_types::U256;

use crate::context::CallScheme;
use crate::error::{ExitError, ExitSucceed};
use crate::etable::Control;
use crate::handler::Handler;
use crate::opcode::Opcode;
use crate::runtime::Runtime;

/// Any unknown opcode.
pub fn eval_unknown<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	position: usize,
) -> Control {
	Control::Exit(ExitError::InvalidCode(Opcode(runtime.machine.code()[position])).into())
}

/// `STOP`
pub fn eval_stop<H: Handler>(
	_runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	Control::Exit(ExitSucceed::Stopped.into())
}

/// `ADD`
pub fn eval_add<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_tuple!(runtime, overflowing_add)
}

/// `MUL`
pub fn eval_mul<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_tuple!(runtime, overflowing_mul)
}

/// `SUB`
pub fn eval_sub<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_tuple!(runtime, overflowing_sub)
}

/// `DIV`
pub fn eval_div<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::div)
}

/// `SDIV`
pub fn eval_sdiv<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::sdiv)
}

/// `MOD`
pub fn eval_mod<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::rem)
}

/// `SMOD`
pub fn eval_smod<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::srem)
}

/// `ADDMOD`
pub fn eval_addmod<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op3_u256_fn!(runtime, self::arithmetic::addmod)
}

/// `MULMOD`
pub fn eval_mulmod<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op3_u256_fn!(runtime, self::arithmetic::mulmod)
}

/// `EXP`
pub fn eval_exp<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::exp)
}

/// `SIGNEXTEND`
pub fn eval_signextend<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::arithmetic::signextend)
}

/// `LT`
pub fn eval_lt<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_bool!(runtime, lt)
}

/// `GT`
pub fn eval_gt<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_bool!(runtime, gt)
}

/// `SLT`
pub fn eval_slt<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::bitwise::slt)
}

/// `SGT`
pub fn eval_sgt<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::bitwise::sgt)
}

/// `EQ`
pub fn eval_eq<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_bool!(runtime, eq)
}

/// `ISZERO`
pub fn eval_iszero<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op1_u256_fn!(runtime, self::bitwise::iszero)
}

/// `AND`
pub fn eval_and<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256!(runtime, bitand)
}

/// `OR`
pub fn eval_or<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256!(runtime, bitor)
}

/// `XOR`
pub fn eval_xor<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256!(runtime, bitxor)
}

/// `NOT`
pub fn eval_not<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op1_u256_fn!(runtime, self::bitwise::not)
}

/// `BYTE`
pub fn eval_byte<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::bitwise::byte)
}

/// `SHL`
pub fn eval_shl<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::bitwise::shl)
}

/// `SHR`
pub fn eval_shr<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::bitwise::shr)
}

/// `SAR`
pub fn eval_sar<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	op2_u256_fn!(runtime, self::bitwise::sar)
}

/// `CALLDATALOAD`
pub fn eval_calldataload<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::calldataload(runtime)
}

/// `CALLDATASIZE`
pub fn eval_calldatasize<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::calldatasize(runtime)
}

/// `CALLDATACOPY`
pub fn eval_calldatacopy<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::calldatacopy(runtime)
}

/// `CODESIZE`
pub fn eval_codesize<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::codesize(runtime)
}

/// `CODECOPY`
pub fn eval_codecopy<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::codecopy(runtime)
}

/// `POP`
pub fn eval_pop<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::pop(runtime)
}

/// `MLOAD`
pub fn eval_mload<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::mload(runtime)
}

/// `MSTORE`
pub fn eval_mstore<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::mstore(runtime)
}

/// `MSTORE8`
pub fn eval_mstore8<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::mstore8(runtime)
}

/// `JUMP`
pub fn eval_jump<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::jump(runtime, handler)
}

/// `JUMPI`
pub fn eval_jumpi<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::jumpi(runtime, handler)
}

/// `PC`
pub fn eval_pc<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	position: usize,
) -> Control {
	self::misc::pc(runtime, position)
}

/// `MSIZE`
pub fn eval_msize<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::msize(runtime)
}

/// `JUMPDEST`
pub fn eval_jumpdest<H: Handler>(
	_runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	Control::Continue(1)
}

/// `PUSH0`..`PUSH32`
pub fn eval_push<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	opcode: Opcode,
	position: usize,
) -> Control {
	self::misc::push(
		runtime,
		(opcode.as_u8() - Opcode::PUSH0.as_u8()) as usize,
		position,
	)
}

/// `DUP1`..`DUP16`
pub fn eval_dup<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::dup(
		runtime,
		(opcode.as_u8() - Opcode::DUP1.as_u8()) as usize + 1,
	)
}

/// `SWAP1`..`SWAP16`
pub fn eval_swap<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::swap(
		runtime,
		(opcode.as_u8() - Opcode::SWAP1.as_u8()) as usize + 1,
	)
}

/// `RETURN`
pub fn eval_return<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::ret(runtime)
}

/// `REVERT`
pub fn eval_revert<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::misc::revert(runtime)
}

/// `INVALID`
pub fn eval_invalid<H: Handler>(
	_runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	Control::Exit(ExitError::DesignatedInvalid.into())
}

/// `SHA3`
pub fn eval_sha3<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::sha3(runtime, handler)
}

/// `ADDRESS`
pub fn eval_address<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::address(runtime)
}

/// `BALANCE`
pub fn eval_balance<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::balance(runtime, handler)
}

/// `ORIGIN`
pub fn eval_origin<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::origin(runtime, handler)
}

/// `CALLER`
pub fn eval_caller<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::caller(runtime)
}

/// `CALLVALUE`
pub fn eval_callvalue<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::callvalue(runtime)
}

/// `GASPRICE`
pub fn eval_gasprice<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::gasprice(runtime, handler)
}

/// `EXTCODESIZE`
pub fn eval_extcodesize<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::extcodesize(runtime, handler)
}

/// `EXTCODECOPY`
pub fn eval_extcodecopy<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::extcodecopy(runtime, handler)
}

/// `RETURNDATASIZE`
pub fn eval_returndatasize<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::returndatasize(runtime)
}

/// `RETURNDATACOPY`
pub fn eval_returndatacopy<H: Handler>(
	runtime: &mut Runtime,
	_handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::returndatacopy(runtime)
}

/// `EXTCODEHASH`
pub fn eval_extcodehash<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::extcodehash(runtime, handler)
}

/// `BLOCKHASH`
pub fn eval_blockhash<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::blockhash(runtime, handler)
}

/// `COINBASE`
pub fn eval_coinbase<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::coinbase(runtime, handler)
}

/// `TIMESTAMP`
pub fn eval_timestamp<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::timestamp(runtime, handler)
}

/// `NUMBER`
pub fn eval_number<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::number(runtime, handler)
}

/// `DIFFICULTY`
pub fn eval_difficulty<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::prevrandao(runtime, handler)
}

/// `GASLIMIT`
pub fn eval_gaslimit<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::gaslimit(runtime, handler)
}

/// `CHAINID`
pub fn eval_chainid<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::chainid(runtime, handler)
}

/// `SELFBALANCE`
pub fn eval_selfbalance<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::selfbalance(runtime, handler)
}

/// `BASEFEE`
pub fn eval_basefee<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::basefee(runtime, handler)
}

/// `SLOAD`
pub fn eval_sload<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::sload(runtime, handler)
}

/// `SSTORE`
pub fn eval_sstore<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::sstore(runtime, handler)
}

/// `GAS`
pub fn eval_gas<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::gas(runtime, handler)
}

/// `LOG0`..`LOG4`
pub fn eval_log<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::log(runtime, opcode.as_u8() - Opcode::LOG0.as_u8(), handler)
}

/// `CREATE` and `CREATE2`
pub fn eval_create<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::create(runtime, opcode == Opcode::CREATE2, handler)
}

/// `CALL`, `CALLCODE`, `DELEGATECALL` and `STATICCALL`
pub fn eval_call<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	opcode: Opcode,
	_position: usize,
) -> Control {
	let scheme = match opcode {
		Opcode::CALLCODE => CallScheme::CallCode,
		Opcode::DELEGATECALL => CallScheme::DelegateCall,
		Opcode::STATICCALL => CallScheme::StaticCall,
		_ => CallScheme::Call,
	};

	self::system::call(runtime, scheme, handler)
}

/// `SUICIDE`
pub fn eval_suicide<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::system::suicide(runtime, handler)
}

/// `VJOURNAL`
pub fn eval_vjournal<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::value_change(runtime, handler)
}

/// `RJOURNAL`
pub fn eval_rjournal<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::reference_change(runtime, handler)
}

/// `VSSVAR`
pub fn eval_vssvar<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::value_state_var(runtime, handler)
}

/// `RSSVAR`
pub fn eval_rssvar<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::reference_state_var(runtime, handler)
}

/// `VIVJOURNAL`
pub fn eval_vivjournal<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::value_index_value(runtime, handler)
}

/// `VIRJOURNAL`
pub fn eval_virjournal<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::value_index_reference(runtime, handler)
}

/// `RIVJOURNAL`
pub fn eval_rivjournal<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::reference_index_value(runtime, handler)
}

/// `RIRJOURNAL`
pub fn eval_rirjournal<H: Handler>(
	runtime: &mut Runtime,
	handler: &mut H,
	_opcode: Opcode,
	_position: usize,
) -> Control {
	self::journal::reference_index_reference(runtime, handler)
}
