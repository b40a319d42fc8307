use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};

use crate::error::ExitReason;
use crate::eval::*;
use crate::handler::Handler;
use crate::opcode::Opcode;
use crate::runtime::Runtime;

/// Control state returned by an opcode handler.
#[derive(Clone, Debug)]
pub enum Control {
	/// Advance the program counter by the given amount.
	Continue(usize),
	/// Jump to the given position. The dispatch loop validates the target
	/// against the JUMPDEST bitmap.
	Jump(usize),
	/// Exit the frame with the given reason.
	Exit(ExitReason),
}

/// Evaluation function type.
pub type Efn<H> = fn(&mut Runtime, &mut H, Opcode, usize) -> Control;

/// The evaluation table for the EVM: one handler per opcode byte. The gas
/// cost, stack effect and writability of each opcode live in the
/// orchestration layer's tables, consulted through `Handler::pre_validate`
/// before the handler runs.
pub struct Etable<H>([Efn<H>; 256], PhantomData<H>);

impl<H> Deref for Etable<H> {
	type Target = [Efn<H>; 256];

	fn deref(&self) -> &[Efn<H>; 256] {
		&self.0
	}
}

impl<H> DerefMut for Etable<H> {
	fn deref_mut(&mut self) -> &mut [Efn<H>; 256] {
		&mut self.0
	}
}

impl<H> Clone for Etable<H> {
	fn clone(&self) -> Self {
		Self(self.0, PhantomData)
	}
}

impl<H: Handler> Etable<H> {
	/// Core value for Etable: the calculation-only opcodes that need no
	/// handler.
	#[must_use]
	pub fn core() -> Self {
		let mut table: [Efn<H>; 256] = [eval_unknown as _; 256];

		table[Opcode::STOP.as_usize()] = eval_stop as _;
		table[Opcode::ADD.as_usize()] = eval_add as _;
		table[Opcode::MUL.as_usize()] = eval_mul as _;
		table[Opcode::SUB.as_usize()] = eval_sub as _;
		table[Opcode::DIV.as_usize()] = eval_div as _;
		table[Opcode::SDIV.as_usize()] = eval_sdiv as _;
		table[Opcode::MOD.as_usize()] = eval_mod as _;
		table[Opcode::SMOD.as_usize()] = eval_smod as _;
		table[Opcode::ADDMOD.as_usize()] = eval_addmod as _;
		table[Opcode::MULMOD.as_usize()] = eval_mulmod as _;
		table[Opcode::EXP.as_usize()] = eval_exp as _;
		table[Opcode::SIGNEXTEND.as_usize()] = eval_signextend as _;

		table[Opcode::LT.as_usize()] = eval_lt as _;
		table[Opcode::GT.as_usize()] = eval_gt as _;
		table[Opcode::SLT.as_usize()] = eval_slt as _;
		table[Opcode::SGT.as_usize()] = eval_sgt as _;
		table[Opcode::EQ.as_usize()] = eval_eq as _;
		table[Opcode::ISZERO.as_usize()] = eval_iszero as _;
		table[Opcode::AND.as_usize()] = eval_and as _;
		table[Opcode::OR.as_usize()] = eval_or as _;
		table[Opcode::XOR.as_usize()] = eval_xor as _;
		table[Opcode::NOT.as_usize()] = eval_not as _;
		table[Opcode::BYTE.as_usize()] = eval_byte as _;
		table[Opcode::SHL.as_usize()] = eval_shl as _;
		table[Opcode::SHR.as_usize()] = eval_shr as _;
		table[Opcode::SAR.as_usize()] = eval_sar as _;

		table[Opcode::CALLDATALOAD.as_usize()] = eval_calldataload as _;
		table[Opcode::CALLDATASIZE.as_usize()] = eval_calldatasize as _;
		table[Opcode::CALLDATACOPY.as_usize()] = eval_calldatacopy as _;
		table[Opcode::CODESIZE.as_usize()] = eval_codesize as _;
		table[Opcode::CODECOPY.as_usize()] = eval_codecopy as _;

		table[Opcode::POP.as_usize()] = eval_pop as _;
		table[Opcode::MLOAD.as_usize()] = eval_mload as _;
		table[Opcode::MSTORE.as_usize()] = eval_mstore as _;
		table[Opcode::MSTORE8.as_usize()] = eval_mstore8 as _;

		table[Opcode::JUMP.as_usize()] = eval_jump as _;
		table[Opcode::JUMPI.as_usize()] = eval_jumpi as _;
		table[Opcode::PC.as_usize()] = eval_pc as _;
		table[Opcode::MSIZE.as_usize()] = eval_msize as _;
		table[Opcode::JUMPDEST.as_usize()] = eval_jumpdest as _;

		let mut op = Opcode::PUSH0.as_usize();
		while op <= Opcode::PUSH32.as_usize() {
			table[op] = eval_push as _;
			op += 1;
		}

		let mut op = Opcode::DUP1.as_usize();
		while op <= Opcode::DUP16.as_usize() {
			table[op] = eval_dup as _;
			op += 1;
		}

		let mut op = Opcode::SWAP1.as_usize();
		while op <= Opcode::SWAP16.as_usize() {
			table[op] = eval_swap as _;
			op += 1;
		}

		table[Opcode::RETURN.as_usize()] = eval_return as _;
		table[Opcode::REVERT.as_usize()] = eval_revert as _;
		table[Opcode::INVALID.as_usize()] = eval_invalid as _;

		Self(table, PhantomData)
	}

	/// Runtime Etable: the full instruction set, including the journal
	/// opcodes.
	#[must_use]
	pub fn runtime() -> Self {
		let mut table = Self::core();

		table.0[Opcode::SHA3.as_usize()] = eval_sha3 as _;

		table.0[Opcode::ADDRESS.as_usize()] = eval_address as _;
		table.0[Opcode::BALANCE.as_usize()] = eval_balance as _;
		table.0[Opcode::ORIGIN.as_usize()] = eval_origin as _;
		table.0[Opcode::CALLER.as_usize()] = eval_caller as _;
		table.0[Opcode::CALLVALUE.as_usize()] = eval_callvalue as _;
		table.0[Opcode::GASPRICE.as_usize()] = eval_gasprice as _;
		table.0[Opcode::EXTCODESIZE.as_usize()] = eval_extcodesize as _;
		table.0[Opcode::EXTCODECOPY.as_usize()] = eval_extcodecopy as _;
		table.0[Opcode::RETURNDATASIZE.as_usize()] = eval_returndatasize as _;
		table.0[Opcode::RETURNDATACOPY.as_usize()] = eval_returndatacopy as _;
		table.0[Opcode::EXTCODEHASH.as_usize()] = eval_extcodehash as _;

		table.0[Opcode::BLOCKHASH.as_usize()] = eval_blockhash as _;
		table.0[Opcode::COINBASE.as_usize()] = eval_coinbase as _;
		table.0[Opcode::TIMESTAMP.as_usize()] = eval_timestamp as _;
		table.0[Opcode::NUMBER.as_usize()] = eval_number as _;
		table.0[Opcode::DIFFICULTY.as_usize()] = eval_difficulty as _;
		table.0[Opcode::GASLIMIT.as_usize()] = eval_gaslimit as _;
		table.0[Opcode::CHAINID.as_usize()] = eval_chainid as _;
		table.0[Opcode::SELFBALANCE.as_usize()] = eval_selfbalance as _;
		table.0[Opcode::BASEFEE.as_usize()] = eval_basefee as _;

		table.0[Opcode::SLOAD.as_usize()] = eval_sload as _;
		table.0[Opcode::SSTORE.as_usize()] = eval_sstore as _;
		table.0[Opcode::GAS.as_usize()] = eval_gas as _;

		table.0[Opcode::LOG0.as_usize()] = eval_log as _;
		table.0[Opcode::LOG1.as_usize()] = eval_log as _;
		table.0[Opcode::LOG2.as_usize()] = eval_log as _;
		table.0[Opcode::LOG3.as_usize()] = eval_log as _;
		table.0[Opcode::LOG4.as_usize()] = eval_log as _;

		table.0[Opcode::CREATE.as_usize()] = eval_create as _;
		table.0[Opcode::CREATE2.as_usize()] = eval_create as _;
		table.0[Opcode::CALL.as_usize()] = eval_call as _;
		table.0[Opcode::CALLCODE.as_usize()] = eval_call as _;
		table.0[Opcode::DELEGATECALL.as_usize()] = eval_call as _;
		table.0[Opcode::STATICCALL.as_usize()] = eval_call as _;
		table.0[Opcode::SUICIDE.as_usize()] = eval_suicide as _;

		table.0[Opcode::VJOURNAL.as_usize()] = eval_vjournal as _;
		table.0[Opcode::RJOURNAL.as_usize()] = eval_rjournal as _;
		table.0[Opcode::VSSVAR.as_usize()] = eval_vssvar as _;
		table.0[Opcode::RSSVAR.as_usize()] = eval_rssvar as _;
		table.0[Opcode::VIVJOURNAL.as_usize()] = eval_vivjournal as _;
		table.0[Opcode::VIRJOURNAL.as_usize()] = eval_virjournal as _;
		table.0[Opcode::RIVJOURNAL.as_usize()] = eval_rivjournal as _;
		table.0[Opcode::RIRJOURNAL.as_usize()] = eval_rirjournal as _;

		table
	}
}
