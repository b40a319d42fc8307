use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::context::Context;
use crate::error::{ExitReason, ExitSucceed};
use crate::etable::{Control, Etable};
use crate::handler::Handler;
use crate::memory::Memory;
use crate::opcode::Opcode;
use crate::stack::Stack;
use crate::valids::Valids;

/// Core execution layer for the EVM: the per-frame scratch state.
pub struct Machine {
	/// Program data.
	pub(crate) data: Rc<Vec<u8>>,
	/// Program code.
	pub(crate) code: Rc<Vec<u8>>,
	/// Program counter.
	position: Result<usize, ExitReason>,
	/// Code validity map.
	valids: Valids,
	/// Memory.
	pub memory: Memory,
	/// Stack.
	pub stack: Stack,
	/// Return value of this frame, set by `RETURN` or `REVERT`.
	pub retval: Vec<u8>,
}

impl Machine {
	/// Create a new machine with given code and data. The jump destination
	/// analysis runs once, here.
	pub fn new(code: Rc<Vec<u8>>, data: Rc<Vec<u8>>, stack_limit: usize, memory_limit: usize) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: Ok(0),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
			retval: Vec::new(),
		}
	}

	/// Machine code.
	#[must_use]
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// Machine call data.
	#[must_use]
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Whether the machine has empty code.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.code.is_empty()
	}

	/// Reference of the program counter.
	pub const fn position(&self) -> &Result<usize, ExitReason> {
		&self.position
	}

	/// Explicit exit of the machine. Further steps will return the reason.
	pub fn exit(&mut self, reason: ExitReason) {
		self.position = Err(reason);
	}
}

/// A contract frame: machine plus the runtime context the environment
/// opcodes observe, and the buffer holding the last sub-call's return
/// data.
pub struct Runtime {
	/// The per-frame machine.
	pub machine: Machine,
	/// Frame context.
	pub context: Context,
	/// Return data of the last sub-call, observed by `RETURNDATASIZE` and
	/// `RETURNDATACOPY`. Note the difference from `machine.retval`, which
	/// is what this frame itself returns.
	pub return_data_buffer: Vec<u8>,
}

impl Runtime {
	/// Create a new runtime with given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		context: Context,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		Self {
			machine: Machine::new(code, data, stack_limit, memory_limit),
			context,
			return_data_buffer: Vec::new(),
		}
	}

	/// Step the machine, executing one opcode. It then returns.
	#[inline]
	pub fn step<H: Handler>(
		&mut self,
		handler: &mut H,
		etable: &Etable<H>,
	) -> Result<(), ExitReason> {
		let position = match self.machine.position {
			Ok(position) => position,
			Err(ref reason) => return Err(reason.clone()),
		};

		if handler.aborted() {
			let reason = ExitReason::Succeed(ExitSucceed::Stopped);
			self.machine.exit(reason.clone());
			return Err(reason);
		}

		let opcode = match self.machine.code().get(position) {
			Some(opcode) => Opcode(*opcode),
			None => {
				let reason = ExitReason::Succeed(ExitSucceed::Stopped);
				self.machine.exit(reason.clone());
				return Err(reason);
			}
		};

		if let Err(error) = handler.pre_validate(&self.context, opcode, &self.machine.stack) {
			let reason = ExitReason::Error(error);
			self.machine.exit(reason.clone());
			return Err(reason);
		}

		match etable[opcode.as_usize()](self, handler, opcode, position) {
			Control::Continue(by) => {
				self.machine.position = Ok(position + by);
				Ok(())
			}
			Control::Jump(to) => {
				if self.machine.valids.is_valid(to) {
					self.machine.position = Ok(to);
					Ok(())
				} else {
					let reason = ExitReason::Error(crate::error::ExitError::InvalidJump);
					self.machine.exit(reason.clone());
					Err(reason)
				}
			}
			Control::Exit(reason) => {
				self.machine.exit(reason.clone());
				Err(reason)
			}
		}
	}

	/// Loop stepping the machine until it exits.
	pub fn run<H: Handler>(&mut self, handler: &mut H, etable: &Etable<H>) -> ExitReason {
		loop {
			match self.step(handler, etable) {
				Ok(()) => (),
				Err(reason) => return reason,
			}
		}
	}
}
