//! Execution core for the journaling EVM.
//!
//! This crate holds the per-frame scratch state (stack, memory, jump
//! destination bitmap), the opcode evaluation table and the dispatch loop.
//! Everything environmental goes through the [Handler] trait: state reads
//! and writes, gas accounting, the cooperative abort flag, nested
//! call/create invocations and the journal opcodes' tracer events. The
//! orchestration layer lives in the `evm-journal` crate.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod context;
mod error;
mod etable;
pub mod eval;
mod handler;
mod memory;
mod opcode;
mod runtime;
mod stack;
pub mod utils;
mod valids;

pub use crate::context::{CallScheme, Context, CreateScheme, Transfer};
pub use crate::error::{
	ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, TracerError,
};
pub use crate::etable::{Control, Efn, Etable};
pub use crate::handler::Handler;
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::runtime::{Machine, Runtime};
pub use crate::stack::Stack;
pub use crate::valids::Valids;
