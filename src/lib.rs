//! An EVM-compatible bytecode interpreter that records, out of band, the
//! typed storage-state mutations and the nested contract-call tree a
//! transaction produces.
//!
//! The execution core (stack, memory, opcode table, dispatch loop, journal
//! opcodes) lives in the `evm-journal-interpreter` crate and is re-exported
//! here. This crate adds the orchestration layer: the [Config] of
//! fork-gated rules, the [backend::Backend] state capability with an
//! in-memory implementation, the gas tables and [gasometer::Gasometer],
//! the [tracer::Tracer], and the [Executor] that drives transactions.
//!
//! ```no_run
//! use evm_journal::backend::{MemoryBackend, MemoryVicinity};
//! use evm_journal::{Config, Executor};
//! use primitive_types::{H160, U256};
//!
//! let config = Config::istanbul();
//! let backend = MemoryBackend::new(MemoryVicinity::default(), Default::default());
//! let mut executor = Executor::new(backend, 1_000_000, &config);
//!
//! let caller = H160::from_low_u64_be(1);
//! let contract = H160::from_low_u64_be(2);
//! let (_reason, _output) = executor.transact_call(caller, contract, U256::zero(), vec![]);
//!
//! // The tracer now answers: which variables changed, with which values,
//! // under which call frame.
//! let _changes = executor.tracer().variable(contract, b"counter", &[]);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod backend;
mod config;
mod executor;
pub mod gasometer;
pub mod tracer;

pub use evm_journal_interpreter::{
	CallScheme, Context, Control, CreateScheme, Efn, Etable, ExitError, ExitFatal, ExitReason,
	ExitRevert, ExitSucceed, Handler, Machine, Memory, Opcode, Runtime, Stack, TracerError,
	Transfer, Valids,
};

pub use crate::config::Config;
pub use crate::executor::{AbortHandle, Executor};
pub use crate::gasometer::{Gasometer, MergeStrategy};
