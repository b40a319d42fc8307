//! End-to-end journaling scenarios: instrumented bytecode feeding the
//! state tracer through the journal opcodes.

mod common;

use common::*;
use evm_journal::backend::Backend;
use evm_journal::{Config, ExitError, ExitReason, ExitSucceed, Opcode, TracerError};
use primitive_types::{H256, U256};

fn h256_of(bytes: &[u8]) -> H256 {
	let mut padded = H256::default();
	padded[..bytes.len()].copy_from_slice(bytes);
	padded
}

/// A contract that binds `dummy3` to slot 0, journals the initial value,
/// stores 100 and journals again.
fn dummy3_contract() -> Vec<u8> {
	Asm::new()
		.store_label(0, b"dummy3")
		// VSSVAR: namePtr, slot, offset, typeId (top first).
		.push1(0xaa) // typeId
		.push1(0) // offset
		.push1(0) // slot
		.push1(0) // namePtr
		.op(Opcode::VSSVAR)
		// VJOURNAL: slot, offset, typeSize, typeId.
		.push1(0xaa)
		.push1(32)
		.push1(0)
		.push1(0)
		.op(Opcode::VJOURNAL)
		// SSTORE slot 0 = 100.
		.push1(100)
		.push1(0)
		.op(Opcode::SSTORE)
		.push1(0xaa)
		.push1(32)
		.push1(0)
		.push1(0)
		.op(Opcode::VJOURNAL)
		.op(Opcode::STOP)
		.build()
}

#[test]
fn value_write_history() {
	let config = Config::istanbul();
	let contract = addr(0xc1);
	let mut executor = executor(
		vec![(contract, contract_account(dummy3_contract()))],
		&config,
	);

	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let history = executor.tracer().variable(contract, b"dummy3", &[]).unwrap();
	assert_eq!(
		history.entries(0),
		Some(&vec![be32(0), be32(100)])
	);

	// The physical store is in the raw log too.
	let raw = executor.tracer().raw_slot(contract, h(0)).unwrap();
	assert_eq!(raw.get(&0), Some(&h(100)));

	// The same node resolves through the slot index.
	let by_slot = executor
		.tracer()
		.slot(contract, h(0), Some(U256::zero()), h(0xaa))
		.unwrap()
		.unwrap();
	assert_eq!(by_slot.entries(0), Some(&vec![be32(0), be32(100)]));
}

/// A contract that binds `dummy` to slot 1, journals the empty string,
/// stores "haha" (short-form packing) and journals again.
fn string_contract() -> Vec<u8> {
	// "haha" followed by zeros, with length * 2 in the final byte.
	let mut packed = H256::default();
	packed[..4].copy_from_slice(b"haha");
	packed.as_bytes_mut()[31] = 8;

	Asm::new()
		.store_label(0, b"dummy")
		// RSSVAR: namePtr, slot, typeId.
		.push1(0xbb) // typeId
		.push1(1) // slot
		.push1(0) // namePtr
		.op(Opcode::RSSVAR)
		// RJOURNAL: slot, typeId.
		.push1(0xbb)
		.push1(1)
		.op(Opcode::RJOURNAL)
		.push32(packed)
		.push1(1)
		.op(Opcode::SSTORE)
		.push1(0xbb)
		.push1(1)
		.op(Opcode::RJOURNAL)
		.op(Opcode::STOP)
		.build()
}

#[test]
fn string_write_history() {
	let config = Config::istanbul();
	let contract = addr(0xc2);
	let mut executor = executor(
		vec![(contract, contract_account(string_contract()))],
		&config,
	);

	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let history = executor.tracer().variable(contract, b"dummy", &[]).unwrap();
	assert_eq!(
		history.entries(0),
		Some(&vec![Vec::new(), b"haha".to_vec()])
	);
}

/// `mapping(uint256 => mapping(bytes => uint256)) m`, with the access
/// `m[1][0x61] = 7` journaled: the root binding, both index keys, and the
/// final value write.
fn nested_mapping_contract(s1: H256, s2: H256) -> Vec<u8> {
	Asm::new()
		.store_label(0, b"m")
		// RSSVAR: bind "m" at slot 2.
		.push1(0xa0) // typeId of m
		.push1(2) // slot
		.push1(0) // namePtr
		.op(Opcode::RSSVAR)
		// VIRJOURNAL: parentSlot, slot, keyWord, typeId, parentTypeId.
		.push1(0xa0) // parentTypeId
		.push1(0xa1) // typeId of m[1]
		.push1(1) // keyWord
		.push32(s1) // slot of m[1]
		.push1(2) // parentSlot
		.op(Opcode::VIRJOURNAL)
		// Key bytes "a" for the inner mapping, length-prefixed at 64.
		.store_label(64, b"a")
		// RIVJOURNAL: parentSlot, slot, keyPtr, offset, typeId, parentTypeId.
		.push1(0xa1) // parentTypeId
		.push1(0xa2) // typeId of m[1][..]
		.push1(0) // offset
		.push1(64) // keyPtr
		.push32(s2) // slot of m[1]["a"]
		.push32(s1) // parentSlot
		.op(Opcode::RIVJOURNAL)
		// SSTORE s2 = 7, then journal the write.
		.push1(7)
		.push32(s2)
		.op(Opcode::SSTORE)
		.push1(0xa2)
		.push1(32)
		.push1(0)
		.push32(s2)
		.op(Opcode::VJOURNAL)
		.op(Opcode::STOP)
		.build()
}

#[test]
fn nested_mapping_history() {
	let config = Config::istanbul();
	let contract = addr(0xc3);
	let s1 = h(0x1111);
	let s2 = h(0x2222);
	let mut executor = executor(
		vec![(contract, contract_account(nested_mapping_contract(s1, s2)))],
		&config,
	);

	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let history = executor
		.tracer()
		.variable(contract, b"m", &[be32(1), b"a".to_vec()])
		.unwrap();
	assert_eq!(history.entries(0), Some(&vec![be32(7)]));

	let indices = executor.tracer().indices_of(contract, b"m", &[]);
	assert_eq!(indices, vec![be32(1)]);
	assert_eq!(
		executor.tracer().indices_of(contract, b"m", &[be32(1)]),
		vec![b"a".to_vec()]
	);
}

/// A contract that writes and journals `x = 9`, then reverts.
fn reverting_writer() -> Vec<u8> {
	Asm::new()
		.store_label(0, b"x")
		.push1(0xcc)
		.push1(0)
		.push1(0)
		.push1(0)
		.op(Opcode::VSSVAR)
		.push1(9)
		.push1(0)
		.op(Opcode::SSTORE)
		.push1(0xcc)
		.push1(32)
		.push1(0)
		.push1(0)
		.op(Opcode::VJOURNAL)
		.push1(0)
		.push1(0)
		.op(Opcode::REVERT)
		.build()
}

#[test]
fn revert_discards_writes_but_keeps_the_call() {
	let config = Config::istanbul();
	let writer = addr(0xcd);
	let caller_contract = addr(0xca);

	let caller_code = call_sequence(Asm::new(), writer).op(Opcode::STOP).build();
	let mut executor = executor(
		vec![
			(writer, contract_account(reverting_writer())),
			(caller_contract, contract_account(caller_code)),
		],
		&config,
	);

	let (reason, _) = executor.transact_call(eoa(), caller_contract, U256::zero(), vec![]);
	// The revert happened in the child; the outer call still succeeds.
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	// The call tree keeps the failed child with its terminal error.
	let children = executor.tracer().call_tree().children_of(0);
	assert_eq!(children.len(), 1);
	let child = children[0].borrow();
	assert_eq!(child.index, 1);
	assert_eq!(child.to, Some(writer));
	assert!(matches!(child.error, Some(ExitReason::Revert(_))));

	// The journaled write and the raw slot entry are both gone.
	let history = executor.tracer().variable(writer, b"x", &[]);
	assert!(history.map_or(true, |h| h.is_empty()));
	assert!(executor.tracer().raw_slot(writer, h(0)).is_none());

	// And the state itself was rolled back.
	assert_eq!(executor.backend().storage(writer, h(0)), H256::default());
}

/// Two identical stores bracketed by journals produce one raw entry and
/// one typed entry.
#[test]
fn idempotent_sstore_coalesces() {
	let config = Config::istanbul();
	let contract = addr(0xc5);

	let code = Asm::new()
		.store_label(0, b"y")
		.push1(0xee)
		.push1(0)
		.push1(0)
		.push1(0)
		.op(Opcode::VSSVAR)
		.push1(5)
		.push1(0)
		.op(Opcode::SSTORE)
		.push1(0xee)
		.push1(32)
		.push1(0)
		.push1(0)
		.op(Opcode::VJOURNAL)
		.push1(5)
		.push1(0)
		.op(Opcode::SSTORE)
		.push1(0xee)
		.push1(32)
		.push1(0)
		.push1(0)
		.op(Opcode::VJOURNAL)
		.op(Opcode::STOP)
		.build();

	let mut executor = executor(vec![(contract, contract_account(code))], &config);
	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let raw = executor.tracer().raw_slot(contract, h(0)).unwrap();
	assert_eq!(raw.len(), 1);
	assert_eq!(raw.get(&0), Some(&h(5)));

	let history = executor.tracer().variable(contract, b"y", &[]).unwrap();
	assert_eq!(history.entries(0), Some(&vec![be32(5)]));
}

/// A journal against an unregistered key fails the frame under the strict
/// policy and is merely counted otherwise.
#[test]
fn journal_error_policy() {
	let unbound_journal = Asm::new()
		.push1(0xaa)
		.push1(32)
		.push1(0)
		.push1(0)
		.op(Opcode::VJOURNAL)
		.op(Opcode::STOP)
		.build();
	let contract = addr(0xc6);

	let strict = Config::istanbul();
	let mut executor_strict = executor(
		vec![(contract, contract_account(unbound_journal.clone()))],
		&strict,
	);
	let (reason, _) = executor_strict.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(
		reason,
		ExitReason::Error(ExitError::Tracer(TracerError::UnknownAccount))
	);

	let mut relaxed = Config::istanbul();
	relaxed.strict_journal = false;
	let mut executor_relaxed = executor(
		vec![(contract, contract_account(unbound_journal))],
		&relaxed,
	);
	let (reason, _) = executor_relaxed.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(executor_relaxed.tracer().journal_errors(), 1);
}

/// The bytes a value journal records match what `SLOAD` reads back over
/// the same window.
#[test]
fn journal_matches_storage_window() {
	let config = Config::istanbul();
	let contract = addr(0xc7);

	// Store a full word, then journal only the low 4 bytes at offset 0.
	let word = h256_of(&[0xde, 0xad, 0xbe, 0xef]);
	let code = Asm::new()
		.store_label(0, b"w")
		.push1(0x42)
		.push1(28) // offset: the top four bytes of the word
		.push1(0) // slot
		.push1(0) // namePtr
		.op(Opcode::VSSVAR)
		.push32(word)
		.push1(0)
		.op(Opcode::SSTORE)
		.push1(0x42)
		.push1(4) // typeSize
		.push1(28) // offset: the top four bytes of the word
		.push1(0)
		.op(Opcode::VJOURNAL)
		.op(Opcode::STOP)
		.build();

	let mut executor = executor(vec![(contract, contract_account(code))], &config);
	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let stored = executor.backend().storage(contract, h(0));
	let history = executor.tracer().variable(contract, b"w", &[]).unwrap();
	assert_eq!(history.entries(0), Some(&vec![stored[0..4].to_vec()]));
	assert_eq!(history.entries(0), Some(&vec![vec![0xde, 0xad, 0xbe, 0xef]]));
}
