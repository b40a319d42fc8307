//! Orchestrator behaviour: call-tree shape, balance journaling, read-only
//! propagation, creates, gas exhaustion and cooperative cancellation.

mod common;

use common::*;
use evm_journal::backend::Backend;
use evm_journal::{Config, ExitError, ExitReason, ExitSucceed, Opcode};
use primitive_types::{H256, U256};

#[test]
fn call_tree_fan_out() {
	let config = Config::istanbul();
	let a = addr(0xa);
	let b = addr(0xb);
	let c = addr(0xc);
	let d = addr(0xd);

	let code_d = Asm::new().op(Opcode::STOP).build();
	let code_c = Asm::new().op(Opcode::STOP).build();
	let code_b = call_sequence(Asm::new(), d).op(Opcode::STOP).build();
	let code_a = call_sequence(call_sequence(Asm::new(), b), c)
		.op(Opcode::STOP)
		.build();

	let mut executor = executor(
		vec![
			(a, contract_account(code_a)),
			(b, contract_account(code_b)),
			(c, contract_account(code_c)),
			(d, contract_account(code_d)),
		],
		&config,
	);

	let (reason, _) = executor.transact_call(eoa(), a, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let tree = executor.tracer().call_tree();

	// Pre-order: a = 0, b = 1, d = 2, c = 3.
	let targets: Vec<_> = (0..4)
		.map(|index| tree.find(index).unwrap().borrow().to)
		.collect();
	assert_eq!(targets, vec![Some(a), Some(b), Some(d), Some(c)]);

	assert_eq!(tree.parent_of(2).map(|p| p.borrow().index), Some(1));
	let children_of_b: Vec<u64> = tree.children_of(1).iter().map(|n| n.borrow().index).collect();
	assert_eq!(children_of_b, vec![2]);
	let children_of_a: Vec<u64> = tree.children_of(0).iter().map(|n| n.borrow().index).collect();
	assert_eq!(children_of_a, vec![1, 3]);

	// The cursor is back at the root exit; every frame succeeded.
	assert!(tree.current().is_none());
	for index in 0..4 {
		assert!(tree.find(index).unwrap().borrow().error.is_none());
	}
}

#[test]
fn transfer_journals_both_balances() {
	let config = Config::istanbul();
	let receiver = addr(0xbeef);

	let mut executor = executor(vec![], &config);
	let (reason, _) = executor.transact_call(eoa(), receiver, U256::from(ETHER), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let sender_history = executor.tracer().balance(eoa()).unwrap();
	let entries = sender_history.entries(0).unwrap();
	assert_eq!(entries.len(), 2);
	let before = U256::from_big_endian(&entries[0]);
	let after = U256::from_big_endian(&entries[1]);
	assert_eq!(before - after, U256::from(ETHER));

	let receiver_history = executor.tracer().balance(receiver).unwrap();
	let entries = receiver_history.entries(0).unwrap();
	assert_eq!(entries.len(), 2);
	assert_eq!(U256::from_big_endian(&entries[0]), U256::zero());
	assert_eq!(U256::from_big_endian(&entries[1]), U256::from(ETHER));

	assert_eq!(executor.backend().balance(receiver), U256::from(ETHER));
}

#[test]
fn static_call_blocks_writes() {
	let config = Config::istanbul();
	let writer = addr(0x51);
	let caller_contract = addr(0x52);

	let writer_code = Asm::new()
		.push1(1)
		.push1(0)
		.op(Opcode::SSTORE)
		.op(Opcode::STOP)
		.build();

	// STATICCALL: gas, to, inOffset, inLen, outOffset, outLen.
	let caller_code = Asm::new()
		.push1(0) // out_len
		.push1(0) // out_offset
		.push1(0) // in_len
		.push1(0) // in_offset
		.push20(writer)
		.push2(0xffff)
		.op(Opcode::STATICCALL)
		.op(Opcode::POP)
		.op(Opcode::STOP)
		.build();

	let mut executor = executor(
		vec![
			(writer, contract_account(writer_code)),
			(caller_contract, contract_account(caller_code)),
		],
		&config,
	);

	let (reason, _) = executor.transact_call(eoa(), caller_contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	let child = executor.tracer().call_tree().find(1).unwrap();
	assert_eq!(
		child.borrow().error,
		Some(ExitReason::Error(ExitError::WriteProtection))
	);
	assert_eq!(executor.backend().storage(writer, h(0)), H256::default());
}

#[test]
fn selfdestruct_moves_balance_and_marks_account() {
	let config = Config::istanbul();
	let doomed = addr(0x66);
	let heir = addr(0x67);

	let code = Asm::new().push20(heir).op(Opcode::SUICIDE).build();
	let mut account = contract_account(code);
	account.balance = U256::from(5) * U256::from(ETHER);

	let mut executor = executor(vec![(doomed, account)], &config);
	let (reason, _) = executor.transact_call(eoa(), doomed, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Suicided));

	assert!(executor.backend().deleted(doomed));
	assert_eq!(executor.backend().balance(doomed), U256::zero());
	assert_eq!(
		executor.backend().balance(heir),
		U256::from(5) * U256::from(ETHER)
	);

	// Both balance histories were journaled around the sweep.
	assert!(executor.tracer().balance(doomed).is_some());
	assert!(executor.tracer().balance(heir).is_some());
}

#[test]
fn create_installs_runtime_code() {
	let config = Config::istanbul();

	// Init code: copy the single trailing STOP byte to memory and return
	// it as the runtime code.
	let init = vec![
		0x60, 0x01, // PUSH1 1 (len)
		0x60, 0x0c, // PUSH1 12 (code offset of the runtime byte)
		0x60, 0x00, // PUSH1 0 (memory offset)
		0x39, // CODECOPY
		0x60, 0x01, // PUSH1 1 (len)
		0x60, 0x00, // PUSH1 0 (start)
		0xf3, // RETURN
		0x00, // the runtime code: STOP
	];

	let mut executor = executor(vec![], &config);
	let (reason, address, _) = executor.transact_create(eoa(), U256::zero(), init);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));

	let address = address.unwrap();
	assert_eq!(executor.backend().code(address), vec![0x00]);
	assert_eq!(executor.backend().nonce(address), U256::one());

	// The constructor frame is the root of the call tree.
	let root = executor.tracer().call_tree().head().unwrap();
	assert_eq!(root.borrow().to, Some(address));
}

#[test]
fn create_collision_fails() {
	let config = Config::istanbul();
	let mut executor = executor(vec![], &config);

	// Occupy the address the sender's next create resolves to.
	let target = executor.create_address(&evm_journal::CreateScheme::Legacy { caller: eoa() });
	executor.backend_mut().set_code(target, vec![0x00]);

	let (reason, created, _) = executor.transact_create(eoa(), U256::zero(), vec![0x00]);
	assert_eq!(reason, ExitReason::Error(ExitError::CreateCollision));
	assert!(created.is_none());
}

#[test]
fn out_of_gas_consumes_the_frame() {
	let config = Config::istanbul();
	let contract = addr(0x77);

	// An infinite loop: JUMPDEST; PUSH1 0; JUMP.
	let code = vec![0x5b, 0x60, 0x00, 0x56];
	let backend = backend_with(vec![(contract, contract_account(code))]);
	let mut executor = evm_journal::Executor::new(backend, 50_000, &config);

	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(executor.used_gas(), 50_000);
}

#[test]
fn abort_stops_at_the_next_safe_point() {
	let config = Config::istanbul();
	let contract = addr(0x78);

	let code = vec![0x5b, 0x60, 0x00, 0x56];
	let backend = backend_with(vec![(contract, contract_account(code))]);
	let mut executor = evm_journal::Executor::new(backend, 50_000, &config);

	executor.abort_handle().abort();
	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	// The loop never ran, so almost all gas is left.
	assert!(executor.used_gas() < 22_000);
}

#[test]
fn msize_is_word_aligned_and_monotone() {
	let config = Config::istanbul();
	let contract = addr(0x79);

	// MSTORE8 at byte 33 expands memory to two words; a later MSTORE at 0
	// must not shrink it. Return MSIZE observed after both.
	let code = Asm::new()
		.push1(1) // value
		.push1(33) // offset
		.op(Opcode::MSTORE8)
		.op(Opcode::MSIZE)
		.push1(0)
		.op(Opcode::MSTORE)
		.push1(32)
		.push1(0)
		.op(Opcode::RETURN)
		.build();

	let mut executor = executor(vec![(contract, contract_account(code))], &config);
	let (reason, output) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));

	// After MSTORE8 at 33: 64 bytes. Nothing later shrinks it, and it
	// stays a multiple of 32.
	assert_eq!(U256::from_big_endian(&output), U256::from(64));
}

#[test]
fn call_depth_is_bounded() {
	let config = Config::istanbul();
	let contract = addr(0x7a);

	// A contract that calls itself with all remaining gas.
	let code = call_sequence(Asm::new(), contract).op(Opcode::STOP).build();
	let backend = backend_with(vec![(contract, contract_account(code))]);
	let mut executor = evm_journal::Executor::new(backend, 1_000_000, &config);

	let (reason, _) = executor.transact_call(eoa(), contract, U256::zero(), vec![]);
	// The 63/64 rule drains gas long before the hard depth limit; either
	// way the transaction itself completes successfully.
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));

	// Every frame is recorded with a strictly larger index than its
	// parent, and traversal yields a gapless pre-order sequence.
	let tree = executor.tracer().call_tree();
	let mut index = 0;
	while let Some(node) = tree.find(index) {
		if let Some(parent) = tree.parent_of(index) {
			assert!(parent.borrow().index < node.borrow().index);
		}
		index += 1;
	}
	assert!(index > 1);
}
