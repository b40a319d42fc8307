#![allow(dead_code)]

use std::collections::BTreeMap;

use evm_journal::backend::{MemoryAccount, MemoryBackend, MemoryVicinity};
use evm_journal::{Config, Executor, Opcode};
use primitive_types::{H160, H256, U256};

/// Tiny bytecode assembler for test contracts. Stack operands are pushed
/// in reverse of the order the opcode pops them, so read each sequence
/// bottom-up against the opcode's stack layout.
#[derive(Default)]
pub struct Asm {
	code: Vec<u8>,
}

impl Asm {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn op(mut self, opcode: Opcode) -> Self {
		self.code.push(opcode.as_u8());
		self
	}

	pub fn push1(mut self, value: u8) -> Self {
		self.code.push(Opcode::PUSH1.as_u8());
		self.code.push(value);
		self
	}

	pub fn push2(mut self, value: u16) -> Self {
		self.code.push(Opcode::PUSH2.as_u8());
		self.code.extend_from_slice(&value.to_be_bytes());
		self
	}

	pub fn push20(mut self, value: H160) -> Self {
		self.code.push(Opcode::PUSH20.as_u8());
		self.code.extend_from_slice(value.as_bytes());
		self
	}

	pub fn push32(mut self, value: H256) -> Self {
		self.code.push(Opcode::PUSH32.as_u8());
		self.code.extend_from_slice(value.as_bytes());
		self
	}

	pub fn push_u256(self, value: U256) -> Self {
		let mut bytes = H256::default();
		value.to_big_endian(&mut bytes[..]);
		self.push32(bytes)
	}

	/// Store a 32-byte word at a fixed memory offset.
	pub fn mstore32(self, offset: u8, value: H256) -> Self {
		self.push32(value).push1(offset).op(Opcode::MSTORE)
	}

	/// Write a length-prefixed label into memory at `offset`: the length
	/// word first, the left-aligned bytes in the following word. This is
	/// the layout the journal opcodes load labels from.
	pub fn store_label(self, offset: u8, label: &[u8]) -> Self {
		assert!(label.len() <= 32);
		let mut padded = H256::default();
		padded[..label.len()].copy_from_slice(label);
		self.push1(label.len() as u8)
			.push1(offset)
			.op(Opcode::MSTORE)
			.mstore32(offset + 32, padded)
	}

	pub fn build(self) -> Vec<u8> {
		self.code
	}
}

pub fn addr(n: u64) -> H160 {
	H160::from_low_u64_be(n)
}

pub fn h(n: u64) -> H256 {
	H256::from_low_u64_be(n)
}

pub fn be32(n: u64) -> Vec<u8> {
	h(n).as_bytes().to_vec()
}

pub fn word_bytes(n: u64) -> Vec<u8> {
	be32(n)
}

pub const ETHER: u64 = 1_000_000_000_000_000_000;

/// A funded externally-owned account used as the transaction sender.
pub fn eoa() -> H160 {
	addr(0xf00d)
}

pub fn contract_account(code: Vec<u8>) -> MemoryAccount {
	MemoryAccount {
		nonce: U256::one(),
		balance: U256::zero(),
		storage: BTreeMap::new(),
		code,
	}
}

pub fn backend_with(accounts: Vec<(H160, MemoryAccount)>) -> MemoryBackend {
	let mut state: BTreeMap<H160, MemoryAccount> = BTreeMap::new();
	state.insert(
		eoa(),
		MemoryAccount {
			nonce: U256::zero(),
			balance: U256::from(10) * U256::from(ETHER),
			storage: BTreeMap::new(),
			code: Vec::new(),
		},
	);
	for (address, account) in accounts {
		state.insert(address, account);
	}
	MemoryBackend::new(MemoryVicinity::default(), state)
}

pub fn executor<'config>(
	accounts: Vec<(H160, MemoryAccount)>,
	config: &'config Config,
) -> Executor<'config, MemoryBackend> {
	Executor::new(backend_with(accounts), 1_000_000, config)
}

/// `CALL` with no value and no copied output: the operands are pushed in
/// reverse, gas on top.
pub fn call_sequence(asm: Asm, target: H160) -> Asm {
	asm.push1(0) // out_len
		.push1(0) // out_offset
		.push1(0) // in_len
		.push1(0) // in_offset
		.push1(0) // value
		.push20(target)
		.push2(0xffff) // gas
		.op(Opcode::CALL)
		.op(Opcode::POP)
}
