use evm_journal_interpreter::Opcode;

pub const G_ZERO: u64 = 0;
pub const G_BASE: u64 = 2;
pub const G_VERYLOW: u64 = 3;
pub const G_LOW: u64 = 5;
pub const G_MID: u64 = 8;
pub const G_HIGH: u64 = 10;
pub const G_JUMPDEST: u64 = 1;
pub const G_EXP: u64 = 10;
pub const G_MEMORY: u64 = 3;
pub const G_QUAD_DIVISOR: u64 = 512;
pub const G_COPY: u64 = 3;
pub const G_SHA3: u64 = 30;
pub const G_SHA3_WORD: u64 = 6;
pub const G_LOG: u64 = 375;
pub const G_LOGDATA: u64 = 8;
pub const G_LOGTOPIC: u64 = 375;
pub const G_BLOCKHASH: u64 = 20;
pub const G_CREATE: u64 = 32000;
pub const G_CODEDEPOSIT: u64 = 200;
pub const G_CALLVALUE: u64 = 9000;
pub const G_NEWACCOUNT: u64 = 25000;
pub const G_SSTORE_SET: u64 = 20000;
pub const G_SSTORE_RESET: u64 = 5000;
pub const R_SSTORE_CLEAR: i64 = 15000;
pub const R_SUICIDE: i64 = 24000;
/// Fixed cost of every journal opcode.
pub const G_JOURNAL: u64 = 3;

/// Static gas cost per opcode; `None` for opcodes priced by
/// `dynamic_opcode_cost` (or unknown ones, which it rejects).
pub static STATIC_COST_TABLE: [Option<u64>; 256] = static_cost_table();

const fn static_cost_table() -> [Option<u64>; 256] {
	let mut table: [Option<u64>; 256] = [None; 256];

	table[Opcode::STOP.as_usize()] = Some(G_ZERO);
	table[Opcode::INVALID.as_usize()] = Some(G_ZERO);

	table[Opcode::ADDRESS.as_usize()] = Some(G_BASE);
	table[Opcode::ORIGIN.as_usize()] = Some(G_BASE);
	table[Opcode::CALLER.as_usize()] = Some(G_BASE);
	table[Opcode::CALLVALUE.as_usize()] = Some(G_BASE);
	table[Opcode::CALLDATASIZE.as_usize()] = Some(G_BASE);
	table[Opcode::CODESIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GASPRICE.as_usize()] = Some(G_BASE);
	table[Opcode::COINBASE.as_usize()] = Some(G_BASE);
	table[Opcode::TIMESTAMP.as_usize()] = Some(G_BASE);
	table[Opcode::NUMBER.as_usize()] = Some(G_BASE);
	table[Opcode::DIFFICULTY.as_usize()] = Some(G_BASE);
	table[Opcode::GASLIMIT.as_usize()] = Some(G_BASE);
	table[Opcode::POP.as_usize()] = Some(G_BASE);
	table[Opcode::PC.as_usize()] = Some(G_BASE);
	table[Opcode::MSIZE.as_usize()] = Some(G_BASE);
	table[Opcode::GAS.as_usize()] = Some(G_BASE);
	table[Opcode::PUSH0.as_usize()] = Some(G_BASE);

	table[Opcode::ADD.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SUB.as_usize()] = Some(G_VERYLOW);
	table[Opcode::NOT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::LT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::GT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SLT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::SGT.as_usize()] = Some(G_VERYLOW);
	table[Opcode::EQ.as_usize()] = Some(G_VERYLOW);
	table[Opcode::ISZERO.as_usize()] = Some(G_VERYLOW);
	table[Opcode::AND.as_usize()] = Some(G_VERYLOW);
	table[Opcode::OR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::XOR.as_usize()] = Some(G_VERYLOW);
	table[Opcode::BYTE.as_usize()] = Some(G_VERYLOW);
	table[Opcode::CALLDATALOAD.as_usize()] = Some(G_VERYLOW);

	let mut op = Opcode::PUSH1.as_usize();
	while op <= Opcode::PUSH32.as_usize() {
		table[op] = Some(G_VERYLOW);
		op += 1;
	}

	let mut op = Opcode::DUP1.as_usize();
	while op <= Opcode::DUP16.as_usize() {
		table[op] = Some(G_VERYLOW);
		op += 1;
	}

	let mut op = Opcode::SWAP1.as_usize();
	while op <= Opcode::SWAP16.as_usize() {
		table[op] = Some(G_VERYLOW);
		op += 1;
	}

	table[Opcode::MUL.as_usize()] = Some(G_LOW);
	table[Opcode::DIV.as_usize()] = Some(G_LOW);
	table[Opcode::SDIV.as_usize()] = Some(G_LOW);
	table[Opcode::MOD.as_usize()] = Some(G_LOW);
	table[Opcode::SMOD.as_usize()] = Some(G_LOW);
	table[Opcode::SIGNEXTEND.as_usize()] = Some(G_LOW);

	table[Opcode::ADDMOD.as_usize()] = Some(G_MID);
	table[Opcode::MULMOD.as_usize()] = Some(G_MID);
	table[Opcode::JUMP.as_usize()] = Some(G_MID);

	table[Opcode::JUMPI.as_usize()] = Some(G_HIGH);
	table[Opcode::JUMPDEST.as_usize()] = Some(G_JUMPDEST);

	table[Opcode::VJOURNAL.as_usize()] = Some(G_JOURNAL);
	table[Opcode::RJOURNAL.as_usize()] = Some(G_JOURNAL);
	table[Opcode::VSSVAR.as_usize()] = Some(G_JOURNAL);
	table[Opcode::RSSVAR.as_usize()] = Some(G_JOURNAL);
	table[Opcode::VIVJOURNAL.as_usize()] = Some(G_JOURNAL);
	table[Opcode::VIRJOURNAL.as_usize()] = Some(G_JOURNAL);
	table[Opcode::RIVJOURNAL.as_usize()] = Some(G_JOURNAL);
	table[Opcode::RIRJOURNAL.as_usize()] = Some(G_JOURNAL);

	table
}

/// Stack effect per opcode: items popped and pushed. Checked before the
/// handler runs, so stack faults are deterministic regardless of how far
/// the handler body would have got.
pub static STACK_TABLE: [Option<(usize, usize)>; 256] = stack_table();

const fn stack_table() -> [Option<(usize, usize)>; 256] {
	let mut table: [Option<(usize, usize)>; 256] = [None; 256];

	table[Opcode::STOP.as_usize()] = Some((0, 0));
	table[Opcode::ADD.as_usize()] = Some((2, 1));
	table[Opcode::MUL.as_usize()] = Some((2, 1));
	table[Opcode::SUB.as_usize()] = Some((2, 1));
	table[Opcode::DIV.as_usize()] = Some((2, 1));
	table[Opcode::SDIV.as_usize()] = Some((2, 1));
	table[Opcode::MOD.as_usize()] = Some((2, 1));
	table[Opcode::SMOD.as_usize()] = Some((2, 1));
	table[Opcode::ADDMOD.as_usize()] = Some((3, 1));
	table[Opcode::MULMOD.as_usize()] = Some((3, 1));
	table[Opcode::EXP.as_usize()] = Some((2, 1));
	table[Opcode::SIGNEXTEND.as_usize()] = Some((2, 1));

	table[Opcode::LT.as_usize()] = Some((2, 1));
	table[Opcode::GT.as_usize()] = Some((2, 1));
	table[Opcode::SLT.as_usize()] = Some((2, 1));
	table[Opcode::SGT.as_usize()] = Some((2, 1));
	table[Opcode::EQ.as_usize()] = Some((2, 1));
	table[Opcode::ISZERO.as_usize()] = Some((1, 1));
	table[Opcode::AND.as_usize()] = Some((2, 1));
	table[Opcode::OR.as_usize()] = Some((2, 1));
	table[Opcode::XOR.as_usize()] = Some((2, 1));
	table[Opcode::NOT.as_usize()] = Some((1, 1));
	table[Opcode::BYTE.as_usize()] = Some((2, 1));
	table[Opcode::SHL.as_usize()] = Some((2, 1));
	table[Opcode::SHR.as_usize()] = Some((2, 1));
	table[Opcode::SAR.as_usize()] = Some((2, 1));

	table[Opcode::SHA3.as_usize()] = Some((2, 1));

	table[Opcode::ADDRESS.as_usize()] = Some((0, 1));
	table[Opcode::BALANCE.as_usize()] = Some((1, 1));
	table[Opcode::ORIGIN.as_usize()] = Some((0, 1));
	table[Opcode::CALLER.as_usize()] = Some((0, 1));
	table[Opcode::CALLVALUE.as_usize()] = Some((0, 1));
	table[Opcode::CALLDATALOAD.as_usize()] = Some((1, 1));
	table[Opcode::CALLDATASIZE.as_usize()] = Some((0, 1));
	table[Opcode::CALLDATACOPY.as_usize()] = Some((3, 0));
	table[Opcode::CODESIZE.as_usize()] = Some((0, 1));
	table[Opcode::CODECOPY.as_usize()] = Some((3, 0));
	table[Opcode::GASPRICE.as_usize()] = Some((0, 1));
	table[Opcode::EXTCODESIZE.as_usize()] = Some((1, 1));
	table[Opcode::EXTCODECOPY.as_usize()] = Some((4, 0));
	table[Opcode::RETURNDATASIZE.as_usize()] = Some((0, 1));
	table[Opcode::RETURNDATACOPY.as_usize()] = Some((3, 0));
	table[Opcode::EXTCODEHASH.as_usize()] = Some((1, 1));

	table[Opcode::BLOCKHASH.as_usize()] = Some((1, 1));
	table[Opcode::COINBASE.as_usize()] = Some((0, 1));
	table[Opcode::TIMESTAMP.as_usize()] = Some((0, 1));
	table[Opcode::NUMBER.as_usize()] = Some((0, 1));
	table[Opcode::DIFFICULTY.as_usize()] = Some((0, 1));
	table[Opcode::GASLIMIT.as_usize()] = Some((0, 1));
	table[Opcode::CHAINID.as_usize()] = Some((0, 1));
	table[Opcode::SELFBALANCE.as_usize()] = Some((0, 1));
	table[Opcode::BASEFEE.as_usize()] = Some((0, 1));

	table[Opcode::POP.as_usize()] = Some((1, 0));
	table[Opcode::MLOAD.as_usize()] = Some((1, 1));
	table[Opcode::MSTORE.as_usize()] = Some((2, 0));
	table[Opcode::MSTORE8.as_usize()] = Some((2, 0));
	table[Opcode::SLOAD.as_usize()] = Some((1, 1));
	table[Opcode::SSTORE.as_usize()] = Some((2, 0));
	table[Opcode::JUMP.as_usize()] = Some((1, 0));
	table[Opcode::JUMPI.as_usize()] = Some((2, 0));
	table[Opcode::PC.as_usize()] = Some((0, 1));
	table[Opcode::MSIZE.as_usize()] = Some((0, 1));
	table[Opcode::GAS.as_usize()] = Some((0, 1));
	table[Opcode::JUMPDEST.as_usize()] = Some((0, 0));

	let mut op = Opcode::PUSH0.as_usize();
	while op <= Opcode::PUSH32.as_usize() {
		table[op] = Some((0, 1));
		op += 1;
	}

	let mut n = 1;
	while n <= 16 {
		table[Opcode::DUP1.as_usize() + n - 1] = Some((n, n + 1));
		table[Opcode::SWAP1.as_usize() + n - 1] = Some((n + 1, n + 1));
		n += 1;
	}

	let mut n = 0;
	while n <= 4 {
		table[Opcode::LOG0.as_usize() + n] = Some((n + 2, 0));
		n += 1;
	}

	table[Opcode::CREATE.as_usize()] = Some((3, 1));
	table[Opcode::CALL.as_usize()] = Some((7, 1));
	table[Opcode::CALLCODE.as_usize()] = Some((7, 1));
	table[Opcode::RETURN.as_usize()] = Some((2, 0));
	table[Opcode::DELEGATECALL.as_usize()] = Some((6, 1));
	table[Opcode::CREATE2.as_usize()] = Some((4, 1));
	table[Opcode::STATICCALL.as_usize()] = Some((6, 1));
	table[Opcode::REVERT.as_usize()] = Some((2, 0));
	table[Opcode::INVALID.as_usize()] = Some((0, 0));
	table[Opcode::SUICIDE.as_usize()] = Some((1, 0));

	table[Opcode::VJOURNAL.as_usize()] = Some((4, 0));
	table[Opcode::RJOURNAL.as_usize()] = Some((2, 0));
	table[Opcode::VSSVAR.as_usize()] = Some((4, 0));
	table[Opcode::RSSVAR.as_usize()] = Some((3, 0));
	table[Opcode::VIVJOURNAL.as_usize()] = Some((6, 0));
	table[Opcode::VIRJOURNAL.as_usize()] = Some((5, 0));
	table[Opcode::RIVJOURNAL.as_usize()] = Some((6, 0));
	table[Opcode::RIRJOURNAL.as_usize()] = Some((5, 0));

	table
}

/// Whether the opcode writes state and is therefore rejected in a
/// read-only frame. A value-transferring `CALL` is checked separately in
/// the opcode handler.
#[must_use]
pub const fn writes_state(opcode: Opcode) -> bool {
	matches!(
		opcode,
		Opcode::SSTORE
			| Opcode::LOG0
			| Opcode::LOG1
			| Opcode::LOG2
			| Opcode::LOG3
			| Opcode::LOG4
			| Opcode::CREATE
			| Opcode::CREATE2
			| Opcode::SUICIDE
	)
}
