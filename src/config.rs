/// Runtime configuration: the fork-gated switches and gas constants the
/// interpreter, gasometer and orchestrator consult. Construct one with the
/// hard-fork constructors and tweak fields where a chain deviates.
#[derive(Clone, Debug)]
pub struct Config {
	/// Gas paid for a `SLOAD`.
	pub gas_sload: u64,
	/// Gas paid for a `BALANCE`.
	pub gas_balance: u64,
	/// Gas paid for `EXTCODESIZE` and the base of `EXTCODECOPY`.
	pub gas_ext_code: u64,
	/// Gas paid for `EXTCODEHASH`.
	pub gas_ext_code_hash: u64,
	/// Gas paid for the base of a `CALL`-family opcode.
	pub gas_call: u64,
	/// Gas paid per byte of `EXP` exponent.
	pub gas_expbyte: u64,
	/// Gas paid for a `SELFDESTRUCT`.
	pub gas_suicide: u64,
	/// Intrinsic gas of a call transaction.
	pub gas_transaction_call: u64,
	/// Intrinsic gas of a create transaction.
	pub gas_transaction_create: u64,
	/// Intrinsic gas per zero byte of transaction data.
	pub gas_transaction_zero_data: u64,
	/// Intrinsic gas per non-zero byte of transaction data.
	pub gas_transaction_non_zero_data: u64,
	/// Whether `SSTORE` uses net gas metering (EIP-2200).
	pub sstore_gas_metering: bool,
	/// Whether net-metered `SSTORE` fails when gas left is at or below the
	/// call stipend (EIP-2200 sentry).
	pub sstore_revert_under_stipend: bool,
	/// Whether clearing a slot refunds gas.
	pub refund_sstore_clears: bool,
	/// Whether the first `SELFDESTRUCT` of an account refunds gas.
	pub refund_suicide: bool,
	/// Denominator of the refund cap (EIP-3529 raises it to 5).
	pub max_refund_quotient: u64,
	/// Whether sub-calls forward at most 63/64 of the remaining gas
	/// (EIP-150).
	pub call_l64_after_gas: bool,
	/// Take the extra call stipend on value transfers.
	pub call_stipend: u64,
	/// Whether empty accounts count as existing (pre-EIP-161 rule).
	pub empty_considered_exists: bool,
	/// Whether the created account's nonce starts at one (EIP-161).
	pub create_increase_nonce: bool,
	/// `RETURNDATASIZE`/`RETURNDATACOPY` availability (Byzantium).
	pub has_return_data: bool,
	/// `REVERT` availability (Byzantium).
	pub has_revert: bool,
	/// `SHL`/`SHR`/`SAR` availability (Constantinople).
	pub has_bitwise_shifting: bool,
	/// `CREATE2` availability (Constantinople).
	pub has_create2: bool,
	/// `EXTCODEHASH` availability (Constantinople).
	pub has_ext_code_hash: bool,
	/// `CHAINID` availability (Istanbul).
	pub has_chain_id: bool,
	/// `SELFBALANCE` availability (Istanbul).
	pub has_self_balance: bool,
	/// `BASEFEE` availability (London).
	pub has_base_fee: bool,
	/// Stack depth limit.
	pub stack_limit: usize,
	/// Memory backstop limit, in bytes. Gas bounds memory first.
	pub memory_limit: usize,
	/// Call depth limit.
	pub call_stack_limit: usize,
	/// Deployed code size limit (EIP-170).
	pub create_contract_limit: Option<usize>,
	/// Register `SHA3` preimages on the state database.
	pub enable_preimage_recording: bool,
	/// Fail the frame on journal opcode errors. Keep this on while
	/// instrumentation is under test; a release configuration can turn it
	/// off to downgrade tracer failures to a counter.
	pub strict_journal: bool,
}

impl Config {
	/// Frontier hard fork configuration.
	#[must_use]
	pub const fn frontier() -> Self {
		Self {
			gas_sload: 50,
			gas_balance: 20,
			gas_ext_code: 20,
			gas_ext_code_hash: 20,
			gas_call: 40,
			gas_expbyte: 10,
			gas_suicide: 0,
			gas_transaction_call: 21000,
			gas_transaction_create: 21000,
			gas_transaction_zero_data: 4,
			gas_transaction_non_zero_data: 68,
			sstore_gas_metering: false,
			sstore_revert_under_stipend: false,
			refund_sstore_clears: true,
			refund_suicide: true,
			max_refund_quotient: 2,
			call_l64_after_gas: false,
			call_stipend: 2300,
			empty_considered_exists: true,
			create_increase_nonce: false,
			has_return_data: false,
			has_revert: false,
			has_bitwise_shifting: false,
			has_create2: false,
			has_ext_code_hash: false,
			has_chain_id: false,
			has_self_balance: false,
			has_base_fee: false,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			create_contract_limit: None,
			enable_preimage_recording: false,
			strict_journal: true,
		}
	}

	/// Istanbul hard fork configuration.
	#[must_use]
	pub const fn istanbul() -> Self {
		Self {
			gas_sload: 800,
			gas_balance: 700,
			gas_ext_code: 700,
			gas_ext_code_hash: 700,
			gas_call: 700,
			gas_expbyte: 50,
			gas_suicide: 5000,
			gas_transaction_call: 21000,
			gas_transaction_create: 53000,
			gas_transaction_zero_data: 4,
			gas_transaction_non_zero_data: 16,
			sstore_gas_metering: true,
			sstore_revert_under_stipend: true,
			refund_sstore_clears: true,
			refund_suicide: true,
			max_refund_quotient: 2,
			call_l64_after_gas: true,
			call_stipend: 2300,
			empty_considered_exists: false,
			create_increase_nonce: true,
			has_return_data: true,
			has_revert: true,
			has_bitwise_shifting: true,
			has_create2: true,
			has_ext_code_hash: true,
			has_chain_id: true,
			has_self_balance: true,
			has_base_fee: false,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			create_contract_limit: Some(0x6000),
			enable_preimage_recording: false,
			strict_journal: true,
		}
	}

	/// London hard fork configuration. Access-list pricing (EIP-2929) is
	/// not modelled; the Istanbul cost constants stay in force.
	#[must_use]
	pub const fn london() -> Self {
		let mut config = Self::istanbul();
		config.has_base_fee = true;
		config.refund_suicide = false;
		config.max_refund_quotient = 5;
		config
	}
}
