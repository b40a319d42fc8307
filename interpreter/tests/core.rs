use std::rc::Rc;

use evm_journal_interpreter::{
	CallScheme, Context, CreateScheme, Etable, ExitError, ExitReason, ExitSucceed, Handler,
	Opcode, Runtime, Stack, TracerError, Transfer,
};
use primitive_types::{H160, H256, U256};

const CODE1: &str = "60e060020a6000350480632839e92814601e57806361047ff414603457005b602a6004356024356047565b8060005260206000f35b603d6004356099565b8060005260206000f35b600082600014605457605e565b8160010190506093565b81600014606957607b565b60756001840360016047565b90506093565b609060018403608c85600186036047565b6047565b90505b92915050565b6000816000148060a95750816001145b60b05760b7565b81905060cf565b60c1600283036099565b60cb600184036099565b0190505b91905056";
const DATA1: &str = "2839e92800000000000000000000000000000000000000000000000000000000000000030000000000000000000000000000000000000000000000000000000000000001";
const RET1: &str = "000000000000000000000000000000000000000000000000000000000000000d";

/// A handler for pure-computation contracts: validation is free and any
/// environmental access is a test bug.
pub struct UnimplementedHandler;

impl Handler for UnimplementedHandler {
	fn balance(&self, _address: H160) -> U256 {
		unimplemented!()
	}
	fn code_size(&self, _address: H160) -> U256 {
		unimplemented!()
	}
	fn code_hash(&self, _address: H160) -> H256 {
		unimplemented!()
	}
	fn code(&self, _address: H160) -> Vec<u8> {
		unimplemented!()
	}
	fn storage(&self, _address: H160, _index: H256) -> H256 {
		unimplemented!()
	}
	fn exists(&self, _address: H160) -> bool {
		unimplemented!()
	}

	fn gas_left(&self) -> U256 {
		unimplemented!()
	}
	fn gas_price(&self) -> U256 {
		unimplemented!()
	}
	fn origin(&self) -> H160 {
		unimplemented!()
	}
	fn block_hash(&self, _number: U256) -> H256 {
		unimplemented!()
	}
	fn block_number(&self) -> U256 {
		unimplemented!()
	}
	fn block_coinbase(&self) -> H160 {
		unimplemented!()
	}
	fn block_timestamp(&self) -> U256 {
		unimplemented!()
	}
	fn block_difficulty(&self) -> U256 {
		unimplemented!()
	}
	fn block_randomness(&self) -> Option<H256> {
		unimplemented!()
	}
	fn block_gas_limit(&self) -> U256 {
		unimplemented!()
	}
	fn block_base_fee_per_gas(&self) -> U256 {
		unimplemented!()
	}
	fn chain_id(&self) -> U256 {
		unimplemented!()
	}

	fn is_static(&self) -> bool {
		false
	}
	fn aborted(&self) -> bool {
		false
	}

	fn pre_validate(
		&mut self,
		_context: &Context,
		_opcode: Opcode,
		_stack: &Stack,
	) -> Result<(), ExitError> {
		Ok(())
	}

	fn set_storage(&mut self, _address: H160, _index: H256, _value: H256) -> Result<(), ExitError> {
		unimplemented!()
	}
	fn log(&mut self, _address: H160, _topics: Vec<H256>, _data: Vec<u8>) -> Result<(), ExitError> {
		unimplemented!()
	}
	fn mark_delete(&mut self, _address: H160, _target: H160) -> Result<(), ExitError> {
		unimplemented!()
	}
	fn record_preimage(&mut self, _hash: H256, _preimage: Vec<u8>) {}

	fn call(
		&mut self,
		_caller: H160,
		_code_address: H160,
		_transfer: Option<Transfer>,
		_input: Vec<u8>,
		_target_gas: Option<u64>,
		_scheme: CallScheme,
		_context: Context,
	) -> (ExitReason, Vec<u8>) {
		unimplemented!()
	}

	fn create(
		&mut self,
		_caller: H160,
		_scheme: CreateScheme,
		_value: U256,
		_init_code: Vec<u8>,
		_target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		unimplemented!()
	}

	fn journal_state_key(
		&mut self,
		_address: H160,
		_parent: Option<(H256, H256)>,
		_slot: H256,
		_offset: Option<U256>,
		_type_id: H256,
		_label: Vec<u8>,
	) -> Result<(), TracerError> {
		unimplemented!()
	}

	fn journal_state_change(
		&mut self,
		_address: H160,
		_slot: H256,
		_offset: Option<U256>,
		_type_id: H256,
		_value: Vec<u8>,
	) -> Result<(), TracerError> {
		unimplemented!()
	}

	fn journal_error(&mut self, error: TracerError) -> Result<(), ExitError> {
		Err(error.into())
	}
}

fn run(code: &str, data: &str) -> (ExitReason, Vec<u8>) {
	let code = hex::decode(code).unwrap();
	let data = hex::decode(data).unwrap();

	let etable = Etable::<UnimplementedHandler>::runtime();
	let mut handler = UnimplementedHandler;
	let mut runtime = Runtime::new(
		Rc::new(code),
		Rc::new(data),
		Context {
			address: H160::default(),
			caller: H160::default(),
			apparent_value: U256::default(),
		},
		1024,
		10_000,
	);

	let reason = runtime.run(&mut handler, &etable);
	(reason, runtime.machine.retval)
}

#[test]
fn fibonacci_contract_returns() {
	let (reason, retval) = run(CODE1, DATA1);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));
	assert_eq!(retval, hex::decode(RET1).unwrap());
}

#[test]
fn fibonacci_other_inputs() {
	// fib(10) = 55 through the second selector.
	let data = "61047ff4000000000000000000000000000000000000000000000000000000000000000a";
	let (reason, retval) = run(CODE1, data);
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Returned));
	assert_eq!(
		retval,
		hex::decode("0000000000000000000000000000000000000000000000000000000000000037").unwrap()
	);
}

#[test]
fn running_off_the_code_end_stops() {
	// PUSH1 1 PUSH1 2 ADD, then fall off the end.
	let (reason, retval) = run("6001600201", "");
	assert_eq!(reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert!(retval.is_empty());
}

#[test]
fn invalid_jump_is_rejected() {
	// PUSH1 3 JUMP: position 3 is not a JUMPDEST.
	let (reason, _) = run("600356", "");
	assert_eq!(reason, ExitReason::Error(ExitError::InvalidJump));
}
