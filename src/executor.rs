use alloc::rc::Rc;
use alloc::sync::Arc;
use alloc::vec::Vec;
use core::cmp::min;
use core::sync::atomic::{AtomicBool, Ordering};

use evm_journal_interpreter::{
	CallScheme, Context, CreateScheme, Etable, ExitError, ExitReason, Handler, Opcode, Runtime,
	Stack, TracerError, Transfer,
};
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

use crate::backend::{Backend, Log};
use crate::config::Config;
use crate::gasometer::{self, Gasometer, MergeStrategy};
use crate::tracer::Tracer;

/// A handle an outside observer can use to request cooperative
/// cancellation. The interpreter polls the flag at the top of the dispatch
/// loop and in the control-flow opcodes; the current frame then terminates
/// at the next safe point with a `Stopped` exit.
#[derive(Clone)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
	/// Request cancellation.
	pub fn abort(&self) {
		self.0.store(true, Ordering::Relaxed);
	}
}

/// The EVM orchestrator: owns the state database, the tracer and the
/// per-frame gas substates, and drives transactions through the
/// interpreter. Implements [Handler], so nested `CALL`/`CREATE` recurse
/// synchronously back through it.
pub struct Executor<'config, B> {
	config: &'config Config,
	backend: B,
	tracer: Tracer,
	substates: Vec<Gasometer>,
	abort: Arc<AtomicBool>,
}

fn l64(gas: u64) -> u64 {
	gas - gas / 64
}

impl<'config, B: Backend> Executor<'config, B> {
	/// Create a new executor over the given backend with a transaction gas
	/// limit.
	pub fn new(backend: B, gas_limit: u64, config: &'config Config) -> Self {
		Self {
			config,
			backend,
			tracer: Tracer::new(),
			substates: alloc::vec![Gasometer::new(gas_limit, false)],
			abort: Arc::new(AtomicBool::new(false)),
		}
	}

	/// The configuration in use.
	#[must_use]
	pub fn config(&self) -> &'config Config {
		self.config
	}

	/// The backing state database.
	pub fn backend(&self) -> &B {
		&self.backend
	}

	/// Mutable access to the backing state database.
	pub fn backend_mut(&mut self) -> &mut B {
		&mut self.backend
	}

	/// Deconstruct into the backing state database.
	pub fn into_backend(self) -> B {
		self.backend
	}

	/// The tracer recording this transaction.
	#[must_use]
	pub fn tracer(&self) -> &Tracer {
		&self.tracer
	}

	/// A handle for cooperative cancellation.
	#[must_use]
	pub fn abort_handle(&self) -> AbortHandle {
		AbortHandle(self.abort.clone())
	}

	/// Gas used by the transaction, after the capped refund.
	#[must_use]
	pub fn used_gas(&self) -> u64 {
		let root = &self.substates[0];
		root.total_used_gas()
			- min(
				root.total_used_gas() / self.config.max_refund_quotient,
				if root.refunded_gas() >= 0 {
					root.refunded_gas() as u64
				} else {
					0
				},
			)
	}

	/// Fee of the transaction at the given gas price.
	#[must_use]
	pub fn fee(&self, price: U256) -> U256 {
		U256::from(self.used_gas()).saturating_mul(price)
	}

	fn gasometer(&self) -> &Gasometer {
		self.substates
			.last()
			.expect("executor always holds the transaction gasometer; qed")
	}

	fn gasometer_mut(&mut self) -> &mut Gasometer {
		self.substates
			.last_mut()
			.expect("executor always holds the transaction gasometer; qed")
	}

	fn depth(&self) -> usize {
		self.substates.len() - 1
	}

	/// Execute a message call transaction.
	pub fn transact_call(
		&mut self,
		caller: H160,
		address: H160,
		value: U256,
		data: Vec<u8>,
	) -> (ExitReason, Vec<u8>) {
		log::debug!(target: "evm", "transact_call caller {:?} address {:?} value {}", caller, address, value);

		if let Err(e) = self.backend.inc_nonce(caller) {
			return (e.into(), Vec::new());
		}

		let transaction_cost = gasometer::call_transaction_cost(&data, self.config);
		if let Err(e) = self.gasometer_mut().record_gas64(transaction_cost) {
			return (e.into(), Vec::new());
		}

		let context = Context {
			address,
			caller,
			apparent_value: value,
		};

		self.call_inner(
			caller,
			address,
			Some(Transfer {
				source: caller,
				target: address,
				value,
			}),
			data,
			None,
			false,
			false,
			false,
			context,
		)
	}

	/// Execute a create transaction.
	pub fn transact_create(
		&mut self,
		caller: H160,
		value: U256,
		init_code: Vec<u8>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		log::debug!(target: "evm", "transact_create caller {:?} value {}", caller, value);

		let transaction_cost = gasometer::create_transaction_cost(&init_code, self.config);
		if let Err(e) = self.gasometer_mut().record_gas64(transaction_cost) {
			return (e.into(), None, Vec::new());
		}

		self.create_inner(caller, CreateScheme::Legacy { caller }, value, init_code, None, false)
	}

	/// Execute a `CREATE2`-style create transaction.
	pub fn transact_create2(
		&mut self,
		caller: H160,
		value: U256,
		init_code: Vec<u8>,
		salt: H256,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		let code_hash = H256::from_slice(Keccak256::digest(&init_code).as_slice());
		let transaction_cost = gasometer::create_transaction_cost(&init_code, self.config);
		if let Err(e) = self.gasometer_mut().record_gas64(transaction_cost) {
			return (e.into(), None, Vec::new());
		}

		self.create_inner(
			caller,
			CreateScheme::Create2 {
				caller,
				code_hash,
				salt,
			},
			value,
			init_code,
			None,
			false,
		)
	}

	/// The address a create scheme resolves to.
	#[must_use]
	pub fn create_address(&self, scheme: &CreateScheme) -> H160 {
		match scheme {
			CreateScheme::Create2 {
				caller,
				code_hash,
				salt,
			} => {
				let mut hasher = Keccak256::new();
				hasher.update([0xff]);
				hasher.update(&caller[..]);
				hasher.update(&salt[..]);
				hasher.update(&code_hash[..]);
				H256::from_slice(hasher.finalize().as_slice()).into()
			}
			CreateScheme::Legacy { caller } => {
				let nonce = self.backend.nonce(*caller);
				let mut stream = rlp::RlpStream::new_list(2);
				stream.append(caller);
				stream.append(&nonce);
				H256::from_slice(Keccak256::digest(&stream.out()).as_slice()).into()
			}
		}
	}

	/// Journal both balances around a transfer, before and after, under
	/// the current call index.
	fn transfer_with_record(&mut self, transfer: &Transfer) -> Result<(), ExitError> {
		self.tracer
			.save_balance(transfer.source, self.backend.balance(transfer.source));
		self.tracer
			.save_balance(transfer.target, self.backend.balance(transfer.target));

		self.backend.sub_balance(transfer.source, transfer.value)?;
		self.backend.add_balance(transfer.target, transfer.value);

		self.tracer
			.save_balance(transfer.source, self.backend.balance(transfer.source));
		self.tracer
			.save_balance(transfer.target, self.backend.balance(transfer.target));

		Ok(())
	}

	/// Pop the current frame: roll back state for failed frames, fold the
	/// frame gasometer into the parent, and close the call-tree node.
	fn exit_frame(
		&mut self,
		snapshot: usize,
		checkpoint: usize,
		strategy: MergeStrategy,
		reason: ExitReason,
		output: Vec<u8>,
	) -> (ExitReason, Vec<u8>) {
		if !reason.is_succeed() {
			self.backend.revert_to(snapshot);
			self.tracer.revert_to(checkpoint);
		}

		let child = self
			.substates
			.pop()
			.expect("exit_frame pairs with an enter; qed");
		let gas_left = match strategy {
			MergeStrategy::Discard => 0,
			_ => child.gas64(),
		};
		if let Some(parent) = self.substates.last_mut() {
			parent.merge(child, strategy);
		}

		let error = if reason.is_succeed() {
			None
		} else {
			Some(reason.clone())
		};
		self.tracer.exit_call(gas_left, output.clone(), error);

		(reason, output)
	}

	#[allow(clippy::too_many_arguments)]
	fn call_inner(
		&mut self,
		caller: H160,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		is_static: bool,
		take_l64: bool,
		take_stipend: bool,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		let after_gas = if take_l64 && self.config.call_l64_after_gas {
			l64(self.gasometer().gas64())
		} else {
			self.gasometer().gas64()
		};
		let target_gas = target_gas.unwrap_or(after_gas);
		let mut gas_limit = min(target_gas, after_gas);

		if let Err(e) = self.gasometer_mut().record_gas64(gas_limit) {
			return (e.into(), Vec::new());
		}

		if let Some(transfer) = transfer.as_ref() {
			if take_stipend && transfer.value != U256::zero() {
				gas_limit = gas_limit.saturating_add(self.config.call_stipend);
			}
		}

		let is_static = is_static || self.gasometer().is_static;
		self.tracer.enter_call(
			caller,
			Some(code_address),
			input.clone(),
			transfer.as_ref().map(|t| t.value).unwrap_or_default(),
			gas_limit,
		);
		self.substates.push(Gasometer::new(gas_limit, is_static));
		let snapshot = self.backend.snapshot();
		let checkpoint = self.tracer.checkpoint();

		if self.depth() > self.config.call_stack_limit {
			return self.exit_frame(
				snapshot,
				checkpoint,
				MergeStrategy::Revert,
				ExitError::CallTooDeep.into(),
				Vec::new(),
			);
		}

		if let Some(transfer) = transfer {
			if self.backend.balance(transfer.source) < transfer.value {
				return self.exit_frame(
					snapshot,
					checkpoint,
					MergeStrategy::Revert,
					ExitError::OutOfFund.into(),
					Vec::new(),
				);
			}
			if let Err(e) = self.transfer_with_record(&transfer) {
				return self.exit_frame(
					snapshot,
					checkpoint,
					MergeStrategy::Revert,
					e.into(),
					Vec::new(),
				);
			}
		}

		let code = self.backend.code(code_address);
		let mut runtime = Runtime::new(
			Rc::new(code),
			Rc::new(input),
			context,
			self.config.stack_limit,
			self.config.memory_limit,
		);

		let etable = Etable::runtime();
		let reason = runtime.run(self, &etable);
		log::debug!(target: "evm", "call execution using address {:?}: {:?}", code_address, reason);

		let strategy = match &reason {
			ExitReason::Succeed(_) => MergeStrategy::Commit,
			ExitReason::Revert(_) => MergeStrategy::Revert,
			ExitReason::Error(_) | ExitReason::Fatal(_) => MergeStrategy::Discard,
		};
		let output = runtime.machine.retval;

		self.exit_frame(snapshot, checkpoint, strategy, reason, output)
	}

	fn create_inner(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
		take_l64: bool,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		if self.depth() > self.config.call_stack_limit {
			return (ExitError::CallTooDeep.into(), None, Vec::new());
		}

		if self.backend.balance(caller) < value {
			return (ExitError::OutOfFund.into(), None, Vec::new());
		}

		let address = self.create_address(&scheme);
		log::debug!(target: "evm", "create execution using address {:?}", address);

		if let Err(e) = self.backend.inc_nonce(caller) {
			return (e.into(), None, Vec::new());
		}

		let after_gas = if take_l64 && self.config.call_l64_after_gas {
			l64(self.gasometer().gas64())
		} else {
			self.gasometer().gas64()
		};
		let target_gas = target_gas.unwrap_or(after_gas);
		let gas_limit = min(target_gas, after_gas);

		if let Err(e) = self.gasometer_mut().record_gas64(gas_limit) {
			return (e.into(), None, Vec::new());
		}

		let is_static = self.gasometer().is_static;
		self.tracer
			.enter_call(caller, Some(address), init_code.clone(), value, gas_limit);
		self.substates.push(Gasometer::new(gas_limit, is_static));
		let snapshot = self.backend.snapshot();
		let checkpoint = self.tracer.checkpoint();

		if self.backend.code_size(address) != U256::zero()
			|| self.backend.nonce(address) > U256::zero()
		{
			let (reason, output) = self.exit_frame(
				snapshot,
				checkpoint,
				MergeStrategy::Discard,
				ExitError::CreateCollision.into(),
				Vec::new(),
			);
			return (reason, None, output);
		}

		self.backend.create_account(address);

		let transfer = Transfer {
			source: caller,
			target: address,
			value,
		};
		if let Err(e) = self.transfer_with_record(&transfer) {
			let (reason, output) = self.exit_frame(
				snapshot,
				checkpoint,
				MergeStrategy::Revert,
				e.into(),
				Vec::new(),
			);
			return (reason, None, output);
		}

		if self.config.create_increase_nonce {
			if let Err(e) = self.backend.inc_nonce(address) {
				let (reason, output) = self.exit_frame(
					snapshot,
					checkpoint,
					MergeStrategy::Discard,
					e.into(),
					Vec::new(),
				);
				return (reason, None, output);
			}
		}

		let context = Context {
			address,
			caller,
			apparent_value: value,
		};
		let mut runtime = Runtime::new(
			Rc::new(init_code),
			Rc::new(Vec::new()),
			context,
			self.config.stack_limit,
			self.config.memory_limit,
		);

		let etable = Etable::runtime();
		let reason = runtime.run(self, &etable);
		let retval = runtime.machine.retval;

		match reason {
			ExitReason::Succeed(_) => {
				if let Some(limit) = self.config.create_contract_limit {
					if retval.len() > limit {
						self.gasometer_mut().fail();
						let (reason, output) = self.exit_frame(
							snapshot,
							checkpoint,
							MergeStrategy::Discard,
							ExitError::CreateContractLimit.into(),
							Vec::new(),
						);
						return (reason, None, output);
					}
				}

				if let Err(e) = self.gasometer_mut().record_codedeposit(retval.len()) {
					let (reason, output) = self.exit_frame(
						snapshot,
						checkpoint,
						MergeStrategy::Discard,
						e.into(),
						Vec::new(),
					);
					return (reason, None, output);
				}

				self.backend.set_code(address, retval);
				let (reason, output) = self.exit_frame(
					snapshot,
					checkpoint,
					MergeStrategy::Commit,
					reason,
					Vec::new(),
				);
				(reason, Some(address), output)
			}
			ExitReason::Revert(_) => {
				let (reason, output) = self.exit_frame(
					snapshot,
					checkpoint,
					MergeStrategy::Revert,
					reason,
					retval,
				);
				(reason, None, output)
			}
			ExitReason::Error(_) | ExitReason::Fatal(_) => {
				let (reason, output) = self.exit_frame(
					snapshot,
					checkpoint,
					MergeStrategy::Discard,
					reason,
					Vec::new(),
				);
				(reason, None, output)
			}
		}
	}
}

impl<'config, B: Backend> Handler for Executor<'config, B> {
	fn balance(&self, address: H160) -> U256 {
		self.backend.balance(address)
	}

	fn code_size(&self, address: H160) -> U256 {
		self.backend.code_size(address)
	}

	fn code_hash(&self, address: H160) -> H256 {
		self.backend.code_hash(address)
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.backend.code(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.backend.storage(address, index)
	}

	fn exists(&self, address: H160) -> bool {
		if self.config.empty_considered_exists {
			self.backend.exists(address)
		} else {
			!self.backend.is_empty(address)
		}
	}

	fn gas_left(&self) -> U256 {
		self.gasometer().gas()
	}

	fn gas_price(&self) -> U256 {
		self.backend.gas_price()
	}

	fn origin(&self) -> H160 {
		self.backend.origin()
	}

	fn block_hash(&self, number: U256) -> H256 {
		let current = self.backend.block_number();
		if number >= current || current - number > U256::from(256) {
			H256::default()
		} else {
			self.backend.block_hash(number)
		}
	}

	fn block_number(&self) -> U256 {
		self.backend.block_number()
	}

	fn block_coinbase(&self) -> H160 {
		self.backend.block_coinbase()
	}

	fn block_timestamp(&self) -> U256 {
		self.backend.block_timestamp()
	}

	fn block_difficulty(&self) -> U256 {
		self.backend.block_difficulty()
	}

	fn block_randomness(&self) -> Option<H256> {
		self.backend.block_randomness()
	}

	fn block_gas_limit(&self) -> U256 {
		self.backend.block_gas_limit()
	}

	fn block_base_fee_per_gas(&self) -> U256 {
		self.backend.block_base_fee_per_gas()
	}

	fn chain_id(&self) -> U256 {
		self.backend.chain_id()
	}

	fn is_static(&self) -> bool {
		self.gasometer().is_static
	}

	fn aborted(&self) -> bool {
		self.abort.load(Ordering::Relaxed)
	}

	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		stack: &Stack,
	) -> Result<(), ExitError> {
		let gasometer = self
			.substates
			.last_mut()
			.expect("executor always holds the transaction gasometer; qed");
		gasometer::record_opcode(
			gasometer,
			context.address,
			opcode,
			stack,
			self.config,
			&self.backend,
		)
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.backend.set_storage(address, index, value);
		self.tracer.save_raw(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		let block_number = self.backend.block_number();
		self.backend.add_log(Log {
			address,
			topics,
			data,
			block_number,
		});
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		let balance = self.backend.balance(address);
		self.transfer_with_record(&Transfer {
			source: address,
			target,
			value: balance,
		})?;
		self.backend.suicide(address);
		self.tracer.save_balance(address, self.backend.balance(address));
		Ok(())
	}

	fn record_preimage(&mut self, hash: H256, preimage: Vec<u8>) {
		if self.config.enable_preimage_recording {
			self.backend.add_preimage(hash, preimage);
		}
	}

	fn call(
		&mut self,
		caller: H160,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		scheme: CallScheme,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		self.call_inner(
			caller,
			code_address,
			transfer,
			input,
			target_gas,
			scheme == CallScheme::StaticCall,
			true,
			matches!(scheme, CallScheme::Call | CallScheme::CallCode),
			context,
		)
	}

	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		self.create_inner(caller, scheme, value, init_code, target_gas, true)
	}

	fn journal_state_key(
		&mut self,
		address: H160,
		parent: Option<(H256, H256)>,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		label: Vec<u8>,
	) -> Result<(), TracerError> {
		self.tracer
			.save_key(address, parent, slot, offset, type_id, label)
	}

	fn journal_state_change(
		&mut self,
		address: H160,
		slot: H256,
		offset: Option<U256>,
		type_id: H256,
		value: Vec<u8>,
	) -> Result<(), TracerError> {
		self.tracer
			.save_change(address, slot, offset, type_id, value)
	}

	fn journal_error(&mut self, error: TracerError) -> Result<(), ExitError> {
		if self.config.strict_journal {
			Err(error.into())
		} else {
			self.tracer.note_journal_error();
			Ok(())
		}
	}
}
