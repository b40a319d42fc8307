use alloc::vec::Vec;
use core::cmp::min;

use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

use crate::context::{CallScheme, Context, CreateScheme, Transfer};
use crate::error::{ExitError, ExitFatal, ExitReason};
use crate::etable::Control;
use crate::handler::Handler;
use crate::runtime::Runtime;
use crate::utils::u256_to_h256;

pub fn sha3<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, from, len);

	try_or_fail!(runtime.machine.memory.resize_offset(from, len));
	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let from = as_usize_or_fail!(from);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory.get(from, len)
	};

	let ret = H256::from_slice(Keccak256::digest(data.as_slice()).as_slice());
	handler.record_preimage(ret, data);
	push_h256!(runtime, ret);

	Control::Continue(1)
}

pub fn chainid<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.chain_id());

	Control::Continue(1)
}

pub fn address(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.address);
	push_h256!(runtime, ret);

	Control::Continue(1)
}

pub fn balance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.balance(address.into()));

	Control::Continue(1)
}

pub fn selfbalance<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.balance(runtime.context.address));

	Control::Continue(1)
}

pub fn origin<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	let ret = H256::from(handler.origin());
	push_h256!(runtime, ret);

	Control::Continue(1)
}

pub fn caller(runtime: &mut Runtime) -> Control {
	let ret = H256::from(runtime.context.caller);
	push_h256!(runtime, ret);

	Control::Continue(1)
}

pub fn callvalue(runtime: &mut Runtime) -> Control {
	push_u256!(runtime, runtime.context.apparent_value);

	Control::Continue(1)
}

pub fn gasprice<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_price());

	Control::Continue(1)
}

pub fn basefee<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_base_fee_per_gas());

	Control::Continue(1)
}

pub fn extcodesize<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_u256!(runtime, handler.code_size(address.into()));

	Control::Continue(1)
}

pub fn extcodehash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	push_h256!(runtime, handler.code_hash(address.into()));

	Control::Continue(1)
}

pub fn extcodecopy<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, address);
	pop_u256!(runtime, memory_offset, code_offset, len);

	try_or_fail!(runtime.machine.memory.resize_offset(memory_offset, len));
	if len == U256::zero() {
		return Control::Continue(1);
	}

	let code = handler.code(address.into());
	match runtime
		.machine
		.memory
		.copy_large(memory_offset, code_offset, len, &code)
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn returndatasize(runtime: &mut Runtime) -> Control {
	let size = U256::from(runtime.return_data_buffer.len());
	push_u256!(runtime, size);

	Control::Continue(1)
}

pub fn returndatacopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, memory_offset, data_offset, len);

	try_or_fail!(runtime.machine.memory.resize_offset(memory_offset, len));
	if data_offset
		.checked_add(len)
		.map(|l| l > U256::from(runtime.return_data_buffer.len()))
		.unwrap_or(true)
	{
		return Control::Exit(ExitError::OutOfOffset.into());
	}

	if len == U256::zero() {
		return Control::Continue(1);
	}

	let buffer = core::mem::take(&mut runtime.return_data_buffer);
	let ret = runtime
		.machine
		.memory
		.copy_large(memory_offset, data_offset, len, &buffer);
	runtime.return_data_buffer = buffer;

	match ret {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn blockhash<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_u256!(runtime, number);
	push_h256!(runtime, handler.block_hash(number));

	Control::Continue(1)
}

pub fn coinbase<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_h256!(runtime, handler.block_coinbase().into());
	Control::Continue(1)
}

pub fn timestamp<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_timestamp());
	Control::Continue(1)
}

pub fn number<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_number());
	Control::Continue(1)
}

pub fn difficulty<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_difficulty());
	Control::Continue(1)
}

pub fn prevrandao<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	if let Some(rand) = handler.block_randomness() {
		push_h256!(runtime, rand);
		Control::Continue(1)
	} else {
		difficulty(runtime, handler)
	}
}

pub fn gaslimit<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.block_gas_limit());
	Control::Continue(1)
}

pub fn sload<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	pop_h256!(runtime, index);
	let value = handler.storage(runtime.context.address, index);
	push_h256!(runtime, value);

	Control::Continue(1)
}

pub fn sstore<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, index, value);

	match handler.set_storage(runtime.context.address, index, value) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn gas<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	push_u256!(runtime, handler.gas_left());

	Control::Continue(1)
}

pub fn log<H: Handler>(runtime: &mut Runtime, n: u8, handler: &mut H) -> Control {
	pop_u256!(runtime, offset, len);

	try_or_fail!(runtime.machine.memory.resize_offset(offset, len));
	let data = if len == U256::zero() {
		Vec::new()
	} else {
		let offset = as_usize_or_fail!(offset);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory.get(offset, len)
	};

	let mut topics = Vec::new();
	for _ in 0..(n as usize) {
		match runtime.machine.stack.pop() {
			Ok(value) => {
				topics.push(value);
			}
			Err(e) => return Control::Exit(e.into()),
		}
	}

	match handler.log(runtime.context.address, topics, data) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

pub fn suicide<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_h256!(runtime, target);

	match handler.mark_delete(runtime.context.address, target.into()) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}

	Control::Exit(ExitReason::Succeed(crate::error::ExitSucceed::Suicided))
}

pub fn create<H: Handler>(runtime: &mut Runtime, is_create2: bool, handler: &mut H) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, value, code_offset, len);

	try_or_fail!(runtime.machine.memory.resize_offset(code_offset, len));
	let code = if len == U256::zero() {
		Vec::new()
	} else {
		let code_offset = as_usize_or_fail!(code_offset);
		let len = as_usize_or_fail!(len);

		runtime.machine.memory.get(code_offset, len)
	};

	let scheme = if is_create2 {
		pop_h256!(runtime, salt);
		let code_hash = H256::from_slice(Keccak256::digest(&code).as_slice());
		CreateScheme::Create2 {
			caller: runtime.context.address,
			salt,
			code_hash,
		}
	} else {
		CreateScheme::Legacy {
			caller: runtime.context.address,
		}
	};

	let (reason, address, return_data) =
		handler.create(runtime.context.address, scheme, value, code, None);

	match finish_create(runtime, reason, address, return_data) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e),
	}
}

pub fn call<H: Handler>(runtime: &mut Runtime, scheme: CallScheme, handler: &mut H) -> Control {
	runtime.return_data_buffer = Vec::new();

	pop_u256!(runtime, gas);
	pop_h256!(runtime, to);
	let gas = if gas > U256::from(u64::MAX) {
		None
	} else {
		Some(gas.as_u64())
	};

	let value = match scheme {
		CallScheme::Call | CallScheme::CallCode => {
			pop_u256!(runtime, value);
			value
		}
		CallScheme::DelegateCall | CallScheme::StaticCall => U256::zero(),
	};

	pop_u256!(runtime, in_offset, in_len, out_offset, out_len);

	try_or_fail!(runtime.machine.memory.resize_offset(in_offset, in_len));
	try_or_fail!(runtime.machine.memory.resize_offset(out_offset, out_len));

	// A value transfer in a read-only frame is a write.
	if handler.is_static() && scheme == CallScheme::Call && value != U256::zero() {
		return Control::Exit(ExitError::WriteProtection.into());
	}

	let input = if in_len == U256::zero() {
		Vec::new()
	} else {
		let in_offset = as_usize_or_fail!(in_offset);
		let in_len = as_usize_or_fail!(in_len);

		runtime.machine.memory.get(in_offset, in_len)
	};

	let context = match scheme {
		CallScheme::Call | CallScheme::StaticCall => Context {
			address: to.into(),
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::CallCode => Context {
			address: runtime.context.address,
			caller: runtime.context.address,
			apparent_value: value,
		},
		CallScheme::DelegateCall => Context {
			address: runtime.context.address,
			caller: runtime.context.caller,
			apparent_value: runtime.context.apparent_value,
		},
	};

	let transfer = if scheme == CallScheme::Call {
		Some(Transfer {
			source: runtime.context.address,
			target: to.into(),
			value,
		})
	} else if scheme == CallScheme::CallCode {
		Some(Transfer {
			source: runtime.context.address,
			target: runtime.context.address,
			value,
		})
	} else {
		None
	};

	let (reason, return_data) = handler.call(
		runtime.context.address,
		to.into(),
		transfer,
		input,
		gas,
		scheme,
		context,
	);

	match finish_call(runtime, out_len, out_offset, reason, return_data) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e),
	}
}

fn finish_call(
	runtime: &mut Runtime,
	out_len: U256,
	out_offset: U256,
	reason: ExitReason,
	return_data: Vec<u8>,
) -> Result<(), ExitReason> {
	runtime.return_data_buffer = return_data;
	let target_len = min(out_len, U256::from(runtime.return_data_buffer.len()));

	match reason {
		ExitReason::Succeed(_) => {
			let buffer = core::mem::take(&mut runtime.return_data_buffer);
			let copied = runtime.machine.memory.copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&buffer,
			);
			runtime.return_data_buffer = buffer;

			match copied {
				Ok(()) => {
					runtime
						.machine
						.stack
						.push(u256_to_h256(U256::one()))
						.map_err(ExitReason::Error)?;
					Ok(())
				}
				Err(_) => {
					runtime
						.machine
						.stack
						.push(H256::default())
						.map_err(ExitReason::Error)?;
					Ok(())
				}
			}
		}
		ExitReason::Revert(_) => {
			runtime
				.machine
				.stack
				.push(H256::default())
				.map_err(ExitReason::Error)?;

			let buffer = core::mem::take(&mut runtime.return_data_buffer);
			let _ = runtime.machine.memory.copy_large(
				out_offset,
				U256::zero(),
				target_len,
				&buffer,
			);
			runtime.return_data_buffer = buffer;

			Ok(())
		}
		ExitReason::Error(_) => {
			runtime
				.machine
				.stack
				.push(H256::default())
				.map_err(ExitReason::Error)?;

			Ok(())
		}
		ExitReason::Fatal(e) => {
			let _ = runtime.machine.stack.push(H256::default());

			Err(e.into())
		}
	}
}

fn finish_create(
	runtime: &mut Runtime,
	reason: ExitReason,
	address: Option<primitive_types::H160>,
	return_data: Vec<u8>,
) -> Result<(), ExitReason> {
	match reason {
		ExitReason::Succeed(_) => {
			runtime.return_data_buffer = Vec::new();
			let address = address.map(H256::from).unwrap_or_default();
			runtime
				.machine
				.stack
				.push(address)
				.map_err(ExitReason::Error)?;
			Ok(())
		}
		ExitReason::Revert(_) => {
			runtime.return_data_buffer = return_data;
			runtime
				.machine
				.stack
				.push(H256::default())
				.map_err(ExitReason::Error)?;
			Ok(())
		}
		ExitReason::Error(_) => {
			runtime.return_data_buffer = Vec::new();
			runtime
				.machine
				.stack
				.push(H256::default())
				.map_err(ExitReason::Error)?;
			Ok(())
		}
		ExitReason::Fatal(e) => {
			let _ = runtime.machine.stack.push(H256::default());
			Err(e.into())
		}
	}
}
