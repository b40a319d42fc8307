use alloc::vec::Vec;
use core::cmp::min;

use primitive_types::{H256, U256};

use crate::error::{ExitError, ExitFatal, ExitRevert, ExitSucceed};
use crate::etable::Control;
use crate::handler::Handler;
use crate::runtime::Runtime;

#[inline]
pub fn codesize(runtime: &mut Runtime) -> Control {
	let size = U256::from(runtime.machine.code.len());
	push_u256!(runtime, size);
	Control::Continue(1)
}

#[inline]
pub fn codecopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, memory_offset, code_offset, len);

	try_or_fail!(runtime.machine.memory.resize_offset(memory_offset, len));
	if len == U256::zero() {
		return Control::Continue(1);
	}

	let code = runtime.machine.code.clone();
	match runtime
		.machine
		.memory
		.copy_large(memory_offset, code_offset, len, &code)
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn calldataload(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, index);

	let mut load = [0u8; 32];
	#[allow(clippy::needless_range_loop)]
	for i in 0..32 {
		if let Some(p) = index.checked_add(U256::from(i)) {
			if p <= U256::from(usize::MAX) {
				let p = p.as_usize();
				if p < runtime.machine.data.len() {
					load[i] = runtime.machine.data[p];
				}
			}
		}
	}

	push_h256!(runtime, H256::from(load));
	Control::Continue(1)
}

#[inline]
pub fn calldatasize(runtime: &mut Runtime) -> Control {
	let len = U256::from(runtime.machine.data.len());
	push_u256!(runtime, len);
	Control::Continue(1)
}

#[inline]
pub fn calldatacopy(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, memory_offset, data_offset, len);

	try_or_fail!(runtime.machine.memory.resize_offset(memory_offset, len));
	if len == U256::zero() {
		return Control::Continue(1);
	}

	let data = runtime.machine.data.clone();
	match runtime
		.machine
		.memory
		.copy_large(memory_offset, data_offset, len, &data)
	{
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn pop(runtime: &mut Runtime) -> Control {
	pop_h256!(runtime, _val);
	Control::Continue(1)
}

#[inline]
pub fn mload(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, index);
	try_or_fail!(runtime
		.machine
		.memory
		.resize_offset(index, U256::from(32)));
	let index = as_usize_or_fail!(index);
	let value = H256::from_slice(&runtime.machine.memory.get(index, 32)[..]);
	push_h256!(runtime, value);
	Control::Continue(1)
}

#[inline]
pub fn mstore(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, index);
	pop_h256!(runtime, value);
	try_or_fail!(runtime
		.machine
		.memory
		.resize_offset(index, U256::from(32)));
	let index = as_usize_or_fail!(index);
	match runtime.machine.memory.set(index, &value[..], Some(32)) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn mstore8(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, index, value);
	try_or_fail!(runtime.machine.memory.resize_offset(index, U256::one()));
	let index = as_usize_or_fail!(index);
	let value = (value.low_u32() & 0xff) as u8;
	match runtime.machine.memory.set(index, &[value], Some(1)) {
		Ok(()) => Control::Continue(1),
		Err(e) => Control::Exit(e.into()),
	}
}

#[inline]
pub fn jump<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	if handler.aborted() {
		return Control::Exit(ExitSucceed::Stopped.into());
	}

	pop_u256!(runtime, dest);
	let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);

	Control::Jump(dest)
}

#[inline]
pub fn jumpi<H: Handler>(runtime: &mut Runtime, handler: &H) -> Control {
	if handler.aborted() {
		return Control::Exit(ExitSucceed::Stopped.into());
	}

	pop_u256!(runtime, dest);
	pop_h256!(runtime, value);

	if value == H256::zero() {
		Control::Continue(1)
	} else {
		let dest = as_usize_or_fail!(dest, ExitError::InvalidJump);
		Control::Jump(dest)
	}
}

#[inline]
pub fn pc(runtime: &mut Runtime, position: usize) -> Control {
	push_u256!(runtime, U256::from(position));
	Control::Continue(1)
}

#[inline]
pub fn msize(runtime: &mut Runtime) -> Control {
	let len = U256::from(runtime.machine.memory.len());
	push_u256!(runtime, len);
	Control::Continue(1)
}

#[inline]
pub fn push(runtime: &mut Runtime, n: usize, position: usize) -> Control {
	let end = min(position + 1 + n, runtime.machine.code.len());
	let slice = &runtime.machine.code[(position + 1)..end];
	let mut val = [0u8; 32];
	val[(32 - n)..(32 - n + slice.len())].copy_from_slice(slice);

	let result = H256(val);
	push_h256!(runtime, result);
	Control::Continue(1 + n)
}

#[inline]
pub fn dup(runtime: &mut Runtime, n: usize) -> Control {
	let value = match runtime.machine.stack.peek(n - 1) {
		Ok(value) => value,
		Err(e) => return Control::Exit(e.into()),
	};
	push_h256!(runtime, value);
	Control::Continue(1)
}

#[inline]
pub fn swap(runtime: &mut Runtime, n: usize) -> Control {
	let val1 = match runtime.machine.stack.peek(0) {
		Ok(value) => value,
		Err(e) => return Control::Exit(e.into()),
	};
	let val2 = match runtime.machine.stack.peek(n) {
		Ok(value) => value,
		Err(e) => return Control::Exit(e.into()),
	};
	match runtime.machine.stack.set(0, val2) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}
	match runtime.machine.stack.set(n, val1) {
		Ok(()) => (),
		Err(e) => return Control::Exit(e.into()),
	}
	Control::Continue(1)
}

#[inline]
pub fn ret(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, start, len);
	try_or_fail!(runtime.machine.memory.resize_offset(start, len));

	runtime.machine.retval = if len == U256::zero() {
		Vec::new()
	} else {
		let start = as_usize_or_fail!(start);
		let len = as_usize_or_fail!(len);
		runtime.machine.memory.get(start, len)
	};

	Control::Exit(ExitSucceed::Returned.into())
}

#[inline]
pub fn revert(runtime: &mut Runtime) -> Control {
	pop_u256!(runtime, start, len);
	try_or_fail!(runtime.machine.memory.resize_offset(start, len));

	runtime.machine.retval = if len == U256::zero() {
		Vec::new()
	} else {
		let start = as_usize_or_fail!(start);
		let len = as_usize_or_fail!(len);
		runtime.machine.memory.get(start, len)
	};

	Control::Exit(ExitRevert::Reverted.into())
}
