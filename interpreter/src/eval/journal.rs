//! Journal opcode bodies.
//!
//! These instructions consume their stack operands and emit tracer events;
//! they never touch the stack otherwise, never write VM state and carry a
//! fixed gas cost. Failures are routed through the handler's journal-error
//! policy.

use alloc::vec::Vec;

use primitive_types::{H256, U256};
use sha3::{Digest, Keccak256};

use crate::error::TracerError;
use crate::etable::Control;
use crate::handler::Handler;
use crate::memory::Memory;
use crate::runtime::Runtime;
use crate::utils::u256_to_h256;

fn journal_result<H: Handler>(handler: &mut H, result: Result<(), TracerError>) -> Control {
	match result {
		Ok(()) => Control::Continue(1),
		Err(error) => match handler.journal_error(error) {
			Ok(()) => Control::Continue(1),
			Err(error) => Control::Exit(error.into()),
		},
	}
}

/// Read a length-prefixed byte string from memory: the word at `ptr` is the
/// byte length, the bytes follow at `ptr + 32`.
fn load_data_from_mem(ptr: U256, memory: &Memory) -> Result<Vec<u8>, TracerError> {
	if ptr > U256::from(usize::MAX) {
		return Err(TracerError::MemOutOfRange);
	}
	let offset = ptr.as_usize();

	if offset
		.checked_add(32)
		.map(|end| end > memory.len())
		.unwrap_or(true)
	{
		return Err(TracerError::MemOutOfRange);
	}

	let len = U256::from_big_endian(&memory.get(offset, 32));
	if len > U256::from(usize::MAX) {
		return Err(TracerError::MemOutOfRange);
	}
	let len = len.as_usize();

	if offset
		.checked_add(32)
		.and_then(|start| start.checked_add(len))
		.map(|end| end > memory.len())
		.unwrap_or(true)
	{
		return Err(TracerError::MemOutOfRange);
	}

	Ok(memory.get(offset + 32, len))
}

/// Decode the length of a solidity-packed string/bytes storage header.
///
/// The low bit selects in-place (0) or out-of-place (1) encoding; the
/// remaining bits carry the length, masked to 7 bits for the in-place
/// form. An encoding whose placement bit disagrees with the decoded
/// length is rejected.
fn extract_storage_len(raw: &H256) -> Result<u64, TracerError> {
	let data_len = U256::from_big_endian(&raw[..]);
	let mut length = data_len / U256::from(2);
	let out_of_place = data_len & U256::one();
	if out_of_place.is_zero() {
		length = length & U256::from(0x7f);
	}

	let is_less = if length < U256::from(32) {
		U256::one()
	} else {
		U256::zero()
	};

	if out_of_place == is_less {
		return Err(TracerError::StorageEncoding);
	}

	if length > U256::from(u64::MAX) {
		return Err(TracerError::StorageEncoding);
	}

	Ok(length.as_u64())
}

fn value_window(offset: U256, type_size: U256) -> Result<(usize, usize), TracerError> {
	if offset > U256::from(31) {
		return Err(TracerError::InvalidOffset);
	}
	if type_size > U256::from(32) {
		return Err(TracerError::StorageEncoding);
	}

	let offset = offset.as_u64();
	let type_size = type_size.as_u64();
	if offset + type_size > 32 {
		return Err(TracerError::InvalidOffset);
	}

	Ok(((32 - offset - type_size) as usize, (32 - offset) as usize))
}

/// `VJOURNAL`: record the `type_size` bytes ending `offset` bytes above the
/// low end of the slot word as a typed value write.
pub fn value_change<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, slot, offset, type_size);
	pop_h256!(runtime, type_id);

	let address = runtime.context.address;
	let result = (|| {
		let (start, end) = value_window(offset, type_size)?;
		let new_val = handler.storage(address, u256_to_h256(slot));
		handler.journal_state_change(
			address,
			u256_to_h256(slot),
			Some(offset),
			type_id,
			new_val[start..end].to_vec(),
		)
	})();

	journal_result(handler, result)
}

/// `RJOURNAL`: decode the string/bytes value currently held at the slot
/// (in-place, or in the keccak(slot)-rooted extension) and record it.
pub fn reference_change<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, slot);
	pop_h256!(runtime, type_id);

	let address = runtime.context.address;
	let slot = u256_to_h256(slot);
	let result = (|| {
		let raw = handler.storage(address, slot);
		let length = extract_storage_len(&raw)?;

		let bytes = if length < 32 {
			let mut bytes = raw.as_bytes().to_vec();
			bytes[31] = 0;
			bytes.truncate(length as usize);
			bytes
		} else {
			let base = U256::from_big_endian(
				Keccak256::digest(slot.as_bytes()).as_slice(),
			);
			let mut bytes = Vec::new();
			let words = length.div_ceil(32);
			for i in 0..words {
				let key = u256_to_h256(base.overflowing_add(U256::from(i)).0);
				bytes.extend_from_slice(handler.storage(address, key).as_bytes());
			}
			bytes.truncate(length as usize);
			bytes
		};

		handler.journal_state_change(address, slot, None, type_id, bytes)
	})();

	journal_result(handler, result)
}

/// `VSSVAR`: bind a value-typed state variable name to `(slot, offset)`.
pub fn value_state_var<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, name_ptr, slot, offset);
	pop_h256!(runtime, type_id);

	let address = runtime.context.address;
	let result = load_data_from_mem(name_ptr, &runtime.machine.memory).and_then(|name| {
		handler.journal_state_key(
			address,
			None,
			u256_to_h256(slot),
			Some(offset),
			type_id,
			name,
		)
	});

	journal_result(handler, result)
}

/// `RSSVAR`: bind a reference-typed state variable name to its slot.
pub fn reference_state_var<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, name_ptr, slot);
	pop_h256!(runtime, type_id);

	let address = runtime.context.address;
	let result = load_data_from_mem(name_ptr, &runtime.machine.memory).and_then(|name| {
		handler.journal_state_key(address, None, u256_to_h256(slot), None, type_id, name)
	});

	journal_result(handler, result)
}

/// `VIVJOURNAL`: register a value-typed nested slot under its parent, keyed
/// by a 32-byte index word.
pub fn value_index_value<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, base, slot);
	pop_h256!(runtime, key);
	pop_u256!(runtime, offset);
	pop_h256!(runtime, type_id, parent_type_id);

	let address = runtime.context.address;
	let result = handler.journal_state_key(
		address,
		Some((u256_to_h256(base), parent_type_id)),
		u256_to_h256(slot),
		Some(offset),
		type_id,
		key.as_bytes().to_vec(),
	);

	journal_result(handler, result)
}

/// `VIRJOURNAL`: register a reference-typed nested slot under its parent,
/// keyed by a 32-byte index word.
pub fn value_index_reference<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, base, slot);
	pop_h256!(runtime, key, type_id, parent_type_id);

	let address = runtime.context.address;
	let result = handler.journal_state_key(
		address,
		Some((u256_to_h256(base), parent_type_id)),
		u256_to_h256(slot),
		None,
		type_id,
		key.as_bytes().to_vec(),
	);

	journal_result(handler, result)
}

/// `RIVJOURNAL`: register a value-typed nested slot under its parent, keyed
/// by a length-prefixed byte string loaded from memory.
pub fn reference_index_value<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, base, slot, key_ptr, offset);
	pop_h256!(runtime, type_id, parent_type_id);

	let address = runtime.context.address;
	let result = load_data_from_mem(key_ptr, &runtime.machine.memory).and_then(|key| {
		handler.journal_state_key(
			address,
			Some((u256_to_h256(base), parent_type_id)),
			u256_to_h256(slot),
			Some(offset),
			type_id,
			key,
		)
	});

	journal_result(handler, result)
}

/// `RIRJOURNAL`: register a reference-typed nested slot under its parent,
/// keyed by a length-prefixed byte string loaded from memory.
pub fn reference_index_reference<H: Handler>(runtime: &mut Runtime, handler: &mut H) -> Control {
	pop_u256!(runtime, base, slot, key_ptr);
	pop_h256!(runtime, type_id, parent_type_id);

	let address = runtime.context.address;
	let result = load_data_from_mem(key_ptr, &runtime.machine.memory).and_then(|key| {
		handler.journal_state_key(
			address,
			Some((u256_to_h256(base), parent_type_id)),
			u256_to_h256(slot),
			None,
			type_id,
			key,
		)
	});

	journal_result(handler, result)
}
