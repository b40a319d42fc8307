use alloc::vec::Vec;

use primitive_types::U256;

use crate::error::ExitFatal;

/// A sequential memory. Zero-initialised, grows only in 32-byte words, so
/// the observable length is always 32-aligned and monotonically
/// non-decreasing within a frame.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given hard limit. Gas bounds memory
	/// growth long before the limit; the limit is a backstop against
	/// unmetered execution.
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Memory limit.
	#[inline]
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	/// The length of the current effective memory range, in bytes. Always a
	/// multiple of 32; this is what `MSIZE` observes.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// The length of the current effective memory range, in 32-byte words.
	#[inline]
	#[must_use]
	pub fn word_len(&self) -> usize {
		self.data.len() / 32
	}

	/// Return true if current effective memory range is zero.
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Resize the memory to cover `end`, aligned to the next 32-byte word.
	pub fn resize_end(&mut self, end: U256) -> Result<(), ExitFatal> {
		if end > U256::from(self.limit) {
			return Err(ExitFatal::NotSupported);
		}

		let end = end.as_usize();
		if end <= self.data.len() {
			return Ok(());
		}

		let new_len = end.div_ceil(32) * 32;
		self.data.resize(new_len, 0);
		Ok(())
	}

	/// Resize the memory to cover the region `[offset, offset + len)`. A
	/// zero `len` never expands.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitFatal> {
		if len == U256::zero() {
			return Ok(());
		}

		let end = offset.checked_add(len).ok_or(ExitFatal::NotSupported)?;
		self.resize_end(end)
	}

	/// Get a copy of the memory region, zero-padded past the current
	/// length.
	#[must_use]
	pub fn get(&self, offset: usize, size: usize) -> Vec<u8> {
		let mut ret = Vec::new();
		ret.resize(size, 0);

		#[allow(clippy::needless_range_loop)]
		for index in 0..size {
			let position = offset + index;
			if position >= self.data.len() {
				break;
			}

			ret[index] = self.data[position];
		}

		ret
	}

	/// Set a memory region at the given offset. `value` is truncated or
	/// zero-extended to `target_size` when one is given.
	pub fn set(
		&mut self,
		offset: usize,
		value: &[u8],
		target_size: Option<usize>,
	) -> Result<(), ExitFatal> {
		let target_size = target_size.unwrap_or(value.len());
		if target_size == 0 {
			return Ok(());
		}

		let end = offset
			.checked_add(target_size)
			.ok_or(ExitFatal::NotSupported)?;
		self.resize_end(U256::from(end))?;

		for index in 0..target_size {
			self.data[offset + index] = value.get(index).copied().unwrap_or(0);
		}

		Ok(())
	}

	/// Copy `len` bytes of `data` starting at `data_offset` into memory at
	/// `memory_offset`, zero-filling past the end of `data`.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitFatal> {
		if len == U256::zero() {
			return Ok(());
		}

		if memory_offset > U256::from(usize::MAX) || len > U256::from(usize::MAX) {
			return Err(ExitFatal::NotSupported);
		}
		let memory_offset = memory_offset.as_usize();
		let ulen = len.as_usize();

		let data_offset = if data_offset > U256::from(usize::MAX) {
			usize::MAX
		} else {
			data_offset.as_usize()
		};

		let mut chunk = Vec::new();
		chunk.resize(ulen, 0);
		#[allow(clippy::needless_range_loop)]
		for index in 0..ulen {
			chunk[index] = data_offset
				.checked_add(index)
				.and_then(|position| data.get(position).copied())
				.unwrap_or(0);
		}

		self.set(memory_offset, &chunk, Some(ulen))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn expands_in_words() {
		let mut memory = Memory::new(10_000);
		assert_eq!(memory.len(), 0);
		memory.resize_offset(U256::from(10), U256::from(1)).unwrap();
		assert_eq!(memory.len(), 32);
		memory.resize_offset(U256::from(32), U256::from(1)).unwrap();
		assert_eq!(memory.len(), 64);
		// Shrinking never happens.
		memory.resize_offset(U256::from(0), U256::from(1)).unwrap();
		assert_eq!(memory.len(), 64);
		assert_eq!(memory.word_len(), 2);
	}

	#[test]
	fn get_is_zero_padded() {
		let mut memory = Memory::new(10_000);
		memory.set(0, &[1, 2, 3], None).unwrap();
		assert_eq!(memory.get(1, 4), vec![2, 3, 0, 0]);
		assert_eq!(memory.get(100, 2), vec![0, 0]);
	}

	#[test]
	fn copy_large_zero_fills() {
		let mut memory = Memory::new(10_000);
		memory
			.copy_large(U256::zero(), U256::from(2), U256::from(4), &[9, 9, 7, 8])
			.unwrap();
		assert_eq!(memory.get(0, 4), vec![7, 8, 0, 0]);
	}

	#[test]
	fn limit_is_enforced() {
		let mut memory = Memory::new(64);
		assert_eq!(
			memory.resize_offset(U256::from(64), U256::from(1)),
			Err(ExitFatal::NotSupported)
		);
	}
}
