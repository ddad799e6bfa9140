use crate::prelude::*;
use crate::utils::USIZE_MAX;
use crate::{ExitError, ExitFatal};
use core::cmp::min;
use primitive_types::U256;

/// A sequential, byte-addressable memory. It is paid for in 32-byte words:
/// the effective length only ever grows, in word multiples, and the backing
/// buffer is grown lazily on access.
#[derive(Clone, Debug)]
pub struct Memory {
	data: Vec<u8>,
	effective_len: U256,
	limit: usize,
}

impl Memory {
	/// Create a new memory with the given hard limit.
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			effective_len: U256::zero(),
			limit,
		}
	}

	/// Memory limit.
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	/// The length of the backing buffer.
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// The effective (paid-for) length, always a multiple of 32.
	#[must_use]
	pub const fn effective_len(&self) -> U256 {
		self.effective_len
	}

	/// Whether the memory is empty.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Return the full memory as a value.
	#[must_use]
	#[allow(clippy::missing_const_for_fn)]
	pub fn into_data(self) -> Vec<u8> {
		self.data
	}

	/// Resize the effective length to cover `offset..offset + len`, rounded up
	/// to the next word boundary. Zero-length accesses never grow memory.
	///
	/// # Errors
	/// Return `ExitError::InvalidRange` if the range overflows.
	pub fn resize_offset(&mut self, offset: U256, len: U256) -> Result<(), ExitError> {
		if len == U256::zero() {
			return Ok(());
		}

		offset
			.checked_add(len)
			.map_or(Err(ExitError::InvalidRange), |end| self.resize_end(end))
	}

	/// Resize the effective length to cover `..end`, rounded up to the next
	/// word boundary.
	///
	/// # Errors
	/// Return `ExitError::InvalidRange` if the rounding overflows.
	pub fn resize_end(&mut self, end: U256) -> Result<(), ExitError> {
		if end > self.effective_len {
			let new_end = next_multiple_of_32(end).ok_or(ExitError::InvalidRange)?;
			self.effective_len = new_end;
		}

		Ok(())
	}

	/// Get memory region at given offset. Zero-filled beyond the backing
	/// buffer.
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

	/// Set memory region at given offset. The value is truncated or
	/// zero-padded to `target_size` when given.
	///
	/// # Errors
	/// Return `ExitFatal::NotSupported` if the region passes the hard limit.
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

		if offset
			.checked_add(target_size)
			.map_or(true, |pos| pos > self.limit)
		{
			return Err(ExitFatal::NotSupported);
		}

		if self.data.len() < offset + target_size {
			self.data.resize(offset + target_size, 0);
		}

		if target_size > value.len() {
			self.data[offset..((value.len()) + offset)].clone_from_slice(value);
			for index in (value.len())..target_size {
				self.data[offset + index] = 0;
			}
		} else {
			self.data[offset..(target_size + offset)].clone_from_slice(&value[..target_size]);
		}

		Ok(())
	}

	/// Copy `data` into the memory, with `U256` offsets and zero-padding past
	/// the end of the source.
	///
	/// # Errors
	/// Return `ExitFatal::NotSupported` if the destination is out of range.
	pub fn copy_large(
		&mut self,
		memory_offset: U256,
		data_offset: U256,
		len: U256,
		data: &[u8],
	) -> Result<(), ExitFatal> {
		// A zero-length copy is a no-op regardless of the other operands.
		if len.is_zero() {
			return Ok(());
		}

		let memory_offset = if memory_offset > USIZE_MAX {
			return Err(ExitFatal::NotSupported);
		} else {
			memory_offset.as_usize()
		};

		let ulen = if len > USIZE_MAX {
			return Err(ExitFatal::NotSupported);
		} else {
			len.as_usize()
		};

		let data = data_offset.checked_add(len).map_or(&[] as &[u8], |end| {
			if end > USIZE_MAX {
				&[]
			} else {
				let data_offset = data_offset.as_usize();
				let end = end.as_usize();

				if data_offset > data.len() {
					&[]
				} else {
					&data[data_offset..min(end, data.len())]
				}
			}
		});

		self.set(memory_offset, data, Some(ulen))
	}
}

/// Rounds up `x` to the closest multiple of 32. Returns `None` on overflow.
fn next_multiple_of_32(x: U256) -> Option<U256> {
	let r = x.low_u32() & 31;
	if r == 0 {
		Some(x)
	} else {
		x.checked_add((32 - r).into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn next_multiple_of_32_rounds_up() {
		assert_eq!(next_multiple_of_32(U256::zero()), Some(U256::zero()));
		assert_eq!(next_multiple_of_32(U256::one()), Some(U256::from(32)));
		assert_eq!(next_multiple_of_32(U256::from(32)), Some(U256::from(32)));
		assert_eq!(next_multiple_of_32(U256::from(33)), Some(U256::from(64)));
		assert_eq!(next_multiple_of_32(U256::MAX), None);
	}

	#[test]
	fn resize_is_monotonic_and_word_aligned() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_offset(U256::from(10), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), U256::from(32));
		// A smaller touch never shrinks the paid-for region.
		memory.resize_offset(U256::zero(), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), U256::from(32));
		memory.resize_offset(U256::from(32), U256::from(1)).unwrap();
		assert_eq!(memory.effective_len(), U256::from(64));
	}

	#[test]
	fn zero_length_touch_does_not_grow() {
		let mut memory = Memory::new(usize::MAX);
		memory.resize_offset(U256::MAX, U256::zero()).unwrap();
		assert_eq!(memory.effective_len(), U256::zero());
	}

	#[test]
	fn get_is_zero_filled_past_data() {
		let mut memory = Memory::new(usize::MAX);
		memory.set(0, &[1, 2, 3], None).unwrap();
		assert_eq!(memory.get(1, 4), vec![2, 3, 0, 0]);
	}

	#[test]
	fn set_with_target_size_pads() {
		let mut memory = Memory::new(usize::MAX);
		memory.set(0, &[1, 2], Some(4)).unwrap();
		assert_eq!(memory.get(0, 4), vec![1, 2, 0, 0]);
		memory.set(0, &[5, 6, 7, 8], Some(2)).unwrap();
		assert_eq!(memory.get(0, 4), vec![5, 6, 0, 0]);
	}

	#[test]
	fn copy_large_pads_past_source_end() {
		let mut memory = Memory::new(usize::MAX);
		memory
			.copy_large(U256::zero(), U256::from(2), U256::from(4), &[9, 9, 7])
			.unwrap();
		assert_eq!(memory.get(0, 4), vec![7, 0, 0, 0]);
	}
}
