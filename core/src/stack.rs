use crate::prelude::*;
use crate::utils::USIZE_MAX;
use crate::ExitError;
use primitive_types::{H256, U256};

/// Fixed stack limit.
pub const STACK_LIMIT: usize = 1024;

/// EVM stack.
#[derive(Clone, Debug)]
pub struct Stack {
	data: Vec<U256>,
	limit: usize,
}

impl Stack {
	/// Create a new stack with given limit.
	#[must_use]
	pub const fn new(limit: usize) -> Self {
		Self {
			data: Vec::new(),
			limit,
		}
	}

	/// Stack limit.
	#[inline]
	#[must_use]
	pub const fn limit(&self) -> usize {
		self.limit
	}

	/// Stack length.
	#[inline]
	#[must_use]
	pub fn len(&self) -> usize {
		self.data.len()
	}

	/// Whether the stack is empty.
	#[inline]
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.data.is_empty()
	}

	/// Stack data.
	#[inline]
	#[must_use]
	pub const fn data(&self) -> &Vec<U256> {
		&self.data
	}

	/// Pop a value from the stack. If the stack is already empty, returns the
	/// `StackUnderflow` error.
	///
	/// # Errors
	/// Return `ExitError::StackUnderflow`
	#[inline]
	pub fn pop(&mut self) -> Result<U256, ExitError> {
		self.data.pop().ok_or(ExitError::StackUnderflow)
	}

	/// Pop an `H256` value from the stack.
	///
	/// # Errors
	/// Return `ExitError::StackUnderflow`
	#[inline]
	pub fn pop_h256(&mut self) -> Result<H256, ExitError> {
		self.pop().map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	/// Push a new value into the stack. If it exceeds the stack limit,
	/// returns `StackOverflow` error and leaves the stack unchanged.
	///
	/// # Errors
	/// Return `ExitError::StackOverflow`
	#[inline]
	pub fn push(&mut self, value: U256) -> Result<(), ExitError> {
		if self.data.len() + 1 > self.limit {
			return Err(ExitError::StackOverflow);
		}
		self.data.push(value);
		Ok(())
	}

	/// Peek a value at given index for the stack, where the top of
	/// the stack is at index `0`. If the index is too large,
	/// `StackUnderflow` is returned.
	///
	/// # Errors
	/// Return `ExitError::StackUnderflow`
	#[inline]
	pub fn peek(&self, no_from_top: usize) -> Result<U256, ExitError> {
		if self.data.len() > no_from_top {
			Ok(self.data[self.data.len() - no_from_top - 1])
		} else {
			Err(ExitError::StackUnderflow)
		}
	}

	/// Peek a value at given index for the stack as `H256`.
	///
	/// # Errors
	/// Return `ExitError::StackUnderflow`
	#[inline]
	pub fn peek_h256(&self, no_from_top: usize) -> Result<H256, ExitError> {
		self.peek(no_from_top).map(|it| {
			let mut res = H256([0; 32]);
			it.to_big_endian(&mut res.0);
			res
		})
	}

	/// Peek a value at given index for the stack as `usize`.
	///
	/// If the value is larger than `usize::MAX`, `OutOfGas` is returned.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` or `ExitError::StackUnderflow`
	#[inline]
	pub fn peek_usize(&self, no_from_top: usize) -> Result<usize, ExitError> {
		let u = self.peek(no_from_top)?;
		if u > USIZE_MAX {
			return Err(ExitError::OutOfGas);
		}
		Ok(u.as_usize())
	}

	/// Set a value at given index for the stack, where the top of the
	/// stack is at index `0`. If the index is too large,
	/// `StackUnderflow` is returned.
	///
	/// # Errors
	/// Return `ExitError::StackUnderflow`
	#[inline]
	pub fn set(&mut self, no_from_top: usize, val: U256) -> Result<(), ExitError> {
		if self.data.len() > no_from_top {
			let len = self.data.len();
			self.data[len - no_from_top - 1] = val;
			Ok(())
		} else {
			Err(ExitError::StackUnderflow)
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn push_pop_round_trip() {
		let mut stack = Stack::new(STACK_LIMIT);
		assert!(stack.is_empty());
		stack.push(U256::from(1)).unwrap();
		stack.push(U256::from(2)).unwrap();
		assert_eq!(stack.len(), 2);
		assert_eq!(stack.pop(), Ok(U256::from(2)));
		assert_eq!(stack.pop(), Ok(U256::from(1)));
		assert_eq!(stack.pop(), Err(ExitError::StackUnderflow));
	}

	#[test]
	fn push_past_limit_is_overflow() {
		let mut stack = Stack::new(2);
		stack.push(U256::zero()).unwrap();
		stack.push(U256::zero()).unwrap();
		assert_eq!(stack.push(U256::zero()), Err(ExitError::StackOverflow));
		// The failed push leaves the stack unchanged.
		assert_eq!(stack.len(), 2);
	}

	#[test]
	fn peek_and_set_index_from_top() {
		let mut stack = Stack::new(STACK_LIMIT);
		stack.push(U256::from(10)).unwrap();
		stack.push(U256::from(20)).unwrap();
		assert_eq!(stack.peek(0), Ok(U256::from(20)));
		assert_eq!(stack.peek(1), Ok(U256::from(10)));
		assert_eq!(stack.peek(2), Err(ExitError::StackUnderflow));
		stack.set(1, U256::from(30)).unwrap();
		assert_eq!(stack.peek(1), Ok(U256::from(30)));
	}
}
