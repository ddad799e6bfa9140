use crate::consts;
use ethvm_core::ExitError;
use primitive_types::U256;

/// Cost of covering memory up to `end` bytes: `3·words + words²/512` over the
/// word count. The gasometer charges the monotone difference against the
/// highest end ever paid for.
pub fn memory_gas(end: U256) -> Result<u64, ExitError> {
	if end > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	let words = end.as_u64().div_ceil(32);

	let linear = consts::G_MEMORY
		.checked_mul(words)
		.ok_or(ExitError::OutOfGas)?;
	let quadratic = words
		.checked_mul(words)
		.map(|w| w / consts::MEMORY_QUAD_DIVISOR)
		.ok_or(ExitError::OutOfGas)?;

	linear.checked_add(quadratic).ok_or(ExitError::OutOfGas)
}

/// A memory range touched by an opcode, used to compute the expansion charge.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCost {
	/// Affected memory offset.
	pub offset: U256,
	/// Affected length.
	pub len: U256,
}

impl MemoryCost {
	/// Join two memory costs: the one covering the higher end wins. A
	/// zero-length range never expands memory.
	#[must_use]
	pub fn join(self, other: Self) -> Self {
		if self.len == U256::zero() {
			return other;
		}

		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn linear_and_quadratic_parts() {
		assert_eq!(memory_gas(U256::zero()), Ok(0));
		assert_eq!(memory_gas(U256::from(32)), Ok(3));
		// 32 words: 96 linear + 1024/512 quadratic.
		assert_eq!(memory_gas(U256::from(1024)), Ok(98));
		// 1024 words.
		assert_eq!(memory_gas(U256::from(32768)), Ok(3072 + 2048));
	}

	#[test]
	fn partial_word_rounds_up() {
		assert_eq!(memory_gas(U256::from(1)), Ok(3));
		assert_eq!(memory_gas(U256::from(33)), Ok(6));
	}

	#[test]
	fn join_picks_higher_end() {
		let a = MemoryCost {
			offset: U256::zero(),
			len: U256::from(64),
		};
		let b = MemoryCost {
			offset: U256::from(128),
			len: U256::from(32),
		};
		let joined = a.join(b);
		assert_eq!(joined.offset, U256::from(128));

		let zero = MemoryCost {
			offset: U256::MAX,
			len: U256::zero(),
		};
		let joined = a.join(zero);
		assert_eq!(joined.offset, U256::zero());
	}
}
