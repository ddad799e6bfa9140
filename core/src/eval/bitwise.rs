use crate::utils::{I256, Sign};
use primitive_types::U256;

#[inline]
pub fn slt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.lt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn sgt(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();

	if op1.gt(&op2) {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn iszero(op1: U256) -> U256 {
	if op1 == U256::zero() {
		U256::one()
	} else {
		U256::zero()
	}
}

#[inline]
pub fn not(op1: U256) -> U256 {
	!op1
}

/// `BYTE`: the `op1`-th byte of `op2`, counted from the most significant.
#[inline]
pub fn byte(op1: U256, op2: U256) -> U256 {
	let mut ret = U256::zero();

	for i in 0..256 {
		if i < 8 && op1 < 32.into() {
			let o: usize = op1.as_usize();
			let t = 255 - (7 - i + 8 * o);
			let bit_mask = U256::one() << t;
			let value = (op2 & bit_mask) >> t;
			ret = ret.overflowing_add(value << i).0;
		}
	}

	ret
}

#[inline]
pub fn shl(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value << shift.as_usize()
	}
}

#[inline]
pub fn shr(shift: U256, value: U256) -> U256 {
	if value == U256::zero() || shift >= U256::from(256) {
		U256::zero()
	} else {
		value >> shift.as_usize()
	}
}

/// Arithmetic (sign-preserving) right shift.
#[inline]
pub fn sar(shift: U256, value: U256) -> U256 {
	let value = I256::from(value);

	if value == I256::zero() || shift >= U256::from(256) {
		match value.0 {
			// value is 0 or >=1, pushing 0
			Sign::Plus | Sign::Zero => U256::zero(),
			// value is <0, pushing -1
			Sign::Minus => I256(Sign::Minus, U256::one()).into(),
		}
	} else {
		let shift = shift.as_usize();

		match value.0 {
			Sign::Plus | Sign::Zero => value.1 >> shift,
			Sign::Minus => {
				let shifted = ((value.1.overflowing_sub(U256::one()).0) >> shift)
					.overflowing_add(U256::one())
					.0;
				I256(Sign::Minus, shifted).into()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn byte_selects_from_most_significant() {
		let value = U256::from_big_endian(&{
			let mut bytes = [0u8; 32];
			bytes[0] = 0xab;
			bytes[31] = 0xcd;
			bytes
		});
		assert_eq!(byte(U256::zero(), value), U256::from(0xab));
		assert_eq!(byte(U256::from(31), value), U256::from(0xcd));
		assert_eq!(byte(U256::from(32), value), U256::zero());
	}

	#[test]
	fn shifts_saturate_past_word_width() {
		assert_eq!(shl(U256::from(256), U256::one()), U256::zero());
		assert_eq!(shr(U256::from(256), U256::MAX), U256::zero());
		assert_eq!(sar(U256::from(256), U256::MAX), U256::MAX);
		assert_eq!(sar(U256::from(256), U256::one()), U256::zero());
	}

	#[test]
	fn sar_preserves_sign() {
		// -8 >> 1 == -4
		let minus_eight = !U256::from(8) + U256::one();
		let minus_four = !U256::from(4) + U256::one();
		assert_eq!(sar(U256::one(), minus_eight), minus_four);
		assert_eq!(sar(U256::one(), U256::from(8)), U256::from(4));
	}
}
