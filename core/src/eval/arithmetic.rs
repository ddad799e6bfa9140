use crate::utils::I256;
use primitive_types::{U256, U512};

#[inline]
pub fn div(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1 / op2
	}
}

#[inline]
pub fn sdiv(op1: U256, op2: U256) -> U256 {
	let op1: I256 = op1.into();
	let op2: I256 = op2.into();
	let ret = op1 / op2;
	ret.into()
}

#[inline]
pub fn rem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		op1.checked_rem(op2).unwrap_or_default()
	}
}

#[inline]
pub fn srem(op1: U256, op2: U256) -> U256 {
	if op2 == U256::zero() {
		U256::zero()
	} else {
		let op1: I256 = op1.into();
		let op2: I256 = op2.into();
		let ret = op1 % op2;
		ret.into()
	}
}

#[inline]
pub fn addmod(op1: U256, op2: U256, op3: U256) -> U256 {
	let op1: U512 = op1.into();
	let op2: U512 = op2.into();
	let op3: U512 = op3.into();

	if op3 == U512::zero() {
		U256::zero()
	} else {
		let v = (op1 + op2) % op3;
		v.try_into()
			.expect("op3 is less than 2^256, so the result fits; qed")
	}
}

#[inline]
pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	let op1: U512 = op1.into();
	let op2: U512 = op2.into();
	let op3: U512 = op3.into();

	if op3 == U512::zero() {
		U256::zero()
	} else {
		let v = (op1 * op2) % op3;
		v.try_into()
			.expect("op3 is less than 2^256, so the result fits; qed")
	}
}

#[inline]
pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r: U256 = 1.into();

	while op2 != 0.into() {
		if op2 & 1.into() != 0.into() {
			r = r.overflowing_mul(op1).0;
		}
		op2 >>= 1;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

/// `SIGNEXTEND`: if `op1` names a byte position below 32, sign-extend `op2`
/// from that byte; otherwise `op2` is returned unchanged.
#[inline]
pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 > U256::from(31) {
		op2
	} else {
		let bit_index = (8 * op1.low_u32() + 7) as usize;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn exp_by_squaring() {
		assert_eq!(exp(U256::from(2), U256::from(10)), U256::from(1024));
		assert_eq!(exp(U256::from(3), U256::zero()), U256::one());
		assert_eq!(exp(U256::zero(), U256::zero()), U256::one());
		// Wraps modulo 2^256.
		assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
	}

	#[test]
	fn addmod_uses_full_width_intermediate() {
		assert_eq!(
			addmod(U256::MAX, U256::MAX, U256::from(7)),
			(U256::MAX % U256::from(7)) * U256::from(2) % U256::from(7)
		);
		assert_eq!(addmod(U256::one(), U256::one(), U256::zero()), U256::zero());
	}

	#[test]
	fn mulmod_uses_full_width_intermediate() {
		// (2^255) * 2 mod 11: the product overflows 256 bits.
		let a = U256::one() << 255;
		let expected = {
			let wide = U512::from(a) * U512::from(2u64) % U512::from(11u64);
			U256::try_from(wide).unwrap()
		};
		assert_eq!(mulmod(a, U256::from(2), U256::from(11)), expected);
	}

	#[test]
	fn signextend_from_byte_zero() {
		assert_eq!(
			signextend(U256::zero(), U256::from(0x80)),
			U256::MAX - U256::from(0x7f)
		);
		assert_eq!(signextend(U256::zero(), U256::from(0x7f)), U256::from(0x7f));
		assert_eq!(
			signextend(U256::from(32), U256::from(0x80)),
			U256::from(0x80)
		);
	}
}
