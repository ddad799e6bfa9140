//! Small numeric helpers shared across the interpreter: `usize`/`u64` bounds
//! as words, and two's-complement signed arithmetic over `U256`.

use core::cmp::Ordering;
use core::ops::{Div, Rem};
use primitive_types::U256;

/// `usize::MAX` as a word.
pub const USIZE_MAX: U256 = U256([usize::MAX as u64, 0, 0, 0]);

/// `u64::MAX` as a word.
pub const U64_MAX: U256 = U256([u64::MAX, 0, 0, 0]);

const SIGN_BIT_MASK: U256 = U256([
	0xffff_ffff_ffff_ffff,
	0xffff_ffff_ffff_ffff,
	0xffff_ffff_ffff_ffff,
	0x7fff_ffff_ffff_ffff,
]);

/// Sign of an `I256`.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Sign {
	Plus,
	Minus,
	Zero,
}

/// Signed 256-bit integer: a sign and a magnitude, converted to and from the
/// two's-complement bit pattern the EVM stores on the stack.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct I256(pub Sign, pub U256);

impl I256 {
	/// Zero value of `I256`.
	#[must_use]
	pub const fn zero() -> Self {
		Self(Sign::Zero, U256::zero())
	}

	/// Minimum representable value, `-2^255`.
	#[must_use]
	pub fn min_value() -> Self {
		Self(Sign::Minus, (U256::MAX & SIGN_BIT_MASK) + U256::one())
	}
}

impl Ord for I256 {
	fn cmp(&self, other: &Self) -> Ordering {
		match (self.0, other.0) {
			(Sign::Zero, Sign::Zero) => Ordering::Equal,
			(Sign::Zero, Sign::Plus) => Ordering::Less,
			(Sign::Zero, Sign::Minus) => Ordering::Greater,
			(Sign::Minus, Sign::Zero | Sign::Plus) => Ordering::Less,
			(Sign::Minus, Sign::Minus) => self.1.cmp(&other.1).reverse(),
			(Sign::Plus, Sign::Minus | Sign::Zero) => Ordering::Greater,
			(Sign::Plus, Sign::Plus) => self.1.cmp(&other.1),
		}
	}
}

impl PartialOrd for I256 {
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Default for I256 {
	fn default() -> Self {
		Self::zero()
	}
}

impl From<U256> for I256 {
	fn from(val: U256) -> Self {
		if val == U256::zero() {
			Self::zero()
		} else if val & SIGN_BIT_MASK == val {
			Self(Sign::Plus, val)
		} else {
			Self(Sign::Minus, !val + U256::from(1u64))
		}
	}
}

impl From<I256> for U256 {
	fn from(value: I256) -> Self {
		let sign = value.0;
		if sign == Sign::Zero {
			Self::zero()
		} else if sign == Sign::Plus {
			value.1
		} else {
			!value.1 + Self::from(1u64)
		}
	}
}

impl Div for I256 {
	type Output = Self;

	fn div(self, other: Self) -> Self {
		if other == Self::zero() {
			return Self::zero();
		}

		if self == Self::min_value() && other.1 == U256::one() {
			return Self::min_value();
		}

		let d = (self.1 / other.1) & SIGN_BIT_MASK;

		if d == U256::zero() {
			return Self::zero();
		}

		match (self.0, other.0) {
			(Sign::Zero, Sign::Plus | Sign::Minus)
			| (Sign::Plus, Sign::Zero)
			| (Sign::Zero | Sign::Minus, Sign::Zero) => Self::zero(),
			(Sign::Plus, Sign::Plus) | (Sign::Minus, Sign::Minus) => Self(Sign::Plus, d),
			(Sign::Plus, Sign::Minus) | (Sign::Minus, Sign::Plus) => Self(Sign::Minus, d),
		}
	}
}

impl Rem for I256 {
	type Output = Self;

	fn rem(self, other: Self) -> Self {
		if other == Self::zero() || self.1.is_zero() {
			return Self::zero();
		}

		let r = (self.1 % other.1) & SIGN_BIT_MASK;

		if r == U256::zero() {
			return Self::zero();
		}

		// The result takes the sign of the dividend.
		Self(self.0, r)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn u(v: u64) -> U256 {
		U256::from(v)
	}

	fn neg(v: u64) -> U256 {
		!U256::from(v) + U256::one()
	}

	#[test]
	fn signed_round_trip() {
		for value in [U256::zero(), u(1), neg(1), u(12345), neg(12345)] {
			assert_eq!(U256::from(I256::from(value)), value);
		}
		let min = U256::one() << 255;
		assert_eq!(U256::from(I256::from(min)), min);
		assert_eq!(I256::from(min), I256::min_value());
	}

	#[test]
	fn division_signs() {
		let sdiv = |a: U256, b: U256| -> U256 { (I256::from(a) / I256::from(b)).into() };
		assert_eq!(sdiv(u(10), u(3)), u(3));
		assert_eq!(sdiv(neg(10), u(3)), neg(3));
		assert_eq!(sdiv(u(10), neg(3)), neg(3));
		assert_eq!(sdiv(neg(10), neg(3)), u(3));
		assert_eq!(sdiv(u(10), U256::zero()), U256::zero());
	}

	#[test]
	fn division_minimum_value_edge_cases() {
		let min = U256::one() << 255;
		let sdiv = |a: U256, b: U256| -> U256 { (I256::from(a) / I256::from(b)).into() };
		// MIN / -1 wraps back to MIN, not a fault.
		assert_eq!(sdiv(min, neg(1)), min);
		assert_eq!(sdiv(min, u(1)), min);
		assert_eq!(sdiv(min, u(2)), neg(1) << 254u32);
	}

	#[test]
	fn remainder_takes_dividend_sign() {
		let smod = |a: U256, b: U256| -> U256 { (I256::from(a) % I256::from(b)).into() };
		assert_eq!(smod(u(10), u(3)), u(1));
		assert_eq!(smod(neg(10), u(3)), neg(1));
		assert_eq!(smod(u(10), neg(3)), u(1));
		assert_eq!(smod(u(10), U256::zero()), U256::zero());
	}
}
