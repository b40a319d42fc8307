use primitive_types::{U256, U512};

use crate::utils::I256;

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
	if op3 == U256::zero() {
		U256::zero()
	} else {
		let op1 = U512::from(op1);
		let op2 = U512::from(op2);
		let op3 = U512::from(op3);
		let v = (op1 + op2) % op3;
		U256::try_from(v).unwrap_or_default()
	}
}

#[inline]
pub fn mulmod(op1: U256, op2: U256, op3: U256) -> U256 {
	if op3 == U256::zero() {
		U256::zero()
	} else {
		let v = op1.full_mul(op2) % U512::from(op3);
		U256::try_from(v).unwrap_or_default()
	}
}

/// Big-endian modular exponentiation modulo 2^256, by square and multiply.
#[inline]
pub fn exp(op1: U256, op2: U256) -> U256 {
	let mut op1 = op1;
	let mut op2 = op2;
	let mut r = U256::one();

	while op2 != U256::zero() {
		if op2 & U256::one() != U256::zero() {
			r = r.overflowing_mul(op1).0;
		}
		op2 >>= 1;
		op1 = op1.overflowing_mul(op1).0;
	}

	r
}

#[inline]
pub fn signextend(op1: U256, op2: U256) -> U256 {
	if op1 < U256::from(32) {
		let bit_index = (8 * op1.low_u32() + 7) as usize;
		let bit = op2.bit(bit_index);
		let mask = (U256::one() << bit_index) - U256::one();
		if bit {
			op2 | !mask
		} else {
			op2 & mask
		}
	} else {
		op2
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn division_by_zero_is_zero() {
		assert_eq!(div(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(sdiv(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(rem(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(srem(U256::from(7), U256::zero()), U256::zero());
		assert_eq!(addmod(U256::one(), U256::one(), U256::zero()), U256::zero());
		assert_eq!(mulmod(U256::one(), U256::one(), U256::zero()), U256::zero());
	}

	#[test]
	fn sdiv_min_by_minus_one() {
		let min = U256::one() << 255;
		let minus_one = U256::MAX;
		assert_eq!(sdiv(min, minus_one), min);
	}

	#[test]
	fn mulmod_uses_full_width() {
		// (2^255 * 4) mod (2^255 + 1) needs 512-bit intermediates.
		let a = U256::one() << 255;
		let b = U256::from(4);
		let m = (U256::one() << 255) + U256::one();
		let expected = {
			let v = a.full_mul(b) % U512::from(m);
			U256::try_from(v).unwrap()
		};
		assert_eq!(mulmod(a, b, m), expected);
	}

	#[test]
	fn exp_wraps_modulo_2_256() {
		assert_eq!(exp(U256::from(2), U256::from(8)), U256::from(256));
		assert_eq!(exp(U256::from(2), U256::from(256)), U256::zero());
		assert_eq!(exp(U256::from(3), U256::zero()), U256::one());
	}

	#[test]
	fn signextend_from_byte_zero() {
		assert_eq!(
			signextend(U256::zero(), U256::from(0xff)),
			U256::MAX
		);
		assert_eq!(
			signextend(U256::zero(), U256::from(0x7f)),
			U256::from(0x7f)
		);
		assert_eq!(signextend(U256::from(32), U256::from(0xff)), U256::from(0xff));
	}
}
