use primitive_types::U256;

use crate::utils::{I256, Sign};

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

#[inline]
pub fn byte(op1: U256, op2: U256) -> U256 {
	if op1 >= U256::from(32) {
		return U256::zero();
	}

	U256::from(op2.byte(31 - op1.as_usize()))
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

#[inline]
pub fn sar(shift: U256, value: U256) -> U256 {
	let value = I256::from(value);

	if value == I256::zero() || shift >= U256::from(256) {
		match value.0 {
			// value is 0 or >= 1, pushing 0
			Sign::Plus | Sign::Zero => U256::zero(),
			// value is < 0, pushing -1
			Sign::Minus => I256(Sign::Minus, U256::one()).into(),
		}
	} else {
		let shift = shift.as_usize();

		match value.0 {
			Sign::Plus | Sign::Zero => value.1 >> shift,
			Sign::Minus => {
				let shifted = ((value.1 - U256::one()) >> shift) + U256::one();
				I256(Sign::Minus, shifted).into()
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shift_saturation() {
		assert_eq!(shl(U256::from(256), U256::one()), U256::zero());
		assert_eq!(shr(U256::from(256), U256::MAX), U256::zero());
		assert_eq!(sar(U256::from(256), U256::MAX), U256::MAX);
		assert_eq!(sar(U256::from(256), U256::one()), U256::zero());
	}

	#[test]
	fn sar_rounds_towards_minus_infinity() {
		// -1 >> 1 == -1
		assert_eq!(sar(U256::one(), U256::MAX), U256::MAX);
		// -4 >> 1 == -2
		let minus_four = U256::MAX - U256::from(3);
		let minus_two = U256::MAX - U256::one();
		assert_eq!(sar(U256::one(), minus_four), minus_two);
	}

	#[test]
	fn byte_indexes_from_msb() {
		let v = U256::from_big_endian(&{
			let mut b = [0u8; 32];
			b[0] = 0xab;
			b[31] = 0xcd;
			b
		});
		assert_eq!(byte(U256::zero(), v), U256::from(0xab));
		assert_eq!(byte(U256::from(31), v), U256::from(0xcd));
		assert_eq!(byte(U256::from(32), v), U256::zero());
	}
}
