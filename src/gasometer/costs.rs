use evm_journal_interpreter::ExitError;
use primitive_types::{H256, U256};

use super::consts::*;
use crate::config::Config;

/// Gas cost of memory expanded to `len` bytes: linear word cost plus the
/// quadratic term.
pub fn memory_gas(len: U256) -> Result<u64, ExitError> {
	if len > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	let words = len.as_u64().div_ceil(32);

	G_MEMORY
		.checked_mul(words)
		.and_then(|linear| {
			words
				.checked_mul(words)
				.map(|squared| (linear, squared / G_QUAD_DIVISOR))
		})
		.and_then(|(linear, quadratic)| linear.checked_add(quadratic))
		.ok_or(ExitError::OutOfGas)
}

fn words(len: U256) -> Result<u64, ExitError> {
	if len > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	Ok(len.as_u64().div_ceil(32))
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	G_SHA3_WORD
		.checked_mul(words(len)?)
		.and_then(|wordgas| wordgas.checked_add(G_SHA3))
		.ok_or(ExitError::OutOfGas)
}

pub fn verylow_copy_cost(len: U256) -> Result<u64, ExitError> {
	G_COPY
		.checked_mul(words(len)?)
		.and_then(|wordgas| wordgas.checked_add(G_VERYLOW))
		.ok_or(ExitError::OutOfGas)
}

pub fn extcodecopy_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	G_COPY
		.checked_mul(words(len)?)
		.and_then(|wordgas| wordgas.checked_add(config.gas_ext_code))
		.ok_or(ExitError::OutOfGas)
}

pub fn exp_cost(power: U256, config: &Config) -> Result<u64, ExitError> {
	if power == U256::zero() {
		Ok(G_EXP)
	} else {
		let bytes = (power.bits() as u64).div_ceil(8);
		config
			.gas_expbyte
			.checked_mul(bytes)
			.and_then(|byte_gas| byte_gas.checked_add(G_EXP))
			.ok_or(ExitError::OutOfGas)
	}
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitError> {
	if len > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	G_LOGDATA
		.checked_mul(len.as_u64())
		.and_then(|data_gas| data_gas.checked_add(G_LOG))
		.and_then(|gas| gas.checked_add(G_LOGTOPIC * u64::from(n)))
		.ok_or(ExitError::OutOfGas)
}

pub fn create2_cost(len: U256) -> Result<u64, ExitError> {
	G_SHA3_WORD
		.checked_mul(words(len)?)
		.and_then(|wordgas| wordgas.checked_add(G_CREATE))
		.ok_or(ExitError::OutOfGas)
}

pub fn call_cost(value: U256, target_exists: bool, config: &Config) -> u64 {
	let transfers_value = value != U256::zero();
	let mut gas = config.gas_call;
	if transfers_value {
		gas += G_CALLVALUE;
	}
	if !target_exists && transfers_value {
		gas += G_NEWACCOUNT;
	}
	gas
}

pub fn callcode_cost(value: U256, config: &Config) -> u64 {
	let mut gas = config.gas_call;
	if value != U256::zero() {
		gas += G_CALLVALUE;
	}
	gas
}

pub fn sstore_cost(
	original: H256,
	current: H256,
	new: H256,
	gas_left: u64,
	config: &Config,
) -> Result<u64, ExitError> {
	if config.sstore_gas_metering {
		if config.sstore_revert_under_stipend && gas_left <= config.call_stipend {
			return Err(ExitError::OutOfGas);
		}

		Ok(if new == current {
			config.gas_sload
		} else if original == current {
			if original == H256::default() {
				G_SSTORE_SET
			} else {
				G_SSTORE_RESET
			}
		} else {
			config.gas_sload
		})
	} else {
		Ok(if current == H256::default() && new != H256::default() {
			G_SSTORE_SET
		} else {
			G_SSTORE_RESET
		})
	}
}

pub fn sstore_refund(original: H256, current: H256, new: H256, config: &Config) -> i64 {
	let zero = H256::default();

	if config.sstore_gas_metering {
		let mut refund = 0i64;
		if new == current {
			return 0;
		}

		if original == current {
			if original != zero && new == zero && config.refund_sstore_clears {
				refund += R_SSTORE_CLEAR;
			}
		} else {
			if original != zero {
				if current == zero {
					refund -= R_SSTORE_CLEAR;
				}
				if new == zero && config.refund_sstore_clears {
					refund += R_SSTORE_CLEAR;
				}
			}
			if original == new {
				if original == zero {
					refund += (G_SSTORE_SET - config.gas_sload) as i64;
				} else {
					refund += (G_SSTORE_RESET - config.gas_sload) as i64;
				}
			}
		}

		refund
	} else if current != zero && new == zero && config.refund_sstore_clears {
		R_SSTORE_CLEAR
	} else {
		0
	}
}

pub fn suicide_refund(already_deleted: bool, config: &Config) -> i64 {
	if !already_deleted && config.refund_suicide {
		R_SUICIDE
	} else {
		0
	}
}

pub fn transaction_cost(base: u64, data: &[u8], config: &Config) -> u64 {
	let zero_bytes = data.iter().filter(|b| **b == 0).count() as u64;
	let non_zero_bytes = data.len() as u64 - zero_bytes;

	base + zero_bytes * config.gas_transaction_zero_data
		+ non_zero_bytes * config.gas_transaction_non_zero_data
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn memory_gas_is_quadratic() {
		assert_eq!(memory_gas(U256::zero()), Ok(0));
		assert_eq!(memory_gas(U256::from(32)), Ok(3));
		// 724 bytes -> 23 words: 3 * 23 + 23^2 / 512 = 70.
		assert_eq!(memory_gas(U256::from(724)), Ok(70));
		// 1 MiB -> 32768 words: 3 * 32768 + 32768^2 / 512 = 2195456.
		assert_eq!(memory_gas(U256::from(1024 * 1024)), Ok(2_195_456));
	}

	#[test]
	fn exp_cost_counts_exponent_bytes() {
		let config = Config::istanbul();
		assert_eq!(exp_cost(U256::zero(), &config), Ok(10));
		assert_eq!(exp_cost(U256::from(0xff), &config), Ok(60));
		assert_eq!(exp_cost(U256::from(0x100), &config), Ok(110));
	}

	#[test]
	fn legacy_sstore_costs() {
		let config = Config::frontier();
		let zero = H256::default();
		let one = H256::from_low_u64_be(1);
		assert_eq!(sstore_cost(zero, zero, one, 100_000, &config), Ok(20000));
		assert_eq!(sstore_cost(zero, one, zero, 100_000, &config), Ok(5000));
		assert_eq!(sstore_refund(zero, one, zero, &config), 15000);
	}

	#[test]
	fn net_metered_sstore_costs() {
		let config = Config::istanbul();
		let zero = H256::default();
		let one = H256::from_low_u64_be(1);
		let two = H256::from_low_u64_be(2);

		// No-op write costs a warm read.
		assert_eq!(sstore_cost(one, one, one, 100_000, &config), Ok(800));
		// Fresh write to a clean zero slot.
		assert_eq!(sstore_cost(zero, zero, one, 100_000, &config), Ok(20000));
		// Dirty slot.
		assert_eq!(sstore_cost(zero, one, two, 100_000, &config), Ok(800));
		// Sentry.
		assert_eq!(
			sstore_cost(zero, zero, one, 2300, &config),
			Err(ExitError::OutOfGas)
		);
	}
}
