use crate::consts;
use crate::log2floor;
use ethvm_core::ExitError;
use ethvm_runtime::Config;
use primitive_types::{H256, U256};

fn to_word_size(len: U256) -> Result<u64, ExitError> {
	if len > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	Ok(len.as_u64().div_ceil(32))
}

pub fn call_extra_check(gas: U256, after_gas: u64, config: &Config) -> Result<(), ExitError> {
	if config.err_on_call_with_more_gas && U256::from(after_gas) < gas {
		Err(ExitError::OutOfGas)
	} else {
		Ok(())
	}
}

/// SSTORE cost under net gas metering: no-op writes are priced like a load,
/// fresh writes at the set/reset tier off the original value.
pub fn sstore_cost(
	original: H256,
	current: H256,
	new: H256,
	gas: u64,
	config: &Config,
) -> Result<u64, ExitError> {
	if config.sstore_gas_metering {
		if config.sstore_revert_under_stipend && gas <= config.call_stipend {
			return Err(ExitError::OutOfGas);
		}

		Ok(if new == current {
			config.gas_sload
		} else if original == current {
			if original == H256::zero() {
				config.gas_sstore_set
			} else {
				config.gas_sstore_reset
			}
		} else {
			config.gas_sload
		})
	} else {
		Ok(if current == H256::zero() && new != H256::zero() {
			config.gas_sstore_set
		} else {
			config.gas_sstore_reset
		})
	}
}

#[allow(clippy::cast_possible_wrap)]
pub fn sstore_refund(original: H256, current: H256, new: H256, config: &Config) -> i64 {
	if config.sstore_gas_metering {
		if current == new {
			0
		} else if original == current && new == H256::zero() {
			config.refund_sstore_clears
		} else {
			let mut refund = 0;

			if original != H256::zero() {
				if current == H256::zero() {
					refund -= config.refund_sstore_clears;
				}
				if new == H256::zero() {
					refund += config.refund_sstore_clears;
				}
			}

			if original == new {
				if original == H256::zero() {
					refund += (config.gas_sstore_set - config.gas_sload) as i64;
				} else {
					refund += (config.gas_sstore_reset - config.gas_sload) as i64;
				}
			}

			refund
		}
	} else if current != H256::zero() && new == H256::zero() {
		config.refund_sstore_clears
	} else {
		0
	}
}

pub const fn suicide_refund(already_removed: bool) -> i64 {
	if already_removed {
		0
	} else {
		consts::R_SUICIDE
	}
}

pub fn suicide_cost(value: U256, target_exists: bool, config: &Config) -> u64 {
	let eip161 = !config.empty_considered_exists;
	let should_charge_topup = if eip161 {
		value != U256::zero() && !target_exists
	} else {
		!target_exists
	};

	let suicide_gas_topup = if should_charge_topup {
		config.gas_suicide_new_account
	} else {
		0
	};

	config.gas_suicide + suicide_gas_topup
}

pub fn call_cost(
	value: U256,
	is_call_or_callcode: bool,
	is_call_or_staticcall: bool,
	new_account: bool,
	config: &Config,
) -> u64 {
	let transfers_value = value != U256::default();
	config.gas_call
		+ xfer_cost(is_call_or_callcode, transfers_value)
		+ new_cost(is_call_or_staticcall, new_account, transfers_value, config)
}

const fn xfer_cost(is_call_or_callcode: bool, transfers_value: bool) -> u64 {
	if is_call_or_callcode && transfers_value {
		consts::G_CALLVALUE
	} else {
		0
	}
}

const fn new_cost(
	is_call_or_staticcall: bool,
	new_account: bool,
	transfers_value: bool,
	config: &Config,
) -> u64 {
	let eip161 = !config.empty_considered_exists;
	if is_call_or_staticcall {
		if eip161 {
			if transfers_value && new_account {
				consts::G_NEWACCOUNT
			} else {
				0
			}
		} else if new_account {
			consts::G_NEWACCOUNT
		} else {
			0
		}
	} else {
		0
	}
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = to_word_size(len)?;
	consts::G_SHA3
		.checked_add(consts::G_SHA3WORD.checked_mul(wordd).ok_or(ExitError::OutOfGas)?)
		.ok_or(ExitError::OutOfGas)
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitError> {
	if len > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}
	let len = len.as_u64();

	consts::G_LOG
		.checked_add(consts::G_LOGDATA.checked_mul(len).ok_or(ExitError::OutOfGas)?)
		.and_then(|c| c.checked_add(consts::G_LOGTOPIC * u64::from(n)))
		.ok_or(ExitError::OutOfGas)
}

pub fn verylowcopy_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = to_word_size(len)?;

	consts::G_VERYLOW
		.checked_add(consts::G_COPY.checked_mul(wordd).ok_or(ExitError::OutOfGas)?)
		.ok_or(ExitError::OutOfGas)
}

pub fn extcodecopy_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	let wordd = to_word_size(len)?;

	config
		.gas_ext_code
		.checked_add(consts::G_COPY.checked_mul(wordd).ok_or(ExitError::OutOfGas)?)
		.ok_or(ExitError::OutOfGas)
}

pub fn exp_cost(power: U256, config: &Config) -> Result<u64, ExitError> {
	if power == U256::zero() {
		Ok(consts::G_EXP)
	} else {
		let byte_len = log2floor(power) / 8 + 1;
		consts::G_EXP
			.checked_add(
				config
					.gas_expbyte
					.checked_mul(byte_len)
					.ok_or(ExitError::OutOfGas)?,
			)
			.ok_or(ExitError::OutOfGas)
	}
}

pub fn create2_cost(len: U256) -> Result<u64, ExitError> {
	let wordd = to_word_size(len)?;

	consts::G_CREATE
		.checked_add(consts::G_SHA3WORD.checked_mul(wordd).ok_or(ExitError::OutOfGas)?)
		.ok_or(ExitError::OutOfGas)
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: Config = Config::istanbul();

	fn h(v: u64) -> H256 {
		H256::from_low_u64_be(v)
	}

	#[test]
	fn sstore_noop_is_priced_as_load() {
		assert_eq!(
			sstore_cost(h(0), h(0), h(0), 10000, &CONFIG),
			Ok(CONFIG.gas_sload)
		);
		assert_eq!(
			sstore_cost(h(1), h(1), h(1), 10000, &CONFIG),
			Ok(CONFIG.gas_sload)
		);
	}

	#[test]
	fn sstore_fresh_set_and_reset() {
		assert_eq!(
			sstore_cost(h(0), h(0), h(1), 10000, &CONFIG),
			Ok(CONFIG.gas_sstore_set)
		);
		assert_eq!(
			sstore_cost(h(1), h(1), h(2), 10000, &CONFIG),
			Ok(CONFIG.gas_sstore_reset)
		);
		// Dirty slots are priced as loads.
		assert_eq!(
			sstore_cost(h(0), h(1), h(2), 10000, &CONFIG),
			Ok(CONFIG.gas_sload)
		);
	}

	#[test]
	fn sstore_under_stipend_sentry_faults() {
		assert_eq!(
			sstore_cost(h(0), h(0), h(1), CONFIG.call_stipend, &CONFIG),
			Err(ExitError::OutOfGas)
		);
	}

	#[test]
	fn sstore_clear_refund() {
		assert_eq!(
			sstore_refund(h(1), h(1), h(0), &CONFIG),
			CONFIG.refund_sstore_clears
		);
		assert_eq!(sstore_refund(h(1), h(1), h(2), &CONFIG), 0);
		// Writing the original zero back refunds set minus load.
		assert_eq!(
			sstore_refund(h(0), h(1), h(0), &CONFIG),
			(CONFIG.gas_sstore_set - CONFIG.gas_sload) as i64
		);
		// Resurrecting a cleared slot takes the clear refund back.
		assert_eq!(
			sstore_refund(h(1), h(0), h(2), &CONFIG),
			-CONFIG.refund_sstore_clears
		);
	}

	#[test]
	fn exp_cost_per_exponent_byte() {
		assert_eq!(exp_cost(U256::zero(), &CONFIG), Ok(consts::G_EXP));
		assert_eq!(
			exp_cost(U256::from(0xff), &CONFIG),
			Ok(consts::G_EXP + CONFIG.gas_expbyte)
		);
		assert_eq!(
			exp_cost(U256::from(0x100), &CONFIG),
			Ok(consts::G_EXP + 2 * CONFIG.gas_expbyte)
		);
		assert_eq!(
			exp_cost(U256::MAX, &CONFIG),
			Ok(consts::G_EXP + 32 * CONFIG.gas_expbyte)
		);
	}

	#[test]
	fn call_cost_surcharges() {
		// Plain call, no value, existing target.
		assert_eq!(
			call_cost(U256::zero(), true, true, false, &CONFIG),
			CONFIG.gas_call
		);
		// Value transfer to an existing target.
		assert_eq!(
			call_cost(U256::one(), true, true, false, &CONFIG),
			CONFIG.gas_call + consts::G_CALLVALUE
		);
		// Value transfer to a dead target adds the new-account surcharge.
		assert_eq!(
			call_cost(U256::one(), true, true, true, &CONFIG),
			CONFIG.gas_call + consts::G_CALLVALUE + consts::G_NEWACCOUNT
		);
		// No value, dead target: no surcharge after EIP-161.
		assert_eq!(
			call_cost(U256::zero(), true, true, true, &CONFIG),
			CONFIG.gas_call
		);
	}
}
