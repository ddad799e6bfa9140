//! EVM gasometer: computes and validates the cost of every instruction
//! before it executes. Pure bookkeeping over a fixed schedule; the first
//! shortfall poisons the meter and every later query reports `OutOfGas`.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod consts;
mod costs;
pub mod estimate;
mod memory;

pub use crate::estimate::{estimate_opcode_cost, GasConsumption};
pub use crate::memory::MemoryCost;

use ethvm_core::{ExitError, Opcode, Stack};
use ethvm_runtime::{Config, Handler};
use primitive_types::{H160, H256, U256};

macro_rules! try_or_fail {
	( $inner:expr, $e:expr ) => {
		match $e {
			Ok(value) => value,
			Err(e) => {
				$inner = Err(e.clone());
				return Err(e);
			}
		}
	};
}

/// EVM gasometer.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_limit: u64,
	config: &'config Config,
	inner: Result<Inner, ExitError>,
}

#[derive(Clone, Debug)]
struct Inner {
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with given gas limit and config.
	#[must_use]
	pub const fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gas_limit,
			config,
			inner: Ok(Inner {
				memory_gas: 0,
				used_gas: 0,
				refunded_gas: 0,
			}),
		}
	}

	/// Reference of the config.
	#[must_use]
	pub const fn config(&self) -> &'config Config {
		self.config
	}

	/// Remaining gas.
	#[must_use]
	pub fn gas(&self) -> u64 {
		self.inner.as_ref().map_or(0, |inner| {
			self.gas_limit - inner.used_gas - inner.memory_gas
		})
	}

	/// Total used gas, including the memory charge.
	#[must_use]
	pub fn total_used_gas(&self) -> u64 {
		self.inner
			.as_ref()
			.map_or(self.gas_limit, |inner| inner.used_gas + inner.memory_gas)
	}

	/// Refunded gas.
	#[must_use]
	pub fn refunded_gas(&self) -> i64 {
		self.inner.as_ref().map_or(0, |inner| inner.refunded_gas)
	}

	/// Explicitly fail the gasometer, consuming all gas.
	pub fn fail(&mut self) -> ExitError {
		self.inner = Err(ExitError::OutOfGas);
		ExitError::OutOfGas
	}

	fn inner_mut(&mut self) -> Result<&mut Inner, ExitError> {
		self.inner.as_mut().map_err(|e| e.clone())
	}

	/// Record an explicit cost.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` and poison the meter if the cost exceeds
	/// the remaining gas.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		let gas = self.gas();
		if gas < cost {
			self.inner = Err(ExitError::OutOfGas);
			return Err(ExitError::OutOfGas);
		}

		self.inner_mut()?.used_gas += cost;
		Ok(())
	}

	/// Record an explicit refund.
	///
	/// # Errors
	/// Return `ExitError` if the meter is already poisoned.
	pub fn record_refund(&mut self, refund: i64) -> Result<(), ExitError> {
		self.inner_mut()?.refunded_gas += refund;
		Ok(())
	}

	/// Record the gas returned by an exited child frame.
	///
	/// # Errors
	/// Return `ExitError` if the meter is already poisoned.
	pub fn record_stipend(&mut self, stipend: u64) -> Result<(), ExitError> {
		self.inner_mut()?.used_gas -= stipend;
		Ok(())
	}

	/// Record the cost of one dynamic opcode, including its memory expansion
	/// charge.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` and poison the meter on shortfall.
	pub fn record_dynamic_cost(
		&mut self,
		cost: GasCost,
		memory: Option<MemoryCost>,
	) -> Result<(), ExitError> {
		let gas = self.gas();

		let memory_gas = match memory {
			Some(memory) => {
				if memory.len == U256::zero() {
					self.inner_mut()?.memory_gas
				} else {
					let end = try_or_fail!(
						self.inner,
						memory
							.offset
							.checked_add(memory.len)
							.ok_or(ExitError::OutOfGas)
					);
					let new = try_or_fail!(self.inner, memory::memory_gas(end));
					core::cmp::max(self.inner_mut()?.memory_gas, new)
				}
			}
			None => self.inner_mut()?.memory_gas,
		};

		let gas_cost = try_or_fail!(self.inner, cost.gas_cost(self.config, gas));
		let gas_refund = cost.refund(self.config);

		let used_gas = self.inner_mut()?.used_gas;
		let all_gas_cost = memory_gas
			.checked_add(used_gas)
			.and_then(|v| v.checked_add(gas_cost));
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => (),
			_ => {
				self.inner = Err(ExitError::OutOfGas);
				return Err(ExitError::OutOfGas);
			}
		}

		let inner = self.inner_mut()?;
		inner.used_gas += gas_cost;
		inner.memory_gas = memory_gas;
		inner.refunded_gas += gas_refund;

		Ok(())
	}

	/// Record the deposit cost of the code returned by a create frame.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` and poison the meter on shortfall.
	pub fn record_deposit(&mut self, len: usize) -> Result<(), ExitError> {
		let cost = (len as u64) * consts::G_CODEDEPOSIT;
		self.record_cost(cost)
	}

	/// Record the intrinsic cost of a transaction.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` and poison the meter on shortfall.
	pub fn record_transaction(&mut self, cost: TransactionCost) -> Result<(), ExitError> {
		let gas_cost = match cost {
			TransactionCost::Call {
				zero_data_len,
				non_zero_data_len,
			} => {
				self.config.gas_transaction_call
					+ zero_data_len as u64 * self.config.gas_transaction_zero_data
					+ non_zero_data_len as u64 * self.config.gas_transaction_non_zero_data
			}
			TransactionCost::Create {
				zero_data_len,
				non_zero_data_len,
			} => {
				self.config.gas_transaction_create
					+ zero_data_len as u64 * self.config.gas_transaction_zero_data
					+ non_zero_data_len as u64 * self.config.gas_transaction_non_zero_data
			}
		};

		self.record_cost(gas_cost)
	}
}

/// Calculate the opcode cost, for opcodes with a fixed tier price.
/// Returns `None` for opcodes whose price depends on operands or state.
#[must_use]
pub const fn static_opcode_cost(opcode: Opcode) -> Option<u64> {
	Some(match opcode {
		Opcode::STOP => consts::G_ZERO,
		Opcode::ADD | Opcode::SUB | Opcode::NOT | Opcode::LT | Opcode::GT | Opcode::SLT
		| Opcode::SGT | Opcode::EQ | Opcode::ISZERO | Opcode::AND | Opcode::OR | Opcode::XOR
		| Opcode::BYTE | Opcode::SHL | Opcode::SHR | Opcode::SAR | Opcode::CALLDATALOAD => {
			consts::G_VERYLOW
		}
		Opcode::MUL | Opcode::DIV | Opcode::SDIV | Opcode::MOD | Opcode::SMOD
		| Opcode::SIGNEXTEND | Opcode::SELFBALANCE => consts::G_LOW,
		Opcode::ADDMOD | Opcode::MULMOD | Opcode::JUMP => consts::G_MID,
		Opcode::JUMPI => consts::G_HIGH,
		Opcode::JUMPDEST => consts::G_JUMPDEST,
		Opcode::ADDRESS | Opcode::ORIGIN | Opcode::CALLER | Opcode::CALLVALUE
		| Opcode::CALLDATASIZE | Opcode::CODESIZE | Opcode::GASPRICE | Opcode::COINBASE
		| Opcode::TIMESTAMP | Opcode::NUMBER | Opcode::DIFFICULTY | Opcode::GASLIMIT
		| Opcode::CHAINID | Opcode::RETURNDATASIZE | Opcode::POP | Opcode::PC | Opcode::MSIZE
		| Opcode::GAS => consts::G_BASE,
		Opcode::BLOCKHASH => consts::G_BLOCKHASH,
		_ => return None,
	})
}

/// Calculate the opcode cost, for opcodes whose price depends on operands or
/// state. Operands are peeked from the stack, never popped.
///
/// # Errors
/// Return `ExitError` on stack underflow, on state-changing opcodes inside a
/// static frame, and on unknown opcodes.
#[allow(clippy::too_many_lines)]
pub fn dynamic_opcode_cost<H: Handler>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	is_static: bool,
	config: &Config,
	handler: &H,
) -> Result<(GasCost, Option<MemoryCost>), ExitError> {
	let gas_cost = match opcode {
		Opcode::RETURN | Opcode::REVERT => GasCost::Zero,
		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,
		Opcode::EXP => GasCost::Exp {
			power: stack.peek(1)?,
		},
		Opcode::SHA3 => GasCost::Sha3 {
			len: stack.peek(1)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},
		Opcode::RETURNDATACOPY if config.has_return_data => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},
		Opcode::EXTCODECOPY => GasCost::ExtCodeCopy {
			len: stack.peek(3)?,
		},
		Opcode::EXTCODESIZE => GasCost::ExtCodeSize,
		Opcode::EXTCODEHASH if config.has_ext_code_hash => GasCost::ExtCodeHash,
		Opcode::BALANCE => GasCost::Balance,
		Opcode::SLOAD => GasCost::SLoad,

		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4
			if !is_static =>
		{
			GasCost::Log {
				n: opcode.as_u8() - Opcode::LOG0.as_u8(),
				len: stack.peek(1)?,
			}
		}
		Opcode::SSTORE if !is_static => {
			let index = stack.peek_h256(0)?;
			let value = stack.peek_h256(1)?;

			GasCost::SStore {
				original: handler.original_storage(address, index),
				current: handler.storage(address, index),
				new: value,
			}
		}
		Opcode::CREATE if !is_static => GasCost::Create,
		Opcode::CREATE2 if !is_static && config.has_create2 => GasCost::Create2 {
			len: stack.peek(2)?,
		},
		Opcode::SELFDESTRUCT if !is_static => {
			let target: H160 = stack.peek_h256(0)?.into();

			GasCost::Suicide {
				value: handler.balance(address),
				target_exists: handler.exists(target),
				already_removed: handler.deleted(address),
			}
		}

		Opcode::CALL => {
			let value = stack.peek(2)?;
			if is_static && value != U256::zero() {
				return Err(ExitError::DisallowedStateChange);
			}

			let target: H160 = stack.peek_h256(1)?.into();
			GasCost::Call {
				value,
				gas: stack.peek(0)?,
				target_exists: handler.exists(target),
			}
		}
		Opcode::CALLCODE => {
			let target: H160 = stack.peek_h256(1)?.into();
			GasCost::CallCode {
				value: stack.peek(2)?,
				gas: stack.peek(0)?,
				target_exists: handler.exists(target),
			}
		}
		Opcode::DELEGATECALL if config.has_delegate_call => {
			let target: H160 = stack.peek_h256(1)?.into();
			GasCost::DelegateCall {
				gas: stack.peek(0)?,
				target_exists: handler.exists(target),
			}
		}
		Opcode::STATICCALL => {
			let target: H160 = stack.peek_h256(1)?.into();
			GasCost::StaticCall {
				gas: stack.peek(0)?,
				target_exists: handler.exists(target),
			}
		}

		Opcode::SSTORE
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4
		| Opcode::CREATE
		| Opcode::CREATE2
		| Opcode::SELFDESTRUCT => {
			// Only reachable inside a static frame.
			return Err(ExitError::DisallowedStateChange);
		}

		_ => GasCost::Invalid(opcode),
	};

	let memory_cost = match opcode {
		Opcode::SHA3 | Opcode::RETURN | Opcode::REVERT | Opcode::LOG0 | Opcode::LOG1
		| Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(1)?,
		}),

		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(2)?,
		}),

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(1),
		}),

		Opcode::CREATE | Opcode::CREATE2 => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE => Some(
			MemoryCost {
				offset: stack.peek(3)?,
				len: stack.peek(4)?,
			}
			.join(MemoryCost {
				offset: stack.peek(5)?,
				len: stack.peek(6)?,
			}),
		),

		Opcode::DELEGATECALL | Opcode::STATICCALL => Some(
			MemoryCost {
				offset: stack.peek(2)?,
				len: stack.peek(3)?,
			}
			.join(MemoryCost {
				offset: stack.peek(4)?,
				len: stack.peek(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, memory_cost))
}

/// Gas cost of one dynamic opcode.
#[derive(Debug, Clone, Copy)]
pub enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Very low gas cost.
	VeryLow,
	/// Gas cost for `EXTCODESIZE`.
	ExtCodeSize,
	/// Gas cost for `EXTCODEHASH`.
	ExtCodeHash,
	/// Gas cost for `BALANCE`.
	Balance,
	/// Gas cost for `SLOAD`.
	SLoad,
	/// Gas cost for `CALL`.
	Call {
		/// Call value.
		value: U256,
		/// Call gas.
		gas: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `CALLCODE`.
	CallCode {
		/// Call value.
		value: U256,
		/// Call gas.
		gas: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `DELEGATECALL`.
	DelegateCall {
		/// Call gas.
		gas: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `STATICCALL`.
	StaticCall {
		/// Call gas.
		gas: U256,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `SELFDESTRUCT`.
	Suicide {
		/// Value the executing account has.
		value: U256,
		/// Whether the beneficiary exists.
		target_exists: bool,
		/// Whether the account was already marked for deletion.
		already_removed: bool,
	},
	/// Gas cost for `SSTORE`.
	SStore {
		/// Original value, as of the beginning of the transaction.
		original: H256,
		/// Current value.
		current: H256,
		/// New value.
		new: H256,
	},
	/// Gas cost for `SHA3`.
	Sha3 {
		/// Length of the data.
		len: U256,
	},
	/// Gas cost for `LOGn`.
	Log {
		/// Topic length.
		n: u8,
		/// Data length.
		len: U256,
	},
	/// Gas cost for `EXTCODECOPY`.
	ExtCodeCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for copy opcodes in the very-low tier.
	VeryLowCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for `EXP`.
	Exp {
		/// Power of `EXP`.
		power: U256,
	},
	/// Gas cost for `CREATE`.
	Create,
	/// Gas cost for `CREATE2`.
	Create2 {
		/// Length of the init code.
		len: U256,
	},
	/// An unknown opcode.
	Invalid(Opcode),
}

impl GasCost {
	/// The amount of gas this cost charges.
	///
	/// # Errors
	/// Return `ExitError` on arithmetic overflow, the SSTORE stipend sentry,
	/// or an unknown opcode.
	pub fn gas_cost(&self, config: &Config, gas: u64) -> Result<u64, ExitError> {
		Ok(match *self {
			Self::Call { value, gas: call_gas, target_exists } => {
				costs::call_extra_check(call_gas, gas, config)?;
				costs::call_cost(value, true, true, !target_exists, config)
			}
			Self::CallCode { value, gas: call_gas, target_exists } => {
				costs::call_extra_check(call_gas, gas, config)?;
				costs::call_cost(value, true, false, !target_exists, config)
			}
			Self::DelegateCall { gas: call_gas, target_exists } => {
				costs::call_extra_check(call_gas, gas, config)?;
				costs::call_cost(U256::zero(), false, false, !target_exists, config)
			}
			Self::StaticCall { gas: call_gas, target_exists } => {
				costs::call_extra_check(call_gas, gas, config)?;
				costs::call_cost(U256::zero(), false, true, !target_exists, config)
			}
			Self::Suicide { value, target_exists, .. } => {
				costs::suicide_cost(value, target_exists, config)
			}
			Self::SStore { original, current, new } => {
				costs::sstore_cost(original, current, new, gas, config)?
			}
			Self::Sha3 { len } => costs::sha3_cost(len)?,
			Self::Log { n, len } => costs::log_cost(n, len)?,
			Self::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			Self::ExtCodeCopy { len } => costs::extcodecopy_cost(len, config)?,
			Self::Exp { power } => costs::exp_cost(power, config)?,
			Self::Create => consts::G_CREATE,
			Self::Create2 { len } => costs::create2_cost(len)?,
			Self::SLoad => config.gas_sload,
			Self::Zero => consts::G_ZERO,
			Self::VeryLow => consts::G_VERYLOW,
			Self::ExtCodeSize => config.gas_ext_code,
			Self::ExtCodeHash => config.gas_ext_code_hash,
			Self::Balance => config.gas_balance,
			Self::Invalid(opcode) => return Err(ExitError::InvalidCode(opcode)),
		})
	}

	/// The refund this cost credits.
	#[must_use]
	pub fn refund(&self, config: &Config) -> i64 {
		match *self {
			Self::SStore { original, current, new } => {
				costs::sstore_refund(original, current, new, config)
			}
			Self::Suicide {
				already_removed, ..
			} => costs::suicide_refund(already_removed),
			_ => 0,
		}
	}
}

/// Intrinsic transaction cost, counted over the calldata bytes.
#[derive(Debug, Clone, Copy)]
pub enum TransactionCost {
	/// Call transaction cost.
	Call {
		/// Length of zeros in transaction data.
		zero_data_len: usize,
		/// Length of non-zeros in transaction data.
		non_zero_data_len: usize,
	},
	/// Create transaction cost.
	Create {
		/// Length of zeros in transaction data.
		zero_data_len: usize,
		/// Length of non-zeros in transaction data.
		non_zero_data_len: usize,
	},
}

/// Intrinsic cost of a call transaction with the given data.
#[must_use]
pub fn call_transaction_cost(data: &[u8]) -> TransactionCost {
	let zero_data_len = data.iter().filter(|v| **v == 0).count();
	let non_zero_data_len = data.len() - zero_data_len;

	TransactionCost::Call {
		zero_data_len,
		non_zero_data_len,
	}
}

/// Intrinsic cost of a create transaction with the given init code.
#[must_use]
pub fn create_transaction_cost(data: &[u8]) -> TransactionCost {
	let zero_data_len = data.iter().filter(|v| **v == 0).count();
	let non_zero_data_len = data.len() - zero_data_len;

	TransactionCost::Create {
		zero_data_len,
		non_zero_data_len,
	}
}

/// Floor of the base-2 logarithm. `value` must be non-zero.
#[must_use]
pub fn log2floor(value: U256) -> u64 {
	debug_assert!(value != U256::zero());
	(value.bits() as u64).saturating_sub(1)
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: Config = Config::istanbul();

	#[test]
	fn record_cost_decrements_and_poisons() {
		let mut gasometer = Gasometer::new(100, &CONFIG);
		assert_eq!(gasometer.gas(), 100);
		gasometer.record_cost(40).unwrap();
		assert_eq!(gasometer.gas(), 60);
		assert_eq!(gasometer.total_used_gas(), 40);

		assert_eq!(gasometer.record_cost(61), Err(ExitError::OutOfGas));
		// Poisoned: everything is consumed, later records keep failing.
		assert_eq!(gasometer.gas(), 0);
		assert_eq!(gasometer.total_used_gas(), 100);
		assert_eq!(gasometer.record_cost(0), Err(ExitError::OutOfGas));
	}

	#[test]
	fn memory_charge_is_monotone() {
		let mut gasometer = Gasometer::new(10000, &CONFIG);
		let cost = |offset: u64, len: u64| {
			(
				GasCost::VeryLow,
				Some(MemoryCost {
					offset: U256::from(offset),
					len: U256::from(len),
				}),
			)
		};

		let (gas_cost, memory) = cost(0, 32);
		gasometer.record_dynamic_cost(gas_cost, memory).unwrap();
		// 3 for the opcode, 3 for the first word.
		assert_eq!(gasometer.total_used_gas(), 6);

		// Touching the already-paid-for word again charges no memory gas.
		let (gas_cost, memory) = cost(0, 32);
		gasometer.record_dynamic_cost(gas_cost, memory).unwrap();
		assert_eq!(gasometer.total_used_gas(), 9);

		// Extending to two words charges only the difference.
		let (gas_cost, memory) = cost(32, 32);
		gasometer.record_dynamic_cost(gas_cost, memory).unwrap();
		assert_eq!(gasometer.total_used_gas(), 15);
	}

	#[test]
	fn static_table_tiers() {
		assert_eq!(static_opcode_cost(Opcode::STOP), Some(0));
		assert_eq!(static_opcode_cost(Opcode::ADD), Some(3));
		assert_eq!(static_opcode_cost(Opcode::MUL), Some(5));
		assert_eq!(static_opcode_cost(Opcode::ADDMOD), Some(8));
		assert_eq!(static_opcode_cost(Opcode::JUMPI), Some(10));
		assert_eq!(static_opcode_cost(Opcode::JUMPDEST), Some(1));
		assert_eq!(static_opcode_cost(Opcode::BLOCKHASH), Some(20));
		// Operand-dependent opcodes are not in the static table.
		assert_eq!(static_opcode_cost(Opcode::EXP), None);
		assert_eq!(static_opcode_cost(Opcode::SSTORE), None);
		assert_eq!(static_opcode_cost(Opcode::MSTORE), None);
	}

	#[test]
	fn stipend_returns_child_gas() {
		let mut gasometer = Gasometer::new(1000, &CONFIG);
		gasometer.record_cost(700).unwrap();
		gasometer.record_stipend(300).unwrap();
		assert_eq!(gasometer.gas(), 600);
	}

	#[test]
	fn refund_is_tracked_separately() {
		let mut gasometer = Gasometer::new(1000, &CONFIG);
		gasometer.record_refund(15000).unwrap();
		gasometer.record_refund(-5000).unwrap();
		assert_eq!(gasometer.refunded_gas(), 10000);
		assert_eq!(gasometer.gas(), 1000);
	}
}
