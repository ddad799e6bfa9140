//! Static, state-free gas estimation for offline tooling. The live
//! interpreter always has concrete operands and never produces
//! [`GasConsumption::Unbounded`]; the estimator returns it whenever the cost
//! of an opcode depends on operands that are not statically known.

use crate::static_opcode_cost;
use core::ops::Add;
use ethvm_core::Opcode;
use ethvm_runtime::Config;

/// A statically-estimated gas amount: either a finite number of units, or
/// unbounded because the cost depends on runtime operands.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GasConsumption {
	/// A known, finite amount of gas.
	Finite(u64),
	/// The cost is not statically known.
	Unbounded,
}

impl GasConsumption {
	/// Whether the estimate is finite.
	#[must_use]
	pub const fn is_finite(&self) -> bool {
		matches!(self, Self::Finite(_))
	}
}

impl From<u64> for GasConsumption {
	fn from(value: u64) -> Self {
		Self::Finite(value)
	}
}

impl Add for GasConsumption {
	type Output = Self;

	/// Addition saturates to `Unbounded` on overflow.
	fn add(self, other: Self) -> Self {
		match (self, other) {
			(Self::Finite(a), Self::Finite(b)) => {
				a.checked_add(b).map_or(Self::Unbounded, Self::Finite)
			}
			_ => Self::Unbounded,
		}
	}
}

/// Estimate the cost of a single opcode without operand knowledge.
///
/// Tier-priced opcodes and state reads with fixed pricing produce a finite
/// estimate. Everything whose cost depends on operand values (memory-touching
/// opcodes, copies, `EXP`, `SSTORE`, logs, the call and create families)
/// is `Unbounded`.
#[must_use]
pub fn estimate_opcode_cost(opcode: Opcode, config: &Config) -> GasConsumption {
	if let Some(cost) = static_opcode_cost(opcode) {
		return GasConsumption::Finite(cost);
	}

	match opcode {
		Opcode::SLOAD => GasConsumption::Finite(config.gas_sload),
		Opcode::BALANCE => GasConsumption::Finite(config.gas_balance),
		Opcode::EXTCODESIZE => GasConsumption::Finite(config.gas_ext_code),
		Opcode::EXTCODEHASH => GasConsumption::Finite(config.gas_ext_code_hash),
		_ => GasConsumption::Unbounded,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: Config = Config::istanbul();

	#[test]
	fn tier_opcodes_are_finite() {
		assert_eq!(
			estimate_opcode_cost(Opcode::ADD, &CONFIG),
			GasConsumption::Finite(3)
		);
		assert_eq!(
			estimate_opcode_cost(Opcode::JUMPDEST, &CONFIG),
			GasConsumption::Finite(1)
		);
		assert_eq!(
			estimate_opcode_cost(Opcode::SLOAD, &CONFIG),
			GasConsumption::Finite(CONFIG.gas_sload)
		);
	}

	#[test]
	fn operand_dependent_opcodes_are_unbounded() {
		for opcode in [
			Opcode::EXP,
			Opcode::SHA3,
			Opcode::SSTORE,
			Opcode::MSTORE,
			Opcode::CALL,
			Opcode::CREATE,
			Opcode::LOG0,
		] {
			assert_eq!(
				estimate_opcode_cost(opcode, &CONFIG),
				GasConsumption::Unbounded
			);
		}
	}

	#[test]
	fn addition_saturates_to_unbounded() {
		let a = GasConsumption::Finite(u64::MAX);
		assert_eq!(a + GasConsumption::Finite(1), GasConsumption::Unbounded);
		assert_eq!(
			GasConsumption::Finite(1) + GasConsumption::Finite(2),
			GasConsumption::Finite(3)
		);
		assert_eq!(
			GasConsumption::Unbounded + GasConsumption::Finite(0),
			GasConsumption::Unbounded
		);
	}
}
