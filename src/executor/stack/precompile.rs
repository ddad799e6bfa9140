use crate::prelude::*;
use crate::{Context, ExitError, ExitFatal, ExitRevert, ExitSucceed};
use primitive_types::{H160, H256};

/// Successful output of a precompiled contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecompileOutput {
	/// Exit status of the precompile.
	pub exit_status: ExitSucceed,
	/// Output bytes.
	pub output: Vec<u8>,
}

/// Failure of a precompiled contract. Reported to the caller as a failed
/// call, consuming the gas already charged; it never aborts the parent frame
/// unless fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrecompileFailure {
	/// The precompile failed like an ordinary opcode fault.
	Error {
		/// Exit status.
		exit_status: ExitError,
	},
	/// The precompile reverted, returning output and leftover gas.
	Revert {
		/// Exit status.
		exit_status: ExitRevert,
		/// Output bytes.
		output: Vec<u8>,
	},
	/// The precompile failed in a way that must abort the whole execution.
	Fatal {
		/// Exit status.
		exit_status: ExitFatal,
	},
}

impl From<ExitError> for PrecompileFailure {
	fn from(exit_status: ExitError) -> Self {
		Self::Error { exit_status }
	}
}

/// Result of a precompile invocation.
pub type PrecompileResult = Result<PrecompileOutput, PrecompileFailure>;

/// The executor surface a precompile may use: gas accounting, logging and
/// its invocation context.
pub trait PrecompileHandle {
	/// Record gas against the calling frame.
	///
	/// # Errors
	/// Return `ExitError::OutOfGas` on shortfall.
	fn record_cost(&mut self, cost: u64) -> Result<(), ExitError>;

	/// Remaining gas of the calling frame.
	fn remaining_gas(&self) -> u64;

	/// Record a log.
	///
	/// # Errors
	/// Return `ExitError`
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;

	/// The address of the precompile being called.
	fn code_address(&self) -> H160;

	/// The input data.
	fn input(&self) -> &[u8];

	/// The context in which the precompile executes.
	fn context(&self) -> &Context;

	/// Whether the invocation is static.
	fn is_static(&self) -> bool;

	/// The gas limit of this call, if bounded.
	fn gas_limit(&self) -> Option<u64>;
}

/// A set of precompiled contracts, dispatched by address before regular code
/// execution.
pub trait PrecompileSet {
	/// Run the precompile at the handle's code address, or return `None` if
	/// there is none at that address.
	fn execute(&self, handle: &mut impl PrecompileHandle) -> Option<PrecompileResult>;

	/// Whether an address is a precompile.
	fn is_precompile(&self, address: H160) -> bool;
}

impl PrecompileSet for () {
	fn execute(&self, _: &mut impl PrecompileHandle) -> Option<PrecompileResult> {
		None
	}

	fn is_precompile(&self, _: H160) -> bool {
		false
	}
}

/// A precompile as a plain function.
pub type PrecompileFn = fn(&mut dyn PrecompileHandle) -> PrecompileResult;

impl PrecompileSet for BTreeMap<H160, PrecompileFn> {
	fn execute(&self, handle: &mut impl PrecompileHandle) -> Option<PrecompileResult> {
		self.get(&handle.code_address())
			.map(|precompile| precompile(handle))
	}

	fn is_precompile(&self, address: H160) -> bool {
		self.contains_key(&address)
	}
}
