//! Runtime layer of the EVM: wires the core interpreter to a world-state
//! `Handler` and evaluates every opcode that touches external state.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod context;
mod eval;
mod handler;
mod interrupt;
mod prelude;

pub use crate::context::{CallScheme, Context, CreateScheme};
pub use crate::handler::{Handler, Transfer};
pub use crate::interrupt::{Resolve, ResolveCall, ResolveCreate};
pub use ethvm_core::*;

use crate::prelude::*;
use primitive_types::{H160, U256};

/// What a finished run loop decided, before any borrow is handed out.
enum RunInterrupt<Ca, Cr> {
	Exit(ExitReason),
	Call(Ca),
	Create(Cr),
}

/// EVM runtime: one call frame of the interpreter together with its execution
/// context and return-data buffer.
pub struct Runtime {
	machine: Machine,
	status: Result<(), ExitReason>,
	return_data_buffer: Vec<u8>,
	return_data_len: U256,
	return_data_offset: U256,
	context: Context,
}

impl Runtime {
	/// Create a new runtime with given code and data.
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		context: Context,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		Self {
			machine: Machine::new(code, data, stack_limit, memory_limit),
			status: Ok(()),
			return_data_buffer: Vec::new(),
			return_data_len: U256::zero(),
			return_data_offset: U256::zero(),
			context,
		}
	}

	/// Get a reference to the machine.
	#[must_use]
	pub const fn machine(&self) -> &Machine {
		&self.machine
	}

	/// Get a reference to the execution context.
	#[must_use]
	pub const fn context(&self) -> &Context {
		&self.context
	}

	/// Halting status of this frame: `Ok` while running, the exit reason once
	/// halted.
	#[must_use]
	pub const fn status(&self) -> &Result<(), ExitReason> {
		&self.status
	}

	/// Loop stepping the runtime until it exits or needs a call/create
	/// interrupt resolved by the embedding executor.
	pub fn run<'a, H>(&'a mut self, handler: &mut H) -> Capture<ExitReason, Resolve<'a, H>>
	where
		H: Handler + InterpreterHandler,
	{
		// The loop only decides what happened; the borrow handed out through
		// `Resolve` is taken once, after it.
		let interrupt = loop {
			let address = self.context.address;
			match self.machine.run(handler, &address) {
				Capture::Exit(reason) => {
					self.status = Err(reason.clone());
					break RunInterrupt::Exit(reason);
				}
				Capture::Trap(opcode) => match eval::eval(self, opcode, handler) {
					eval::Control::Continue => (),
					eval::Control::CallInterrupt(interrupt) => {
						break RunInterrupt::Call(interrupt);
					}
					eval::Control::CreateInterrupt(interrupt) => {
						break RunInterrupt::Create(interrupt);
					}
					eval::Control::Exit(exit) => {
						self.status = Err(exit.clone());
						break RunInterrupt::Exit(exit);
					}
				},
			}
		};

		match interrupt {
			RunInterrupt::Exit(reason) => Capture::Exit(reason),
			RunInterrupt::Call(interrupt) => {
				Capture::Trap(Resolve::Call(interrupt, ResolveCall::new(self)))
			}
			RunInterrupt::Create(interrupt) => {
				Capture::Trap(Resolve::Create(interrupt, ResolveCreate::new(self)))
			}
		}
	}

	/// Re-enter this frame with the result of a nested call: push the success
	/// flag, fill the caller-specified output range and the return-data
	/// buffer.
	///
	/// # Errors
	/// Return `ExitReason` if the nested result is fatal for this frame.
	pub fn finish_call(
		&mut self,
		reason: ExitReason,
		return_data: Vec<u8>,
	) -> Result<(), ExitReason> {
		let target_len = core::cmp::min(self.return_data_len, U256::from(return_data.len()));
		let out_offset = self.return_data_offset;

		match reason {
			ExitReason::Succeed(_) => {
				match self.machine.memory_mut().copy_large(
					out_offset,
					U256::zero(),
					target_len,
					&return_data,
				) {
					Ok(()) => {
						self.machine
							.stack_mut()
							.push(U256::one())
							.map_err(ExitReason::from)?;
						self.return_data_buffer = return_data;
						Ok(())
					}
					Err(_) => {
						self.machine
							.stack_mut()
							.push(U256::zero())
							.map_err(ExitReason::from)?;
						self.return_data_buffer = Vec::new();
						Ok(())
					}
				}
			}
			ExitReason::Revert(_) => {
				self.machine
					.stack_mut()
					.push(U256::zero())
					.map_err(ExitReason::from)?;
				let _ = self.machine.memory_mut().copy_large(
					out_offset,
					U256::zero(),
					target_len,
					&return_data,
				);
				self.return_data_buffer = return_data;
				Ok(())
			}
			ExitReason::Error(_) => {
				self.machine
					.stack_mut()
					.push(U256::zero())
					.map_err(ExitReason::from)?;
				self.return_data_buffer = Vec::new();
				Ok(())
			}
			ExitReason::Fatal(e) => {
				let _ = self.machine.stack_mut().push(U256::zero());
				self.return_data_buffer = Vec::new();
				Err(e.into())
			}
		}
	}

	/// Re-enter this frame with the result of a nested create: push the new
	/// address or zero.
	///
	/// # Errors
	/// Return `ExitReason` if the nested result is fatal for this frame.
	pub fn finish_create(
		&mut self,
		reason: ExitReason,
		address: Option<H160>,
		return_data: Vec<u8>,
	) -> Result<(), ExitReason> {
		match reason {
			ExitReason::Succeed(_) => {
				let ret = address.map_or_else(U256::zero, |a| U256::from_big_endian(&a[..]));
				self.machine
					.stack_mut()
					.push(ret)
					.map_err(ExitReason::from)?;
				self.return_data_buffer = Vec::new();
				Ok(())
			}
			ExitReason::Revert(_) => {
				self.machine
					.stack_mut()
					.push(U256::zero())
					.map_err(ExitReason::from)?;
				self.return_data_buffer = return_data;
				Ok(())
			}
			ExitReason::Error(_) => {
				self.machine
					.stack_mut()
					.push(U256::zero())
					.map_err(ExitReason::from)?;
				self.return_data_buffer = Vec::new();
				Ok(())
			}
			ExitReason::Fatal(e) => {
				let _ = self.machine.stack_mut().push(U256::zero());
				self.return_data_buffer = Vec::new();
				Err(e.into())
			}
		}
	}
}

/// Runtime configuration: one protocol revision's gas schedule constants,
/// structural limits and feature switches. The only constructor is
/// [`Config::istanbul`]; schedule variants are deliberately not mixable.
#[derive(Clone, Debug)]
pub struct Config {
	/// Gas paid for EXTCODESIZE and EXTCODECOPY base.
	pub gas_ext_code: u64,
	/// Gas paid for EXTCODEHASH.
	pub gas_ext_code_hash: u64,
	/// Gas paid for BALANCE.
	pub gas_balance: u64,
	/// Gas paid for SLOAD.
	pub gas_sload: u64,
	/// Gas paid for an SSTORE that sets a zero slot to non-zero.
	pub gas_sstore_set: u64,
	/// Gas paid for an SSTORE that touches a non-zero slot.
	pub gas_sstore_reset: u64,
	/// Refund credited when an SSTORE clears a non-zero slot.
	pub refund_sstore_clears: i64,
	/// Cap on the total refund: `used / max_refund_quotient`.
	pub max_refund_quotient: u64,
	/// Gas paid for SELFDESTRUCT.
	pub gas_suicide: u64,
	/// Surcharge when SELFDESTRUCT funds a dead account.
	pub gas_suicide_new_account: u64,
	/// Gas paid for the CALL family base.
	pub gas_call: u64,
	/// Gas paid per byte of EXP exponent.
	pub gas_expbyte: u64,
	/// Intrinsic gas of a create transaction.
	pub gas_transaction_create: u64,
	/// Intrinsic gas of a call transaction.
	pub gas_transaction_call: u64,
	/// Intrinsic gas per zero byte of transaction data.
	pub gas_transaction_zero_data: u64,
	/// Intrinsic gas per non-zero byte of transaction data.
	pub gas_transaction_non_zero_data: u64,
	/// Whether SSTORE uses net gas metering with the stipend sentry.
	pub sstore_gas_metering: bool,
	/// Whether SSTORE faults when gas left is at or below the stipend.
	pub sstore_revert_under_stipend: bool,
	/// Whether a CALL requesting more gas than available is an error rather
	/// than being capped.
	pub err_on_call_with_more_gas: bool,
	/// Whether empty accounts count as existing for new-account surcharges.
	pub empty_considered_exists: bool,
	/// Whether CREATE bumps the nonce of the created contract.
	pub create_increase_nonce: bool,
	/// Whether a nested call may only forward all-but-one-64th of the
	/// remaining gas.
	pub call_l64_after_gas: bool,
	/// Stack limit of the interpreter.
	pub stack_limit: usize,
	/// Memory limit of the interpreter.
	pub memory_limit: usize,
	/// Call depth limit.
	pub call_stack_limit: usize,
	/// Size limit of a deployed contract, if any.
	pub create_contract_limit: Option<usize>,
	/// Gas stipend passed along with a value transfer.
	pub call_stipend: u64,
	/// Has delegate call.
	pub has_delegate_call: bool,
	/// Has create2.
	pub has_create2: bool,
	/// Has revert.
	pub has_revert: bool,
	/// Has return data.
	pub has_return_data: bool,
	/// Has bitwise shifting.
	pub has_bitwise_shifting: bool,
	/// Has chain ID.
	pub has_chain_id: bool,
	/// Has self balance.
	pub has_self_balance: bool,
	/// Has ext code hash.
	pub has_ext_code_hash: bool,
	/// Whether the executor is in estimation mode, charging worst-case gas
	/// where the exact value depends on state.
	pub estimate: bool,
}

impl Config {
	/// Istanbul hard fork configuration.
	#[must_use]
	pub const fn istanbul() -> Self {
		Self {
			gas_ext_code: 700,
			gas_ext_code_hash: 700,
			gas_balance: 700,
			gas_sload: 800,
			gas_sstore_set: 20000,
			gas_sstore_reset: 5000,
			refund_sstore_clears: 15000,
			max_refund_quotient: 2,
			gas_suicide: 5000,
			gas_suicide_new_account: 25000,
			gas_call: 700,
			gas_expbyte: 50,
			gas_transaction_create: 53000,
			gas_transaction_call: 21000,
			gas_transaction_zero_data: 4,
			gas_transaction_non_zero_data: 16,
			sstore_gas_metering: true,
			sstore_revert_under_stipend: true,
			err_on_call_with_more_gas: false,
			empty_considered_exists: false,
			create_increase_nonce: true,
			call_l64_after_gas: true,
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			create_contract_limit: Some(0x6000),
			call_stipend: 2300,
			has_delegate_call: true,
			has_create2: true,
			has_revert: true,
			has_return_data: true,
			has_bitwise_shifting: true,
			has_chain_id: true,
			has_self_balance: true,
			has_ext_code_hash: true,
			estimate: false,
		}
	}
}
