//! Core layer of the EVM: the bytecode interpreter state machine, with no
//! knowledge of gas schedules or world state.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod error;
mod eval;
mod memory;
mod opcode;
mod prelude;
mod stack;
pub mod utils;
mod valids;

pub use crate::error::{
	Capture, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, Trap,
};
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::{Stack, STACK_LIMIT};
pub use crate::valids::Valids;

use crate::eval::Control;
use crate::prelude::*;
use core::ops::Range;
use primitive_types::{H160, U256};

/// Per-opcode hook through which the embedding charges gas and observes
/// execution. Called before and after every opcode is evaluated.
pub trait InterpreterHandler {
	/// Charge for `opcode` before it executes. Returning an error exits the
	/// machine with that error as its reason.
	///
	/// # Errors
	/// Return `ExitError` to abort the machine before the opcode runs.
	fn before_bytecode(
		&mut self,
		opcode: Opcode,
		position: usize,
		machine: &Machine,
		address: &H160,
	) -> Result<(), ExitError>;

	/// Observe the result of the opcode that just ran.
	fn after_bytecode(&mut self, result: &Result<(), Capture<ExitReason, Trap>>, machine: &Machine);
}

/// Core execution layer for the EVM: one call frame's code, stack, memory and
/// program counter.
pub struct Machine {
	/// Program data (calldata of this frame).
	data: Rc<Vec<u8>>,
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Program counter, or the exit reason once the machine has halted.
	position: Result<usize, ExitReason>,
	/// Memory range to be returned on halt.
	return_range: Range<U256>,
	/// Jump destination validity map.
	valids: Valids,
	/// Byte-addressable memory.
	memory: Memory,
	/// Word stack.
	stack: Stack,
}

impl Machine {
	/// Create a new machine with the given code and data.
	#[must_use]
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		let valids = Valids::new(&code[..]);

		Self {
			data,
			code,
			position: Ok(0),
			return_range: U256::zero()..U256::zero(),
			valids,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
		}
	}

	/// Reference of the machine stack.
	#[must_use]
	pub const fn stack(&self) -> &Stack {
		&self.stack
	}

	/// Mutable reference of the machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}

	/// Reference of the machine memory.
	#[must_use]
	pub const fn memory(&self) -> &Memory {
		&self.memory
	}

	/// Mutable reference of the machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}

	/// Program counter, or the exit reason once halted.
	#[must_use]
	pub const fn position(&self) -> &Result<usize, ExitReason> {
		&self.position
	}

	/// The code this machine executes.
	#[must_use]
	pub fn code(&self) -> &[u8] {
		&self.code
	}

	/// The calldata of this frame.
	#[must_use]
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Explicit exit of the machine. Further steps return the given reason.
	pub fn exit(&mut self, reason: ExitReason) {
		self.position = Err(reason);
	}

	/// Inspect the machine's next opcode and current stack.
	#[must_use]
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	#[must_use]
	pub fn return_value(&self) -> Vec<u8> {
		if self.return_range.start > utils::USIZE_MAX {
			let mut ret = Vec::new();
			ret.resize(
				(self.return_range.end - self.return_range.start).as_usize(),
				0,
			);
			ret
		} else if self.return_range.end > utils::USIZE_MAX {
			let mut ret = self.memory.get(
				self.return_range.start.as_usize(),
				usize::MAX - self.return_range.start.as_usize(),
			);
			while ret.len() < (self.return_range.end - self.return_range.start).as_usize() {
				ret.push(0);
			}
			ret
		} else {
			self.memory.get(
				self.return_range.start.as_usize(),
				(self.return_range.end - self.return_range.start).as_usize(),
			)
		}
	}

	/// Loop stepping the machine, until it halts or traps.
	pub fn run<H: InterpreterHandler>(
		&mut self,
		handler: &mut H,
		address: &H160,
	) -> Capture<ExitReason, Trap> {
		loop {
			match self.step(handler, address) {
				Ok(()) => (),
				Err(capture) => return capture,
			}
		}
	}

	/// Step the machine, executing one opcode. It then returns.
	///
	/// # Errors
	/// Return `Capture` when the machine halts or traps to the embedding.
	#[inline]
	pub fn step<H: InterpreterHandler>(
		&mut self,
		handler: &mut H,
		address: &H160,
	) -> Result<(), Capture<ExitReason, Trap>> {
		let position = match self.position {
			Ok(position) => position,
			Err(ref e) => return Err(Capture::Exit(e.clone())),
		};

		let Some(opcode) = self.code.get(position).map(|v| Opcode(*v)) else {
			// Fallthrough past the end of code is an implicit STOP.
			self.position = Err(ExitSucceed::Stopped.into());
			return Err(Capture::Exit(ExitSucceed::Stopped.into()));
		};

		if let Err(e) = handler.before_bytecode(opcode, position, self, address) {
			let reason = ExitReason::Error(e);
			self.position = Err(reason.clone());
			return Err(Capture::Exit(reason));
		}

		let result = match eval::eval(self, opcode, position) {
			Control::Continue(p) => {
				self.position = Ok(position + p);
				Ok(())
			}
			Control::Exit(e) => {
				self.position = Err(e.clone());
				Err(Capture::Exit(e))
			}
			Control::Jump(p) => {
				self.position = Ok(p);
				Ok(())
			}
			Control::Trap(opcode) => {
				self.position = Ok(position + 1);
				Err(Capture::Trap(opcode))
			}
		};

		handler.after_bytecode(&result, self);

		result
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct NoopHandler;

	impl InterpreterHandler for NoopHandler {
		fn before_bytecode(
			&mut self,
			_opcode: Opcode,
			_position: usize,
			_machine: &Machine,
			_address: &H160,
		) -> Result<(), ExitError> {
			Ok(())
		}

		fn after_bytecode(
			&mut self,
			_result: &Result<(), Capture<ExitReason, Trap>>,
			_machine: &Machine,
		) {
		}
	}

	fn run_code(code: Vec<u8>) -> (Machine, Capture<ExitReason, Trap>) {
		let mut machine = Machine::new(Rc::new(code), Rc::new(Vec::new()), 1024, usize::MAX);
		let capture = machine.run(&mut NoopHandler, &H160::default());
		(machine, capture)
	}

	#[test]
	fn implicit_stop_at_end_of_code() {
		// PUSH1 0x01
		let (machine, capture) = run_code(vec![0x60, 0x01]);
		assert_eq!(
			capture,
			Capture::Exit(ExitReason::Succeed(ExitSucceed::Stopped))
		);
		assert_eq!(machine.stack().peek(0), Ok(U256::one()));
	}

	#[test]
	fn add_wraps_modulo_word_size() {
		// PUSH1 0x01 PUSH32 0xff..ff ADD
		let mut code = vec![0x60, 0x01, 0x7f];
		code.extend_from_slice(&[0xff; 32]);
		code.push(0x01);
		let (machine, capture) = run_code(code);
		assert!(matches!(capture, Capture::Exit(ExitReason::Succeed(_))));
		assert_eq!(machine.stack().peek(0), Ok(U256::zero()));
	}

	#[test]
	fn division_by_zero_is_zero() {
		// PUSH1 0x00 PUSH1 0x07 DIV
		let (machine, _) = run_code(vec![0x60, 0x00, 0x60, 0x07, 0x04]);
		assert_eq!(machine.stack().peek(0), Ok(U256::zero()));

		// PUSH1 0x00 PUSH1 0x07 MOD
		let (machine, _) = run_code(vec![0x60, 0x00, 0x60, 0x07, 0x06]);
		assert_eq!(machine.stack().peek(0), Ok(U256::zero()));
	}

	#[test]
	fn jump_into_push_immediate_is_invalid() {
		// PUSH2 0x5b5b PUSH1 0x01 JUMP; offset 1 holds the JUMPDEST byte value
		// but sits inside PUSH data.
		let (_, capture) = run_code(vec![0x61, 0x5b, 0x5b, 0x60, 0x01, 0x56]);
		assert_eq!(
			capture,
			Capture::Exit(ExitReason::Error(ExitError::InvalidJump))
		);
	}

	#[test]
	fn jump_to_jumpdest_continues() {
		// PUSH1 0x03 JUMP JUMPDEST PUSH1 0x2a
		let (machine, capture) = run_code(vec![0x60, 0x03, 0x56, 0x5b, 0x60, 0x2a]);
		assert!(matches!(capture, Capture::Exit(ExitReason::Succeed(_))));
		assert_eq!(machine.stack().peek(0), Ok(U256::from(0x2a)));
	}

	#[test]
	fn return_value_comes_from_memory() {
		// PUSH1 0x2a PUSH1 0x00 MSTORE PUSH1 0x20 PUSH1 0x00 RETURN
		let (machine, capture) = run_code(vec![
			0x60, 0x2a, 0x60, 0x00, 0x52, 0x60, 0x20, 0x60, 0x00, 0xf3,
		]);
		assert_eq!(
			capture,
			Capture::Exit(ExitReason::Succeed(ExitSucceed::Returned))
		);
		let ret = machine.return_value();
		assert_eq!(ret.len(), 32);
		assert_eq!(ret[31], 0x2a);
	}

	#[test]
	fn signed_division_minimum_by_minus_one() {
		// PUSH32 -1 PUSH32 MIN SDIV == MIN
		let mut code = vec![0x7f];
		code.extend_from_slice(&[0xff; 32]);
		code.push(0x7f);
		let mut min = [0x00; 32];
		min[0] = 0x80;
		code.extend_from_slice(&min);
		code.push(0x05);
		let (machine, _) = run_code(code);
		assert_eq!(
			machine.stack().peek(0),
			Ok(U256::from_big_endian(&min))
		);
	}

	#[test]
	fn stack_limit_overflow_faults() {
		let mut code = Vec::new();
		for _ in 0..1025 {
			code.extend_from_slice(&[0x60, 0x00]);
		}
		let (_, capture) = run_code(code);
		assert_eq!(
			capture,
			Capture::Exit(ExitReason::Error(ExitError::StackOverflow))
		);
	}
}
