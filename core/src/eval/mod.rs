#[macro_use]
mod macros;
mod arithmetic;
mod bitwise;
mod misc;

use crate::{ExitError, ExitReason, ExitSucceed, Machine, Opcode, Trap};
use core::ops::{BitAnd, BitOr, BitXor};
use primitive_types::U256;

/// Control state after one opcode evaluation.
#[derive(Clone, Debug)]
pub enum Control {
	/// Continue, advancing the program counter by the given width.
	Continue(usize),
	/// Exit with the given reason.
	Exit(ExitReason),
	/// Jump the program counter to the given position.
	Jump(usize),
	/// Trap to the embedding runtime; the opcode needs external state.
	Trap(Trap),
}

#[allow(clippy::too_many_lines)]
pub fn eval(machine: &mut Machine, opcode: Opcode, position: usize) -> Control {
	match opcode {
		Opcode::STOP => Control::Exit(ExitSucceed::Stopped.into()),
		Opcode::ADD => op2_u256_tuple!(machine, overflowing_add),
		Opcode::MUL => op2_u256_tuple!(machine, overflowing_mul),
		Opcode::SUB => op2_u256_tuple!(machine, overflowing_sub),
		Opcode::DIV => op2_u256_fn!(machine, arithmetic::div),
		Opcode::SDIV => op2_u256_fn!(machine, arithmetic::sdiv),
		Opcode::MOD => op2_u256_fn!(machine, arithmetic::rem),
		Opcode::SMOD => op2_u256_fn!(machine, arithmetic::srem),
		Opcode::ADDMOD => op3_u256_fn!(machine, arithmetic::addmod),
		Opcode::MULMOD => op3_u256_fn!(machine, arithmetic::mulmod),
		Opcode::EXP => op2_u256_fn!(machine, arithmetic::exp),
		Opcode::SIGNEXTEND => op2_u256_fn!(machine, arithmetic::signextend),
		Opcode::LT => op2_u256_bool_ref!(machine, lt),
		Opcode::GT => op2_u256_bool_ref!(machine, gt),
		Opcode::SLT => op2_u256_fn!(machine, bitwise::slt),
		Opcode::SGT => op2_u256_fn!(machine, bitwise::sgt),
		Opcode::EQ => op2_u256_bool_ref!(machine, eq),
		Opcode::ISZERO => op1_u256_fn!(machine, bitwise::iszero),
		Opcode::AND => op2_u256!(machine, bitand),
		Opcode::OR => op2_u256!(machine, bitor),
		Opcode::XOR => op2_u256!(machine, bitxor),
		Opcode::NOT => op1_u256_fn!(machine, bitwise::not),
		Opcode::BYTE => op2_u256_fn!(machine, bitwise::byte),
		Opcode::SHL => op2_u256_fn!(machine, bitwise::shl),
		Opcode::SHR => op2_u256_fn!(machine, bitwise::shr),
		Opcode::SAR => op2_u256_fn!(machine, bitwise::sar),
		Opcode::CALLDATALOAD => misc::calldataload(machine),
		Opcode::CALLDATASIZE => misc::calldatasize(machine),
		Opcode::CALLDATACOPY => misc::calldatacopy(machine),
		Opcode::CODESIZE => misc::codesize(machine),
		Opcode::CODECOPY => misc::codecopy(machine),
		Opcode::POP => misc::pop(machine),
		Opcode::MLOAD => misc::mload(machine),
		Opcode::MSTORE => misc::mstore(machine),
		Opcode::MSTORE8 => misc::mstore8(machine),
		Opcode::JUMP => misc::jump(machine),
		Opcode::JUMPI => misc::jumpi(machine),
		Opcode::PC => misc::pc(machine, position),
		Opcode::MSIZE => misc::msize(machine),
		Opcode::JUMPDEST => Control::Continue(1),
		Opcode::RETURN => misc::ret(machine),
		Opcode::REVERT => misc::revert(machine),
		Opcode::INVALID => Control::Exit(ExitError::DesignatedInvalid.into()),
		_ => {
			if let Some(n) = opcode.is_push() {
				misc::push(machine, n as usize, position)
			} else if (Opcode::DUP1.0..=Opcode::DUP16.0).contains(&opcode.0) {
				misc::dup(machine, (opcode.0 - Opcode::DUP1.0 + 1) as usize)
			} else if (Opcode::SWAP1.0..=Opcode::SWAP16.0).contains(&opcode.0) {
				misc::swap(machine, (opcode.0 - Opcode::SWAP1.0 + 1) as usize)
			} else {
				// Anything the core does not know how to evaluate is handed to
				// the runtime layer.
				Control::Trap(opcode)
			}
		}
	}
}
