//! Ethereum-style execution core: a stack-based bytecode interpreter with
//! exact gas accounting, layered on a pluggable world-state backend with
//! per-frame commit-or-discard semantics.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod backend;
pub mod executor;
mod maybe_borrowed;
mod prelude;

pub use crate::maybe_borrowed::MaybeBorrowed;
pub use ethvm_core::*;
pub use ethvm_gasometer as gasometer;
pub use ethvm_runtime::*;
