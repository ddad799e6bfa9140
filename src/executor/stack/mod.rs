//! A stack-based executor: nested call frames are driven by an explicit
//! runtime stack with per-frame substates that commit, revert or discard.

mod executor;
mod memory;
mod precompile;
mod tagged_runtime;

pub use self::executor::{
	StackExecutor, StackExecutorCallInterrupt, StackExecutorCreateInterrupt, StackExitKind,
	StackState, StackSubstateMetadata,
};
pub use self::memory::{MemoryStackAccount, MemoryStackState, MemoryStackSubstate};
pub use self::precompile::{
	PrecompileFailure, PrecompileFn, PrecompileHandle, PrecompileOutput, PrecompileResult,
	PrecompileSet,
};
pub use self::tagged_runtime::{RuntimeKind, TaggedRuntime};
