//! Transaction-level executors driving the interpreter against a backend.

pub mod stack;
