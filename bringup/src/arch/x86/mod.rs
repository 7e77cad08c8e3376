//! Lowest-level x86-64 primitives: one privileged operation per function.

pub mod cpu;
pub mod long_mode;
