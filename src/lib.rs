// Output macros must come first
#[macro_use]
mod output;
pub use output::{Condition, Output};

// Machine
mod alu;
pub use alu::{AluOp, AluResult};
mod fault;
pub use fault::{Fault, FaultKind};
mod isa;
pub use isa::{decode, Effect, Handler, Opcode};
mod memory;
pub use memory::{Memory, MEMORY_SIZE};
mod register;
pub use register::{Flag, Register, RegisterFile, REGISTER_COUNT};
mod runtime;
pub use runtime::{
    Machine, RunOptions, Skipped, Status, Summary, UnknownOpcodePolicy, STACK_START,
};

// Tooling
pub mod disasm;
pub mod error;
pub mod parser;

pub mod env;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 4;
