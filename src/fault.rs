use std::{error::Error, fmt, io};

/// Condition that stops the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FaultKind {
    /// Memory access, stack pointer or program counter escaped `0..MEMORY_SIZE`.
    OutOfBounds { address: isize },
    /// Register operand outside `0..=7`.
    InvalidRegister(u8),
    DivisionByZero,
    /// ALU operation id not implemented by this machine.
    UnsupportedAluOp(u8),
    /// Only raised with [`UnknownOpcodePolicy::Fault`](crate::UnknownOpcodePolicy).
    UnknownOpcode(u8),
    ProgramTooLarge { len: usize },
    /// Host-imposed step budget was exhausted before `HLT`.
    StepLimit(u64),
    /// Writing `PRN` output failed.
    Output(io::ErrorKind),
}

/// A [`FaultKind`] together with the instruction that raised it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fault {
    pub kind: FaultKind,
    /// Address of the faulting instruction
    pub pc: usize,
    pub opcode: Option<u8>,
    /// Read-ahead bytes following the opcode, where in bounds
    pub operands: [Option<u8>; 2],
}

impl Fault {
    /// Fault raised outside of any instruction, eg. while loading.
    pub fn bare(kind: FaultKind) -> Self {
        Fault {
            kind,
            pc: 0,
            opcode: None,
            operands: [None, None],
        }
    }
}

impl Error for Fault {}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfBounds { address } => {
                write!(f, "Address {} is out of bounds", address)
            }
            Self::InvalidRegister(index) => write!(f, "Invalid register R{}", index),
            Self::DivisionByZero => write!(f, "Division by zero"),
            Self::UnsupportedAluOp(id) => write!(f, "Unsupported ALU operation {:#06b}", id),
            Self::UnknownOpcode(opcode) => write!(f, "Unknown instruction {:#010b}", opcode),
            Self::ProgramTooLarge { len } => {
                write!(f, "Program of {} bytes does not fit in memory", len)
            }
            Self::StepLimit(limit) => write!(f, "Step limit of {} reached", limit),
            Self::Output(kind) => write!(f, "Failed to write output: {}", kind),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        let Some(opcode) = self.opcode else {
            return Ok(());
        };
        write!(f, " (pc {:#04x}, opcode {:#010b}", self.pc, opcode)?;
        for operand in self.operands.iter().flatten() {
            write!(f, " {:#04x}", operand)?;
        }
        write!(f, ")")
    }
}
