use std::fmt;

use crate::{fault::FaultKind, runtime::Machine};

/// Outcome of an instruction handler, applied by the execution loop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Effect {
    Continue,
    /// Emit decimal value as one output line
    Print(u8),
    Halt,
}

pub type HandlerResult = Result<Effect, FaultKind>;

/// Instruction handler. Arity is a property of the handler shape, so the number
/// of operand bytes consumed always agrees with what the handler accepts.
#[derive(Clone, Copy)]
pub enum Handler {
    Nullary(fn(&mut Machine) -> HandlerResult),
    Unary(fn(&mut Machine, u8) -> HandlerResult),
    Binary(fn(&mut Machine, u8, u8) -> HandlerResult),
}

impl Handler {
    pub fn arity(&self) -> usize {
        match self {
            Self::Nullary(_) => 0,
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
        }
    }
}

/// Every instruction understood by the machine.
#[allow(clippy::upper_case_acronyms)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
#[repr(u8)]
pub enum Opcode {
    /// Load immediate B into register A
    LDI = 0b1000_0010,
    ADD = 0b1010_0000,
    MUL = 0b1010_0010,
    DIV = 0b1010_0011,
    AND = 0b1010_1000,
    INC = 0b0110_0101,
    DEC = 0b0110_0110,
    /// Compare register A with B and set flags
    CMP = 0b1010_0111,
    /// Print register A as a decimal line
    PRN = 0b0100_0111,
    PUSH = 0b0100_0101,
    POP = 0b0100_0110,
    /// Push return address and jump to the address in register A
    CALL = 0b0101_0000,
    RET = 0b0001_0001,
    JMP = 0b0101_0100,
    /// Jump to the address in register A if the last compare was equal
    JEQ = 0b0101_0101,
    HLT = 0b0000_0001,
}

impl Opcode {
    pub const ALL: [Opcode; 16] = [
        Self::LDI,
        Self::ADD,
        Self::MUL,
        Self::DIV,
        Self::AND,
        Self::INC,
        Self::DEC,
        Self::CMP,
        Self::PRN,
        Self::PUSH,
        Self::POP,
        Self::CALL,
        Self::RET,
        Self::JMP,
        Self::JEQ,
        Self::HLT,
    ];

    /// Dispatch table entry for this opcode.
    pub fn handler(self) -> Handler {
        use Handler::*;
        match self {
            Self::LDI => Binary(Machine::ldi),
            Self::ADD => Binary(Machine::add),
            Self::MUL => Binary(Machine::mul),
            Self::DIV => Binary(Machine::div),
            Self::AND => Binary(Machine::and),
            Self::INC => Unary(Machine::inc),
            Self::DEC => Unary(Machine::dec),
            Self::CMP => Binary(Machine::cmp),
            Self::PRN => Unary(Machine::prn),
            Self::PUSH => Unary(Machine::push),
            Self::POP => Unary(Machine::pop),
            Self::CALL => Unary(Machine::call),
            Self::RET => Nullary(Machine::ret),
            Self::JMP => Unary(Machine::jmp),
            Self::JEQ => Unary(Machine::jeq),
            Self::HLT => Nullary(Machine::hlt),
        }
    }

    /// Number of operand bytes following the opcode.
    pub fn arity(self) -> usize {
        self.handler().arity()
    }

    pub fn mnemonic(self) -> &'static str {
        match self {
            Self::LDI => "LDI",
            Self::ADD => "ADD",
            Self::MUL => "MUL",
            Self::DIV => "DIV",
            Self::AND => "AND",
            Self::INC => "INC",
            Self::DEC => "DEC",
            Self::CMP => "CMP",
            Self::PRN => "PRN",
            Self::PUSH => "PUSH",
            Self::POP => "POP",
            Self::CALL => "CALL",
            Self::RET => "RET",
            Self::JMP => "JMP",
            Self::JEQ => "JEQ",
            Self::HLT => "HLT",
        }
    }

    /// Whether operand `index` is an immediate value rather than a register.
    pub fn is_immediate(self, index: usize) -> bool {
        self == Self::LDI && index == 1
    }
}

/// Opcode for every byte value, `None` where the byte is not an instruction.
const DECODE: [Option<Opcode>; 256] = {
    let mut table = [None; 256];
    let mut i = 0;
    while i < Opcode::ALL.len() {
        let op = Opcode::ALL[i];
        table[op as usize] = Some(op);
        i += 1;
    }
    table
};

/// Constant-time lookup of the instruction encoded by `byte`.
pub fn decode(byte: u8) -> Option<Opcode> {
    DECODE[byte as usize]
}

impl TryFrom<u8> for Opcode {
    type Error = FaultKind;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        decode(byte).ok_or(FaultKind::UnknownOpcode(byte))
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mnemonic())
    }
}
