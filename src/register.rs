use std::{
    fmt,
    ops::{Index, IndexMut},
};

use crate::fault::FaultKind;

/// Number of general purpose registers.
pub const REGISTER_COUNT: usize = 8;

/// Valid register index, `R0` to `R7`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Register(u8);

impl TryFrom<u8> for Register {
    type Error = FaultKind;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        if (index as usize) < REGISTER_COUNT {
            Ok(Register(index))
        } else {
            Err(FaultKind::InvalidRegister(index))
        }
    }
}

impl Register {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// Result of the most recent `CMP`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Flag {
    Less = 0b100,
    Greater = 0b010,
    Equal = 0b001,
    /// No comparison performed yet
    #[default]
    Clear = 0b000,
}

/// 8x 8-bit registers.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RegisterFile {
    reg: [u8; REGISTER_COUNT],
}

impl RegisterFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iter(&self) -> impl Iterator<Item = u8> + '_ {
        self.reg.iter().copied()
    }
}

impl Index<Register> for RegisterFile {
    type Output = u8;

    fn index(&self, reg: Register) -> &u8 {
        &self.reg[reg.index()]
    }
}

impl IndexMut<Register> for RegisterFile {
    fn index_mut(&mut self, reg: Register) -> &mut u8 {
        &mut self.reg[reg.index()]
    }
}
