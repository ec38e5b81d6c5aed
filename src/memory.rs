use crate::fault::FaultKind;

/// LS-8 can address 256 bytes of memory.
pub const MEMORY_SIZE: usize = 0x100;

/// Flat byte-addressed memory shared by program, data and stack.
#[derive(Clone)]
pub struct Memory {
    cells: [u8; MEMORY_SIZE],
}

impl Memory {
    pub fn new() -> Self {
        Memory {
            cells: [0; MEMORY_SIZE],
        }
    }

    /// Copy program image verbatim to address 0. Opcodes are not validated.
    pub fn load(&mut self, program: &[u8]) -> Result<(), FaultKind> {
        if program.len() > MEMORY_SIZE {
            return Err(FaultKind::ProgramTooLarge { len: program.len() });
        }
        self.cells[..program.len()].copy_from_slice(program);
        Ok(())
    }

    pub fn read(&self, address: usize) -> Result<u8, FaultKind> {
        self.get(address).ok_or(FaultKind::OutOfBounds {
            address: address as isize,
        })
    }

    pub fn write(&mut self, address: usize, value: u8) -> Result<(), FaultKind> {
        let cell = self
            .cells
            .get_mut(address)
            .ok_or(FaultKind::OutOfBounds {
                address: address as isize,
            })?;
        *cell = value;
        Ok(())
    }

    /// Read that tolerates running off the end, used for operand read-ahead.
    #[inline]
    pub fn get(&self, address: usize) -> Option<u8> {
        self.cells.get(address).copied()
    }
}

impl Default for Memory {
    fn default() -> Self {
        Self::new()
    }
}
