use std::fmt;

use crate::isa::Opcode;

/// One decoded instruction, or a stray byte, from a program listing.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Line {
    pub address: usize,
    /// `None` for bytes that are not a known opcode
    pub opcode: Option<Opcode>,
    /// Opcode byte followed by any operand bytes present
    pub bytes: Vec<u8>,
}

impl Line {
    /// Instruction needs more operand bytes than the program has.
    pub fn is_truncated(&self) -> bool {
        self.opcode
            .is_some_and(|opcode| self.bytes.len() < 1 + opcode.arity())
    }
}

/// Linear sweep over `program`, decoding each instruction by its arity.
/// Unknown bytes occupy a single line each, matching how the machine skips them.
pub fn disassemble(program: &[u8]) -> Vec<Line> {
    let mut lines = Vec::new();
    let mut address = 0;
    while address < program.len() {
        let opcode = Opcode::try_from(program[address]).ok();
        let len = 1 + opcode.map_or(0, Opcode::arity);
        let end = program.len().min(address + len);
        lines.push(Line {
            address,
            opcode,
            bytes: program[address..end].to_vec(),
        });
        address = end;
    }
    lines
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}:", self.address)?;
        for byte in &self.bytes {
            write!(f, " {:08b}", byte)?;
        }
        // Pad to widest instruction
        for _ in self.bytes.len()..3 {
            write!(f, "         ")?;
        }

        let Some(opcode) = self.opcode else {
            return write!(f, "  ??? {:#04x}", self.bytes[0]);
        };
        write!(f, "  {}", opcode)?;
        for (i, operand) in self.bytes.iter().skip(1).enumerate() {
            let sep = if i == 0 { " " } else { ", " };
            if opcode.is_immediate(i) {
                write!(f, "{}{}", sep, operand)?;
            } else {
                write!(f, "{}R{}", sep, operand)?;
            }
        }
        if self.is_truncated() {
            write!(f, " <truncated>")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_by_arity() {
        let program = [0b10000010, 0, 8, 0b01000111, 0, 0b00000001];
        let lines = disassemble(&program);
        let summary: Vec<_> = lines
            .iter()
            .map(|line| (line.address, line.opcode, line.bytes.len()))
            .collect();
        assert_eq!(
            summary,
            [
                (0, Some(Opcode::LDI), 3),
                (3, Some(Opcode::PRN), 2),
                (5, Some(Opcode::HLT), 1),
            ]
        );
    }

    #[test]
    fn listing() {
        let program = [0b10000010, 0, 8, 0b01000111, 0, 0b00000001];
        let listing: Vec<_> = disassemble(&program)
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            listing,
            [
                "00: 10000010 00000000 00001000  LDI R0, 8",
                "03: 01000111 00000000           PRN R0",
                "05: 00000001                    HLT",
            ]
        );
    }

    #[test]
    fn unknown_and_truncated() {
        let lines = disassemble(&[0xFF, 0b10100000, 1]);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].opcode, None);
        assert_eq!(lines[0].to_string(), "00: 11111111                    ??? 0xff");
        assert!(lines[1].is_truncated());
        assert_eq!(
            lines[1].to_string(),
            "01: 10100000 00000001           ADD R1 <truncated>"
        );
    }
}
