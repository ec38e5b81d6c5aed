use std::cmp::Ordering;

use crate::{fault::FaultKind, register::Flag};

/// Operations implemented by the ALU.
///
/// Discriminants are the LS-8 ALU operation ids, which also form the low
/// nibble of the matching opcode (eg. `ADD` is `0b1010_0000`).
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluOp {
    Add = 0x0,
    Sub = 0x1,
    Mul = 0x2,
    Div = 0x3,
    Cmp = 0x7,
    And = 0x8,
}

impl AluOp {
    /// Resolve an ALU operation id.
    /// Ids reserved by the LS-8 for `MOD`, `NOT`, `OR`, `XOR`, `SHL` and `SHR`
    /// are not supported here.
    pub fn from_id(id: u8) -> Result<Self, FaultKind> {
        match id {
            0x0 => Ok(Self::Add),
            0x1 => Ok(Self::Sub),
            0x2 => Ok(Self::Mul),
            0x3 => Ok(Self::Div),
            0x7 => Ok(Self::Cmp),
            0x8 => Ok(Self::And),
            _ => Err(FaultKind::UnsupportedAluOp(id)),
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }
}

/// What the machine should do with an ALU computation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AluResult {
    /// Store in the first operand register
    Value(u8),
    /// Store in the flags register, registers untouched
    Compare(Flag),
}

/// Compute `a op b` with 8-bit wrapping semantics.
pub fn execute(op: AluOp, a: u8, b: u8) -> Result<AluResult, FaultKind> {
    let value = match op {
        AluOp::Add => a.wrapping_add(b),
        AluOp::Sub => a.wrapping_sub(b),
        AluOp::Mul => a.wrapping_mul(b),
        AluOp::Div => a.checked_div(b).ok_or(FaultKind::DivisionByZero)?,
        AluOp::And => a & b,
        AluOp::Cmp => return Ok(AluResult::Compare(compare(a, b))),
    };
    Ok(AluResult::Value(value))
}

#[inline]
fn compare(a: u8, b: u8) -> Flag {
    match a.cmp(&b) {
        Ordering::Less => Flag::Less,
        Ordering::Greater => Flag::Greater,
        Ordering::Equal => Flag::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn value(op: AluOp, a: u8, b: u8) -> u8 {
        match execute(op, a, b) {
            Ok(AluResult::Value(value)) => value,
            other => panic!("expected value from {op:?}({a}, {b}), got {other:?}"),
        }
    }

    #[test]
    fn wrapping_arithmetic() {
        assert_eq!(value(AluOp::Add, 255, 1), 0);
        assert_eq!(value(AluOp::Add, 200, 100), 44);
        assert_eq!(value(AluOp::Sub, 0, 1), 255);
        assert_eq!(value(AluOp::Sub, 10, 3), 7);
        assert_eq!(value(AluOp::Mul, 16, 16), 0);
        assert_eq!(value(AluOp::Mul, 8, 9), 72);
    }

    #[test]
    fn wrapping_matches_modular_arithmetic() {
        for a in [0u8, 1, 2, 127, 128, 200, 254, 255] {
            for b in [0u8, 1, 3, 127, 128, 255] {
                let (wa, wb) = (a as u32, b as u32);
                assert_eq!(value(AluOp::Add, a, b) as u32, (wa + wb) % 256);
                assert_eq!(value(AluOp::Sub, a, b) as u32, (wa + 256 - wb) % 256);
                assert_eq!(value(AluOp::Mul, a, b) as u32, (wa * wb) % 256);
            }
        }
    }

    #[test]
    fn division() {
        assert_eq!(value(AluOp::Div, 9, 2), 4);
        assert_eq!(value(AluOp::Div, 255, 255), 1);
        assert_eq!(value(AluOp::Div, 0, 7), 0);
        assert_eq!(
            execute(AluOp::Div, 9, 0),
            Err(FaultKind::DivisionByZero)
        );
    }

    #[test]
    fn bitwise_and() {
        assert_eq!(value(AluOp::And, 0b1100_1010, 0b1010_0110), 0b1000_0010);
        assert_eq!(value(AluOp::And, 0xFF, 0x0F), 0x0F);
    }

    #[test]
    fn compare_sets_exactly_one_flag() {
        #[rustfmt::skip]
        let cases = [
            (1, 2, Flag::Less),
            (2, 1, Flag::Greater),
            (5, 5, Flag::Equal),
            // Unsigned, 0x80 is not negative
            (0x80, 0x01, Flag::Greater),
            (0, 255, Flag::Less),
        ];
        for (a, b, expected) in cases {
            assert_eq!(execute(AluOp::Cmp, a, b), Ok(AluResult::Compare(expected)));
        }
    }

    #[test]
    fn operation_ids() {
        for op in [
            AluOp::Add,
            AluOp::Sub,
            AluOp::Mul,
            AluOp::Div,
            AluOp::Cmp,
            AluOp::And,
        ] {
            assert_eq!(AluOp::from_id(op.id()), Ok(op));
        }
        // MOD, NOT, OR, XOR, SHL, SHR
        for id in [0x4, 0x9, 0xA, 0xB, 0xC, 0xD, 0xF] {
            assert_eq!(AluOp::from_id(id), Err(FaultKind::UnsupportedAluOp(id)));
        }
    }
}
