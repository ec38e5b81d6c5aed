use std::ops::Range;

use miette::{miette, LabeledSpan, Report, Severity};

use crate::fault::{Fault, FaultKind};

// Parser errors

pub fn parse_invalid_literal(span: Range<usize>, src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::bad_lit",
        help = "instructions are written as 8 binary digits, eg. 10000010",
        labels = vec![LabeledSpan::at(span, "not an 8-bit binary literal")],
        "Encountered an invalid literal",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_too_large(span: Range<usize>, src: &str, len: usize) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::too_large",
        help = "programs must fit in 256 bytes of memory, including the stack",
        labels = vec![LabeledSpan::at(span, "first byte past the end of memory")],
        "Program of {len} bytes does not fit in memory",
    )
    .with_source_code(src.to_owned())
}

pub fn parse_empty(src: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "parse::empty",
        help = "comments start with # and run to the end of the line",
        "File contains no instructions",
    )
    .with_source_code(src.to_owned())
}

// Runtime errors

/// Turn a machine fault into a user-facing report.
pub fn fault_report(fault: &Fault) -> Report {
    let (code, help) = match fault.kind {
        FaultKind::OutOfBounds { .. } => (
            "run::out_of_bounds",
            "check that the program halts and that the stack does not run past memory",
        ),
        FaultKind::InvalidRegister(_) => (
            "run::invalid_register",
            "registers are numbered 0 to 7",
        ),
        FaultKind::DivisionByZero => (
            "run::div_zero",
            "compare the divisor against zero before dividing",
        ),
        FaultKind::UnsupportedAluOp(_) => (
            "run::alu_op",
            "the ALU supports ADD, SUB, MUL, DIV, AND and CMP",
        ),
        FaultKind::UnknownOpcode(_) => (
            "run::unknown_opcode",
            "run without --strict to skip unknown instructions",
        ),
        FaultKind::ProgramTooLarge { .. } => (
            "run::too_large",
            "programs must fit in 256 bytes of memory",
        ),
        FaultKind::StepLimit(_) => (
            "run::step_limit",
            "the program may be stuck in a loop, or needs a larger --max-steps",
        ),
        FaultKind::Output(_) => ("run::output", "check that stdout is writable"),
    };
    miette!(
        severity = Severity::Error,
        code = code,
        help = help,
        "{fault}",
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_report_codes() {
        let fault = Fault {
            kind: FaultKind::DivisionByZero,
            pc: 3,
            opcode: Some(0b10100011),
            operands: [Some(0), Some(1)],
        };
        let report = fault_report(&fault);
        assert_eq!(report.code().map(|code| code.to_string()), Some("run::div_zero".into()));
        assert_eq!(report.to_string(), fault.to_string());

        let report = fault_report(&Fault::bare(FaultKind::StepLimit(5)));
        assert_eq!(report.code().map(|code| code.to_string()), Some("run::step_limit".into()));
    }

    #[test]
    fn parse_report_labels() {
        let src = "10000010 # LDI\n1000001x\n";
        let report = parse_invalid_literal(16..24, src);
        let labels: Vec<_> = report.labels().into_iter().flatten().collect();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].offset(), 16);
        assert_eq!(labels[0].len(), 8);
    }
}
