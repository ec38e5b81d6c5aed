use std::io::Write;

use crate::{
    alu::{self, AluOp, AluResult},
    fault::{Fault, FaultKind},
    isa::{Effect, Handler, HandlerResult, Opcode},
    memory::Memory,
    register::{Flag, Register, RegisterFile},
};

/// Initial stack pointer. The stack grows down towards the program.
pub const STACK_START: usize = 0xF4;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Status {
    Running,
    Halted,
}

/// What to do when the fetched byte is not in the instruction set.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum UnknownOpcodePolicy {
    /// Report a diagnostic, advance by one byte and keep running
    #[default]
    Skip,
    /// Stop with [`FaultKind::UnknownOpcode`]
    Fault,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct RunOptions {
    pub unknown_opcode: UnknownOpcodePolicy,
    /// Print machine state before every instruction
    pub trace: bool,
    /// Stop with [`FaultKind::StepLimit`] after this many instructions
    pub max_steps: Option<u64>,
}

/// Unknown opcode passed over under [`UnknownOpcodePolicy::Skip`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Skipped {
    pub pc: usize,
    pub opcode: u8,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Summary {
    /// Instructions executed, including skipped bytes
    pub steps: u64,
    pub skipped: usize,
}

/// Represents complete machine state during runtime.
pub struct Machine {
    /// System memory, holds program and stack
    mem: Memory,
    /// 8x 8-bit registers
    reg: RegisterFile,
    /// Program counter
    pc: usize,
    /// Stack pointer
    sp: usize,
    /// Result of last compare
    flag: Flag,
    status: Status,
    options: RunOptions,
    steps: u64,
    skipped: Vec<Skipped>,
}

impl Machine {
    pub fn new(program: &[u8]) -> Result<Machine, Fault> {
        Self::with_options(program, RunOptions::default())
    }

    pub fn with_options(program: &[u8], options: RunOptions) -> Result<Machine, Fault> {
        let mut mem = Memory::new();
        mem.load(program).map_err(Fault::bare)?;
        Ok(Machine {
            mem,
            reg: RegisterFile::new(),
            pc: 0,
            sp: STACK_START,
            flag: Flag::Clear,
            status: Status::Running,
            options,
            steps: 0,
            skipped: Vec::new(),
        })
    }

    /// Run until `HLT`, writing `PRN` lines to `out`.
    /// Bounded by [`RunOptions::max_steps`] when set.
    pub fn run<W: Write>(&mut self, out: &mut W) -> Result<Summary, Fault> {
        self.run_until(out, self.options.max_steps)
    }

    /// Run until `HLT`, or fail with [`FaultKind::StepLimit`] once the machine
    /// has executed `limit` instructions in total.
    pub fn run_limited<W: Write>(&mut self, out: &mut W, limit: u64) -> Result<Summary, Fault> {
        self.run_until(out, Some(limit))
    }

    fn run_until<W: Write>(&mut self, out: &mut W, limit: Option<u64>) -> Result<Summary, Fault> {
        while self.status == Status::Running {
            if let Some(limit) = limit {
                if self.steps >= limit {
                    return Err(self.fault_here(FaultKind::StepLimit(limit)));
                }
            }
            self.step(out)?;
        }
        Ok(Summary {
            steps: self.steps,
            skipped: self.skipped.len(),
        })
    }

    /// Fetch, decode and execute a single instruction.
    /// On fault the program counter is left at the faulting instruction.
    pub fn step<W: Write>(&mut self, out: &mut W) -> Result<Status, Fault> {
        if self.status == Status::Halted {
            return Ok(Status::Halted);
        }
        if self.options.trace {
            dprintln!(Always, "{}", self.trace());
        }

        let pc = self.pc;
        let byte = self.mem.read(pc).map_err(|kind| self.fault_here(kind))?;
        // Both operand bytes are read ahead, regardless of arity
        let operands = [self.mem.get(pc + 1), self.mem.get(pc + 2)];
        let fault = |kind: FaultKind| Fault {
            kind,
            pc,
            opcode: Some(byte),
            operands,
        };

        let opcode = match Opcode::try_from(byte) {
            Ok(opcode) => opcode,
            Err(kind) => match self.options.unknown_opcode {
                UnknownOpcodePolicy::Fault => return Err(fault(kind)),
                UnknownOpcodePolicy::Skip => {
                    self.skipped.push(Skipped { pc, opcode: byte });
                    self.pc = pc + 1;
                    self.steps += 1;
                    return Ok(self.status);
                }
            },
        };

        let operand = |i: usize| {
            operands[i].ok_or(FaultKind::OutOfBounds {
                address: (pc + 1 + i) as isize,
            })
        };
        // PC incremented before instruction is performed
        let result = match opcode.handler() {
            Handler::Nullary(handler) => {
                self.pc = pc + 1;
                handler(self)
            }
            Handler::Unary(handler) => {
                let a = operand(0).map_err(fault)?;
                self.pc = pc + 2;
                handler(self, a)
            }
            Handler::Binary(handler) => {
                let a = operand(0).map_err(fault)?;
                let b = operand(1).map_err(fault)?;
                self.pc = pc + 3;
                handler(self, a, b)
            }
        };
        let effect = result.map_err(|kind| {
            self.pc = pc;
            fault(kind)
        })?;
        self.steps += 1;

        match effect {
            Effect::Continue => (),
            Effect::Print(value) => {
                writeln!(out, "{}", value).map_err(|e| fault(FaultKind::Output(e.kind())))?;
            }
            Effect::Halt => self.status = Status::Halted,
        }
        Ok(self.status)
    }

    /// One-line dump of the program counter, the next three bytes and all registers.
    pub fn trace(&self) -> String {
        let byte = |addr: usize| self.mem.get(addr).unwrap_or(0);
        let mut line = format!(
            "TRACE: {:02X} | {:02X} {:02X} {:02X} |",
            self.pc,
            byte(self.pc),
            byte(self.pc + 1),
            byte(self.pc + 2)
        );
        for value in self.reg.iter() {
            line.push_str(&format!(" {:02X}", value));
        }
        line
    }

    fn fault_here(&self, kind: FaultKind) -> Fault {
        Fault {
            kind,
            pc: self.pc,
            opcode: self.mem.get(self.pc),
            operands: [self.mem.get(self.pc + 1), self.mem.get(self.pc + 2)],
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_halted(&self) -> bool {
        self.status == Status::Halted
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn sp(&self) -> usize {
        self.sp
    }

    pub fn flag(&self) -> Flag {
        self.flag
    }

    /// Value of register `index`, or `None` if there is no such register.
    pub fn reg(&self, index: u8) -> Option<u8> {
        Register::try_from(index).ok().map(|reg| self.reg[reg])
    }

    pub fn registers(&self) -> &RegisterFile {
        &self.reg
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn skipped(&self) -> &[Skipped] {
        &self.skipped
    }
}

// Instruction handlers, see `Opcode::handler`
impl Machine {
    #[inline]
    fn reg_mut(&mut self, index: u8) -> Result<&mut u8, FaultKind> {
        let reg = Register::try_from(index)?;
        Ok(&mut self.reg[reg])
    }

    #[inline]
    fn reg_value(&self, index: u8) -> Result<u8, FaultKind> {
        let reg = Register::try_from(index)?;
        Ok(self.reg[reg])
    }

    /// Apply `op` to registers `a` and `b`.
    fn alu(&mut self, op: AluOp, a: u8, b: u8) -> HandlerResult {
        let rhs = self.reg_value(b)?;
        self.alu_literal(op, a, rhs)
    }

    /// Apply `op` to register `a` and a literal value.
    fn alu_literal(&mut self, op: AluOp, a: u8, rhs: u8) -> HandlerResult {
        let lhs = self.reg_value(a)?;
        match alu::execute(op, lhs, rhs)? {
            AluResult::Value(value) => *self.reg_mut(a)? = value,
            AluResult::Compare(flag) => self.flag = flag,
        }
        Ok(Effect::Continue)
    }

    fn push_val(&mut self, val: u8) -> Result<(), FaultKind> {
        // Decrement stack
        let sp = self
            .sp
            .checked_sub(1)
            .ok_or(FaultKind::OutOfBounds { address: -1 })?;
        self.mem.write(sp, val)?;
        self.sp = sp;
        Ok(())
    }

    fn pop_val(&mut self) -> Result<u8, FaultKind> {
        let val = self.mem.read(self.sp)?;
        self.sp += 1;
        Ok(val)
    }

    pub(crate) fn ldi(&mut self, a: u8, b: u8) -> HandlerResult {
        *self.reg_mut(a)? = b;
        Ok(Effect::Continue)
    }

    pub(crate) fn add(&mut self, a: u8, b: u8) -> HandlerResult {
        self.alu(AluOp::Add, a, b)
    }

    pub(crate) fn mul(&mut self, a: u8, b: u8) -> HandlerResult {
        self.alu(AluOp::Mul, a, b)
    }

    pub(crate) fn div(&mut self, a: u8, b: u8) -> HandlerResult {
        self.alu(AluOp::Div, a, b)
    }

    pub(crate) fn and(&mut self, a: u8, b: u8) -> HandlerResult {
        self.alu(AluOp::And, a, b)
    }

    pub(crate) fn inc(&mut self, a: u8) -> HandlerResult {
        self.alu_literal(AluOp::Add, a, 1)
    }

    pub(crate) fn dec(&mut self, a: u8) -> HandlerResult {
        self.alu_literal(AluOp::Sub, a, 1)
    }

    pub(crate) fn cmp(&mut self, a: u8, b: u8) -> HandlerResult {
        self.alu(AluOp::Cmp, a, b)
    }

    pub(crate) fn prn(&mut self, a: u8) -> HandlerResult {
        Ok(Effect::Print(self.reg_value(a)?))
    }

    pub(crate) fn push(&mut self, a: u8) -> HandlerResult {
        let val = self.reg_value(a)?;
        self.push_val(val)?;
        Ok(Effect::Continue)
    }

    pub(crate) fn pop(&mut self, a: u8) -> HandlerResult {
        let reg = Register::try_from(a)?;
        let val = self.pop_val()?;
        self.reg[reg] = val;
        Ok(Effect::Continue)
    }

    pub(crate) fn call(&mut self, a: u8) -> HandlerResult {
        let target = self.reg_value(a)?;
        // PC already points past the CALL instruction
        let ret = u8::try_from(self.pc).map_err(|_| FaultKind::OutOfBounds {
            address: self.pc as isize,
        })?;
        self.push_val(ret)?;
        self.pc = target as usize;
        Ok(Effect::Continue)
    }

    pub(crate) fn ret(&mut self) -> HandlerResult {
        self.pc = self.pop_val()? as usize;
        Ok(Effect::Continue)
    }

    pub(crate) fn jmp(&mut self, a: u8) -> HandlerResult {
        self.pc = self.reg_value(a)? as usize;
        Ok(Effect::Continue)
    }

    pub(crate) fn jeq(&mut self, a: u8) -> HandlerResult {
        let target = self.reg_value(a)?;
        if self.flag == Flag::Equal {
            self.pc = target as usize;
        }
        Ok(Effect::Continue)
    }

    pub(crate) fn hlt(&mut self) -> HandlerResult {
        Ok(Effect::Halt)
    }
}
