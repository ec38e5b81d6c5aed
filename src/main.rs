use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, IntoDiagnostic, Result};

use ls8::disasm;
use ls8::error::fault_report;
use ls8::{Condition, Machine, Output, RunOptions, Skipped, UnknownOpcodePolicy};

/// ls8 is an interpreter and toolchain for the LS-8 8-bit virtual machine.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.ls8` file to run
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run text `.ls8` or binary `.bin` program and output to terminal
    Run {
        /// `.ls8` or `.bin` file to run
        name: PathBuf,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Print machine state before every instruction
        #[arg(short, long)]
        trace: bool,
        /// Stop on unknown instructions instead of skipping them
        #[arg(short, long)]
        strict: bool,
        /// Stop after this many instructions
        #[arg(long, value_name = "N")]
        max_steps: Option<u64>,
        /// Print registers after the program halts
        #[arg(short, long)]
        registers: bool,
    },
    /// Check a program and print its disassembly without running it
    Check {
        /// `.ls8` or `.bin` file to check
        name: PathBuf,
    },
    /// Create binary `.bin` file from a text `.ls8` program
    Compile {
        /// `.ls8` file to compile
        name: PathBuf,
        /// Destination to output `.bin` file
        dest: Option<PathBuf>,
    },
}

fn main() -> miette::Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    ls8::env::init();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(ls8::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                minimal,
                trace,
                strict,
                max_steps,
                registers,
            } => {
                let options = RunOptions {
                    unknown_opcode: if strict || ls8::env::is_strict() {
                        UnknownOpcodePolicy::Fault
                    } else {
                        UnknownOpcodePolicy::Skip
                    },
                    trace: trace || ls8::env::is_trace_enabled(),
                    max_steps,
                };
                run(&name, options, minimal, registers)
            }
            Command::Check { name } => {
                file_message(Green, "Checking", &name);
                let program = load(&name)?;
                let lines = disasm::disassemble(&program);
                for line in &lines {
                    println!("{line}");
                }
                let unknown = lines.iter().filter(|line| line.opcode.is_none()).count();
                if unknown > 0 {
                    message(Red, "Warning", &format!("{unknown} unknown instruction(s)"));
                }
                if lines.last().is_some_and(|line| line.is_truncated()) {
                    message(Red, "Warning", "last instruction is missing operands");
                }
                message(Green, "Success", &format!("{} bytes", program.len()));
                Ok(())
            }
            Command::Compile { name, dest } => {
                file_message(Green, "Assembling", &name);
                let src = fs::read_to_string(&name).into_diagnostic()?;
                let program = ls8::parser::parse(&src)?;

                let out_file_name = match dest {
                    Some(dest) => dest,
                    None => name.with_extension("bin"),
                };
                fs::write(&out_file_name, &program).into_diagnostic()?;

                message(Green, "Finished", "emit binary");
                file_message(Green, "Saved", &out_file_name);
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        run(&path, RunOptions::default(), false, false)
    } else {
        println!("\n~ ls8 v{VERSION} ~");
        println!("{SHORT_INFO}");
        Ok(())
    }
}

enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

fn message(color: MsgColor, left: &str, right: &str) {
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(name: &Path, options: RunOptions, minimal: bool, registers: bool) -> Result<()> {
    Output::set_minimal(minimal);

    file_message(MsgColor::Green, "Loading", name);
    let program = load(name)?;
    let mut machine = Machine::with_options(&program, options).map_err(|e| fault_report(&e))?;

    message(MsgColor::Green, "Running", &format!("{} bytes", program.len()));
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let result = machine.run(&mut out);
    out.flush().into_diagnostic()?;
    drop(out);

    report_skipped(&machine);
    if registers {
        Output::Normal.print_registers(&machine);
    }
    match result {
        Ok(summary) => {
            message(
                MsgColor::Cyan,
                "Halted",
                &format!("after {} instructions", summary.steps),
            );
            file_message(MsgColor::Green, "Completed", name);
            Ok(())
        }
        Err(fault) => {
            message(MsgColor::Red, "Faulted", &format!("at {:#04x}", fault.pc));
            Err(fault_report(&fault))
        }
    }
}

fn report_skipped(machine: &Machine) {
    let skipped = machine.skipped();
    if skipped.is_empty() {
        return;
    }
    for Skipped { pc, opcode } in skipped {
        Output::Diagnostic(Condition::Always).print_str(&format!(
            "Unknown instruction: {opcode} at {pc:#04x}\n"
        ));
    }
    Output::Diagnostic(Condition::Sometimes).print_str(&format!(
        "Skipped {} unknown instruction(s)\n",
        skipped.len()
    ));
}

/// Read a program image, parsing text `.ls8` files.
fn load(name: &Path) -> Result<Vec<u8>> {
    let Some(ext) = name.extension() else {
        bail!("File has no extension. Exiting...");
    };
    match ext.to_str() {
        Some("ls8") => {
            let src = fs::read_to_string(name).into_diagnostic()?;
            ls8::parser::parse(&src)
        }
        Some("bin") => fs::read(name).into_diagnostic(),
        _ => bail!("File has unknown extension. Exiting..."),
    }
}

const SHORT_INFO: &str = r"
Welcome to ls8, an interpreter and toolchain for the LS-8 8-bit virtual machine.
Please use `-h` or `--help` to access the usage instructions and documentation.
";

const VERSION: &str = env!("CARGO_PKG_VERSION");
