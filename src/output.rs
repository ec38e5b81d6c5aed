use std::cell::RefCell;
use std::str::Chars;

use colored::{ColoredString, Colorize};

use crate::runtime::Machine;

macro_rules! dprintln {
    ( $cond:expr ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        $crate::output::Output::Diagnostic($cond).print_str("\n");
    }};
    ( $cond:expr, $fmt:literal $($tt:tt)* ) => {{
        #[allow(unused_imports)]
        use $crate::output::Condition::*;
        let s = format!(
            concat!($fmt, "\n")
            $($tt)*
        );
        $crate::output::Output::Diagnostic($cond).print_str(&s);
    }};
}

/// Where a message goes. Program output is written by the machine itself.
#[derive(Clone, Copy, Debug)]
pub enum Output {
    /// Stdout
    Normal,
    /// Stderr, coloured unless minimal
    Diagnostic(Condition),
}

/// Whether a diagnostic survives `--minimal`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Always,
    Sometimes,
}

struct Decolored<'a> {
    chars: Chars<'a>,
}

impl Output {
    thread_local! {
        static IS_MINIMAL: RefCell<bool> = const { RefCell::new(false) };
    }

    pub fn set_minimal(new_value: bool) -> bool {
        Self::IS_MINIMAL.with(|value| value.replace(new_value))
    }
    pub fn is_minimal() -> bool {
        Self::IS_MINIMAL.with(|value| *value.borrow())
    }

    pub fn print_str(&self, string: &str) {
        match self {
            Self::Normal => {
                if Self::is_minimal() {
                    print_colorless(string);
                } else {
                    print!("{}", string);
                }
            }
            Self::Diagnostic(condition) => match (Self::is_minimal(), *condition) {
                (false, _) => {
                    eprint!("{}", ColoredString::from(string).blue());
                }
                // Always remove color if `--minimal`
                (true, Condition::Always) => eprint_colorless(string),
                (true, Condition::Sometimes) => (),
            },
        }
    }

    pub fn print_registers(&self, machine: &Machine) {
        if Self::is_minimal() {
            for (i, value) in machine.registers().iter().enumerate() {
                self.print_str(&format!("R{} {}\n", i, value));
            }
            self.print_str(&format!("PC {}\n", machine.pc()));
            self.print_str(&format!("SP {}\n", machine.sp()));
            self.print_str(&format!("FL {:03b}\n", machine.flag() as u8));
            return;
        }

        self.print_str("\x1b[2m┌──────────────────────────┐\x1b[0m\n");
        self.print_str("\x1b[2m│        \x1b[3mhex  uint   bin\x1b[0m\x1b[2m   │\x1b[0m\n");
        for (i, value) in machine.registers().iter().enumerate() {
            self.print_str("\x1b[2m│\x1b[0m");
            self.print_str(&format!(" \x1b[1mR{}\x1b[0m  ", i));
            self.print_str(&format!("0x{:02x}  {:>4}  {:08b}", value, value, value));
            self.print_str(" \x1b[2m│\x1b[0m\n");
        }
        self.print_str("\x1b[2m│\x1b[0m");
        self.print_str(&format!(" \x1b[1mPC\x1b[0m  0x{:02x}", machine.pc()));
        self.print_str(&format!("  \x1b[1mSP\x1b[0m  0x{:02x}", machine.sp()));
        self.print_str(&format!("  \x1b[1mFL\x1b[0m  {:03b}", machine.flag() as u8));
        self.print_str(" \x1b[2m│\x1b[0m\n");
        self.print_str("\x1b[2m└──────────────────────────┘\x1b[0m\n");
    }
}

impl<'a> Decolored<'a> {
    pub fn new(string: &'a str) -> Self {
        Self {
            chars: string.chars(),
        }
    }
}

impl<'a> Iterator for Decolored<'a> {
    type Item = char;
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(ch) = self.chars.next() {
            // Skip everything between '\x1b' and 'm' (inclusive)
            if ch == '\x1b' {
                while self.chars.next().is_some_and(|ch| ch != 'm') {}
                continue;
            }
            return Some(ch);
        }
        None
    }
}

fn eprint_colorless(string: &str) {
    eprint!("{}", Decolored::new(string).collect::<String>());
}

fn print_colorless(string: &str) {
    print!("{}", Decolored::new(string).collect::<String>());
}
