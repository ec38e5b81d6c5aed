use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone, Copy)]
struct Env {
    strict: bool,
    trace: bool,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read `LS8_*` variables. Call once at start-up.
pub fn init() {
    let value = Env {
        strict: var_is("LS8_STRICT", "1"),
        trace: var_is("LS8_TRACE", "1"),
    };
    set_env(value);
}

/// Unknown opcodes are faults rather than skipped.
pub fn is_strict() -> bool {
    with_env(|env| env.strict)
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace)
}

fn set_env(value: Env) {
    ENV.with(|env| {
        let mut env = env.borrow_mut();
        assert!(
            env.is_none(),
            "tried to initialize environment state multiple times"
        );
        *env = Some(value);
    });
}

fn with_env<F, R>(callback: F) -> R
where
    F: Fn(&Env) -> R,
{
    ENV.with(|env| {
        let env = env.borrow();
        let env = env.unwrap_or_else(|| {
            panic!("tried to access environment state before initialization");
        });
        callback(&env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
