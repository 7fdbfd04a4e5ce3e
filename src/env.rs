use std::{cell::RefCell, ffi::OsStr};

#[derive(Clone)]
struct Env {
    trace_enabled: bool,
    memory_size: Option<String>,
}

thread_local! {
    /// Must only be mutated within `set_env`
    static ENV: RefCell<Option<Env>> = const { RefCell::new(None) };
}

/// Read `VCPU_TRACE` and `VCPU_MEMORY`. Must be called once, before any getter.
pub fn init() {
    let value = Env {
        trace_enabled: var_is("VCPU_TRACE", "1"),
        memory_size: std::env::var("VCPU_MEMORY").ok(),
    };
    set_env(value);
}

pub fn is_trace_enabled() -> bool {
    with_env(|env| env.trace_enabled)
}

/// Raw value of `VCPU_MEMORY`, `None` if unset.
pub fn memory_size() -> Option<String> {
    with_env(|env| env.memory_size.clone())
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
        let Some(env) = env.as_ref() else {
            panic!("tried to access environment state before initialization");
        };
        callback(env)
    })
}

fn var_is(name: impl AsRef<OsStr>, value: impl AsRef<str>) -> bool {
    std::env::var(name.as_ref()).is_ok_and(|v| v == value.as_ref())
}
