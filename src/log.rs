//! The implementation of the `DYNAREC_LOG*` environment variables.
//!
//! `DYNAREC_LOG=<level>` controls how chatty the compiler is on stderr, where
//! `<level>` is the numeric value of a [Verbosity] variant. `DYNAREC_LOG_IR`
//! dumps IR around compilation phases and must be of the form
//! `<path>:<phase_1>[,...,<phase_n>]`, where `<path>` is a file path or `-`
//! for stderr, and each phase is one of `pre-regalloc` / `post-regalloc`.

use std::{collections::HashSet, env, error::Error, fs::File, io::Write, sync::LazyLock};
use strum::{EnumCount, FromRepr};

/// How verbose should normal logging be?
#[repr(u8)]
#[derive(Copy, Clone, Debug, EnumCount, FromRepr, PartialEq, PartialOrd)]
pub enum Verbosity {
    /// Disable logging entirely.
    Disabled,
    /// Log errors.
    Error,
    /// Log warnings.
    Warning,
    /// Log compilation pass events (e.g. a block's allocation summary).
    PassEvent,
}

static VERBOSITY: LazyLock<Verbosity> = LazyLock::new(|| match env::var("DYNAREC_LOG") {
    Ok(x) => x
        .parse::<u8>()
        .ok()
        .and_then(Verbosity::from_repr)
        .unwrap_or_else(|| panic!("Invalid DYNAREC_LOG level '{x}'")),
    Err(_) => Verbosity::Error,
});

/// Log `msg` to stderr if the current verbosity is at least `level`.
pub fn log(level: Verbosity, msg: &str) {
    debug_assert_ne!(level, Verbosity::Disabled);
    if level <= *VERBOSITY {
        eprintln!("dynarec: {msg}");
    }
}

/// A compilation phase whose IR can be dumped.
#[derive(Eq, Hash, PartialEq)]
pub enum IRPhase {
    /// The block as handed to the register allocator.
    PreRegAlloc,
    /// The block after operand rewriting and load/spill insertion.
    PostRegAlloc,
}

impl IRPhase {
    fn from_str(s: &str) -> Result<Self, Box<dyn Error>> {
        match s {
            "pre-regalloc" => Ok(Self::PreRegAlloc),
            "post-regalloc" => Ok(Self::PostRegAlloc),
            _ => Err(format!("Invalid DYNAREC_LOG_IR phase: {s}").into()),
        }
    }
}

static LOG_IR: LazyLock<Option<(String, HashSet<IRPhase>)>> = LazyLock::new(|| {
    let mut log_phases = HashSet::new();
    if let Ok(x) = env::var("DYNAREC_LOG_IR") {
        match x.split(':').collect::<Vec<_>>().as_slice() {
            [p, phases] => {
                for x in phases.split(',') {
                    log_phases.insert(IRPhase::from_str(x).unwrap());
                }
                if *p != "-" {
                    // If there's an existing log file, truncate it so that later
                    // appends aren't appending to a previous run.
                    File::create(p).ok();
                }
                Some((p.to_string(), log_phases))
            }
            _ => {
                panic!("DYNAREC_LOG_IR must be of the format '<path>:<phase_1>[,...,<phase_n>]'")
            }
        }
    } else {
        None
    }
});

/// Should IR for `phase` be logged?
pub fn should_log_ir(phase: IRPhase) -> bool {
    if let Some(true) = LOG_IR.as_ref().map(|(_, phases)| phases.contains(&phase)) {
        return true;
    }
    false
}

/// Log `s` to the destination named by `DYNAREC_LOG_IR`, if set.
pub fn log_ir(s: &str) {
    match LOG_IR.as_ref().map(|(p, _)| p.as_str()) {
        Some("-") => eprint!("{s}"),
        Some(x) => {
            File::options()
                .append(true)
                .open(x)
                .map(|mut x| x.write(s.as_bytes()))
                .ok();
        }
        None => (),
    }
}
