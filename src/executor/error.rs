use std::fmt;
use thiserror::Error;

/// Request to stop execution now. Not a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Halt;

/// Where a fault happened: a source line, or a nested instruction without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location(pub Option<usize>);

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(line) => write!(f, "line {}", line),
            None => write!(f, "nested instruction"),
        }
    }
}

/// Execution failures. Fatal to the current run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Fault {
    #[error("unknown op \"{op}\" at {at}")]
    UnknownOpcode { op: String, at: Location },

    #[error("badly-formatted operation {op} at {at}: {detail}")]
    BadlyFormatted {
        op: &'static str,
        at: Location,
        detail: String,
    },

    #[error("unknown name \"{name}\" for operation \"{op}\" at {at}")]
    UnknownName {
        op: &'static str,
        name: String,
        at: Location,
    },

    #[error("variable \"{name}\" used in \"{op}\" is not an array at {at}")]
    NotArray {
        op: &'static str,
        name: String,
        at: Location,
    },

    #[error("index {index} out of bounds for array \"{name}\" at {at}")]
    IndexOutOfBounds {
        name: String,
        index: String,
        at: Location,
    },

    #[error("operation \"{op}\" expected {expected}, found {found} at {at}")]
    TypeMismatch {
        op: &'static str,
        expected: &'static str,
        found: String,
        at: Location,
    },
}

/// How a run ended when it did not fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Halted,
}

/// Everything that unwinds through `exec`. Split apart again at the top of `run`.
#[derive(Debug, Clone, PartialEq)]
pub enum Unwind {
    Halt(Halt),
    Fault(Fault),
}

impl From<Halt> for Unwind {
    fn from(halt: Halt) -> Self {
        Unwind::Halt(halt)
    }
}

impl From<Fault> for Unwind {
    fn from(fault: Fault) -> Self {
        Unwind::Fault(fault)
    }
}
