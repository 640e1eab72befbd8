mod environment;
mod error;
mod ops;
mod vm;

pub use environment::Environment;
pub use error::{Fault, Halt, Location, Outcome, Unwind};
pub use ops::{render, truthy, Handler, Opcode};
pub use vm::{Vm, PRINT_PREFIX};
