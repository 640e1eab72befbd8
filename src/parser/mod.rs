mod error;
mod source;
mod source_map;
mod types;

pub use error::CompileError;
pub use source::{is_comment, parse_lines, read_source};
pub use source_map::{compile, SourceMap};
pub use types::{Compiled, Instruction, Node, Program};

/// Read-and-compile convenience for already-loaded source lines.
pub fn compile_lines<S: AsRef<str>>(lines: &[S]) -> Result<Compiled, CompileError> {
    compile(&parse_lines(lines)?)
}
