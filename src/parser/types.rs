use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use super::source_map::SourceMap;

/// One argument slot of an instruction: either a nested instruction or a literal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Node {
    Instr(Instruction),
    Literal(Value),
}

/// Normalized `(op, line, args…)` triple produced by the source mapper.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Instruction {
    pub op: String,
    /// `None` for instructions nested inside another one.
    pub line: Option<usize>,
    pub args: Vec<Node>,
}

impl Instruction {
    pub fn new(op: impl Into<String>, line: Option<usize>, args: Vec<Node>) -> Self {
        Self {
            op: op.into(),
            line,
            args,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.op)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Instr(instr) => instr.fmt(f),
            Node::Literal(value) => write!(f, "{}", value),
        }
    }
}

/// Top-level instructions in source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
}

impl Program {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Instruction> {
        self.instructions.get(index)
    }
}

/// Output of compilation: the shared program tree plus its line index.
#[derive(Debug, Clone, Default)]
pub struct Compiled {
    pub program: Rc<Program>,
    pub source_map: SourceMap,
}
