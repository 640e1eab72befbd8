use super::error::CompileError;
use super::types::{Compiled, Instruction, Node, Program};
use serde_json::Value;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Line number → the instruction that occupies that line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    lines: BTreeMap<usize, Instruction>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, line: usize) -> Option<&Instruction> {
        self.lines.get(&line)
    }

    pub fn contains(&self, line: usize) -> bool {
        self.lines.contains_key(&line)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Line numbers in ascending order.
    pub fn lines(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &Instruction)> {
        self.lines.iter().map(|(line, instr)| (*line, instr))
    }

    /// The mapped lines surrounding `line`: up to `radius` entries on each side plus `line` itself.
    pub fn context(&self, line: usize, radius: usize) -> Vec<(usize, &Instruction)> {
        let before: Vec<_> = self.lines.range(..line).rev().take(radius).collect();
        let mut out: Vec<(usize, &Instruction)> =
            before.into_iter().rev().map(|(n, i)| (*n, i)).collect();
        out.extend(
            self.lines
                .range(line..)
                .take(radius + 1)
                .map(|(n, i)| (*n, i)),
        );
        out
    }

    fn register(&mut self, instr: &Instruction) -> Result<(), CompileError> {
        let Some(line) = instr.line else {
            return Ok(());
        };
        if self.lines.contains_key(&line) {
            return Err(CompileError::DuplicateLine { line });
        }
        self.lines.insert(line, instr.clone());
        Ok(())
    }
}

/// Compile a raw nested-array program into a normalized tree plus source map.
pub fn compile(raw: &Value) -> Result<Compiled, CompileError> {
    let Value::Array(entries) = raw else {
        return Err(CompileError::malformed(None, "program must be a list of instructions"));
    };

    let mut source_map = SourceMap::new();
    let mut instructions = Vec::with_capacity(entries.len());
    for entry in entries {
        match transform(entry, &mut source_map)? {
            Node::Instr(instr) => instructions.push(instr),
            Node::Literal(value) => {
                return Err(CompileError::malformed(
                    None,
                    format!("top-level entry {} is not an instruction", value),
                ))
            }
        }
    }

    tracing::debug!(
        instructions = instructions.len(),
        mapped_lines = source_map.len(),
        "compiled program"
    );

    Ok(Compiled {
        program: Rc::new(Program { instructions }),
        source_map,
    })
}

fn transform(node: &Value, source_map: &mut SourceMap) -> Result<Node, CompileError> {
    let Value::Array(items) = node else {
        return Ok(Node::Literal(node.clone()));
    };
    let Some((first, rest)) = items.split_first() else {
        return Ok(Node::Literal(Value::Array(Vec::new())));
    };

    match first {
        Value::String(op) => {
            let args = transform_all(rest, source_map)?;
            Ok(Node::Instr(Instruction::new(op.as_str(), None, args)))
        }
        Value::Number(number) => {
            let line = number
                .as_u64()
                .filter(|n| *n > 0)
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| {
                    CompileError::malformed(
                        None,
                        format!("line marker {} is not a positive integer", number),
                    )
                })?;
            let op = match rest.first() {
                Some(Value::String(op)) => op.as_str(),
                Some(other) => {
                    return Err(CompileError::malformed(
                        Some(line),
                        format!("opcode {} is not a name", other),
                    ))
                }
                None => return Err(CompileError::malformed(Some(line), "missing opcode")),
            };
            let args = transform_all(&rest[1..], source_map)?;
            let instr = Instruction::new(op, Some(line), args);
            source_map.register(&instr)?;
            Ok(Node::Instr(instr))
        }
        other => Err(CompileError::malformed(
            None,
            format!("instruction cannot start with {}", other),
        )),
    }
}

fn transform_all(nodes: &[Value], source_map: &mut SourceMap) -> Result<Vec<Node>, CompileError> {
    nodes.iter().map(|n| transform(n, source_map)).collect()
}
