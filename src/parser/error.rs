use thiserror::Error;

/// Failures raised while turning source text into a program tree.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("duplicate line number {line}")]
    DuplicateLine { line: usize },

    #[error("malformed instruction{}: {detail}", at_line(.line))]
    MalformedInstruction { line: Option<usize>, detail: String },

    #[error("program is not valid JSON: {0}")]
    Syntax(#[from] serde_json::Error),
}

impl CompileError {
    pub(crate) fn malformed(line: Option<usize>, detail: impl Into<String>) -> Self {
        CompileError::MalformedInstruction {
            line,
            detail: detail.into(),
        }
    }
}

fn at_line(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" at line {}", line),
        None => String::new(),
    }
}
