use super::error::CompileError;
use serde_json::Value;
use std::fs;
use std::io::{self, BufRead};

/// Read program text from a file, or from standard input when `path` is `-`.
pub fn read_source(path: &str) -> io::Result<Vec<String>> {
    if path == "-" {
        io::stdin().lock().lines().collect()
    } else {
        Ok(fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect())
    }
}

/// Is this a line the reader drops before parsing?
pub fn is_comment(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with("//")
}

/// Drop blank and `//` lines, join the rest and parse them as one JSON document.
pub fn parse_lines<S: AsRef<str>>(lines: &[S]) -> Result<Value, CompileError> {
    let text = lines
        .iter()
        .map(|line| line.as_ref().trim())
        .filter(|line| !is_comment(line))
        .collect::<Vec<_>>()
        .join("\n");
    Ok(serde_json::from_str(&text)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn comments_and_blank_lines_are_dropped() {
        let lines = [
            "// print zero",
            "[",
            "   ",
            "  [1, \"print\", [\"num\", 0]]",
            "  // trailing note",
            "]",
        ];
        assert_eq!(parse_lines(&lines).unwrap(), json!([[1, "print", ["num", 0]]]));
    }

    #[test]
    fn invalid_json_is_a_syntax_error() {
        let lines = ["[1, \"print\""];
        assert!(matches!(parse_lines(&lines), Err(CompileError::Syntax(_))));
    }

    #[test]
    fn comment_detection() {
        assert!(is_comment("// hello"));
        assert!(is_comment("   "));
        assert!(!is_comment("[1, \"num\", 1]"));
    }
}
