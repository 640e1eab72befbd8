use std::io::{self, BufRead, StdinLock, Stdout, Write};

/// Text channel between a paused debugger and the person (or script) driving it.
pub trait Console {
    /// Show `prompt` and block for one line. `None` once input is exhausted.
    fn input(&mut self, prompt: &str) -> Option<String>;

    /// One line of transcript output: program prints and command replies.
    fn output(&mut self, text: &str);

    /// Out-of-band status lines, such as the final run status.
    fn status(&mut self, text: &str);
}

/// Console over a reader/writer pair; status lines go to stderr.
pub struct StdConsole<R, W> {
    reader: R,
    writer: W,
}

impl StdConsole<StdinLock<'static>, Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> StdConsole<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    pub fn into_parts(self) -> (R, W) {
        (self.reader, self.writer)
    }
}

impl<R: BufRead, W: Write> Console for StdConsole<R, W> {
    fn input(&mut self, prompt: &str) -> Option<String> {
        if let Err(err) = write!(self.writer, "{}", prompt).and_then(|_| self.writer.flush()) {
            tracing::warn!(%err, "failed to write prompt");
        }

        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches(['\r', '\n']).to_string()),
            Err(err) => {
                tracing::warn!(%err, "failed to read debugger input");
                None
            }
        }
    }

    fn output(&mut self, text: &str) {
        if let Err(err) = writeln!(self.writer, "{}", text) {
            tracing::warn!(%err, "failed to write output");
        }
    }

    fn status(&mut self, text: &str) {
        eprintln!("{}", text);
    }
}
