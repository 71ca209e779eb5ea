//! Line model of one source document.

use std::path::{Path, PathBuf};

/// An immutable snapshot of a document's text with a line index.
///
/// Lines are split on `\n`; a trailing `\r` is stripped from each line. The
/// terminator of every line is kept so a rendered document reproduces the
/// original bytes of the lines it did not edit.
#[derive(Debug, Clone)]
pub struct Document {
    path: PathBuf,
    text: String,
    lines: Vec<String>,
    endings: Vec<&'static str>,
}

/// One line and the terminator that followed it. The last line of a
/// document has an empty ending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    pub ending: &'static str,
}

impl Line {
    pub fn new(text: impl Into<String>, ending: &'static str) -> Self {
        Self {
            text: text.into(),
            ending,
        }
    }
}

impl Document {
    pub fn new(path: impl Into<PathBuf>, text: impl Into<String>) -> Self {
        let text = text.into();
        let mut lines = Vec::new();
        let mut endings = Vec::new();

        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            let last = pieces.peek().is_none();
            let (line, ending) = match piece.strip_suffix('\r') {
                Some(line) if !last => (line, "\r\n"),
                _ if !last => (piece, "\n"),
                Some(line) => (line, "\r"),
                None => (piece, ""),
            };
            lines.push(line.to_string());
            endings.push(ending);
        }

        Self {
            path: path.into(),
            text,
            lines,
            endings,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Text of a 0-based line, without its line ending.
    pub fn line_text(&self, line: usize) -> Option<&str> {
        self.lines.get(line).map(String::as_str)
    }

    /// Terminator that followed a 0-based line in the source.
    pub fn line_ending(&self, line: usize) -> Option<&'static str> {
        self.endings.get(line).copied()
    }

    /// Terminator for text inserted before `line`.
    pub fn ending_before(&self, line: usize) -> &'static str {
        let previous = line.checked_sub(1).and_then(|p| self.line_ending(p));
        insertion_ending(self.line_ending(line), previous)
    }

    /// Lines paired with their original terminators.
    pub fn source_lines(&self) -> Vec<Line> {
        self.lines
            .iter()
            .zip(&self.endings)
            .map(|(text, &ending)| Line::new(text.as_str(), ending))
            .collect()
    }

    /// 0-based line containing the byte `offset`.
    pub fn offset_to_line(&self, offset: usize) -> usize {
        let end = offset.min(self.text.len());
        self.text.as_bytes()[..end]
            .iter()
            .filter(|&&b| b == b'\n')
            .count()
    }
}

/// Ending given to inserted lines: that of the line they land before,
/// falling back to the line above when that one is unterminated.
pub fn insertion_ending(current: Option<&'static str>, previous: Option<&'static str>) -> &'static str {
    [current, previous]
        .into_iter()
        .flatten()
        .find(|ending| ending.ends_with('\n'))
        .unwrap_or("\n")
}

/// Concatenate lines with their own terminators.
pub fn render_lines(lines: &[Line]) -> String {
    let mut out = String::with_capacity(lines.iter().map(|l| l.text.len() + 2).sum());
    for line in lines {
        out.push_str(&line.text);
        out.push_str(line.ending);
    }
    out
}
