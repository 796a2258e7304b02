//! Diagnostic values produced by the lexer and parser.

use crate::position::Position;
use std::fmt;

/// The three diagnostic kinds named by the language. Only [`DiagnosticKind::SyntaxError`]
/// is ever produced by this crate; [`DiagnosticKind::CompileError`] and
/// [`DiagnosticKind::RuntimeError`] are reserved for the compiler and VM collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DiagnosticKind {
    SyntaxError,
    CompileError,
    RuntimeError,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::SyntaxError => "SyntaxError",
            Self::CompileError => "CompileError",
            Self::RuntimeError => "RuntimeError",
        })
    }
}

/// A span-tagged error value.
///
/// The filename starts out empty; the embedding layer sets it after
/// construction, once it knows which file produced the diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    message: String,
    filename: String,
    position: Position,
}

impl Diagnostic {
    #[must_use]
    pub fn new(kind: DiagnosticKind, message: impl Into<String>, position: Position) -> Self {
        Self { kind, message: message.into(), filename: String::new(), position }
    }

    #[must_use]
    pub fn syntax_error(message: impl Into<String>, position: Position) -> Self {
        Self::new(DiagnosticKind::SyntaxError, message, position)
    }

    #[must_use]
    pub const fn kind(&self) -> DiagnosticKind {
        self.kind
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Attaches the source filename. Called by the embedding layer once the
    /// origin of the diagnostic is known.
    pub fn set_filename(&mut self, filename: impl Into<String>) {
        self.filename = filename.into();
    }

    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.set_filename(filename);
        self
    }

    /// Multi-line pretty form: the offending source line, a caret under the
    /// failing column, then the one-line message.
    #[must_use]
    pub fn pretty(&self, source: &str) -> String {
        let line = source_line(source, self.position.line);
        let caret_padding = " ".repeat(self.position.column.saturating_sub(1) as usize);
        format!(
            "  File \"{}\", line {}\n    {}\n    {}^--- here\n{}: {}",
            self.filename, self.position.line, line, caret_padding, self.kind, self.message
        )
    }
}

/// Returns the 1-based `lineno`-th line of `source`, without its terminator.
fn source_line(source: &str, lineno: u32) -> &str {
    source.lines().nth(lineno.saturating_sub(1) as usize).unwrap_or("")
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} in {}:{}:{}",
            self.kind, self.message, self.filename, self.position.line, self.position.column
        )
    }
}

impl std::error::Error for Diagnostic {}
