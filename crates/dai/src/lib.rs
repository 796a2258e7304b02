//! # dai
//!
//! Lexer, parser, AST and diagnostics for Dai, a small dynamically-typed
//! scripting language. This crate covers the front end only: source text
//! goes in, a [`ast::Program`] comes out. Compiling the program to
//! bytecode and running it on a VM are deliberately out of scope here —
//! those live downstream of this crate, in a collaborator that consumes
//! [`ast::Program`] values.
//!
//! ```
//! use dai::{parse, tokenize};
//!
//! let (tokens, lex_error) = tokenize("var five = 5;\n");
//! assert!(lex_error.is_none());
//!
//! let (program, parse_error) = parse(tokens);
//! assert!(parse_error.is_none());
//! assert_eq!(program.statements.len(), 1);
//! ```

pub mod ast;
pub mod debug;
pub mod diagnostic;
mod lexer;
mod numeric;
pub mod position;
pub mod token;
pub mod token_list;
mod parser;
mod unicode;

pub use ast::Program;
pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use lexer::tokenize;
pub use parser::parse;
pub use position::{Position, Span};
pub use token::{Token, TokenKind};
pub use token_list::TokenList;

/// Thin text-in wrapper over [`tokenize`] + [`parse`] for callers that have
/// a filename to attach to any diagnostic produced. The tokens-in form
/// ([`tokenize`] then [`parse`]) is the primary entry point; this exists
/// only because the two halves are always used together outside of tests.
#[must_use]
pub fn parse_source<'src>(source: &'src str, filename: &str) -> (Program, Option<Diagnostic>) {
    let (tokens, lex_error) = tokenize(source);
    if let Some(diag) = lex_error {
        return (Program::default(), Some(diag.with_filename(filename)));
    }
    let (program, parse_error) = parse(tokens);
    (program, parse_error.map(|d| d.with_filename(filename)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_an_empty_program() {
        let (program, err) = parse_source("", "<stdin>");
        assert!(err.is_none());
        assert!(program.statements.is_empty());
    }

    #[test]
    fn a_lex_error_carries_the_given_filename() {
        let (_, err) = parse_source("$", "<stdin>");
        assert_eq!(err.unwrap().filename(), "<stdin>");
    }
}
