#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::too_many_lines,
    clippy::match_same_arms
)]
//! Source formatter for Dai.
//!
//! [`format`] walks a parsed [`Program`] alongside the [`TokenList`] it was
//! parsed from, re-emitting every token with normalized spacing and
//! indentation, and re-attaching the comments the AST itself doesn't carry
//! (the parser only skips them; their positions live in the token list).
//! This token-driven-walk design, rather than a pure AST pretty-printer,
//! is what lets the formatter reproduce a file's original comments without
//! the AST having to carry trivia.

mod printer;

use dai::{Program, TokenList};
use printer::Printer;

/// Formats `program`, interleaving comments from `tokens`.
///
/// `source_len_hint` sizes the output buffer's initial capacity; passing the
/// original source's byte length avoids most reallocation.
#[must_use]
pub fn format(program: &Program, tokens: &TokenList<'_>, source_len_hint: usize) -> String {
    let mut printer = Printer::new(tokens, source_len_hint);
    printer.run(program);
    printer.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use dai::{parse, tokenize};

    fn format_source(src: &str) -> String {
        let (tokens, lex_err) = tokenize(src);
        assert!(lex_err.is_none(), "{lex_err:?}");
        let (program, parse_err) = parse(tokens.clone());
        assert!(parse_err.is_none(), "{parse_err:?}");
        format(&program, &tokens, src.len())
    }

    #[test]
    fn scenario_2_binds_multiplication_tighter_and_keeps_the_trailing_newline() {
        assert_eq!(format_source("1 + 2 * 3;"), "1 + 2 * 3;\n");
    }

    #[test]
    fn var_statement_gets_single_spaces_around_operators() {
        assert_eq!(format_source("var   five=5;"), "var five = 5;\n");
    }

    #[test]
    fn format_is_idempotent() {
        let once = format_source("var five=5;\nif(five<10){five;}else{five;}\n");
        let (tokens, _) = tokenize(&once);
        let (program, err) = parse(tokens.clone());
        assert!(err.is_none());
        let twice = format(&program, &tokens, once.len());
        assert_eq!(once, twice);
    }

    #[test]
    fn trailing_newline_is_always_added() {
        assert_eq!(format_source("var x = 1;"), "var x = 1;\n");
    }

    #[test]
    fn line_comments_are_preserved_on_their_own_line() {
        let out = format_source("// leading\nvar x = 1;\n");
        assert!(out.starts_with("// leading\n"));
        assert!(out.contains("var x = 1;"));
    }

    #[test]
    fn trailing_line_comment_stays_on_the_same_line() {
        let out = format_source("var x = 1; // trailing\n");
        assert!(out.contains("var x = 1;  // trailing"));
    }
}
