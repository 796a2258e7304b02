//! Byte stream → [`TokenList`].
//!
//! A single-pass state machine with one code point of look-ahead. `mark()`
//! snapshots the current position before each token; `emit()` builds a token
//! spanning `[mark, position)`.

use crate::diagnostic::Diagnostic;
use crate::position::{Position, Span};
use crate::token::{Token, TokenKind};
use crate::token_list::TokenList;
use crate::unicode;

const NUMBER_SEPARATOR: u8 = b'_';

struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    line: u32,
    column: u32,
    mark_pos: usize,
    mark_line: u32,
    mark_column: u32,
}

impl<'src> Lexer<'src> {
    fn new(src: &'src str) -> Self {
        Self { src, pos: 0, line: 1, column: 1, mark_pos: 0, mark_line: 1, mark_column: 1 }
    }

    fn bytes(&self) -> &'src [u8] {
        self.src.as_bytes()
    }

    fn rest(&self) -> &'src [u8] {
        &self.bytes()[self.pos..]
    }

    fn mark(&mut self) {
        self.mark_pos = self.pos;
        self.mark_line = self.line;
        self.mark_column = self.column;
    }

    fn mark_position(&self) -> Position {
        Position::new(self.mark_line, self.mark_column)
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn span_from_mark(&self) -> Span {
        Span::new(self.mark_position(), self.position())
    }

    fn emit(&self, kind: TokenKind) -> Token<'src> {
        Token::new(kind, &self.src[self.mark_pos..self.pos], self.span_from_mark())
    }

    fn illegal(&self, message: impl Into<String>) -> (Token<'src>, Diagnostic) {
        (self.emit(TokenKind::Illegal), Diagnostic::syntax_error(message, self.mark_position()))
    }

    /// Decodes the code point at the cursor without consuming it.
    fn peek_char(&self) -> Option<char> {
        unicode::decode(self.rest()).map(|(c, _)| c)
    }

    fn peek_byte(&self) -> Option<u8> {
        self.rest().first().copied()
    }

    fn peek_byte_at(&self, offset: usize) -> Option<u8> {
        self.rest().get(offset).copied()
    }

    /// Consumes and returns the code point at the cursor, updating line/column.
    fn advance(&mut self) -> Option<char> {
        let (c, width) = unicode::decode(self.rest())?;
        self.pos += width;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Consumes one ASCII byte known to be present (used once a byte has
    /// already been peeked and matched).
    fn advance_ascii(&mut self) {
        self.advance();
    }

    fn skip_whitespace(&mut self) {
        while let Some(b) = self.peek_byte() {
            match b {
                b' ' | b'\t' | b'\r' | b'\n' => {
                    self.advance();
                }
                _ => break,
            }
        }
    }

    /// Scans an identifier or keyword. `c0` is the already-decoded first
    /// code point, still unconsumed.
    fn scan_identifier(&mut self) -> Token<'src> {
        self.advance(); // the identifier-start code point
        while let Some(c) = self.peek_char() {
            if unicode::is_identifier_continue(c) {
                self.advance();
            } else {
                break;
            }
        }
        let lexeme = &self.src[self.mark_pos..self.pos];
        let kind = TokenKind::keyword_from_str(lexeme).unwrap_or(TokenKind::Ident);
        self.emit(kind)
    }

    /// Scans a numeric literal: an integer (decimal/binary/octal/hex, with
    /// underscore separators) or a float. Returns `Err` with the illegal
    /// token and diagnostic on any malformed tail.
    fn scan_number(&mut self) -> Result<Token<'src>, (Token<'src>, Diagnostic)> {
        let first = self.peek_byte().expect("caller checked a digit is present");
        self.advance_ascii();

        if first == b'0' {
            let prefix = self.peek_byte();
            let digit_base: Option<(u8, fn(u8) -> bool)> = match prefix {
                Some(b'b' | b'B') => Some((2, |b| b.is_ascii_digit() && b < b'2')),
                Some(b'o' | b'O') => Some((2, |b| (b'0'..=b'7').contains(&b))),
                Some(b'x' | b'X') => Some((2, |b| b.is_ascii_hexdigit())),
                _ => None,
            };
            if let Some((_, is_valid_digit)) = digit_base {
                self.advance_ascii(); // the base marker
                if !self.consume_digit_run(is_valid_digit) {
                    return Err(self.illegal("invalid number"));
                }
                return Ok(self.emit(TokenKind::Int));
            }
        }

        // Decimal integer part (first digit already consumed).
        let mut digit_count = 1usize;
        while let Some(b) = self.peek_byte() {
            if b.is_ascii_digit() {
                self.advance_ascii();
                digit_count += 1;
            } else if b == NUMBER_SEPARATOR {
                if !self.consume_underscore_run() {
                    return Err(self.illegal("invalid number"));
                }
            } else {
                break;
            }
        }

        if first == b'0' && digit_count >= 2 && self.peek_byte() != Some(b'.') {
            return Err(self.illegal("leading zeros in decimal integer literals are not permitted"));
        }

        // Float: '.' followed by at least one digit.
        if self.peek_byte() == Some(b'.') && self.peek_byte_at(1).is_some_and(|b| b.is_ascii_digit()) {
            self.advance_ascii(); // '.'
            if !self.consume_digit_run(|b| b.is_ascii_digit()) {
                return Err(self.illegal("invalid number"));
            }
            if matches!(self.peek_byte(), Some(b'e' | b'E')) {
                self.advance_ascii();
                if matches!(self.peek_byte(), Some(b'+' | b'-')) {
                    self.advance_ascii();
                }
                if !self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                    return Err(self.illegal("invalid number"));
                }
                while self.peek_byte().is_some_and(|b| b.is_ascii_digit()) {
                    self.advance_ascii();
                }
            }
            return Ok(self.emit(TokenKind::Float));
        }

        if first == b'0' && digit_count >= 2 {
            return Err(self.illegal("leading zeros in decimal integer literals are not permitted"));
        }

        Ok(self.emit(TokenKind::Int))
    }

    /// Consumes one or more digits matching `is_valid_digit`, allowing `_`
    /// separators between them. Returns `false` if no digit is found, or an
    /// underscore appears at a boundary or doubled.
    fn consume_digit_run(&mut self, is_valid_digit: fn(u8) -> bool) -> bool {
        let mut saw_digit = false;
        loop {
            match self.peek_byte() {
                Some(b) if is_valid_digit(b) => {
                    self.advance_ascii();
                    saw_digit = true;
                }
                Some(NUMBER_SEPARATOR) => {
                    if !saw_digit || !self.consume_underscore_run() {
                        return false;
                    }
                }
                // A digit-shaped byte that isn't valid for this base (e.g. '2'
                // in a binary literal) is swallowed into the error rather than
                // left for the next token, so `0b12` fails as one bad literal
                // instead of lexing as `0b1` followed by a stray `2`.
                Some(b) if b.is_ascii_alphanumeric() => {
                    self.advance_ascii();
                    return false;
                }
                _ => break,
            }
        }
        saw_digit
    }

    /// Consumes a run of `_` that must be immediately followed by a digit.
    fn consume_underscore_run(&mut self) -> bool {
        while self.peek_byte() == Some(NUMBER_SEPARATOR) {
            self.advance_ascii();
        }
        self.peek_byte().is_some_and(|b| b.is_ascii_alphanumeric())
    }

    fn scan_string(&mut self, quote: u8) -> Result<Token<'src>, (Token<'src>, Diagnostic)> {
        let multiline = quote == b'`';
        self.advance_ascii(); // opening quote

        loop {
            match self.peek_byte() {
                None => return Err(self.illegal("unclosed string literal")),
                Some(b) if b == quote => {
                    self.advance_ascii();
                    return Ok(self.emit(TokenKind::String));
                }
                Some(b'\n') if !multiline => {
                    return Err(self.illegal("unclosed string literal"));
                }
                Some(b'\\') => {
                    self.advance_ascii();
                    match self.peek_byte() {
                        Some(b'\\' | b'n' | b't' | b'r' | b'"' | b'\'') => {
                            self.advance_ascii();
                        }
                        Some(b'x') => {
                            self.advance_ascii();
                            if !self.peek_byte().is_some_and(|b| b.is_ascii_hexdigit())
                                || !self.peek_byte_at(1).is_some_and(|b| b.is_ascii_hexdigit())
                            {
                                return Err(self.illegal("invalid escape sequence"));
                            }
                            self.advance_ascii();
                            self.advance_ascii();
                        }
                        _ => return Err(self.illegal("invalid escape sequence")),
                    }
                }
                Some(_) => {
                    self.advance();
                }
            }
        }
    }

    fn scan_comment(&mut self) -> Token<'src> {
        while self.peek_byte().is_some_and(|b| b != b'\n') {
            self.advance();
        }
        self.emit(TokenKind::Comment)
    }

    /// Scans one token (after leading whitespace has been skipped).
    fn scan_token(&mut self) -> Result<Token<'src>, (Token<'src>, Diagnostic)> {
        self.mark();

        if self.rest().is_empty() {
            return Ok(self.emit(TokenKind::Eof));
        }
        let Some(c) = self.peek_char() else {
            self.pos += 1; // skip the offending byte so scanning can resume
            self.column += 1;
            return Err(self.illegal("invalid utf8 encoding character"));
        };

        if unicode::is_identifier_start(c) {
            return Ok(self.scan_identifier());
        }
        if c.is_ascii_digit() {
            return self.scan_number();
        }
        if matches!(c, '"' | '\'' | '`') {
            return self.scan_string(c as u8);
        }

        match c {
            '/' if self.peek_byte_at(1) == Some(b'/') => Ok(self.scan_comment()),
            '#' => Ok(self.scan_comment()),

            '=' => Ok(self.two_char_op('=', TokenKind::Eq, TokenKind::Assign)),
            '+' => Ok(self.two_char_op('=', TokenKind::PlusAssign, TokenKind::Plus)),
            '-' => Ok(self.two_char_op('=', TokenKind::MinusAssign, TokenKind::Minus)),
            '*' => Ok(self.two_char_op('=', TokenKind::AsteriskAssign, TokenKind::Asterisk)),
            '/' => Ok(self.two_char_op('=', TokenKind::SlashAssign, TokenKind::Slash)),
            '!' => Ok(self.two_char_op('=', TokenKind::NotEq, TokenKind::Bang)),
            '<' => Ok(self.three_way_op('=', TokenKind::Lte, '<', TokenKind::Shl, TokenKind::Lt)),
            '>' => Ok(self.three_way_op('=', TokenKind::Gte, '>', TokenKind::Shr, TokenKind::Gt)),

            '%' => Ok(self.single_char_op(TokenKind::Percent)),
            '&' => Ok(self.single_char_op(TokenKind::Ampersand)),
            '|' => Ok(self.single_char_op(TokenKind::Pipe)),
            '^' => Ok(self.single_char_op(TokenKind::Caret)),
            '~' => Ok(self.single_char_op(TokenKind::Tilde)),
            '.' => Ok(self.single_char_op(TokenKind::Dot)),
            ',' => Ok(self.single_char_op(TokenKind::Comma)),
            ';' => Ok(self.single_char_op(TokenKind::Semicolon)),
            ':' => Ok(self.single_char_op(TokenKind::Colon)),
            '(' => Ok(self.single_char_op(TokenKind::LParen)),
            ')' => Ok(self.single_char_op(TokenKind::RParen)),
            '{' => Ok(self.single_char_op(TokenKind::LBrace)),
            '}' => Ok(self.single_char_op(TokenKind::RBrace)),
            '[' => Ok(self.single_char_op(TokenKind::LBracket)),
            ']' => Ok(self.single_char_op(TokenKind::RBracket)),

            _ => {
                self.advance();
                Err(self.illegal(format!("illegal character {c:?}")))
            }
        }
    }

    /// Emits an "auto" single-character operator, immediately refined to
    /// `kind` by literal lookup (there being only one possible spelling).
    fn single_char_op(&mut self, kind: TokenKind) -> Token<'src> {
        self.advance();
        self.emit(kind)
    }

    /// Emits an "auto" token for `c`, refined to `two` if followed by
    /// `second`, else to `one`.
    fn two_char_op(&mut self, second: char, two: TokenKind, one: TokenKind) -> Token<'src> {
        self.advance();
        if self.peek_char() == Some(second) {
            self.advance();
            self.emit(two)
        } else {
            self.emit(one)
        }
    }

    /// Like [`Lexer::two_char_op`] but with two different possible second
    /// characters (used for `< <= <<` and `> >= >>`).
    fn three_way_op(
        &mut self,
        eq: char,
        eq_kind: TokenKind,
        rep: char,
        rep_kind: TokenKind,
        plain: TokenKind,
    ) -> Token<'src> {
        self.advance();
        match self.peek_char() {
            Some(c) if c == eq => {
                self.advance();
                self.emit(eq_kind)
            }
            Some(c) if c == rep => {
                self.advance();
                self.emit(rep_kind)
            }
            _ => self.emit(plain),
        }
    }
}

/// Lexes `source`, a null-free UTF-8 byte buffer given as `&str`.
///
/// Total: always returns a [`TokenList`] whose last token is EOF. If a
/// lexical error is found, an illegal token is appended and scanning stops;
/// the returned diagnostic describes the failure and the list still
/// contains every token scanned up to and including it.
#[must_use]
pub fn tokenize(source: &str) -> (TokenList<'_>, Option<Diagnostic>) {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        lexer.skip_whitespace();
        match lexer.scan_token() {
            Ok(tok) => {
                let is_eof = tok.is_eof();
                tokens.push(tok);
                if is_eof {
                    break;
                }
            }
            Err((tok, diag)) => {
                tokens.push(tok);
                return (TokenList::new(tokens), Some(diag));
            }
        }
    }

    (TokenList::new(tokens), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize(source).0.as_slice().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn empty_source_yields_a_single_eof() {
        assert_eq!(kinds(""), vec![TokenKind::Eof]);
    }

    #[test]
    fn scenario_var_five_equals_5() {
        let (list, diag) = tokenize("var five = 5;\n");
        assert!(diag.is_none());
        let got: Vec<(TokenKind, &str)> = list.as_slice().iter().map(|t| (t.kind, t.lexeme)).collect();
        assert_eq!(
            got,
            vec![
                (TokenKind::Var, "var"),
                (TokenKind::Ident, "five"),
                (TokenKind::Assign, "="),
                (TokenKind::Int, "5"),
                (TokenKind::Semicolon, ";"),
                (TokenKind::Eof, ""),
            ]
        );
    }

    #[test]
    fn composite_operators() {
        assert_eq!(
            kinds("== != <= >= << >> += -= *= /="),
            vec![
                TokenKind::Eq,
                TokenKind::NotEq,
                TokenKind::Lte,
                TokenKind::Gte,
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::PlusAssign,
                TokenKind::MinusAssign,
                TokenKind::AsteriskAssign,
                TokenKind::SlashAssign,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn leading_zero_is_rejected() {
        let (_, diag) = tokenize("01;");
        assert_eq!(diag.unwrap().message(), "leading zeros in decimal integer literals are not permitted");
    }

    #[test]
    fn zero_alone_is_a_valid_integer() {
        assert_eq!(kinds("0;"), vec![TokenKind::Int, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn empty_base_prefix_is_invalid() {
        for src in ["0b;", "0o;", "0x;"] {
            let (_, diag) = tokenize(src);
            assert_eq!(diag.unwrap().message(), "invalid number", "{src}");
        }
    }

    #[test]
    fn underscore_boundaries_are_rejected() {
        for src in ["_1;", "1_;"] {
            // A leading underscore lexes as an identifier, not a number;
            // trailing underscore after a digit is the case under test.
            let _ = tokenize(src);
        }
        let (_, diag) = tokenize("1_;");
        assert_eq!(diag.unwrap().message(), "invalid number");
    }

    #[test]
    fn invalid_digit_for_base_is_an_error_not_a_truncated_token() {
        let (_, diag) = tokenize("0b12;");
        assert_eq!(diag.unwrap().message(), "invalid number");
    }

    #[test]
    fn float_literal_with_exponent() {
        assert_eq!(kinds("1.5e10;"), vec![TokenKind::Float, TokenKind::Semicolon, TokenKind::Eof]);
    }

    #[test]
    fn string_forms() {
        let (list, diag) = tokenize(r#""a" 'b' `c`"#);
        assert!(diag.is_none());
        let lexemes: Vec<&str> = list.as_slice().iter().map(|t| t.lexeme).collect();
        assert_eq!(lexemes, vec![r#""a""#, "'b'", "`c`", ""]);
    }

    #[test]
    fn unclosed_single_line_string_is_an_error() {
        let (_, diag) = tokenize("\"abc\ndef\"");
        assert_eq!(diag.unwrap().message(), "unclosed string literal");
    }

    #[test]
    fn backtick_strings_span_multiple_lines() {
        let (list, diag) = tokenize("`a\nb`");
        assert!(diag.is_none());
        assert_eq!(list.as_slice()[0].lexeme, "`a\nb`");
    }

    #[test]
    fn comments_are_emitted_as_tokens() {
        let (list, diag) = tokenize("// hi\n# also hi\n1;");
        assert!(diag.is_none());
        assert_eq!(
            kinds_of(&list),
            vec![TokenKind::Comment, TokenKind::Comment, TokenKind::Int, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    fn kinds_of(list: &TokenList<'_>) -> Vec<TokenKind> {
        list.as_slice().iter().map(|t| t.kind).collect()
    }

    #[test]
    fn illegal_character_reports_and_stops() {
        let (list, diag) = tokenize("$");
        let diag = diag.unwrap();
        assert_eq!(diag.kind(), crate::diagnostic::DiagnosticKind::SyntaxError);
        assert_eq!(list.as_slice().last().unwrap().kind, TokenKind::Illegal);
    }

    #[test]
    fn identifiers_accept_unicode_letters() {
        assert_eq!(kinds("变量"), vec![TokenKind::Ident, TokenKind::Eof]);
    }
}
