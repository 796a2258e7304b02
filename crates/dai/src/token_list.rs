//! An append-only, randomly-indexable sequence of tokens.

use crate::token::{Token, TokenKind};

/// The result of lexing: every token the lexer produced, terminated by
/// exactly one EOF token.
///
/// Reading past the end of the list is not an error: [`TokenList::next`]
/// keeps returning the terminal EOF token, which lets the parser avoid
/// special-casing the end of input.
#[derive(Debug, Clone)]
pub struct TokenList<'src> {
    tokens: Vec<Token<'src>>,
    cursor: usize,
}

impl<'src> TokenList<'src> {
    #[must_use]
    pub fn new(tokens: Vec<Token<'src>>) -> Self {
        debug_assert!(tokens.last().is_some_and(Token::is_eof), "token list must end in EOF");
        Self { tokens, cursor: 0 }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Random access by absolute index, used by the formatter. Reading past
    /// the end returns the terminal EOF token.
    #[must_use]
    pub fn get(&self, index: usize) -> Token<'src> {
        *self.tokens.get(index).unwrap_or_else(|| self.tokens.last().expect("non-empty"))
    }

    /// All tokens, including the terminal EOF.
    #[must_use]
    pub fn as_slice(&self) -> &[Token<'src>] {
        &self.tokens
    }

    /// The current cursor position (the index [`TokenList::next`] would return).
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Returns the token at the cursor and advances it. Idempotent once the
    /// cursor reaches EOF.
    pub fn next(&mut self) -> Token<'src> {
        let tok = self.get(self.cursor);
        if !tok.is_eof() {
            self.cursor += 1;
        }
        tok
    }

    /// Looks at the token at the cursor without advancing.
    #[must_use]
    pub fn peek(&self) -> Token<'src> {
        self.get(self.cursor)
    }

    /// Looks `n` tokens ahead of the cursor without advancing.
    #[must_use]
    pub fn peek_n(&self, n: usize) -> Token<'src> {
        self.get(self.cursor + n)
    }

    #[must_use]
    pub fn contains_illegal(&self) -> bool {
        self.tokens.iter().any(|t| t.kind == TokenKind::Illegal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::{Position, Span};

    fn eof_at(line: u32, col: u32) -> Token<'static> {
        Token::new(TokenKind::Eof, "", Span::new(Position::new(line, col), Position::new(line, col)))
    }

    #[test]
    fn reading_past_the_end_is_idempotent() {
        let mut list = TokenList::new(vec![eof_at(1, 1)]);
        assert!(list.next().is_eof());
        assert!(list.next().is_eof());
        assert!(list.next().is_eof());
    }

    #[test]
    fn random_access_clamps_to_the_last_token() {
        let list = TokenList::new(vec![eof_at(3, 4)]);
        assert_eq!(list.get(100).span.start.line, 3);
    }
}
