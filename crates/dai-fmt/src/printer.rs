//! Token-driven printer: walks the [`Program`] in parallel with the
//! [`TokenList`] it came from, printing every token it passes over and
//! interleaving any comments found between them.

use dai::ast::{BlockStmt, ClassDeclStmt, Expr, ForInStmt, IfStmt, Param, Stmt, WhileStmt};
use dai::{Program, Token, TokenKind, TokenList};

const INDENT_SIZE: usize = 4;

pub struct Printer<'src> {
    out: String,
    indent_level: usize,
    tokens: &'src TokenList<'src>,
    /// Index of the last token this printer has emitted. `None` before the
    /// first token is printed.
    last_index: Option<usize>,
    first_statement: bool,
}

impl<'src> Printer<'src> {
    pub fn new(tokens: &'src TokenList<'src>, source_len_hint: usize) -> Self {
        Self {
            out: String::with_capacity(source_len_hint + 32),
            indent_level: 0,
            tokens,
            last_index: None,
            first_statement: true,
        }
    }

    pub fn finish(mut self) -> String {
        self.append_endline();
        self.out
    }

    // -- low-level output -------------------------------------------------

    fn last_char(&self) -> Option<char> {
        self.out.chars().next_back()
    }

    fn append_endline(&mut self) {
        if self.last_char() != Some('\n') {
            self.out.push('\n');
        }
    }

    fn append_space(&mut self) {
        if !matches!(self.last_char(), Some(' ' | '\n') | None) {
            self.out.push(' ');
        }
    }

    fn write_str(&mut self, s: &str) {
        if s.is_empty() {
            return;
        }
        if self.last_char() == Some('\n') && self.indent_level > 0 {
            for _ in 0..self.indent_level {
                self.out.push_str(&" ".repeat(INDENT_SIZE));
            }
        }
        self.out.push_str(s);
    }

    fn write_newlines(&mut self, n: usize) {
        for _ in 0..n {
            self.write_str("\n");
        }
    }

    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level -= 1;
    }

    // -- token plumbing -----------------------------------------------------

    fn token_at(&self, index: usize) -> Token<'src> {
        self.tokens.get(index)
    }

    /// Prints the token at `index` verbatim and records it as the last one
    /// printed. A trailing newline follows a comment token, matching how
    /// comments always occupy their own line in the source.
    fn print_token(&mut self, index: usize) {
        self.last_index = Some(index);
        let tok = self.token_at(index);
        if tok.is_eof() {
            return;
        }
        self.write_str(tok.lexeme);
        if tok.kind == TokenKind::Comment {
            self.write_newlines(1);
        }
    }

    fn print_next_token(&mut self) {
        let index = self.last_index.map_or(0, |i| i + 1);
        self.print_token(index);
    }

    fn peek_next_token(&self) -> Token<'src> {
        let index = self.last_index.map_or(0, |i| i + 1);
        self.token_at(index)
    }

    fn next_token_is(&self, kind: TokenKind) -> bool {
        self.peek_next_token().kind == kind
    }

    /// Flushes any comment tokens immediately after the last printed token.
    fn print_comments(&mut self) {
        let Some(last) = self.last_index else { return };
        let prev_line = self.token_at(last).span.start.line;
        let mut index = last + 1;
        let mut tok = self.token_at(index);
        if tok.kind != TokenKind::Comment {
            return;
        }
        if tok.span.start.line == prev_line {
            self.write_str("  ");
        } else {
            self.write_newlines(1);
        }
        let mut prev_line = prev_line;
        while tok.kind == TokenKind::Comment {
            if tok.span.start.line > prev_line + 1 {
                self.write_newlines(1);
            }
            self.print_token(index);
            prev_line = tok.span.start.line;
            index += 1;
            tok = self.token_at(index);
        }
    }

    fn print_token_with_comment(&mut self, index: usize) {
        self.print_token(index);
        self.print_comments();
    }

    fn print_next_token_with_comment(&mut self) {
        self.print_next_token();
        self.print_comments();
    }

    /// Omits a stray `;` immediately after a block-bodied statement's
    /// closing `}`, by advancing past it without printing it. `last_token`
    /// is the `}` itself, already printed; the semicolon in question (if
    /// any) is the *next* token, not the one before `last_token` (which is
    /// the body's own last statement terminator, already consumed).
    fn skip_end_semicolon(&mut self, last_token: usize) {
        let next = last_token + 1;
        if self.token_at(next).kind == TokenKind::Semicolon {
            self.last_index = Some(next);
        }
    }

    // -- program / statements -----------------------------------------------

    pub fn run(&mut self, program: &Program) {
        tracing::debug!(statements = program.statements.len(), "formatting program");
        for stmt in &program.statements {
            self.print_statement(stmt);
        }
        self.print_comments();
    }

    fn print_statement_leading(&mut self, stmt: &Stmt) {
        let start = stmt.meta().first_token;
        let is_decl = matches!(stmt, Stmt::FnDecl(_) | Stmt::ClassDecl(_));

        if self.last_index.is_some_and(|i| i + 1 == start) {
            if is_decl {
                self.write_newlines(2);
            } else {
                let last = self.last_index.unwrap();
                if self.token_at(last + 1).span.start.line > self.token_at(last).span.start.line + 1 {
                    self.write_newlines(1);
                }
            }
            return;
        }

        if self.first_statement {
            self.first_statement = false;
            let mut prev: Option<Token<'src>> = None;
            for i in 0..start {
                let tok = self.token_at(i);
                if let Some(p) = prev {
                    if tok.span.start.line > p.span.start.line + 1 {
                        self.write_newlines(1);
                    }
                }
                self.print_token(i);
                prev = Some(tok);
            }
            return;
        }

        // Find the first comment that hugs the statement (no blank line
        // between it and the statement, or the comment before it).
        let last = self.last_index.unwrap();
        let mut leading_comment_index = start;
        let mut next_line = self.token_at(start).span.start.line;
        let mut i = start;
        while i > last + 1 {
            i -= 1;
            let tok = self.token_at(i);
            if tok.kind != TokenKind::Comment {
                break;
            }
            if tok.span.start.line + 1 != next_line {
                break;
            }
            next_line = tok.span.start.line;
            leading_comment_index = i;
        }

        let mut prev = self.token_at(last);
        for i in (last + 1)..leading_comment_index {
            let tok = self.token_at(i);
            if tok.span.start.line > prev.span.start.line + 1 {
                self.write_newlines(1);
            }
            self.print_token(i);
            prev = tok;
        }

        if is_decl {
            self.write_newlines(2);
        } else if self.token_at(last + 1).span.start.line > self.token_at(last).span.start.line + 1 {
            self.write_newlines(1);
        }

        for i in leading_comment_index..start {
            self.print_token(i);
        }
    }

    fn print_statement_trailing(&mut self, stmt: &Stmt) {
        let Some(last) = self.last_index else { return };
        let mut prev = self.token_at(last);
        let mut index = last + 1;
        loop {
            let tok = self.token_at(index);
            if tok.kind != TokenKind::Comment || tok.span.start.line != prev.span.start.line + 1 {
                break;
            }
            self.print_token(index);
            prev = tok;
            index += 1;
        }
        let _ = stmt;
    }

    fn print_statement(&mut self, stmt: &Stmt) {
        self.print_statement_leading(stmt);
        let last_token = stmt.meta().last_token;

        match stmt {
            Stmt::Var(s) => {
                self.print_token_with_comment(s.meta.first_token);
                self.append_space();
                self.print_next_token_with_comment(); // name
                self.append_space();
                self.print_next_token_with_comment(); // =
                self.append_space();
                self.print_expression(&s.value);
                self.print_next_token();
            }
            Stmt::Return(s) => {
                self.print_token_with_comment(s.meta.first_token);
                if let Some(value) = &s.value {
                    self.append_space();
                    self.print_expression(value);
                }
                self.print_next_token();
            }
            Stmt::Expr(s) => {
                self.print_expression(&s.expr);
                self.print_next_token();
            }
            Stmt::If(s) => self.print_if(s, last_token),
            Stmt::Block(s) => {
                self.print_block(s);
                self.skip_end_semicolon(last_token);
            }
            Stmt::Assign(s) => {
                self.print_expression(&s.target);
                self.append_space();
                self.print_next_token_with_comment();
                self.append_space();
                self.print_expression(&s.value);
                self.print_next_token();
            }
            Stmt::FnDecl(s) => {
                self.print_token_with_comment(s.meta.first_token);
                self.append_space();
                self.print_next_token_with_comment(); // name
                self.print_next_token_with_comment(); // (
                self.print_params(&s.params, &s.defaults);
                self.print_next_token_with_comment(); // )
                self.write_str(" ");
                self.print_block(&s.body);
                self.skip_end_semicolon(last_token);
            }
            Stmt::ClassDecl(s) => self.print_class(s, last_token),
            Stmt::InstanceVar(s) => {
                self.print_token_with_comment(s.meta.first_token);
                self.append_space();
                self.print_next_token_with_comment(); // name
                if let Some(value) = &s.value {
                    self.append_space();
                    self.print_next_token_with_comment(); // =
                    self.append_space();
                    self.print_expression(value);
                }
                self.print_next_token();
            }
            Stmt::Method(s) => {
                self.print_token_with_comment(s.meta.first_token);
                self.append_space();
                self.print_next_token_with_comment(); // name
                self.print_next_token_with_comment(); // (
                self.print_params(&s.params, &s.defaults);
                self.print_next_token_with_comment(); // )
                self.write_str(" ");
                self.print_block(&s.body);
                self.skip_end_semicolon(last_token);
            }
            Stmt::ClassVar(s) => {
                self.print_token_with_comment(s.meta.first_token); // class
                self.append_space();
                self.print_next_token_with_comment(); // var/con
                self.append_space();
                self.print_next_token_with_comment(); // name
                self.append_space();
                self.print_next_token_with_comment(); // =
                self.append_space();
                self.print_expression(&s.value);
                self.print_next_token();
            }
            Stmt::ClassMethod(s) => {
                self.print_token_with_comment(s.meta.first_token); // class
                self.append_space();
                self.print_next_token_with_comment(); // fn
                self.append_space();
                self.print_next_token_with_comment(); // name
                self.print_next_token_with_comment(); // (
                self.print_params(&s.params, &s.defaults);
                self.print_next_token_with_comment(); // )
                self.write_str(" ");
                self.print_block(&s.body);
                self.skip_end_semicolon(last_token);
            }
            Stmt::While(s) => self.print_while(s, last_token),
            Stmt::Continue(m) => {
                self.print_token_with_comment(m.first_token);
                self.print_next_token();
            }
            Stmt::Break(m) => {
                self.print_token_with_comment(m.first_token);
                self.print_next_token();
            }
            Stmt::ForIn(s) => self.print_for_in(s, last_token),
        }

        let end_tok = self.token_at(last_token);
        if end_tok.kind == TokenKind::Comment
            && self.last_index.is_some_and(|i| end_tok.span.start.line == self.token_at(i).span.start.line)
        {
            self.write_str("  ");
            self.print_token(last_token);
        } else {
            self.append_endline();
        }

        self.print_statement_trailing(stmt);
    }

    fn print_if(&mut self, s: &IfStmt, last_token: usize) {
        self.print_token_with_comment(s.meta.first_token);
        self.append_space();
        self.print_next_token_with_comment(); // (
        self.print_expression(&s.condition);
        self.print_next_token_with_comment(); // )
        self.append_space();
        self.print_block(&s.consequence);

        for elif in &s.elifs {
            self.print_comments();
            self.append_endline();
            self.print_next_token_with_comment(); // elif
            self.append_space();
            self.print_next_token_with_comment(); // (
            self.print_expression(&elif.condition);
            self.print_next_token_with_comment(); // )
            self.append_space();
            self.print_block(&elif.consequence);
        }

        if let Some(alt) = &s.alternative {
            self.print_comments();
            self.append_endline();
            self.print_next_token_with_comment(); // else
            self.append_space();
            self.print_block(alt);
        }

        self.skip_end_semicolon(last_token);
    }

    fn print_while(&mut self, s: &WhileStmt, last_token: usize) {
        self.print_token_with_comment(s.meta.first_token);
        self.append_space();
        self.print_next_token_with_comment(); // (
        self.print_expression(&s.condition);
        self.print_next_token_with_comment(); // )
        self.append_space();
        self.print_block(&s.body);
        self.skip_end_semicolon(last_token);
    }

    fn print_for_in(&mut self, s: &ForInStmt, last_token: usize) {
        self.print_token_with_comment(s.meta.first_token); // for
        self.append_space();
        self.print_next_token_with_comment(); // (
        self.print_next_token_with_comment(); // var
        self.append_space();
        if s.index.is_some() {
            self.print_next_token_with_comment(); // identifier(i)
            self.print_next_token_with_comment(); // ,
            self.append_space();
        }
        self.print_next_token_with_comment(); // identifier(e)
        self.append_space();
        self.print_next_token_with_comment(); // in
        self.append_space();
        self.print_expression(&s.iterable);
        self.print_next_token_with_comment(); // )
        self.append_space();
        self.print_block(&s.body);
        self.skip_end_semicolon(last_token);
    }

    fn print_class(&mut self, s: &ClassDeclStmt, last_token: usize) {
        self.print_token(s.meta.first_token); // class
        self.append_space();
        self.print_next_token_with_comment(); // name
        if s.parent.is_some() {
            self.print_next_token_with_comment(); // <
            self.print_next_token_with_comment(); // parent identifier
        }
        self.append_space();
        self.indent();
        self.print_next_token(); // {
        self.print_comments();
        self.append_endline();
        for member in &s.body {
            self.print_statement(member);
        }
        self.dedent();
        self.print_next_token(); // }
        self.skip_end_semicolon(last_token);
    }

    fn print_block(&mut self, block: &BlockStmt) {
        self.print_token(block.meta.first_token); // {
        self.indent();
        self.print_comments();
        self.append_endline();
        for s in &block.statements {
            self.print_statement(s);
        }
        self.dedent();
        self.print_next_token(); // }
    }

    fn print_params(&mut self, params: &[Param], defaults: &[Expr]) {
        if params.is_empty() {
            return;
        }
        self.indent();
        self.append_endline();
        let default_start = params.len() - defaults.len();
        for (i, _param) in params.iter().enumerate() {
            self.print_next_token_with_comment(); // parameter name
            if i >= default_start {
                self.print_next_token_with_comment(); // =
                self.print_expression(&defaults[i - default_start]);
            }
            if self.next_token_is(TokenKind::Comma) {
                self.print_next_token_with_comment();
            } else {
                self.write_str(",\n");
            }
            self.append_endline();
        }
        self.dedent();
    }

    // -- expressions --------------------------------------------------------

    fn print_expression(&mut self, expr: &Expr) {
        match expr {
            Expr::Int(e) => self.print_token_with_comment(e.meta.first_token),
            Expr::Float(e) => self.print_token_with_comment(e.meta.first_token),
            Expr::Bool(e) => self.print_token_with_comment(e.meta.first_token),
            Expr::Nil(m) => self.print_token_with_comment(m.first_token),
            Expr::Ident(e) => self.print_token_with_comment(e.meta.first_token),
            Expr::StringLit(e) => self.print_token_with_comment(e.meta.first_token),
            Expr::Prefix(e) => {
                if e.parens {
                    self.print_token_with_comment(e.meta.first_token);
                    self.print_next_token_with_comment();
                    self.print_expression(&e.operand);
                    self.print_next_token_with_comment();
                } else {
                    self.print_token_with_comment(e.meta.first_token);
                    self.print_expression(&e.operand);
                }
            }
            Expr::Infix(e) => {
                if e.parens {
                    self.print_token_with_comment(e.meta.first_token);
                    self.print_expression(&e.left);
                    self.append_space();
                    self.print_next_token();
                    self.append_space();
                    self.print_comments();
                    self.print_expression(&e.right);
                    self.print_next_token_with_comment();
                } else {
                    self.print_expression(&e.left);
                    self.append_space();
                    self.print_next_token();
                    self.append_space();
                    self.print_comments();
                    self.print_expression(&e.right);
                }
            }
            Expr::FnLiteral(e) => {
                self.print_token_with_comment(e.meta.first_token); // fn
                self.print_next_token_with_comment(); // (
                self.print_params(&e.params, &e.defaults);
                self.print_next_token_with_comment(); // )
                self.append_space();
                self.print_block(&e.body);
                self.print_comments();
            }
            Expr::ArrayLit(e) => {
                self.print_token_with_comment(e.meta.first_token); // [
                if !e.elements.is_empty() {
                    self.indent();
                    self.append_endline();
                    for el in &e.elements {
                        self.print_expression(el);
                        if self.next_token_is(TokenKind::Comma) {
                            self.print_next_token_with_comment();
                            self.append_endline();
                        } else {
                            self.write_str(",\n");
                        }
                    }
                    self.dedent();
                }
                self.print_token_with_comment(e.meta.last_token);
            }
            Expr::MapLit(e) => {
                self.print_token_with_comment(e.meta.first_token); // {
                if !e.pairs.is_empty() {
                    self.indent();
                    self.append_endline();
                    for (k, v) in &e.pairs {
                        self.print_expression(k);
                        self.print_next_token_with_comment(); // :
                        self.append_space();
                        self.print_expression(v);
                        if self.next_token_is(TokenKind::Comma) {
                            self.print_next_token_with_comment();
                            self.append_endline();
                        } else {
                            self.write_str(",\n");
                        }
                    }
                    self.dedent();
                }
                self.print_token_with_comment(e.meta.last_token);
            }
            Expr::Call(e) => {
                self.print_expression(&e.callee);
                self.print_next_token_with_comment(); // (
                if !e.args.is_empty() {
                    self.indent();
                    self.append_endline();
                    for arg in &e.args {
                        self.print_expression(arg);
                        if self.next_token_is(TokenKind::Comma) {
                            self.print_next_token_with_comment();
                            self.append_endline();
                        } else {
                            self.write_str(",\n");
                        }
                    }
                    self.dedent();
                }
                self.print_token_with_comment(e.meta.last_token);
            }
            Expr::Dot(e) => {
                self.print_expression(&e.receiver);
                self.print_next_token_with_comment(); // .
                self.print_next_token_with_comment(); // name
            }
            Expr::Subscript(e) => {
                self.print_expression(&e.target);
                self.print_next_token_with_comment(); // [
                self.print_expression(&e.index);
                self.print_token_with_comment(e.meta.last_token);
            }
            Expr::SelfAccess(e) => {
                self.print_token_with_comment(e.meta.first_token); // self
                if e.name.is_some() {
                    self.print_next_token_with_comment(); // .
                    self.print_next_token_with_comment(); // name
                }
            }
            Expr::SuperAccess(e) => {
                self.print_token_with_comment(e.meta.first_token); // super
                self.print_next_token_with_comment(); // .
                self.print_next_token_with_comment(); // name
            }
            Expr::ClassAccess(e) => {
                self.print_token_with_comment(e.meta.first_token); // class
                self.print_next_token_with_comment(); // .
                self.print_next_token_with_comment(); // name
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dai::{parse, tokenize};

    fn run(src: &str) -> String {
        let (tokens, lex_err) = tokenize(src);
        assert!(lex_err.is_none());
        let (program, parse_err) = parse(tokens.clone());
        assert!(parse_err.is_none(), "{parse_err:?}");
        let mut printer = Printer::new(&tokens, src.len());
        printer.run(&program);
        printer.finish()
    }

    #[test]
    fn single_var_statement() {
        assert_eq!(run("var five=5;"), "var five = 5;\n");
    }

    #[test]
    fn nested_block_indents() {
        let out = run("if (x) { y; }");
        assert!(out.contains("if (x) {\n    y;\n}"));
    }
}
