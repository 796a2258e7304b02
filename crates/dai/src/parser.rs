//! A three-slot look-ahead, Pratt-style recursive-descent parser:
//! [`TokenList`] in, [`Program`] out.
//!
//! Parse functions follow one convention throughout: on entry, `cur` names
//! the token the function is keyed to; on exit, `cur` is the last token of
//! the subtree just built. `expect_peek` is the workhorse — it checks the
//! look-ahead token, and if it matches, advances so `cur` becomes that
//! token; this is how the "ends on its own last token" invariant holds
//! without every function having to track it by hand.

use crate::ast::{
    ArrayLiteral, AssignOp, AssignStmt, BlockStmt, BoolLiteral, CallExpr, ClassAccessExpr, ClassDeclStmt,
    ClassMethodStmt, ClassVarStmt, DotExpr, ElifClause, Expr, ExprStmt, FloatLiteral, FnDeclStmt, FnLiteral,
    ForInStmt, Identifier, IfStmt, InfixExpr, InfixOp, InstanceVarStmt, IntLiteral, MapLiteral, MethodStmt,
    NodeMeta, Param, PrefixExpr, PrefixOp, Program, ReturnStmt, SelfAccessExpr, Stmt, StringLiteral, SubscriptExpr,
    SuperAccessExpr, VarStmt, WhileStmt,
};
use crate::diagnostic::Diagnostic;
use crate::numeric;
use crate::position::Position;
use crate::token::{Token, TokenKind};
use crate::token_list::TokenList;
use smallvec::SmallVec;

/// Binding power, loosest to tightest.
///
/// The excerpt this grammar is drawn from states precedence in prose only
/// partially; the ordering below is the one consistent with its worked
/// example `1 << 2 - 1 & 1 < 1 >> 2 - 1 | 1` (see the parser test of the
/// same name).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Precedence {
    Lowest,
    Or,
    And,
    Equals,
    LessGreater,
    BitOr,
    BitXor,
    BitAnd,
    Shift,
    Additive,
    Multiplicative,
    Prefix,
    Call,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Or => Precedence::Or,
        TokenKind::And => Precedence::And,
        TokenKind::Eq | TokenKind::NotEq => Precedence::Equals,
        TokenKind::Lt | TokenKind::Gt | TokenKind::Lte | TokenKind::Gte => Precedence::LessGreater,
        TokenKind::Pipe => Precedence::BitOr,
        TokenKind::Caret => Precedence::BitXor,
        TokenKind::Ampersand => Precedence::BitAnd,
        TokenKind::Shl | TokenKind::Shr => Precedence::Shift,
        TokenKind::Plus | TokenKind::Minus => Precedence::Additive,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Multiplicative,
        TokenKind::LParen | TokenKind::Dot | TokenKind::LBracket => Precedence::Call,
        _ => Precedence::Lowest,
    }
}

/// Decodes the backslash escapes of a string lexeme's inner text. The lexer
/// has already rejected malformed escapes, so this never fails.
fn decode_string_escapes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('x') => {
                let hi = chars.next().expect("lexer validated \\xHH");
                let lo = chars.next().expect("lexer validated \\xHH");
                let byte = u8::from_str_radix(&format!("{hi}{lo}"), 16).expect("lexer validated hex digits");
                out.push(byte as char);
            }
            _ => unreachable!("lexer rejects unknown escapes"),
        }
    }
    out
}

fn next_non_comment<'src>(tokens: &mut TokenList<'src>) -> (Token<'src>, usize) {
    loop {
        let idx = tokens.cursor();
        let tok = tokens.next();
        if tok.kind != TokenKind::Comment {
            return (tok, idx);
        }
    }
}

struct Parser<'src> {
    tokens: TokenList<'src>,
    cur: Token<'src>,
    cur_index: usize,
    peek: Token<'src>,
    peek_index: usize,
    error: Option<Diagnostic>,
}

impl<'src> Parser<'src> {
    fn new(mut tokens: TokenList<'src>) -> Self {
        let (cur, cur_index) = next_non_comment(&mut tokens);
        let (peek, peek_index) = next_non_comment(&mut tokens);
        Self { tokens, cur, cur_index, peek, peek_index, error: None }
    }

    fn bump(&mut self) {
        self.cur = self.peek;
        self.cur_index = self.peek_index;
        let (peek, peek_index) = next_non_comment(&mut self.tokens);
        self.peek = peek;
        self.peek_index = peek_index;
    }

    fn error_at(&mut self, message: impl Into<String>, position: Position) {
        if self.error.is_none() {
            self.error = Some(Diagnostic::syntax_error(message, position));
        }
    }

    fn expect_peek(&mut self, kind: TokenKind) -> bool {
        if self.peek.kind == kind {
            self.bump();
            true
        } else {
            self.error_at(
                format!(
                    "expected token to be {:?} but got {:?}",
                    kind.diagnostic_name(),
                    self.peek.kind.diagnostic_name()
                ),
                self.peek.span.start,
            );
            false
        }
    }

    fn single_meta(&self) -> NodeMeta {
        NodeMeta::new(self.cur.span, self.cur_index, self.cur_index)
    }

    // -- program / statements -------------------------------------------------

    fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();
        while self.cur.kind != TokenKind::Eof && self.error.is_none() {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            if self.error.is_some() {
                break;
            }
            self.bump();
        }
        Program { statements }
    }

    fn parse_statement(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Var | TokenKind::Con => self.parse_var_stmt(),
            TokenKind::Return => self.parse_return_stmt(),
            TokenKind::If => self.parse_if_stmt(),
            TokenKind::While => self.parse_while_stmt(),
            TokenKind::For => self.parse_for_stmt(),
            TokenKind::LBrace => self.parse_block_stmt().map(Stmt::Block),
            TokenKind::Fn => self.parse_fn_decl_stmt(),
            TokenKind::Class => self.parse_class_decl_stmt(),
            TokenKind::Break => self.parse_break_stmt(),
            TokenKind::Continue => self.parse_continue_stmt(),
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    fn parse_var_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        let is_con = self.cur.kind == TokenKind::Con;
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        if !self.expect_peek(TokenKind::Assign) {
            return None;
        }
        self.bump();
        let value = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::Var(VarStmt { meta, is_con, name, value }))
    }

    fn parse_return_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if self.peek.kind == TokenKind::Semicolon {
            self.bump();
            let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
            return Some(Stmt::Return(ReturnStmt { meta, value: None }));
        }
        self.bump();
        let value = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::Return(ReturnStmt { meta, value: Some(value) }))
    }

    fn parse_break_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::Break(NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index)))
    }

    fn parse_continue_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        Some(Stmt::Continue(NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index)))
    }

    fn parse_block_stmt(&mut self) -> Option<BlockStmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        self.bump();
        let mut statements = Vec::new();
        while self.cur.kind != TokenKind::RBrace && self.cur.kind != TokenKind::Eof && self.error.is_none() {
            if let Some(stmt) = self.parse_statement() {
                statements.push(stmt);
            }
            if self.error.is_some() {
                return None;
            }
            self.bump();
        }
        if self.cur.kind != TokenKind::RBrace {
            self.error_at(
                format!(
                    "expected token to be {:?} but got {:?}",
                    TokenKind::RBrace.diagnostic_name(),
                    self.cur.kind.diagnostic_name()
                ),
                self.cur.span.start,
            );
            return None;
        }
        Some(BlockStmt { meta: NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index), statements })
    }

    fn parse_if_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.bump();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let consequence = self.parse_block_stmt()?;

        let mut elifs = Vec::new();
        while self.peek.kind == TokenKind::Elif {
            self.bump();
            let elif_first = self.cur_index;
            let elif_start_span = self.cur.span;
            if !self.expect_peek(TokenKind::LParen) {
                return None;
            }
            self.bump();
            let elif_condition = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            let elif_consequence = self.parse_block_stmt()?;
            elifs.push(ElifClause {
                meta: NodeMeta::new(elif_start_span.join(self.cur.span), elif_first, self.cur_index),
                condition: elif_condition,
                consequence: elif_consequence,
            });
        }

        let alternative = if self.peek.kind == TokenKind::Else {
            self.bump();
            if !self.expect_peek(TokenKind::LBrace) {
                return None;
            }
            Some(self.parse_block_stmt()?)
        } else {
            None
        };

        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::If(IfStmt { meta, condition, consequence, elifs, alternative }))
    }

    fn parse_while_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        self.bump();
        let condition = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_stmt()?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::While(WhileStmt { meta, condition, body }))
    }

    fn parse_for_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::Var) {
            return None;
        }
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let first_name = self.cur.lexeme.to_string();
        let (index, element) = if self.peek.kind == TokenKind::Comma {
            self.bump();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            (Some(first_name), self.cur.lexeme.to_string())
        } else {
            (None, first_name)
        };
        if !self.expect_peek(TokenKind::In) {
            return None;
        }
        self.bump();
        let iterable = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_stmt()?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::ForIn(ForInStmt { meta, index, element, iterable, body }))
    }

    fn parse_param_list(&mut self) -> Option<(SmallVec<[Param; 4]>, SmallVec<[Expr; 4]>)> {
        let mut params: SmallVec<[Param; 4]> = SmallVec::new();
        let mut defaults: SmallVec<[Expr; 4]> = SmallVec::new();

        if self.peek.kind == TokenKind::RParen {
            self.bump();
            return Some((params, defaults));
        }
        self.bump();
        loop {
            if self.cur.kind != TokenKind::Ident {
                self.error_at(
                    format!(
                        "expected token to be {:?} but got {:?}",
                        TokenKind::Ident.diagnostic_name(),
                        self.cur.kind.diagnostic_name()
                    ),
                    self.cur.span.start,
                );
                return None;
            }
            let name = self.cur.lexeme.to_string();
            let span = self.cur.span;

            if self.peek.kind == TokenKind::Assign {
                self.bump();
                self.bump();
                defaults.push(self.parse_expression(Precedence::Lowest)?);
            } else if !defaults.is_empty() {
                self.error_at("a parameter without a default follows one that has a default", span.start);
                return None;
            }
            params.push(Param { name, span });

            if self.peek.kind == TokenKind::Comma {
                self.bump();
                if self.peek.kind == TokenKind::RParen {
                    self.bump();
                    break;
                }
                self.bump();
                continue;
            }
            if !self.expect_peek(TokenKind::RParen) {
                return None;
            }
            break;
        }
        Some((params, defaults))
    }

    fn parse_fn_decl_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let (params, defaults) = self.parse_param_list()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_stmt()?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::FnDecl(FnDeclStmt { meta, name, params, defaults, body }))
    }

    fn parse_class_decl_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();

        let parent = if self.peek.kind == TokenKind::Lt {
            self.bump();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            Some(self.cur.lexeme.to_string())
        } else {
            None
        };

        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        self.bump();
        let mut body = Vec::new();
        while self.cur.kind != TokenKind::RBrace && self.cur.kind != TokenKind::Eof && self.error.is_none() {
            let Some(member) = self.parse_class_member() else { return None };
            if !member.is_class_member() {
                self.error_at(
                    "only var, fn, class var, and class fn are allowed in a class body",
                    member.meta().span.start,
                );
                return None;
            }
            body.push(member);
            if self.error.is_some() {
                return None;
            }
            self.bump();
        }
        if self.cur.kind != TokenKind::RBrace {
            self.error_at(
                format!(
                    "expected token to be {:?} but got {:?}",
                    TokenKind::RBrace.diagnostic_name(),
                    self.cur.kind.diagnostic_name()
                ),
                self.cur.span.start,
            );
            return None;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::ClassDecl(ClassDeclStmt { meta, name, parent, body }))
    }

    fn parse_class_member(&mut self) -> Option<Stmt> {
        match self.cur.kind {
            TokenKind::Var => self.parse_instance_var_stmt(),
            TokenKind::Fn => self.parse_method_stmt(),
            TokenKind::Class => self.parse_class_prefixed_member(),
            other => {
                self.error_at(format!("unexpected {:?} in class body", other.diagnostic_name()), self.cur.span.start);
                None
            }
        }
    }

    fn parse_instance_var_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        let value = if self.peek.kind == TokenKind::Assign {
            self.bump();
            self.bump();
            Some(self.parse_expression(Precedence::Lowest)?)
        } else {
            None
        };
        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::InstanceVar(InstanceVarStmt { meta, name, value }))
    }

    fn parse_method_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let (params, defaults) = self.parse_param_list()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_stmt()?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::Method(MethodStmt { meta, name, params, defaults, body }))
    }

    fn parse_class_prefixed_member(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        match self.peek.kind {
            TokenKind::Var => {
                self.bump();
                if !self.expect_peek(TokenKind::Ident) {
                    return None;
                }
                let name = self.cur.lexeme.to_string();
                if !self.expect_peek(TokenKind::Assign) {
                    return None;
                }
                self.bump();
                let value = self.parse_expression(Precedence::Lowest)?;
                if !self.expect_peek(TokenKind::Semicolon) {
                    return None;
                }
                let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
                Some(Stmt::ClassVar(ClassVarStmt { meta, name, value }))
            }
            TokenKind::Fn => {
                self.bump();
                if !self.expect_peek(TokenKind::Ident) {
                    return None;
                }
                let name = self.cur.lexeme.to_string();
                if !self.expect_peek(TokenKind::LParen) {
                    return None;
                }
                let (params, defaults) = self.parse_param_list()?;
                if !self.expect_peek(TokenKind::LBrace) {
                    return None;
                }
                let body = self.parse_block_stmt()?;
                let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
                Some(Stmt::ClassMethod(ClassMethodStmt { meta, name, params, defaults, body }))
            }
            other => {
                self.error_at(
                    format!("expected \"var\" or \"fn\" after \"class\" but got {:?}", other.diagnostic_name()),
                    self.peek.span.start,
                );
                None
            }
        }
    }

    fn parse_expr_or_assign_stmt(&mut self) -> Option<Stmt> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        let expr = self.parse_expression(Precedence::Lowest)?;

        let op = match self.peek.kind {
            TokenKind::Assign => Some(AssignOp::Assign),
            TokenKind::PlusAssign => Some(AssignOp::PlusAssign),
            TokenKind::MinusAssign => Some(AssignOp::MinusAssign),
            TokenKind::AsteriskAssign => Some(AssignOp::AsteriskAssign),
            TokenKind::SlashAssign => Some(AssignOp::SlashAssign),
            _ => None,
        };

        if let Some(op) = op {
            if !expr.is_assignable() {
                self.error_at("left-hand side of assignment is not a valid target", expr.meta().span.start);
                return None;
            }
            self.bump();
            self.bump();
            let value = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Semicolon) {
                return None;
            }
            let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
            return Some(Stmt::Assign(AssignStmt { meta, target: expr, op, value }));
        }

        if !self.expect_peek(TokenKind::Semicolon) {
            return None;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Stmt::Expr(ExprStmt { meta, expr }))
    }

    // -- expressions -----------------------------------------------------------

    fn parse_expression(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut left = self.parse_prefix()?;
        while self.error.is_none() && precedence < precedence_of(self.peek.kind) {
            self.bump();
            left = self.parse_infix(left)?;
        }
        Some(left)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Int => self.parse_int_literal(),
            TokenKind::Float => self.parse_float_literal(),
            TokenKind::True | TokenKind::False => Some(self.parse_bool_literal()),
            TokenKind::Nil => Some(Expr::Nil(self.single_meta())),
            TokenKind::Ident => Some(self.parse_identifier()),
            TokenKind::Minus | TokenKind::Bang | TokenKind::Not | TokenKind::Tilde => self.parse_prefix_expr(),
            TokenKind::LParen => self.parse_grouped_expr(),
            TokenKind::Fn => self.parse_fn_literal(),
            TokenKind::String => Some(self.parse_string_literal()),
            TokenKind::LBracket => self.parse_array_literal(),
            TokenKind::LBrace => self.parse_map_literal(),
            TokenKind::Self_ => self.parse_self_access(),
            TokenKind::Super => self.parse_super_access(),
            TokenKind::Class => self.parse_class_access(),
            other => {
                self.error_at(format!("no prefix parse function for {:?} found", other.diagnostic_name()), self.cur.span.start);
                None
            }
        }
    }

    fn parse_int_literal(&mut self) -> Option<Expr> {
        let meta = self.single_meta();
        let lexeme = self.cur.lexeme;
        let base = numeric::base_of_lexeme(lexeme);
        match numeric::parse_int(lexeme, base) {
            Ok(value) => Some(Expr::Int(IntLiteral { meta, value })),
            Err(err) => {
                self.error_at(err.message(), self.cur.span.start);
                None
            }
        }
    }

    fn parse_float_literal(&mut self) -> Option<Expr> {
        let meta = self.single_meta();
        let cleaned: String = self.cur.lexeme.chars().filter(|&c| c != '_').collect();
        match cleaned.parse::<f64>() {
            Ok(value) => Some(Expr::Float(FloatLiteral { meta, value })),
            Err(_) => {
                self.error_at("invalid float literal", self.cur.span.start);
                None
            }
        }
    }

    fn parse_bool_literal(&mut self) -> Expr {
        Expr::Bool(BoolLiteral { meta: self.single_meta(), value: self.cur.kind == TokenKind::True })
    }

    fn parse_identifier(&mut self) -> Expr {
        Expr::Ident(Identifier { meta: self.single_meta(), name: self.cur.lexeme.to_string() })
    }

    fn parse_prefix_expr(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        let op = match self.cur.kind {
            TokenKind::Minus => PrefixOp::Neg,
            TokenKind::Bang => PrefixOp::Bang,
            TokenKind::Not => PrefixOp::Not,
            TokenKind::Tilde => PrefixOp::BitNot,
            _ => unreachable!("parse_prefix only routes here for these kinds"),
        };
        self.bump();
        let operand = self.parse_expression(Precedence::Prefix)?;
        let meta = NodeMeta::new(start_span.join(operand.meta().span), first, operand.meta().last_token);
        Some(Expr::Prefix(Box::new(PrefixExpr { meta, op, operand, parens: false })))
    }

    fn parse_grouped_expr(&mut self) -> Option<Expr> {
        let lparen_index = self.cur_index;
        self.bump();
        let mut expr = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RParen) {
            return None;
        }
        let rparen_index = self.cur_index;
        match &mut expr {
            Expr::Prefix(p) => {
                p.parens = true;
                p.meta = NodeMeta::new(p.meta.span, lparen_index, rparen_index);
            }
            Expr::Infix(i) => {
                i.parens = true;
                i.meta = NodeMeta::new(i.meta.span, lparen_index, rparen_index);
            }
            _ => {}
        }
        Some(expr)
    }

    fn parse_fn_literal(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::LParen) {
            return None;
        }
        let (params, defaults) = self.parse_param_list()?;
        if !self.expect_peek(TokenKind::LBrace) {
            return None;
        }
        let body = self.parse_block_stmt()?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::FnLiteral(Box::new(FnLiteral { meta, params, defaults, body })))
    }

    fn parse_string_literal(&mut self) -> Expr {
        let meta = self.single_meta();
        let lexeme = self.cur.lexeme;
        let inner = &lexeme[1..lexeme.len() - 1];
        Expr::StringLit(StringLiteral { meta, value: decode_string_escapes(inner) })
    }

    fn parse_expr_list(&mut self, end: TokenKind) -> Option<Vec<Expr>> {
        let mut items = Vec::new();
        if self.peek.kind == end {
            self.bump();
            return Some(items);
        }
        self.bump();
        items.push(self.parse_expression(Precedence::Lowest)?);
        while self.peek.kind == TokenKind::Comma {
            self.bump();
            if self.peek.kind == end {
                self.bump();
                return Some(items);
            }
            self.bump();
            items.push(self.parse_expression(Precedence::Lowest)?);
        }
        if !self.expect_peek(end) {
            return None;
        }
        Some(items)
    }

    fn parse_array_literal(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        let elements = self.parse_expr_list(TokenKind::RBracket)?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::ArrayLit(ArrayLiteral { meta, elements }))
    }

    fn parse_map_literal(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        let mut pairs = Vec::new();

        if self.peek.kind == TokenKind::RBrace {
            self.bump();
            let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
            return Some(Expr::MapLit(MapLiteral { meta, pairs }));
        }
        self.bump();
        loop {
            let key = self.parse_expression(Precedence::Lowest)?;
            if !self.expect_peek(TokenKind::Colon) {
                return None;
            }
            self.bump();
            let value = self.parse_expression(Precedence::Lowest)?;
            pairs.push((key, value));

            if self.peek.kind == TokenKind::Comma {
                self.bump();
                if self.peek.kind == TokenKind::RBrace {
                    self.bump();
                    break;
                }
                self.bump();
                continue;
            }
            if !self.expect_peek(TokenKind::RBrace) {
                return None;
            }
            break;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::MapLit(MapLiteral { meta, pairs }))
    }

    fn parse_self_access(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if self.peek.kind == TokenKind::Dot {
            self.bump();
            if !self.expect_peek(TokenKind::Ident) {
                return None;
            }
            let name = self.cur.lexeme.to_string();
            let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
            return Some(Expr::SelfAccess(SelfAccessExpr { meta, name: Some(name) }));
        }
        Some(Expr::SelfAccess(SelfAccessExpr { meta: self.single_meta(), name: None }))
    }

    fn parse_super_access(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Dot) {
            return None;
        }
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::SuperAccess(SuperAccessExpr { meta, name }))
    }

    fn parse_class_access(&mut self) -> Option<Expr> {
        let first = self.cur_index;
        let start_span = self.cur.span;
        if !self.expect_peek(TokenKind::Dot) {
            return None;
        }
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::ClassAccess(ClassAccessExpr { meta, name }))
    }

    fn parse_infix(&mut self, left: Expr) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::LParen => self.parse_call_expr(left),
            TokenKind::Dot => self.parse_dot_expr(left),
            TokenKind::LBracket => self.parse_subscript_expr(left),
            _ => self.parse_binary_infix_expr(left),
        }
    }

    fn parse_binary_infix_expr(&mut self, left: Expr) -> Option<Expr> {
        let op = match self.cur.kind {
            TokenKind::Plus => InfixOp::Add,
            TokenKind::Minus => InfixOp::Sub,
            TokenKind::Asterisk => InfixOp::Mul,
            TokenKind::Slash => InfixOp::Div,
            TokenKind::Percent => InfixOp::Mod,
            TokenKind::Lt => InfixOp::Lt,
            TokenKind::Gt => InfixOp::Gt,
            TokenKind::Lte => InfixOp::Lte,
            TokenKind::Gte => InfixOp::Gte,
            TokenKind::Eq => InfixOp::Eq,
            TokenKind::NotEq => InfixOp::NotEq,
            TokenKind::And => InfixOp::And,
            TokenKind::Or => InfixOp::Or,
            TokenKind::Ampersand => InfixOp::BitAnd,
            TokenKind::Pipe => InfixOp::BitOr,
            TokenKind::Caret => InfixOp::BitXor,
            TokenKind::Shl => InfixOp::Shl,
            TokenKind::Shr => InfixOp::Shr,
            other => {
                self.error_at(format!("no infix parse function for {:?} found", other.diagnostic_name()), self.cur.span.start);
                return None;
            }
        };
        let precedence = precedence_of(self.cur.kind);
        let first = left.meta().first_token;
        let start_span = left.meta().span;
        self.bump();
        let right = self.parse_expression(precedence)?;
        let meta = NodeMeta::new(start_span.join(right.meta().span), first, right.meta().last_token);
        Some(Expr::Infix(Box::new(InfixExpr { meta, op, left, right, parens: false })))
    }

    fn parse_call_expr(&mut self, callee: Expr) -> Option<Expr> {
        let first = callee.meta().first_token;
        let start_span = callee.meta().span;
        let args = self.parse_expr_list(TokenKind::RParen)?;
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::Call(Box::new(CallExpr { meta, callee, args })))
    }

    fn parse_dot_expr(&mut self, receiver: Expr) -> Option<Expr> {
        let first = receiver.meta().first_token;
        let start_span = receiver.meta().span;
        if !self.expect_peek(TokenKind::Ident) {
            return None;
        }
        let name = self.cur.lexeme.to_string();
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::Dot(Box::new(DotExpr { meta, receiver, name })))
    }

    fn parse_subscript_expr(&mut self, target: Expr) -> Option<Expr> {
        let first = target.meta().first_token;
        let start_span = target.meta().span;
        self.bump();
        let index = self.parse_expression(Precedence::Lowest)?;
        if !self.expect_peek(TokenKind::RBracket) {
            return None;
        }
        let meta = NodeMeta::new(start_span.join(self.cur.span), first, self.cur_index);
        Some(Expr::Subscript(Box::new(SubscriptExpr { meta, target, index })))
    }
}

/// Parses a token list into a [`Program`].
///
/// Total: on a syntax error, parsing stops after freeing the partially
/// built subtree and the returned diagnostic describes the first failure;
/// the program returned alongside it is only valid for inspection of the
/// statements collected before the error.
#[must_use]
pub fn parse(tokens: TokenList<'_>) -> (Program, Option<Diagnostic>) {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    (program, parser.error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_source(src: &str) -> (Program, Option<Diagnostic>) {
        let (tokens, lex_err) = tokenize(src);
        assert!(lex_err.is_none(), "unexpected lex error: {lex_err:?}");
        parse(tokens)
    }

    #[test]
    fn scenario_var_five_equals_5() {
        let (program, err) = parse_source("var five = 5;\n");
        assert!(err.is_none());
        assert_eq!(program.statements.len(), 1);
        let Stmt::Var(v) = &program.statements[0] else { panic!("expected a var statement") };
        assert!(!v.is_con);
        assert_eq!(v.name, "five");
        assert!(matches!(&v.value, Expr::Int(i) if i.value == 5));
    }

    #[test]
    fn precedence_matches_the_worked_example() {
        // 1 << 2 - 1 & 1 < 1 >> 2 - 1 | 1
        //   ⇒ (((1 << (2 - 1)) & 1) < ((1 >> (2 - 1)) | 1))
        let (program, err) = parse_source("1 << 2 - 1 & 1 < 1 >> 2 - 1 | 1;");
        assert!(err.is_none(), "{err:?}");
        let Stmt::Expr(s) = &program.statements[0] else { panic!("expected an expression statement") };
        let Expr::Infix(top) = &s.expr else { panic!("expected an infix expression") };
        assert_eq!(top.op, InfixOp::Lt);

        let Expr::Infix(lhs) = &top.left else { panic!("expected lhs to be infix") };
        assert_eq!(lhs.op, InfixOp::BitAnd);
        let Expr::Infix(shl) = &lhs.left else { panic!("expected shl") };
        assert_eq!(shl.op, InfixOp::Shl);
        let Expr::Infix(shl_rhs) = &shl.right else { panic!("expected (2 - 1)") };
        assert_eq!(shl_rhs.op, InfixOp::Sub);

        let Expr::Infix(rhs) = &top.right else { panic!("expected rhs to be infix") };
        assert_eq!(rhs.op, InfixOp::BitOr);
        let Expr::Infix(shr) = &rhs.left else { panic!("expected shr") };
        assert_eq!(shr.op, InfixOp::Shr);
    }

    #[test]
    fn multiplication_binds_tighter_than_addition() {
        let (program, err) = parse_source("1 + 2 * 3;");
        assert!(err.is_none());
        let Stmt::Expr(s) = &program.statements[0] else { panic!() };
        let Expr::Infix(top) = &s.expr else { panic!() };
        assert_eq!(top.op, InfixOp::Add);
        assert!(matches!(&top.right, Expr::Infix(i) if i.op == InfixOp::Mul));
    }

    #[test]
    fn if_elif_else() {
        let (program, err) = parse_source("if (x < y) { x; } else { y; }");
        assert!(err.is_none());
        let Stmt::If(s) = &program.statements[0] else { panic!() };
        assert!(matches!(&s.condition, Expr::Infix(i) if i.op == InfixOp::Lt));
        assert_eq!(s.consequence.statements.len(), 1);
        assert!(s.elifs.is_empty());
        assert!(s.alternative.is_some());
    }

    #[test]
    fn class_with_parent_and_four_members() {
        let src = "class Foo < Bar { var a; fn get() { return 1; } class var c = 4; class fn cget() {} }";
        let (program, err) = parse_source(src);
        assert!(err.is_none(), "{err:?}");
        let Stmt::ClassDecl(c) = &program.statements[0] else { panic!() };
        assert_eq!(c.name, "Foo");
        assert_eq!(c.parent.as_deref(), Some("Bar"));
        assert_eq!(c.body.len(), 4);
        assert!(matches!(c.body[0], Stmt::InstanceVar(_)));
        assert!(matches!(c.body[1], Stmt::Method(_)));
        assert!(matches!(c.body[2], Stmt::ClassVar(_)));
        assert!(matches!(c.body[3], Stmt::ClassMethod(_)));
    }

    #[test]
    fn array_literal_elements() {
        let (program, err) = parse_source("[1, 2 * 2, 3 + 3];");
        assert!(err.is_none());
        let Stmt::Expr(s) = &program.statements[0] else { panic!() };
        let Expr::ArrayLit(arr) = &s.expr else { panic!() };
        assert_eq!(arr.elements.len(), 3);
    }

    #[test]
    fn invalid_number_reports_the_expected_message() {
        let (_, lex_err) = tokenize("0b12;");
        let err = lex_err.expect("lexer should reject 0b12");
        assert_eq!(err.message(), "invalid number");
    }

    #[test]
    fn no_prefix_parse_function_error() {
        let (_, err) = parse_source(";");
        let err = err.expect("a bare semicolon has no prefix parser");
        assert!(err.message().contains("no prefix parse function for"));
    }

    #[test]
    fn unexpected_token_error_names_both_kinds() {
        let (_, err) = parse_source("var x = ;");
        let err = err.expect("missing initializer expression");
        assert!(err.message().contains("no prefix parse function for"));
    }

    #[test]
    fn default_suffix_rule_is_enforced() {
        let (_, err) = parse_source("fn f(a = 1, b) {}");
        let err = err.expect("b lacks a default after a has one");
        assert!(err.message().contains("default"));
    }

    #[test]
    fn for_in_with_index_binding() {
        let (program, err) = parse_source("for (var i, e in xs) { e; }");
        assert!(err.is_none());
        let Stmt::ForIn(f) = &program.statements[0] else { panic!() };
        assert_eq!(f.index.as_deref(), Some("i"));
        assert_eq!(f.element, "e");
    }

    #[test]
    fn compound_assignment_retains_its_operator() {
        let (program, err) = parse_source("x += 1;");
        assert!(err.is_none());
        let Stmt::Assign(a) = &program.statements[0] else { panic!() };
        assert_eq!(a.op, AssignOp::PlusAssign);
    }
}
