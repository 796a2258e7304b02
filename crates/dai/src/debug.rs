//! Pretty-prints an AST for test assertions.
//!
//! [`ast_debug_string`] colours type names and field keys with ANSI escapes;
//! [`ast_debug_string_plain`] renders the identical tree with colouring
//! turned off so tests can assert against it without stripping escapes
//! (§9 design note: keep colour behind a flag).

use crate::ast::{Expr, Program, Stmt};
use colored::{ColoredString, Colorize};

const INDENT: &str = "  ";

/// Pretty-prints `program`. When `recursive` is `false`, only the top-level
/// node is rendered — its children are summarised by count, not expanded.
#[must_use]
pub fn ast_debug_string(program: &Program, recursive: bool) -> String {
    render(program, recursive, true)
}

/// Same as [`ast_debug_string`] without ANSI colour codes.
#[must_use]
pub fn ast_debug_string_plain(program: &Program, recursive: bool) -> String {
    render(program, recursive, false)
}

fn render(program: &Program, recursive: bool, color: bool) -> String {
    let mut out = String::new();
    write_type(&mut out, "Program", color);
    out.push('\n');
    if recursive {
        for stmt in &program.statements {
            write_stmt(&mut out, stmt, 1, color);
        }
    } else {
        write_field_line(&mut out, 1, "statements", &format!("{} statement(s)", program.statements.len()), color);
    }
    out
}

fn paint(s: &str, color: bool, f: impl Fn(&str) -> ColoredString) -> String {
    if color { f(s).to_string() } else { s.to_string() }
}

fn write_type(out: &mut String, name: &str, color: bool) {
    out.push_str(&paint(name, color, |s| s.cyan().bold()));
}

fn write_field_line(out: &mut String, depth: usize, key: &str, value: &str, color: bool) {
    out.push_str(&INDENT.repeat(depth));
    out.push_str(&paint(key, color, |s| s.yellow()));
    out.push_str(": ");
    out.push_str(value);
    out.push('\n');
}

fn write_node_line(out: &mut String, depth: usize, name: &str, color: bool) {
    out.push_str(&INDENT.repeat(depth));
    write_type(out, name, color);
    out.push('\n');
}

fn write_expr(out: &mut String, expr: &Expr, depth: usize, color: bool) {
    match expr {
        Expr::Int(e) => {
            write_node_line(out, depth, "IntLiteral", color);
            write_field_line(out, depth + 1, "value", &e.value.to_string(), color);
        }
        Expr::Float(e) => {
            write_node_line(out, depth, "FloatLiteral", color);
            write_field_line(out, depth + 1, "value", &e.value.to_string(), color);
        }
        Expr::Bool(e) => {
            write_node_line(out, depth, "BoolLiteral", color);
            write_field_line(out, depth + 1, "value", &e.value.to_string(), color);
        }
        Expr::Nil(_) => write_node_line(out, depth, "NilLiteral", color),
        Expr::Ident(e) => {
            write_node_line(out, depth, "Identifier", color);
            write_field_line(out, depth + 1, "name", &e.name, color);
        }
        Expr::Prefix(e) => {
            write_node_line(out, depth, "PrefixExpr", color);
            write_field_line(out, depth + 1, "op", e.op.as_str().trim(), color);
            write_expr(out, &e.operand, depth + 1, color);
        }
        Expr::Infix(e) => {
            write_node_line(out, depth, "InfixExpr", color);
            write_field_line(out, depth + 1, "op", e.op.as_str(), color);
            write_expr(out, &e.left, depth + 1, color);
            write_expr(out, &e.right, depth + 1, color);
        }
        Expr::FnLiteral(e) => {
            write_node_line(out, depth, "FnLiteral", color);
            write_field_line(out, depth + 1, "params", &format!("{}", e.params.len()), color);
            write_block(out, &e.body, depth + 1, color);
        }
        Expr::StringLit(e) => {
            write_node_line(out, depth, "StringLiteral", color);
            write_field_line(out, depth + 1, "value", &format!("{:?}", e.value), color);
        }
        Expr::ArrayLit(e) => {
            write_node_line(out, depth, "ArrayLiteral", color);
            for el in &e.elements {
                write_expr(out, el, depth + 1, color);
            }
        }
        Expr::MapLit(e) => {
            write_node_line(out, depth, "MapLiteral", color);
            for (k, v) in &e.pairs {
                write_expr(out, k, depth + 1, color);
                write_expr(out, v, depth + 1, color);
            }
        }
        Expr::Call(e) => {
            write_node_line(out, depth, "CallExpr", color);
            write_expr(out, &e.callee, depth + 1, color);
            for arg in &e.args {
                write_expr(out, arg, depth + 1, color);
            }
        }
        Expr::Dot(e) => {
            write_node_line(out, depth, "DotExpr", color);
            write_field_line(out, depth + 1, "name", &e.name, color);
            write_expr(out, &e.receiver, depth + 1, color);
        }
        Expr::Subscript(e) => {
            write_node_line(out, depth, "SubscriptExpr", color);
            write_expr(out, &e.target, depth + 1, color);
            write_expr(out, &e.index, depth + 1, color);
        }
        Expr::SelfAccess(e) => {
            write_node_line(out, depth, "SelfAccessExpr", color);
            write_field_line(out, depth + 1, "name", e.name.as_deref().unwrap_or("<none>"), color);
        }
        Expr::SuperAccess(e) => {
            write_node_line(out, depth, "SuperAccessExpr", color);
            write_field_line(out, depth + 1, "name", &e.name, color);
        }
        Expr::ClassAccess(e) => {
            write_node_line(out, depth, "ClassAccessExpr", color);
            write_field_line(out, depth + 1, "name", &e.name, color);
        }
    }
}

fn write_block(out: &mut String, block: &crate::ast::BlockStmt, depth: usize, color: bool) {
    write_node_line(out, depth, "BlockStmt", color);
    for s in &block.statements {
        write_stmt(out, s, depth + 1, color);
    }
}

fn write_stmt(out: &mut String, stmt: &Stmt, depth: usize, color: bool) {
    match stmt {
        Stmt::Var(s) => {
            write_node_line(out, depth, "VarStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            write_field_line(out, depth + 1, "is_con", &s.is_con.to_string(), color);
            write_expr(out, &s.value, depth + 1, color);
        }
        Stmt::Return(s) => {
            write_node_line(out, depth, "ReturnStmt", color);
            if let Some(v) = &s.value {
                write_expr(out, v, depth + 1, color);
            }
        }
        Stmt::Expr(s) => {
            write_node_line(out, depth, "ExprStmt", color);
            write_expr(out, &s.expr, depth + 1, color);
        }
        Stmt::If(s) => {
            write_node_line(out, depth, "IfStmt", color);
            write_expr(out, &s.condition, depth + 1, color);
            write_block(out, &s.consequence, depth + 1, color);
            for elif in &s.elifs {
                write_node_line(out, depth + 1, "ElifClause", color);
                write_expr(out, &elif.condition, depth + 2, color);
                write_block(out, &elif.consequence, depth + 2, color);
            }
            if let Some(alt) = &s.alternative {
                write_block(out, alt, depth + 1, color);
            }
        }
        Stmt::Block(s) => write_block(out, s, depth, color),
        Stmt::Assign(s) => {
            write_node_line(out, depth, "AssignStmt", color);
            write_field_line(out, depth + 1, "op", s.op.as_str(), color);
            write_expr(out, &s.target, depth + 1, color);
            write_expr(out, &s.value, depth + 1, color);
        }
        Stmt::FnDecl(s) => {
            write_node_line(out, depth, "FnDeclStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            write_block(out, &s.body, depth + 1, color);
        }
        Stmt::ClassDecl(s) => {
            write_node_line(out, depth, "ClassDeclStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            write_field_line(out, depth + 1, "parent", s.parent.as_deref().unwrap_or("<none>"), color);
            for member in &s.body {
                write_stmt(out, member, depth + 1, color);
            }
        }
        Stmt::InstanceVar(s) => {
            write_node_line(out, depth, "InstanceVarStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            if let Some(v) = &s.value {
                write_expr(out, v, depth + 1, color);
            }
        }
        Stmt::Method(s) => {
            write_node_line(out, depth, "MethodStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            write_block(out, &s.body, depth + 1, color);
        }
        Stmt::ClassVar(s) => {
            write_node_line(out, depth, "ClassVarStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            write_expr(out, &s.value, depth + 1, color);
        }
        Stmt::ClassMethod(s) => {
            write_node_line(out, depth, "ClassMethodStmt", color);
            write_field_line(out, depth + 1, "name", &s.name, color);
            write_block(out, &s.body, depth + 1, color);
        }
        Stmt::While(s) => {
            write_node_line(out, depth, "WhileStmt", color);
            write_expr(out, &s.condition, depth + 1, color);
            write_block(out, &s.body, depth + 1, color);
        }
        Stmt::Continue(_) => write_node_line(out, depth, "ContinueStmt", color),
        Stmt::Break(_) => write_node_line(out, depth, "BreakStmt", color),
        Stmt::ForIn(s) => {
            write_node_line(out, depth, "ForInStmt", color);
            write_field_line(out, depth + 1, "index", s.index.as_deref().unwrap_or("<none>"), color);
            write_field_line(out, depth + 1, "element", &s.element, color);
            write_expr(out, &s.iterable, depth + 1, color);
            write_block(out, &s.body, depth + 1, color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parse, tokenize};

    fn parse_ok(src: &str) -> Program {
        let (tokens, lex_err) = tokenize(src);
        assert!(lex_err.is_none());
        let (program, parse_err) = parse(tokens);
        assert!(parse_err.is_none(), "{parse_err:?}");
        program
    }

    #[test]
    fn plain_output_has_no_escape_sequences() {
        let program = parse_ok("var five = 5;\n");
        let plain = ast_debug_string_plain(&program, true);
        assert!(!plain.contains('\u{1b}'));
        assert!(plain.contains("VarStmt"));
        assert!(plain.contains("IntLiteral"));
    }

    #[test]
    fn colored_output_carries_escape_sequences() {
        let program = parse_ok("var five = 5;\n");
        let colored = ast_debug_string(&program, true);
        assert!(colored.contains('\u{1b}'));
    }

    #[test]
    fn non_recursive_output_summarises_children() {
        let program = parse_ok("var a = 1; var b = 2;\n");
        let plain = ast_debug_string_plain(&program, false);
        assert!(plain.contains("2 statement(s)"));
        assert!(!plain.contains("VarStmt"));
    }
}
