//! End-to-end lexer + parser scenarios, plus the invariants and boundary
//! behaviours a correct front end must satisfy for any accepted program.

use dai::ast::{Expr, Stmt};
use dai::{parse, parse_source, tokenize, TokenKind};

fn parse_ok(src: &str) -> dai::Program {
    let (tokens, lex_err) = tokenize(src);
    assert!(lex_err.is_none(), "unexpected lex error: {lex_err:?}");
    let (program, parse_err) = parse(tokens);
    assert!(parse_err.is_none(), "unexpected parse error: {parse_err:?}");
    program
}

#[test]
fn scenario_1_var_five_equals_5() {
    let (tokens, diag) = tokenize("var five = 5;\n");
    assert!(diag.is_none());
    let got: Vec<(TokenKind, &str)> = tokens.as_slice().iter().map(|t| (t.kind, t.lexeme)).collect();
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

    let program = parse_ok("var five = 5;\n");
    assert_eq!(program.statements.len(), 1);
    match &program.statements[0] {
        Stmt::Var(v) => {
            assert!(!v.is_con);
            assert_eq!(v.name, "five");
            match &v.value {
                Expr::Int(lit) => assert_eq!(lit.value, 5),
                other => panic!("expected an int literal, got {other:?}"),
            }
        }
        other => panic!("expected a var statement, got {other:?}"),
    }
}

#[test]
fn scenario_2_precedence_and_literal_form() {
    let program = parse_ok("1 + 2 * 3;\n");
    assert_eq!(program.statements.len(), 1);
    let Stmt::Expr(stmt) = &program.statements[0] else { panic!("expected an expression statement") };
    assert_eq!(stmt.expr.to_literal_string(), "(1 + (2 * 3))");
}

#[test]
fn scenario_3_if_else_with_no_elifs() {
    let program = parse_ok("if (x < y) { x; } else { y; }");
    assert_eq!(program.statements.len(), 1);
    let Stmt::If(stmt) = &program.statements[0] else { panic!("expected an if statement") };
    assert!(matches!(&stmt.condition, Expr::Infix(_)));
    assert_eq!(stmt.consequence.statements.len(), 1);
    assert!(stmt.elifs.is_empty());
    let alt = stmt.alternative.as_ref().expect("expected an else branch");
    assert_eq!(alt.statements.len(), 1);
}

#[test]
fn scenario_4_class_with_parent_and_four_members_in_order() {
    let program =
        parse_ok("class Foo < Bar { var a; fn get() { return 1; } class var c = 4; class fn cget() {} }");
    assert_eq!(program.statements.len(), 1);
    let Stmt::ClassDecl(class) = &program.statements[0] else { panic!("expected a class declaration") };
    assert_eq!(class.name, "Foo");
    assert_eq!(class.parent.as_deref(), Some("Bar"));
    assert_eq!(class.body.len(), 4);
    assert!(matches!(&class.body[0], Stmt::InstanceVar(v) if v.name == "a" && v.value.is_none()));
    assert!(matches!(&class.body[1], Stmt::Method(m) if m.name == "get"));
    assert!(matches!(&class.body[2], Stmt::ClassVar(v) if v.name == "c"));
    assert!(matches!(&class.body[3], Stmt::ClassMethod(m) if m.name == "cget"));
}

#[test]
fn scenario_5_array_literal_form() {
    let program = parse_ok("[1, 2 * 2, 3 + 3]");
    let Stmt::Expr(stmt) = &program.statements[0] else { panic!("expected an expression statement") };
    assert_eq!(stmt.expr.to_literal_string(), "[1, (2 * 2), (3 + 3), ]");
}

#[test]
fn scenario_6_invalid_digit_for_base_reports_invalid_number() {
    let (program, diag) = parse_source("0b12;", "<stdin>");
    assert!(program.statements.is_empty());
    assert_eq!(diag.unwrap().to_string(), "SyntaxError: invalid number in <stdin>:1:1");
}

#[test]
fn invariant_empty_source_yields_an_empty_program() {
    let program = parse_ok("");
    assert!(program.statements.is_empty());
}

#[test]
fn invariant_eof_is_always_the_last_token() {
    for src in ["", "1;", "var x = 1;\nclass Foo {}\n"] {
        let (tokens, diag) = tokenize(src);
        assert!(diag.is_none(), "{src}");
        assert_eq!(tokens.as_slice().last().unwrap().kind, TokenKind::Eof, "{src}");
    }
}

#[test]
fn invariant_token_spans_do_not_go_backwards() {
    let (tokens, _) = tokenize("var x = 1 + 2;\nvar y = x;\n");
    for tok in tokens.as_slice() {
        assert!(tok.span.end.line >= tok.span.start.line);
        if tok.span.end.line == tok.span.start.line {
            assert!(tok.span.end.column >= tok.span.start.column);
        }
    }
}

#[test]
fn invariant_numeric_overflow_message() {
    let (_, diag) = tokenize("99999999999999999999;");
    // The lexer accepts any run of decimal digits; overflow is caught when
    // the parser converts the lexeme to an i64.
    assert!(diag.is_none());
    let (_, parse_err) = parse_source("99999999999999999999;", "<stdin>");
    assert_eq!(parse_err.unwrap().message(), "integer overflow");
}

#[test]
fn invariant_keyword_reservation() {
    // Keywords never lex as identifiers, so code that tries to bind one as a
    // name fails to parse as a var statement with that name.
    let (tokens, diag) = tokenize("class");
    assert!(diag.is_none());
    assert_eq!(tokens.as_slice()[0].kind, TokenKind::Class);
}

#[test]
fn boundary_base_prefix_with_no_digit_is_invalid() {
    for src in ["0b;", "0o;", "0x;"] {
        let (_, diag) = tokenize(src);
        assert_eq!(diag.unwrap().message(), "invalid number", "{src}");
    }
}

#[test]
fn boundary_leading_zero_rejected_but_zero_alone_is_fine() {
    let (_, diag) = tokenize("01;");
    assert_eq!(diag.unwrap().message(), "leading zeros in decimal integer literals are not permitted");

    let (tokens, diag) = tokenize("0;");
    assert!(diag.is_none());
    assert_eq!(tokens.as_slice()[0].kind, TokenKind::Int);
}

#[test]
fn boundary_underscore_at_start_or_end_of_a_run_is_invalid() {
    let (_, diag) = tokenize("1_;");
    assert_eq!(diag.unwrap().message(), "invalid number");
}

#[test]
fn boundary_newline_in_single_or_double_quoted_string_is_unclosed() {
    for src in ["\"a\nb\"", "'a\nb'"] {
        let (_, diag) = tokenize(src);
        assert_eq!(diag.unwrap().message(), "unclosed string literal", "{src}");
    }
}

#[test]
fn diagnostic_text_shape_matches_the_bit_exact_examples() {
    let cases: &[(&str, &str)] = &[
        ("$", "SyntaxError: illegal character '$' in <stdin>:1:1"),
        ("\"abc\ndef\"", "SyntaxError: unclosed string literal in <stdin>:1:3"),
        ("01;", "SyntaxError: leading zeros in decimal integer literals are not permitted in <stdin>:1:1"),
    ];
    for (src, expected) in cases {
        let (_, diag) = tokenize(src);
        assert_eq!(diag.unwrap().with_filename("<stdin>").to_string(), *expected, "{src}");
    }
}

#[test]
fn unexpected_token_diagnostic_names_both_kinds() {
    let (_, diag) = parse_source("var x = ;", "<stdin>");
    let message = diag.unwrap().message().to_string();
    assert!(message.starts_with("expected token to be"), "{message}");
}

#[test]
fn no_prefix_parse_function_diagnostic() {
    let (_, diag) = parse_source(");", "<stdin>");
    let message = diag.unwrap().message().to_string();
    assert!(message.starts_with("no prefix parse function for"), "{message}");
}

#[test]
fn for_in_with_and_without_an_index_binding() {
    let program = parse_ok("for (var e in items) { e; }");
    let Stmt::ForIn(stmt) = &program.statements[0] else { panic!("expected a for-in statement") };
    assert!(stmt.index.is_none());
    assert_eq!(stmt.element, "e");

    let program = parse_ok("for (var i, e in items) { e; }");
    let Stmt::ForIn(stmt) = &program.statements[0] else { panic!("expected a for-in statement") };
    assert_eq!(stmt.index.as_deref(), Some("i"));
    assert_eq!(stmt.element, "e");
}

#[test]
fn compound_assignment_retains_its_operator() {
    let program = parse_ok("x += 1;");
    let Stmt::Assign(stmt) = &program.statements[0] else { panic!("expected an assign statement") };
    assert_eq!(stmt.op, dai::ast::AssignOp::PlusAssign);
}
