use dai::{parse, tokenize};
use pretty_assertions::assert_eq;

fn format_source(src: &str) -> String {
    let (tokens, lex_err) = tokenize(src);
    assert!(lex_err.is_none(), "{lex_err:?}");
    let (program, parse_err) = parse(tokens.clone());
    assert!(parse_err.is_none(), "{parse_err:?}");
    dai_fmt::format(&program, &tokens, src.len())
}

macro_rules! assert_fmt {
    ($src:expr, $expected:expr) => {
        assert_eq!(format_source($src), $expected);
    };
}

#[test]
fn fmt_smoke() {
    let _ = tracing_subscriber::fmt().with_max_level(tracing::Level::DEBUG).try_init();
    assert_fmt!("var   a=1234;\nvar b='a';\n", "var a = 1234;\nvar b = 'a';\n");
}

#[test]
fn class_with_parent_and_members() {
    let src = "class Foo < Bar { var a; fn get() { return 1; } class var c = 4; class fn cget() {} }";
    let out = format_source(src);
    assert!(out.starts_with("class Foo < Bar {\n"));
    assert!(out.contains("    var a;\n"));
    assert!(out.contains("    fn get() {\n        return 1;\n    }\n"));
    assert!(out.contains("    class var c = 4;\n"));
    assert!(out.contains("    class fn cget() {\n"));
    assert!(out.ends_with("}\n"));
}

#[test]
fn array_literal_elements_each_get_their_own_line() {
    let out = format_source("[1, 2 * 2, 3 + 3];\n");
    assert_eq!(out, "[\n    1,\n    2 * 2,\n    3 + 3,\n];\n");
}

#[test]
fn if_elif_else_chain() {
    let out = format_source("if (a) { a; } elif (b) { b; } else { c; }\n");
    assert_eq!(out, "if (a) {\n    a;\n}\nelif (b) {\n    b;\n}\nelse {\n    c;\n}\n");
}

#[test]
fn blank_line_between_statements_is_preserved_once() {
    let out = format_source("var a = 1;\n\n\nvar b = 2;\n");
    assert_eq!(out, "var a = 1;\n\nvar b = 2;\n");
}

#[test]
fn format_round_trips_to_a_fixed_point() {
    let cases = [
        "var x = 1;\n",
        "if (x < 10) { x; } else { x; }\n",
        "class Foo { var a; }\n",
        "[1, 2, 3];\n",
        "fn add(a, b) { return a + b; }\n",
    ];
    for src in cases {
        let once = format_source(src);
        let twice = format_source(&once);
        assert_eq!(once, twice, "not idempotent for {src:?}");
    }
}
