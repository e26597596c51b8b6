//! Canonical rendering and syntax errors.

mod common;

use common::{canonical, parse_errors};
use pretty_assertions::assert_eq;

#[test]
fn precedence_is_made_explicit() {
    assert_eq!(canonical("1 + 2 * 3"), "(1 + (2 * 3))");
    assert_eq!(canonical("a + b * c + d / e - f"), "(((a + (b * c)) + (d / e)) - f)");
    assert_eq!(canonical("-a * b"), "((-a) * b)");
    assert_eq!(canonical("!-a"), "(!(-a))");
    assert_eq!(canonical("5 > 4 == 3 < 4"), "((5 > 4) == (3 < 4))");
    assert_eq!(
        canonical("add(a + b + c * d / f + g)"),
        "add((((a + b) + ((c * d) / f)) + g))"
    );
    assert_eq!(
        canonical("a * [1, 2, 3, 4][b * c] * d"),
        "((a * ([ 1, 2, 3, 4 ][(b * c)])) * d)"
    );
}

#[test]
fn canonical_form_is_independent_of_layout() {
    let tidy = canonical("let f = fn(x, y) { return x + y; }; f(1, 2)");
    let messy = canonical("let f=fn(x,y){\n  return x+y\n}\nf( 1 ,2 )");
    assert_eq!(tidy, messy);
    assert_eq!(tidy, "let f = fn(x, y) { return (x + y) }; f(1, 2)");
}

#[test]
fn canonical_form_reparses_to_itself() {
    let programs = [
        "let x = 5; let y = x * 2; return x + y",
        "if (a < b) { a } else if b < c { b } else { c }",
        "let adder = fn(x) { fn(y) { x + y } }; adder(1)(2)",
        r#"let s = "hi"; s + " there""#,
        "xs := [1, [2, 3], []]; xs[1][0]",
        "k :: 1; v := k; v = v + 1",
        "{ a := 1; { b := 2 } }",
        "fn() {}",
        "!(true == !false)",
    ];
    for source in programs.iter() {
        let once = canonical(source);
        assert_eq!(canonical(&once), once, "source {:?}", source);
    }
}

#[test]
fn empty_arrays_keep_their_padding() {
    assert_eq!(canonical("[]"), "[  ]");
}

#[test]
fn syntax_errors_are_positioned() {
    assert_eq!(
        parse_errors("let = 5")[0],
        "[1:5] expected next token to be \"IDENT\", got \"=\" instead"
    );
    assert_eq!(
        parse_errors("fn(x) { x"),
        vec!["[1:10] expected next token to be \"}\", got \"EOF\" instead"]
    );
    assert_eq!(
        parse_errors("\n  )"),
        vec!["[2:3] no prefix parse function for \")\" found"]
    );
}

#[test]
fn illegal_characters_surface_as_missing_prefix_rules() {
    assert_eq!(
        parse_errors("1 + @"),
        vec!["[1:5] no prefix parse function for \"ILLEGAL\" found"]
    );
    assert_eq!(
        parse_errors("x := ٣"),
        vec!["[1:6] no prefix parse function for \"ILLEGAL\" found"]
    );
}

#[test]
fn oversized_integers_are_rejected() {
    assert_eq!(
        parse_errors("99999999999999999999"),
        vec!["[1:1] could not parse \"99999999999999999999\" as integer"]
    );
}

#[test]
fn errors_accumulate_across_statements() {
    let errors = parse_errors("let = 1; let y 2; let z = 3");
    assert!(errors.len() >= 2, "{:?}", errors);
    assert!(errors[0].starts_with("[1:5]"));
    assert!(errors
        .iter()
        .any(|e| e == "[1:16] expected next token to be \"=\", got \"INT\" instead"));
}
