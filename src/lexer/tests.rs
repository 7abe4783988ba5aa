//! Unit tests for the lexer module.
//!
//! This module contains tests for tokenization including:
//! - Keywords (case-insensitive) and identifiers
//! - Variables and namespaced class names
//! - Annotation delimiters and comments
//! - String literals with escape sequences
//! - Operators and punctuation
//! - Error cases

use super::{lexer::tokenize, symbols::SymbolKind};

fn kinds(source: &str) -> Vec<SymbolKind> {
    tokenize(source.to_string(), Some("test.php".to_string()))
        .unwrap()
        .iter()
        .map(|symbol| symbol.kind)
        .collect()
}

#[test]
fn test_tokenize_keywords() {
    let symbols = kinds("function return if else elseif while do for foreach switch try catch finally throw");

    assert_eq!(
        symbols,
        vec![
            SymbolKind::Function,
            SymbolKind::Return,
            SymbolKind::If,
            SymbolKind::Else,
            SymbolKind::ElseIf,
            SymbolKind::While,
            SymbolKind::Do,
            SymbolKind::For,
            SymbolKind::Foreach,
            SymbolKind::Switch,
            SymbolKind::Try,
            SymbolKind::Catch,
            SymbolKind::Finally,
            SymbolKind::Throw,
            SymbolKind::EOF,
        ]
    );
}

#[test]
fn test_keywords_are_case_insensitive() {
    assert_eq!(
        kinds("TRUE False NULL Die"),
        vec![SymbolKind::True, SymbolKind::False, SymbolKind::Null, SymbolKind::Exit, SymbolKind::EOF]
    );
}

#[test]
fn test_tokenize_variables_and_names() {
    let symbols = tokenize("$foo \\Ns\\Bar baz_1".to_string(), None).unwrap();

    assert_eq!(symbols[0].kind, SymbolKind::Variable);
    assert_eq!(symbols[0].value, "foo");
    assert_eq!(symbols[1].kind, SymbolKind::Identifier);
    assert_eq!(symbols[1].value, "\\Ns\\Bar");
    assert_eq!(symbols[2].kind, SymbolKind::Identifier);
    assert_eq!(symbols[2].value, "baz_1");
}

#[test]
fn test_tokenize_annotation() {
    let symbols = tokenize("/*. int[string] .*/ $x".to_string(), None).unwrap();
    let values: Vec<&str> = symbols.iter().map(|symbol| symbol.value.as_str()).collect();

    assert_eq!(symbols[0].kind, SymbolKind::OpenAnnotation);
    assert_eq!(values[1..6], ["int", "[", "string", "]", ".*/"]);
    assert_eq!(symbols[5].kind, SymbolKind::CloseAnnotation);
    assert_eq!(symbols[6].kind, SymbolKind::Variable);
}

#[test]
fn test_comments_and_tags_are_skipped() {
    let source = "<?php\n// line\n# hash\n/* block\n comment */ echo 1; ?>";

    assert_eq!(
        kinds(source),
        vec![SymbolKind::Echo, SymbolKind::Number, SymbolKind::Semicolon, SymbolKind::EOF]
    );
}

#[test]
fn test_tokenize_strings() {
    let symbols = tokenize("\"a\\nb\" 'it\\'s' \"q\\\"\"".to_string(), None).unwrap();

    assert_eq!(symbols[0].kind, SymbolKind::String);
    assert_eq!(symbols[0].value, "a\nb");
    assert_eq!(symbols[1].value, "it's");
    assert_eq!(symbols[2].value, "q\"");
}

#[test]
fn test_single_quoted_strings_keep_escapes() {
    let symbols = tokenize("'a\\nb'".to_string(), None).unwrap();
    assert_eq!(symbols[0].value, "a\\nb");
}

#[test]
fn test_tokenize_operators() {
    assert_eq!(
        kinds("=== !== == != => -> :: .= . .*/"),
        vec![
            SymbolKind::Identical,
            SymbolKind::NotIdentical,
            SymbolKind::Equals,
            SymbolKind::NotEquals,
            SymbolKind::DoubleArrow,
            SymbolKind::Arrow,
            SymbolKind::DoubleColon,
            SymbolKind::DotEquals,
            SymbolKind::Dot,
            SymbolKind::CloseAnnotation,
            SymbolKind::EOF,
        ]
    );
}

#[test]
fn test_symbol_positions() {
    let symbols = tokenize("if ($x)".to_string(), None).unwrap();

    assert_eq!(symbols[0].span.start.0, 0);
    assert_eq!(symbols[2].span.start.0, 4);
    assert_eq!(symbols[2].span.end.0, 6);
}

#[test]
fn test_spans_cover_source_text() {
    // `"a\n"` is six bytes of source but two characters of value.
    let symbols = tokenize("echo \"a\\n\" . 'b';".to_string(), None).unwrap();

    assert_eq!(symbols[1].value, "a\n");
    assert_eq!((symbols[1].span.start.0, symbols[1].span.end.0), (5, 10));
    assert_eq!(symbols[2].kind, SymbolKind::Dot);
    assert_eq!((symbols[2].span.start.0, symbols[2].span.end.0), (11, 12));
    assert_eq!((symbols[3].span.start.0, symbols[3].span.end.0), (13, 16));

    let eof = symbols.last().unwrap();
    assert_eq!(eof.kind, SymbolKind::EOF);
    assert_eq!((eof.span.start.0, eof.span.end.0), (17, 17));
}

#[test]
fn test_unrecognised_character() {
    let result = tokenize("$x = `ls`;".to_string(), None);

    let error = result.err().unwrap();
    assert_eq!(error.get_error_name(), "UnrecognisedToken");
    assert_eq!(error.get_position().0, 5);
}
