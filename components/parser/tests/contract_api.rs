//! Contract tests for parser API
//!
//! These tests verify the parser component implements its contract correctly.

use core_types::{ErrorKind, JsError};
use parser::ast::{Expression, FunctionBody, MemberProperty, Statement};
use parser::{Lexer, Parser, Program, Token};

// =============================================================================
// Lexer Contract Tests
// =============================================================================

#[test]
fn test_lexer_tokenize_ends_with_eof() {
    let tokens = Lexer::new("let x = 42;").tokenize().unwrap();
    assert_eq!(tokens.last().map(|t| &t.token), Some(&Token::EOF));
}

#[test]
fn test_lexer_error_is_syntax_error() {
    let result: Result<_, JsError> = Lexer::new("'unterminated").tokenize();
    assert_eq!(result.unwrap_err().kind, ErrorKind::SyntaxError);
}

#[test]
fn test_lexer_skips_hashbang() {
    let tokens = Lexer::new("#!/usr/bin/env node\nx").tokenize().unwrap();
    assert_eq!(tokens[0].token, Token::Identifier("x".to_string()));
}

// =============================================================================
// Parser Contract Tests
// =============================================================================

#[test]
fn test_parser_returns_program() {
    let result: Result<Program, JsError> = Parser::new("let x = 42;").parse();
    assert_eq!(result.unwrap().body.len(), 1);
}

#[test]
fn test_parser_error_has_position() {
    let err = Parser::new("let x = ;").parse().unwrap_err();
    assert_eq!(err.kind, ErrorKind::SyntaxError);
    assert!(err.source_position.is_some());
}

#[test]
fn test_parse_node_style_callback_script() {
    let source = r#"
        var fs = require('fs')
        fs.writeFile('test.txt', 'Hello, World!', function(err) {
            if (err) throw err
            fs.readdir('.', (err, files) => {
                global.files = files
            })
        })
    "#;
    let program = Parser::new(source).parse().unwrap();
    assert_eq!(program.body.len(), 2);

    match &program.body[1] {
        Statement::ExpressionStatement {
            expression: Expression::CallExpression { callee, arguments, .. },
            ..
        } => {
            assert!(matches!(
                &**callee,
                Expression::MemberExpression {
                    property: MemberProperty::Named(name),
                    ..
                } if name == "writeFile"
            ));
            assert_eq!(arguments.len(), 3);
            match &arguments[2] {
                Expression::FunctionExpression { function, .. } => {
                    assert!(!function.is_arrow);
                    assert!(matches!(function.body, FunctionBody::Block(ref b) if b.len() == 2));
                }
                other => panic!("unexpected argument {:?}", other),
            }
        }
        other => panic!("unexpected statement {:?}", other),
    }
}

#[test]
fn test_statement_positions_are_one_indexed() {
    let program = Parser::new("a;\n  b;").parse().unwrap();
    let second = program.body[1].position();
    assert_eq!((second.line, second.column), (2, 3));
}
