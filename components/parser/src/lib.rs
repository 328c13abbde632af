//! Script Parser Component
//!
//! Provides the lexer, the recursive descent parser and the AST for the
//! script language evaluated by the interpreter.
//!
//! # Overview
//!
//! - [`Lexer`] - Tokenizes script source code
//! - [`Token`] - Token types including identifiers, literals, keywords
//! - [`Parser`] - Recursive descent parser producing a [`Program`]
//! - [`ast`] - Abstract Syntax Tree node types
//!
//! # Example
//!
//! ```
//! use parser::Parser;
//!
//! let source = "let x = 42;";
//! let mut parser = Parser::new(source);
//! let program = parser.parse().unwrap();
//! assert_eq!(program.body.len(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;

pub use ast::{Expression, FunctionNode, Program, Statement};
pub use lexer::{Keyword, Lexer, Punctuator, SpannedToken, Token};
pub use parser::Parser;
