//! Front end for Pieck, a small Python-like language for matrix
//! computation.
//!
//! Two pieces live here: a line-buffered tokenizer built as an ordered
//! chain of matchers, and a lazy, memoized shape engine for nested
//! tensor literals.
//!
//! # Quick start
//!
//! ## Tokenize a statement
//!
//! ```
//! use pieck::{TokenKind, tokenize};
//!
//! let tokens = tokenize("x = 1;").unwrap();
//! let texts: Vec<_> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, ["x", "=", "1", ";"]);
//! assert_eq!(tokens[0].kind, TokenKind::Identifier);
//! ```
//!
//! ## Infer the shape of a tensor literal
//!
//! ```
//! use pieck::{Shape, ValueArena, parse_literal};
//!
//! let mut arena = ValueArena::new();
//! let m = parse_literal("[[1, 2, 3], [2, 3, 4]]", &mut arena).unwrap();
//! assert_eq!(arena.shape(m).unwrap(), Shape::new([2, 3]));
//!
//! let ragged = parse_literal("[[1, 2], [3]]", &mut arena).unwrap();
//! assert!(arena.shape(ragged).is_err());
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

pub mod diagnostic;
pub mod lexer;
pub mod literal;
pub mod shape;
pub mod source;
pub mod token;
pub mod value;

pub use diagnostic::Diagnostic;
pub use lexer::{LexError, LexErrorKind, Tokenizer, tokenize};
pub use literal::{MAX_NESTING, ParseError, ParseErrorKind, parse_literal, read_literal};
pub use shape::{Shape, ShapeError, ShapeErrorKind, compute_shape};
pub use source::LineBuffer;
pub use token::{Keyword, Span, Token, TokenKind};
pub use value::{Value, ValueArena, ValueId};

/// Unified error type for every front-end stage.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A lexer error.
    #[error("{0}")]
    Lex(#[from] LexError),
    /// A literal-reader error.
    #[error("{0}")]
    Parse(#[from] ParseError),
    /// A ragged or empty tensor.
    #[error("{0}")]
    Shape(#[from] ShapeError),
    /// The source could not be opened.
    #[error("{0}")]
    Io(#[from] std::io::Error),
}

/// Read one tensor literal from `input` and infer its shape.
pub fn shape_of_str(input: &str) -> Result<Shape, Error> {
    let mut arena = ValueArena::new();
    let id = parse_literal(input, &mut arena)?;
    Ok(arena.shape(id)?)
}
