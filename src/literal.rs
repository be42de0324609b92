//! Reads nested tensor literals from a token stream into a [`ValueArena`].
//!
//! ```text
//! literal := number | '-' number | '[' literal (',' literal)* ']'
//! ```
//!
//! No shape is checked here; see [`ValueArena::shape`]. Nesting is capped
//! at [`MAX_NESTING`] brackets, which also bounds the depth of every tree
//! the shape engine walks for a literal.

use std::fmt;
use std::io::BufRead;

use crate::diagnostic::Diagnostic;
use crate::lexer::Tokenizer;
use crate::token::{Span, Token, TokenKind};
use crate::value::{Value, ValueArena, ValueId};

/// Deepest bracket nesting a literal may have.
pub const MAX_NESTING: usize = 128;

/// Classifies a literal-reader error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Found a token that cannot appear here.
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },
    /// Input ended in the middle of a literal.
    UnexpectedEnd { expected: &'static str },
    /// Number lexeme that does not convert to `f64`.
    InvalidNumber(String),
    /// Opening bracket beyond the given nesting limit.
    NestingTooDeep(usize),
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, got '{found}'")
            }
            Self::UnexpectedEnd { expected } => {
                write!(f, "expected {expected}, got end of input")
            }
            Self::InvalidNumber(text) => {
                write!(f, "{text} cannot be converted into a double value")
            }
            Self::NestingTooDeep(limit) => {
                write!(f, "tensor literal nested deeper than {limit} levels")
            }
        }
    }
}

/// Error produced while reading a literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {kind} at line {}, column {}", span.file, span.line, span.column)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    /// The offending line, or empty if the reader had already moved past it.
    pub source_line: String,
}

impl ParseError {
    /// Render the file/line/caret report for this error.
    #[must_use]
    pub fn diagnostic(&self) -> Diagnostic {
        Diagnostic::new(
            self.span.clone(),
            self.source_line.clone(),
            self.kind.to_string(),
        )
    }
}

/// Read the literal that starts at the next token.
///
/// # Errors
///
/// Returns `Error::Lex` if the tokenizer fails and `Error::Parse` if the
/// tokens do not form a literal or nest deeper than [`MAX_NESTING`].
pub fn read_literal<R: BufRead>(
    tokens: &mut Tokenizer<R>,
    arena: &mut ValueArena,
) -> Result<ValueId, crate::Error> {
    Reader {
        tokens,
        arena,
        depth: 0,
    }
    .value()
}

/// Read a single literal from `input`, allowing one trailing `;`.
///
/// # Errors
///
/// As [`read_literal`], plus `Error::Parse` if anything follows the
/// literal.
pub fn parse_literal(input: &str, arena: &mut ValueArena) -> Result<ValueId, crate::Error> {
    let mut tokens = Tokenizer::from_source("<literal>", input)?;
    let id = read_literal(&mut tokens, arena)?;

    if tokens.next_token()? {
        let trailing_semicolon = tokens.current().is_some_and(|t| t.is_punct(";"));
        if !trailing_semicolon || tokens.next_token()? {
            let token = tokens.current();
            return Err(unexpected(&tokens, token, "end of input").into());
        }
    }
    Ok(id)
}

fn parse_error<R: BufRead>(
    tokens: &Tokenizer<R>,
    kind: ParseErrorKind,
    span: Span,
) -> ParseError {
    ParseError {
        source_line: tokens.source_line_at(&span),
        kind,
        span,
    }
}

/// `UnexpectedToken` at `token`, or `UnexpectedEnd` at the cursor.
fn unexpected<R: BufRead>(
    tokens: &Tokenizer<R>,
    token: Option<&Token>,
    expected: &'static str,
) -> ParseError {
    match token {
        Some(token) => parse_error(
            tokens,
            ParseErrorKind::UnexpectedToken {
                expected,
                found: token.text.clone(),
            },
            token.span.clone(),
        ),
        None => parse_error(
            tokens,
            ParseErrorKind::UnexpectedEnd { expected },
            tokens.position().clone(),
        ),
    }
}

struct Reader<'a, R> {
    tokens: &'a mut Tokenizer<R>,
    arena: &'a mut ValueArena,
    /// Open brackets enclosing the cursor.
    depth: usize,
}

impl<R: BufRead> Reader<'_, R> {
    /// Pull the next token or fail with `UnexpectedEnd`.
    fn advance(&mut self, expected: &'static str) -> Result<Token, crate::Error> {
        if self.tokens.next_token()? {
            if let Some(token) = self.tokens.current() {
                return Ok(token.clone());
            }
        }
        Err(unexpected(self.tokens, None, expected).into())
    }

    fn value(&mut self) -> Result<ValueId, crate::Error> {
        let token = self.advance("a number or '['")?;
        self.value_from(token)
    }

    fn value_from(&mut self, token: Token) -> Result<ValueId, crate::Error> {
        if token.is_punct("[") {
            return self.tensor(token.span);
        }
        if token.is_punct("-") {
            let number = self.advance("a number")?;
            return self.scalar(&number, true, token.span);
        }
        self.scalar(&token, false, token.span.clone())
    }

    fn scalar(
        &mut self,
        token: &Token,
        negate: bool,
        span: Span,
    ) -> Result<ValueId, crate::Error> {
        if token.kind != TokenKind::Number {
            let expected = if negate {
                "a number"
            } else {
                "a number or '['"
            };
            return Err(unexpected(self.tokens, Some(token), expected).into());
        }
        let Ok(value) = token.text.parse::<f64>() else {
            let kind = ParseErrorKind::InvalidNumber(token.text.clone());
            return Err(parse_error(self.tokens, kind, token.span.clone()).into());
        };
        let value = if negate { -value } else { value };
        Ok(self.arena.alloc(Value::Scalar(value), Some(span)))
    }

    /// Tensor whose opening `[` is at `span`.
    fn tensor(&mut self, span: Span) -> Result<ValueId, crate::Error> {
        if self.depth >= MAX_NESTING {
            let kind = ParseErrorKind::NestingTooDeep(MAX_NESTING);
            return Err(parse_error(self.tokens, kind, span).into());
        }
        self.depth += 1;
        let tensor = self.elements(span);
        self.depth -= 1;
        tensor
    }

    /// Elements after an opening `[` up to and including the `]`.
    fn elements(&mut self, span: Span) -> Result<ValueId, crate::Error> {
        let mut children = Vec::new();
        let mut token = self.advance("a number, '[' or ']'")?;

        if !token.is_punct("]") {
            loop {
                children.push(self.value_from(token)?);
                let separator = self.advance("',' or ']'")?;
                if separator.is_punct("]") {
                    break;
                }
                if !separator.is_punct(",") {
                    return Err(unexpected(self.tokens, Some(&separator), "',' or ']'").into());
                }
                token = self.advance("a number or '['")?;
            }
        }

        Ok(self.arena.alloc(Value::Tensor(children), Some(span)))
    }
}
