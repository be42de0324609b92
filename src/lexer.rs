use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::diagnostic::Diagnostic;
use crate::source::LineBuffer;
use crate::token::{Keyword, Span, Token, TokenKind};

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Quote opened but not closed before end of line.
    UnterminatedString,
    /// Punctuation character outside the recognised set.
    UnexpectedPunctuation(char),
    /// Character that no matcher recognises.
    UnexpectedCharacter(char),
    /// Lookahead or consumption past the end of the resident line.
    CursorOutOfBounds { requested: usize, remaining: usize },
    /// The underlying reader failed.
    Read(String),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnterminatedString => write!(f, "unterminated string"),
            Self::UnexpectedPunctuation(ch) => {
                write!(f, "unexpected punctuation: {ch}")
            }
            Self::UnexpectedCharacter(ch) => {
                write!(f, "unexpected character: {ch}")
            }
            Self::CursorOutOfBounds {
                requested,
                remaining,
            } => {
                write!(
                    f,
                    "{requested} character(s) requested but only \
                     {remaining} remain on this line"
                )
            }
            Self::Read(msg) => write!(f, "read failed: {msg}"),
        }
    }
}

/// Error produced during lexing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {kind} at line {}, column {}", span.file, span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
    /// The resident line when the error was raised.
    pub source_line: String,
}

impl LexError {
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

/// Tokenize an in-memory source string into a sequence of tokens.
///
/// # Errors
///
/// Returns `LexError` on unterminated strings or unrecognised
/// characters.
pub fn tokenize(input: &str) -> Result<Vec<Token>, LexError> {
    let mut tokenizer = Tokenizer::from_source("<input>", input)?;
    let mut tokens = Vec::new();
    while tokenizer.next_token()? {
        tokens.extend(tokenizer.current().cloned());
    }
    Ok(tokens)
}

/// Punctuation accepted by the punctuation matcher.
const PUNCTUATION: &[char] = &[
    '[', ']', '(', ')', ',', ':', ';', '=', '+', '-', '*', '/', '@', '.', '_', '~', '&',
];

/// Starts a comment running to end of line.
const COMMENT: char = '#';

/// One recogniser in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Matcher {
    Keyword(Keyword),
    Identifier,
    Number,
    Str,
    Punctuation,
    Fallback,
}

/// Matchers in priority order. Keywords must precede `Identifier`.
const CHAIN: [Matcher; 11] = [
    Matcher::Keyword(Keyword::Def),
    Matcher::Keyword(Keyword::Print),
    Matcher::Keyword(Keyword::For),
    Matcher::Keyword(Keyword::In),
    Matcher::Keyword(Keyword::Return),
    Matcher::Keyword(Keyword::Let),
    Matcher::Identifier,
    Matcher::Number,
    Matcher::Str,
    Matcher::Punctuation,
    Matcher::Fallback,
];

impl Matcher {
    /// Try to recognise a lexeme at the cursor.
    ///
    /// Returns `Ok(None)` to defer to the next matcher. On a match the
    /// cursor has been advanced past the lexeme.
    fn try_match<R: BufRead>(
        self,
        src: &mut LineBuffer<R>,
    ) -> Result<Option<(TokenKind, String)>, LexError> {
        let len = match self {
            Self::Keyword(keyword) => match_keyword(src, keyword)?,
            Self::Identifier => match_identifier(src)?,
            Self::Number => match_number(src)?,
            Self::Str => match_string(src)?,
            Self::Punctuation => match_punctuation(src)?,
            Self::Fallback => return Err(unexpected(src)),
        };
        let Some(len) = len else {
            return Ok(None);
        };

        let text: String = src.peek_window(len)?.iter().collect();
        src.consume(len)?;
        let kind = match self {
            Self::Keyword(keyword) => TokenKind::Keyword(keyword),
            Self::Identifier => TokenKind::Identifier,
            Self::Number => TokenKind::Number,
            Self::Str => TokenKind::String,
            Self::Punctuation | Self::Fallback => TokenKind::Punctuation,
        };
        Ok(Some((kind, text)))
    }
}

fn unexpected<R: BufRead>(src: &LineBuffer<R>) -> LexError {
    match src.peek(0) {
        Ok(ch) => src.error(LexErrorKind::UnexpectedCharacter(ch)),
        Err(err) => err,
    }
}

/// Keyword text followed by whitespace or end of line.
fn match_keyword<R: BufRead>(
    src: &LineBuffer<R>,
    keyword: Keyword,
) -> Result<Option<usize>, LexError> {
    let word = keyword.as_str();
    let len = word.len();
    if src.remaining_in_line() < len || !src.peek_window(len)?.iter().copied().eq(word.chars()) {
        return Ok(None);
    }
    if src.is_end_of_line(len) || src.peek(len)?.is_whitespace() {
        Ok(Some(len))
    } else {
        Ok(None)
    }
}

fn match_identifier<R: BufRead>(src: &LineBuffer<R>) -> Result<Option<usize>, LexError> {
    if !src.peek(0)?.is_ascii_alphabetic() {
        return Ok(None);
    }
    let mut len = 1;
    while !src.is_end_of_line(len) && src.peek(len)?.is_ascii_alphanumeric() {
        len += 1;
    }
    Ok(Some(len))
}

/// Digits with at most one decimal point; may start with `.digit`.
fn match_number<R: BufRead>(src: &LineBuffer<R>) -> Result<Option<usize>, LexError> {
    let first = src.peek(0)?;
    let leading_point = first == '.' && !src.is_end_of_line(1) && src.peek(1)?.is_ascii_digit();
    if !first.is_ascii_digit() && !leading_point {
        return Ok(None);
    }

    let mut seen_point = leading_point;
    let mut len = 1;
    while !src.is_end_of_line(len) {
        match src.peek(len)? {
            c if c.is_ascii_digit() => len += 1,
            '.' if !seen_point => {
                seen_point = true;
                len += 1;
            }
            _ => break,
        }
    }
    Ok(Some(len))
}

/// Quoted text closed by the same quote on the same line.
fn match_string<R: BufRead>(src: &LineBuffer<R>) -> Result<Option<usize>, LexError> {
    let quote = src.peek(0)?;
    if quote != '"' && quote != '\'' {
        return Ok(None);
    }
    let mut len = 1;
    loop {
        if src.is_end_of_line(len) {
            return Err(src.error(LexErrorKind::UnterminatedString));
        }
        let ch = src.peek(len)?;
        len += 1;
        if ch == quote {
            return Ok(Some(len));
        }
    }
}

fn match_punctuation<R: BufRead>(src: &LineBuffer<R>) -> Result<Option<usize>, LexError> {
    let ch = src.peek(0)?;
    if !ch.is_ascii_punctuation() {
        return Ok(None);
    }
    if !PUNCTUATION.contains(&ch) {
        return Err(src.error(LexErrorKind::UnexpectedPunctuation(ch)));
    }
    let next = if src.is_end_of_line(1) {
        None
    } else {
        Some(src.peek(1)?)
    };
    let compound = matches!(
        (ch, next),
        ('+' | '-' | '*' | '/' | '@', Some('=')) | ('.', Some('T')) | (';', Some(';'))
    );
    Ok(Some(if compound { 2 } else { 1 }))
}

/// Pull-based tokenizer over a line-buffered source.
///
/// Holds at most one token: each successful [`Tokenizer::next_token`]
/// overwrites the previous one.
#[derive(Debug)]
pub struct Tokenizer<R> {
    source: LineBuffer<R>,
    current: Option<Token>,
}

impl<'a> Tokenizer<&'a [u8]> {
    /// Tokenizer over an in-memory string, reported under `file`.
    pub fn from_source(file: impl Into<String>, text: &'a str) -> Result<Self, LexError> {
        Ok(Self::new(LineBuffer::from_source(file, text)?))
    }
}

impl Tokenizer<BufReader<File>> {
    /// Open `path` for tokenizing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, crate::Error> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let source = LineBuffer::new(path.display().to_string(), BufReader::new(file))?;
        Ok(Self::new(source))
    }
}

impl<R: BufRead> Tokenizer<R> {
    #[must_use]
    pub const fn new(source: LineBuffer<R>) -> Self {
        Self {
            source,
            current: None,
        }
    }

    /// Advance to the next token.
    ///
    /// Returns `Ok(false)` when the source is exhausted; in that case no
    /// token was produced and the previous current token is left in place.
    ///
    /// # Errors
    ///
    /// Returns `LexError` on any lexical error. The tokenizer does not
    /// resynchronise afterwards.
    pub fn next_token(&mut self) -> Result<bool, LexError> {
        self.skip_trivia()?;
        if self.source.is_end_of_line(0) && self.source.is_exhausted() {
            return Ok(false);
        }

        let span = self.source.position().clone();
        for matcher in CHAIN {
            if let Some((kind, text)) = matcher.try_match(&mut self.source)? {
                tracing::trace!(
                    kind = %kind,
                    text = %text,
                    line = span.line,
                    column = span.column,
                    "token"
                );
                self.current = Some(Token { kind, text, span });
                return Ok(true);
            }
        }
        // `Fallback` never defers, so the chain cannot run off its end.
        Err(unexpected(&self.source))
    }

    /// Skip whitespace, comments and line ends until a token character or
    /// the end of input.
    fn skip_trivia(&mut self) -> Result<(), LexError> {
        loop {
            while !self.source.is_end_of_line(0) {
                let ch = self.source.peek(0)?;
                if ch == COMMENT {
                    self.source.consume(self.source.remaining_in_line())?;
                } else if ch.is_whitespace() {
                    self.source.consume(1)?;
                } else {
                    return Ok(());
                }
            }
            if self.source.is_exhausted() {
                return Ok(());
            }
            self.source.advance_line()?;
        }
    }

    #[must_use]
    pub const fn current(&self) -> Option<&Token> {
        self.current.as_ref()
    }

    #[must_use]
    pub fn current_kind(&self) -> Option<&TokenKind> {
        self.current.as_ref().map(|t| &t.kind)
    }

    /// Lexeme of the current token, empty before the first token.
    #[must_use]
    pub fn current_text(&self) -> &str {
        self.current.as_ref().map_or("", |t| t.text.as_str())
    }

    /// Cursor position (not the current token's start).
    #[must_use]
    pub const fn position(&self) -> &Span {
        self.source.position()
    }

    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.source.position().file
    }

    #[must_use]
    pub const fn line(&self) -> usize {
        self.source.position().line
    }

    #[must_use]
    pub const fn column(&self) -> usize {
        self.source.position().column
    }

    /// Diagnostic at the cursor, for callers rejecting a token.
    #[must_use]
    pub fn report(&self, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(
            self.position().clone(),
            self.source.line_text(),
            message,
        )
    }

    /// Diagnostic at `span`. The source line is only available while
    /// `span` is on the resident line.
    #[must_use]
    pub fn report_at(&self, span: &Span, message: impl Into<String>) -> Diagnostic {
        Diagnostic::new(span.clone(), self.source_line_at(span), message)
    }

    /// Text of the line `span` points into, or empty once that line has
    /// been left behind.
    #[must_use]
    pub fn source_line_at(&self, span: &Span) -> String {
        if span.line == self.line() {
            self.source.line_text()
        } else {
            String::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(input: &str) -> Vec<(TokenKind, String)> {
        tokenize(input)
            .expect("should tokenize")
            .into_iter()
            .map(|t| (t.kind, t.text))
            .collect()
    }

    #[test]
    fn chain_puts_keywords_before_identifiers() {
        let first_identifier = CHAIN
            .iter()
            .position(|m| *m == Matcher::Identifier)
            .expect("identifier matcher");
        let keyword_count = CHAIN
            .iter()
            .filter(|m| matches!(m, Matcher::Keyword(_)))
            .count();
        assert_eq!(first_identifier, keyword_count);
        assert_eq!(CHAIN.last(), Some(&Matcher::Fallback));
    }

    #[test]
    fn keyword_needs_delimiter() {
        let tokens = lex("for forX");
        assert_eq!(tokens[0], (TokenKind::Keyword(Keyword::For), "for".into()));
        assert_eq!(tokens[1], (TokenKind::Identifier, "forX".into()));
    }

    #[test]
    fn keyword_at_end_of_line() {
        let tokens = lex("return");
        assert_eq!(
            tokens,
            vec![(TokenKind::Keyword(Keyword::Return), "return".into())]
        );
    }

    #[test]
    fn number_forms() {
        let tokens = lex("12 3.5 .25 1.2.3");
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, ["12", "3.5", ".25", "1.2", ".3"]);
        assert!(tokens.iter().all(|(k, _)| *k == TokenKind::Number));
    }

    #[test]
    fn compound_punctuation() {
        let texts: Vec<_> = lex("+= @= x.T ;; ; .")
            .into_iter()
            .map(|(_, t)| t)
            .collect();
        assert_eq!(texts, ["+=", "@=", "x", ".T", ";;", ";", "."]);
    }

    #[test]
    fn string_includes_quotes() {
        let tokens = lex(r#"'a b' "c""#);
        assert_eq!(tokens[0], (TokenKind::String, "'a b'".into()));
        assert_eq!(tokens[1], (TokenKind::String, "\"c\"".into()));
    }

    #[test]
    fn mismatched_quote_does_not_close() {
        let err = tokenize(r#""abc'"#).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnterminatedString);
        assert_eq!(err.span.column, 0);
    }

    #[test]
    fn unknown_punctuation_is_fatal() {
        let err = tokenize("x = $").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedPunctuation('$'));
        assert_eq!(err.span.column, 4);
    }

    #[test]
    fn non_ascii_hits_fallback() {
        let err = tokenize("x = é").unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter('é'));
    }

    #[test]
    fn comments_are_skipped() {
        let tokens = lex("print x # output\n# whole line\n;;");
        let texts: Vec<_> = tokens.iter().map(|(_, t)| t.as_str()).collect();
        assert_eq!(texts, ["print", "x", ";;"]);
    }

    #[test]
    fn span_tracking() {
        let tokens = tokenize("a\n  bc d").expect("should tokenize");
        assert_eq!((tokens[0].span.line, tokens[0].span.column), (1, 0));
        assert_eq!((tokens[1].span.line, tokens[1].span.column), (2, 2));
        assert_eq!((tokens[2].span.line, tokens[2].span.column), (2, 5));
    }

    #[test]
    fn false_keeps_previous_token() {
        let mut tokenizer = Tokenizer::from_source("t", "x").expect("tokenizer");
        assert!(tokenizer.next_token().expect("token"));
        assert!(!tokenizer.next_token().expect("end"));
        assert_eq!(tokenizer.current_text(), "x");
        assert!(!tokenizer.next_token().expect("still end"));
    }
}
