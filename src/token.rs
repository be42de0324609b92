use std::fmt;

/// Source location for error reporting.
///
/// `line` is 1-based, `column` is a 0-based character offset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

/// Reserved words of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Def,
    Print,
    For,
    In,
    Return,
    Let,
}

impl Keyword {
    /// All reserved words, in the order their matchers run.
    pub const ALL: [Self; 6] = [
        Self::Def,
        Self::Print,
        Self::For,
        Self::In,
        Self::Return,
        Self::Let,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Def => "def",
            Self::Print => "print",
            Self::For => "for",
            Self::In => "in",
            Self::Return => "return",
            Self::Let => "let",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token kinds produced by the tokenizer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Delimited reserved word (`def`, `for`, ...).
    Keyword(Keyword),
    /// Alphabetic start, alphanumeric tail.
    Identifier,
    /// Integer or decimal literal (`1`, `2.5`, `.5`).
    Number,
    /// Quoted string, delimiters included in the text.
    String,
    /// Operator or separator, one or two characters.
    Punctuation,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Keyword(_) => write!(f, "keyword"),
            Self::Identifier => write!(f, "identifier"),
            Self::Number => write!(f, "number"),
            Self::String => write!(f, "string"),
            Self::Punctuation => write!(f, "punctuation"),
        }
    }
}

/// A single token with its kind, exact lexeme, and start location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    #[must_use]
    pub fn is_punct(&self, text: &str) -> bool {
        self.kind == TokenKind::Punctuation && self.text == text
    }

    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }
}
