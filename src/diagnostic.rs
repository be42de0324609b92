use std::fmt;

use crate::token::Span;

/// Human-readable error report pointing at a source column.
///
/// Renders as:
///
/// ```text
/// File: main.pieck, Line: 3
///   x = "abc
///       ^ unterminated string
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub span: Span,
    pub source_line: String,
    pub message: String,
}

impl Diagnostic {
    #[must_use]
    pub fn new(span: Span, source_line: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            span,
            source_line: source_line.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "File: {}, Line: {}", self.span.file, self.span.line)?;
        writeln!(f, "{}", self.source_line)?;
        write!(
            f,
            "{:width$}^ {}",
            "",
            self.message,
            width = self.span.column
        )
    }
}
