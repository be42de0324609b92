//! Line-buffered access to source text.
//!
//! Exactly one physical line is resident at a time. The cursor only moves
//! forward within that line; crossing to the next line is an explicit
//! [`LineBuffer::advance_line`] call made by the tokenizer.

use std::io::BufRead;

use crate::lexer::{LexError, LexErrorKind};
use crate::token::Span;

/// Single-pass reader over a line-oriented source.
#[derive(Debug)]
pub struct LineBuffer<R> {
    reader: R,
    line: Vec<char>,
    position: Span,
    exhausted: bool,
}

impl<R: BufRead> LineBuffer<R> {
    /// Wrap `reader` and load its first line.
    ///
    /// # Errors
    ///
    /// Returns `LexError` with [`LexErrorKind::Read`] if the first line
    /// cannot be read.
    pub fn new(file: impl Into<String>, reader: R) -> Result<Self, LexError> {
        let mut buffer = Self {
            reader,
            line: Vec::new(),
            position: Span {
                file: file.into(),
                line: 0,
                column: 0,
            },
            exhausted: false,
        };
        buffer.advance_line()?;
        Ok(buffer)
    }

    /// Load the next physical line and reset the column.
    ///
    /// Once the source runs dry the buffer holds an empty line and stays
    /// exhausted; further calls are no-ops.
    pub fn advance_line(&mut self) -> Result<(), LexError> {
        if self.exhausted {
            return Ok(());
        }

        let mut raw = String::new();
        let read = self
            .reader
            .read_line(&mut raw)
            .map_err(|e| self.error(LexErrorKind::Read(e.to_string())))?;

        self.position.line += 1;
        self.position.column = 0;

        if read == 0 {
            self.exhausted = true;
            self.line.clear();
            tracing::debug!(
                file = %self.position.file,
                line = self.position.line,
                "end of source"
            );
            return Ok(());
        }

        let text = raw
            .strip_suffix('\n')
            .map_or(raw.as_str(), |s| s.strip_suffix('\r').unwrap_or(s));
        self.line = text.chars().collect();
        Ok(())
    }

    /// Number of unconsumed characters on the current line.
    #[must_use]
    pub fn remaining_in_line(&self) -> usize {
        self.line.len().saturating_sub(self.position.column)
    }

    /// True iff the cursor plus `offset` has reached the end of the line.
    #[must_use]
    pub fn is_end_of_line(&self, offset: usize) -> bool {
        self.position.column + offset >= self.line.len()
    }

    /// True once `advance_line` found no further line.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// The character `k` positions ahead of the cursor.
    pub fn peek(&self, k: usize) -> Result<char, LexError> {
        self.line
            .get(self.position.column + k)
            .copied()
            .ok_or_else(|| self.out_of_bounds(k + 1))
    }

    /// The `k` characters starting at the cursor.
    pub fn peek_window(&self, k: usize) -> Result<&[char], LexError> {
        let start = self.position.column;
        self.line
            .get(start..start + k)
            .ok_or_else(|| self.out_of_bounds(k))
    }

    /// Advance the cursor `n` characters within the current line.
    pub fn consume(&mut self, n: usize) -> Result<(), LexError> {
        if n > self.remaining_in_line() {
            return Err(self.out_of_bounds(n));
        }
        self.position.column += n;
        Ok(())
    }

    /// Cursor snapshot: file, 1-based line, 0-based column.
    #[must_use]
    pub const fn position(&self) -> &Span {
        &self.position
    }

    /// The full text of the resident line.
    #[must_use]
    pub fn line_text(&self) -> String {
        self.line.iter().collect()
    }

    /// Build an error located at the cursor, capturing the resident line.
    #[must_use]
    pub fn error(&self, kind: LexErrorKind) -> LexError {
        LexError {
            kind,
            span: self.position.clone(),
            source_line: self.line_text(),
        }
    }

    fn out_of_bounds(&self, requested: usize) -> LexError {
        self.error(LexErrorKind::CursorOutOfBounds {
            requested,
            remaining: self.remaining_in_line(),
        })
    }
}

impl<'a> LineBuffer<&'a [u8]> {
    /// Buffer over an in-memory string.
    pub fn from_source(file: impl Into<String>, text: &'a str) -> Result<Self, LexError> {
        Self::new(file, text.as_bytes())
    }
}
