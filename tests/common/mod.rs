#![allow(dead_code)]

use pieck::{TokenKind, ValueArena, ValueId, tokenize};

/// Tokenize and pair each token's kind with its lexeme.
pub fn lex(input: &str) -> Vec<(TokenKind, String)> {
    tokenize(input)
        .expect("tokenize failed")
        .into_iter()
        .map(|t| (t.kind, t.text))
        .collect()
}

/// Lexemes only.
pub fn texts(input: &str) -> Vec<String> {
    lex(input).into_iter().map(|(_, text)| text).collect()
}

/// Build a tensor of `len` scalars.
pub fn vector(arena: &mut ValueArena, len: usize) -> ValueId {
    let items = (0..len).map(|_| arena.scalar(1.0)).collect();
    arena.tensor(items)
}

/// Build a rectangular tensor with the given dims (rank >= 1).
pub fn rectangular(arena: &mut ValueArena, dims: &[usize]) -> ValueId {
    match dims {
        [] => arena.scalar(0.0),
        [len] => vector(arena, *len),
        [len, rest @ ..] => {
            let children = (0..*len).map(|_| rectangular(arena, rest)).collect();
            arena.tensor(children)
        }
    }
}
