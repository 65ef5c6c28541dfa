use std::{io, str::Utf8Error};

use common::serde::UnexpectedEof;
use thiserror::Error;

/// Reasons a mesh failed to load. A failed load never produces a partial
/// mesh.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("line {line}: expected `{expected}`, found `{found}`")]
    UnexpectedToken {
        line: usize,
        expected: &'static str,
        found: String,
    },
    #[error("line {line}: file ended while expecting `{expected}`")]
    UnexpectedEnd { line: usize, expected: &'static str },
    #[error("line {line}: `{found}` is not a valid number")]
    InvalidNumber { line: usize, found: String },
    #[error("text mesh is not valid UTF-8: {0}")]
    NotUtf8(#[from] Utf8Error),
    #[error("binary mesh is truncated: {0}")]
    Truncated(#[from] UnexpectedEof),
    #[error(transparent)]
    Io(#[from] io::Error),
}
