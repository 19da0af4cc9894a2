pub mod reporting;

use crate::vm::byte_code::chunk::LineNumber;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Where in the token stream a syntax error was detected
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    At(String),
    AtEnd,
    // the offending token was itself a scanner error
    Unknown,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::At(lexeme) => write!(f, " at '{}'", lexeme),
            Location::AtEnd => f.write_str(" at end"),
            Location::Unknown => Ok(()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
#[error("[line {line}] Error{location}: {message}")]
pub struct SyntaxError {
    pub line: LineNumber,
    pub span: Range<usize>,
    pub location: Location,
    pub message: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("{}", join_lines(.0))]
    SyntaxErrors(Vec<SyntaxError>),
}

impl Error {
    pub fn syntax_errors(&self) -> &[SyntaxError] {
        match self {
            Error::SyntaxErrors(errors) => errors,
        }
    }
}

fn join_lines(errors: &[SyntaxError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<String>>()
        .join("\n")
}
