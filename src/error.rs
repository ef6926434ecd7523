//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Every phase (scanner, parser, resolver, runtime) converts its failure modes
//! into one of the variants defined here.  This enables a uniform `Result<T>`
//! alias throughout the crate and ergonomic inter‑operation with `anyhow` in the
//! binary, while still preserving positional diagnostics.
//!
//! The module **does not** print diagnostics itself; rendering happens through
//! `Display` and the caller decides where the text goes.

use std::fmt;
use std::io;
use std::rc::Rc;

use log::info;
use serde::Serialize;
use thiserror::Error;

/// Source location of a token: file identifier plus 1‑based line and column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub file: Rc<str>,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn new(file: Rc<str>, line: usize, column: usize) -> Self {
        Self { file, line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with a rendered source snippet.
    #[error("SCANNER ERROR [{pos}] {message}\n{context}")]
    Lex {
        pos: Position,

        /// Human‑readable description.
        message: String,

        /// Surrounding source lines with a caret marker under the column.
        context: String,
    },

    /// Syntactic (parser) error.  `location` is either `at 'lexeme'` or `at end`.
    #[error("PARSER ERROR [{pos}] {location}: {message}")]
    Parse {
        pos: Position,
        location: String,
        message: String,
    },

    /// Static resolution failure, detected before any statement runs.
    /// Rendered like a runtime error; only the exit code tells them apart.
    #[error("RUNTIME ERROR [{pos}] {message}")]
    Resolve { pos: Position, message: String },

    /// Runtime evaluation error.
    #[error("RUNTIME ERROR [{pos}] {message}")]
    Runtime { pos: Position, message: String },

    /// The resolver and the interpreter disagree about a binding.
    #[error("INTERNAL ERROR [{pos}] {message}")]
    Internal { pos: Position, message: String },

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::str::Utf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(pos: Position, msg: S, context: String) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: pos={}, msg={}", pos, message);

        LoxError::Lex {
            pos,
            message,
            context,
        }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(pos: Position, location: String, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: pos={}, msg={}", pos, message);

        LoxError::Parse {
            pos,
            location,
            message,
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(pos: Position, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: pos={}, msg={}", pos, message);

        LoxError::Resolve { pos, message }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(pos: Position, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: pos={}, msg={}", pos, message);

        LoxError::Runtime { pos, message }
    }

    pub fn internal<S: Into<String>>(pos: Position, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Internal error: pos={}, msg={}", pos, message);

        LoxError::Internal { pos, message }
    }

    /// Process exit status for this error (sysexits convention).
    pub fn exit_code(&self) -> i32 {
        match self {
            LoxError::Lex { .. } | LoxError::Parse { .. } | LoxError::Resolve { .. } => 65,
            LoxError::Runtime { .. } | LoxError::Internal { .. } => 70,
            LoxError::Io(_) | LoxError::Utf8(_) => 74,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn pos() -> Position {
        Position::new(Rc::from("main.lox"), 3, 7)
    }

    #[test]
    fn parser_error_renders_location() {
        let err = LoxError::parse(pos(), "at 'x'".into(), "Expect ';' after value.");

        assert_eq!(
            err.to_string(),
            "PARSER ERROR [main.lox:3:7] at 'x': Expect ';' after value."
        );
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn runtime_error_renders_position() {
        let err = LoxError::runtime(pos(), "Operands must be numbers.");

        assert_eq!(
            err.to_string(),
            "RUNTIME ERROR [main.lox:3:7] Operands must be numbers."
        );
        assert_eq!(err.exit_code(), 70);
    }

    #[test]
    fn resolver_error_shares_runtime_shape() {
        let err = LoxError::resolve(pos(), "Can't return from top-level code.");

        assert_eq!(
            err.to_string(),
            "RUNTIME ERROR [main.lox:3:7] Can't return from top-level code."
        );
        assert_eq!(err.exit_code(), 65);
    }

    #[test]
    fn scanner_error_appends_context() {
        let err = LoxError::lex(pos(), "Unexpected character '#'.", "a # b\n--^--".into());

        assert_eq!(
            err.to_string(),
            "SCANNER ERROR [main.lox:3:7] Unexpected character '#'.\na # b\n--^--"
        );
    }
}
