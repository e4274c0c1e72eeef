//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Every phase (scanner, parser, resolver, runtime) converts its failure modes
//! into one of the variants defined here, so the whole crate shares one
//! `Result<T>` alias and interoperates with `anyhow` in the binary.
//!
//! Two families matter to callers:
//!
//! * **static** errors (`Lex`, `Parse`, `Resolve`) are rendered as
//!   `[line L] Error<where>: message`;
//! * **runtime** errors (`Runtime`) are rendered as `message\n[line L]`.
//!
//! Everything else (`Internal`, `Io`, `Utf8`) is fatal for the host.
//!
//! The module **does not** print diagnostics itself; that is the job of a
//! [`Reporter`].

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error, located at a specific token.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,
        /// ` at 'lexeme'` or ` at end`.
        location: String,
    },

    /// Static‑analysis failure reported by the resolver.
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// Runtime evaluation error.
    #[error("{message}\n[line {line}]")]
    Runtime { message: String, line: usize },

    /// Broken interpreter invariant (resolver and interpreter disagree).
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapper around `std::io::Error` (transparent).  Enables `?` on I/O ops.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location(token),
        }
    }

    /// Helper constructor for the **interpreter**.
    pub fn runtime<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Runtime error: line={}, msg={}", token.line, message);

        LoxError::Runtime {
            message,
            line: token.line,
        }
    }

    pub fn internal<S: Into<String>>(msg: S) -> Self {
        LoxError::Internal(msg.into())
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, LoxError::Runtime { .. })
    }
}

fn location(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

/// Sink for diagnostics produced while running Lox source.
///
/// The session hands every static error, in detection order, and every
/// runtime error to its reporter.  Callers choose where they go.
pub trait Reporter {
    fn report(&mut self, error: &LoxError);
}

/// Default reporter: one diagnostic per line on standard error.
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrReporter;

impl Reporter for StderrReporter {
    fn report(&mut self, error: &LoxError) {
        eprintln!("{}", error);
    }
}
