//! One interpreter **session**: the state that survives from one chunk of
//! source to the next.
//!
//! A session owns the interpreter (globals and resolved bindings), the node
//! id generator and the diagnostic sink, and runs every chunk through the
//! full pipeline: scan → parse → resolve → interpret.
//!
//! ```
//! # use rox::session::{Lox, RunStatus};
//! let mut lox = Lox::new();
//!
//! lox.run("fun twice(n) { return n * 2; }")?;
//! assert_eq!(lox.run("print twice(21);")?, RunStatus::Ok);
//!
//! // Static errors are reported and nothing runs; the session stays usable.
//! assert_eq!(lox.run("print ;")?, RunStatus::StaticError);
//! assert!(lox.had_error());
//! # Ok::<(), rox::error::LoxError>(())
//! ```

use std::io::{self, Write};

use log::{debug, info};

use crate::ast::{NodeIds, Stmt};
use crate::error::{LoxError, Reporter, Result, StderrReporter};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::Resolver;
use crate::scanner::scan_tokens;

/// Outcome of one [`Lox::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Ok,
    /// Scan, parse or resolve errors were reported; nothing was evaluated.
    StaticError,
    /// Evaluation stopped at a runtime error, which was reported.
    RuntimeError,
}

pub struct Lox {
    interpreter: Interpreter,
    ids: NodeIds,
    reporter: Box<dyn Reporter>,
    had_error: bool,
    had_runtime_error: bool,
}

impl Default for Lox {
    fn default() -> Self {
        Self::new()
    }
}

impl Lox {
    /// Session printing to stdout and reporting to stderr.
    pub fn new() -> Self {
        Self::with_io(Box::new(io::stdout()), Box::new(StderrReporter))
    }

    pub fn with_io(out: Box<dyn Write>, reporter: Box<dyn Reporter>) -> Self {
        info!("Starting Lox session");

        Self {
            interpreter: Interpreter::with_output(out),
            ids: NodeIds::new(),
            reporter,
            had_error: false,
            had_runtime_error: false,
        }
    }

    /// Run one chunk of source against the session's globals.
    ///
    /// Static and runtime errors go to the reporter and show up in the
    /// returned status.  Only failures of the host (I/O, broken internal
    /// invariants) come back as `Err`.
    pub fn run(&mut self, source: &str) -> Result<RunStatus> {
        info!("Running {} bytes of source", source.len());

        let statements: Vec<Stmt> = match self.parse(source) {
            Ok(statements) => statements,
            Err(errors) => return Ok(self.report_static(&errors)),
        };

        if let Err(errors) = Resolver::new(&mut self.interpreter).resolve(&statements) {
            return Ok(self.report_static(&errors));
        }

        match self.interpreter.interpret(&statements) {
            Ok(()) => Ok(RunStatus::Ok),

            Err(error) if error.is_runtime() => {
                debug!("Runtime error: {}", error);

                self.reporter.report(&error);
                self.had_runtime_error = true;

                Ok(RunStatus::RuntimeError)
            }

            Err(error) => Err(error),
        }
    }

    /// Scan and parse `source` with the session's id generator.
    ///
    /// All scanner errors come first, then parser errors, each in source order.
    pub fn parse(&mut self, source: &str) -> std::result::Result<Vec<Stmt>, Vec<LoxError>> {
        let (tokens, mut errors) = scan_tokens(source);
        debug!("Scanned {} tokens, {} error(s)", tokens.len(), errors.len());

        let (statements, parse_errors) = Parser::new(&tokens, &mut self.ids).parse();
        errors.extend(parse_errors);

        if errors.is_empty() {
            Ok(statements)
        } else {
            Err(errors)
        }
    }

    fn report_static(&mut self, errors: &[LoxError]) -> RunStatus {
        info!("Reporting {} static error(s)", errors.len());

        for error in errors {
            self.reporter.report(error);
        }
        self.had_error = true;

        RunStatus::StaticError
    }

    /// A static error was reported since the last [`Lox::reset_error`].
    pub fn had_error(&self) -> bool {
        self.had_error
    }

    pub fn had_runtime_error(&self) -> bool {
        self.had_runtime_error
    }

    /// Forget earlier static errors; the REPL calls this between lines.
    pub fn reset_error(&mut self) {
        self.had_error = false;
    }
}
