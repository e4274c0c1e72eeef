#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;

use rox::error::{LoxError, Reporter};
use rox::session::{Lox, RunStatus};

/// Shared sink for both program output and diagnostics.
///
/// Clones share the same buffers, so one clone can be handed to a session
/// while the test keeps another to read back what happened.
#[derive(Clone, Default)]
pub struct Capture {
    out: Rc<RefCell<Vec<u8>>>,
    errors: Rc<RefCell<Vec<String>>>,
}

impl Capture {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session that prints into this capture.
    pub fn session(&self) -> Lox {
        Lox::with_io(Box::new(self.clone()), Box::new(self.clone()))
    }

    pub fn output(&self) -> String {
        String::from_utf8_lossy(&self.out.borrow()).into_owned()
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.borrow().clone()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.out.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Reporter for Capture {
    fn report(&mut self, error: &LoxError) {
        self.errors.borrow_mut().push(error.to_string());
    }
}

/// Everything one run of `source` in a fresh session produced.
pub struct Outcome {
    pub status: RunStatus,
    pub output: String,
    pub errors: Vec<String>,
}

pub fn run(source: &str) -> Outcome {
    let capture = Capture::new();
    let mut lox = capture.session();

    let status = lox.run(source).expect("host failure");

    Outcome {
        status,
        output: capture.output(),
        errors: capture.errors(),
    }
}

/// Run `source` and return its output, failing the test on any error.
pub fn output_of(source: &str) -> String {
    let outcome = run(source);

    assert_eq!(
        outcome.status,
        RunStatus::Ok,
        "unexpected errors: {:?}",
        outcome.errors
    );

    outcome.output
}
