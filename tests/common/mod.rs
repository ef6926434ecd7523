#![allow(dead_code)]

use std::cell::RefCell;
use std::io::{self, Cursor, Write};
use std::rc::Rc;

use rox::error::LoxError;
use rox::interpreter::Interpreter;
use rox::runner::run_source;

/// In-memory `print` sink that stays readable after the interpreter owns it.
#[derive(Clone, Default)]
pub struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// What a program printed plus the diagnostics of the phase that failed, if any.
pub struct Outcome {
    pub output: String,
    pub errors: Vec<LoxError>,
}

impl Outcome {
    /// Rendered diagnostics, one per line.
    pub fn error_text(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub fn interpreter_with_input(input: &str) -> (Interpreter, SharedBuffer) {
    let sink = SharedBuffer::default();
    let interpreter = Interpreter::with_io(
        Box::new(sink.clone()),
        Box::new(Cursor::new(input.as_bytes().to_vec())),
    );
    (interpreter, sink)
}

/// Run `source` end to end with `input` as the `input()` stream.
pub fn run_with_input(source: &str, input: &str) -> Outcome {
    let (mut interpreter, sink) = interpreter_with_input(input);

    let errors = match run_source(&mut interpreter, source, "test.lox") {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    Outcome {
        output: sink.contents(),
        errors,
    }
}

pub fn run(source: &str) -> Outcome {
    run_with_input(source, "")
}
