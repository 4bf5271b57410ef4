//! Optional observers for a parse. The parser emits nothing unless a sink
//! is attached.

use std::io::{self, Write};

use crate::document::step::Step;
use crate::parser::line::LineKind;

/// Receives events from the assembler as it walks the input.
/// Every method defaults to doing nothing.
pub trait DiagnosticSink {
    /// Called once per physical line, after classification.
    fn line(&mut self, _number: usize, _text: &str, _kind: LineKind) {}

    /// Called when a step is appended to the document.
    fn step(&mut self, _index: usize, _step: &Step) {}

    /// Non-fatal observations (e.g. a redirect with no step to attach to).
    fn note(&mut self, _line: usize, _message: &str) {}
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn line(&mut self, number: usize, text: &str, kind: LineKind) {
        tracing::trace!(line = number, ?kind, "{}", text);
    }

    fn step(&mut self, index: usize, step: &Step) {
        match step {
            Step::Action(action) => tracing::debug!(
                index,
                redirect = action.redirect,
                action = %action.action,
                "finalized action step"
            ),
            Step::Embedded(test) => tracing::debug!(
                index,
                redirect = test.redirect,
                rfml_id = %test.rfml_id,
                "finalized embedded test"
            ),
        }
    }

    fn note(&mut self, line: usize, message: &str) {
        tracing::debug!(line, "{}", message);
    }
}

/// Echoes every input line to a writer, as it is read.
/// After the first write error nothing more is written; the error is
/// returned by `into_inner`.
pub struct EchoSink<W: Write> {
    writer: W,
    error: Option<io::Error>,
}

impl<W: Write> EchoSink<W> {
    pub fn new(writer: W) -> Self {
        EchoSink {
            writer,
            error: None,
        }
    }

    pub fn error(&self) -> Option<&io::Error> {
        self.error.as_ref()
    }

    pub fn into_inner(self) -> io::Result<W> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.writer),
        }
    }
}

impl<W: Write> DiagnosticSink for EchoSink<W> {
    fn line(&mut self, _number: usize, text: &str, _kind: LineKind) {
        if self.error.is_some() {
            return;
        }
        if let Err(error) = writeln!(self.writer, "{}", text) {
            self.error = Some(error);
        }
    }
}
