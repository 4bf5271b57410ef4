use std::fmt;
use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};

/// An RFML parse failure, anchored to the offending line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    /// 1-based line number.
    pub line: usize,
    pub reason: String,
    /// Byte span of the offending line in the source.
    pub span: Range<usize>,
    pub file_id: usize,
}

impl ParseError {
    pub fn new(line: usize, reason: impl Into<String>, span: Range<usize>, file_id: usize) -> Self {
        ParseError {
            line,
            reason: reason.into(),
            span,
            file_id,
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(&self.reason)
            .with_labels(vec![
                Label::primary(self.file_id, self.span.clone())
                    .with_message(format!("line {}", self.line)),
            ])
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RFML parsing error in line {}: {}", self.line, self.reason)
    }
}

impl std::error::Error for ParseError {}
