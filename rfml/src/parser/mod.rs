mod assembler;
pub mod directive;
pub mod error;
pub mod line;

pub use error::ParseError;

use std::io::{self, Read};
use std::ops::Range;

use crate::document::TestDocument;
use crate::parser::assembler::Assembler;
use crate::sink::{DiagnosticSink, NullSink};

/// Parser entry point.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    /// Read the whole of `reader` as UTF-8 source.
    pub fn from_reader<R: Read>(mut reader: R, file_id: usize) -> io::Result<Self> {
        let mut source = String::new();
        reader.read_to_string(&mut source)?;
        Ok(Parser::new(source, file_id))
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parse the source into a complete TestDocument.
    pub fn parse(&self) -> Result<TestDocument, ParseError> {
        self.parse_with_sink(&mut NullSink)
    }

    /// Parse, reporting each line and finalized step to `sink`.
    /// Stops at the first error; no partial document is returned.
    pub fn parse_with_sink(
        &self,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<TestDocument, ParseError> {
        let mut assembler = Assembler::new(self.file_id, sink);
        for (number, text, span) in source_lines(&self.source) {
            assembler.feed(number, text, span)?;
        }
        Ok(assembler.finish())
    }
}

/// Split source into (1-based line number, text without terminator, byte span).
/// Accepts `\n` and `\r\n`; a leading byte-order mark is skipped.
fn source_lines(source: &str) -> impl Iterator<Item = (usize, &str, Range<usize>)> {
    let (body, mut offset) = match source.strip_prefix('\u{feff}') {
        Some(rest) => (rest, '\u{feff}'.len_utf8()),
        None => (source, 0),
    };

    body.split_inclusive('\n').enumerate().map(move |(i, raw)| {
        let start = offset;
        offset += raw.len();
        let text = raw.strip_suffix('\n').unwrap_or(raw);
        let text = text.strip_suffix('\r').unwrap_or(text);
        (i + 1, text, start..start + text.len())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_and_spans() {
        let source = "#!id\r\n# title: T\n\nlast";
        let lines: Vec<_> = source_lines(source).collect();
        assert_eq!(
            lines,
            vec![
                (1, "#!id", 0..4),
                (2, "# title: T", 6..16),
                (3, "", 17..17),
                (4, "last", 18..22),
            ]
        );
    }

    #[test]
    fn byte_order_mark_skipped() {
        let lines: Vec<_> = source_lines("\u{feff}#!id\n").collect();
        assert_eq!(lines, vec![(1, "#!id", 3..7)]);
    }

    #[test]
    fn empty_source_has_no_lines() {
        assert_eq!(source_lines("").count(), 0);
    }
}
