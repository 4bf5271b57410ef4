pub mod document;
pub mod parser;
pub mod payload;
pub mod sink;
pub mod upload;

pub use document::TestDocument;
pub use document::step::{ActionStep, EmbeddedTest, Step};
pub use parser::{ParseError, Parser};

/// Parse RFML source text with no diagnostic sink attached.
pub fn parse_str(source: &str) -> Result<TestDocument, ParseError> {
    Parser::new(source.to_string(), 0).parse()
}
