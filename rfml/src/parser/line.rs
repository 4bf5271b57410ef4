use crate::parser::directive::DirectiveKey;

pub const IDENTITY_MARKER: &str = "#!";
pub const COMMENT_MARKER: char = '#';
pub const KEY_SEPARATOR: char = ':';
pub const EMBEDDED_MARKER: char = '-';

/// One physical line of RFML, classified by its prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line<'a> {
    /// `#!rfml_id` -- the remainder is kept verbatim.
    Identity(&'a str),
    /// `#key: value` with a recognized key. Value is trimmed but not yet validated.
    Directive { key: DirectiveKey, value: &'a str },
    /// Any other `#` line, marker stripped.
    Comment(&'a str),
    /// Whitespace-only line; separates steps.
    Blank,
    /// `- rfml_id` -- reference to another test. The ID is trimmed.
    Embedded(&'a str),
    /// Action or response text, trimmed.
    Text(&'a str),
}

impl Line<'_> {
    pub fn kind(&self) -> LineKind {
        match self {
            Line::Identity(_) => LineKind::Identity,
            Line::Directive { .. } => LineKind::Directive,
            Line::Comment(_) => LineKind::Comment,
            Line::Blank => LineKind::Blank,
            Line::Embedded(_) => LineKind::Embedded,
            Line::Text(_) => LineKind::Text,
        }
    }
}

/// Payload-free tag for a classified line, handed to diagnostic sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Identity,
    Directive,
    Comment,
    Blank,
    Embedded,
    Text,
}

/// Classify a single line (without its terminator).
pub fn classify(text: &str) -> Line<'_> {
    if let Some(id) = text.strip_prefix(IDENTITY_MARKER) {
        return Line::Identity(id);
    }

    if let Some(content) = text.strip_prefix(COMMENT_MARKER) {
        if let Some((key, value)) = content.split_once(KEY_SEPARATOR) {
            if let Some(key) = DirectiveKey::from_name(key.trim()) {
                return Line::Directive {
                    key,
                    value: value.trim(),
                };
            }
        }
        return Line::Comment(content);
    }

    classify_step_line(text)
}

fn classify_step_line(text: &str) -> Line<'_> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }

    if let Some(rest) = trimmed.strip_prefix(EMBEDDED_MARKER) {
        // "-" alone or "- " with nothing after is an embed with an empty ID,
        // which the assembler rejects. "-foo" is plain text.
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return Line::Embedded(rest.trim());
        }
    }

    Line::Text(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_verbatim() {
        assert_eq!(classify("#!my-test-id"), Line::Identity("my-test-id"));
        assert_eq!(classify("#! spaced id "), Line::Identity(" spaced id "));
    }

    #[test]
    fn recognized_directive() {
        assert_eq!(
            classify("# title:  Log in  "),
            Line::Directive {
                key: DirectiveKey::Title,
                value: "Log in"
            }
        );
        assert_eq!(
            classify("#start_uri: http://example.com:8080/login"),
            Line::Directive {
                key: DirectiveKey::StartUri,
                value: "http://example.com:8080/login"
            }
        );
    }

    #[test]
    fn unknown_key_is_comment_with_separator() {
        assert_eq!(classify("# note: check this"), Line::Comment(" note: check this"));
        assert_eq!(classify("#Title: wrong case"), Line::Comment("Title: wrong case"));
    }

    #[test]
    fn comment_without_separator() {
        assert_eq!(classify("#hello"), Line::Comment("hello"));
        assert_eq!(classify("#"), Line::Comment(""));
    }

    #[test]
    fn step_lines() {
        assert_eq!(classify(""), Line::Blank);
        assert_eq!(classify("   \t"), Line::Blank);
        assert_eq!(classify("- login_flow"), Line::Embedded("login_flow"));
        assert_eq!(classify("  -\tlogin_flow  "), Line::Embedded("login_flow"));
        assert_eq!(classify("-"), Line::Embedded(""));
        assert_eq!(classify("-1 is negative"), Line::Text("-1 is negative"));
        assert_eq!(classify("  Click the button "), Line::Text("Click the button"));
    }

    #[test]
    fn indented_hash_is_text() {
        assert_eq!(classify("  # not a comment"), Line::Text("# not a comment"));
    }
}
