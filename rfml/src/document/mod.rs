pub mod step;

use std::fmt;

use crate::document::step::Step;
use crate::parser::line::COMMENT_MARKER;

/// A parsed RFML test: header metadata plus the ordered step sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestDocument {
    /// Identity from the `#!` line. Empty means the test has not been
    /// assigned an ID yet.
    pub rfml_id: String,
    pub title: Option<String>,
    /// Path or URI where execution begins.
    pub start_uri: Option<String>,
    /// `None` when no `site_id` directive was given. `Some(0)` is an
    /// explicit zero, not "unset".
    pub site_id: Option<i64>,
    /// Every comment line, marker stripped, each followed by `\n`.
    pub description: String,
    pub tags: Vec<String>,
    pub browsers: Vec<String>,
    pub steps: Vec<Step>,
}

impl TestDocument {
    pub fn empty() -> Self {
        TestDocument::default()
    }

    /// True when the document carries no ID and must be created remotely
    /// rather than updated.
    pub fn is_unassigned(&self) -> bool {
        self.rfml_id.is_empty()
    }

    pub fn embedded_ids(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().filter_map(|step| match step {
            Step::Embedded(test) => Some(test.rfml_id.as_str()),
            Step::Action(_) => None,
        })
    }
}

/// Renders the document back into RFML source.
impl fmt::Display for TestDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.rfml_id.is_empty() {
            writeln!(f, "#!{}", self.rfml_id)?;
        }
        if let Some(title) = &self.title {
            writeln!(f, "# title: {}", title)?;
        }
        if let Some(start_uri) = &self.start_uri {
            writeln!(f, "# start_uri: {}", start_uri)?;
        }
        if let Some(site_id) = self.site_id {
            writeln!(f, "# site_id: {}", site_id)?;
        }
        if !self.tags.is_empty() {
            writeln!(f, "# tags: {}", self.tags.join(", "))?;
        }
        if !self.browsers.is_empty() {
            writeln!(f, "# browsers: {}", self.browsers.join(", "))?;
        }
        for line in self.description.lines() {
            writeln!(f, "#{}", line)?;
        }

        for step in &self.steps {
            writeln!(f)?;
            if step.redirect() {
                writeln!(f, "# redirect: true")?;
            }
            match step {
                Step::Action(action) => {
                    write_text(f, &action.action)?;
                    if !action.response.is_empty() {
                        write_text(f, &action.response)?;
                    }
                }
                Step::Embedded(test) => writeln!(f, "- {}", test.rfml_id)?,
            }
        }
        Ok(())
    }
}

/// Step text starting with `#` is indented so it reads back as text, not a comment.
fn write_text(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    for line in text.lines() {
        if line.starts_with(COMMENT_MARKER) {
            write!(f, "  ")?;
        }
        writeln!(f, "{}", line)?;
    }
    Ok(())
}
