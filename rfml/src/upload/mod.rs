//! Detection of template calls that make a step need a file upload, e.g.
//! `{{ file.screenshot(./shots/home.png) }}`.
//!
//! The scan is textual: the action is treated as a flat string that may
//! contain any number of `{{ ... }}` calls. Nothing else in the action is
//! interpreted.

use std::ops::Range;

use crate::document::TestDocument;
use crate::document::step::{ActionStep, Step};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const MARKER: &str = "file.";

/// Template functions that transfer a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Download,
    Screenshot,
}

impl FileKind {
    pub const ALL: [FileKind; 2] = [FileKind::Download, FileKind::Screenshot];

    pub fn name(self) -> &'static str {
        match self {
            FileKind::Download => "download",
            FileKind::Screenshot => "screenshot",
        }
    }
}

/// One upload call found in an action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCall {
    pub kind: FileKind,
    /// The argument with surrounding whitespace removed. Never empty.
    pub argument: String,
    /// Byte range of the whole `{{ ... }}` call within the action text.
    pub span: Range<usize>,
}

/// An upload call together with the index of the step it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadableFile {
    pub step_index: usize,
    pub call: FileCall,
}

/// Every upload call in `action`, in order of appearance.
pub fn find_calls(action: &str) -> Vec<FileCall> {
    let mut calls = Vec::new();
    let mut from = 0;

    while let Some(pos) = action[from..].find(OPEN) {
        let open = from + pos;
        match parse_call(&action[open..]) {
            Some((kind, argument, len)) => {
                calls.push(FileCall {
                    kind,
                    argument: argument.to_string(),
                    span: open..open + len,
                });
                from = open + len;
            }
            None => from = open + 1,
        }
    }

    calls
}

/// Parse a call at the start of `text`, which begins with `{{`.
/// Returns the kind, the trimmed argument and the byte length of the call.
fn parse_call(text: &str) -> Option<(FileKind, &str, usize)> {
    let inner = text.strip_prefix(OPEN)?.trim_start();
    let after_marker = inner.strip_prefix(MARKER)?;
    let (kind, after_name) = FileKind::ALL
        .iter()
        .find_map(|kind| after_marker.strip_prefix(kind.name()).map(|rest| (*kind, rest)))?;

    let args = after_name.strip_prefix('(')?;
    let close = args.find(')')?;
    let argument = args[..close].trim();
    if argument.is_empty() {
        return None;
    }

    let tail = args[close + 1..].trim_start();
    let after = tail.strip_prefix(CLOSE)?;
    Some((kind, argument, text.len() - after.len()))
}

impl ActionStep {
    pub fn has_uploadable_files(&self) -> bool {
        !find_calls(&self.action).is_empty()
    }
}

impl TestDocument {
    /// True if any action step requests a file transfer with a concrete
    /// argument. Embedded tests are never uploadable.
    pub fn has_uploadable_files(&self) -> bool {
        self.steps.iter().any(|step| match step {
            Step::Action(action) => action.has_uploadable_files(),
            Step::Embedded(_) => false,
        })
    }

    pub fn uploadable_files(&self) -> Vec<UploadableFile> {
        let mut files = Vec::new();
        for (step_index, step) in self.steps.iter().enumerate() {
            match step {
                Step::Action(action) => files.extend(
                    find_calls(&action.action)
                        .into_iter()
                        .map(|call| UploadableFile { step_index, call }),
                ),
                Step::Embedded(_) => {}
            }
        }
        files
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(action: &str) -> Vec<(FileKind, String)> {
        find_calls(action)
            .into_iter()
            .map(|call| (call.kind, call.argument))
            .collect()
    }

    #[test]
    fn download_and_screenshot() {
        assert_eq!(
            kinds("{{ file.download(./my/path) }}"),
            vec![(FileKind::Download, "./my/path".to_string())]
        );
        assert_eq!(
            kinds("{{file.screenshot(./my/path)}}"),
            vec![(FileKind::Screenshot, "./my/path".to_string())]
        );
    }

    #[test]
    fn missing_or_blank_argument() {
        assert!(kinds("{{ file.download }}").is_empty());
        assert!(kinds("{{ file.download() }}").is_empty());
        assert!(kinds("{{ file.screenshot(   ) }}").is_empty());
    }

    #[test]
    fn unknown_functions_and_malformed_calls() {
        assert!(kinds("{{ file.upload(./x) }}").is_empty());
        assert!(kinds("{{ file.downloads(./x) }}").is_empty());
        assert!(kinds("{{ random.email }}").is_empty());
        assert!(kinds("{{ file.download(./x) ").is_empty());
        assert!(kinds("file.download(./x)").is_empty());
    }

    #[test]
    fn several_calls_in_one_action() {
        let action = "Upload {{ file.download(a.txt) }} then {{ file.download }} and {{ file.screenshot( b.png ) }}";
        assert_eq!(
            kinds(action),
            vec![
                (FileKind::Download, "a.txt".to_string()),
                (FileKind::Screenshot, "b.png".to_string()),
            ]
        );
    }

    #[test]
    fn call_after_extra_open_brace() {
        assert_eq!(
            kinds("{{{ file.download(./a.txt) }}"),
            vec![(FileKind::Download, "./a.txt".to_string())]
        );
        let calls = find_calls("{{{ file.download(./a.txt) }}");
        assert_eq!(calls[0].span.start, 1);
    }

    #[test]
    fn span_covers_the_call() {
        let action = "Click {{ file.download(x) }}!";
        let calls = find_calls(action);
        assert_eq!(calls.len(), 1);
        assert_eq!(&action[calls[0].span.clone()], "{{ file.download(x) }}");
    }
}
