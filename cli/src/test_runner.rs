use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use rfml::{Step, TestDocument};

use crate::discover::{self, FIXTURE_SUFFIX};

/// Expected shape of one step. Unset fields are not checked.
#[derive(Debug, Default, Deserialize)]
pub struct ExpectedStep {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub response: Option<String>,
    /// RFML ID of an embedded test. Set means the step must be an embed.
    #[serde(default)]
    pub embed: Option<String>,
    #[serde(default)]
    pub redirect: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FixtureConfig {
    /// Human-readable fixture description.
    #[serde(default)]
    pub description: Option<String>,

    /// If true, the fixture expects parsing to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// 1-based line (counted from the end of the frontmatter) the parse error must point at.
    #[serde(default)]
    pub expect_error_line: Option<usize>,

    /// Substring the parse error reason must contain.
    #[serde(default)]
    pub expect_error: Option<String>,

    #[serde(default)]
    pub expect_rfml_id: Option<String>,
    #[serde(default)]
    pub expect_title: Option<String>,
    #[serde(default)]
    pub expect_start_uri: Option<String>,
    #[serde(default)]
    pub expect_site_id: Option<i64>,
    #[serde(default)]
    pub expect_tags: Option<Vec<String>>,
    #[serde(default)]
    pub expect_browsers: Option<Vec<String>>,
    #[serde(default)]
    pub expect_description: Option<String>,

    /// If present (even empty), the step count and each listed field are checked.
    #[serde(default)]
    pub expect_steps: Option<Vec<ExpectedStep>>,

    #[serde(default)]
    pub expect_uploadable: Option<bool>,
}

/// Split a `.test.rfml` file into its TOML config and RFML source.
fn parse_test_file(content: &str) -> Result<(FixtureConfig, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let close_pos = after_open
        .find("\n---")
        .ok_or("missing closing --- frontmatter delimiter")?;

    let toml_str = after_open[..close_pos].trim_end_matches('\r');
    let rest = &after_open[close_pos + "\n---".len()..];
    let source = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let config: FixtureConfig =
        toml::from_str(toml_str).map_err(|e| format!("TOML parse error: {}", e))?;

    Ok((config, source))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_name()
                .and_then(|s| s.to_str())
                .and_then(|s| s.strip_suffix(FIXTURE_SUFFIX))
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let fail = |description: Option<String>, reason: String| TestResult {
        path: path.to_path_buf(),
        description,
        outcome: TestOutcome::Fail(reason),
    };

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => return fail(None, format!("cannot read file: {}", e)),
    };

    let (config, source) = match parse_test_file(&content) {
        Ok(pair) => pair,
        Err(e) => return fail(None, format!("frontmatter error: {}", e)),
    };

    let description = config.description.clone();
    let outcome = match check_fixture(&config, source) {
        Some(reason) => TestOutcome::Fail(reason),
        None => TestOutcome::Pass,
    };

    tracing::debug!(path = %path.display(), passed = matches!(outcome, TestOutcome::Pass), "fixture finished");
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

/// Parse `source` and compare against the fixture's expectations.
/// Returns `Some(reason)` on the first mismatch.
fn check_fixture(config: &FixtureConfig, source: &str) -> Option<String> {
    let result = rfml::parse_str(source);

    if config.expect_parse_error {
        let err = match result {
            Ok(_) => return Some("expected parse error, but parsing succeeded".into()),
            Err(err) => err,
        };
        if let Some(line) = config.expect_error_line {
            if err.line != line {
                return Some(format!(
                    "expected parse error on line {}, got line {}: {}",
                    line, err.line, err.reason
                ));
            }
        }
        if let Some(expected) = &config.expect_error {
            if !err.reason.contains(expected.as_str()) {
                return Some(format!(
                    "expected parse error containing \"{}\", got: {}",
                    expected, err.reason
                ));
            }
        }
        return None;
    }

    match result {
        Ok(doc) => check_document(config, &doc),
        Err(err) => Some(format!("unexpected parse error: {}", err)),
    }
}

fn mismatch<T: std::fmt::Debug + PartialEq>(
    field: &str,
    expected: Option<&T>,
    actual: &T,
) -> Option<String> {
    match expected {
        Some(expected) if expected != actual => Some(format!(
            "{} mismatch\n  expected: {:?}\n  actual:   {:?}",
            field, expected, actual
        )),
        _ => None,
    }
}

fn check_document(config: &FixtureConfig, doc: &TestDocument) -> Option<String> {
    mismatch("rfml_id", config.expect_rfml_id.as_ref(), &doc.rfml_id)
        .or_else(|| {
            mismatch(
                "title",
                config.expect_title.as_ref().map(Some).as_ref(),
                &doc.title.as_ref(),
            )
        })
        .or_else(|| {
            mismatch(
                "start_uri",
                config.expect_start_uri.as_ref().map(Some).as_ref(),
                &doc.start_uri.as_ref(),
            )
        })
        .or_else(|| {
            mismatch(
                "site_id",
                config.expect_site_id.map(Some).as_ref(),
                &doc.site_id,
            )
        })
        .or_else(|| mismatch("tags", config.expect_tags.as_ref(), &doc.tags))
        .or_else(|| mismatch("browsers", config.expect_browsers.as_ref(), &doc.browsers))
        .or_else(|| {
            mismatch(
                "description",
                config.expect_description.as_ref(),
                &doc.description,
            )
        })
        .or_else(|| {
            mismatch(
                "uploadable",
                config.expect_uploadable.as_ref(),
                &doc.has_uploadable_files(),
            )
        })
        .or_else(|| {
            config
                .expect_steps
                .as_ref()
                .and_then(|expected| check_steps(&doc.steps, expected))
        })
}

fn check_steps(actual: &[Step], expected: &[ExpectedStep]) -> Option<String> {
    if actual.len() != expected.len() {
        return Some(format!(
            "expected {} step(s), got {}",
            expected.len(),
            actual.len()
        ));
    }

    for (i, (step, want)) in actual.iter().zip(expected).enumerate() {
        let reason = match step {
            Step::Action(action) => {
                if let Some(embed) = &want.embed {
                    Some(format!("expected embedded test \"{}\", got an action step", embed))
                } else {
                    mismatch("action", want.action.as_ref(), &action.action)
                        .or_else(|| mismatch("response", want.response.as_ref(), &action.response))
                }
            }
            Step::Embedded(test) => {
                if want.action.is_some() || want.response.is_some() {
                    Some(format!("expected an action step, got embedded test \"{}\"", test.rfml_id))
                } else {
                    mismatch("embed", want.embed.as_ref(), &test.rfml_id)
                }
            }
        }
        .or_else(|| mismatch("redirect", want.redirect.as_ref(), &step.redirect()));

        if let Some(reason) = reason {
            return Some(format!("step[{}]: {}", i, reason));
        }
    }

    None
}

/// List available categories for the given fixture path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover::collect_categorized(path, FIXTURE_SUFFIX);
    if categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return;
    }

    eprintln!("available categories:");
    for (cat, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(cat), files.len());
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

struct Palette {
    no_color: bool,
}

impl Palette {
    fn paint(&self, s: &str, code: &str) -> String {
        if self.no_color {
            s.to_string()
        } else {
            format!("\x1b[{}m{}\x1b[0m", code, s)
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, s: &str) -> String {
        self.paint(s, "1")
    }
}

/// Keep only the requested categories (and their subcategories).
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }

    let mut selected = BTreeMap::new();
    for req in requested {
        let req = req.trim_matches('/');
        let before = selected.len();
        for (cat, files) in all {
            if cat == req || cat.starts_with(&format!("{}/", req)) {
                selected.insert(cat.as_str(), files);
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                req,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

/// Run all `.test.rfml` files under `path` (or a single file).
/// If `categories` is non-empty, only run fixtures in those categories.
/// Returns exit code: 0 = all pass, 1 = any failure.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { no_color };

    let all_categories = if path.is_file() {
        BTreeMap::from([(String::new(), vec![path.to_path_buf()])])
    } else {
        discover::collect_categorized(path, FIXTURE_SUFFIX)
    };

    if all_categories.is_empty() {
        eprintln!("no {} files found in {}", FIXTURE_SUFFIX, path.display());
        return 1;
    }

    let run_categories = select_categories(&all_categories, categories);
    if run_categories.is_empty() {
        eprintln!("no matching categories found");
        return 1;
    }

    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (cat, files) in &run_categories {
        if !path.is_file() {
            eprintln!();
            eprintln!("{}", palette.bold(category_label(cat)));
        }

        for file in *files {
            let result = run_single_test(file);
            match &result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for f in &failures {
            eprintln!();
            eprintln!("  --- {} ---", f.path.display());
            if let TestOutcome::Fail(reason) = &f.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("ok", "32"), passed);
        0
    } else {
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("FAILED", "31"),
            passed,
            failures.len(),
            passed + failures.len()
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str) -> Option<String> {
        let (config, source) = parse_test_file(content).expect("frontmatter");
        check_fixture(&config, source)
    }

    #[test]
    fn frontmatter_is_split_from_source() {
        let (config, source) =
            parse_test_file("---\ndescription = \"login\"\n---\n#!id\nStep\n").unwrap();
        assert_eq!(config.description.as_deref(), Some("login"));
        assert_eq!(source, "#!id\nStep\n");
    }

    #[test]
    fn missing_frontmatter() {
        assert!(parse_test_file("#!id\n").is_err());
        assert!(parse_test_file("---\ndescription = \"x\"\n").is_err());
    }

    #[test]
    fn passing_fixture() {
        let fixture = r#"---
expect_rfml_id = "login"
expect_title = "Login"
expect_site_id = 0
expect_tags = ["a", "b"]
expect_uploadable = true

[[expect_steps]]
embed = "setup"

[[expect_steps]]
action = "Attach {{ file.download(./a.txt) }}"
response = "Attached?"
redirect = true
---
#!login
# title: Login
# site_id: 0
# tags: a , b

- setup

# redirect: true
Attach {{ file.download(./a.txt) }}
Attached?
"#;
        assert_eq!(run(fixture), None);
    }

    #[test]
    fn field_mismatch_is_reported() {
        let reason = run("---\nexpect_title = \"A\"\n---\n# title: B\n").unwrap();
        assert!(reason.starts_with("title mismatch"), "{}", reason);
    }

    #[test]
    fn unset_title_does_not_match_expected() {
        assert!(run("---\nexpect_title = \"A\"\n---\n#!id\n").is_some());
    }

    #[test]
    fn step_kind_mismatch() {
        let fixture = "---\n[[expect_steps]]\nembed = \"other\"\n---\nDo it\n";
        let reason = run(fixture).unwrap();
        assert!(reason.starts_with("step[0]: expected embedded test"), "{}", reason);
    }

    #[test]
    fn expected_parse_error_with_line() {
        let fixture = "---\nexpect_parse_error = true\nexpect_error_line = 2\nexpect_error = \"integer\"\n---\n#!id\n# site_id: x\n";
        assert_eq!(run(fixture), None);

        let wrong_line = "---\nexpect_parse_error = true\nexpect_error_line = 1\n---\n#!id\n# site_id: x\n";
        assert!(run(wrong_line).is_some());

        let no_error = "---\nexpect_parse_error = true\n---\n#!id\n";
        assert!(run(no_error).is_some());
    }
}
