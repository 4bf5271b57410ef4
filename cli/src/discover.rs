use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const RFML_SUFFIX: &str = ".rfml";
pub const FIXTURE_SUFFIX: &str = ".test.rfml";

/// Expand files and directories into the sorted list of files ending in
/// `suffix`. Files named explicitly are kept whatever their name.
pub fn collect_files(paths: &[PathBuf], suffix: &str) -> Vec<PathBuf> {
    let mut out = Vec::new();
    for path in paths {
        if path.is_dir() {
            walk(path, suffix, &mut |file| out.push(file));
        } else {
            out.push(path.clone());
        }
    }
    out.sort();
    out.dedup();
    out
}

/// Files ending in `suffix` under `root`, grouped by subfolder relative to
/// `root`. Files directly in `root` get category "".
pub fn collect_categorized(root: &Path, suffix: &str) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    walk(root, suffix, &mut |file| {
        let category = file
            .parent()
            .and_then(|p| p.strip_prefix(root).ok())
            .map(|p| p.to_string_lossy().replace('\\', "/"))
            .unwrap_or_default();
        categories.entry(category).or_default().push(file);
    });
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn walk(dir: &Path, suffix: &str, found: &mut dyn FnMut(PathBuf)) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "cannot read directory");
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, suffix, found);
        } else if path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(|name| name.ends_with(suffix))
        {
            found(path);
        }
    }
}
