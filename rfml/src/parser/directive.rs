use crate::document::TestDocument;

/// Directive keys the parser understands. Anything else after `#key:` is
/// folded into the description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectiveKey {
    Title,
    StartUri,
    SiteId,
    Tags,
    Browsers,
    Redirect,
}

impl DirectiveKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(DirectiveKey::Title),
            "start_uri" => Some(DirectiveKey::StartUri),
            "site_id" => Some(DirectiveKey::SiteId),
            "tags" => Some(DirectiveKey::Tags),
            "browsers" => Some(DirectiveKey::Browsers),
            "redirect" => Some(DirectiveKey::Redirect),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DirectiveKey::Title => "title",
            DirectiveKey::StartUri => "start_uri",
            DirectiveKey::SiteId => "site_id",
            DirectiveKey::Tags => "tags",
            DirectiveKey::Browsers => "browsers",
            DirectiveKey::Redirect => "redirect",
        }
    }
}

/// A directive with its value validated and converted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Title(String),
    StartUri(String),
    SiteId(i64),
    Tags(Vec<String>),
    Browsers(Vec<String>),
    /// Step-level; applied by the assembler, not to the header.
    Redirect(bool),
}

impl Directive {
    /// Validate `value` for `key`. On failure returns the human-readable reason.
    pub fn parse(key: DirectiveKey, value: &str) -> Result<Directive, &'static str> {
        match key {
            DirectiveKey::Title => Ok(Directive::Title(value.to_string())),
            DirectiveKey::StartUri => Ok(Directive::StartUri(value.to_string())),
            DirectiveKey::SiteId => value
                .parse::<i64>()
                .map(Directive::SiteId)
                .map_err(|_| "Site ID must be a valid integer."),
            DirectiveKey::Tags => Ok(Directive::Tags(split_list(value))),
            DirectiveKey::Browsers => Ok(Directive::Browsers(split_list(value))),
            DirectiveKey::Redirect => parse_bool(value)
                .map(Directive::Redirect)
                .ok_or("Redirect must be a boolean."),
        }
    }

    /// Apply a header directive to the document. Returns the directive back
    /// if it is step-level and must be handled by the caller.
    pub fn apply(self, doc: &mut TestDocument) -> Option<Directive> {
        match self {
            Directive::Title(title) => doc.title = Some(title),
            Directive::StartUri(uri) => doc.start_uri = Some(uri),
            Directive::SiteId(id) => doc.site_id = Some(id),
            Directive::Tags(tags) => doc.tags = tags,
            Directive::Browsers(browsers) => doc.browsers = browsers,
            step_level @ Directive::Redirect(_) => return Some(step_level),
        }
        None
    }
}

/// Comma-split, trim each entry, drop empty entries. Order and duplicates are kept.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_names_round_trip() {
        for key in [
            DirectiveKey::Title,
            DirectiveKey::StartUri,
            DirectiveKey::SiteId,
            DirectiveKey::Tags,
            DirectiveKey::Browsers,
            DirectiveKey::Redirect,
        ] {
            assert_eq!(DirectiveKey::from_name(key.name()), Some(key));
        }
        assert_eq!(DirectiveKey::from_name("description"), None);
    }

    #[test]
    fn site_id_values() {
        assert_eq!(Directive::parse(DirectiveKey::SiteId, "42"), Ok(Directive::SiteId(42)));
        assert_eq!(Directive::parse(DirectiveKey::SiteId, "0"), Ok(Directive::SiteId(0)));
        assert_eq!(Directive::parse(DirectiveKey::SiteId, "-7"), Ok(Directive::SiteId(-7)));
        assert_eq!(
            Directive::parse(DirectiveKey::SiteId, "abc"),
            Err("Site ID must be a valid integer.")
        );
        assert!(Directive::parse(DirectiveKey::SiteId, "").is_err());
        assert!(Directive::parse(DirectiveKey::SiteId, "1.5").is_err());
    }

    #[test]
    fn list_splitting() {
        assert_eq!(split_list(" a ,b ,  c  "), vec!["a", "b", "c"]);
        assert_eq!(split_list("a,a"), vec!["a", "a"]);
        assert_eq!(split_list("a,, b,"), vec!["a", "b"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn redirect_values() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("T"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("False"), Some(false));
        assert_eq!(parse_bool("yes"), None);
        assert_eq!(
            Directive::parse(DirectiveKey::Redirect, "maybe"),
            Err("Redirect must be a boolean.")
        );
    }

    #[test]
    fn apply_replaces_lists() {
        let mut doc = TestDocument::empty();
        assert_eq!(Directive::Tags(vec!["a".into(), "b".into()]).apply(&mut doc), None);
        assert_eq!(Directive::Tags(vec!["c".into()]).apply(&mut doc), None);
        assert_eq!(doc.tags, vec!["c"]);
        assert_eq!(
            Directive::Redirect(true).apply(&mut doc),
            Some(Directive::Redirect(true))
        );
    }
}
