//! Front-matter keys that become pandoc options.

use super::OptionKey;
use crate::config::SectionValue;
use crate::debug;
use crate::document::FrontMatter;
use rustc_hash::FxHashSet;
use serde_json::Value;

/// Header keys that are always treated as pandoc long options.
pub const DOCUMENT_OPTIONS: &[&str] = &[
    "csl",
    "template",
    "bibliography",
    "citation-abbreviations",
    "reference-doc",
    "pdf-engine",
    "highlight-style",
    "toc",
    "number-sections",
    "slide-level",
    "css",
    "include-in-header",
    "include-before-body",
    "include-after-body",
    "resource-path",
];

/// Header key selecting the citation strategy, read by the planner.
pub const CITATION_PROCESSOR: &str = "citation-processor";

/// Option entries derived from `front_matter`, in header order.
///
/// `None` means the option is switched off (`toc: false`).
/// `known` holds long option names already used by the base section or the
/// overrides, so `pdf-engine`-like keys outside [`DOCUMENT_OPTIONS`] work too.
pub(super) fn entries(
    front_matter: &FrontMatter,
    known: &FxHashSet<String>,
) -> Vec<(OptionKey, Option<SectionValue>)> {
    let mut out = Vec::new();

    for (key, value) in front_matter.iter() {
        let key = key.as_str();
        let option = match key {
            CITATION_PROCESSOR => continue,
            "filter" | "filters" => OptionKey::long("filter"),
            "lua-filter" | "lua-filters" => OptionKey::long("lua-filter"),
            "variables" => {
                if let Some(vars) = variables(value) {
                    out.push((OptionKey::Variable, Some(vars)));
                }
                continue;
            }
            _ if DOCUMENT_OPTIONS.contains(&key) || known.contains(key) => OptionKey::long(key),
            _ => continue,
        };

        match convert(value) {
            Some(converted) => out.push((option, converted)),
            None => debug!("options"; "ignoring non-scalar header value for `{}`", key),
        }
    }

    out
}

/// Header value as an option value. Outer `None`: not representable.
fn convert(value: &Value) -> Option<Option<SectionValue>> {
    match value {
        Value::Bool(true) => Some(Some(SectionValue::Flag)),
        Value::Bool(false) | Value::Null => Some(None),
        Value::String(s) => Some(Some(SectionValue::text(s.as_str()))),
        Value::Number(n) => Some(Some(SectionValue::Text(n.to_string()))),
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .collect::<Option<Vec<_>>>()
            .map(|items| Some(SectionValue::List(items))),
        Value::Object(_) => None,
    }
}

/// `variables:` as a mapping (`fontsize: 12pt`) or a list of `name=value`.
fn variables(value: &Value) -> Option<SectionValue> {
    match value {
        Value::Object(map) => {
            let items = map
                .iter()
                .filter_map(|(name, v)| match v {
                    Value::Bool(true) => Some(name.clone()),
                    Value::Bool(false) | Value::Null => None,
                    other => scalar(other).map(|v| format!("{name}={v}")),
                })
                .collect();
            Some(SectionValue::List(items))
        }
        Value::Array(items) => items
            .iter()
            .map(scalar)
            .collect::<Option<Vec<_>>>()
            .map(SectionValue::List),
        Value::String(s) => Some(SectionValue::text(s.as_str())),
        _ => None,
    }
}

fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, json};

    fn front_matter(value: Value) -> FrontMatter {
        let Value::Object(map) = value else {
            return FrontMatter::from(Map::new());
        };
        FrontMatter::from(map)
    }

    #[test]
    fn test_known_keys_become_options() {
        let fm = front_matter(json!({
            "title": "Paper",
            "csl": "ieee",
            "toc": true,
            "number-sections": false,
            "citation-processor": "biber",
        }));
        let entries = entries(&fm, &FxHashSet::default());
        assert_eq!(
            entries,
            vec![
                (OptionKey::long("csl"), Some(SectionValue::Text("ieee".into()))),
                (OptionKey::long("toc"), Some(SectionValue::Flag)),
                (OptionKey::long("number-sections"), None),
            ]
        );
    }

    #[test]
    fn test_keys_known_from_config() {
        let fm = front_matter(json!({ "mathjax": true, "author": "me" }));
        let known: FxHashSet<String> = ["mathjax".to_string()].into_iter().collect();
        assert_eq!(
            entries(&fm, &known),
            vec![(OptionKey::long("mathjax"), Some(SectionValue::Flag))]
        );
    }

    #[test]
    fn test_filters_and_variables() {
        let fm = front_matter(json!({
            "filters": ["pandoc-crossref"],
            "variables": { "fontsize": "12pt", "draft": true, "twocolumn": false },
        }));
        assert_eq!(
            entries(&fm, &FxHashSet::default()),
            vec![
                (
                    OptionKey::long("filter"),
                    Some(SectionValue::List(vec!["pandoc-crossref".into()]))
                ),
                (
                    OptionKey::Variable,
                    Some(SectionValue::List(vec!["fontsize=12pt".into(), "draft".into()]))
                ),
            ]
        );
    }

    #[test]
    fn test_nested_mapping_is_ignored() {
        let fm = front_matter(json!({ "csl": { "name": "ieee" } }));
        assert!(entries(&fm, &FxHashSet::default()).is_empty());
    }
}
