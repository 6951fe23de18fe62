use crate::error::{Result, SplitViewError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

/// Per-domain rule describing how to expand collapsed content.
///
/// Rule files are JSON objects with camelCase keys; every key is optional.
///
/// ```json
/// {
///   "expandSelectors": ["[data-testid='tweet-text-show-more-link']"],
///   "expandText": ["Show more", "Read more"],
///   "hideOnSplit": ["header[role='banner']"],
///   "collapseStyleFix": { "maxHeight": "none", "-webkit-line-clamp": "unset" }
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteRule {
    /// Expand controls, activated for every match in order
    pub expand_selectors: Vec<String>,
    /// Read-more labels matched against button text
    pub expand_text: Vec<String>,
    /// Page chrome hidden while the split view is open
    pub hide_on_split: Vec<String>,
    /// Style overrides applied to copied content to undo clamping
    pub collapse_style_fix: BTreeMap<String, String>,
}

impl SiteRule {
    /// Create a new empty rule
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a rule from JSON text
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| SplitViewError::SiteRuleError(e.to_string()))
    }

    /// Parse a rule file
    pub fn parse_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(SplitViewError::FileNotFound(path.to_path_buf()));
        }
        let content = fs::read_to_string(path)?;
        Self::from_json(&content).map_err(|e| SplitViewError::SiteRuleError(format!("{}: {}", path.display(), e)))
    }

    /// True when the rule can trigger any expansion
    pub fn has_expansion(&self) -> bool {
        !self.expand_selectors.is_empty() || !self.expand_text.is_empty()
    }

    /// Clamp fix as `(css-property, value)` pairs.
    ///
    /// camelCase keys become CSS property names (`maxHeight` → `max-height`,
    /// `WebkitLineClamp` → `-webkit-line-clamp`); dashed keys are kept.
    pub fn collapse_declarations(&self) -> Vec<(String, String)> {
        self.collapse_style_fix
            .iter()
            .filter(|(_, value)| !value.trim().is_empty())
            .map(|(key, value)| (css_property_name(key), value.trim().to_string()))
            .collect()
    }
}

fn css_property_name(key: &str) -> String {
    if key.contains('-') {
        return key.to_ascii_lowercase();
    }

    let vendor_prefixed = ["Webkit", "Moz", "Ms"].iter().any(|prefix| key.starts_with(prefix));
    let mut name = String::with_capacity(key.len() + 4);
    for (index, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() {
            if index > 0 || vendor_prefixed {
                name.push('-');
            }
            name.push(c.to_ascii_lowercase());
        } else {
            name.push(c);
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_parse_full_rule() {
        let rule = SiteRule::from_json(
            r#"{
                "expandSelectors": [".show-more"],
                "expandText": ["Read more"],
                "hideOnSplit": ["nav"],
                "collapseStyleFix": {"maxHeight": "none", "overflow": "visible"}
            }"#,
        )
        .unwrap();

        assert_eq!(rule.expand_selectors, vec![".show-more"]);
        assert_eq!(rule.expand_text, vec!["Read more"]);
        assert_eq!(rule.hide_on_split, vec!["nav"]);
        assert_eq!(rule.collapse_style_fix.len(), 2);
        assert!(rule.has_expansion());
    }

    #[test]
    fn test_missing_keys_default_to_empty() {
        let rule = SiteRule::from_json(r#"{"hideOnSplit": ["aside"]}"#).unwrap();

        assert!(rule.expand_selectors.is_empty());
        assert!(!rule.has_expansion());
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(SiteRule::from_json("{ nope"), Err(SplitViewError::SiteRuleError(_))));
    }

    #[rstest]
    #[case("maxHeight", "max-height")]
    #[case("overflow", "overflow")]
    #[case("lineClamp", "line-clamp")]
    #[case("WebkitLineClamp", "-webkit-line-clamp")]
    #[case("-webkit-line-clamp", "-webkit-line-clamp")]
    fn test_css_property_name(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(css_property_name(key), expected);
    }

    #[test]
    fn test_collapse_declarations_skip_blank_values() {
        let rule =
            SiteRule::from_json(r#"{"collapseStyleFix": {"maxHeight": "none", "overflow": " "}}"#).unwrap();

        assert_eq!(rule.collapse_declarations(), vec![("max-height".to_string(), "none".to_string())]);
    }
}
