use crate::Result;
use crate::formatters::markdown::html_to_markdown;
use crate::formatters::text::{TextConfig, convert_to_text};
use crate::pipeline::ExtractedItem;
use serde::Serialize;

/// Complete JSON output structure
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Page the items were extracted from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Number of items
    pub count: usize,
    /// Extracted items in order
    pub items: Vec<JsonItem>,
}

/// One extracted item in several formats
#[derive(Debug, Clone, Serialize)]
pub struct JsonItem {
    /// 1-based position
    pub index: usize,
    /// Sanitized HTML
    pub html: String,
    /// Item as Markdown
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown: Option<String>,
    /// Item as plain text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Configuration for JSON output
#[derive(Debug, Clone, Default)]
pub struct JsonConfig {
    /// Include Markdown in output
    pub include_markdown: bool,
    /// Include plain text in output
    pub include_text: bool,
    /// Pretty print JSON output
    pub pretty: bool,
}

/// JSON formatter with configurable options
pub struct JsonFormatter {
    config: JsonConfig,
}

impl JsonFormatter {
    pub fn new(config: JsonConfig) -> Self {
        Self { config }
    }

    pub fn convert(&self, items: &[ExtractedItem], source: Option<&str>) -> Result<String> {
        convert_to_json(items, source, &self.config)
    }
}

/// Convert extracted items to JSON format
pub fn convert_to_json(items: &[ExtractedItem], source: Option<&str>, config: &JsonConfig) -> Result<String> {
    let text_config = TextConfig::default();
    let output = JsonOutput {
        source: source.map(str::to_string),
        count: items.len(),
        items: items
            .iter()
            .map(|item| JsonItem {
                index: item.index,
                html: item.html.clone(),
                markdown: config.include_markdown.then(|| html_to_markdown(&item.html)),
                text: config.include_text.then(|| convert_to_text(&item.html, &text_config)),
            })
            .collect(),
    };

    if config.pretty { Ok(serde_json::to_string_pretty(&output)?) } else { Ok(serde_json::to_string(&output)?) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<ExtractedItem> {
        vec![
            ExtractedItem { index: 1, html: "<h2>One</h2>".to_string() },
            ExtractedItem { index: 2, html: "<p>Two</p>".to_string() },
        ]
    }

    #[test]
    fn test_convert_to_json_html_only() {
        let json = convert_to_json(&items(), Some("https://example.com/"), &JsonConfig::default()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed["source"], "https://example.com/");
        assert_eq!(parsed["count"], 2);
        assert_eq!(parsed["items"][1]["index"], 2);
        assert_eq!(parsed["items"][0]["html"], "<h2>One</h2>");
        assert!(parsed["items"][0].get("markdown").is_none());
    }

    #[test]
    fn test_convert_to_json_all_formats() {
        let config = JsonConfig { include_markdown: true, include_text: true, pretty: true };
        let json = convert_to_json(&items(), None, &config).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert!(json.contains('\n'));
        assert!(parsed.get("source").is_none());
        assert_eq!(parsed["items"][0]["markdown"], "## One");
        assert_eq!(parsed["items"][1]["text"], "Two");
    }

    #[test]
    fn test_json_formatter() {
        let formatter = JsonFormatter::new(JsonConfig::default());
        let json = formatter.convert(&[], None).unwrap();

        assert_eq!(json, r#"{"count":0,"items":[]}"#);
    }
}
