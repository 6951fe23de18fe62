//! Preparation of extracted content for the clipboard and for printing.

use crate::formatters::{TextConfig, items_to_html, items_to_markdown, items_to_text};
use crate::pipeline::ExtractedItem;
use crate::siterules::SiteRule;
use crate::style::parse_declarations;

/// Title of the print document.
pub const PRINT_TITLE: &str = "Exported Content";

/// Stylesheet of the print document.
pub const PRINT_STYLES: &str = r#"
    body {
      font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
      line-height: 1.6;
      color: #333;
      padding: 20px;
    }
    img { max-width: 100%; height: auto; margin: 10px 0; }
    blockquote { border-left: 4px solid #0071e3; margin: 0; padding-left: 16px; color: #666; }
    pre { background: #f5f5f7; padding: 12px; border-radius: 8px; overflow-x: auto; white-space: pre-wrap; }
    h1, h2, h3 { color: #111; margin-top: 1.5em; }
    a { color: #0071e3; text-decoration: none; }
"#;

/// Rich clipboard content: the `text/html` and `text/plain` flavours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    pub html: String,
    pub text: String,
}

impl ClipboardPayload {
    /// Builds the rich copy of `items`, undoing clamping with the rule's collapse fix.
    pub fn from_items(items: &[ExtractedItem], rule: Option<&SiteRule>) -> Self {
        let html = items_to_html(items);
        let html = match rule {
            Some(rule) => apply_collapse_fix(&html, rule),
            None => html,
        };

        Self { html, text: items_to_text(items, &TextConfig::default()) }
    }
}

/// Plain Markdown copy of `items`.
pub fn markdown_copy(items: &[ExtractedItem]) -> String {
    items_to_markdown(items)
}

/// Appends the rule's collapse fix declarations to the inline style of every element.
///
/// Declarations already present for the same properties are replaced.
/// Without a fix the HTML is returned unchanged.
pub fn apply_collapse_fix(html: &str, rule: &SiteRule) -> String {
    let fix = rule.collapse_declarations();
    if fix.is_empty() {
        return html.to_string();
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings {
            element_content_handlers: vec![lol_html::element!("*", |el| {
                let existing = el.get_attribute("style").unwrap_or_default();
                el.set_attribute("style", &merge_style(&existing, &fix))?;
                Ok(())
            })],
            ..Default::default()
        },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    match rewriter.write(html.as_bytes()) {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    match rewriter.end() {
        Ok(_) => {}
        Err(_) => return html.to_string(),
    }

    if output.is_empty() { html.to_string() } else { output }
}

fn merge_style(existing: &str, fix: &[(String, String)]) -> String {
    let mut style = String::new();

    for (property, value) in parse_declarations(existing) {
        if fix.iter().any(|(fixed, _)| *fixed == property) {
            continue;
        }
        style.push_str(&format!("{}:{};", property, value));
    }
    for (property, value) in fix {
        style.push_str(&format!("{}:{};", property, value));
    }

    style
}

/// Standalone HTML document used for PDF export.
pub fn print_document(body_html: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        PRINT_TITLE, PRINT_STYLES, body_html
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clamp_rule() -> SiteRule {
        SiteRule::from_json(r#"{"collapseStyleFix": {"maxHeight": "none", "-webkit-line-clamp": "unset"}}"#).unwrap()
    }

    #[test]
    fn test_collapse_fix_applies_to_every_element() {
        let html = r#"<div style="max-height:80px;color:red"><p>text</p></div>"#;
        let fixed = apply_collapse_fix(html, &clamp_rule());

        assert_eq!(
            fixed,
            r#"<div style="color:red;-webkit-line-clamp:unset;max-height:none;"><p style="-webkit-line-clamp:unset;max-height:none;">text</p></div>"#
        );
    }

    #[test]
    fn test_empty_fix_leaves_html_unchanged() {
        let html = "<p>text</p>";
        assert_eq!(apply_collapse_fix(html, &SiteRule::new()), html);
    }

    #[test]
    fn test_clipboard_payload() {
        let items = vec![
            ExtractedItem { index: 1, html: "<p>One</p>".to_string() },
            ExtractedItem { index: 2, html: "<p>Two</p>".to_string() },
        ];
        let payload = ClipboardPayload::from_items(&items, None);

        assert_eq!(payload.html, r#"<p>One</p><br class="splitview-separator"><hr><br><p>Two</p>"#);
        assert_eq!(payload.text, "One\n\nTwo");
        assert_eq!(markdown_copy(&items), "One\n\n---\n\nTwo");
    }

    #[test]
    fn test_print_document() {
        let document = print_document("<p>Body</p>");

        assert!(document.starts_with("<!DOCTYPE html>"));
        assert!(document.contains("<title>Exported Content</title>"));
        assert!(document.contains("border-left: 4px solid #0071e3"));
        assert!(document.contains("<body>\n<p>Body</p>\n</body>"));
    }
}
