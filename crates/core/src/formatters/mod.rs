pub mod json;
pub mod markdown;
pub mod text;

pub use json::{JsonConfig, JsonFormatter, convert_to_json};
pub use markdown::{MarkdownConverter, MarkdownRule, html_to_markdown, items_to_markdown};
pub use text::{TextConfig, TextFormatter, convert_to_text, items_to_text};

use crate::pipeline::ExtractedItem;

/// Separator between two items in the rich view
pub const RICH_SEPARATOR: &str = r#"<br class="splitview-separator"><hr><br>"#;

/// Rich (HTML) view of a list of extracted items
pub fn items_to_html(items: &[ExtractedItem]) -> String {
    items.iter().map(|item| item.html.as_str()).collect::<Vec<_>>().join(RICH_SEPARATOR)
}
