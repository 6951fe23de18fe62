use crate::pipeline::ExtractedItem;
use scraper::{ElementRef, Html};

const BLOCK_ELEMENTS: [&str; 24] = [
    "address",
    "article",
    "blockquote",
    "br",
    "dd",
    "div",
    "dt",
    "figcaption",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "hr",
    "li",
    "ol",
    "p",
    "pre",
    "section",
    "table",
    "td",
    "th",
    "tr",
];

/// Configuration for plain text output
#[derive(Debug, Clone)]
pub struct TextConfig {
    /// Separate blocks with blank lines; otherwise all text joins into one line
    pub preserve_paragraphs: bool,

    /// Wrap lines at specified width (0 = no wrapping)
    pub line_width: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self { preserve_paragraphs: true, line_width: 0 }
    }
}

/// Plain text formatter for clipboard and terminal output
pub struct TextFormatter {
    config: TextConfig,
}

impl TextFormatter {
    pub fn new(config: TextConfig) -> Self {
        Self { config }
    }

    /// Convert HTML content to plain text
    pub fn convert(&self, html: &str) -> String {
        convert_to_text(html, &self.config)
    }
}

/// Convert an HTML fragment to plain text with specified configuration
pub fn convert_to_text(html: &str, config: &TextConfig) -> String {
    let fragment = Html::parse_fragment(html);
    let mut blocks = Vec::new();
    let mut current = String::new();
    collect_blocks(fragment.root_element(), &mut blocks, &mut current);
    flush_block(&mut blocks, &mut current);

    if !config.preserve_paragraphs {
        return wrap_text(&blocks.join(" "), config.line_width);
    }

    blocks.iter().map(|block| wrap_text(block, config.line_width)).collect::<Vec<_>>().join("\n\n")
}

/// Plain text of a list of extracted items, one block group per item
pub fn items_to_text(items: &[ExtractedItem], config: &TextConfig) -> String {
    items
        .iter()
        .map(|item| convert_to_text(&item.html, config))
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn collect_blocks(element: ElementRef<'_>, blocks: &mut Vec<String>, current: &mut String) {
    for child in element.children() {
        if let Some(child_element) = ElementRef::wrap(child) {
            if BLOCK_ELEMENTS.contains(&child_element.value().name()) {
                flush_block(blocks, current);
                collect_blocks(child_element, blocks, current);
                flush_block(blocks, current);
            } else {
                collect_blocks(child_element, blocks, current);
            }
        } else if let Some(text) = child.value().as_text() {
            current.push_str(text);
        }
    }
}

fn flush_block(blocks: &mut Vec<String>, current: &mut String) {
    let collapsed = current.split_whitespace().collect::<Vec<_>>().join(" ");
    if !collapsed.is_empty() {
        blocks.push(collapsed);
    }
    current.clear();
}

/// Wrap a single-line block to specified width
fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return text.to_string();
    }

    let mut lines = Vec::new();
    let mut current_line = Vec::new();
    let mut current_length = 0;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if current_length == 0 {
            current_line.push(word);
            current_length = word_len;
        } else if current_length + 1 + word_len <= width {
            current_length += 1 + word_len;
            current_line.push(word);
        } else {
            lines.push(current_line.join(" "));
            current_line = vec![word];
            current_length = word_len;
        }
    }

    if !current_line.is_empty() {
        lines.push(current_line.join(" "));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocks_become_paragraphs() {
        let html = "<h1>Title</h1><p>Text with <strong>bold</strong>\n   and <em>italic</em>.</p><ul><li>one</li><li>two</li></ul>";
        let text = convert_to_text(html, &TextConfig::default());

        assert_eq!(text, "Title\n\nText with bold and italic.\n\none\n\ntwo");
    }

    #[test]
    fn test_nested_blocks_are_not_duplicated() {
        let html = "<div><div><p>inner</p></div>tail</div>";
        assert_eq!(convert_to_text(html, &TextConfig::default()), "inner\n\ntail");
    }

    #[test]
    fn test_single_line_mode() {
        let config = TextConfig { preserve_paragraphs: false, ..Default::default() };
        assert_eq!(convert_to_text("<p>a</p><p>b</p>", &config), "a b");
    }

    #[test]
    fn test_wrap_text() {
        let wrapped = wrap_text("This is a long line that should be wrapped", 20);

        for line in wrapped.lines() {
            assert!(line.len() <= 20);
        }
        assert_eq!(wrapped.lines().count(), 3);
    }

    #[test]
    fn test_items_to_text_skips_empty_items() {
        let items = vec![
            ExtractedItem { index: 1, html: "<p>First</p>".to_string() },
            ExtractedItem { index: 2, html: "<img src=\"x.png\">".to_string() },
            ExtractedItem { index: 3, html: "<p>Third</p>".to_string() },
        ];

        assert_eq!(items_to_text(&items, &TextConfig::default()), "First\n\nThird");
    }

    #[test]
    fn test_formatter_matches_function() {
        let formatter = TextFormatter::new(TextConfig::default());
        assert_eq!(formatter.convert("<p>x</p>"), convert_to_text("<p>x</p>", &TextConfig::default()));
    }
}
