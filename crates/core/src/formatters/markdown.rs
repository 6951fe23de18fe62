use crate::pipeline::ExtractedItem;
use scraper::{ElementRef, Html, Node};
use std::collections::HashMap;
use std::sync::LazyLock;

/// Separator between the Markdown renderings of two extracted items
pub const ITEM_SEPARATOR: &str = "\n\n---\n\n";

/// Renders an element from its tag and the Markdown of its children
pub type WrapFn = fn(&ElementRef<'_>, String) -> String;

/// Rendering rule attached to a tag name
#[derive(Clone, Copy)]
pub enum MarkdownRule {
    /// Render children, then wrap the result
    Wrap(WrapFn),
    /// Number each direct `li` child instead of rendering it as a bullet
    OrderedList,
}

impl std::fmt::Debug for MarkdownRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarkdownRule::Wrap(_) => f.write_str("Wrap"),
            MarkdownRule::OrderedList => f.write_str("OrderedList"),
        }
    }
}

static DEFAULT_RULES: LazyLock<HashMap<&'static str, MarkdownRule>> = LazyLock::new(|| {
    use MarkdownRule::{OrderedList, Wrap};

    let rules: [(&'static str, MarkdownRule); 24] = [
        ("h1", Wrap(|_, content| format!("# {}\n\n", content))),
        ("h2", Wrap(|_, content| format!("## {}\n\n", content))),
        ("h3", Wrap(|_, content| format!("### {}\n\n", content))),
        ("h4", Wrap(|_, content| format!("#### {}\n\n", content))),
        ("h5", Wrap(|_, content| format!("##### {}\n\n", content))),
        ("h6", Wrap(|_, content| format!("###### {}\n\n", content))),
        ("p", Wrap(|_, content| format!("{}\n\n", content))),
        ("strong", Wrap(|_, content| format!("**{}**", content))),
        ("b", Wrap(|_, content| format!("**{}**", content))),
        ("em", Wrap(|_, content| format!("*{}*", content))),
        ("i", Wrap(|_, content| format!("*{}*", content))),
        ("li", Wrap(|_, content| format!("- {}\n", content))),
        ("ul", Wrap(|_, content| format!("\n{}\n", content))),
        ("ol", OrderedList),
        ("br", Wrap(|_, _| "\n".to_string())),
        ("hr", Wrap(|_, _| "\n---\n".to_string())),
        ("blockquote", Wrap(|_, content| format!("> {}\n\n", content))),
        ("code", Wrap(|_, content| format!("`{}`", content))),
        ("pre", Wrap(|_, content| format!("\n```\n{}\n```\n\n", content))),
        ("a", Wrap(|el, content| format!("[{}]({})", content, el.value().attr("href").unwrap_or("")))),
        (
            "img",
            Wrap(|el, _| {
                let alt = el.value().attr("alt").unwrap_or("");
                let src = el.value().attr("src").unwrap_or("");
                format!("![{}]({})", alt, src)
            }),
        ),
        ("tr", Wrap(|_, content| format!("{} | ", content))),
        ("td", Wrap(|_, content| format!("{} ", content))),
        ("th", Wrap(|_, content| format!("{} ", content))),
    ];

    rules.into_iter().collect()
});

/// HTML to Markdown converter driven by a tag → rule table.
///
/// Tags without a rule render as their children. The converter never
/// touches a live document; it parses its input into a detached fragment.
#[derive(Debug, Clone)]
pub struct MarkdownConverter {
    rules: HashMap<String, MarkdownRule>,
}

impl MarkdownConverter {
    /// Create a converter with the default rule table
    pub fn new() -> Self {
        Self { rules: DEFAULT_RULES.iter().map(|(tag, rule)| (tag.to_string(), *rule)).collect() }
    }

    /// Create a converter with no rules; every tag renders as its children
    pub fn empty() -> Self {
        Self { rules: HashMap::new() }
    }

    /// Add or replace the rule for a tag
    pub fn with_rule(mut self, tag: &str, rule: MarkdownRule) -> Self {
        self.rules.insert(tag.to_ascii_lowercase(), rule);
        self
    }

    /// Remove the rule for a tag
    pub fn without_rule(mut self, tag: &str) -> Self {
        self.rules.remove(&tag.to_ascii_lowercase());
        self
    }

    pub fn rule(&self, tag: &str) -> Option<&MarkdownRule> {
        self.rules.get(tag)
    }

    /// Convert an HTML fragment to Markdown, trimmed
    pub fn to_markdown(&self, html: &str) -> String {
        let fragment = Html::parse_fragment(html);
        self.render_children(fragment.root_element()).trim().to_string()
    }

    fn render_children(&self, element: ElementRef<'_>) -> String {
        let mut content = String::new();
        for child in element.children() {
            if let Some(child_element) = ElementRef::wrap(child) {
                content.push_str(&self.render_element(child_element));
            } else if let Node::Text(text) = child.value() {
                content.push_str(text);
            }
        }
        content
    }

    fn render_element(&self, element: ElementRef<'_>) -> String {
        match self.rules.get(element.value().name()) {
            Some(MarkdownRule::OrderedList) => self.render_ordered_list(element),
            Some(MarkdownRule::Wrap(wrap)) => wrap(&element, self.render_children(element)),
            None => self.render_children(element),
        }
    }

    fn render_ordered_list(&self, list: ElementRef<'_>) -> String {
        let mut content = String::new();
        let mut ordinal = 1;

        for child in list.children() {
            match ElementRef::wrap(child) {
                Some(item) if item.value().name() == "li" => {
                    content.push_str(&format!("{}. {}\n", ordinal, self.render_children(item).trim()));
                    ordinal += 1;
                }
                Some(other) => content.push_str(&self.render_element(other)),
                None => {
                    if let Node::Text(text) = child.value() {
                        content.push_str(text);
                    }
                }
            }
        }

        format!("\n{}\n", content)
    }
}

impl Default for MarkdownConverter {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_CONVERTER: LazyLock<MarkdownConverter> = LazyLock::new(MarkdownConverter::new);

/// Convert an HTML fragment to Markdown with the default rules
pub fn html_to_markdown(html: &str) -> String {
    DEFAULT_CONVERTER.to_markdown(html)
}

/// Markdown view of a list of extracted items
pub fn items_to_markdown(items: &[ExtractedItem]) -> String {
    items.iter().map(|item| html_to_markdown(&item.html)).collect::<Vec<_>>().join(ITEM_SEPARATOR)
}
