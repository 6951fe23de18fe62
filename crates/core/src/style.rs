//! Resolved style of an element as a property bag.
//!
//! [`computed_style_of`] is the in-memory stand-in for a browser's resolved
//! style: user-agent defaults per tag, inherited properties from the parent,
//! then the element's own inline declarations.

use std::collections::BTreeMap;

use crate::dom::{Dom, NodeId};

/// Properties a child takes from its parent when it does not set them.
const INHERITED_PROPERTIES: [&str; 14] = [
    "color",
    "cursor",
    "font-family",
    "font-size",
    "font-style",
    "font-weight",
    "letter-spacing",
    "line-height",
    "list-style-type",
    "text-align",
    "text-transform",
    "visibility",
    "white-space",
    "word-break",
];

const BLOCK_TAGS: [&str; 32] = [
    "address",
    "article",
    "aside",
    "blockquote",
    "body",
    "dd",
    "details",
    "dialog",
    "div",
    "dl",
    "dt",
    "fieldset",
    "figcaption",
    "figure",
    "footer",
    "form",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "header",
    "hr",
    "html",
    "main",
    "nav",
    "ol",
    "p",
    "pre",
    "section",
    "ul",
];

const HIDDEN_TAGS: [&str; 10] =
    ["base", "head", "link", "meta", "noscript", "script", "style", "template", "title", "datalist"];

/// Property name to resolved value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputedStyle {
    properties: BTreeMap<String, String>,
}

impl ComputedStyle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.properties.get(property).map(String::as_str)
    }

    pub fn set(&mut self, property: &str, value: &str) {
        self.properties.insert(property.to_string(), value.to_string());
    }

    pub fn remove(&mut self, property: &str) -> Option<String> {
        self.properties.remove(property)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Resolved `display`, `inline` when unset.
    pub fn display(&self) -> &str {
        self.get("display").unwrap_or("inline")
    }

    pub fn is_display_none(&self) -> bool {
        self.display().eq_ignore_ascii_case("none")
    }

    /// Keeps only the listed properties.
    pub fn restrict<'a>(&self, properties: impl IntoIterator<Item = &'a str>) -> ComputedStyle {
        properties
            .into_iter()
            .filter_map(|property| self.get(property).map(|value| (property.to_string(), value.to_string())))
            .collect()
    }
}

impl FromIterator<(String, String)> for ComputedStyle {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { properties: iter.into_iter().collect() }
    }
}

/// Splits an inline style attribute into `(property, value)` pairs.
///
/// Semicolons inside parentheses or quotes (`url(data:...;base64,...)`) do
/// not end a declaration. Property names are lowercased and `!important` is
/// dropped.
pub fn parse_declarations(style: &str) -> Vec<(String, String)> {
    let mut declarations = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (index, c) in style.char_indices() {
        match (quote, c) {
            (Some(open), c) if c == open => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ';') if depth == 0 => {
                push_declaration(&style[start..index], &mut declarations);
                start = index + 1;
            }
            _ => {}
        }
    }
    push_declaration(&style[start..], &mut declarations);

    declarations
}

fn push_declaration(raw: &str, declarations: &mut Vec<(String, String)>) {
    let Some((property, value)) = raw.split_once(':') else {
        return;
    };

    let property = property.trim().to_ascii_lowercase();
    let mut value = value.trim();
    if let Some(stripped) = value.strip_suffix("!important").or_else(|| value.strip_suffix("!IMPORTANT")) {
        value = stripped.trim_end();
    }

    if !property.is_empty() && !value.is_empty() {
        declarations.push((property, value.to_string()));
    }
}

fn user_agent_defaults(tag: &str) -> Vec<(&'static str, &'static str)> {
    let mut defaults = Vec::new();

    let display = match tag {
        t if HIDDEN_TAGS.contains(&t) => "none",
        t if BLOCK_TAGS.contains(&t) => "block",
        "li" => "list-item",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        "thead" => "table-header-group",
        "tbody" => "table-row-group",
        "tfoot" => "table-footer-group",
        _ => "inline",
    };
    defaults.push(("display", display));

    match tag {
        "b" | "strong" | "th" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => defaults.push(("font-weight", "700")),
        "em" | "i" | "cite" | "var" | "dfn" => defaults.push(("font-style", "italic")),
        "code" | "kbd" | "samp" => defaults.push(("font-family", "monospace")),
        "pre" => {
            defaults.push(("font-family", "monospace"));
            defaults.push(("white-space", "pre"));
        }
        _ => {}
    }

    defaults
}

/// Resolves the style of `node` from user-agent defaults, inheritance and
/// its inline `style` attribute.
///
/// Non-element handles resolve to an empty style.
pub fn computed_style_of(dom: &Dom, node: NodeId) -> ComputedStyle {
    let Some(element) = dom.element(node) else {
        return ComputedStyle::default();
    };

    let parent = dom.parent_element(node).map(|parent| computed_style_of(dom, parent));
    let mut style = ComputedStyle::new();

    if let Some(parent) = &parent {
        for property in INHERITED_PROPERTIES {
            if let Some(value) = parent.get(property) {
                style.set(property, value);
            }
        }
    }

    for (property, value) in user_agent_defaults(element.name()) {
        style.set(property, value);
    }

    if let Some(inline) = element.attr("style") {
        for (property, value) in parse_declarations(inline) {
            match value.to_ascii_lowercase().as_str() {
                "inherit" => match parent.as_ref().and_then(|parent| parent.get(&property)) {
                    Some(inherited) => style.set(&property, inherited),
                    None => {
                        style.remove(&property);
                    }
                },
                "initial" | "unset" => {
                    style.remove(&property);
                }
                _ => style.set(&property, &value),
            }
        }
    }

    style
}
