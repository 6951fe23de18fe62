//! Sanitizing of extracted HTML.
//!
//! Removes non-content elements and rewrites media and link URLs to their
//! absolute form so the fragment stays valid once detached from its page.
//! Sanitizing is idempotent: a second pass leaves the output unchanged.

use url::Url;

/// Elements removed together with their content.
pub const NON_CONTENT_TAGS: [&str; 7] = ["script", "style", "link", "meta", "noscript", "iframe", "frame"];

/// Configuration for HTML sanitizing
#[derive(Debug, Clone)]
pub struct SanitizeConfig {
    /// Tags removed with their whole subtree
    pub removed_tags: Vec<String>,
    /// Base URL relative `src`, `srcset` and `href` values resolve against.
    /// Without one, URLs are left as they are.
    pub base_url: Option<Url>,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self { removed_tags: NON_CONTENT_TAGS.iter().map(|tag| tag.to_string()).collect(), base_url: None }
    }
}

impl SanitizeConfig {
    pub fn with_base_url(base_url: Option<Url>) -> Self {
        Self { base_url, ..Self::default() }
    }
}

/// Sanitize an HTML fragment
pub fn sanitize_html(html: &str, config: &SanitizeConfig) -> String {
    let base_url = config.base_url.as_ref();

    let mut handlers: Vec<_> = config
        .removed_tags
        .iter()
        .map(|tag| {
            lol_html::element!(tag.as_str(), |el| {
                el.remove();
                Ok(())
            })
        })
        .collect();

    if let Some(base) = base_url {
        handlers.push(lol_html::element!("img[src]", move |el| {
            if let Some(src) = el.get_attribute("src") {
                el.set_attribute("src", &resolve_url(base, &src))?;
            }
            Ok(())
        }));
        handlers.push(lol_html::element!("img[srcset]", move |el| {
            if let Some(srcset) = el.get_attribute("srcset") {
                el.set_attribute("srcset", &resolve_srcset(base, &srcset))?;
            }
            Ok(())
        }));
        handlers.push(lol_html::element!("a[href]", move |el| {
            if let Some(href) = el.get_attribute("href") {
                el.set_attribute("href", &resolve_url(base, &href))?;
            }
            Ok(())
        }));
    }

    let mut output = String::new();
    let mut rewriter = lol_html::HtmlRewriter::new(
        lol_html::Settings { element_content_handlers: handlers, ..Default::default() },
        |c: &[u8]| {
            output.push_str(&String::from_utf8_lossy(c));
        },
    );

    if rewriter.write(html.as_bytes()).is_err() {
        return html.to_string();
    }

    if rewriter.end().is_err() {
        return html.to_string();
    }

    output
}

/// Resolves a possibly relative URL against `base`; unparseable values are kept.
pub fn resolve_url(base: &Url, value: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return value.to_string();
    }

    match base.join(trimmed) {
        Ok(resolved) => resolved.to_string(),
        Err(_) => value.to_string(),
    }
}

/// Resolves every candidate URL of a `srcset` list, keeping descriptors.
fn resolve_srcset(base: &Url, srcset: &str) -> String {
    // data: URLs carry commas of their own
    if srcset.contains("data:") {
        return srcset.to_string();
    }

    srcset
        .split(',')
        .map(str::trim)
        .filter(|candidate| !candidate.is_empty())
        .map(|candidate| match candidate.split_once(char::is_whitespace) {
            Some((url, descriptor)) => format!("{} {}", resolve_url(base, url), descriptor.trim()),
            None => resolve_url(base, candidate),
        })
        .collect::<Vec<_>>()
        .join(", ")
}
