//! Detection of extraction results without user-visible substance.

use std::sync::LazyLock;

use scraper::{Html, Selector};

/// Elements that carry content even without text.
pub const CONTENT_BEARING_SELECTOR: &str = "img, video, audio, svg, canvas, iframe, embed, object, table, ul, ol, pre, code";

static CONTENT_BEARING: LazyLock<Option<Selector>> = LazyLock::new(|| Selector::parse(CONTENT_BEARING_SELECTOR).ok());

/// True when `html` has non-whitespace text or a content-bearing element.
///
/// Line breaks and horizontal rules count as nothing.
pub fn is_meaningful(html: &str) -> bool {
    let fragment = Html::parse_fragment(html);

    let has_text = fragment.root_element().text().any(|text| !text.trim().is_empty());
    if has_text {
        return true;
    }

    CONTENT_BEARING
        .as_ref()
        .is_some_and(|selector| fragment.select(selector).next().is_some())
}
