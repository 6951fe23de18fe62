//! Matching of structurally similar siblings for "extract all similar items".

use crate::dom::NodeId;
use crate::page::LivePage;

/// Attribute that identifies repeated components (`data-testid="tweet"`).
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

/// Tags never matched as siblings.
pub const NON_CONTENT_SIBLINGS: [&str; 3] = ["script", "style", "noscript"];

/// The children of `target`'s parent that look like `target`, in document order.
///
/// With a non-empty `data-testid`, siblings must share tag and test id.
/// Otherwise they must share tag and the exact `class` attribute string, so
/// the same classes in a different order do not match. Non-content tags and
/// elements with computed `display: none` are skipped. A target without a
/// parent element matches only itself.
pub fn match_siblings<P>(page: &P, target: NodeId) -> Vec<NodeId>
where
    P: LivePage + ?Sized,
{
    let dom = page.dom();
    let Some(element) = dom.element(target) else {
        return Vec::new();
    };
    let Some(parent) = dom.parent_element(target) else {
        return vec![target];
    };

    let test_id = element.attr(TEST_ID_ATTRIBUTE).filter(|id| !id.is_empty());
    let class = element.attr("class").unwrap_or("");

    dom.element_children(parent)
        .into_iter()
        .filter(|&child| {
            let Some(candidate) = dom.element(child) else {
                return false;
            };
            if candidate.name() != element.name() || NON_CONTENT_SIBLINGS.contains(&candidate.name()) {
                return false;
            }

            match test_id {
                Some(test_id) => candidate.attr(TEST_ID_ATTRIBUTE) == Some(test_id),
                None => candidate.attr("class").unwrap_or("") == class,
            }
        })
        .filter(|&child| child == target || !page.computed_style(child).is_display_none())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;

    fn page(body: &str) -> StaticPage {
        StaticPage::from_html(&format!("<html><body>{}</body></html>", body), None)
    }

    fn all(page: &StaticPage, selector: &str) -> Vec<NodeId> {
        page.dom().query_selector_all(page.dom().root(), selector).unwrap()
    }

    #[test]
    fn test_identical_siblings_match_in_order() {
        let page = page(r#"<ul><li class="item">1</li><li class="item">2</li><li class="item">3</li><li class="item">4</li></ul>"#);
        let items = all(&page, "li");

        assert_eq!(match_siblings(&page, items[2]), items);
    }

    #[test]
    fn test_hidden_and_non_content_siblings_are_excluded() {
        let page = page(
            r#"<div id="feed"><div class="card">a</div><script class="card"></script><div class="card" style="display: none">b</div><div class="card">c</div></div>"#,
        );
        let cards = all(&page, "#feed > div");
        let matched = match_siblings(&page, cards[0]);

        assert_eq!(matched, vec![cards[0], cards[2]]);
    }

    #[test]
    fn test_class_string_must_match_exactly() {
        let page = page(r#"<div><p class="a b">1</p><p class="b a">2</p><p class="a b">3</p><p>4</p></div>"#);
        let paragraphs = all(&page, "p");

        assert_eq!(match_siblings(&page, paragraphs[0]), vec![paragraphs[0], paragraphs[2]]);
        assert_eq!(match_siblings(&page, paragraphs[3]), vec![paragraphs[3]]);
    }

    #[test]
    fn test_test_id_takes_priority_over_class() {
        let page = page(
            r#"<section><article data-testid="tweet" class="x">1</article><article data-testid="tweet" class="y">2</article><article data-testid="ad" class="x">3</article></section>"#,
        );
        let articles = all(&page, "article");

        assert_eq!(match_siblings(&page, articles[0]), vec![articles[0], articles[1]]);
    }

    #[test]
    fn test_different_tags_do_not_match() {
        let page = page(r#"<div><p class="c">1</p><span class="c">2</span></div>"#);
        let p = all(&page, "p")[0];

        assert_eq!(match_siblings(&page, p), vec![p]);
    }

    #[test]
    fn test_top_level_target_matches_itself() {
        let page = page("<p>x</p>");
        let html = all(&page, "html")[0];

        assert_eq!(match_siblings(&page, html), vec![html]);
    }
}
