//! Expansion of collapsed content before extraction.
//!
//! A [`SiteRule`] names the "show more" controls of a site, by selector or by
//! label text. [`expand_content`] clicks the ones inside the extraction root,
//! never clicking anything that could navigate away or submit a form, then
//! waits a bounded time for the root to grow.

use std::time::Duration;

use crate::Result;
use scraper::Node;
use scraper::node::Element;

use crate::dom::{Dom, NodeId};
use crate::page::LivePage;
use crate::poll::poll_until;
use crate::siterules::SiteRule;

/// Elements scanned for read-more labels.
pub const TEXT_CANDIDATES: &str = r#"button, a, [role="button" i]"#;

/// Timing of the wait that follows an expansion click
#[derive(Debug, Clone)]
pub struct ExpandConfig {
    /// Delay between two scroll height checks
    pub poll_interval: Duration,
    /// Longest wait for the root to grow
    pub timeout: Duration,
    /// Extra wait once growth was observed
    pub settle_delay: Duration,
}

impl Default for ExpandConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(100),
            timeout: Duration::from_millis(2000),
            settle_delay: Duration::from_millis(300),
        }
    }
}

/// What an expansion pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpandOutcome {
    /// Number of activated controls
    pub activations: usize,
    /// Whether the root grew before the timeout
    pub grew: bool,
}

fn is_link_with_destination(element: &Element) -> bool {
    matches!(element.name(), "a" | "area") && element.attr("href").is_some()
}

fn is_button_like(element: &Element) -> bool {
    element.name() == "button" || element.attr("role").is_some_and(|role| role.trim().eq_ignore_ascii_case("button"))
}

fn is_form_submitter(dom: &Dom, node: NodeId, element: &Element) -> bool {
    let kind = element.attr("type").map(|kind| kind.trim().to_ascii_lowercase());

    match element.name() {
        "button" => {
            let submits = matches!(kind.as_deref(), None | Some("") | Some("submit"));
            let owned_by_form = element.attr("form").is_some() || dom.closest(node, |el| el.name() == "form").is_some();
            submits && owned_by_form
        }
        "input" => matches!(kind.as_deref(), Some("submit") | Some("image")),
        _ => false,
    }
}

/// True when activating `node` could navigate or submit a form.
///
/// Links with a destination, anything nested in one, and form-submitting
/// controls are risky. Unknown handles are treated as risky.
pub fn is_navigation_risk(dom: &Dom, node: NodeId) -> bool {
    let Some(element) = dom.element(node) else {
        return true;
    };

    dom.closest(node, is_link_with_destination).is_some() || is_form_submitter(dom, node, element)
}

/// Rendered text of `node`: subtrees with `display: none` contribute nothing.
pub fn visible_text<P>(page: &P, node: NodeId) -> String
where
    P: LivePage + ?Sized,
{
    match page.dom().value(node) {
        Some(Node::Text(text)) => (**text).to_owned(),
        Some(Node::Element(_)) if page.computed_style(node).is_display_none() => String::new(),
        Some(Node::Element(_)) => page.dom().children(node).into_iter().map(|child| visible_text(page, child)).collect(),
        _ => String::new(),
    }
}

/// Button-like, risk-free candidates under `root` whose visible text contains one of `fragments`.
pub fn text_match_candidates<P>(page: &P, root: NodeId, fragments: &[String]) -> Result<Vec<NodeId>>
where
    P: LivePage + ?Sized,
{
    let fragments: Vec<&str> = fragments.iter().map(String::as_str).filter(|f| !f.is_empty()).collect();
    if fragments.is_empty() {
        return Ok(Vec::new());
    }

    let dom = page.dom();
    Ok(dom
        .query_selector_all(root, TEXT_CANDIDATES)?
        .into_iter()
        .filter(|&node| dom.element(node).is_some_and(is_button_like))
        .filter(|&node| !is_navigation_risk(dom, node))
        .filter(|&node| {
            let text = visible_text(page, node);
            fragments.iter().any(|fragment| text.contains(fragment))
        })
        .collect())
}

/// Clicks the expand controls of `rule` inside `root` and waits for growth.
///
/// Every safe match of every `expand_selectors` entry is clicked. When none
/// was, the first safe button whose text contains an `expand_text` fragment
/// is clicked. Growth is measured against the scroll height taken before the
/// first click. Invalid selectors are logged and skipped.
///
/// # Errors
///
/// Fails when the page rejects an activation.
pub async fn expand_content<P>(
    page: &mut P, root: NodeId, rule: Option<&SiteRule>, config: &ExpandConfig,
) -> Result<ExpandOutcome>
where
    P: LivePage + ?Sized,
{
    let Some(rule) = rule.filter(|rule| rule.has_expansion()) else {
        return Ok(ExpandOutcome::default());
    };

    let baseline = page.scroll_height(root);
    let mut outcome = ExpandOutcome::default();

    for selector in &rule.expand_selectors {
        let matches = match page.dom().query_selector_all(root, selector) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(selector = %selector, error = %e, "skipping expand selector");
                continue;
            }
        };

        for node in matches {
            if !page.dom().is_attached(node) {
                continue;
            }
            if is_navigation_risk(page.dom(), node) {
                tracing::debug!(selector = %selector, node = %node, "expand control could navigate, not clicking");
                continue;
            }

            page.activate(node)?;
            outcome.activations += 1;
            tracing::debug!(selector = %selector, node = %node, "clicked expand control");
        }
    }

    if outcome.activations == 0 && !rule.expand_text.is_empty() {
        let candidates = text_match_candidates(&*page, root, &rule.expand_text)?;
        if let Some(&node) = candidates.first() {
            page.activate(node)?;
            outcome.activations += 1;
            tracing::debug!(node = %node, "clicked expand control by text");
        }
    }

    if outcome.activations == 0 {
        return Ok(outcome);
    }

    let page: &P = page;
    outcome.grew = poll_until(|| page.scroll_height(root) > baseline, config.poll_interval, config.timeout).await;
    if outcome.grew {
        tokio::time::sleep(config.settle_delay).await;
    } else {
        tracing::debug!(root = %root, "no growth after expansion");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::StaticPage;
    use crate::SplitViewError;
    use tokio::time::Instant;

    const POST: &str = r#"<html><body>
        <article id="post">
            <p>Teaser</p>
            <button class="show-more" id="more">Read more</button>
            <a href="/full" class="show-more" id="link">Read more</a>
            <span role="button" id="span-button">Show more replies</span>
        </article>
    </body></html>"#;

    fn node(page: &StaticPage, selector: &str) -> NodeId {
        page.dom().query_selector(page.dom().root(), selector).unwrap().unwrap()
    }

    fn rule(json: &str) -> SiteRule {
        SiteRule::from_json(json).unwrap()
    }

    fn grow_on_click(page: &mut StaticPage, target: NodeId, root: NodeId) {
        page.on_activate(target, move |dom, _| dom.append_html(root, "<p>The rest of the post</p>").map(|_| ()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_rule_is_noop() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");

        let outcome = expand_content(&mut page, root, None, &ExpandConfig::default()).await.unwrap();

        assert_eq!(outcome, ExpandOutcome::default());
        assert!(page.activations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_selector_skips_links() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");
        let more = node(&page, "#more");
        grow_on_click(&mut page, more, root);

        let start = Instant::now();
        let outcome =
            expand_content(&mut page, root, Some(&rule(r#"{"expandSelectors": [".show-more"]}"#)), &ExpandConfig::default())
                .await
                .unwrap();

        assert_eq!(outcome, ExpandOutcome { activations: 1, grew: true });
        assert_eq!(page.activations(), &[more]);
        assert_eq!(start.elapsed(), Duration::from_millis(100 + 300));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_match_never_clicks_links() {
        let html = r#"<div id="post"><a href="/full">Read more</a><p>Teaser</p></div>"#;
        let mut page = StaticPage::from_html(html, None);
        let root = node(&page, "#post");

        let outcome =
            expand_content(&mut page, root, Some(&rule(r#"{"expandText": ["Read more"]}"#)), &ExpandConfig::default())
                .await
                .unwrap();

        assert_eq!(outcome.activations, 0);
        assert!(page.activations().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_match_clicks_first_button_only() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");
        let more = node(&page, "#more");

        let outcome = expand_content(
            &mut page,
            root,
            Some(&rule(r#"{"expandText": ["Read more", "Show more"]}"#)),
            &ExpandConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.activations, 1);
        assert_eq!(page.activations(), &[more]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_path_skipped_after_selector_click() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");
        let span = node(&page, "#span-button");

        expand_content(
            &mut page,
            root,
            Some(&rule(r##"{"expandSelectors": ["#span-button"], "expandText": ["Read more"]}"##)),
            &ExpandConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(page.activations(), &[span]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_without_growth() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");

        let start = Instant::now();
        let outcome =
            expand_content(&mut page, root, Some(&rule(r##"{"expandSelectors": ["#more"]}"##)), &ExpandConfig::default())
                .await
                .unwrap();

        assert_eq!(outcome, ExpandOutcome { activations: 1, grew: false });
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_selector_is_skipped() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");
        let more = node(&page, "#more");

        let outcome = expand_content(
            &mut page,
            root,
            Some(&rule(r##"{"expandSelectors": ["[[broken", "#more"]}"##)),
            &ExpandConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.activations, 1);
        assert_eq!(page.activations(), &[more]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_activation_failure_propagates() {
        let mut page = StaticPage::from_html(POST, None);
        let root = node(&page, "#post");
        let more = node(&page, "#more");
        page.on_activate(more, |_, node| {
            Err(SplitViewError::ActivationFailed { node, reason: "script error".to_string() })
        });

        let result =
            expand_content(&mut page, root, Some(&rule(r##"{"expandSelectors": ["#more"]}"##)), &ExpandConfig::default())
                .await;

        assert!(matches!(result, Err(SplitViewError::ActivationFailed { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_text_match_ignores_hidden_text() {
        let html = r#"<div id="post">
            <button id="hidden-label">Like<span style="display:none">Read more</span></button>
            <span role="BUTTON" id="visible">Read more</span>
        </div>"#;
        let mut page = StaticPage::from_html(html, None);
        let root = node(&page, "#post");
        let visible = node(&page, "#visible");

        let outcome =
            expand_content(&mut page, root, Some(&rule(r#"{"expandText": ["Read more"]}"#)), &ExpandConfig::default())
                .await
                .unwrap();

        assert_eq!(outcome.activations, 1);
        assert_eq!(page.activations(), &[visible]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_selector_sees_ancestors_of_root() {
        let html = r#"<div class="feed"><article id="post"><p>Teaser</p><button class="more">More</button></article></div>"#;
        let mut page = StaticPage::from_html(html, None);
        let root = node(&page, "#post");
        let more = node(&page, ".more");

        let outcome =
            expand_content(&mut page, root, Some(&rule(r#"{"expandSelectors": [".feed .more"]}"#)), &ExpandConfig::default())
                .await
                .unwrap();

        assert_eq!(outcome.activations, 1);
        assert_eq!(page.activations(), &[more]);
    }

    #[test]
    fn test_visible_text() {
        let page = StaticPage::from_html(
            r#"<p id="p">Shown <b style="display: none">hidden</b><i>too</i></p>"#,
            None,
        );
        assert_eq!(visible_text(&page, node(&page, "#p")), "Shown too");
    }

    #[test]
    fn test_navigation_risk() {
        let html = r#"<div>
            <a href="/x" id="link"><span id="inside">Read</span></a>
            <a id="anchor">No destination</a>
            <form><button id="submit">Go</button><button type="button" id="plain">More</button></form>
            <button id="outside">More</button>
            <button form="f" id="owned">Send</button>
            <input type="submit" id="input-submit">
        </div>"#;
        let dom = Dom::parse_fragment(html);
        let id = |id: &str| dom.query_selector(dom.root(), &format!("#{}", id)).unwrap().unwrap();

        assert!(is_navigation_risk(&dom, id("link")));
        assert!(is_navigation_risk(&dom, id("inside")));
        assert!(!is_navigation_risk(&dom, id("anchor")));
        assert!(is_navigation_risk(&dom, id("submit")));
        assert!(!is_navigation_risk(&dom, id("plain")));
        assert!(!is_navigation_risk(&dom, id("outside")));
        assert!(is_navigation_risk(&dom, id("owned")));
        assert!(is_navigation_risk(&dom, id("input-submit")));
    }
}
