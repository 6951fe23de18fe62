//! Inline style snapshots of extracted elements.
//!
//! The clone of an extracted subtree loses the page's stylesheets. The
//! snapshot copies a whitelisted subset of each live element's resolved
//! style onto the matching clone element as an inline `style` attribute,
//! leaving out values that would change nothing.
//!
//! ```rust
//! use splitview_core::{LivePage, StaticPage, snapshot_styles};
//!
//! let page = StaticPage::from_html(r#"<div id="card" style="opacity: 0.5"><p>Hi</p></div>"#, None);
//! let card = page.dom().query_selector(page.dom().root(), "#card").unwrap().unwrap();
//! let (mut clone, copy) = page.dom().clone_subtree(card).unwrap();
//!
//! snapshot_styles(&page, card, &mut clone, copy).unwrap();
//! assert!(clone.attr(copy, "style").unwrap().contains("opacity:0.5;"));
//! ```

use crate::dom::{Dom, NodeId};
use crate::page::LivePage;
use crate::style::ComputedStyle;
use crate::{Result, SplitViewError};

/// Values that never carry information, whatever the property.
pub const NOOP_VALUES: [&str; 4] = ["auto", "initial", "inherit", "unset"];

/// Snapshotted properties, in output order, with the values they take by default.
pub const SNAPSHOT_PROPERTIES: [(&str, &[&str]); 46] = [
    ("display", &["inline"]),
    ("position", &["static"]),
    ("top", &[]),
    ("right", &[]),
    ("bottom", &[]),
    ("left", &[]),
    ("z-index", &[]),
    ("float", &["none"]),
    ("width", &[]),
    ("height", &[]),
    ("max-width", &["none"]),
    ("max-height", &["none"]),
    ("margin", &["0", "0px"]),
    ("padding", &["0", "0px"]),
    ("border", &["none", "0", "0px", "0px none"]),
    ("border-radius", &["0", "0px"]),
    ("box-shadow", &["none"]),
    ("box-sizing", &["content-box"]),
    ("overflow", &["visible"]),
    ("color", &[]),
    ("background-color", &["transparent", "rgba(0, 0, 0, 0)"]),
    ("background-image", &["none"]),
    ("opacity", &["1"]),
    ("font-family", &[]),
    ("font-size", &[]),
    ("font-weight", &["400", "normal"]),
    ("font-style", &["normal"]),
    ("line-height", &["normal"]),
    ("letter-spacing", &["normal", "0px"]),
    ("text-align", &["start", "left"]),
    ("text-decoration", &["none"]),
    ("text-transform", &["none"]),
    ("white-space", &["normal"]),
    ("word-break", &["normal"]),
    ("list-style-type", &["disc"]),
    ("vertical-align", &["baseline"]),
    ("visibility", &["visible"]),
    ("flex-direction", &["row"]),
    ("flex-wrap", &["nowrap"]),
    ("justify-content", &["normal", "flex-start"]),
    ("align-items", &["normal", "stretch"]),
    ("gap", &["normal", "0px"]),
    ("grid-template-columns", &["none"]),
    ("filter", &["none"]),
    ("transform", &["none"]),
    ("-webkit-line-clamp", &["none"]),
];

fn is_suppressed(value: &str, defaults: &[&str]) -> bool {
    let value = value.trim();
    value.is_empty()
        || NOOP_VALUES.iter().any(|token| value.eq_ignore_ascii_case(token))
        || defaults.iter().any(|default| value.eq_ignore_ascii_case(default))
}

/// Serializes the snapshot of one resolved style as `property:value;` pairs.
///
/// `position: fixed` is written as `position:relative`.
pub fn style_snapshot(style: &ComputedStyle) -> String {
    let mut snapshot = String::new();

    for (property, defaults) in SNAPSHOT_PROPERTIES {
        let Some(value) = style.get(property) else {
            continue;
        };
        if is_suppressed(value, defaults) {
            continue;
        }

        let value = value.trim();
        let value = if property == "position" && value.eq_ignore_ascii_case("fixed") { "relative" } else { value };

        snapshot.push_str(property);
        snapshot.push(':');
        snapshot.push_str(value);
        snapshot.push(';');
    }

    snapshot
}

/// Copies style snapshots from the live subtree at `live` onto its clone.
///
/// Elements are paired by preorder position, root included. Clone elements
/// whose snapshot is empty keep their attributes untouched. Returns the
/// number of elements that received a style.
///
/// # Errors
///
/// Returns [`SplitViewError::StructureMismatch`] when the two subtrees do not
/// hold the same number of elements.
pub fn snapshot_styles<P>(page: &P, live: NodeId, clone: &mut Dom, clone_root: NodeId) -> Result<usize>
where
    P: LivePage + ?Sized,
{
    let live_elements = page.dom().elements_preorder(live);
    let clone_elements = clone.elements_preorder(clone_root);

    if live_elements.len() != clone_elements.len() {
        return Err(SplitViewError::StructureMismatch { live: live_elements.len(), clone: clone_elements.len() });
    }

    let mut styled = 0;
    for (original, copy) in live_elements.into_iter().zip(clone_elements) {
        let snapshot = style_snapshot(&page.computed_style(original));
        if snapshot.is_empty() {
            continue;
        }
        clone.set_attr(copy, "style", &snapshot)?;
        styled += 1;
    }

    Ok(styled)
}
