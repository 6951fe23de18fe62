//! Element picking: hover highlight, click to extract, Escape to cancel.
//!
//! [`PickerSession`] is a two-state machine (`Idle`, `Picking`) that owns
//! all picking state. It talks to the page through [`LivePage`] and to the
//! host UI (listeners, overlay, notifications, confirm dialogs) through
//! [`PickerHost`]. Extraction is never started here: a click yields
//! [`PickerOutcome::Extract`] with the targets, after picking has stopped.
//!
//! ```rust
//! use splitview_core::{Hit, LivePage, PickerEvent, PickerHost, PickerOutcome, PickerSession, StaticPage};
//! use splitview_core::page::BoundingBox;
//! use splitview_core::picker::Highlight;
//!
//! #[derive(Default)]
//! struct Host;
//!
//! impl PickerHost for Host {
//!     fn install_listeners(&mut self) {}
//!     fn remove_listeners(&mut self) {}
//!     fn set_cursor(&mut self, _cursor: Option<&str>) {}
//!     fn overlay_contains(&self, _x: f64, _y: f64) -> bool { false }
//!     fn draw_highlight(&mut self, _highlight: &Highlight) {}
//!     fn hide_highlight(&mut self) {}
//!     fn notify(&mut self, _message: &str) {}
//!     fn confirm(&mut self, _message: &str) -> bool { true }
//! }
//!
//! let mut page = StaticPage::from_html(r#"<p id="lead">Hello</p>"#, None);
//! let lead = page.dom().query_selector(page.dom().root(), "#lead").unwrap().unwrap();
//! page.set_layout(lead, BoundingBox::new(0.0, 0.0, 200.0, 20.0));
//!
//! let mut host = Host;
//! let mut picker = PickerSession::new();
//! picker.start(&mut host);
//! picker.handle_event(&page, &mut host, &PickerEvent::PointerMove { x: 10.0, y: 10.0 });
//! let outcome = picker.handle_event(&page, &mut host, &PickerEvent::Click { target: Hit::Element(lead) });
//!
//! assert_eq!(outcome, PickerOutcome::Extract(vec![lead]));
//! assert!(!picker.is_picking());
//! ```

use crate::dom::{Dom, NodeId, first_class};
use crate::page::{BoundingBox, LivePage};
use crate::siblings::match_siblings;

/// Id of the extraction panel; nothing inside it is ever picked.
pub const PANEL_ID: &str = "splitview-panel";
/// Id of the highlight box drawn around the hovered element.
pub const HIGHLIGHT_BOX_ID: &str = "splitview-highlight-box";
/// Id of the label attached to the highlight box.
pub const HIGHLIGHT_LABEL_ID: &str = "splitview-highlight-label";

pub const START_MESSAGE: &str = "Inspect Mode: Click to extract. Click Label for siblings.";
pub const CANCEL_MESSAGE: &str = "Inspect Mode Cancelled";
pub const NO_SIBLINGS_MESSAGE: &str = "No similar siblings found.";
pub const SIBLINGS_DECLINED_MESSAGE: &str = "Sibling extraction cancelled.";

/// Picker state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PickerState {
    #[default]
    Idle,
    Picking,
}

/// Weak reference to the hovered element: its handle and the box it had when hovered.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoveredElement {
    pub node: NodeId,
    pub rect: BoundingBox,
}

/// What the host draws over the hovered element.
#[derive(Debug, Clone, PartialEq)]
pub struct Highlight {
    pub node: NodeId,
    /// Position in document coordinates
    pub rect: BoundingBox,
    /// `tag[#id][.firstClass]`
    pub label: String,
}

/// Target of a click as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Nothing,
    /// The highlight box itself
    Overlay,
    /// The highlight label; requests sibling extraction
    Label,
    Element(NodeId),
}

/// Input forwarded by the host while listeners are installed.
#[derive(Debug, Clone, PartialEq)]
pub enum PickerEvent {
    PointerMove { x: f64, y: f64 },
    Click { target: Hit },
    KeyDown { key: String },
}

/// Result of handling one event.
#[derive(Debug, Clone, PartialEq)]
pub enum PickerOutcome {
    /// Not picking; the event belongs to the page
    Ignored,
    /// Picking, nothing changed
    Unchanged,
    /// A new element is hovered
    Hovered(Highlight),
    /// Picking stopped; extract these targets in order
    Extract(Vec<NodeId>),
    /// Click swallowed without extraction
    Consumed,
    /// Escape pressed; picking stopped
    Cancelled,
    /// Sibling extraction abandoned; picking stopped
    Aborted(String),
}

impl PickerOutcome {
    /// Whether the host must stop the event's propagation and default action.
    pub fn prevents_default(&self) -> bool {
        matches!(self, PickerOutcome::Extract(_) | PickerOutcome::Consumed | PickerOutcome::Aborted(_))
    }
}

/// Host UI services used by the picker.
pub trait PickerHost {
    /// Installs capture-phase pointer-move, click and key listeners.
    fn install_listeners(&mut self);
    fn remove_listeners(&mut self);
    /// Sets the page cursor; `None` restores the page's own.
    fn set_cursor(&mut self, cursor: Option<&str>);
    /// True when the point lies on the highlight box or its label.
    fn overlay_contains(&self, x: f64, y: f64) -> bool;
    fn draw_highlight(&mut self, highlight: &Highlight);
    fn hide_highlight(&mut self);
    /// Shows a transient notification.
    fn notify(&mut self, message: &str);
    /// Asks the user a yes/no question.
    fn confirm(&mut self, message: &str) -> bool;
}

/// Label text for an element: `tag[#id][.firstClass]`.
pub fn element_label(dom: &Dom, node: NodeId) -> String {
    let Some(element) = dom.element(node) else {
        return String::new();
    };

    let mut label = element.name().to_string();
    if let Some(id) = element.attr("id").filter(|id| !id.is_empty()) {
        label.push('#');
        label.push_str(id);
    }
    if let Some(class) = first_class(element) {
        label.push('.');
        label.push_str(class);
    }
    label
}

/// True for the picker's own UI: the panel subtree and the highlight elements.
fn is_picker_ui(dom: &Dom, node: NodeId) -> bool {
    if matches!(dom.attr(node, "id"), Some(HIGHLIGHT_BOX_ID) | Some(HIGHLIGHT_LABEL_ID)) {
        return true;
    }
    dom.closest(node, |el| el.attr("id") == Some(PANEL_ID)).is_some()
}

/// One picking session.
#[derive(Debug, Default)]
pub struct PickerSession {
    state: PickerState,
    hovered: Option<HoveredElement>,
    last_hovered: Option<HoveredElement>,
}

impl PickerSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PickerState {
        self.state
    }

    pub fn is_picking(&self) -> bool {
        self.state == PickerState::Picking
    }

    pub fn hovered(&self) -> Option<&HoveredElement> {
        self.hovered.as_ref()
    }

    /// Enters `Picking`. Does nothing when already picking.
    pub fn start<H: PickerHost + ?Sized>(&mut self, host: &mut H) {
        if self.is_picking() {
            return;
        }

        self.state = PickerState::Picking;
        host.install_listeners();
        host.set_cursor(Some("default"));
        host.notify(START_MESSAGE);
        tracing::info!("picker started");
    }

    /// Returns to `Idle`, removing listeners and the highlight.
    pub fn stop<H: PickerHost + ?Sized>(&mut self, host: &mut H) {
        if !self.is_picking() {
            return;
        }

        self.state = PickerState::Idle;
        self.hovered = None;
        self.last_hovered = None;
        host.remove_listeners();
        host.hide_highlight();
        host.set_cursor(None);
        tracing::info!("picker stopped");
    }

    pub fn handle_event<P, H>(&mut self, page: &P, host: &mut H, event: &PickerEvent) -> PickerOutcome
    where
        P: LivePage + ?Sized,
        H: PickerHost + ?Sized,
    {
        if !self.is_picking() {
            return PickerOutcome::Ignored;
        }

        match event {
            PickerEvent::PointerMove { x, y } => self.handle_pointer_move(page, host, *x, *y),
            PickerEvent::Click { target: Hit::Label } => self.handle_label_click(page, host),
            PickerEvent::Click { .. } => self.handle_click(page, host),
            PickerEvent::KeyDown { key } if key == "Escape" => {
                self.stop(host);
                host.notify(CANCEL_MESSAGE);
                PickerOutcome::Cancelled
            }
            PickerEvent::KeyDown { .. } => PickerOutcome::Unchanged,
        }
    }

    fn handle_pointer_move<P, H>(&mut self, page: &P, host: &mut H, x: f64, y: f64) -> PickerOutcome
    where
        P: LivePage + ?Sized,
        H: PickerHost + ?Sized,
    {
        if host.overlay_contains(x, y) {
            return PickerOutcome::Unchanged;
        }

        let Some(node) = page.element_from_point(x, y) else {
            return PickerOutcome::Unchanged;
        };
        if !page.dom().is_element(node) || is_picker_ui(page.dom(), node) {
            return PickerOutcome::Unchanged;
        }
        if self.hovered.is_some_and(|hovered| hovered.node == node) {
            return PickerOutcome::Unchanged;
        }

        let rect = page.bounding_box(node).unwrap_or_default();
        let hovered = HoveredElement { node, rect };
        self.hovered = Some(hovered);
        self.last_hovered = Some(hovered);

        let highlight = Highlight { node, rect, label: element_label(page.dom(), node) };
        host.draw_highlight(&highlight);
        PickerOutcome::Hovered(highlight)
    }

    fn handle_click<P, H>(&mut self, page: &P, host: &mut H) -> PickerOutcome
    where
        P: LivePage + ?Sized,
        H: PickerHost + ?Sized,
    {
        let Some(node) = self.hovered.map(|hovered| hovered.node).filter(|&node| page.dom().is_attached(node)) else {
            return PickerOutcome::Consumed;
        };

        self.stop(host);
        PickerOutcome::Extract(vec![node])
    }

    fn handle_label_click<P, H>(&mut self, page: &P, host: &mut H) -> PickerOutcome
    where
        P: LivePage + ?Sized,
        H: PickerHost + ?Sized,
    {
        let Some(node) = self
            .last_hovered
            .or(self.hovered)
            .map(|hovered| hovered.node)
            .filter(|&node| page.dom().is_attached(node))
        else {
            return PickerOutcome::Consumed;
        };

        self.stop(host);

        let siblings = match_siblings(page, node);
        if siblings.len() <= 1 {
            host.notify(NO_SIBLINGS_MESSAGE);
            return PickerOutcome::Aborted(NO_SIBLINGS_MESSAGE.to_string());
        }

        if !host.confirm(&format!("Extract {} similar items?", siblings.len())) {
            host.notify(SIBLINGS_DECLINED_MESSAGE);
            return PickerOutcome::Aborted(SIBLINGS_DECLINED_MESSAGE.to_string());
        }

        tracing::info!(node = %node, siblings = siblings.len(), "sibling extraction confirmed");
        PickerOutcome::Extract(siblings)
    }
}
