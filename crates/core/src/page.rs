//! The live page seen by the picker, the expander and the pipeline.
//!
//! [`LivePage`] is the boundary between the extraction core and whatever
//! renders the page (a browser tab, a test fixture). [`StaticPage`] is the
//! in-memory implementation used by the command line tool and the tests.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::dom::{Dom, NodeId};
use crate::style::{ComputedStyle, computed_style_of};
use crate::{Result, SplitViewError};

/// Estimated height of one node when no layout was registered.
const ESTIMATED_NODE_HEIGHT: f64 = 20.0;

/// Bounding box coordinates for an element, in document coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x && x <= self.x + self.width && y >= self.y && y <= self.y + self.height
    }
}

/// A rendered page whose DOM can be read, hit-tested and clicked.
///
/// All methods take node handles and must tolerate handles that no longer
/// resolve; the page may change between two calls.
pub trait LivePage {
    /// Current DOM of the page.
    fn dom(&self) -> &Dom;

    /// Resolved style of an element.
    fn computed_style(&self, node: NodeId) -> ComputedStyle {
        computed_style_of(self.dom(), node)
    }

    /// Border box of an element in document coordinates.
    fn bounding_box(&self, node: NodeId) -> Option<BoundingBox>;

    /// Topmost element under a document point.
    fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId>;

    /// Scrollable content height of an element.
    fn scroll_height(&self, node: NodeId) -> f64;

    /// Activates (clicks) an element. Page scripts may mutate the DOM in response.
    fn activate(&mut self, node: NodeId) -> Result<()>;

    /// URL relative references in the page resolve against.
    fn base_url(&self) -> Option<&Url>;

    fn hostname(&self) -> Option<&str> {
        self.base_url().and_then(Url::host_str)
    }
}

/// Reaction of a [`StaticPage`] to an activation.
pub type ActivationHandler = Box<dyn FnMut(&mut Dom, NodeId) -> Result<()>>;

/// In-memory page built from an HTML string.
///
/// Layout is opt-in: boxes and scroll heights can be registered per node.
/// Unregistered scroll heights are estimated from the subtree size, so
/// appending content grows the page the way a rendered page would.
pub struct StaticPage {
    dom: Dom,
    base_url: Option<Url>,
    layout: HashMap<NodeId, BoundingBox>,
    scroll_heights: HashMap<NodeId, f64>,
    handlers: HashMap<NodeId, ActivationHandler>,
    activations: Vec<NodeId>,
}

impl StaticPage {
    pub fn new(dom: Dom, base_url: Option<Url>) -> Self {
        Self {
            dom,
            base_url,
            layout: HashMap::new(),
            scroll_heights: HashMap::new(),
            handlers: HashMap::new(),
            activations: Vec::new(),
        }
    }

    /// Parses a full HTML document into a page.
    pub fn from_html(html: &str, base_url: Option<Url>) -> Self {
        Self::new(Dom::parse(html), base_url)
    }

    pub fn dom_mut(&mut self) -> &mut Dom {
        &mut self.dom
    }

    pub fn set_layout(&mut self, node: NodeId, bounds: BoundingBox) {
        self.layout.insert(node, bounds);
    }

    pub fn set_scroll_height(&mut self, node: NodeId, height: f64) {
        self.scroll_heights.insert(node, height);
    }

    /// Registers what happens when `node` is activated.
    pub fn on_activate<F>(&mut self, node: NodeId, handler: F)
    where
        F: FnMut(&mut Dom, NodeId) -> Result<()> + 'static,
    {
        self.handlers.insert(node, Box::new(handler));
    }

    /// Every activated node, in activation order.
    pub fn activations(&self) -> &[NodeId] {
        &self.activations
    }
}

impl fmt::Debug for StaticPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticPage")
            .field("nodes", &self.dom.len())
            .field("base_url", &self.base_url.as_ref().map(Url::as_str))
            .field("handlers", &self.handlers.len())
            .field("activations", &self.activations)
            .finish()
    }
}

impl LivePage for StaticPage {
    fn dom(&self) -> &Dom {
        &self.dom
    }

    fn bounding_box(&self, node: NodeId) -> Option<BoundingBox> {
        self.layout.get(&node).copied()
    }

    fn element_from_point(&self, x: f64, y: f64) -> Option<NodeId> {
        self.dom
            .descendants(self.dom.root())
            .into_iter()
            .filter(|node| self.layout.get(node).is_some_and(|bounds| bounds.contains(x, y)))
            .last()
    }

    fn scroll_height(&self, node: NodeId) -> f64 {
        match self.scroll_heights.get(&node) {
            Some(height) => *height,
            None => (self.dom.descendants(node).len() + 1) as f64 * ESTIMATED_NODE_HEIGHT,
        }
    }

    fn activate(&mut self, node: NodeId) -> Result<()> {
        if !self.dom.is_attached(node) {
            return Err(SplitViewError::NodeNotFound(node));
        }

        self.activations.push(node);
        if let Some(handler) = self.handlers.get_mut(&node) {
            handler(&mut self.dom, node)?;
        }
        Ok(())
    }

    fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }
}
