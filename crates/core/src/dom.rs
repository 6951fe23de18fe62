//! Mutable HTML tree used for live pages and detached clones.
//!
//! [`Dom`] wraps a `scraper` document and hands out [`NodeId`] handles into
//! its node tree. A handle is a plain identity: it never keeps a node alive
//! and every accessor re-resolves it. Unknown handles resolve to nothing;
//! detached nodes still resolve but report `is_attached() == false`.
//!
//! Selectors are matched against the whole tree, so combinators may reach
//! above the queried root, and only descendants of the root are returned.
//! Serialization goes through the html5ever serializer.
//!
//! # Example
//!
//! ```rust
//! use splitview_core::Dom;
//!
//! let dom = Dom::parse_fragment(r#"<ul><li class="item">One</li><li class="item">Two</li></ul>"#);
//! let items = dom.query_selector_all(dom.root(), "li.item").unwrap();
//! assert_eq!(items.len(), 2);
//! assert_eq!(dom.text_content(items[1]), "Two");
//! ```

use std::fmt;
use std::io;

use ego_tree::iter::Edge;
use html5ever::serialize::{Serialize, SerializeOpts, Serializer, TraversalScope, serialize};
use html5ever::{Attribute, LocalName, QualName, ns};
use scraper::node::{Element, Text};
use scraper::{ElementRef, Html, Node, Selector, StrTendril};

use crate::{Result, SplitViewError};

/// Identity handle of a node inside a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(ego_tree::NodeId);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// First class of the `class` attribute, in source order.
pub fn first_class(element: &Element) -> Option<&str> {
    element.attr("class").and_then(|class| class.split_whitespace().next())
}

/// Serializes one node of the tree; the tree root itself writes nothing.
struct Subtree<'a>(ego_tree::NodeRef<'a, Node>);

impl Serialize for Subtree<'_> {
    fn serialize<S: Serializer>(&self, serializer: &mut S, traversal_scope: TraversalScope) -> io::Result<()> {
        let skip_self = traversal_scope == TraversalScope::ChildrenOnly(None);
        for edge in self.0.traverse() {
            match edge {
                Edge::Open(node) if skip_self && node == self.0 => {}
                Edge::Open(node) => match node.value() {
                    Node::Doctype(doctype) => serializer.write_doctype(doctype.name())?,
                    Node::Comment(comment) => serializer.write_comment(comment)?,
                    Node::Text(text) => serializer.write_text(text)?,
                    Node::Element(element) => {
                        let attrs = element.attrs.iter().map(|(name, value)| (name, &value[..]));
                        serializer.start_elem(element.name.clone(), attrs)?;
                    }
                    _ => {}
                },
                Edge::Close(node) if skip_self && node == self.0 => {}
                Edge::Close(node) => {
                    if let Some(element) = node.value().as_element() {
                        serializer.end_elem(element.name.clone())?;
                    }
                }
            }
        }
        Ok(())
    }
}

fn attribute_name(name: &str) -> QualName {
    QualName::new(None, ns!(), LocalName::from(name))
}

/// Mutable HTML tree.
#[derive(Debug, Clone)]
pub struct Dom {
    html: Html,
}

impl Dom {
    /// Creates an empty tree holding only the root node.
    pub fn new() -> Self {
        Self { html: Html::new_fragment() }
    }

    /// Parses a complete HTML document.
    pub fn parse(html: &str) -> Self {
        Self { html: Html::parse_document(html) }
    }

    /// Parses an HTML fragment; its top-level nodes become children of the root.
    pub fn parse_fragment(html: &str) -> Self {
        let mut parsed = Html::parse_fragment(html);
        let wrapper = parsed.root_element().id();
        let top_level: Vec<ego_tree::NodeId> =
            parsed.tree.get(wrapper).map(|node| node.children().map(|child| child.id()).collect()).unwrap_or_default();

        let mut root = parsed.tree.root_mut();
        for child in top_level {
            root.append_id(child);
        }
        if let Some(mut wrapper) = parsed.tree.get_mut(wrapper) {
            wrapper.detach();
        }
        Self { html: parsed }
    }

    /// The tree root.
    pub fn root(&self) -> NodeId {
        NodeId(self.html.tree.root().id())
    }

    /// Number of nodes in the tree, detached nodes included.
    pub fn len(&self) -> usize {
        self.html.tree.nodes().count()
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        !self.html.tree.root().has_children()
    }

    fn get(&self, node: NodeId) -> Option<ego_tree::NodeRef<'_, Node>> {
        self.html.tree.get(node.0)
    }

    fn require(&self, node: NodeId) -> Result<ego_tree::NodeRef<'_, Node>> {
        self.get(node).ok_or(SplitViewError::NodeNotFound(node))
    }

    fn orphan(&mut self, value: Node) -> NodeId {
        NodeId(self.html.tree.orphan(value).id())
    }

    /// Creates a detached element.
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        let name = QualName::new(None, ns!(html), LocalName::from(tag.to_ascii_lowercase()));
        self.orphan(Node::Element(Element::new(name, Vec::new())))
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.orphan(Node::Text(Text { text: StrTendril::from_slice(text) }))
    }

    /// Moves `child` to the end of `parent`'s children.
    ///
    /// # Errors
    ///
    /// Fails when either handle does not resolve, or when `child` is `parent`
    /// itself or one of its ancestors.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.require(parent)?;
        self.require(child)?;
        if self.contains(child, parent) {
            return Err(SplitViewError::HtmlParseError(format!(
                "cannot append {} inside its own subtree",
                child
            )));
        }
        if let Some(mut parent) = self.html.tree.get_mut(parent.0) {
            parent.append_id(child.0);
        }
        Ok(())
    }

    /// Parses `html` as a fragment and appends its top-level nodes to `parent`.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> Result<Vec<NodeId>> {
        self.require(parent)?;
        let fragment = Dom::parse_fragment(html);
        let mut appended = Vec::new();
        for child in fragment.children(fragment.root()) {
            if let Some(copied) = self.copy_from(&fragment, child) {
                self.append_child(parent, copied)?;
                appended.push(copied);
            }
        }
        Ok(appended)
    }

    /// Unlinks a node from its parent. The subtree stays in the tree.
    pub fn detach(&mut self, node: NodeId) {
        if let Some(mut node) = self.html.tree.get_mut(node.0) {
            node.detach();
        }
    }

    fn copy_from(&mut self, source: &Dom, node: NodeId) -> Option<NodeId> {
        let id = self.orphan(source.get(node)?.value().clone());
        for child in source.children(node) {
            let Some(copied) = self.copy_from(source, child) else {
                continue;
            };
            if let Some(mut parent) = self.html.tree.get_mut(id.0) {
                parent.append_id(copied.0);
            }
        }
        Some(id)
    }

    /// Deep-copies the subtree at `node` into a fresh tree.
    ///
    /// The copy is the only child of the new tree's root; its handle is
    /// returned alongside the tree.
    pub fn clone_subtree(&self, node: NodeId) -> Result<(Dom, NodeId)> {
        self.require(node)?;
        let mut clone = Dom::new();
        let copied = clone.copy_from(self, node).ok_or(SplitViewError::NodeNotFound(node))?;
        let root = clone.root();
        clone.append_child(root, copied)?;
        Ok((clone, copied))
    }

    /// Payload of a node.
    pub fn value(&self, node: NodeId) -> Option<&Node> {
        self.get(node).map(|node| node.value())
    }

    pub fn element(&self, node: NodeId) -> Option<&Element> {
        self.value(node)?.as_element()
    }

    pub fn is_element(&self, node: NodeId) -> bool {
        self.element(node).is_some()
    }

    pub fn tag_name(&self, node: NodeId) -> Option<&str> {
        self.element(node).map(Element::name)
    }

    pub fn attr(&self, node: NodeId, name: &str) -> Option<&str> {
        self.element(node)?.attr(name)
    }

    pub fn has_attr(&self, node: NodeId, name: &str) -> bool {
        self.attr(node, name).is_some()
    }

    /// Rewrites the attributes of an element.
    ///
    /// The element is rebuilt so its cached id and class list follow the new
    /// attributes.
    fn update_attrs<F>(&mut self, node: NodeId, update: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<Attribute>),
    {
        let mut node_mut = self.html.tree.get_mut(node.0).ok_or(SplitViewError::NodeNotFound(node))?;
        let Node::Element(element) = node_mut.value() else {
            return Err(SplitViewError::NodeNotFound(node));
        };

        let mut attrs: Vec<Attribute> = element
            .attrs
            .iter()
            .map(|(name, value)| Attribute { name: name.clone(), value: value.clone() })
            .collect();
        update(&mut attrs);
        *element = Element::new(element.name.clone(), attrs);
        Ok(())
    }

    pub fn set_attr(&mut self, node: NodeId, name: &str, value: &str) -> Result<()> {
        self.update_attrs(node, |attrs| match attrs.iter_mut().find(|attr| &*attr.name.local == name) {
            Some(attr) => attr.value = StrTendril::from_slice(value),
            None => attrs.push(Attribute { name: attribute_name(name), value: StrTendril::from_slice(value) }),
        })
    }

    pub fn remove_attr(&mut self, node: NodeId, name: &str) -> Option<String> {
        let previous = self.attr(node, name)?.to_string();
        self.update_attrs(node, |attrs| attrs.retain(|attr| &*attr.name.local != name)).ok()?;
        Some(previous)
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node)?.parent().map(|parent| NodeId(parent.id()))
    }

    /// Parent when it is an element; `None` at the top of the tree.
    pub fn parent_element(&self, node: NodeId) -> Option<NodeId> {
        self.parent(node).filter(|&parent| self.is_element(parent))
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|node| node.children().map(|child| NodeId(child.id())).collect())
            .unwrap_or_default()
    }

    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.children(node).into_iter().filter(|&child| self.is_element(child)).collect()
    }

    /// Ancestors of `node`, nearest first, excluding `node`.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.parent(node), move |&current| self.parent(current))
    }

    /// Nearest element, starting at `node` itself, that satisfies `predicate`.
    pub fn closest<F>(&self, node: NodeId, predicate: F) -> Option<NodeId>
    where
        F: Fn(&Element) -> bool,
    {
        std::iter::once(node)
            .chain(self.ancestors(node))
            .find(|&current| self.element(current).is_some_and(&predicate))
    }

    /// True when `node` is `ancestor` or lies inside its subtree.
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.get(node).is_some() && (ancestor == node || self.ancestors(node).any(|current| current == ancestor))
    }

    /// True when `node` is reachable from the tree root.
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.contains(self.root(), node)
    }

    /// Every node below `node` in document order, excluding `node`.
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|node| node.descendants().skip(1).map(|current| NodeId(current.id())).collect())
            .unwrap_or_default()
    }

    /// `node` (when it is an element) followed by its element descendants in document order.
    pub fn elements_preorder(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|node| node.descendants().filter(|current| current.value().is_element()).map(|current| NodeId(current.id())).collect())
            .unwrap_or_default()
    }

    /// Concatenated text of every text node in the subtree.
    pub fn text_content(&self, node: NodeId) -> String {
        self.get(node)
            .map(|node| node.descendants().filter_map(|current| current.value().as_text()).map(|text| &text[..]).collect())
            .unwrap_or_default()
    }

    fn serialize_node(&self, node: NodeId, traversal_scope: TraversalScope) -> String {
        let Some(node) = self.get(node) else {
            return String::new();
        };

        let opts = SerializeOpts { scripting_enabled: false, traversal_scope, create_missing_parent: false };
        let mut buf = Vec::new();
        if serialize(&mut buf, &Subtree(node), opts).is_err() {
            return String::new();
        }
        String::from_utf8(buf).unwrap_or_default()
    }

    /// Serializes `node` including its own tag.
    pub fn outer_html(&self, node: NodeId) -> String {
        self.serialize_node(node, TraversalScope::IncludeNode)
    }

    /// Serializes the children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        self.serialize_node(node, TraversalScope::ChildrenOnly(None))
    }

    /// Element descendants of `root` matching a CSS selector, in document order.
    ///
    /// `root` itself is never part of the result. Matching sees the whole
    /// tree, so `.feed .more` finds a button under `root` even when `.feed`
    /// is an ancestor of `root`.
    ///
    /// # Errors
    ///
    /// Returns [`SplitViewError::InvalidSelector`] if the selector does not parse.
    pub fn query_selector_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>> {
        let parsed_selector = Selector::parse(selector)
            .map_err(|e| SplitViewError::InvalidSelector(format!("{}: {}", selector, e)))?;
        let scope = self.require(root)?;

        Ok(scope
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|element| parsed_selector.matches(element))
            .map(|element| NodeId(element.id()))
            .collect())
    }

    /// First element descendant of `root` matching a CSS selector.
    pub fn query_selector(&self, root: NodeId, selector: &str) -> Result<Option<NodeId>> {
        Ok(self.query_selector_all(root, selector)?.into_iter().next())
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
