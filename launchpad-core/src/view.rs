//! Addressable view tree the launcher renders into.
//!
//! Nodes live in an arena and are addressed by [`NodeId`]. Sibling order is
//! meaningful: the saved-server list reads a row's position straight from its
//! parent's child list. Listeners are plain action values looked up by the
//! host when it routes an input event to a node.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub const fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Click,
    Input,
    Change,
    DragStart,
    DragEnd,
}

/// Vertical placement of a node, in layout pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Bounds {
    pub top: f32,
    pub height: f32,
}

impl Bounds {
    pub fn midpoint(&self) -> f32 {
        self.top + self.height / 2.0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ViewError {
    #[error("view node {0:?} does not exist")]
    MissingNode(NodeId),
    #[error("cannot move {child:?} under its own descendant {parent:?}")]
    Cycle { parent: NodeId, child: NodeId },
    #[error("{reference:?} is not a child of {parent:?}")]
    NotAChild { parent: NodeId, reference: NodeId },
    #[error("the root node cannot be removed")]
    RootRemoval,
}

#[derive(Debug, Clone)]
struct Node<A> {
    tag: String,
    classes: BTreeSet<String>,
    attrs: BTreeMap<String, String>,
    text: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    draggable: bool,
    bounds: Bounds,
    listeners: BTreeMap<EventKind, A>,
}

impl<A> Node<A> {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_owned(),
            classes: BTreeSet::new(),
            attrs: BTreeMap::new(),
            text: String::new(),
            parent: None,
            children: Vec::new(),
            draggable: false,
            bounds: Bounds::default(),
            listeners: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ViewTree<A> {
    nodes: Vec<Option<Node<A>>>,
    root: NodeId,
}

impl<A> ViewTree<A> {
    pub fn new(root_tag: &str) -> Self {
        Self {
            nodes: vec![Some(Node::new(root_tag))],
            root: NodeId(0),
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.get(id.0).is_some_and(Option::is_some)
    }

    /// Create a detached node.
    pub fn create(&mut self, tag: &str) -> NodeId {
        self.nodes.push(Some(Node::new(tag)));
        NodeId(self.nodes.len() - 1)
    }

    /// Create a node and append it to `parent`.
    pub fn element(&mut self, parent: NodeId, tag: &str) -> Result<NodeId, ViewError> {
        self.get(parent)?;
        let id = self.create(tag);
        self.append_child(parent, id)?;
        Ok(id)
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), ViewError> {
        self.insert_before(parent, child, None)
    }

    /// Place `child` under `parent` right before `reference`, or last when
    /// `reference` is `None`. An attached `child` is moved, not copied.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> Result<(), ViewError> {
        self.get(parent)?;
        self.get(child)?;
        if child == parent || self.is_ancestor(child, parent) {
            return Err(ViewError::Cycle { parent, child });
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(());
            }
            if self.parent(reference) != Some(parent) {
                return Err(ViewError::NotAChild { parent, reference });
            }
        }

        self.detach(child)?;
        let children = &mut self.get_mut(parent)?.children;
        let position = reference
            .and_then(|reference| children.iter().position(|id| *id == reference))
            .unwrap_or(children.len());
        children.insert(position, child);
        self.get_mut(child)?.parent = Some(parent);
        Ok(())
    }

    /// Unhook `node` from its parent, keeping its subtree alive.
    pub fn detach(&mut self, node: NodeId) -> Result<(), ViewError> {
        let Some(parent) = self.get(node)?.parent else {
            return Ok(());
        };
        self.get_mut(parent)?.children.retain(|id| *id != node);
        self.get_mut(node)?.parent = None;
        Ok(())
    }

    /// Detach `node` and drop it together with its subtree.
    pub fn remove(&mut self, node: NodeId) -> Result<(), ViewError> {
        if node == self.root {
            return Err(ViewError::RootRemoval);
        }
        self.detach(node)?;
        for id in self.descendants(node) {
            self.nodes[id.0] = None;
        }
        Ok(())
    }

    /// Remove every child of `node`.
    pub fn clear_children(&mut self, node: NodeId) -> Result<(), ViewError> {
        for child in self.get(node)?.children.clone() {
            self.remove(child)?;
        }
        Ok(())
    }

    pub fn children(&self, node: NodeId) -> &[NodeId] {
        self.get(node).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).ok().and_then(|n| n.parent)
    }

    /// Position of `node` among its parent's children.
    pub fn sibling_index(&self, node: NodeId) -> Option<usize> {
        let parent = self.parent(node)?;
        self.children(parent).iter().position(|id| *id == node)
    }

    /// `scope` and everything under it, in document order.
    pub fn descendants(&self, scope: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![scope];
        while let Some(id) = stack.pop() {
            let Ok(node) = self.get(id) else {
                continue;
            };
            out.push(id);
            stack.extend(node.children.iter().rev().copied());
        }
        out
    }

    pub fn find_by_attr(&self, scope: NodeId, key: &str, value: &str) -> Option<NodeId> {
        self.descendants(scope)
            .into_iter()
            .find(|id| self.attr(*id, key) == Some(value))
    }

    pub fn find_all_by_class(&self, scope: NodeId, class: &str) -> Vec<NodeId> {
        self.descendants(scope)
            .into_iter()
            .filter(|id| self.has_class(*id, class))
            .collect()
    }

    pub fn tag(&self, node: NodeId) -> Option<&str> {
        self.get(node).ok().map(|n| n.tag.as_str())
    }

    pub fn text(&self, node: NodeId) -> Option<&str> {
        self.get(node).ok().map(|n| n.text.as_str())
    }

    pub fn set_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), ViewError> {
        self.get_mut(node)?.text = text.into();
        Ok(())
    }

    pub fn has_class(&self, node: NodeId, class: &str) -> bool {
        self.get(node).is_ok_and(|n| n.classes.contains(class))
    }

    pub fn add_class(&mut self, node: NodeId, class: &str) -> Result<(), ViewError> {
        self.get_mut(node)?.classes.insert(class.to_owned());
        Ok(())
    }

    pub fn remove_class(&mut self, node: NodeId, class: &str) -> Result<(), ViewError> {
        self.get_mut(node)?.classes.remove(class);
        Ok(())
    }

    pub fn set_class(&mut self, node: NodeId, class: &str, on: bool) -> Result<(), ViewError> {
        if on {
            self.add_class(node, class)
        } else {
            self.remove_class(node, class)
        }
    }

    pub fn attr(&self, node: NodeId, key: &str) -> Option<&str> {
        self.get(node)
            .ok()
            .and_then(|n| n.attrs.get(key))
            .map(String::as_str)
    }

    pub fn set_attr(
        &mut self,
        node: NodeId,
        key: &str,
        value: impl Into<String>,
    ) -> Result<(), ViewError> {
        self.get_mut(node)?.attrs.insert(key.to_owned(), value.into());
        Ok(())
    }

    pub fn remove_attr(&mut self, node: NodeId, key: &str) -> Result<(), ViewError> {
        self.get_mut(node)?.attrs.remove(key);
        Ok(())
    }

    pub fn is_draggable(&self, node: NodeId) -> bool {
        self.get(node).is_ok_and(|n| n.draggable)
    }

    pub fn set_draggable(&mut self, node: NodeId, draggable: bool) -> Result<(), ViewError> {
        self.get_mut(node)?.draggable = draggable;
        Ok(())
    }

    pub fn listen(&mut self, node: NodeId, kind: EventKind, action: A) -> Result<(), ViewError> {
        self.get_mut(node)?.listeners.insert(kind, action);
        Ok(())
    }

    pub fn listener(&self, node: NodeId, kind: EventKind) -> Option<&A> {
        self.get(node).ok().and_then(|n| n.listeners.get(&kind))
    }

    pub fn bounds(&self, node: NodeId) -> Option<Bounds> {
        self.get(node).ok().map(|n| n.bounds)
    }

    pub fn set_height(&mut self, node: NodeId, height: f32) -> Result<(), ViewError> {
        self.get_mut(node)?.bounds.height = height;
        Ok(())
    }

    /// Stack the children of `parent` top to bottom, starting at the parent's
    /// own top edge, and grow the parent to fit them.
    pub fn layout_column(&mut self, parent: NodeId) -> Result<(), ViewError> {
        let mut cursor = self.get(parent)?.bounds.top;
        for child in self.get(parent)?.children.clone() {
            let node = self.get_mut(child)?;
            node.bounds.top = cursor;
            cursor += node.bounds.height;
        }
        let node = self.get_mut(parent)?;
        node.bounds.height = cursor - node.bounds.top;
        Ok(())
    }

    /// Indented text rendering of a subtree, one node per line.
    pub fn outline(&self, scope: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(scope, 0, &mut out);
        out
    }

    fn outline_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let Ok(node) = self.get(id) else {
            return;
        };
        let _ = write!(out, "{:indent$}<{}", "", node.tag, indent = depth * 2);
        if !node.classes.is_empty() {
            let classes: Vec<&str> = node.classes.iter().map(String::as_str).collect();
            let _ = write!(out, " .{}", classes.join("."));
        }
        if let Some(value) = node.attrs.get("value") {
            let _ = write!(out, " value={value:?}");
        }
        out.push('>');
        if !node.text.is_empty() {
            let _ = write!(out, " {}", node.text);
        }
        out.push('\n');
        for child in &node.children {
            self.outline_into(*child, depth + 1, out);
        }
    }

    fn is_ancestor(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut cursor = self.parent(node);
        while let Some(id) = cursor {
            if id == ancestor {
                return true;
            }
            cursor = self.parent(id);
        }
        false
    }

    fn get(&self, id: NodeId) -> Result<&Node<A>, ViewError> {
        self.nodes
            .get(id.0)
            .and_then(Option::as_ref)
            .ok_or(ViewError::MissingNode(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut Node<A>, ViewError> {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .ok_or(ViewError::MissingNode(id))
    }
}
