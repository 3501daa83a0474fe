//! Arena-based document tree
//!
//! Elements and attributes live in a generational arena and refer to each
//! other through [`NodeId`] handles. A parent owns its children; the parent
//! link of a child is a plain handle used for lookups only. Removing a child
//! frees its whole subtree, after which every handle into it is stale and is
//! rejected by the tree.

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::error::{DomainError, DomainResult};
use crate::domain::value::{RawValue, Value};

/// Handle to a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Index);

/// Payload distinguishing container elements from leaf attributes.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Element { children: Vec<NodeId> },
    Attribute { value: Value },
}

/// Tree node in the arena.
#[derive(Debug, Clone)]
pub struct TreeNode {
    /// Element or attribute name; empty after [`Tree::clear`]
    pub name: String,
    /// Parent element, None for the root and for detached nodes
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// Flattened copy of one node, used to move subtrees between arenas.
struct Detached {
    name: String,
    value: Option<Value>,
    parent: Option<usize>,
}

/// A Defold document as a tree of elements and attributes.
///
/// The tree has exactly one root element. Iterators borrow the tree, so it
/// cannot be mutated while a traversal is alive.
#[derive(Debug, Clone)]
pub struct Tree {
    arena: Arena<TreeNode>,
    root: NodeId,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// An empty document whose root element is named `root`.
    pub fn new() -> Self {
        Self::with_root("root")
    }

    pub fn with_root(name: &str) -> Self {
        let mut arena = Arena::new();
        let root = NodeId(arena.insert(TreeNode {
            name: name.to_string(),
            parent: None,
            kind: NodeKind::Element {
                children: Vec::new(),
            },
        }));
        Self { arena, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&TreeNode> {
        self.arena.get(id.0)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id.0)
    }

    pub fn is_element(&self, id: NodeId) -> bool {
        matches!(
            self.node(id),
            Some(TreeNode {
                kind: NodeKind::Element { .. },
                ..
            })
        )
    }

    pub fn is_attribute(&self, id: NodeId) -> bool {
        matches!(
            self.node(id),
            Some(TreeNode {
                kind: NodeKind::Attribute { .. },
                ..
            })
        )
    }

    // ------------------------------------------------------------
    // Node access
    // ------------------------------------------------------------

    pub fn name(&self, id: NodeId) -> DomainResult<&str> {
        Ok(&self.live(id)?.name)
    }

    pub fn set_name(&mut self, id: NodeId, name: impl Into<String>) -> DomainResult<()> {
        self.live_mut(id)?.name = name.into();
        Ok(())
    }

    /// Parent element of a node; None for the root, detached or stale nodes.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|node| node.parent)
    }

    pub fn children(&self, element: NodeId) -> DomainResult<&[NodeId]> {
        match &self.live(element)?.kind {
            NodeKind::Element { children } => Ok(children),
            NodeKind::Attribute { .. } => Err(expected_element()),
        }
    }

    pub fn len(&self, element: NodeId) -> DomainResult<usize> {
        Ok(self.children(element)?.len())
    }

    pub fn is_empty(&self, element: NodeId) -> DomainResult<bool> {
        Ok(self.children(element)?.is_empty())
    }

    /// Child at `index` of an element.
    pub fn child(&self, element: NodeId, index: usize) -> Option<NodeId> {
        self.children(element).ok()?.get(index).copied()
    }

    pub fn value(&self, attribute: NodeId) -> DomainResult<&Value> {
        match &self.live(attribute)?.kind {
            NodeKind::Attribute { value } => Ok(value),
            NodeKind::Element { .. } => Err(expected_attribute()),
        }
    }

    /// Assign a new value to an attribute, keeping its kind.
    pub fn set_value(&mut self, attribute: NodeId, raw: impl Into<RawValue>) -> DomainResult<()> {
        match &mut self.live_mut(attribute)?.kind {
            NodeKind::Attribute { value } => value.assign(raw),
            NodeKind::Element { .. } => Err(expected_attribute()),
        }
    }

    // ------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------

    /// Create a detached element.
    pub fn create_element(&mut self, name: impl Into<String>) -> NodeId {
        NodeId(self.arena.insert(TreeNode {
            name: name.into(),
            parent: None,
            kind: NodeKind::Element {
                children: Vec::new(),
            },
        }))
    }

    /// Create a detached attribute, classifying `raw`.
    pub fn create_attribute(&mut self, name: impl Into<String>, raw: impl Into<RawValue>) -> NodeId {
        NodeId(self.arena.insert(TreeNode {
            name: name.into(),
            parent: None,
            kind: NodeKind::Attribute {
                value: Value::classify(raw),
            },
        }))
    }

    #[instrument(level = "trace", skip(self, name))]
    pub fn add_element(&mut self, parent: NodeId, name: impl Into<String>) -> DomainResult<NodeId> {
        self.children(parent)?;
        let element = self.create_element(name);
        self.link_last(parent, element);
        Ok(element)
    }

    #[instrument(level = "trace", skip(self, name, raw))]
    pub fn add_attribute(
        &mut self,
        parent: NodeId,
        name: impl Into<String>,
        raw: impl Into<RawValue>,
    ) -> DomainResult<NodeId> {
        self.children(parent)?;
        let attribute = self.create_attribute(name, raw);
        self.link_last(parent, attribute);
        Ok(attribute)
    }

    // ------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------

    pub fn append(&mut self, parent: NodeId, node: NodeId) -> DomainResult<()> {
        let end = self.len(parent)?;
        self.insert(parent, end, node)
    }

    /// Insert `node` at `index` among the children of `parent`.
    ///
    /// A node that is still attached elsewhere is moved. Indices past the end
    /// append.
    #[instrument(level = "trace", skip(self))]
    pub fn insert(&mut self, parent: NodeId, index: usize, node: NodeId) -> DomainResult<()> {
        self.children(parent)?;
        self.live(node)?;
        if self.ancestors_inclusive(parent).any(|id| id == node) {
            return Err(DomainError::Cycle(self.describe(node)));
        }

        self.detach(node)?;
        let children = self.children_mut(parent)?;
        let index = index.min(children.len());
        children.insert(index, node);
        self.live_mut(node)?.parent = Some(parent);
        Ok(())
    }

    /// Unlink a node from its parent without destroying it.
    pub fn detach(&mut self, node: NodeId) -> DomainResult<()> {
        let Some(parent) = self.live(node)?.parent else {
            return Ok(());
        };
        let siblings = self.children_mut(parent)?;
        if let Some(position) = siblings.iter().position(|&id| id == node) {
            siblings.remove(position);
        }
        self.live_mut(node)?.parent = None;
        Ok(())
    }

    /// Remove `node` from `parent` by identity and destroy its subtree.
    ///
    /// Removing a node that is not a child of `parent` changes nothing.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, parent: NodeId, node: NodeId) -> DomainResult<()> {
        let children = self.children_mut(parent)?;
        if let Some(position) = children.iter().position(|&id| id == node) {
            children.remove(position);
            self.free_subtree(node);
        }
        Ok(())
    }

    /// Put `new` where `old` is among the children of `parent`, destroying `old`.
    pub fn replace(&mut self, parent: NodeId, old: NodeId, new: NodeId) -> DomainResult<()> {
        let index = self.index_of(parent, old)?;
        self.remove(parent, old)?;
        self.insert(parent, index, new)
    }

    pub fn index_of(&self, parent: NodeId, node: NodeId) -> DomainResult<usize> {
        self.children(parent)?
            .iter()
            .position(|&id| id == node)
            .ok_or_else(|| DomainError::Lookup(self.describe(node)))
    }

    /// Reset an element: detach it, drop its name and destroy its children.
    #[instrument(level = "trace", skip(self))]
    pub fn clear(&mut self, element: NodeId) -> DomainResult<()> {
        self.children(element)?;
        self.detach(element)?;
        let children = std::mem::take(self.children_mut(element)?);
        for child in children {
            self.free_subtree(child);
        }
        self.live_mut(element)?.name.clear();
        Ok(())
    }

    /// Deep copy of a node, returned detached.
    #[instrument(level = "trace", skip(self))]
    pub fn copy(&mut self, node: NodeId) -> DomainResult<NodeId> {
        let snapshot = self.snapshot(node)?;
        Ok(self.graft(snapshot))
    }

    /// A standalone tree whose root is a deep copy of `element`.
    #[instrument(level = "trace", skip(self))]
    pub fn extract(&self, element: NodeId) -> DomainResult<Tree> {
        self.children(element)?;
        let snapshot = self.snapshot(element)?;
        let mut tree = Tree {
            arena: Arena::with_capacity(snapshot.len()),
            root: self.root,
        };
        tree.root = tree.graft(snapshot);
        Ok(tree)
    }

    // ------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------

    /// First direct child element named `name`.
    pub fn get_element(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.elements(parent, Some(name)).next()
    }

    /// First direct child attribute named `name`, and equal to `value` if given.
    pub fn get_attribute(&self, parent: NodeId, name: &str, value: Option<&RawValue>) -> Option<NodeId> {
        self.attributes(parent, Some(name), value).next()
    }

    /// Assign to the first attribute named `name` among the children of `parent`.
    pub fn set_attribute(
        &mut self,
        parent: NodeId,
        name: &str,
        raw: impl Into<RawValue>,
    ) -> DomainResult<()> {
        let attribute = self
            .get_attribute(parent, name, None)
            .ok_or_else(|| DomainError::Lookup(format!("Attribute({name:?})")))?;
        self.set_value(attribute, raw)
    }

    /// Direct child elements, optionally filtered by name.
    pub fn elements<'a>(
        &'a self,
        parent: NodeId,
        name: Option<&'a str>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent)
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(move |&id| self.is_element(id) && self.name_matches(id, name))
    }

    /// Direct child attributes, optionally filtered by name and value.
    pub fn attributes<'a>(
        &'a self,
        parent: NodeId,
        name: Option<&'a str>,
        value: Option<&'a RawValue>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.children(parent)
            .unwrap_or(&[])
            .iter()
            .copied()
            .filter(move |&id| {
                self.name_matches(id, name)
                    && match (self.value(id), value) {
                        (Ok(_), None) => true,
                        (Ok(current), Some(wanted)) => current.matches(wanted),
                        (Err(_), _) => false,
                    }
            })
    }

    // ------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------

    /// All descendants of `element` in document (depth first, pre-order) order.
    pub fn iter_all(&self, element: NodeId) -> Descendants<'_> {
        Descendants::new(self, element)
    }

    /// Descendant elements, optionally filtered by name.
    pub fn iter_elements<'a>(
        &'a self,
        element: NodeId,
        name: Option<&'a str>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.iter_all(element)
            .filter(move |&id| self.is_element(id) && self.name_matches(id, name))
    }

    /// Descendant attributes, optionally filtered by name.
    pub fn iter_attributes<'a>(
        &'a self,
        element: NodeId,
        name: Option<&'a str>,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.iter_all(element)
            .filter(move |&id| self.is_attribute(id) && self.name_matches(id, name))
    }

    /// Parent, grandparent and so on up to the topmost ancestor.
    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(node),
        }
    }

    /// Nearest ancestor element named `name`.
    pub fn find_ancestor(&self, node: NodeId, name: &str) -> Option<NodeId> {
        self.ancestors(node).find(|&id| self.name_matches(id, Some(name)))
    }

    /// Number of parent links between `node` and its topmost ancestor.
    pub fn depth(&self, node: NodeId) -> usize {
        self.ancestors(node).count()
    }

    /// Short description used in error messages, e.g. `Element("profiles")`.
    pub fn describe(&self, id: NodeId) -> String {
        match self.node(id) {
            Some(TreeNode {
                name,
                kind: NodeKind::Element { .. },
                ..
            }) => format!("Element({name:?})"),
            Some(TreeNode {
                name,
                kind: NodeKind::Attribute { value },
                ..
            }) => format!("Attribute({name:?}, {value})"),
            None => "stale node".to_string(),
        }
    }

    // ------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------

    fn live(&self, id: NodeId) -> DomainResult<&TreeNode> {
        self.arena.get(id.0).ok_or(DomainError::Type {
            expected: "an Element or Attribute",
            found: "a stale node",
        })
    }

    fn live_mut(&mut self, id: NodeId) -> DomainResult<&mut TreeNode> {
        self.arena.get_mut(id.0).ok_or(DomainError::Type {
            expected: "an Element or Attribute",
            found: "a stale node",
        })
    }

    fn children_mut(&mut self, element: NodeId) -> DomainResult<&mut Vec<NodeId>> {
        match &mut self.live_mut(element)?.kind {
            NodeKind::Element { children } => Ok(children),
            NodeKind::Attribute { .. } => Err(expected_element()),
        }
    }

    fn name_matches(&self, id: NodeId, name: Option<&str>) -> bool {
        match (self.node(id), name) {
            (Some(_), None) => true,
            (Some(node), Some(name)) => node.name == name,
            (None, _) => false,
        }
    }

    fn ancestors_inclusive(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::once(node).chain(self.ancestors(node))
    }

    fn link_last(&mut self, parent: NodeId, node: NodeId) {
        if let Some(TreeNode {
            kind: NodeKind::Element { children },
            ..
        }) = self.arena.get_mut(parent.0)
        {
            children.push(node);
        }
        if let Some(child) = self.arena.get_mut(node.0) {
            child.parent = Some(parent);
        }
    }

    fn free_subtree(&mut self, node: NodeId) {
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if let Some(removed) = self.arena.remove(current.0) {
                if let NodeKind::Element { children } = removed.kind {
                    stack.extend(children);
                }
            }
        }
    }

    /// Pre-order flattening of a subtree; every parent precedes its children.
    fn snapshot(&self, node: NodeId) -> DomainResult<Vec<Detached>> {
        let mut out = Vec::new();
        let mut stack = vec![(node, None)];
        while let Some((current, parent)) = stack.pop() {
            let entry = self.live(current)?;
            let slot = out.len();
            match &entry.kind {
                NodeKind::Element { children } => {
                    out.push(Detached {
                        name: entry.name.clone(),
                        value: None,
                        parent,
                    });
                    stack.extend(children.iter().rev().map(|&child| (child, Some(slot))));
                }
                NodeKind::Attribute { value } => out.push(Detached {
                    name: entry.name.clone(),
                    value: Some(value.clone()),
                    parent,
                }),
            }
        }
        Ok(out)
    }

    /// Insert a snapshot into this arena and return the copy of its first node.
    fn graft(&mut self, snapshot: Vec<Detached>) -> NodeId {
        let mut ids: Vec<NodeId> = Vec::with_capacity(snapshot.len());
        for entry in snapshot {
            let parent = entry.parent.map(|slot| ids[slot]);
            let kind = match entry.value {
                Some(value) => NodeKind::Attribute { value },
                None => NodeKind::Element {
                    children: Vec::new(),
                },
            };
            let id = NodeId(self.arena.insert(TreeNode {
                name: entry.name,
                parent: None,
                kind,
            }));
            if let Some(parent) = parent {
                self.link_last(parent, id);
            }
            ids.push(id);
        }
        ids[0]
    }
}

fn expected_element() -> DomainError {
    DomainError::Type {
        expected: "an Element",
        found: "an Attribute",
    }
}

fn expected_attribute() -> DomainError {
    DomainError::Type {
        expected: "an Attribute",
        found: "an Element",
    }
}

/// Pre-order iterator over the descendants of an element.
pub struct Descendants<'a> {
    tree: &'a Tree,
    stack: Vec<NodeId>,
}

impl<'a> Descendants<'a> {
    fn new(tree: &'a Tree, element: NodeId) -> Self {
        let stack = tree
            .children(element)
            .map(|children| children.iter().rev().copied().collect())
            .unwrap_or_default();
        Self { tree, stack }
    }
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.stack.pop()?;
        if let Ok(children) = self.tree.children(current) {
            // Push children in reverse order for left-to-right traversal
            self.stack.extend(children.iter().rev().copied());
        }
        Some(current)
    }
}

/// Iterator walking parent links towards the root.
pub struct Ancestors<'a> {
    tree: &'a Tree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self.tree.parent(current);
        Some(current)
    }
}
