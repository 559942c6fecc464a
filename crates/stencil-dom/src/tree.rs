//! DOM Tree (arena-based allocation)
//!
//! Nodes are never freed: detaching a node only unlinks it, so a `NodeId`
//! stays valid for the life of the tree. Moving content between trees is
//! always a deep copy through [`DomTree::import_node`].

use crate::{Node, NodeData, NodeId, TextData};

/// Arena-based DOM tree
#[derive(Debug, Clone)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new tree holding only the document root
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// Document root
    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by ID
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index()?)
    }

    /// Get a mutable node by ID
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index()?)
    }

    /// Whether `id` refers to a node of this tree
    pub fn contains(&self, id: NodeId) -> bool {
        self.get(id).is_some()
    }

    /// Number of nodes in the arena, detached ones included
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Create a detached element
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.push(Node::element(name))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.push(Node::text(content))
    }

    /// Create a detached comment
    pub fn create_comment(&mut self, content: &str) -> NodeId {
        self.push(Node::new(NodeData::Comment(content.to_string())))
    }

    /// Create a detached doctype
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.push(Node::new(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        }))
    }

    /// Tag name of an element node
    pub fn tag_name(&self, id: NodeId) -> Option<&str> {
        self.get(id)?.as_element().map(|e| e.name.as_str())
    }

    /// Attribute of an element node
    pub fn attr(&self, id: NodeId, name: &str) -> Option<&str> {
        self.get(id)?.as_element()?.get_attr(name)
    }

    /// Set an attribute on an element node; ignored for other kinds
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(elem) = self.get_mut(id).and_then(Node::as_element_mut) {
            elem.set_attr(name, value);
        }
    }

    /// Remove an attribute from an element node
    pub fn remove_attr(&mut self, id: NodeId, name: &str) -> Option<String> {
        self.get_mut(id)?.as_element_mut()?.remove_attr(name)
    }

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.get(id)?.parent;
        parent.is_valid().then_some(parent)
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(id).map_or(NodeId::NONE, |n| n.first_child),
        }
    }

    /// Snapshot of child IDs, safe to hold while mutating the tree
    pub fn child_ids(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id).map(|(child, _)| child).collect()
    }

    /// Child element IDs only
    pub fn child_elements(&self, id: NodeId) -> Vec<NodeId> {
        self.children(id)
            .filter(|(_, node)| node.is_element())
            .map(|(child, _)| child)
            .collect()
    }

    /// All descendants of `id` in pre-order, `id` excluded
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.child_ids(id).into_iter().rev().collect();
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.child_ids(current).into_iter().rev());
        }
        out
    }

    /// Whether `ancestor` is `id` or one of its ancestors
    pub fn is_inclusive_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = id;
        while current.is_valid() {
            if current == ancestor {
                return true;
            }
            current = self.get(current).map_or(NodeId::NONE, |n| n.parent);
        }
        false
    }

    /// Whether the node is reachable from the document root
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.is_inclusive_ancestor(self.root(), id)
    }

    /// Unlink a node from its parent and siblings
    pub fn detach(&mut self, id: NodeId) {
        let Some(node) = self.get(id) else {
            return;
        };
        let (parent, prev, next) = (node.parent, node.prev_sibling, node.next_sibling);

        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = next;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.first_child = next;
        }
        if let Some(n) = self.get_mut(next) {
            n.prev_sibling = prev;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.last_child = prev;
        }

        if let Some(node) = self.get_mut(id) {
            node.parent = NodeId::NONE;
            node.prev_sibling = NodeId::NONE;
            node.next_sibling = NodeId::NONE;
        }
    }

    /// Append `child` as the last child of `parent`, moving it if attached
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.insert_before(parent, child, NodeId::NONE);
    }

    /// Insert `child` as the first child of `parent`
    pub fn prepend_child(&mut self, parent: NodeId, child: NodeId) {
        let first = self.get(parent).map_or(NodeId::NONE, |n| n.first_child);
        self.insert_before(parent, child, first);
    }

    /// Insert `child` under `parent` before `reference`; a NONE reference appends.
    ///
    /// Inserting a node into its own subtree is refused.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        if !self.contains(parent) || !self.contains(child) || child == reference {
            return;
        }
        if self.is_inclusive_ancestor(child, parent) {
            tracing::debug!("Refusing to insert {:?} into its own subtree", child);
            return;
        }
        if reference.is_valid() && self.parent(reference) != Some(parent) {
            return;
        }

        self.detach(child);

        let prev = if reference.is_valid() {
            self.get(reference).map_or(NodeId::NONE, |n| n.prev_sibling)
        } else {
            self.get(parent).map_or(NodeId::NONE, |n| n.last_child)
        };

        if let Some(node) = self.get_mut(child) {
            node.parent = parent;
            node.prev_sibling = prev;
            node.next_sibling = reference;
        }
        if let Some(p) = self.get_mut(prev) {
            p.next_sibling = child;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.first_child = child;
        }
        if let Some(r) = self.get_mut(reference) {
            r.prev_sibling = child;
        } else if let Some(parent_node) = self.get_mut(parent) {
            parent_node.last_child = child;
        }
    }

    /// Put `new` in the place of `old`; `old` ends up detached
    pub fn replace(&mut self, old: NodeId, new: NodeId) {
        let Some(parent) = self.parent(old) else {
            return;
        };
        self.insert_before(parent, new, old);
        self.detach(old);
    }

    /// Detach every child of `id`
    pub fn clear_children(&mut self, id: NodeId) {
        for child in self.child_ids(id) {
            self.detach(child);
        }
    }

    /// Deep-copy a subtree of `source` into this tree, returning the detached copy.
    ///
    /// `source` may be this very tree's clone; IDs are never shared between trees.
    pub fn import_node(&mut self, source: &DomTree, id: NodeId) -> NodeId {
        let Some(node) = source.get(id) else {
            return NodeId::NONE;
        };
        let copy = self.push(Node::new(node.data.clone()));
        for (child, _) in source.children(id) {
            let child_copy = self.import_node(source, child);
            self.append_child(copy, child_copy);
        }
        copy
    }

    /// Clone a node of this tree, optionally with its subtree
    pub fn clone_node(&mut self, id: NodeId, deep: bool) -> NodeId {
        let Some(node) = self.get(id) else {
            return NodeId::NONE;
        };
        let copy = self.push(Node::new(node.data.clone()));
        if deep {
            for child in self.child_ids(id) {
                let child_copy = self.clone_node(child, true);
                self.append_child(copy, child_copy);
            }
        }
        copy
    }

    /// Merge adjacent text nodes and drop empty ones, recursively
    pub fn normalize(&mut self, id: NodeId) {
        let mut previous_text = NodeId::NONE;
        for child in self.child_ids(id) {
            let text = self.get(child).and_then(Node::as_text).map(str::to_string);
            match text {
                Some(content) if content.is_empty() => self.detach(child),
                Some(content) => {
                    if let Some(NodeData::Text(TextData { content: prev })) =
                        self.get_mut(previous_text).map(|n| &mut n.data)
                    {
                        prev.push_str(&content);
                        self.detach(child);
                    } else {
                        previous_text = child;
                    }
                }
                None => {
                    previous_text = NodeId::NONE;
                    self.normalize(child);
                }
            }
        }
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(text) = self.get(id).and_then(Node::as_text) {
            out.push_str(text);
        }
        for child in self.descendants(id) {
            if let Some(text) = self.get(child).and_then(Node::as_text) {
                out.push_str(text);
            }
        }
        out
    }

    /// First element with the given tag name in document order
    pub fn find_element(&self, start: NodeId, tag: &str) -> Option<NodeId> {
        self.descendants(start).into_iter().find(|&id| {
            self.get(id)
                .and_then(Node::as_element)
                .is_some_and(|e| e.is(tag))
        })
    }

    /// Approximate heap usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.nodes.capacity() * std::mem::size_of::<Node>()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: NodeId,
}

impl<'a> Iterator for Children<'a> {
    type Item = (NodeId, &'a Node);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next;
        let node = self.tree.get(id)?;
        self.next = node.next_sibling;
        Some((id, node))
    }
}
