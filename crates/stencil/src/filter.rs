//! Filter trait and traversal context

use stencil_dom::{DomTree, NodeId};

/// View of the tree handed to filters during a [`crate::Modifier`] run
pub struct FilterContext<'a> {
    tree: &'a mut DomTree,
    pub(crate) head: Option<NodeId>,
    pub(crate) body: Option<NodeId>,
    pub(crate) in_head: bool,
    pub(crate) in_body: bool,
    pub(crate) trash: Vec<NodeId>,
}

impl<'a> FilterContext<'a> {
    pub(crate) fn new(tree: &'a mut DomTree) -> Self {
        Self {
            tree,
            head: None,
            body: None,
            in_head: false,
            in_body: false,
            trash: Vec::new(),
        }
    }

    pub fn tree(&self) -> &DomTree {
        &*self.tree
    }

    /// Mutable tree access.
    ///
    /// Nodes must not be detached while the traversal runs; use
    /// [`FilterContext::remove_node`] instead.
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut *self.tree
    }

    /// First `<head>` seen so far
    pub fn head(&self) -> Option<NodeId> {
        self.head
    }

    /// First `<body>` seen so far
    pub fn body(&self) -> Option<NodeId> {
        self.body
    }

    /// Whether the current node is inside the head anchor
    pub fn in_head(&self) -> bool {
        self.in_head
    }

    pub fn in_body(&self) -> bool {
        self.in_body
    }

    /// Queue a node for removal once all filters are done
    pub fn remove_node(&mut self, node: NodeId) {
        if !self.trash.contains(&node) {
            self.trash.push(node);
        }
    }
}

/// A last-mile rewrite applied in a single pass over the finished tree.
///
/// Elements go to [`Filter::execute_node`], comments to
/// [`Filter::execute_comment`]. Work that needs the whole document belongs
/// in [`Filter::post_traverse`].
pub trait Filter {
    /// Name used in log output
    fn name(&self) -> &str;

    /// Called once before the traversal
    fn init(&mut self, _ctx: &mut FilterContext<'_>) {}

    /// Called for every element, in document order
    fn execute_node(&mut self, ctx: &mut FilterContext<'_>, node: NodeId);

    /// Called for every comment node
    fn execute_comment(&mut self, _ctx: &mut FilterContext<'_>, _node: NodeId) {}

    /// Called once after the traversal, in registration order
    fn post_traverse(&mut self, _ctx: &mut FilterContext<'_>) {}

    /// Disabled filters are skipped for the remaining nodes
    fn is_enabled(&self) -> bool {
        true
    }
}
