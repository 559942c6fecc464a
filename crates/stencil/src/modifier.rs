//! Modifier - the filter pipeline
//!
//! Runs registered filters over a finished document in one traversal:
//! normalize, init, pre-order walk, post-traverse, then detach everything
//! filters queued for removal. Removal is deferred so that no sibling chain
//! changes under the walk.

use stencil_dom::{Document, NodeId};

use crate::filter::{Filter, FilterContext};

/// Pipeline phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifierState {
    #[default]
    Idle,
    Initializing,
    Traversing,
    PostTraversing,
    Cleanup,
}

/// Ordered filter pipeline
#[derive(Default)]
pub struct Modifier {
    filters: Vec<Box<dyn Filter>>,
    state: ModifierState,
}

impl Modifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a filter; filters run in registration order
    pub fn add_filter(&mut self, filter: impl Filter + 'static) -> &mut Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn state(&self) -> ModifierState {
        self.state
    }

    /// Run every filter over `document`
    pub fn execute(&mut self, document: &mut Document) {
        let tree = document.tree_mut();
        let root = tree.root();
        tree.normalize(root);

        let mut ctx = FilterContext::new(tree);

        self.enter(ModifierState::Initializing);
        for filter in &mut self.filters {
            filter.init(&mut ctx);
        }

        self.enter(ModifierState::Traversing);
        for child in ctx.tree().child_ids(root) {
            self.traverse(&mut ctx, child);
        }

        self.enter(ModifierState::PostTraversing);
        for filter in &mut self.filters {
            filter.post_traverse(&mut ctx);
        }

        self.enter(ModifierState::Cleanup);
        let trash = std::mem::take(&mut ctx.trash);
        let removed = trash.len();
        let tree = ctx.tree_mut();
        for node in trash {
            if tree.parent(node).is_some() {
                tree.detach(node);
            }
        }
        tracing::debug!("Filter pipeline done: {} filters, {} nodes removed", self.filters.len(), removed);

        self.enter(ModifierState::Idle);
    }

    fn enter(&mut self, state: ModifierState) {
        tracing::trace!("Modifier {:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn traverse(&mut self, ctx: &mut FilterContext<'_>, id: NodeId) {
        let Some(node) = ctx.tree().get(id) else {
            return;
        };

        if node.is_comment() {
            for filter in self.filters.iter_mut().filter(|f| f.is_enabled()) {
                filter.execute_comment(ctx, id);
            }
            return;
        }

        let tag = node.as_element().map(|e| e.name.to_ascii_lowercase());
        let Some(tag) = tag else {
            return;
        };

        let mut scope = None;
        match tag.as_str() {
            "head" if ctx.head.is_none() => {
                ctx.head = Some(id);
                ctx.in_head = true;
                scope = Some("head");
            }
            "body" if ctx.body.is_none() => {
                ctx.body = Some(id);
                ctx.in_body = true;
                scope = Some("body");
            }
            _ => {}
        }

        for filter in &mut self.filters {
            if filter.is_enabled() {
                filter.execute_node(ctx, id);
            }
        }

        for child in ctx.tree().child_ids(id) {
            self.traverse(ctx, child);
        }

        match scope {
            Some("head") => ctx.in_head = false,
            Some("body") => ctx.in_body = false,
            _ => {}
        }
    }
}

impl std::fmt::Debug for Modifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.filters.iter().map(|f| f.name()).collect();
        f.debug_struct("Modifier")
            .field("filters", &names)
            .field("state", &self.state)
            .finish()
    }
}
