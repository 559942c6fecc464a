//! Removes comments from the output

use stencil_dom::{Node, NodeId};

use crate::filter::{Filter, FilterContext};

/// Drops every comment except conditional comments (`<!--[if IE]>`)
#[derive(Debug, Clone)]
pub struct CommentStripFilter {
    pub keep_conditional: bool,
    removed: usize,
}

impl Default for CommentStripFilter {
    fn default() -> Self {
        Self {
            keep_conditional: true,
            removed: 0,
        }
    }
}

impl CommentStripFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Comments queued for removal in the last run
    pub fn removed(&self) -> usize {
        self.removed
    }
}

impl Filter for CommentStripFilter {
    fn name(&self) -> &str {
        "comment-strip"
    }

    fn init(&mut self, _ctx: &mut FilterContext<'_>) {
        self.removed = 0;
    }

    fn execute_node(&mut self, _ctx: &mut FilterContext<'_>, _node: NodeId) {}

    fn execute_comment(&mut self, ctx: &mut FilterContext<'_>, node: NodeId) {
        let conditional = ctx
            .tree()
            .get(node)
            .and_then(Node::as_comment)
            .is_some_and(|text| text.trim_start().starts_with("[if "));
        if conditional && self.keep_conditional {
            return;
        }
        ctx.remove_node(node);
        self.removed += 1;
    }
}
