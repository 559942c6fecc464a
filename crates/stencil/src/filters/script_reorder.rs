//! Moves body scripts to the end of `<body>`

use stencil_dom::NodeId;

use crate::filter::{Filter, FilterContext};

/// Collects every `<script>` inside the body and re-appends them, in
/// document order, as the last children of the body.
///
/// Scripts carrying the keep attribute stay where they are.
#[derive(Debug, Clone)]
pub struct ScriptReorderFilter {
    pub keep_attribute: String,
    scripts: Vec<NodeId>,
}

impl Default for ScriptReorderFilter {
    fn default() -> Self {
        Self {
            keep_attribute: "data-keep-position".to_string(),
            scripts: Vec::new(),
        }
    }
}

impl ScriptReorderFilter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Filter for ScriptReorderFilter {
    fn name(&self) -> &str {
        "script-reorder"
    }

    fn init(&mut self, _ctx: &mut FilterContext<'_>) {
        self.scripts.clear();
    }

    fn execute_node(&mut self, ctx: &mut FilterContext<'_>, node: NodeId) {
        if !ctx.in_body() {
            return;
        }
        let tree = ctx.tree();
        let is_script = tree.tag_name(node).is_some_and(|t| t.eq_ignore_ascii_case("script"));
        if is_script && tree.attr(node, &self.keep_attribute).is_none() {
            self.scripts.push(node);
        }
    }

    fn post_traverse(&mut self, ctx: &mut FilterContext<'_>) {
        let Some(body) = ctx.body() else {
            return;
        };
        tracing::trace!("Moving {} scripts to the end of body", self.scripts.len());
        let tree = ctx.tree_mut();
        for script in self.scripts.drain(..) {
            tree.append_child(body, script);
        }
    }
}
