//! Document - High-level document API

use crate::{DomTree, Node, NodeId};

/// A parsed markup document
#[derive(Debug, Clone)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Where the markup came from (file path or `about:blank`)
    url: String,
    /// Source started with `<!doctype html>`
    html5: bool,
}

impl Document {
    /// Create an empty document (no structure)
    pub fn empty(url: &str) -> Self {
        Self {
            tree: DomTree::new(),
            url: url.to_string(),
            html5: false,
        }
    }

    /// Get document URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Whether the source carried an HTML5 doctype
    pub fn is_html5(&self) -> bool {
        self.html5
    }

    pub fn set_html5(&mut self, html5: bool) {
        self.html5 = html5;
    }

    /// Get document title
    pub fn title(&self) -> String {
        self.tree
            .find_element(self.tree.root(), "title")
            .map(|id| self.tree.text_content(id))
            .unwrap_or_default()
    }

    /// First `<head>` element
    pub fn head(&self) -> Option<NodeId> {
        self.tree.find_element(self.tree.root(), "head")
    }

    /// First `<body>` element
    pub fn body(&self) -> Option<NodeId> {
        self.tree.find_element(self.tree.root(), "body")
    }

    /// Top-level element children of the document root
    pub fn root_elements(&self) -> Vec<NodeId> {
        self.tree.child_elements(self.tree.root())
    }

    /// Get element by ID attribute, first match in document order
    pub fn get_element_by_id(&self, id: &str) -> Option<NodeId> {
        self.tree.descendants(self.tree.root()).into_iter().find(|&node| {
            self.tree
                .get(node)
                .and_then(Node::as_element)
                .and_then(|e| e.get_attr("id"))
                == Some(id)
        })
    }

    /// Access the DOM tree
    pub fn tree(&self) -> &DomTree {
        &self.tree
    }

    /// Access the DOM tree mutably
    pub fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    /// Memory usage in bytes
    pub fn memory_usage(&self) -> usize {
        self.tree.memory_usage() + self.url.capacity()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::empty("about:blank")
    }
}
