//! Repeat regions
//!
//! A repeat is a template over one detached fragment. Every iteration is
//! written into the repeat like into any template, then copied into the
//! owning document with [`Template::append_repeat`]. The copy is deep, so
//! later edits to the repeat never reach iterations already appended.
//! Once copied, the repeat is reset to the fragment as it was parsed, so
//! every iteration starts clean.

use std::ops::{Deref, DerefMut};

use stencil_dom::{Document, DomTree, NodeId};

use crate::{Config, Template};

/// One repeatable fragment
#[derive(Debug)]
pub struct Repeat {
    name: String,
    template: Template,
    /// Fragment as extracted, before indexing
    pristine: Document,
    /// Emptied original node in the owning document
    placeholder: NodeId,
    /// Whether header tags in the fragment go to the header queue
    hoist_headers: bool,
}

impl Repeat {
    pub(crate) fn new(
        name: &str,
        fragment: Document,
        placeholder: NodeId,
        config: Config,
        hoist_headers: bool,
    ) -> Self {
        let pristine = fragment.clone();
        Self {
            name: name.to_string(),
            template: Template::from_document_scoped(fragment, config, hoist_headers),
            pristine,
            placeholder,
            hoist_headers,
        }
    }

    /// Repeat name, also a var addressing the fragment's root element
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Placeholder node in the owning document
    pub fn placeholder(&self) -> NodeId {
        self.placeholder
    }

    /// Drop all edits and start again from the parsed fragment
    pub fn reset(&mut self) -> &mut Self {
        let config = self.template.config().clone();
        self.template = Template::from_document_scoped(self.pristine.clone(), config, self.hoist_headers);
        self
    }

    /// Deep-copy the current fragment root into `tree`, detached
    pub(crate) fn import_into(&self, tree: &mut DomTree) -> Option<NodeId> {
        let document = self.template.document();
        let root = *document.root_elements().first()?;
        Some(tree.import_node(document.tree(), root))
    }
}

impl Deref for Repeat {
    type Target = Template;

    fn deref(&self) -> &Template {
        &self.template
    }
}

impl DerefMut for Repeat {
    fn deref_mut(&mut self) -> &mut Template {
        &mut self.template
    }
}
