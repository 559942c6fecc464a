//! Region Index
//!
//! One pre-order walk over a freshly parsed tree collects every addressable
//! region and consumes the reserved `var`, `choice` and `repeat` attributes.
//!
//! Per element, in order:
//! 1. `repeat`: the subtree becomes its own [`Repeat`] document; the node
//!    stays behind, emptied, as the placeholder iterations are inserted before.
//!    Its children are not walked here.
//! 2. `var`: registered under every whitespace-separated name.
//! 3. `choice`: registered as choice and var, and marked hidden.
//! 4. `id`: first occurrence wins.
//! 5. `form` opens a scope; input/textarea/select/button inside it are
//!    registered by name, falling back to id.
//! 6. First head, title and body become the anchors.
//! 7. Before any head has been seen, script/style/link/meta move into the
//!    header queue unless they carry the ignore marker. A repeat inherits
//!    whether its owner had already passed a head.
//! 8. Otherwise children are walked.

use std::collections::HashMap;

use stencil_dom::{Document, DomTree, Node, NodeId};

use crate::header::{HeaderEntry, HeaderQueue};
use crate::{Config, Repeat};

/// Reserved attribute names
pub const VAR_ATTR: &str = "var";
pub const CHOICE_ATTR: &str = "choice";
pub const REPEAT_ATTR: &str = "repeat";

const HEAD_TAGS: &[&str] = &["script", "style", "link", "meta"];
const FIELD_TAGS: &[&str] = &["input", "textarea", "select", "button"];

/// Named regions of one template
#[derive(Debug, Default)]
pub struct RegionIndex {
    pub(crate) vars: HashMap<String, Vec<NodeId>>,
    pub(crate) choices: HashMap<String, Vec<NodeId>>,
    pub(crate) repeats: HashMap<String, Repeat>,
    pub(crate) ids: HashMap<String, NodeId>,
    pub(crate) forms: HashMap<String, NodeId>,
    pub(crate) form_elements: HashMap<String, HashMap<String, Vec<NodeId>>>,
    pub(crate) header_queue: HeaderQueue,
    pub(crate) head: Option<NodeId>,
    pub(crate) title: Option<NodeId>,
    pub(crate) body: Option<NodeId>,
}

impl RegionIndex {
    /// Index `document`, stripping reserved attributes and extracting header tags
    pub fn build(document: &mut Document, config: &Config) -> Self {
        Self::build_scoped(document, config, true)
    }

    /// Index `document`; header tags are only extracted when `hoist_headers`
    /// is set and no head has been seen yet
    pub(crate) fn build_scoped(document: &mut Document, config: &Config, hoist_headers: bool) -> Self {
        let mut builder = Builder {
            index: RegionIndex::default(),
            config,
            url: document.url().to_string(),
            doomed: Vec::new(),
            form_count: 0,
            hoist_headers,
        };

        let tree = document.tree_mut();
        for child in tree.child_ids(tree.root()) {
            builder.visit(tree, child, None);
        }
        for node in std::mem::take(&mut builder.doomed) {
            tree.detach(node);
        }

        let index = builder.index;
        tracing::debug!(
            "Indexed {} vars, {} choices, {} repeats, {} header entries",
            index.vars.len(),
            index.choices.len(),
            index.repeats.len(),
            index.header_queue.len()
        );
        index
    }

    /// Point every reference to `old` at `new`
    pub(crate) fn rebind(&mut self, old: NodeId, new: NodeId) {
        let lists = self
            .vars
            .values_mut()
            .chain(self.choices.values_mut())
            .chain(self.form_elements.values_mut().flat_map(|f| f.values_mut()));
        for list in lists {
            for id in list.iter_mut().filter(|id| **id == old) {
                *id = new;
            }
        }
        for id in self.ids.values_mut().chain(self.forms.values_mut()) {
            if *id == old {
                *id = new;
            }
        }
        for anchor in [&mut self.head, &mut self.title, &mut self.body] {
            if *anchor == Some(old) {
                *anchor = Some(new);
            }
        }
    }
}

fn register(map: &mut HashMap<String, Vec<NodeId>>, name: &str, id: NodeId) {
    let list = map.entry(name.to_string()).or_default();
    if !list.contains(&id) {
        list.push(id);
    }
}

struct Builder<'a> {
    index: RegionIndex,
    config: &'a Config,
    url: String,
    /// Header nodes to detach once the walk is over
    doomed: Vec<NodeId>,
    form_count: usize,
    hoist_headers: bool,
}

impl Builder<'_> {
    fn visit(&mut self, tree: &mut DomTree, id: NodeId, form_scope: Option<&str>) {
        let Some(tag) = tree.tag_name(id).map(str::to_ascii_lowercase) else {
            return;
        };

        if let Some(name) = tree.remove_attr(id, REPEAT_ATTR) {
            self.extract_repeat(tree, id, name.trim());
            return;
        }

        if let Some(names) = tree.remove_attr(id, VAR_ATTR) {
            for name in names.split_whitespace() {
                register(&mut self.index.vars, name, id);
            }
        }

        if let Some(names) = tree.remove_attr(id, CHOICE_ATTR) {
            for name in names.split_whitespace() {
                register(&mut self.index.choices, name, id);
                register(&mut self.index.vars, name, id);
            }
            tree.set_attr(id, &self.config.hidden_attribute, "");
        }

        if let Some(value) = tree.attr(id, "id") {
            self.index.ids.entry(value.to_string()).or_insert(id);
        }

        let mut scope = form_scope.map(str::to_string);
        if tag == "form" {
            let key = tree
                .attr(id, "id")
                .or_else(|| tree.attr(id, "name"))
                .map(str::to_string)
                .unwrap_or_else(|| self.form_count.to_string());
            self.form_count += 1;
            self.index.forms.entry(key.clone()).or_insert(id);
            scope = Some(key);
        } else if let Some(form) = form_scope {
            if FIELD_TAGS.contains(&tag.as_str()) {
                if let Some(field) = tree.attr(id, "name").or_else(|| tree.attr(id, "id")) {
                    let fields = self.index.form_elements.entry(form.to_string()).or_default();
                    register(fields, field, id);
                }
            }
        }

        match tag.as_str() {
            "head" if self.index.head.is_none() => self.index.head = Some(id),
            "title" if self.index.title.is_none() => self.index.title = Some(id),
            "body" if self.index.body.is_none() => self.index.body = Some(id),
            _ => {}
        }

        if self.hoists_headers() && HEAD_TAGS.contains(&tag.as_str()) {
            if tree.remove_attr(id, &self.config.ignore_attribute).is_none() {
                self.extract_header(tree, id, &tag);
                return;
            }
        }

        for child in tree.child_ids(id) {
            self.visit(tree, child, scope.as_deref());
        }
    }

    fn hoists_headers(&self) -> bool {
        self.hoist_headers && self.index.head.is_none()
    }

    /// Move a repeat subtree into its own document, leaving an empty placeholder
    fn extract_repeat(&mut self, tree: &mut DomTree, id: NodeId, name: &str) {
        tree.set_attr(id, &self.config.placeholder_attribute, name);
        if name.is_empty() || self.index.repeats.contains_key(name) {
            tracing::warn!("Ignoring repeat {:?} in {}: empty or duplicate name", name, self.url);
            return;
        }

        let mut fragment = Document::empty(&self.url);
        let fragment_tree = fragment.tree_mut();
        let copy = fragment_tree.import_node(tree, id);
        fragment_tree.remove_attr(copy, &self.config.placeholder_attribute);
        let names = match fragment_tree.attr(copy, VAR_ATTR) {
            Some(existing) => format!("{name} {existing}"),
            None => name.to_string(),
        };
        fragment_tree.set_attr(copy, VAR_ATTR, names);
        let root = fragment_tree.root();
        fragment_tree.append_child(root, copy);

        tree.clear_children(id);

        let repeat = Repeat::new(name, fragment, id, self.config.clone(), self.hoists_headers());
        self.index.repeats.insert(name.to_string(), repeat);
    }

    fn extract_header(&mut self, tree: &DomTree, id: NodeId, tag: &str) {
        let Some(elem) = tree.get(id).and_then(Node::as_element) else {
            return;
        };
        let entry = HeaderEntry {
            tag: tag.to_string(),
            attrs: elem
                .attrs
                .iter()
                .map(|a| (a.name.clone(), a.value.clone()))
                .collect(),
            value: tree.text_content(id),
            anchor: None,
        };
        self.index.header_queue.push(entry);
        self.doomed.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index(html: &str) -> (Document, RegionIndex) {
        let mut doc = stencil_html::parse(html).unwrap();
        let index = RegionIndex::build(&mut doc, &Config::default());
        (doc, index)
    }

    #[test]
    fn test_var_split_on_whitespace() {
        let (doc, index) = index(r#"<p var="a  b">x</p><span var="a"></span>"#);
        assert_eq!(index.vars["a"].len(), 2);
        assert_eq!(index.vars["b"].len(), 1);
        assert_eq!(index.vars["a"][0], index.vars["b"][0]);
        assert!(doc.tree().attr(index.vars["a"][0], "var").is_none());
    }

    #[test]
    fn test_choice_is_var_and_hidden() {
        let (doc, index) = index(r#"<p choice="x" var="y">x</p>"#);
        let node = index.choices["x"][0];
        assert_eq!(index.vars["x"], vec![node]);
        assert_eq!(index.vars["y"], vec![node]);
        assert!(doc.tree().attr(node, "data-stencil-hidden").is_some());
        assert!(doc.tree().attr(node, "choice").is_none());
    }

    #[test]
    fn test_first_id_wins() {
        let (doc, index) = index(r#"<p id="a">1</p><p id="a">2</p>"#);
        assert_eq!(doc.get_element_by_id("a"), Some(index.ids["a"]));
        assert_eq!(doc.tree().text_content(index.ids["a"]), "1");
    }

    #[test]
    fn test_repeat_leaves_placeholder() {
        let (doc, index) = index(r#"<ul><li repeat="item"><a var="url">x</a></li></ul>"#);
        let repeat = &index.repeats["item"];
        let placeholder = repeat.placeholder();
        assert!(doc.tree().child_ids(placeholder).is_empty());
        assert_eq!(doc.tree().attr(placeholder, "data-stencil-repeat"), Some("item"));
        // Inner var belongs to the repeat, not the parent
        assert!(!index.vars.contains_key("url"));
        assert!(repeat.has_var("url"));
        assert!(repeat.has_var("item"));
    }

    #[test]
    fn test_forms() {
        let (_, index) = index(
            r#"<form name="login"><input name="user"><input id="pw"><select name="user"></select></form>
               <form><button name="go"></button></form>"#,
        );
        assert!(index.forms.contains_key("login"));
        assert_eq!(index.form_elements["login"]["user"].len(), 2);
        assert_eq!(index.form_elements["login"]["pw"].len(), 1);
        assert_eq!(index.form_elements["1"]["go"].len(), 1);
    }

    #[test]
    fn test_header_extraction_before_head_only() {
        let (doc, index) = index(
            r#"<script src="a.js"></script><style data-stencil-ignore>p{}</style><div></div>"#,
        );
        assert_eq!(index.header_queue.len(), 1);
        let tags: Vec<_> = doc
            .root_elements()
            .into_iter()
            .filter_map(|id| doc.tree().tag_name(id).map(str::to_string))
            .collect();
        assert_eq!(tags, vec!["style", "div"]);
        let style = doc.root_elements()[0];
        assert!(doc.tree().attr(style, "data-stencil-ignore").is_none());
    }

    #[test]
    fn test_document_scripts_stay_put() {
        let (_, index) = index(
            "<html><head><title>T</title><script src=\"a.js\"></script></head><body><script>x()</script></body></html>",
        );
        assert!(index.header_queue.is_empty());
        assert!(index.head.is_some());
        assert!(index.title.is_some());
        assert!(index.body.is_some());
    }
}
