//! Template - the document handle
//!
//! A template owns its tree and region index and goes through three states:
//! editable, freezing, frozen. Every mutation is fluent and silently does
//! nothing when the template is frozen or the region does not exist, since
//! optional markup is normal and late calls must be harmless.
//!
//! Freezing happens once, on the first request for the final output:
//! 1. pre-freeze hook
//! 2. pending body templates are appended to `<body>`
//! 3. comments are removed, except conditional comments and those inside
//!    script/style
//! 4. repeat placeholders and hidden var/choice nodes are removed
//! 5. the header queue is written into `<head>`, meta entries first
//! 6. the tree is normalized and marked frozen
//! 7. post-freeze hook

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use stencil_dom::{Document, Node, NodeId};
use stencil_html::{HtmlParser, ParseError};

use crate::header::{HeaderEntry, HeaderQueue};
use crate::index::RegionIndex;
use crate::{Config, FragmentError, Repeat};

/// Freeze hook
pub type Hook = Box<dyn FnMut(&mut Template)>;

/// Render state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderState {
    Editable,
    Freezing,
    Frozen,
}

/// What a mutation is aimed at: a named var or a node of this template
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Var(&'a str),
    Node(NodeId),
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(name: &'a str) -> Self {
        Target::Var(name)
    }
}

impl<'a> From<&'a String> for Target<'a> {
    fn from(name: &'a String) -> Self {
        Target::Var(name)
    }
}

impl From<NodeId> for Target<'_> {
    fn from(id: NodeId) -> Self {
        Target::Node(id)
    }
}

impl fmt::Display for Target<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Var(name) => write!(f, "var {name:?}"),
            Target::Node(id) => write!(f, "node {id:?}"),
        }
    }
}

/// How fragment content lands relative to the target node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Take the node's place
    Replace,
    /// Replace the node's children
    Insert,
    /// Add after the node's children
    Append,
}

impl Placement {
    fn operation(self, kind: &str) -> &'static str {
        match (self, kind) {
            (Placement::Replace, "html") => "replace_html",
            (Placement::Insert, "html") => "insert_html",
            (Placement::Append, "html") => "append_html",
            (Placement::Replace, "document") => "replace_document",
            (Placement::Insert, "document") => "insert_document",
            (Placement::Append, "document") => "append_document",
            (Placement::Replace, _) => "replace_template",
            (Placement::Insert, _) => "insert_template",
            (Placement::Append, _) => "append_template",
        }
    }
}

/// A loaded template
pub struct Template {
    document: Document,
    pub(crate) index: RegionIndex,
    config: Config,
    state: RenderState,
    pub(crate) body_templates: Vec<Template>,
    errors: Vec<FragmentError>,
    before_freeze: Option<Hook>,
    after_freeze: Option<Hook>,
}

impl Template {
    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Parse markup with the default configuration
    pub fn load(markup: &str) -> Result<Self, ParseError> {
        Self::load_with(markup, Config::default())
    }

    pub fn load_with(markup: &str, config: Config) -> Result<Self, ParseError> {
        let document = HtmlParser::new().parse(markup)?;
        Ok(Self::from_document(document, config))
    }

    /// Read and parse a template file
    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, ParseError> {
        Self::load_file_with(path, Config::default())
    }

    pub fn load_file_with(path: impl AsRef<Path>, config: Config) -> Result<Self, ParseError> {
        let document = HtmlParser::new().parse_file(path.as_ref())?;
        Ok(Self::from_document(document, config))
    }

    /// Index an already parsed document
    pub fn from_document(document: Document, config: Config) -> Self {
        Self::from_document_scoped(document, config, true)
    }

    pub(crate) fn from_document_scoped(mut document: Document, config: Config, hoist_headers: bool) -> Self {
        let index = RegionIndex::build_scoped(&mut document, &config, hoist_headers);
        Self {
            document,
            index,
            config,
            state: RenderState::Editable,
            body_templates: Vec::new(),
            errors: Vec::new(),
            before_freeze: None,
            after_freeze: None,
        }
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    /// Current tree; not finalized unless [`Template::finalize`] ran
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// Raw tree access for callers placing nodes themselves
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn is_frozen(&self) -> bool {
        self.state == RenderState::Frozen
    }

    /// Fragment writes that were skipped
    pub fn errors(&self) -> &[FragmentError] {
        &self.errors
    }

    pub fn has_var(&self, name: &str) -> bool {
        self.index.vars.contains_key(name)
    }

    pub fn has_choice(&self, name: &str) -> bool {
        self.index.choices.contains_key(name)
    }

    pub fn has_repeat(&self, name: &str) -> bool {
        self.index.repeats.contains_key(name)
    }

    /// Nodes bound to a var, in document order
    pub fn var_nodes(&self, name: &str) -> &[NodeId] {
        self.index.vars.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn choice_nodes(&self, name: &str) -> &[NodeId] {
        self.index.choices.get(name).map_or(&[], Vec::as_slice)
    }

    /// Element by `id` attribute, first occurrence at index time
    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.index.ids.get(id).copied()
    }

    /// Form by id, name or position
    pub fn form(&self, key: &str) -> Option<NodeId> {
        self.index.forms.get(key).copied()
    }

    /// All fields of a form, keyed by name (or id)
    pub fn form_elements(&self, form: &str) -> Option<&HashMap<String, Vec<NodeId>>> {
        self.index.form_elements.get(form)
    }

    pub fn form_element(&self, form: &str, field: &str) -> &[NodeId] {
        self.index
            .form_elements
            .get(form)
            .and_then(|fields| fields.get(field))
            .map_or(&[], Vec::as_slice)
    }

    pub fn head(&self) -> Option<NodeId> {
        self.index.head
    }

    pub fn body(&self) -> Option<NodeId> {
        self.index.body
    }

    pub fn title(&self) -> Option<NodeId> {
        self.index.title
    }

    /// Pending `<head>` insertions
    pub fn header_queue(&self) -> &HeaderQueue {
        &self.index.header_queue
    }

    pub fn repeat(&self, name: &str) -> Option<&Repeat> {
        self.index.repeats.get(name)
    }

    pub fn repeat_mut(&mut self, name: &str) -> Option<&mut Repeat> {
        self.index.repeats.get_mut(name)
    }

    /// Repeat names, sorted
    pub fn repeat_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.index.repeats.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Attribute of the first node bound to the target
    pub fn attribute<'a>(&self, target: impl Into<Target<'a>>, name: &str) -> Option<&str> {
        let node = *self.lookup(target.into()).first()?;
        self.document.tree().attr(node, name)
    }

    /// Text content of the first node bound to the target
    pub fn text<'a>(&self, target: impl Into<Target<'a>>) -> Option<String> {
        let node = *self.lookup(target.into()).first()?;
        Some(self.document.tree().text_content(node))
    }

    /// Nodes for a target, regardless of state
    fn lookup(&self, target: Target<'_>) -> Vec<NodeId> {
        match target {
            Target::Var(name) => self.index.vars.get(name).cloned().unwrap_or_default(),
            Target::Node(id) if self.document.tree().contains(id) => vec![id],
            Target::Node(_) => Vec::new(),
        }
    }

    /// Nodes a mutation may touch; empty once frozen
    fn resolve(&self, target: Target<'_>) -> Vec<NodeId> {
        if self.is_frozen() {
            return Vec::new();
        }
        self.lookup(target)
    }

    // ------------------------------------------------------------------
    // Visibility
    // ------------------------------------------------------------------

    /// Un-hide a var; any choice of the same name is shown with it
    pub fn show<'a>(&mut self, target: impl Into<Target<'a>>) -> &mut Self {
        self.set_visible(target, true)
    }

    pub fn hide<'a>(&mut self, target: impl Into<Target<'a>>) -> &mut Self {
        self.set_visible(target, false)
    }

    pub fn set_visible<'a>(&mut self, target: impl Into<Target<'a>>, visible: bool) -> &mut Self {
        let target = target.into();
        let mut nodes = self.resolve(target);
        if let (Target::Var(name), false) = (target, self.is_frozen()) {
            for &choice in self.choice_nodes(name) {
                if !nodes.contains(&choice) {
                    nodes.push(choice);
                }
            }
        }

        let marker = self.config.hidden_attribute.clone();
        let tree = self.document.tree_mut();
        for node in nodes {
            if visible {
                tree.remove_attr(node, &marker);
            } else {
                tree.set_attr(node, &marker, "");
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Text
    // ------------------------------------------------------------------

    /// Replace the children of every bound node with a text node
    pub fn set_text<'a>(&mut self, target: impl Into<Target<'a>>, text: &str) -> &mut Self {
        let nodes = self.resolve(target.into());
        let tree = self.document.tree_mut();
        for node in nodes {
            tree.clear_children(node);
            let text = tree.create_text(text);
            tree.append_child(node, text);
        }
        self
    }

    pub fn append_text<'a>(&mut self, target: impl Into<Target<'a>>, text: &str) -> &mut Self {
        for node in self.resolve(target.into()) {
            let tree = self.document.tree_mut();
            let text = tree.create_text(text);
            tree.append_child(node, text);
        }
        self
    }

    pub fn prepend_text<'a>(&mut self, target: impl Into<Target<'a>>, text: &str) -> &mut Self {
        for node in self.resolve(target.into()) {
            let tree = self.document.tree_mut();
            let text = tree.create_text(text);
            tree.prepend_child(node, text);
        }
        self
    }

    /// Sets the text of the `<title>` anchor, if there is one
    pub fn set_title(&mut self, text: &str) -> &mut Self {
        match self.index.title {
            Some(title) => self.set_text(title, text),
            None => self,
        }
    }

    // ------------------------------------------------------------------
    // Attributes
    // ------------------------------------------------------------------

    pub fn set_attribute<'a>(&mut self, target: impl Into<Target<'a>>, name: &str, value: &str) -> &mut Self {
        self.set_attributes(target, &[(name, value)])
    }

    pub fn set_attributes<'a>(&mut self, target: impl Into<Target<'a>>, attrs: &[(&str, &str)]) -> &mut Self {
        for node in self.resolve(target.into()) {
            for (name, value) in attrs {
                self.document.tree_mut().set_attr(node, name, *value);
            }
        }
        self
    }

    pub fn remove_attribute<'a>(&mut self, target: impl Into<Target<'a>>, name: &str) -> &mut Self {
        self.remove_attributes(target, &[name])
    }

    pub fn remove_attributes<'a>(&mut self, target: impl Into<Target<'a>>, names: &[&str]) -> &mut Self {
        for node in self.resolve(target.into()) {
            for name in names {
                self.document.tree_mut().remove_attr(node, name);
            }
        }
        self
    }

    // ------------------------------------------------------------------
    // Fragments
    // ------------------------------------------------------------------

    /// Replace the bound node with markup that has exactly one root element
    pub fn replace_html<'a>(&mut self, target: impl Into<Target<'a>>, html: &str) -> &mut Self {
        self.write_markup(target.into(), html, Placement::Replace)
    }

    /// Replace the children of the bound node with markup
    pub fn insert_html<'a>(&mut self, target: impl Into<Target<'a>>, html: &str) -> &mut Self {
        self.write_markup(target.into(), html, Placement::Insert)
    }

    /// Add markup after the children of the bound node
    pub fn append_html<'a>(&mut self, target: impl Into<Target<'a>>, html: &str) -> &mut Self {
        self.write_markup(target.into(), html, Placement::Append)
    }

    pub fn replace_document<'a>(&mut self, target: impl Into<Target<'a>>, document: &Document) -> &mut Self {
        self.write_fragment(target.into(), document, Placement::Replace, "document")
    }

    pub fn insert_document<'a>(&mut self, target: impl Into<Target<'a>>, document: &Document) -> &mut Self {
        self.write_fragment(target.into(), document, Placement::Insert, "document")
    }

    pub fn append_document<'a>(&mut self, target: impl Into<Target<'a>>, document: &Document) -> &mut Self {
        self.write_fragment(target.into(), document, Placement::Append, "document")
    }

    /// Replace the bound node with another template, taking over its header
    /// queue and body templates
    pub fn replace_template<'a>(&mut self, target: impl Into<Target<'a>>, other: Template) -> &mut Self {
        self.write_template(target.into(), other, Placement::Replace)
    }

    pub fn insert_template<'a>(&mut self, target: impl Into<Target<'a>>, other: Template) -> &mut Self {
        self.write_template(target.into(), other, Placement::Insert)
    }

    pub fn append_template<'a>(&mut self, target: impl Into<Target<'a>>, other: Template) -> &mut Self {
        self.write_template(target.into(), other, Placement::Append)
    }

    /// Queue a whole template for the end of `<body>`, merged at freeze time
    pub fn append_body_template(&mut self, other: Template) -> &mut Self {
        if !self.is_frozen() {
            self.body_templates.push(other);
        }
        self
    }

    fn write_markup(&mut self, target: Target<'_>, html: &str, placement: Placement) -> &mut Self {
        let Some(&first) = self.resolve(target).first() else {
            return self;
        };
        // Markup is parsed as the content of the element it lands in
        let tree = self.document.tree();
        let receiver = match placement {
            Placement::Replace => tree.parent(first).unwrap_or(first),
            Placement::Insert | Placement::Append => first,
        };
        let context = tree.tag_name(receiver).unwrap_or("body").to_string();
        let fragment = HtmlParser::new().parse_fragment_in(html, &context);
        self.write_fragment(target, &fragment, placement, "html")
    }

    fn write_template(&mut self, target: Target<'_>, mut other: Template, placement: Placement) -> &mut Self {
        if self.resolve(target).is_empty() {
            return self;
        }
        self.index.header_queue.merge(&other.index.header_queue);
        self.body_templates.append(&mut other.body_templates);
        self.write_fragment(target, &other.document, placement, "template")
    }

    fn write_fragment(
        &mut self,
        target: Target<'_>,
        fragment: &Document,
        placement: Placement,
        kind: &str,
    ) -> &mut Self {
        let nodes = self.resolve(target);
        if nodes.is_empty() {
            return self;
        }

        let source = fragment.tree();
        if placement == Placement::Replace {
            let roots = fragment.root_elements();
            let [root] = roots.as_slice() else {
                self.record(
                    placement.operation(kind),
                    target,
                    ParseError::NoSingleRoot { found: roots.len() },
                );
                return self;
            };
            for old in nodes {
                let hidden = self.document.tree().attr(old, &self.config.hidden_attribute).is_some();
                let tree = self.document.tree_mut();
                let new = tree.import_node(source, *root);
                tree.replace(old, new);
                if hidden {
                    tree.set_attr(new, &self.config.hidden_attribute, "");
                }
                self.index.rebind(old, new);
            }
            return self;
        }

        let top_level = source.child_ids(source.root());
        let tree = self.document.tree_mut();
        for node in nodes {
            if placement == Placement::Insert {
                tree.clear_children(node);
            }
            for &child in &top_level {
                let copy = tree.import_node(source, child);
                tree.append_child(node, copy);
            }
        }
        self
    }

    fn record(&mut self, operation: &'static str, target: Target<'_>, source: ParseError) {
        let error = FragmentError {
            operation,
            target: target.to_string(),
            source,
        };
        tracing::warn!("{}", error);
        self.errors.push(error);
    }

    // ------------------------------------------------------------------
    // Header queue
    // ------------------------------------------------------------------

    /// Queue an element for `<head>`; identical content is queued once
    pub fn append_header(&mut self, tag: &str, attrs: &[(&str, &str)], value: &str) -> &mut Self {
        self.queue_header(HeaderEntry::new(tag, attrs, value))
    }

    /// Queue an element for `<head>`, placed before the element with id `anchor`
    pub fn append_header_before(
        &mut self,
        tag: &str,
        attrs: &[(&str, &str)],
        value: &str,
        anchor: &str,
    ) -> &mut Self {
        self.queue_header(HeaderEntry::new(tag, attrs, value).with_anchor(anchor))
    }

    pub fn append_css_url(&mut self, href: &str) -> &mut Self {
        self.append_header("link", &[("rel", "stylesheet"), ("type", "text/css"), ("href", href)], "")
    }

    pub fn append_css(&mut self, code: &str) -> &mut Self {
        self.append_header("style", &[("type", "text/css")], code)
    }

    pub fn append_js_url(&mut self, src: &str) -> &mut Self {
        self.append_header("script", &[("type", "text/javascript"), ("src", src)], "")
    }

    pub fn append_js(&mut self, code: &str) -> &mut Self {
        self.append_header("script", &[("type", "text/javascript")], code)
    }

    pub fn append_meta(&mut self, attrs: &[(&str, &str)]) -> &mut Self {
        self.append_header("meta", attrs, "")
    }

    fn queue_header(&mut self, entry: HeaderEntry) -> &mut Self {
        if !self.is_frozen() {
            self.index.header_queue.push(entry);
        }
        self
    }

    // ------------------------------------------------------------------
    // Repeats
    // ------------------------------------------------------------------

    /// Copy the repeat's current state into this document, then reset the
    /// repeat so the next iteration starts from the parsed fragment.
    ///
    /// Without a target the copy goes right before the repeat's placeholder,
    /// keeping document order; with one it becomes the last child of the
    /// first node bound to that var. Returns the inserted node, or `None`
    /// when frozen or when the repeat or target does not exist.
    pub fn append_repeat(&mut self, name: &str, target: Option<&str>) -> Option<NodeId> {
        self.materialize(name, target, true)
    }

    /// Prepare an iteration without inserting it.
    ///
    /// The copy is imported into this document and returned detached; unlike
    /// [`Template::append_repeat`] nothing is placed in the tree, so callers
    /// that need it at the front insert it themselves.
    pub fn prepend_repeat(&mut self, name: &str, target: Option<&str>) -> Option<NodeId> {
        self.materialize(name, target, false)
    }

    /// Append an iteration into a var of another repeat of this template.
    ///
    /// Falls back to this template's own var when `destination` does not
    /// define `target`.
    pub fn append_repeat_into(&mut self, name: &str, target: &str, destination: &str) -> Option<NodeId> {
        if name == destination {
            return self.append_repeat(name, Some(target));
        }
        let in_destination = self
            .index
            .repeats
            .get(destination)
            .is_some_and(|d| d.has_var(target));
        if !in_destination {
            return self.append_repeat(name, Some(target));
        }
        if self.is_frozen() {
            return None;
        }

        let mut repeat = self.index.repeats.remove(name)?;
        self.absorb_queues(&mut repeat);
        let inserted = self.index.repeats.get_mut(destination).and_then(|dest| {
            let anchor = *dest.var_nodes(target).first()?;
            let tree = dest.document.tree_mut();
            let copy = repeat.import_into(tree)?;
            tree.append_child(anchor, copy);
            Some(copy)
        });
        if inserted.is_some() {
            repeat.reset();
        }
        self.index.repeats.insert(name.to_string(), repeat);
        inserted
    }

    fn materialize(&mut self, name: &str, target: Option<&str>, insert: bool) -> Option<NodeId> {
        if self.is_frozen() {
            return None;
        }
        let mut repeat = self.index.repeats.remove(name)?;
        let result = self.place_iteration(&mut repeat, target, insert);
        if result.is_some() {
            repeat.reset();
        }
        self.index.repeats.insert(name.to_string(), repeat);
        result
    }

    fn place_iteration(&mut self, repeat: &mut Repeat, target: Option<&str>, insert: bool) -> Option<NodeId> {
        let anchor = match target {
            None => repeat.placeholder(),
            Some(var) => *self.index.vars.get(var)?.first()?,
        };
        self.absorb_queues(repeat);

        let tree = self.document.tree_mut();
        let copy = repeat.import_into(tree)?;
        if insert {
            match target {
                None => {
                    let parent = tree.parent(anchor)?;
                    tree.insert_before(parent, copy, anchor);
                }
                Some(_) => tree.append_child(anchor, copy),
            }
        }
        tracing::trace!("Repeat {} iteration -> {:?}", repeat.name(), copy);
        Some(copy)
    }

    /// Pull an iteration's pending header entries and body templates up
    fn absorb_queues(&mut self, repeat: &mut Repeat) {
        self.index.header_queue.merge(&repeat.index.header_queue);
        self.body_templates.append(&mut repeat.body_templates);
    }

    // ------------------------------------------------------------------
    // Freeze and output
    // ------------------------------------------------------------------

    /// Run before the template is frozen; may still mutate it
    pub fn on_before_freeze(&mut self, hook: impl FnMut(&mut Template) + 'static) -> &mut Self {
        self.before_freeze = Some(Box::new(hook));
        self
    }

    /// Run after the template is frozen
    pub fn on_after_freeze(&mut self, hook: impl FnMut(&mut Template) + 'static) -> &mut Self {
        self.after_freeze = Some(Box::new(hook));
        self
    }

    /// Freeze the template (once) and return the final tree
    pub fn finalize(&mut self) -> &Document {
        if self.state != RenderState::Editable {
            return &self.document;
        }
        self.state = RenderState::Freezing;
        tracing::debug!("Freezing template {}", self.document.url());

        if let Some(mut hook) = self.before_freeze.take() {
            hook(self);
            self.before_freeze.get_or_insert(hook);
        }

        let pending = std::mem::take(&mut self.body_templates);
        for template in pending {
            self.absorb_body_template(template);
        }
        self.prune_comments();
        self.sweep_markers();
        self.materialize_headers();

        self.state = RenderState::Frozen;
        let tree = self.document.tree_mut();
        let root = tree.root();
        tree.normalize(root);

        if let Some(mut hook) = self.after_freeze.take() {
            hook(self);
            self.after_freeze.get_or_insert(hook);
        }
        tracing::debug!("Template frozen: {} nodes", self.document.tree().len());
        &self.document
    }

    /// Serialize; with `finalize` the template is frozen first
    pub fn to_html(&mut self, finalize: bool) -> String {
        if finalize {
            self.finalize();
        }
        self.config.serializer().serialize_document(&self.document)
    }

    /// Freeze and serialize
    pub fn render(&mut self) -> String {
        self.to_html(true)
    }

    /// Freeze and hand the document over, e.g. to a [`crate::Modifier`]
    pub fn into_document(mut self) -> Document {
        self.finalize();
        self.document
    }

    fn absorb_body_template(&mut self, mut other: Template) {
        self.index.header_queue.merge(&other.index.header_queue);
        let nested = std::mem::take(&mut other.body_templates);

        let tree = self.document.tree_mut();
        let anchor = self.index.body.unwrap_or(tree.root());
        let source = other.document.tree();
        for child in source.child_ids(source.root()) {
            let copy = tree.import_node(source, child);
            tree.append_child(anchor, copy);
        }

        for template in nested {
            self.absorb_body_template(template);
        }
    }

    fn prune_comments(&mut self) {
        let tree = self.document.tree_mut();
        let doomed: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&id| {
                let Some(text) = tree.get(id).and_then(Node::as_comment) else {
                    return false;
                };
                let conditional = text.trim_start().starts_with("[if ");
                let in_raw_text = tree
                    .parent(id)
                    .and_then(|p| tree.tag_name(p))
                    .is_some_and(|tag| tag.eq_ignore_ascii_case("script") || tag.eq_ignore_ascii_case("style"));
                !conditional && !in_raw_text
            })
            .collect();
        for id in doomed {
            tree.detach(id);
        }
    }

    /// Remove repeat placeholders and hidden nodes, wherever they came from
    fn sweep_markers(&mut self) {
        let hidden = self.config.hidden_attribute.as_str();
        let placeholder = self.config.placeholder_attribute.as_str();
        let tree = self.document.tree_mut();
        let doomed: Vec<NodeId> = tree
            .descendants(tree.root())
            .into_iter()
            .filter(|&id| {
                tree.get(id)
                    .and_then(Node::as_element)
                    .is_some_and(|e| e.has_attr(hidden) || e.has_attr(placeholder))
            })
            .collect();
        for id in doomed {
            tree.detach(id);
        }
    }

    fn materialize_headers(&mut self) {
        let entries: Vec<HeaderEntry> = self
            .index
            .header_queue
            .ordered()
            .into_iter()
            .cloned()
            .collect();
        self.index.header_queue.drain();
        if entries.is_empty() {
            return;
        }

        let title = self.index.title.filter(|&t| self.document.tree().is_attached(t));
        let head = self.index.head.filter(|&h| self.document.tree().is_attached(h));
        let (parent, reference) = {
            let tree = self.document.tree();
            match (title, head) {
                (Some(title), _) => (tree.parent(title).unwrap_or(tree.root()), title),
                (None, Some(head)) => (head, tree.get(head).map_or(NodeId::NONE, |n| n.first_child)),
                (None, None) => (tree.root(), tree.get(tree.root()).map_or(NodeId::NONE, |n| n.first_child)),
            }
        };

        for entry in entries {
            let anchor = entry
                .anchor
                .as_deref()
                .and_then(|id| self.document.get_element_by_id(id));

            let tree = self.document.tree_mut();
            let node = tree.create_element(&entry.tag);
            for (name, value) in &entry.attrs {
                tree.set_attr(node, name, value.as_str());
            }
            if !entry.value.is_empty() {
                let text = tree.create_text(&entry.value);
                tree.append_child(node, text);
            }

            match anchor.and_then(|a| tree.parent(a).map(|p| (p, a))) {
                Some((anchor_parent, anchor)) => tree.insert_before(anchor_parent, node, anchor),
                None => tree.insert_before(parent, node, reference),
            }
        }
    }
}

impl fmt::Debug for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Template")
            .field("url", &self.document.url())
            .field("state", &self.state)
            .field("vars", &self.index.vars.len())
            .field("repeats", &self.repeat_names())
            .field("body_templates", &self.body_templates.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_text_and_attribute() {
        let mut tpl = Template::load(r#"<h1 var="title"></h1>"#).unwrap();
        tpl.set_text("title", "Hi").set_attribute("title", "id", "t1");
        assert_eq!(tpl.render(), r#"<h1 id="t1">Hi</h1>"#);
    }

    #[test]
    fn test_unknown_region_is_noop() {
        let mut tpl = Template::load("<p>x</p>").unwrap();
        tpl.set_text("nope", "y").show("nope").append_html("nope", "<b></b>");
        assert_eq!(tpl.render(), "<p>x</p>");
        assert!(tpl.errors().is_empty());
    }

    #[test]
    fn test_prepend_and_append_text() {
        let mut tpl = Template::load(r#"<p var="p">b</p>"#).unwrap();
        tpl.prepend_text("p", "a").append_text("p", "c");
        assert_eq!(tpl.render(), "<p>abc</p>");
    }

    #[test]
    fn test_node_target_bypasses_index() {
        let mut tpl = Template::load(r#"<p id="x">a</p>"#).unwrap();
        let node = tpl.element_by_id("x").unwrap();
        tpl.set_text(node, "b");
        assert_eq!(tpl.render(), r#"<p id="x">b</p>"#);
    }

    #[test]
    fn test_replace_requires_single_root() {
        let mut tpl = Template::load(r#"<div><p var="p">a</p></div>"#).unwrap();
        tpl.replace_html("p", "<i>1</i><i>2</i>");
        assert_eq!(tpl.errors().len(), 1);
        assert_eq!(tpl.errors()[0].operation, "replace_html");
        assert_eq!(tpl.render(), "<div><p>a</p></div>");
    }

    #[test]
    fn test_replace_rebinds_var() {
        let mut tpl = Template::load(r#"<div><p var="p">a</p></div>"#).unwrap();
        tpl.replace_html("p", "<em>b</em>").set_attribute("p", "class", "c");
        assert_eq!(tpl.render(), r#"<div><em class="c">b</em></div>"#);
    }

    #[test]
    fn test_before_freeze_hook_can_mutate() {
        let mut tpl = Template::load(r#"<p var="p"></p>"#).unwrap();
        tpl.on_before_freeze(|t| {
            t.set_text("p", "late");
        });
        assert_eq!(tpl.render(), "<p>late</p>");
    }

    #[test]
    fn test_reentrant_finalize_returns_early() {
        let mut tpl = Template::load(r#"<p var="p">x</p>"#).unwrap();
        tpl.on_before_freeze(|t| {
            assert_eq!(t.state(), RenderState::Freezing);
            let html = t.to_html(true);
            assert_eq!(html, "<p>x</p>");
        });
        tpl.finalize();
        assert!(tpl.is_frozen());
    }

    #[test]
    fn test_after_freeze_hook_sees_frozen() {
        use std::cell::Cell;
        use std::rc::Rc;

        let seen = Rc::new(Cell::new(false));
        let flag = Rc::clone(&seen);
        let mut tpl = Template::load("<p></p>").unwrap();
        tpl.on_after_freeze(move |t| flag.set(t.is_frozen()));
        tpl.render();
        assert!(seen.get());
    }

    #[test]
    fn test_unfinalized_output_keeps_hidden_nodes() {
        let mut tpl = Template::load(r#"<p choice="x">a</p>"#).unwrap();
        let raw = tpl.to_html(false);
        assert!(raw.contains("data-stencil-hidden"));
        assert!(!tpl.is_frozen());
        assert_eq!(tpl.render(), "");
    }
}
