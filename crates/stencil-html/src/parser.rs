//! HTML5 Parser adapter
//!
//! Uses html5ever's RcDom and converts it to our DOM format.
//! Template sources are usually fragments, so unless the markup names
//! `<html>`, `<head>`, `<body>` or carries an HTML5 doctype, the implied
//! html/head/body wrappers html5ever adds are peeled off again.
//! Markup written into an existing element is parsed with that element as
//! the fragment context, so `<tr>` survives insertion into a `<tbody>`.

use std::path::Path;

use html5ever::tendril::TendrilSink;
use html5ever::tokenizer::TokenizerOpts;
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::{LocalName, Namespace, ParseOpts, QualName, parse_document, parse_fragment};
use markup5ever_rcdom::{Handle, NodeData as RcNodeData};
use stencil_dom::{Document, DomTree, NodeId};

use crate::error::{Diagnostic, ParseError, numbered_listing};
use crate::sink::LineTrackingSink;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// HTML5 parser
#[derive(Debug, Default, Clone, Copy)]
pub struct HtmlParser;

/// How the source is mapped onto the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode<'a> {
    Document,
    Fragment,
    /// Children of an element with this tag name
    Context(&'a str),
}

impl HtmlParser {
    /// Create a new HTML parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a template source into a Document
    pub fn parse(&self, html: &str) -> Result<Document, ParseError> {
        self.parse_with_url(html, "about:blank")
    }

    /// Parse a template source, naming it for diagnostics
    pub fn parse_with_url(&self, html: &str, url: &str) -> Result<Document, ParseError> {
        tracing::debug!("Parsing template source: {}", url);

        let trimmed = html.trim();
        if !trimmed.starts_with('<') {
            return Err(ParseError::NotMarkup {
                preview: trimmed.chars().take(40).collect(),
            });
        }

        let body = strip_xml_declaration(trimmed);
        let (html5, body) = strip_html5_doctype(body);
        let mode = if html5 || has_document_tag(body) {
            Mode::Document
        } else {
            Mode::Fragment
        };

        let (mut document, diagnostics) = self.build(body, url, mode);
        document.set_html5(html5);

        if document.root_elements().is_empty() {
            return Err(ParseError::Malformed {
                source_name: url.to_string(),
                diagnostics,
                listing: numbered_listing(html),
            });
        }
        for diagnostic in &diagnostics {
            tracing::debug!("{}: {}", url, diagnostic);
        }

        tracing::debug!("Parsed {} nodes", document.tree().len());
        Ok(document)
    }

    /// Parse a markup fragment for insertion into an existing template.
    ///
    /// Text-only and empty fragments are accepted.
    pub fn parse_fragment(&self, html: &str) -> Document {
        self.parse_fragment_in(html, "body")
    }

    /// Parse a markup fragment as the content of a `context` element
    pub fn parse_fragment_in(&self, html: &str, context: &str) -> Document {
        let context = match context.to_ascii_lowercase().as_str() {
            "" | "html" | "head" => "body".to_string(),
            other => other.to_string(),
        };
        let (document, diagnostics) = self.build(html, "about:blank", Mode::Context(&context));
        for diagnostic in &diagnostics {
            tracing::trace!("fragment in <{}>: {}", context, diagnostic);
        }
        document
    }

    /// Read and parse a template file
    pub fn parse_file(&self, path: &Path) -> Result<Document, ParseError> {
        let source = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_with_url(&source, &path.display().to_string())
    }

    fn build(&self, html: &str, url: &str, mode: Mode<'_>) -> (Document, Vec<Diagnostic>) {
        // Templates are never executed, so <noscript> content is markup
        let opts = ParseOpts {
            tokenizer: TokenizerOpts {
                exact_errors: true,
                ..Default::default()
            },
            tree_builder: TreeBuilderOpts {
                exact_errors: true,
                scripting_enabled: false,
                ..Default::default()
            },
        };
        let sink = match mode {
            Mode::Document | Mode::Fragment => parse_document(LineTrackingSink::default(), opts).one(html),
            Mode::Context(tag) => {
                let context = QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag));
                parse_fragment(LineTrackingSink::default(), opts, context, Vec::new(), false).one(html)
            }
        };
        let (dom, diagnostics) = sink.into_parts();

        let mut document = Document::empty(url);
        let root = document.tree().root();
        match mode {
            Mode::Document => self.convert_node(&dom.document, document.tree_mut(), root),
            Mode::Fragment => self.convert_fragment(&dom.document, document.tree_mut(), root),
            Mode::Context(_) => self.convert_context_fragment(&dom.document, document.tree_mut(), root),
        }
        (document, diagnostics)
    }

    /// html5ever puts a context fragment under a synthetic `<html>` root
    fn convert_context_fragment(&self, document: &Handle, tree: &mut DomTree, root: NodeId) {
        for child in document.children.borrow().iter() {
            match &child.data {
                RcNodeData::Element { name, .. } if name.local.as_ref() == "html" => {
                    for node in child.children.borrow().iter() {
                        self.convert_node(node, tree, root);
                    }
                }
                _ => self.convert_node(child, tree, root),
            }
        }
    }

    /// Move the content html5ever placed in the implied head and body to the root
    fn convert_fragment(&self, document: &Handle, tree: &mut DomTree, root: NodeId) {
        for child in document.children.borrow().iter() {
            match &child.data {
                RcNodeData::Element { name, .. } if name.local.as_ref() == "html" => {
                    for section in child.children.borrow().iter() {
                        if let RcNodeData::Element { .. } = section.data {
                            for node in section.children.borrow().iter() {
                                self.convert_node(node, tree, root);
                            }
                        } else {
                            self.convert_node(section, tree, root);
                        }
                    }
                }
                RcNodeData::Doctype { .. } => {}
                _ => self.convert_node(child, tree, root),
            }
        }
    }

    /// Convert an RcDom node to our DOM format
    fn convert_node(&self, handle: &Handle, tree: &mut DomTree, parent: NodeId) {
        match &handle.data {
            RcNodeData::Document => {
                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, parent);
                }
            }
            RcNodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                let id = tree.create_doctype(name, public_id, system_id);
                tree.append_child(parent, id);
            }
            RcNodeData::Text { contents } => {
                let id = tree.create_text(&contents.borrow());
                tree.append_child(parent, id);
            }
            RcNodeData::Comment { contents } => {
                let id = tree.create_comment(contents);
                tree.append_child(parent, id);
            }
            RcNodeData::Element {
                name,
                attrs,
                template_contents,
                ..
            } => {
                let id = tree.create_element(name.local.as_ref());

                for attr in attrs.borrow().iter() {
                    let attr_name = match &attr.name.prefix {
                        Some(prefix) => format!("{}:{}", prefix, attr.name.local),
                        None => attr.name.local.to_string(),
                    };
                    tree.set_attr(id, &attr_name, attr.value.to_string());
                }
                tree.append_child(parent, id);

                for child in handle.children.borrow().iter() {
                    self.convert_node(child, tree, id);
                }
                // <template> children live in a separate fragment
                if let Some(contents) = template_contents.borrow().as_ref() {
                    for child in contents.children.borrow().iter() {
                        self.convert_node(child, tree, id);
                    }
                }
            }
            RcNodeData::ProcessingInstruction { .. } => {
                // Not produced for HTML input
            }
        }
    }
}

/// Drop a leading `<?xml ... ?>` declaration
fn strip_xml_declaration(source: &str) -> &str {
    if source.starts_with("<?xml") {
        if let Some(end) = source.find("?>") {
            return source[end + 2..].trim_start();
        }
    }
    source
}

/// Detect and drop a leading `<!doctype html>`, case-insensitively
fn strip_html5_doctype(source: &str) -> (bool, &str) {
    let Some(end) = source.find('>') else {
        return (false, source);
    };
    let declaration = source[..end].to_ascii_lowercase();
    let words: Vec<&str> = declaration.split_whitespace().collect();
    if words == ["<!doctype", "html"] {
        (true, source[end + 1..].trim_start())
    } else {
        (false, source)
    }
}

/// Whether the source names one of the document structure tags
fn has_document_tag(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    ["<html", "<head", "<body"].iter().any(|tag| {
        lower.match_indices(tag).any(|(pos, _)| {
            matches!(
                lower.as_bytes().get(pos + tag.len()),
                Some(b'>' | b'/' | b' ' | b'\t' | b'\n' | b'\r')
            )
        })
    })
}
