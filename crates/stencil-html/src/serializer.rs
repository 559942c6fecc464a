//! HTML Serialization
//!
//! Serializes DOM nodes back to markup.
//!
//! - Void elements are written without an end tag; every other element
//!   always gets an explicit close, even when empty (`<div></div>`, never `<div/>`)
//! - Raw-text contents (script, style, xmp, iframe...) are written unescaped;
//!   script and style optionally with CDATA markers removed
//! - A document that was parsed from HTML5 gets its doctype back

use stencil_dom::{Document, DomTree, NodeData, NodeId};

/// HTML serializer
#[derive(Debug, Clone)]
pub struct HtmlSerializer {
    /// Whether to format output with indentation
    pub pretty_print: bool,
    /// Indentation string
    pub indent: String,
    /// Remove `<![CDATA[` and `]]>` from script/style text
    pub strip_cdata: bool,
}

/// Elements that legitimately have no end tag
pub const VOID_ELEMENTS: &[&str] = &[
    "br", "hr", "input", "frame", "img", "area", "link", "col", "base", "basefont", "param",
    "meta",
];

/// Raw text elements (no escaping for content), as html5ever tokenizes them
/// with scripting disabled
const RAW_TEXT_ELEMENTS: &[&str] = &[
    "script", "style", "xmp", "iframe", "noembed", "noframes", "plaintext",
];

/// Raw text elements whose content may carry CDATA guards
const CDATA_ELEMENTS: &[&str] = &["script", "style"];

const HTML5_DOCTYPE: &str = "<!DOCTYPE html>";

impl Default for HtmlSerializer {
    fn default() -> Self {
        Self {
            pretty_print: false,
            indent: "  ".to_string(),
            strip_cdata: true,
        }
    }
}

impl HtmlSerializer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pretty() -> Self {
        Self {
            pretty_print: true,
            ..Self::default()
        }
    }

    /// Serialize a whole document
    pub fn serialize_document(&self, document: &Document) -> String {
        let mut output = String::new();
        if document.is_html5() {
            output.push_str(HTML5_DOCTYPE);
            if self.pretty_print {
                output.push('\n');
            }
        }
        self.serialize_children(document.tree(), document.tree().root(), &mut output, 0);
        output
    }

    /// Serialize innerHTML of a node (children only)
    pub fn serialize_inner(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_children(tree, node_id, &mut output, 0);
        output
    }

    /// Serialize outerHTML of a node (including the node itself)
    pub fn serialize_outer(&self, tree: &DomTree, node_id: NodeId) -> String {
        let mut output = String::new();
        self.serialize_node(tree, node_id, &mut output, 0);
        output
    }

    /// Serialize a node and its descendants
    fn serialize_node(&self, tree: &DomTree, node_id: NodeId, output: &mut String, depth: usize) {
        let Some(node) = tree.get(node_id) else {
            return;
        };

        match &node.data {
            NodeData::Document => {
                self.serialize_children(tree, node_id, output, depth);
            }
            NodeData::Element(elem) => {
                let tag = elem.name.as_str();
                let is_void = VOID_ELEMENTS.iter().any(|v| elem.is(v));
                let is_raw = RAW_TEXT_ELEMENTS.iter().any(|r| elem.is(r));

                self.newline(output, depth);

                output.push('<');
                output.push_str(tag);
                for attr in elem.attrs.iter() {
                    output.push(' ');
                    output.push_str(&attr.name);
                    if !attr.value.is_empty() {
                        output.push_str("=\"");
                        escape_attribute(&attr.value, output);
                        output.push('"');
                    }
                }

                if is_void {
                    output.push_str(" />");
                    return;
                }
                output.push('>');

                if is_raw {
                    let strip = self.strip_cdata && CDATA_ELEMENTS.iter().any(|r| elem.is(r));
                    self.serialize_children_raw(tree, node_id, output, strip);
                } else {
                    self.serialize_children(tree, node_id, output, depth + 1);
                    if node.first_child.is_valid() {
                        self.newline(output, depth);
                    }
                }

                output.push_str("</");
                output.push_str(tag);
                output.push('>');
            }
            NodeData::Text(text) => {
                if self.pretty_print {
                    let trimmed = text.content.trim();
                    if !trimmed.is_empty() {
                        self.newline(output, depth);
                        escape_text(trimmed, output);
                    }
                } else {
                    escape_text(&text.content, output);
                }
            }
            NodeData::Comment(text) => {
                self.newline(output, depth);
                output.push_str("<!--");
                output.push_str(text);
                output.push_str("-->");
            }
            NodeData::Doctype {
                name,
                public_id,
                system_id,
            } => {
                output.push_str("<!DOCTYPE ");
                output.push_str(name);
                if !public_id.is_empty() {
                    output.push_str(" PUBLIC \"");
                    output.push_str(public_id);
                    output.push('"');
                }
                if !system_id.is_empty() {
                    if public_id.is_empty() {
                        output.push_str(" SYSTEM");
                    }
                    output.push_str(" \"");
                    output.push_str(system_id);
                    output.push('"');
                }
                output.push('>');
            }
        }
    }

    fn newline(&self, output: &mut String, depth: usize) {
        if self.pretty_print && !output.is_empty() {
            output.push('\n');
            for _ in 0..depth {
                output.push_str(&self.indent);
            }
        }
    }

    fn serialize_children(&self, tree: &DomTree, parent_id: NodeId, output: &mut String, depth: usize) {
        for (child_id, _) in tree.children(parent_id) {
            self.serialize_node(tree, child_id, output, depth);
        }
    }

    fn serialize_children_raw(&self, tree: &DomTree, parent_id: NodeId, output: &mut String, strip_cdata: bool) {
        for (_child_id, child) in tree.children(parent_id) {
            if let NodeData::Text(text) = &child.data {
                if strip_cdata {
                    output.push_str(&strip_cdata_markers(&text.content));
                } else {
                    output.push_str(&text.content);
                }
            }
        }
    }
}

/// Remove CDATA wrapper markers, including the `//` guards scripts put before them
pub fn strip_cdata_markers(text: &str) -> String {
    let mut out = text.to_string();
    for marker in ["//<![CDATA[", "/*<![CDATA[*/", "<![CDATA[", "//]]>", "/*]]>*/", "]]>"] {
        out = out.replace(marker, "");
    }
    out
}

/// Escape text content for HTML
fn escape_text(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

/// Escape attribute value
fn escape_attribute(text: &str, output: &mut String) {
    for c in text.chars() {
        match c {
            '&' => output.push_str("&amp;"),
            '"' => output.push_str("&quot;"),
            '<' => output.push_str("&lt;"),
            '>' => output.push_str("&gt;"),
            _ => output.push(c),
        }
    }
}

/// Utility: Get innerHTML of an element
pub fn get_inner_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_inner(tree, node_id)
}

/// Utility: Get outerHTML of an element
pub fn get_outer_html(tree: &DomTree, node_id: NodeId) -> String {
    HtmlSerializer::new().serialize_outer(tree, node_id)
}
