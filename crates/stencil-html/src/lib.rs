//! Stencil HTML
//!
//! Parser adapter built on html5ever plus the matching serializer.
//! The parser is permissive; only input that yields no element at all
//! is rejected.

mod error;
mod parser;
mod serializer;
mod sink;

pub use error::{Diagnostic, ParseError, numbered_listing};
pub use parser::HtmlParser;
pub use serializer::{HtmlSerializer, VOID_ELEMENTS, get_inner_html, get_outer_html, strip_cdata_markers};
pub use stencil_dom::{Document, DomTree, Node, NodeId};

/// Parse a template source into a Document
pub fn parse(html: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse(html)
}

/// Parse a template source with a name used in diagnostics
pub fn parse_with_url(html: &str, url: &str) -> Result<Document, ParseError> {
    HtmlParser::new().parse_with_url(html, url)
}

/// Parse a markup fragment; never fails
pub fn parse_fragment(html: &str) -> Document {
    HtmlParser::new().parse_fragment(html)
}

/// Parse a markup fragment as the content of a `context` element
pub fn parse_fragment_in(html: &str, context: &str) -> Document {
    HtmlParser::new().parse_fragment_in(html, context)
}
