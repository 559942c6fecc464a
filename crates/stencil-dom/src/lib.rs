//! Stencil DOM - Document Object Model
//!
//! Arena-backed DOM tree shared by the parser adapter, the template
//! engine and the filter pipeline.

mod attributes;
mod document;
mod node;
mod tree;

pub use attributes::{Attr, Attributes};
pub use document::Document;
pub use node::{ElementData, Node, NodeData, TextData};
pub use tree::{Children, DomTree};

/// Node identifier (index into arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Root node ID
    pub const ROOT: NodeId = NodeId(0);
    /// Absent node
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> Option<usize> {
        self.is_valid().then_some(self.0 as usize)
    }
}
