//! Error types of the template engine
//!
//! Only the initial load can fail loudly. Fragment failures after that are
//! recorded on the template and rendering carries on without them.

pub use stencil_html::{Diagnostic, ParseError};

/// A fragment write that was skipped
#[derive(Debug, thiserror::Error)]
#[error("{operation} on {target} skipped: {source}")]
pub struct FragmentError {
    /// Mutation that was attempted, e.g. `replace_html`
    pub operation: &'static str,
    /// Region name or node the write was aimed at
    pub target: String,
    #[source]
    pub source: ParseError,
}

/// A style compiler backend failed
#[derive(Debug, thiserror::Error)]
pub enum StyleCompileError {
    #[error("Unsupported style language: {0}")]
    Unsupported(String),

    #[error("Compile error in {origin}: {message}")]
    Compile { origin: String, message: String },
}
