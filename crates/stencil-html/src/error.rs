//! Parse errors and diagnostics

use std::fmt;
use std::path::PathBuf;

/// One message reported by the underlying parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line, 0 when the parser gave no position
    pub line: u64,
    /// 1-based column, 0 when unknown (html5ever reports lines only)
    pub column: u64,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.line == 0 {
            write!(f, "{}", self.message)
        } else if self.column == 0 {
            write!(f, "line {}: {}", self.line, self.message)
        } else {
            write!(f, "{}:{}: {}", self.line, self.column, self.message)
        }
    }
}

/// Markup could not be turned into a document
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Input is not markup (must start with '<'): {preview:?}")]
    NotMarkup { preview: String },

    #[error("Malformed markup in {source_name}:\n{}\n{listing}", join_diagnostics(.diagnostics))]
    Malformed {
        source_name: String,
        diagnostics: Vec<Diagnostic>,
        listing: String,
    },

    #[error("Expected exactly one root element, found {found}")]
    NoSingleRoot { found: usize },

    #[error("Cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    if diagnostics.is_empty() {
        return "(no parser diagnostics)".to_string();
    }
    diagnostics
        .iter()
        .map(Diagnostic::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line-numbered dump of the input, used in error reports
pub fn numbered_listing(source: &str) -> String {
    let mut out = String::new();
    for (n, line) in source.lines().enumerate() {
        out.push_str(&format!("{:>4}: {}\n", n + 1, line));
    }
    out
}
