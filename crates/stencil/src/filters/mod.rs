//! Built-in filters

mod comment_strip;
mod path_rewrite;
mod script_reorder;
mod style_compile;

pub use comment_strip::CommentStripFilter;
pub use path_rewrite::{PathRewriteFilter, URL_ATTRIBUTES};
pub use script_reorder::ScriptReorderFilter;
#[cfg(feature = "lightningcss")]
pub use style_compile::LightningCssCompiler;
pub use style_compile::{StyleCompileFilter, StyleCompiler, style_language};
