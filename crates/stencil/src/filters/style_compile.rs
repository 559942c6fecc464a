//! Style compilation
//!
//! `<style type="text/less">` blocks and `<link rel="stylesheet/scss">`
//! references are handed to a [`StyleCompiler`]. Successful output replaces
//! the source as plain CSS; failures are logged and leave the element as it was.

use stencil_dom::NodeId;

use crate::error::StyleCompileError;
use crate::filter::{Filter, FilterContext};

/// Backend turning a style language into CSS
pub trait StyleCompiler {
    /// Whether `language` (`css`, `less`, `scss`) is handled
    fn supports(&self, language: &str) -> bool;

    /// Compile inline source to CSS
    fn compile(&mut self, language: &str, source: &str, origin: &str) -> Result<String, StyleCompileError>;

    /// Compile a referenced stylesheet, returning the href of the CSS output
    fn compile_link(&mut self, language: &str, href: &str) -> Result<String, StyleCompileError> {
        let _ = href;
        Err(StyleCompileError::Unsupported(language.to_string()))
    }
}

/// Language named by a style `type` or link `rel` value
pub fn style_language(value: &str) -> Option<&'static str> {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "text/css" | "stylesheet" => Some("css"),
        "text/less" | "stylesheet/less" => Some("less"),
        "text/scss" | "text/x-scss" | "stylesheet/scss" => Some("scss"),
        _ => None,
    }
}

/// Runs style elements and stylesheet links through a compiler
pub struct StyleCompileFilter<C> {
    compiler: C,
    origin: String,
    compiled: usize,
    failed: usize,
}

impl<C: StyleCompiler> StyleCompileFilter<C> {
    pub fn new(compiler: C) -> Self {
        Self {
            compiler,
            origin: "inline".to_string(),
            compiled: 0,
            failed: 0,
        }
    }

    /// Name reported with compile errors, usually the template path
    pub fn with_origin(mut self, origin: &str) -> Self {
        self.origin = origin.to_string();
        self
    }

    pub fn compiler(&self) -> &C {
        &self.compiler
    }

    pub fn compiled(&self) -> usize {
        self.compiled
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    fn compile_style(&mut self, ctx: &mut FilterContext<'_>, node: NodeId) {
        let tree = ctx.tree();
        let Some(language) = style_language(tree.attr(node, "type").unwrap_or_default()) else {
            return;
        };
        if !self.compiler.supports(language) {
            return;
        }
        let source = tree.text_content(node);

        match self.compiler.compile(language, &source, &self.origin) {
            Ok(css) => {
                let tree = ctx.tree_mut();
                tree.clear_children(node);
                let text = tree.create_text(&css);
                tree.append_child(node, text);
                if language != "css" {
                    tree.set_attr(node, "type", "text/css");
                }
                self.compiled += 1;
            }
            Err(err) => self.report(err),
        }
    }

    fn compile_link(&mut self, ctx: &mut FilterContext<'_>, node: NodeId) {
        let tree = ctx.tree();
        let Some(rel) = tree.attr(node, "rel") else {
            return;
        };
        let Some(language) = style_language(rel).filter(|l| *l != "css") else {
            return;
        };
        let Some(href) = tree.attr(node, "href").map(str::to_string) else {
            return;
        };
        if !self.compiler.supports(language) {
            return;
        }

        match self.compiler.compile_link(language, &href) {
            Ok(output) => {
                let tree = ctx.tree_mut();
                tree.set_attr(node, "rel", "stylesheet");
                tree.set_attr(node, "href", output);
                self.compiled += 1;
            }
            Err(err) => self.report(err),
        }
    }

    fn report(&mut self, err: StyleCompileError) {
        tracing::warn!("Style compilation failed: {}", err);
        self.failed += 1;
    }
}

impl<C: StyleCompiler> Filter for StyleCompileFilter<C> {
    fn name(&self) -> &str {
        "style-compile"
    }

    fn init(&mut self, _ctx: &mut FilterContext<'_>) {
        self.compiled = 0;
        self.failed = 0;
    }

    fn execute_node(&mut self, ctx: &mut FilterContext<'_>, node: NodeId) {
        match ctx.tree().tag_name(node).map(str::to_ascii_lowercase).as_deref() {
            Some("style") => self.compile_style(ctx, node),
            Some("link") => self.compile_link(ctx, node),
            _ => {}
        }
    }
}

impl<C> std::fmt::Debug for StyleCompileFilter<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StyleCompileFilter")
            .field("origin", &self.origin)
            .field("compiled", &self.compiled)
            .field("failed", &self.failed)
            .finish()
    }
}

/// Minifying plain-CSS backend
#[cfg(feature = "lightningcss")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LightningCssCompiler;

#[cfg(feature = "lightningcss")]
impl StyleCompiler for LightningCssCompiler {
    fn supports(&self, language: &str) -> bool {
        language == "css"
    }

    fn compile(&mut self, language: &str, source: &str, origin: &str) -> Result<String, StyleCompileError> {
        use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};

        if language != "css" {
            return Err(StyleCompileError::Unsupported(language.to_string()));
        }
        let error = |message: String| StyleCompileError::Compile {
            origin: origin.to_string(),
            message,
        };

        let mut sheet = StyleSheet::parse(source, ParserOptions::default()).map_err(|e| error(e.to_string()))?;
        sheet.minify(MinifyOptions::default()).map_err(|e| error(e.to_string()))?;
        let output = sheet
            .to_css(PrinterOptions {
                minify: true,
                ..PrinterOptions::default()
            })
            .map_err(|e| error(e.to_string()))?;
        Ok(output.code)
    }
}
