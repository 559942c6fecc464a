//! Resolves relative links against a base URL

use stencil_dom::NodeId;
use url::Url;

use crate::filter::{Filter, FilterContext};

/// Attributes rewritten by default
pub const URL_ATTRIBUTES: &[&str] = &["href", "src", "action"];

/// Rewrites relative `href`/`src`/`action` values to absolute URLs.
///
/// Absolute URLs and fragment-only links (`#top`) are left alone.
#[derive(Debug, Clone)]
pub struct PathRewriteFilter {
    base: Url,
    attributes: Vec<String>,
    enabled: bool,
    rewritten: usize,
}

impl PathRewriteFilter {
    pub fn new(base: Url) -> Self {
        Self {
            base,
            attributes: URL_ATTRIBUTES.iter().map(|a| a.to_string()).collect(),
            enabled: true,
            rewritten: 0,
        }
    }

    /// Parse `base`; fails on anything that is not an absolute URL
    pub fn parse(base: &str) -> Result<Self, url::ParseError> {
        Ok(Self::new(Url::parse(base)?))
    }

    /// Replace the set of rewritten attributes
    pub fn with_attributes(mut self, attributes: &[&str]) -> Self {
        self.attributes = attributes.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Values rewritten in the last run
    pub fn rewritten(&self) -> usize {
        self.rewritten
    }

    fn resolve(&self, value: &str) -> Option<String> {
        let value = value.trim();
        if value.is_empty() || value.starts_with('#') {
            return None;
        }
        match Url::parse(value) {
            Ok(_) => None,
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.join(value).ok().map(String::from)
            }
            Err(err) => {
                tracing::debug!("Leaving unparsable URL {:?}: {}", value, err);
                None
            }
        }
    }
}

impl Filter for PathRewriteFilter {
    fn name(&self) -> &str {
        "path-rewrite"
    }

    fn init(&mut self, _ctx: &mut FilterContext<'_>) {
        self.rewritten = 0;
        self.enabled = !self.base.cannot_be_a_base();
        if !self.enabled {
            tracing::debug!("Base {} cannot resolve relative URLs, filter disabled", self.base);
        }
    }

    fn execute_node(&mut self, ctx: &mut FilterContext<'_>, node: NodeId) {
        for name in &self.attributes {
            let Some(resolved) = ctx.tree().attr(node, name).and_then(|v| self.resolve(v)) else {
                continue;
            };
            ctx.tree_mut().set_attr(node, name, resolved);
            self.rewritten += 1;
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}
