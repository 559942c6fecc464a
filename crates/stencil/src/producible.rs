//! Template producers
//!
//! Renderers that build their page from a template implement [`Producible`];
//! callers ask for a fresh template without knowing where it comes from.

use std::path::{Path, PathBuf};

use crate::{Config, ParseError, Template};

/// Something that can produce a fresh template on demand
pub trait Producible {
    fn make_template(&self) -> Result<Template, ParseError>;
}

/// Produces templates from markup held in memory
#[derive(Debug, Clone)]
pub struct MarkupSource {
    markup: String,
    config: Config,
}

impl MarkupSource {
    pub fn new(markup: impl Into<String>) -> Self {
        Self::with_config(markup, Config::default())
    }

    pub fn with_config(markup: impl Into<String>, config: Config) -> Self {
        Self {
            markup: markup.into(),
            config,
        }
    }
}

impl Producible for MarkupSource {
    fn make_template(&self) -> Result<Template, ParseError> {
        Template::load_with(&self.markup, self.config.clone())
    }
}

/// Produces templates by reading a file each time
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
    config: Config,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_config(path, Config::default())
    }

    pub fn with_config(path: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Producible for FileSource {
    fn make_template(&self) -> Result<Template, ParseError> {
        Template::load_file_with(&self.path, self.config.clone())
    }
}

impl<P: Producible + ?Sized> Producible for &P {
    fn make_template(&self) -> Result<Template, ParseError> {
        (**self).make_template()
    }
}

impl<P: Producible + ?Sized> Producible for Box<P> {
    fn make_template(&self) -> Result<Template, ParseError> {
        (**self).make_template()
    }
}
