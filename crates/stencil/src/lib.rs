//! Stencil - logic-less HTML templates
//!
//! Templates are plain HTML. Elements are made addressable with three
//! reserved attributes:
//!
//! - `var="a b"` names a node for text, attribute and fragment writes
//! - `choice="x"` is a var that stays hidden until shown
//! - `repeat="row"` turns a subtree into a fragment rendered once per iteration
//!
//! ```no_run
//! use stencil::Template;
//!
//! let mut page = Template::load(r#"<ul><li repeat="item"><a var="link"></a></li></ul>"#)?;
//! for (href, label) in [("/a", "A"), ("/b", "B")] {
//!     if let Some(item) = page.repeat_mut("item") {
//!         item.set_text("link", label).set_attribute("link", "href", href);
//!     }
//!     page.append_repeat("item", None);
//! }
//! let html = page.render();
//! # Ok::<(), stencil::ParseError>(())
//! ```
//!
//! A rendered [`Document`] can be post-processed by a [`Modifier`] running
//! [`Filter`]s.

mod config;
mod error;
mod filter;
pub mod filters;
mod header;
mod index;
mod modifier;
mod producible;
mod repeat;
mod template;

pub use config::Config;
pub use error::{Diagnostic, FragmentError, ParseError, StyleCompileError};
pub use filter::{Filter, FilterContext};
pub use header::{FINGERPRINT_EXCLUDED, HeaderEntry, HeaderQueue};
pub use index::{CHOICE_ATTR, REPEAT_ATTR, RegionIndex, VAR_ATTR};
pub use modifier::{Modifier, ModifierState};
pub use producible::{FileSource, MarkupSource, Producible};
pub use repeat::Repeat;
pub use template::{Hook, RenderState, Target, Template};

pub use stencil_dom::{Document, DomTree, NodeId};
pub use stencil_html::{HtmlParser, HtmlSerializer};
