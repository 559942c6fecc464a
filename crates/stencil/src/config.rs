//! Template Configuration

/// Template configuration options, passed explicitly to every template
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Config {
    /// Remove CDATA wrapper markers from script/style text on output
    pub strip_cdata: bool,

    /// Indent serialized output
    pub pretty_print: bool,

    /// Marker attribute put on hidden var/choice nodes
    pub hidden_attribute: String,

    /// Attribute that keeps script/style/link/meta out of header extraction
    pub ignore_attribute: String,

    /// Marker attribute on repeat placeholders left in the live tree
    pub placeholder_attribute: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strip_cdata: true,
            pretty_print: false,
            hidden_attribute: "data-stencil-hidden".to_string(),
            ignore_attribute: "data-stencil-ignore".to_string(),
            placeholder_attribute: "data-stencil-repeat".to_string(),
        }
    }
}

impl Config {
    /// Serializer matching these options
    pub fn serializer(&self) -> stencil_html::HtmlSerializer {
        stencil_html::HtmlSerializer {
            pretty_print: self.pretty_print,
            strip_cdata: self.strip_cdata,
            ..Default::default()
        }
    }
}
