//! Markup configuration for the binding engine
//!
//! All reserved attribute names the engine recognizes — the directive
//! namespace, the template marker, the table header key marker and the
//! generated anchor attribute — come from a [`MarkupConfig`]. The defaults
//! cover normal use; a TOML file can rebrand the vocabulary for host
//! applications that already reserve `data-weft-*`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading or parsing a markup configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Reserved markup vocabulary and binding policy
#[derive(Debug, Clone)]
pub struct MarkupConfig {
    /// Directive attribute namespace (`<namespace>:<property>`)
    pub namespace: String,
    /// Attribute marking an element as a template
    pub template_attr: String,
    /// Attribute on header cells supplying the canonical column key
    pub key_attr: String,
    /// Attribute injected on anchor parents that lack an id of their own
    pub anchor_attr: String,
    /// When set, a keyed bind that matches nothing raises `BoundDataNotSet`
    pub strict: bool,
}

/// TOML structure for deserializing configurations
#[derive(Deserialize)]
struct TomlConfig {
    markup: Option<TomlMarkup>,
    binding: Option<TomlBinding>,
}

#[derive(Deserialize)]
struct TomlMarkup {
    attributes: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct TomlBinding {
    strict: Option<bool>,
}

impl MarkupConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load configuration from a TOML string
    ///
    /// Recognized keys, all optional:
    ///
    /// ```toml
    /// [markup.attributes]
    /// namespace = "data-bind"
    /// template = "data-template"
    /// key = "data-key"
    /// anchor = "data-anchor"
    ///
    /// [binding]
    /// strict = true
    /// ```
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let parsed: TomlConfig = toml::from_str(content)?;
        let mut config = Self::default();

        if let Some(attrs) = parsed.markup.and_then(|m| m.attributes) {
            if let Some(v) = attrs.get("namespace") {
                config.namespace = v.clone();
            }
            if let Some(v) = attrs.get("template") {
                config.template_attr = v.clone();
            }
            if let Some(v) = attrs.get("key") {
                config.key_attr = v.clone();
            }
            if let Some(v) = attrs.get("anchor") {
                config.anchor_attr = v.clone();
            }
        }
        if let Some(binding) = parsed.binding {
            if let Some(strict) = binding.strict {
                config.strict = strict;
            }
        }

        Ok(config)
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// The full attribute name for a directive property, e.g. `data-weft:text`
    pub fn directive_attr(&self, property: &str) -> String {
        format!("{}:{}", self.namespace, property)
    }

    /// Whether an attribute name belongs to the directive namespace
    ///
    /// Matches both the bare namespace (invalid, but recognized so it can be
    /// reported) and `namespace:property` forms.
    pub fn is_directive_attr(&self, attr: &str) -> bool {
        attr == self.namespace || attr.starts_with(&format!("{}:", self.namespace))
    }

    /// Whether an attribute is part of the reserved vocabulary and should be
    /// stripped by cleanup
    pub fn is_reserved_attr(&self, attr: &str) -> bool {
        self.is_directive_attr(attr)
            || attr == self.template_attr
            || attr == self.key_attr
            || attr == self.anchor_attr
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            namespace: "data-weft".to_string(),
            template_attr: "data-weft-template".to_string(),
            key_attr: "data-weft-key".to_string(),
            anchor_attr: "data-weft-anchor".to_string(),
            strict: false,
        }
    }
}
