//! Weft - declarative data binding for HTML documents
//!
//! This library projects structured data (scalars, key-value maps, lists,
//! nested lists, tabular data) onto a mutable HTML tree, driven entirely by
//! directives and `{{key}}` placeholders already present in the markup.
//!
//! # Example
//!
//! ```rust
//! use weft::{BindValue, Binder};
//!
//! let mut binder = Binder::from_html(
//!     "<ul><li data-weft-template data-weft:text>Item</li></ul>",
//! )
//! .unwrap();
//!
//! let ul = binder.document().first_by_tag("ul").unwrap();
//! let items = vec![BindValue::from("Eggs"), BindValue::from("Butter")];
//! let count = binder.bind_list(&items, Some(&ul), None).unwrap();
//! assert_eq!(count, 2);
//!
//! binder.cleanup();
//! assert!(binder.to_html().contains("<li>Eggs</li><li>Butter</li>"));
//! ```

pub mod binding;
pub mod config;
pub mod dom;
pub mod error;
pub mod template;

pub use binding::value::{Bindable, BindValue};
pub use config::{ConfigError, MarkupConfig};
pub use dom::{Document, Handle};
pub use error::{BindError, Result};
pub use template::{TemplateInstance, TemplateRegistry};

use binding::placeholder::PlaceholderEngine;
use binding::{directive, list, table};

/// The binding session façade
///
/// Owns the parsed document and all per-session state: the template
/// registry (built by a one-time extraction pass at construction, before
/// any bind call) and the placeholder index. Nothing is shared between
/// `Binder` instances, so independent documents in one process never
/// interfere.
pub struct Binder {
    document: Document,
    config: MarkupConfig,
    templates: TemplateRegistry,
    placeholders: PlaceholderEngine,
}

impl Binder {
    /// Parse markup and prepare it for binding with the default vocabulary
    pub fn from_html(html: &str) -> Result<Self> {
        Self::from_html_with_config(html, MarkupConfig::default())
    }

    /// Parse markup and prepare it for binding
    ///
    /// Templates are extracted first, then the remaining document is
    /// scanned for placeholders; prototypes keep their raw markers so each
    /// inserted clone can be scanned on its own.
    pub fn from_html_with_config(html: &str, config: MarkupConfig) -> Result<Self> {
        let document = Document::parse(html)?;
        let templates = TemplateRegistry::extract(&document.root(), &config);
        let mut placeholders = PlaceholderEngine::new();
        placeholders.scan(&document.root());
        Ok(Self {
            document,
            config,
            templates,
            placeholders,
        })
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }

    pub fn templates(&self) -> &TemplateRegistry {
        &self.templates
    }

    /// Bind a value across the whole document
    ///
    /// `key == None` is a keyless bind: it applies only to directives with
    /// an empty stored value.
    pub fn bind(&mut self, key: Option<&str>, value: impl Into<BindValue>) -> Result<()> {
        let root = self.document.root();
        self.bind_in(key, value, &root)
    }

    /// Bind a value within a context element
    ///
    /// Directives and placeholders matching the key are mutated in place;
    /// matching `table` directives dispatch the value to the table binder.
    /// In strict mode a keyed bind that matches nothing raises
    /// [`BindError::BoundDataNotSet`].
    pub fn bind_in(
        &mut self,
        key: Option<&str>,
        value: impl Into<BindValue>,
        context: &Handle,
    ) -> Result<()> {
        let value = value.into();
        let outcome = directive::apply_directives(key, &value, context, &self.config)?;
        let mut matched = outcome.matched;
        if let Some(k) = key {
            matched += self.placeholders.bind(k, &value, context);
        }

        let root = self.document.root();
        for element in outcome.tables {
            table::bind_table_onto(&mut self.templates, &self.config, &root, &value, &element)?;
        }

        if self.config.strict && matched == 0 {
            if let Some(k) = key {
                return Err(BindError::BoundDataNotSet { key: k.to_string() });
            }
        }
        Ok(())
    }

    /// Bind a sequence through the template matching `(context, name)`,
    /// one clone per item
    ///
    /// Without a context the whole document is the context. Returns the
    /// total number of insertions, nested levels included.
    pub fn bind_list(
        &mut self,
        items: &[BindValue],
        context: Option<&Handle>,
        name: Option<&str>,
    ) -> Result<usize> {
        let root = self.document.root();
        let context = context.cloned().unwrap_or_else(|| root.clone());
        list::bind_list(
            &mut self.templates,
            &mut self.placeholders,
            &self.config,
            &root,
            items,
            &context,
            name,
        )
    }

    /// Bind tabular data onto every table in (or at) the context
    pub fn bind_table(&mut self, data: &BindValue, context: Option<&Handle>) -> Result<()> {
        let root = self.document.root();
        let context = context.cloned().unwrap_or_else(|| root.clone());
        table::bind_table_onto(&mut self.templates, &self.config, &root, data, &context)
    }

    /// Strip directive, template and anchor markup from the whole document
    ///
    /// Run once binding is final; bind calls after cleanup find nothing to
    /// match.
    pub fn cleanup(&mut self) {
        let root = self.document.root();
        directive::strip_markup(&root, &self.config);
    }

    /// Strip binding markup below a context element only
    pub fn cleanup_in(&mut self, context: &Handle) {
        directive::strip_markup(context, &self.config);
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        self.document.to_html()
    }

    /// Serialize a context element's content only
    pub fn inner_html(&self, context: &Handle) -> String {
        dom::inner_html(context)
    }
}

/// One-shot convenience: bind key-value pairs, clean up, serialize
///
/// # Example
///
/// ```rust
/// use weft::{bind_html, BindValue};
///
/// let html = bind_html(
///     "<h1 data-weft:text=\"title\"></h1><p>{{tagline ?? no tagline}}</p>",
///     &[
///         ("title", BindValue::from("Weft")),
///         ("tagline", BindValue::from("weaving data into markup")),
///     ],
/// )
/// .unwrap();
///
/// assert!(html.contains("<h1>Weft</h1>"));
/// assert!(html.contains("weaving data into markup"));
/// ```
pub fn bind_html(html: &str, bindings: &[(&str, BindValue)]) -> Result<String> {
    let mut binder = Binder::from_html(html)?;
    for (key, value) in bindings {
        binder.bind(Some(*key), value.clone())?;
    }
    binder.cleanup();
    Ok(binder.to_html())
}
