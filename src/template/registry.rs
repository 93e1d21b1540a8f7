//! Template registry: whole-document extraction and lookup

use std::collections::HashMap;

use markup5ever_rcdom::Handle;
use tracing::debug;

use crate::config::MarkupConfig;
use crate::dom::path::NodePath;
use crate::dom::tree;
use crate::error::{BindError, Result};

use super::instance::TemplateInstance;

/// Registry of every template extracted from a document
///
/// Built once, before any bind call. Explicitly named templates are indexed
/// by name; unnamed ones are matched structurally against the binding
/// context. Templates are never destroyed during a binding session, so the
/// same template can be bound repeatedly.
pub struct TemplateRegistry {
    named: HashMap<String, TemplateInstance>,
    unnamed: Vec<TemplateInstance>,
    anchor_attr: String,
}

impl TemplateRegistry {
    /// Scan the document, extract every template-marked element and record
    /// its anchor
    ///
    /// Extraction runs innermost-first (descending path depth) so that a
    /// nested template is detached while its ancestors are still in place,
    /// keeping every recorded path valid.
    pub fn extract(root: &Handle, config: &MarkupConfig) -> Self {
        let mut marked: Vec<(Handle, usize)> = tree::descendant_elements(root)
            .into_iter()
            .filter(|el| tree::has_attr(el, &config.template_attr))
            .map(|el| {
                let depth = NodePath::of(&el, &config.anchor_attr).depth();
                (el, depth)
            })
            .collect();
        marked.sort_by(|a, b| b.1.cmp(&a.1));

        let mut named = HashMap::new();
        let mut unnamed = Vec::new();
        let mut anchor_seq = 0;

        for (element, _) in marked {
            let name = tree::get_attr(&element, &config.template_attr)
                .filter(|v| !v.trim().is_empty())
                .map(|v| v.trim().to_string());
            let Some(instance) =
                TemplateInstance::extract(&element, name.clone(), config, &mut anchor_seq)
            else {
                continue;
            };
            match name {
                Some(n) => {
                    named.insert(n, instance);
                }
                None => unnamed.push(instance),
            }
        }

        debug!(
            named = named.len(),
            unnamed = unnamed.len(),
            "template extraction complete"
        );

        Self {
            named,
            unnamed,
            anchor_attr: config.anchor_attr.clone(),
        }
    }

    /// Number of registered templates
    pub fn len(&self) -> usize {
        self.named.len() + self.unnamed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether a template with the explicit name exists
    pub fn contains(&self, name: &str) -> bool {
        self.named.contains_key(name)
    }

    /// All explicit template names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.named.keys().map(|s| s.as_str())
    }

    /// Look up the template for a binding context
    ///
    /// With a name: exact lookup. Without one: the unnamed entry whose
    /// stored path lies on the context's path line and whose anchor still
    /// resolves to a live node reachable from the context. More than one
    /// plausible unnamed candidate is an error; an explicit name must
    /// disambiguate.
    pub fn get_mut(
        &mut self,
        root: &Handle,
        context: &Handle,
        name: Option<&str>,
    ) -> Result<&mut TemplateInstance> {
        match name {
            Some(n) => self
                .named
                .get_mut(n)
                .ok_or_else(|| BindError::TemplateNotFound {
                    name: Some(n.to_string()),
                }),
            None => {
                let index = self.find_unnamed(root, context)?;
                Ok(&mut self.unnamed[index])
            }
        }
    }

    /// Insert one clone of the matching template, returning the clone
    pub fn insert_clone(
        &mut self,
        root: &Handle,
        context: &Handle,
        name: Option<&str>,
    ) -> Result<Handle> {
        self.get_mut(root, context, name)?.insert(root, context)
    }

    fn find_unnamed(&self, root: &Handle, context: &Handle) -> Result<usize> {
        let context_path = NodePath::of(context, &self.anchor_attr);

        // Anchors resolving inside the context vs. anchors enclosing it.
        // A nested template's anchor only goes live once an enclosing clone
        // exists, so both lists can be populated at once; the shallowest
        // inner anchor is the one the context addresses directly, deeper
        // ones belong to nested binds issued from within a clone.
        let mut inner: Vec<(usize, usize)> = Vec::new();
        let mut enclosing: Vec<(usize, usize)> = Vec::new();
        for (i, instance) in self.unnamed.iter().enumerate() {
            if !instance.parent_path().is_related(&context_path) {
                continue;
            }
            let anchors = instance.parent_path().resolve(root);
            let depth = instance.parent_path().depth();
            if anchors.iter().any(|node| tree::contains(context, node)) {
                inner.push((i, depth));
            } else if anchors.iter().any(|node| tree::contains(node, context)) {
                enclosing.push((i, depth));
            }
        }

        if !inner.is_empty() {
            let best = inner.iter().map(|(_, d)| *d).min().unwrap_or(0);
            let at_best: Vec<usize> = inner
                .iter()
                .filter(|(_, d)| *d == best)
                .map(|(i, _)| *i)
                .collect();
            return match at_best.len() {
                1 => Ok(at_best[0]),
                n => Err(BindError::AmbiguousTemplate { candidates: n }),
            };
        }
        if !enclosing.is_empty() {
            let best = enclosing.iter().map(|(_, d)| *d).max().unwrap_or(0);
            let at_best: Vec<usize> = enclosing
                .iter()
                .filter(|(_, d)| *d == best)
                .map(|(i, _)| *i)
                .collect();
            return match at_best.len() {
                1 => Ok(at_best[0]),
                n => Err(BindError::AmbiguousTemplate { candidates: n }),
            };
        }
        Err(BindError::TemplateNotFound { name: None })
    }
}
