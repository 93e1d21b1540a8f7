//! An extracted template and its insertion anchor

use markup5ever_rcdom::Handle;
use tracing::debug;

use crate::config::MarkupConfig;
use crate::dom::path::{NodePath, PathSegment};
use crate::dom::tree;
use crate::error::{BindError, Result};

/// One extracted template: the detached prototype plus the structural
/// anchor where clones are inserted
///
/// The anchor is deliberately not a live pointer. The parent is recorded as
/// a structural path and re-resolved on every insertion, because an
/// enclosing list bind may have cloned or relocated it since extraction.
#[derive(Debug)]
pub struct TemplateInstance {
    name: Option<String>,
    prototype: Handle,
    element_path: NodePath,
    parent_path: NodePath,
    next_sibling: Option<PathSegment>,
    anchor_attr: String,
    insert_count: usize,
}

impl TemplateInstance {
    /// Capture a template element and detach it from the tree
    ///
    /// Assigns a generated anchor id to the parent when it has neither an
    /// id nor an anchor already, so the recorded path stays unique. Removal
    /// of the original happens exactly once, here; all later insertions use
    /// fresh clones.
    pub fn extract(
        element: &Handle,
        name: Option<String>,
        config: &MarkupConfig,
        anchor_seq: &mut usize,
    ) -> Option<Self> {
        let parent = tree::parent_of(element)?;

        if tree::get_attr(&parent, "id").is_none()
            && tree::get_attr(&parent, &config.anchor_attr).is_none()
        {
            *anchor_seq += 1;
            tree::set_attr(&parent, &config.anchor_attr, &format!("w{anchor_seq}"));
        }

        let element_path = NodePath::of(element, &config.anchor_attr);
        let parent_path = NodePath::of(&parent, &config.anchor_attr);
        let next_sibling = tree::next_element_sibling(element)
            .and_then(|sibling| PathSegment::of(&sibling, &config.anchor_attr));

        tree::remove_from_parent(element);
        tree::clear_whitespace_children(&parent);

        debug!(
            template = name.as_deref().unwrap_or("<unnamed>"),
            anchor = %parent_path,
            "extracted template"
        );

        Some(Self {
            name,
            prototype: element.clone(),
            element_path,
            parent_path,
            next_sibling,
            anchor_attr: config.anchor_attr.clone(),
            insert_count: 0,
        })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The detached original node, kept as the cloning prototype
    pub fn prototype(&self) -> &Handle {
        &self.prototype
    }

    /// Structural path of the template element at extraction time
    pub fn element_path(&self) -> &NodePath {
        &self.element_path
    }

    /// Structural path of the anchor parent
    pub fn parent_path(&self) -> &NodePath {
        &self.parent_path
    }

    /// Number of clones inserted so far
    pub fn insert_count(&self) -> usize {
        self.insert_count
    }

    /// Re-resolve the anchor parent against the current tree
    ///
    /// Candidates inside `context` win (a nested bind from within a clone
    /// must target that clone's own anchor); otherwise the innermost
    /// candidate containing the context; otherwise a sole global match.
    pub fn resolve_anchor(&self, root: &Handle, context: &Handle) -> Result<Handle> {
        let candidates = self.parent_path.resolve(root);

        let within: Vec<Handle> = candidates
            .iter()
            .filter(|c| tree::contains(context, c))
            .cloned()
            .collect();
        match within.len() {
            1 => return Ok(within.into_iter().next().unwrap()),
            n if n > 1 => return Err(BindError::AmbiguousTemplate { candidates: n }),
            _ => {}
        }

        let enclosing = candidates
            .iter()
            .filter(|c| tree::contains(c, context))
            .last()
            .cloned();
        if let Some(parent) = enclosing {
            return Ok(parent);
        }

        match candidates.len() {
            0 => Err(BindError::TemplateNotFound {
                name: self.name.clone(),
            }),
            1 => Ok(candidates.into_iter().next().unwrap()),
            n => Err(BindError::AmbiguousTemplate { candidates: n }),
        }
    }

    /// Deep-clone the prototype and insert the clone at the anchor
    ///
    /// The clone goes immediately before the recorded next sibling, or is
    /// appended when no sibling was recorded (or none survives in the
    /// resolved parent).
    pub fn insert(&mut self, root: &Handle, context: &Handle) -> Result<Handle> {
        let parent = self.resolve_anchor(root, context)?;
        let clone = tree::deep_clone(&self.prototype);

        let reference = self.next_sibling.as_ref().and_then(|segment| {
            tree::element_children(&parent)
                .into_iter()
                .find(|child| segment.matches(child, &self.anchor_attr))
        });
        match reference {
            Some(sibling) => tree::insert_before(&parent, &clone, &sibling),
            None => tree::append_child(&parent, &clone),
        }

        self.insert_count += 1;
        debug!(
            template = self.name.as_deref().unwrap_or("<unnamed>"),
            count = self.insert_count,
            "inserted template clone"
        );
        Ok(clone)
    }
}
