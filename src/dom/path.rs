//! Structural paths for re-locating detached or relocated nodes
//!
//! A [`NodePath`] records the ancestor chain of an element as tag names
//! qualified by id, class list, and the reserved anchor attribute. The path
//! is an index into the live tree rather than a pointer: it is re-evaluated
//! against the current tree state on every use, and stays valid across
//! mutations elsewhere as long as the qualifying id/class/anchor attributes
//! survive.
//!
//! Paths carry no sibling positions, so a path may resolve to several nodes
//! once an enclosing list bind has cloned part of the tree. Resolution
//! returns every match; picking one (or erroring) is the caller's job.

use std::fmt;

use markup5ever_rcdom::Handle;

use super::tree;

/// One ancestor step: tag name plus its qualifying attributes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    pub tag: String,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub anchor: Option<String>,
}

impl PathSegment {
    /// Capture a segment for an element, or `None` for non-elements
    pub fn of(node: &Handle, anchor_attr: &str) -> Option<Self> {
        let tag = tree::element_name(node)?;
        Some(Self {
            tag,
            id: tree::get_attr(node, "id").filter(|v| !v.is_empty()),
            classes: tree::classes(node),
            anchor: tree::get_attr(node, anchor_attr),
        })
    }

    /// Whether a live element satisfies this segment
    ///
    /// Classes are checked by containment so that class tokens added by
    /// later binds do not break re-location.
    pub fn matches(&self, node: &Handle, anchor_attr: &str) -> bool {
        if tree::element_name(node).as_deref() != Some(self.tag.as_str()) {
            return false;
        }
        if let Some(id) = &self.id {
            if tree::get_attr(node, "id").as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if let Some(anchor) = &self.anchor {
            if tree::get_attr(node, anchor_attr).as_deref() != Some(anchor.as_str()) {
                return false;
            }
        }
        let live = tree::classes(node);
        self.classes.iter().all(|c| live.contains(c))
    }

    fn compatible(&self, other: &PathSegment) -> bool {
        if self.tag != other.tag {
            return false;
        }
        if let (Some(a), Some(b)) = (&self.id, &other.id) {
            if a != b {
                return false;
            }
        }
        if let (Some(a), Some(b)) = (&self.anchor, &other.anchor) {
            if a != b {
                return false;
            }
        }
        self.classes.iter().all(|c| other.classes.contains(c))
            || other.classes.iter().all(|c| self.classes.contains(c))
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tag)?;
        if let Some(id) = &self.id {
            write!(f, "#{id}")?;
        }
        for class in &self.classes {
            write!(f, ".{class}")?;
        }
        if let Some(anchor) = &self.anchor {
            write!(f, "[anchor={anchor}]")?;
        }
        Ok(())
    }
}

/// Root-to-node structural path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodePath {
    segments: Vec<PathSegment>,
    anchor_attr: String,
}

impl NodePath {
    /// Compute the path of an element by walking its ancestors to the root
    pub fn of(node: &Handle, anchor_attr: &str) -> Self {
        let mut segments = Vec::new();
        let mut current = Some(node.clone());
        while let Some(n) = current {
            if let Some(segment) = PathSegment::of(&n, anchor_attr) {
                segments.push(segment);
            }
            current = tree::parent_of(&n);
        }
        segments.reverse();
        Self {
            segments,
            anchor_attr: anchor_attr.to_string(),
        }
    }

    /// Number of element steps from the root
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// Re-evaluate the path against the current tree, returning every match
    ///
    /// `root` is the document node (or any ancestor of the first segment's
    /// element). Zero or multiple matches where exactly one was expected is
    /// surfaced by the caller, not here.
    pub fn resolve(&self, root: &Handle) -> Vec<Handle> {
        let mut candidates = vec![root.clone()];
        for segment in &self.segments {
            let mut next = Vec::new();
            for candidate in &candidates {
                for child in tree::element_children(candidate) {
                    if segment.matches(&child, &self.anchor_attr) {
                        next.push(child);
                    }
                }
            }
            candidates = next;
            if candidates.is_empty() {
                break;
            }
        }
        candidates
    }

    /// Whether two paths lie on the same root line
    ///
    /// True when the shorter path is a segment-wise prefix of the longer
    /// one. Used for unnamed template lookup, where the anchor may sit
    /// inside the context (nested binds from a clone) or the context inside
    /// the anchor's line (binds from the list container).
    pub fn is_related(&self, other: &NodePath) -> bool {
        let shared = self.segments.len().min(other.segments.len());
        self.segments[..shared]
            .iter()
            .zip(&other.segments[..shared])
            .all(|(a, b)| a.compatible(b))
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.segments.iter().map(|s| s.to_string()).collect();
        write!(f, "{}", rendered.join(" > "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tree::{append_child, new_element, set_attr};
    use std::rc::Rc;

    fn sample_tree() -> (Handle, Handle, Handle) {
        // div#root > ul.items > li
        let root = new_element("div");
        set_attr(&root, "id", "root");
        let ul = new_element("ul");
        set_attr(&ul, "class", "items");
        let li = new_element("li");
        append_child(&root, &ul);
        append_child(&ul, &li);
        (root, ul, li)
    }

    #[test]
    fn test_path_display() {
        // Keep the tuple bindings alive: parents are weak references
        let (_root, _ul, li) = sample_tree();
        let path = NodePath::of(&li, "data-weft-anchor");
        assert_eq!(path.to_string(), "div#root > ul.items > li");
    }

    #[test]
    fn test_resolve_finds_node() {
        let (root, _, li) = sample_tree();
        let doc = new_element("html");
        append_child(&doc, &root);
        let path = NodePath::of(&li, "data-weft-anchor");

        // Resolve from a synthetic root above the recorded chain
        let holder = markup5ever_rcdom::Node::new(markup5ever_rcdom::NodeData::Document);
        append_child(&holder, &doc);
        let matches = path.resolve(&holder);
        assert_eq!(matches.len(), 1);
        assert!(Rc::ptr_eq(&matches[0], &li));
    }

    #[test]
    fn test_resolve_after_clone_returns_all() {
        let (root, ul, _) = sample_tree();
        let holder = markup5ever_rcdom::Node::new(markup5ever_rcdom::NodeData::Document);
        let html = new_element("html");
        append_child(&holder, &html);
        append_child(&html, &root);

        let path = NodePath::of(&ul, "data-weft-anchor");
        // Clone the list container next to itself, as a list bind would
        let copy = crate::dom::tree::deep_clone(&ul);
        append_child(&root, &copy);

        assert_eq!(path.resolve(&holder).len(), 2);
    }

    #[test]
    fn test_class_mutation_keeps_path_valid() {
        let (root, ul, li) = sample_tree();
        let holder = markup5ever_rcdom::Node::new(markup5ever_rcdom::NodeData::Document);
        append_child(&holder, &root);
        let path = NodePath::of(&li, "data-weft-anchor");
        // Extra classes added after capture must not break matching
        crate::dom::tree::add_token(&ul, "class", "expanded");
        assert_eq!(path.resolve(&holder).len(), 1);
    }

    #[test]
    fn test_is_related_prefix_both_directions() {
        let (_root, ul, li) = sample_tree();
        let ul_path = NodePath::of(&ul, "data-weft-anchor");
        let li_path = NodePath::of(&li, "data-weft-anchor");
        assert!(ul_path.is_related(&li_path));
        assert!(li_path.is_related(&ul_path));
    }

    #[test]
    fn test_unrelated_paths() {
        let (_root, ul, _li) = sample_tree();
        let other = new_element("section");
        let table = new_element("table");
        append_child(&other, &table);
        let table_path = NodePath::of(&table, "data-weft-anchor");
        let ul_path = NodePath::of(&ul, "data-weft-anchor");
        assert!(!table_path.is_related(&ul_path));
    }
}
