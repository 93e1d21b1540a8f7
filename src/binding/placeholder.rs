//! Inline `{{key}}` placeholder substitution
//!
//! Scanning splits every text node containing a placeholder into separate
//! before/placeholder/after nodes, so each placeholder is independently
//! addressable afterwards. Placeholders inside attribute values get a slot
//! model instead: the attribute is decomposed into literal and slot parts,
//! and every substitution rewrites the whole attribute value through the
//! owning attribute (attribute values are not live-backed by child text in
//! the tree model, and id-like attributes keep their identity this way).
//!
//! An unbound placeholder renders its declared default, or failing that
//! the raw key: `{{name ?? World}}` shows `World` until `name` is bound.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use markup5ever_rcdom::{Handle, NodeData};
use tracing::debug;

use crate::binding::value::BindValue;
use crate::dom::tree;

/// A parsed placeholder: key plus optional default
#[derive(Debug, Clone, PartialEq, Eq)]
struct Placeholder {
    key: String,
    default: Option<String>,
}

impl Placeholder {
    /// Content shown when the bound value is absent or empty
    fn fallback(&self) -> &str {
        match &self.default {
            Some(d) if !d.is_empty() => d,
            _ => &self.key,
        }
    }
}

/// One piece of a decomposed text node or attribute value
#[derive(Debug)]
enum Part {
    Literal(String),
    Slot(Placeholder),
}

/// Current content of a decomposed attribute value
#[derive(Debug)]
enum AttrPart {
    Literal(String),
    Slot(String),
}

enum Location {
    /// A dedicated text node holding exactly this placeholder
    Text(Handle),
    /// A slot inside an attribute value
    Attr {
        element: Handle,
        attr: String,
        parts: Rc<RefCell<Vec<AttrPart>>>,
        slot: usize,
    },
}

struct Fragment {
    placeholder: Placeholder,
    location: Location,
}

/// Registry of every placeholder fragment found in scanned subtrees
#[derive(Default)]
pub struct PlaceholderEngine {
    fragments: HashMap<String, Vec<Fragment>>,
}

impl PlaceholderEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan a subtree, split placeholder-bearing text nodes and attribute
    /// values, and index the fragments by key
    ///
    /// Safe to call again on freshly inserted clones: already-split nodes
    /// no longer contain marker braces.
    pub fn scan(&mut self, root: &Handle) {
        self.scan_text_nodes(root);
        self.scan_attributes(root);
    }

    fn scan_text_nodes(&mut self, root: &Handle) {
        for node in tree::descendants(root) {
            let NodeData::Text { contents } = &node.data else {
                continue;
            };
            let text = contents.borrow().to_string();
            if !text.contains("{{") {
                continue;
            }
            let parts = parse_parts(&text);
            if !parts.iter().any(|p| matches!(p, Part::Slot(_))) {
                continue;
            }
            let Some(parent) = tree::parent_of(&node) else {
                continue;
            };

            let mut replacements = Vec::new();
            for part in parts {
                match part {
                    Part::Literal(s) => replacements.push(tree::new_text(&s)),
                    Part::Slot(placeholder) => {
                        let fragment_node = tree::new_text(placeholder.fallback());
                        self.register(Fragment {
                            placeholder,
                            location: Location::Text(fragment_node.clone()),
                        });
                        replacements.push(fragment_node);
                    }
                }
            }
            splice_in_place(&parent, &node, replacements);
        }
    }

    fn scan_attributes(&mut self, root: &Handle) {
        for element in tree::descendant_elements(root) {
            for attr in tree::attr_names(&element) {
                let value = tree::get_attr(&element, &attr).unwrap_or_default();
                if !value.contains("{{") {
                    continue;
                }
                let parts = parse_parts(&value);
                if !parts.iter().any(|p| matches!(p, Part::Slot(_))) {
                    continue;
                }

                let rendered: Rc<RefCell<Vec<AttrPart>>> = Rc::new(RefCell::new(Vec::new()));
                for (slot, part) in parts.into_iter().enumerate() {
                    match part {
                        Part::Literal(s) => rendered.borrow_mut().push(AttrPart::Literal(s)),
                        Part::Slot(placeholder) => {
                            rendered
                                .borrow_mut()
                                .push(AttrPart::Slot(placeholder.fallback().to_string()));
                            self.register(Fragment {
                                placeholder,
                                location: Location::Attr {
                                    element: element.clone(),
                                    attr: attr.clone(),
                                    parts: rendered.clone(),
                                    slot,
                                },
                            });
                        }
                    }
                }
                write_attr(&element, &attr, &rendered);
            }
        }
    }

    fn register(&mut self, fragment: Fragment) {
        self.fragments
            .entry(fragment.placeholder.key.clone())
            .or_default()
            .push(fragment);
    }

    /// Number of distinct keys with registered fragments
    pub fn key_count(&self) -> usize {
        self.fragments.len()
    }

    /// Substitute a value into every fragment registered under `key` that
    /// lies within `context`, returning how many fragments matched
    ///
    /// An empty string form falls back to the fragment's default, then to
    /// the raw key, so a later non-empty bind fully replaces the fallback.
    pub fn bind(&mut self, key: &str, value: &BindValue, context: &Handle) -> usize {
        let Some(fragments) = self.fragments.get_mut(key) else {
            return 0;
        };
        let substituted = value.display();
        let mut matched = 0;

        for fragment in fragments.iter() {
            let content = if substituted.is_empty() {
                fragment.placeholder.fallback().to_string()
            } else {
                substituted.clone()
            };
            match &fragment.location {
                Location::Text(node) => {
                    if !tree::contains(context, node) {
                        continue;
                    }
                    tree::set_text(node, &content);
                }
                Location::Attr {
                    element,
                    attr,
                    parts,
                    slot,
                } => {
                    if !tree::contains(context, element) {
                        continue;
                    }
                    if let Some(AttrPart::Slot(current)) = parts.borrow_mut().get_mut(*slot) {
                        *current = content;
                    }
                    write_attr(element, attr, parts);
                }
            }
            matched += 1;
        }

        debug!(key, matched, "placeholder bind");
        matched
    }
}

fn write_attr(element: &Handle, attr: &str, parts: &Rc<RefCell<Vec<AttrPart>>>) {
    let composed: String = parts
        .borrow()
        .iter()
        .map(|p| match p {
            AttrPart::Literal(s) => s.as_str(),
            AttrPart::Slot(s) => s.as_str(),
        })
        .collect();
    tree::set_attr(element, attr, &composed);
}

/// Replace one child node with a sequence of nodes at the same position
fn splice_in_place(parent: &Handle, node: &Handle, replacements: Vec<Handle>) {
    let mut children = parent.children.borrow_mut();
    let Some(index) = children.iter().position(|c| Rc::ptr_eq(c, node)) else {
        return;
    };
    node.parent.set(None);
    children.remove(index);
    for (offset, replacement) in replacements.into_iter().enumerate() {
        replacement.parent.set(Some(Rc::downgrade(parent)));
        children.insert(index + offset, replacement);
    }
}

/// Split text into literal and placeholder parts
///
/// Key is the substring before `??`, trimmed; default is everything after,
/// trimmed. An unterminated `{{` is kept as literal text.
fn parse_parts(text: &str) -> Vec<Part> {
    let mut parts = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find("{{") {
        let Some(close) = rest[open..].find("}}") else {
            break;
        };
        let close = open + close;
        if open > 0 {
            parts.push(Part::Literal(rest[..open].to_string()));
        }
        let inner = &rest[open + 2..close];
        let (key, default) = match inner.split_once("??") {
            Some((k, d)) => (k.trim().to_string(), Some(d.trim().to_string())),
            None => (inner.trim().to_string(), None),
        };
        if key.is_empty() {
            parts.push(Part::Literal(rest[open..close + 2].to_string()));
        } else {
            parts.push(Part::Slot(Placeholder { key, default }));
        }
        rest = &rest[close + 2..];
    }
    if !rest.is_empty() {
        parts.push(Part::Literal(rest.to_string()));
    }
    parts
}
