//! Node-level operations over the rcdom tree
//!
//! The binding engine only relies on the capabilities collected here:
//! attribute access, class-token editing, child insertion and removal, deep
//! cloning, traversal, and text mutation. Everything operates on
//! [`markup5ever_rcdom::Handle`] values; node identity is `Rc` pointer
//! identity.

use std::cell::RefCell;
use std::rc::Rc;

use html5ever::tendril::StrTendril;
use markup5ever::{namespace_url, ns, Attribute, LocalName, QualName};
use markup5ever_rcdom::{Handle, Node, NodeData};

/// Whether the node is an element
pub fn is_element(node: &Handle) -> bool {
    matches!(node.data, NodeData::Element { .. })
}

/// The element's local tag name, lowercase as parsed
pub fn element_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

/// Whether the node is a text node consisting only of whitespace
pub fn is_whitespace_text(node: &Handle) -> bool {
    match &node.data {
        NodeData::Text { contents } => contents.borrow().chars().all(char::is_whitespace),
        _ => false,
    }
}

/// Create a detached element node with the given tag
pub fn new_element(tag: &str) -> Handle {
    Node::new(NodeData::Element {
        name: QualName::new(None, ns!(html), LocalName::from(tag)),
        attrs: RefCell::new(Vec::new()),
        template_contents: RefCell::new(None),
        mathml_annotation_xml_integration_point: false,
    })
}

/// Create a detached text node
pub fn new_text(text: &str) -> Handle {
    Node::new(NodeData::Text {
        contents: RefCell::new(StrTendril::from(text)),
    })
}

/// Get an attribute value by name
pub fn get_attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

/// Whether the element carries the attribute, regardless of value
pub fn has_attr(node: &Handle, name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .any(|a| a.name.local.as_ref() == name),
        _ => false,
    }
}

/// Set an attribute, replacing any existing value
pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        if let Some(attr) = attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            attr.value = StrTendril::from(value);
        } else {
            attrs.push(Attribute {
                name: QualName::new(None, ns!(), LocalName::from(name)),
                value: StrTendril::from(value),
            });
        }
    }
}

/// Remove an attribute if present
pub fn remove_attr(node: &Handle, name: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        attrs.borrow_mut().retain(|a| a.name.local.as_ref() != name);
    }
}

/// All attribute names on the element
pub fn attr_names(node: &Handle) -> Vec<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| a.name.local.to_string())
            .collect(),
        _ => Vec::new(),
    }
}

/// Add a token to a space-separated token-list attribute (e.g. `class`)
///
/// No-op when the token is already present.
pub fn add_token(node: &Handle, attr: &str, token: &str) {
    let current = get_attr(node, attr).unwrap_or_default();
    if current.split_whitespace().any(|t| t == token) {
        return;
    }
    let updated = if current.trim().is_empty() {
        token.to_string()
    } else {
        format!("{} {}", current.trim(), token)
    };
    set_attr(node, attr, &updated);
}

/// Remove a token from a space-separated token-list attribute
///
/// Other tokens keep their order. The attribute itself is kept, possibly
/// empty, so repeated toggles stay cheap.
pub fn remove_token(node: &Handle, attr: &str, token: &str) {
    if let Some(current) = get_attr(node, attr) {
        let updated = current
            .split_whitespace()
            .filter(|t| *t != token)
            .collect::<Vec<_>>()
            .join(" ");
        set_attr(node, attr, &updated);
    }
}

/// The element's class tokens in document order
pub fn classes(node: &Handle) -> Vec<String> {
    get_attr(node, "class")
        .map(|c| c.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default()
}

/// The node's parent, if attached
pub fn parent_of(node: &Handle) -> Option<Handle> {
    let weak = node.parent.take();
    let parent = weak.as_ref().and_then(|w| w.upgrade());
    node.parent.set(weak);
    parent
}

/// Whether `node` is `ancestor` or lies in its subtree
pub fn contains(ancestor: &Handle, node: &Handle) -> bool {
    let mut current = Some(node.clone());
    while let Some(n) = current {
        if Rc::ptr_eq(&n, ancestor) {
            return true;
        }
        current = parent_of(&n);
    }
    false
}

/// Append a child, reparenting it onto `parent`
pub fn append_child(parent: &Handle, child: &Handle) {
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child.clone());
}

/// Insert `node` into `parent` immediately before `reference`
///
/// Appends when the reference is not among the parent's children.
pub fn insert_before(parent: &Handle, node: &Handle, reference: &Handle) {
    let mut children = parent.children.borrow_mut();
    let position = children.iter().position(|c| Rc::ptr_eq(c, reference));
    node.parent.set(Some(Rc::downgrade(parent)));
    match position {
        Some(i) => children.insert(i, node.clone()),
        None => children.push(node.clone()),
    }
}

/// Detach a node from its parent, if attached
pub fn remove_from_parent(node: &Handle) {
    if let Some(parent) = parent_of(node) {
        parent
            .children
            .borrow_mut()
            .retain(|c| !Rc::ptr_eq(c, node));
    }
    node.parent.set(None);
}

/// Replace every child of `parent` with `children`
pub fn replace_children(parent: &Handle, children: Vec<Handle>) {
    for child in parent.children.borrow().iter() {
        child.parent.set(None);
    }
    for child in &children {
        child.parent.set(Some(Rc::downgrade(parent)));
    }
    *parent.children.borrow_mut() = children;
}

/// The element children of a node, in document order
pub fn element_children(node: &Handle) -> Vec<Handle> {
    node.children
        .borrow()
        .iter()
        .filter(|c| is_element(c))
        .cloned()
        .collect()
}

/// The next element sibling of a node, if any
pub fn next_element_sibling(node: &Handle) -> Option<Handle> {
    let parent = parent_of(node)?;
    let children = parent.children.borrow();
    let index = children.iter().position(|c| Rc::ptr_eq(c, node))?;
    children[index + 1..].iter().find(|c| is_element(c)).cloned()
}

/// Preorder traversal of the subtree, including `node` itself
pub fn descendants(node: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    let mut stack = vec![node.clone()];
    while let Some(current) = stack.pop() {
        for child in current.children.borrow().iter().rev() {
            stack.push(child.clone());
        }
        out.push(current);
    }
    out
}

/// Preorder traversal restricted to elements, including `node` when it is one
pub fn descendant_elements(node: &Handle) -> Vec<Handle> {
    descendants(node).into_iter().filter(is_element).collect()
}

/// Descendant elements with the given tag name, including `node` itself
pub fn find_by_tag(node: &Handle, tag: &str) -> Vec<Handle> {
    descendant_elements(node)
        .into_iter()
        .filter(|n| element_name(n).as_deref() == Some(tag))
        .collect()
}

/// Concatenated text of the subtree
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    for n in descendants(node) {
        if let NodeData::Text { contents } = &n.data {
            out.push_str(&contents.borrow());
        }
    }
    out
}

/// Replace the node's content with a single text node
pub fn set_text_content(node: &Handle, text: &str) {
    replace_children(node, vec![new_text(text)]);
}

/// Overwrite a text node's contents in place
pub fn set_text(node: &Handle, text: &str) {
    if let NodeData::Text { contents } = &node.data {
        *contents.borrow_mut() = StrTendril::from(text);
    }
}

/// Deep-clone a subtree into fresh, detached nodes
pub fn deep_clone(node: &Handle) -> Handle {
    let data = match &node.data {
        NodeData::Document => NodeData::Document,
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => NodeData::Doctype {
            name: name.clone(),
            public_id: public_id.clone(),
            system_id: system_id.clone(),
        },
        NodeData::Text { contents } => NodeData::Text {
            contents: RefCell::new(contents.borrow().clone()),
        },
        NodeData::Comment { contents } => NodeData::Comment {
            contents: contents.clone(),
        },
        NodeData::Element {
            name,
            attrs,
            mathml_annotation_xml_integration_point,
            ..
        } => NodeData::Element {
            name: name.clone(),
            attrs: RefCell::new(attrs.borrow().clone()),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: *mathml_annotation_xml_integration_point,
        },
        NodeData::ProcessingInstruction { target, contents } => {
            NodeData::ProcessingInstruction {
                target: target.clone(),
                contents: contents.clone(),
            }
        }
    };
    let clone = Node::new(data);
    for child in node.children.borrow().iter() {
        append_child(&clone, &deep_clone(child));
    }
    clone
}

/// Drop whitespace-only text children when nothing else remains
///
/// Used after template extraction and for empty-sequence binds so anchors
/// serialize without stray indentation.
pub fn clear_whitespace_children(parent: &Handle) {
    let only_whitespace = parent
        .children
        .borrow()
        .iter()
        .all(is_whitespace_text);
    if only_whitespace {
        replace_children(parent, Vec::new());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attrs_roundtrip() {
        let el = new_element("div");
        assert_eq!(get_attr(&el, "id"), None);
        set_attr(&el, "id", "main");
        assert_eq!(get_attr(&el, "id"), Some("main".to_string()));
        set_attr(&el, "id", "other");
        assert_eq!(get_attr(&el, "id"), Some("other".to_string()));
        remove_attr(&el, "id");
        assert!(!has_attr(&el, "id"));
    }

    #[test]
    fn test_token_list_editing() {
        let el = new_element("li");
        add_token(&el, "class", "selected");
        add_token(&el, "class", "selected");
        assert_eq!(get_attr(&el, "class"), Some("selected".to_string()));
        add_token(&el, "class", "highlight");
        assert_eq!(classes(&el), vec!["selected", "highlight"]);
        remove_token(&el, "class", "selected");
        assert_eq!(classes(&el), vec!["highlight"]);
    }

    #[test]
    fn test_insert_and_remove() {
        let parent = new_element("ul");
        let a = new_element("li");
        let b = new_element("li");
        let c = new_element("li");
        append_child(&parent, &a);
        append_child(&parent, &c);
        insert_before(&parent, &b, &c);
        let tags: Vec<_> = parent.children.borrow().iter().cloned().collect();
        assert!(Rc::ptr_eq(&tags[1], &b));
        remove_from_parent(&b);
        assert_eq!(parent.children.borrow().len(), 2);
        assert!(parent_of(&b).is_none());
    }

    #[test]
    fn test_deep_clone_is_detached() {
        let parent = new_element("div");
        let child = new_element("span");
        set_attr(&child, "class", "x");
        append_child(&parent, &child);
        append_child(&child, &new_text("hello"));

        let clone = deep_clone(&parent);
        assert!(!Rc::ptr_eq(&clone, &parent));
        assert!(parent_of(&clone).is_none());
        assert_eq!(text_content(&clone), "hello");

        // Mutating the clone leaves the original untouched
        let clone_child = element_children(&clone)[0].clone();
        set_attr(&clone_child, "class", "y");
        assert_eq!(get_attr(&child, "class"), Some("x".to_string()));
    }

    #[test]
    fn test_text_content_and_set() {
        let el = new_element("p");
        append_child(&el, &new_text("a"));
        let span = new_element("span");
        append_child(&span, &new_text("b"));
        append_child(&el, &span);
        assert_eq!(text_content(&el), "ab");

        set_text_content(&el, "replaced");
        assert_eq!(text_content(&el), "replaced");
        assert_eq!(el.children.borrow().len(), 1);
    }

    #[test]
    fn test_clear_whitespace_children() {
        let el = new_element("ul");
        append_child(&el, &new_text("\n    "));
        append_child(&el, &new_text("  "));
        clear_whitespace_children(&el);
        assert!(el.children.borrow().is_empty());

        let kept = new_element("ul");
        append_child(&kept, &new_text("\n"));
        append_child(&kept, &new_element("li"));
        clear_whitespace_children(&kept);
        assert_eq!(kept.children.borrow().len(), 2);
    }

    #[test]
    fn test_contains() {
        let a = new_element("div");
        let b = new_element("span");
        append_child(&a, &b);
        assert!(contains(&a, &b));
        assert!(contains(&a, &a));
        assert!(!contains(&b, &a));
    }
}
