//! Document-tree collaborator
//!
//! The engine mutates an HTML tree but does not implement one: parsing and
//! serialization come from `html5ever`, the node model from
//! `markup5ever_rcdom`. This module wraps the handful of capabilities the
//! binding core relies on — [`tree`] for node operations, [`path`] for
//! structural re-location, and [`Document`] for parse/serialize and context
//! resolution.

pub mod path;
pub mod tree;

use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::TendrilSink;
use html5ever::{parse_document, parse_fragment, ParseOpts};
use markup5ever::{namespace_url, ns, LocalName, QualName};
use markup5ever_rcdom::{RcDom, SerializableHandle};

pub use markup5ever_rcdom::Handle;

use crate::error::{BindError, Result};

/// A parsed HTML document owning the live tree
pub struct Document {
    dom: RcDom,
}

impl Document {
    /// Parse an HTML document (or fragment; the parser supplies the
    /// `html`/`head`/`body` scaffolding either way)
    pub fn parse(html: &str) -> Result<Self> {
        let dom = parse_document(RcDom::default(), ParseOpts::default())
            .from_utf8()
            .read_from(&mut html.as_bytes())
            .map_err(BindError::Io)?;
        Ok(Self { dom })
    }

    /// The document node; parent of the `html` element
    pub fn root(&self) -> Handle {
        self.dom.document.clone()
    }

    /// The `body` element, if the document has one
    pub fn body(&self) -> Option<Handle> {
        tree::find_by_tag(&self.dom.document, "body").into_iter().next()
    }

    /// First element with the given id
    pub fn find_by_id(&self, id: &str) -> Option<Handle> {
        tree::descendant_elements(&self.dom.document)
            .into_iter()
            .find(|n| tree::get_attr(n, "id").as_deref() == Some(id))
    }

    /// First element with the given tag name
    pub fn first_by_tag(&self, tag: &str) -> Option<Handle> {
        tree::find_by_tag(&self.dom.document, tag).into_iter().next()
    }

    /// Serialize the whole document
    pub fn to_html(&self) -> String {
        serialize_scope(&self.dom.document, TraversalScope::ChildrenOnly(None))
    }
}

/// Serialize a node including its own tag
pub fn outer_html(node: &Handle) -> String {
    serialize_scope(node, TraversalScope::IncludeNode)
}

/// Serialize a node's children only
pub fn inner_html(node: &Handle) -> String {
    serialize_scope(node, TraversalScope::ChildrenOnly(None))
}

fn serialize_scope(node: &Handle, traversal_scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    serialize(
        &mut bytes,
        &SerializableHandle::from(node.clone()),
        SerializeOpts {
            traversal_scope,
            ..Default::default()
        },
    )
    .expect("serializing into a Vec cannot fail");
    String::from_utf8(bytes).expect("serializer emits UTF-8")
}

/// Replace an element's content with parsed markup
///
/// The fragment is parsed in the element's own tag context, so content
/// model fixups (tables, list items) behave as in a full document.
pub fn set_inner_html(element: &Handle, html: &str) {
    let context = tree::element_name(element).unwrap_or_else(|| "div".to_string());
    let dom = parse_fragment(
        RcDom::default(),
        ParseOpts::default(),
        QualName::new(None, ns!(html), LocalName::from(context.as_str())),
        Vec::new(),
    )
    .one(html);

    // parse_fragment wraps the parsed nodes in a synthetic html element
    let children = tree::element_children(&dom.document)
        .into_iter()
        .next()
        .map(|wrapper| wrapper.children.borrow().clone())
        .unwrap_or_default();
    tree::replace_children(element, children);
}
