//! Recursive list binding
//!
//! Each data item gets one clone of the resolved template. The item's
//! shape — scalar, keyed map, nested iterable, adapter object — is
//! classified once and decides how the clone is populated. Nested
//! iterables recurse with the clone as the new context, so a template
//! inside a template repeats per nested item.

use markup5ever_rcdom::Handle;
use tracing::debug;

use crate::binding::directive;
use crate::binding::placeholder::PlaceholderEngine;
use crate::binding::table;
use crate::binding::value::{classify, BindValue, ItemShape};
use crate::config::MarkupConfig;
use crate::dom::tree;
use crate::error::{BindError, Result};
use crate::template::TemplateRegistry;

/// Bind a sequence of items through the template matching `(context, name)`
///
/// Returns the total number of template insertions, including those made
/// by nested recursion. An empty input still resolves the template — the
/// existence check keeps its error contract — and leaves the anchor free
/// of stray whitespace.
pub fn bind_list(
    registry: &mut TemplateRegistry,
    placeholders: &mut PlaceholderEngine,
    config: &MarkupConfig,
    root: &Handle,
    items: &[BindValue],
    context: &Handle,
    name: Option<&str>,
) -> Result<usize> {
    if items.is_empty() {
        let anchor = registry
            .get_mut(root, context, name)?
            .resolve_anchor(root, context)?;
        tree::clear_whitespace_children(&anchor);
        return Ok(0);
    }

    let mut count = 0;
    for item in items {
        let clone = registry.insert_clone(root, context, name)?;
        placeholders.scan(&clone);
        count += 1;

        match classify(item) {
            ItemShape::Nested {
                label,
                items: nested,
            } => {
                if let Some(label) = label {
                    directive::apply_directives(
                        None,
                        &BindValue::from(label),
                        &clone,
                        config,
                    )?;
                }
                count +=
                    bind_list(registry, placeholders, config, root, nested, &clone, None)?;
            }
            ItemShape::Adapter(object) => {
                for (key, value) in object.bind_entries() {
                    count += bind_pair(
                        registry,
                        placeholders,
                        config,
                        root,
                        &key,
                        &value,
                        &clone,
                    )?;
                }
            }
            ItemShape::Keyed(entries) => {
                for (key, value) in entries {
                    count += bind_pair(
                        registry,
                        placeholders,
                        config,
                        root,
                        key,
                        value,
                        &clone,
                    )?;
                }
            }
            ItemShape::Scalar => {
                directive::apply_directives(None, item, &clone, config)?;
            }
        }
    }

    debug!(
        template = name.unwrap_or("<unnamed>"),
        count, "list bind complete"
    );
    Ok(count)
}

/// Bind one key-value pair inside a clone
///
/// An iterable value is treated as a nested list under its key: the key is
/// tried as an explicit nested template name first, then resolution falls
/// back to structural matching. Scalar values go through directives and
/// placeholders. Returns nested insertions, if any.
fn bind_pair(
    registry: &mut TemplateRegistry,
    placeholders: &mut PlaceholderEngine,
    config: &MarkupConfig,
    root: &Handle,
    key: &str,
    value: &BindValue,
    clone: &Handle,
) -> Result<usize> {
    if let BindValue::Seq(nested) = value {
        let named = bind_list(
            registry,
            placeholders,
            config,
            root,
            nested,
            clone,
            Some(key),
        );
        return match named {
            Err(BindError::TemplateNotFound { name: Some(_) }) => {
                bind_list(registry, placeholders, config, root, nested, clone, None)
            }
            other => other,
        };
    }

    let outcome = directive::apply_directives(Some(key), value, clone, config)?;
    placeholders.bind(key, value, clone);
    for element in outcome.tables {
        table::bind_table_onto(registry, config, root, value, &element)?;
    }
    Ok(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{inner_html, Document};

    fn setup(html: &str) -> (Document, TemplateRegistry, PlaceholderEngine, MarkupConfig) {
        let doc = Document::parse(html).expect("Should parse");
        let config = MarkupConfig::default();
        let registry = TemplateRegistry::extract(&doc.root(), &config);
        let mut placeholders = PlaceholderEngine::new();
        placeholders.scan(&doc.root());
        (doc, registry, placeholders, config)
    }

    #[test]
    fn test_scalar_items_in_order() {
        let (doc, mut registry, mut placeholders, config) = setup(
            "<ul id=\"list\"><li data-weft-template data-weft:text>Item</li></ul>",
        );
        let items: Vec<BindValue> = ["Eggs", "Potatoes", "Butter", "Plain flour"]
            .iter()
            .map(|s| BindValue::from(*s))
            .collect();
        let root = doc.root();
        let ul = doc.find_by_id("list").unwrap();

        let count = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &items,
            &ul,
            None,
        )
        .expect("Should bind");
        assert_eq!(count, 4);

        let texts: Vec<String> = tree::element_children(&ul)
            .iter()
            .map(tree::text_content)
            .collect();
        assert_eq!(texts, vec!["Eggs", "Potatoes", "Butter", "Plain flour"]);
    }

    #[test]
    fn test_empty_sequence_leaves_clean_anchor() {
        let (doc, mut registry, mut placeholders, config) = setup(
            "<ul id=\"list\">\n    <li data-weft-template data-weft:text>Item</li>\n</ul>",
        );
        let root = doc.root();
        let ul = doc.find_by_id("list").unwrap();
        let count = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &[],
            &ul,
            None,
        )
        .expect("Should bind");
        assert_eq!(count, 0);
        assert_eq!(inner_html(&ul), "");
    }

    #[test]
    fn test_empty_sequence_still_validates_template() {
        let (doc, mut registry, mut placeholders, config) =
            setup("<ul id=\"list\"><li>static</li></ul>");
        let root = doc.root();
        let ul = doc.find_by_id("list").unwrap();
        let result = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &[],
            &ul,
            None,
        );
        assert!(matches!(
            result,
            Err(BindError::TemplateNotFound { name: None })
        ));
    }

    #[test]
    fn test_keyed_map_items() {
        let (doc, mut registry, mut placeholders, config) = setup(
            "<ul id=\"list\"><li data-weft-template>\
             <span class=\"n\" data-weft:text=\"name\"></span>\
             <span class=\"p\">{{price}}</span></li></ul>",
        );
        let items = vec![
            BindValue::Map(vec![
                ("name".to_string(), BindValue::from("Eggs")),
                ("price".to_string(), BindValue::Number(3.5)),
            ]),
            BindValue::Map(vec![
                ("name".to_string(), BindValue::from("Butter")),
                ("price".to_string(), BindValue::Number(5.0)),
            ]),
        ];
        let root = doc.root();
        let ul = doc.find_by_id("list").unwrap();
        let count = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &items,
            &ul,
            None,
        )
        .unwrap();
        assert_eq!(count, 2);

        let rows = tree::element_children(&ul);
        assert_eq!(tree::text_content(&rows[0]), "Eggs3.5");
        assert_eq!(tree::text_content(&rows[1]), "Butter5");
    }

    #[test]
    fn test_nested_lists_accumulate_total() {
        let (doc, mut registry, mut placeholders, config) = setup(
            "<ul id=\"outer\"><li data-weft-template>\
             <span data-weft:text></span>\
             <ul class=\"inner\"><li data-weft-template data-weft:text>x</li></ul>\
             </li></ul>",
        );
        // Two groups with 2 and 3 nested entries: 2 + 5 insertions in total
        let items = vec![
            BindValue::Map(vec![(
                "Fruits".to_string(),
                BindValue::from(vec!["Apple", "Pear"]),
            )]),
            BindValue::Map(vec![(
                "Roots".to_string(),
                BindValue::from(vec!["Beet", "Carrot", "Turnip"]),
            )]),
        ];
        let root = doc.root();
        let outer = doc.find_by_id("outer").unwrap();
        let count = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &items,
            &outer,
            None,
        )
        .expect("Should bind");
        assert_eq!(count, 7);

        let groups = tree::element_children(&outer);
        assert_eq!(groups.len(), 2);
        let first_label = tree::find_by_tag(&groups[0], "span");
        assert_eq!(tree::text_content(&first_label[0]), "Fruits");
        let first_inner = tree::find_by_tag(&groups[0], "ul");
        assert_eq!(tree::element_children(&first_inner[0]).len(), 2);
        let second_inner = tree::find_by_tag(&groups[1], "ul");
        assert_eq!(
            tree::element_children(&second_inner[0])
                .iter()
                .map(tree::text_content)
                .collect::<Vec<_>>(),
            vec!["Beet", "Carrot", "Turnip"]
        );
    }

    #[test]
    fn test_plain_nested_sequences() {
        let (doc, mut registry, mut placeholders, config) = setup(
            "<ul id=\"outer\"><li data-weft-template>\
             <ol><li data-weft-template data-weft:text>x</li></ol>\
             </li></ul>",
        );
        let items = vec![
            BindValue::from(vec!["a", "b"]),
            BindValue::from(vec!["c"]),
        ];
        let root = doc.root();
        let outer = doc.find_by_id("outer").unwrap();
        let count = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &items,
            &outer,
            None,
        )
        .unwrap();
        assert_eq!(count, 5);
    }

    #[test]
    fn test_mixed_shallow_and_nested_item() {
        let (doc, mut registry, mut placeholders, config) = setup(
            "<div id=\"wrap\"><section data-weft-template>\
             <h2 data-weft:text=\"title\"></h2>\
             <ul><li data-weft-template=\"tags\" data-weft:text>t</li></ul>\
             </section></div>",
        );
        let items = vec![BindValue::Map(vec![
            ("title".to_string(), BindValue::from("Post")),
            (
                "tags".to_string(),
                BindValue::from(vec!["rust", "html"]),
            ),
        ])];
        let root = doc.root();
        let wrap = doc.find_by_id("wrap").unwrap();
        let count = bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &items,
            &wrap,
            None,
        )
        .unwrap();
        assert_eq!(count, 3);

        let section = tree::element_children(&wrap)[0].clone();
        assert_eq!(
            tree::text_content(&tree::find_by_tag(&section, "h2")[0]),
            "Post"
        );
        let tags: Vec<String> = tree::find_by_tag(&section, "li")
            .iter()
            .map(tree::text_content)
            .collect();
        assert_eq!(tags, vec!["rust", "html"]);
    }

    #[test]
    fn test_adapter_items() {
        use crate::binding::value::Bindable;
        use std::rc::Rc;

        struct Product {
            name: &'static str,
            price: f64,
        }
        impl Bindable for Product {
            fn bind_entries(&self) -> Vec<(String, BindValue)> {
                vec![
                    ("name".to_string(), BindValue::from(self.name)),
                    ("price".to_string(), BindValue::Number(self.price)),
                ]
            }
        }

        let (doc, mut registry, mut placeholders, config) = setup(
            "<ul id=\"list\"><li data-weft-template>\
             <b data-weft:text=\"name\"></b>: {{price}}</li></ul>",
        );
        let items = vec![
            BindValue::Object(Rc::new(Product {
                name: "Anvil",
                price: 99.0,
            })),
        ];
        let root = doc.root();
        let ul = doc.find_by_id("list").unwrap();
        bind_list(
            &mut registry,
            &mut placeholders,
            &config,
            &root,
            &items,
            &ul,
            None,
        )
        .unwrap();
        let li = tree::element_children(&ul)[0].clone();
        assert_eq!(tree::text_content(&li), "Anvil: 99");
    }
}
