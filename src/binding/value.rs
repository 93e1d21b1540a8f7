//! Bound values and item classification
//!
//! [`BindValue`] is the tagged variant every piece of application data is
//! converted into before binding. Classification of list items into
//! [`ItemShape`] happens exactly once per item, so the recursive list
//! algorithm dispatches on an explicit shape instead of chained type
//! probes.

use std::fmt;
use std::rc::Rc;

/// Adapter capability for application objects that describe their own bind keys
///
/// The engine consults this only for [`BindValue::Object`] items; plain
/// scalars, sequences and maps never reach the adapter.
pub trait Bindable {
    /// Named bind entries in declaration order
    fn bind_entries(&self) -> Vec<(String, BindValue)>;

    /// String form used when the object is bound as a scalar
    fn display(&self) -> Option<String> {
        None
    }
}

/// A value handed to the binding engine
#[derive(Clone)]
pub enum BindValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
    /// Ordered sequence; bound item-by-item through a template
    Seq(Vec<BindValue>),
    /// Ordered key-value mapping (insertion order preserved)
    Map(Vec<(String, BindValue)>),
    /// Adapter-bindable application object
    Object(Rc<dyn Bindable>),
}

impl BindValue {
    /// String form used for text, attribute and placeholder substitution
    ///
    /// Sequences and maps are not stringable and degrade to an empty
    /// substitution; objects degrade likewise unless their adapter supplies
    /// a display form.
    pub fn display(&self) -> String {
        match self {
            BindValue::Null => String::new(),
            BindValue::Bool(b) => b.to_string(),
            BindValue::Number(n) => format_number(*n),
            BindValue::Text(s) => s.clone(),
            BindValue::Seq(_) | BindValue::Map(_) => String::new(),
            BindValue::Object(o) => o.display().unwrap_or_default(),
        }
    }

    /// Truthiness for toggle modifiers
    ///
    /// Null and false are falsy; zero and the empty string are falsy;
    /// everything else, including non-empty collections, is truthy.
    pub fn is_truthy(&self) -> bool {
        match self {
            BindValue::Null => false,
            BindValue::Bool(b) => *b,
            BindValue::Number(n) => *n != 0.0,
            BindValue::Text(s) => !s.is_empty(),
            BindValue::Seq(items) => !items.is_empty(),
            BindValue::Map(entries) => !entries.is_empty(),
            BindValue::Object(_) => true,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, BindValue::Null)
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        n.to_string()
    }
}

impl fmt::Debug for BindValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindValue::Null => write!(f, "Null"),
            BindValue::Bool(b) => write!(f, "Bool({b})"),
            BindValue::Number(n) => write!(f, "Number({n})"),
            BindValue::Text(s) => write!(f, "Text({s:?})"),
            BindValue::Seq(items) => f.debug_tuple("Seq").field(items).finish(),
            BindValue::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            BindValue::Object(_) => write!(f, "Object(..)"),
        }
    }
}

impl From<&str> for BindValue {
    fn from(s: &str) -> Self {
        BindValue::Text(s.to_string())
    }
}

impl From<String> for BindValue {
    fn from(s: String) -> Self {
        BindValue::Text(s)
    }
}

impl From<bool> for BindValue {
    fn from(b: bool) -> Self {
        BindValue::Bool(b)
    }
}

impl From<f64> for BindValue {
    fn from(n: f64) -> Self {
        BindValue::Number(n)
    }
}

impl From<i64> for BindValue {
    fn from(n: i64) -> Self {
        BindValue::Number(n as f64)
    }
}

impl<T: Into<BindValue>> From<Vec<T>> for BindValue {
    fn from(items: Vec<T>) -> Self {
        BindValue::Seq(items.into_iter().map(Into::into).collect())
    }
}

impl From<serde_json::Value> for BindValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => BindValue::Null,
            serde_json::Value::Bool(b) => BindValue::Bool(b),
            serde_json::Value::Number(n) => BindValue::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::String(s) => BindValue::Text(s),
            serde_json::Value::Array(items) => {
                BindValue::Seq(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(entries) => BindValue::Map(
                entries.into_iter().map(|(k, v)| (k, v.into())).collect(),
            ),
        }
    }
}

/// Shape of one list item, resolved once before binding it
pub enum ItemShape<'a> {
    /// The item is itself list-shaped: a sequence, or a keyed map whose
    /// first value is iterable (the key becomes the item's label)
    Nested {
        label: Option<&'a str>,
        items: &'a [BindValue],
    },
    /// Adapter-bindable object exposing named entries
    Adapter(&'a Rc<dyn Bindable>),
    /// Plain keyed map; values bind under their keys
    Keyed(&'a [(String, BindValue)]),
    /// Scalar or stringable item; bound keylessly as a whole
    Scalar,
}

impl fmt::Debug for ItemShape<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemShape::Nested { label, items } => f
                .debug_struct("Nested")
                .field("label", label)
                .field("items", items)
                .finish(),
            ItemShape::Adapter(_) => write!(f, "Adapter(..)"),
            ItemShape::Keyed(entries) => f.debug_tuple("Keyed").field(entries).finish(),
            ItemShape::Scalar => write!(f, "Scalar"),
        }
    }
}

/// Classify a list item
///
/// A keyed map whose first value is a sequence always reads as a nested
/// list, even when the caller meant a plain keyed item; disambiguating
/// that needs an explicit shape discriminator the input does not carry.
pub fn classify(item: &BindValue) -> ItemShape<'_> {
    match item {
        BindValue::Seq(items) => ItemShape::Nested { label: None, items },
        BindValue::Map(entries) => match entries.first() {
            Some((key, BindValue::Seq(items))) => ItemShape::Nested {
                label: Some(key.as_str()),
                items,
            },
            _ => ItemShape::Keyed(entries),
        },
        BindValue::Object(obj) => ItemShape::Adapter(obj),
        _ => ItemShape::Scalar,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_forms() {
        assert_eq!(BindValue::Null.display(), "");
        assert_eq!(BindValue::Bool(true).display(), "true");
        assert_eq!(BindValue::Number(7.0).display(), "7");
        assert_eq!(BindValue::Number(2.5).display(), "2.5");
        assert_eq!(BindValue::from("hi").display(), "hi");
        assert_eq!(BindValue::Seq(vec![]).display(), "");
    }

    #[test]
    fn test_truthiness() {
        assert!(!BindValue::Null.is_truthy());
        assert!(!BindValue::Bool(false).is_truthy());
        assert!(!BindValue::Number(0.0).is_truthy());
        assert!(!BindValue::from("").is_truthy());
        assert!(BindValue::from("false").is_truthy());
        assert!(BindValue::Number(1.0).is_truthy());
    }

    #[test]
    fn test_from_json_preserves_map_order() {
        let json: serde_json::Value =
            serde_json::from_str(r#"{"zeta": 1, "alpha": 2, "mid": 3}"#).unwrap();
        let value = BindValue::from(json);
        match value {
            BindValue::Map(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
            }
            other => panic!("expected map, got {other:?}"),
        }
    }

    #[test]
    fn test_classify_scalar_and_seq() {
        assert!(matches!(classify(&BindValue::from("x")), ItemShape::Scalar));
        assert!(matches!(classify(&BindValue::Number(3.0)), ItemShape::Scalar));
        let seq = BindValue::from(vec!["a", "b"]);
        assert!(matches!(
            classify(&seq),
            ItemShape::Nested { label: None, .. }
        ));
    }

    #[test]
    fn test_classify_keyed_map() {
        let map = BindValue::Map(vec![
            ("name".to_string(), BindValue::from("Ada")),
            ("age".to_string(), BindValue::Number(36.0)),
        ]);
        assert!(matches!(classify(&map), ItemShape::Keyed(_)));
    }

    #[test]
    fn test_classify_labelled_nested() {
        let map = BindValue::Map(vec![(
            "Fruits".to_string(),
            BindValue::from(vec!["Apple", "Pear"]),
        )]);
        match classify(&map) {
            ItemShape::Nested { label, items } => {
                assert_eq!(label, Some("Fruits"));
                assert_eq!(items.len(), 2);
            }
            other => panic!("expected nested, got {other:?}"),
        }
    }

    struct Point {
        x: f64,
        y: f64,
    }

    impl Bindable for Point {
        fn bind_entries(&self) -> Vec<(String, BindValue)> {
            vec![
                ("x".to_string(), BindValue::Number(self.x)),
                ("y".to_string(), BindValue::Number(self.y)),
            ]
        }
    }

    #[test]
    fn test_classify_adapter_object() {
        let value = BindValue::Object(Rc::new(Point { x: 1.0, y: 2.0 }));
        match classify(&value) {
            ItemShape::Adapter(obj) => {
                let entries = obj.bind_entries();
                assert_eq!(entries[0].0, "x");
                assert_eq!(entries[1].1.display(), "2");
            }
            other => panic!("expected adapter, got {other:?}"),
        }
    }
}
