//! Error types for binding operations

use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, BindError>;

/// Errors raised by binding operations
///
/// All variants are surfaced to the caller immediately; binding is not
/// transactional, so tree mutations performed before the error stand.
#[derive(Debug, Error)]
pub enum BindError {
    /// A directive attribute carried no property suffix (`data-weft="x"`)
    #[error("directive attribute '{attr}' has no property suffix")]
    InvalidDirectiveSyntax { attr: String },

    /// A directive property did not resolve to a known mutation target
    #[error("unknown directive property '{property}'{}", hint_suffix(.hint))]
    UnknownDirectiveProperty {
        property: String,
        hint: Option<String>,
    },

    /// No template matched the requested name or context
    #[error("{}", template_not_found(.name))]
    TemplateNotFound { name: Option<String> },

    /// More than one unnamed template could apply within the same context
    #[error("ambiguous template: {candidates} unnamed templates match the context; use an explicit name")]
    AmbiguousTemplate { candidates: usize },

    /// Table binding was requested on a context without any table element
    #[error("no table element found in the binding context")]
    TableElementNotFound,

    /// Tabular data did not match any accepted input shape
    #[error("incorrect table data format: {entry}")]
    IncorrectTableDataFormat { entry: String },

    /// An indexed sequence was passed where a keyed or scalar value was required
    #[error("incompatible bind data for key '{key}': sequences must be bound with bind_list")]
    IncompatibleBindData { key: String },

    /// Strict mode: a keyed bind call matched no directive or placeholder
    #[error("no binding target found for key '{key}'")]
    BoundDataNotSet { key: String },

    /// Markup could not be read
    #[error("failed to read markup: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &Option<String>) -> String {
    match hint {
        Some(h) => format!(" (did you mean '{h}'?)"),
        None => String::new(),
    }
}

fn template_not_found(name: &Option<String>) -> String {
    match name {
        Some(n) => format!("template not found: {n}"),
        None => "no template found for the given context".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_property_hint_message() {
        let err = BindError::UnknownDirectiveProperty {
            property: "test".to_string(),
            hint: Some("text".to_string()),
        };
        let msg = err.to_string();
        assert!(msg.contains("'test'"));
        assert!(msg.contains("did you mean 'text'"));
    }

    #[test]
    fn test_template_not_found_messages() {
        let named = BindError::TemplateNotFound {
            name: Some("rows".to_string()),
        };
        assert_eq!(named.to_string(), "template not found: rows");

        let unnamed = BindError::TemplateNotFound { name: None };
        assert!(unnamed.to_string().contains("context"));
    }
}
