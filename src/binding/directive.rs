//! Directive parsing and application
//!
//! A directive is an attribute in the reserved namespace:
//!
//! ```html
//! <span data-weft:text="title"></span>
//! <li data-weft:class=":isSelected selected-item">...</li>
//! <input data-weft:value="quantity" data-weft:disabled="?locked">
//! ```
//!
//! The attribute suffix selects the mutation target; the value carries an
//! optional modifier, the bind key to match, and an optional explicit
//! token. A directive with an empty value matches only keyless bind calls.

use markup5ever_rcdom::Handle;
use tracing::trace;

use crate::binding::value::BindValue;
use crate::config::MarkupConfig;
use crate::dom::{set_inner_html, tree};
use crate::error::{BindError, Result};

/// Leading modifier of a directive value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modifier {
    /// No modifier: plain content/attribute write
    None,
    /// `:` token add/remove on the named attribute by truthiness
    Token,
    /// `?` attribute presence toggle by truthiness
    Toggle,
    /// `?!` inverted presence toggle
    ToggleInverted,
}

/// A parsed directive
#[derive(Debug, Clone)]
pub struct Directive {
    /// Property suffix as written in the attribute name
    pub property: String,
    pub modifier: Modifier,
    /// Key this directive responds to; `None` matches keyless binds
    pub key: Option<String>,
    /// Explicit token following the key
    pub token: Option<String>,
}

/// Mutation target a property resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
enum Target {
    Text,
    Html,
    Class,
    Table,
    Value,
    Attr(String),
}

/// Result of a directive pass over a context
#[derive(Debug, Default)]
pub struct DirectiveOutcome {
    /// Number of directives whose key matched the bind call
    pub matched: usize,
    /// Elements whose `table` directive matched; the caller hands these to
    /// the table binder together with the bound value
    pub tables: Vec<Handle>,
}

/// Parse a directive value into modifier, key and explicit token
pub fn parse_value(raw: &str) -> (Modifier, Option<String>, Option<String>) {
    let raw = raw.trim();
    let (modifier, rest) = if let Some(rest) = raw.strip_prefix("?!") {
        (Modifier::ToggleInverted, rest)
    } else if let Some(rest) = raw.strip_prefix('?') {
        (Modifier::Toggle, rest)
    } else if let Some(rest) = raw.strip_prefix(':') {
        (Modifier::Token, rest)
    } else {
        (Modifier::None, raw)
    };

    let mut parts = rest.splitn(2, char::is_whitespace);
    let key = parts.next().filter(|k| !k.is_empty()).map(str::to_string);
    let token = parts
        .next()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    (modifier, key, token)
}

fn resolve_target(property: &str, modifier: Modifier) -> Result<Target> {
    let normalized: String = property
        .to_ascii_lowercase()
        .chars()
        .filter(|c| *c != '-' && *c != '_')
        .collect();
    let target = match normalized.as_str() {
        "text" | "innertext" | "textcontent" => Target::Text,
        "html" | "innerhtml" => Target::Html,
        "class" => Target::Class,
        "table" => Target::Table,
        "value" => Target::Value,
        _ => {
            // Any attribute name is a legal target, but a one-edit typo of
            // a known target is almost certainly a mistake
            if modifier == Modifier::None {
                if let Some(hint) = near_miss(&normalized) {
                    return Err(BindError::UnknownDirectiveProperty {
                        property: property.to_string(),
                        hint: Some(hint.to_string()),
                    });
                }
            }
            Target::Attr(property.to_string())
        }
    };
    Ok(target)
}

const KNOWN_TARGETS: [&str; 5] = ["text", "html", "class", "value", "table"];

fn near_miss(property: &str) -> Option<&'static str> {
    KNOWN_TARGETS
        .iter()
        .find(|t| within_one_edit(property, t))
        .copied()
}

/// Whether two strings are within one insertion, deletion or substitution
fn within_one_edit(a: &str, b: &str) -> bool {
    let (a, b): (Vec<char>, Vec<char>) = (a.chars().collect(), b.chars().collect());
    let (short, long) = if a.len() <= b.len() { (&a, &b) } else { (&b, &a) };
    match long.len() - short.len() {
        0 => short.iter().zip(long.iter()).filter(|(x, y)| x != y).count() == 1,
        1 => {
            let mut skipped = false;
            let mut i = 0;
            for c in long.iter() {
                if i < short.len() && short[i] == *c {
                    i += 1;
                } else if skipped {
                    return false;
                } else {
                    skipped = true;
                }
            }
            true
        }
        _ => false,
    }
}

/// Scan `context` and its descendants for directives matching the bind call
/// and apply their mutations
///
/// `key == None` applies only to directives with an empty stored value.
/// Null values are a no-op except for toggles, where null reads as falsy.
pub fn apply_directives(
    key: Option<&str>,
    value: &BindValue,
    context: &Handle,
    config: &MarkupConfig,
) -> Result<DirectiveOutcome> {
    expand_references(context, config)?;

    let mut outcome = DirectiveOutcome::default();
    for element in tree::descendant_elements(context) {
        for attr in tree::attr_names(&element) {
            if !config.is_directive_attr(&attr) {
                continue;
            }
            if attr == config.namespace {
                return Err(BindError::InvalidDirectiveSyntax { attr });
            }
            let property = attr[config.namespace.len() + 1..].to_string();
            if property.is_empty() {
                return Err(BindError::InvalidDirectiveSyntax { attr });
            }
            let raw = tree::get_attr(&element, &attr).unwrap_or_default();
            if raw.trim().starts_with('@') {
                continue; // handled by the expand pass
            }

            let (modifier, directive_key, token) = parse_value(&raw);
            if directive_key.as_deref() != key {
                continue;
            }
            let directive = Directive {
                property,
                modifier,
                key: directive_key,
                token,
            };
            outcome.matched += 1;
            apply_one(&directive, value, &element, &mut outcome)?;
        }
    }
    Ok(outcome)
}

fn apply_one(
    directive: &Directive,
    value: &BindValue,
    element: &Handle,
    outcome: &mut DirectiveOutcome,
) -> Result<()> {
    trace!(
        property = %directive.property,
        key = directive.key.as_deref().unwrap_or(""),
        "applying directive"
    );

    match directive.modifier {
        Modifier::Token => {
            let Some(token) = directive.token.clone().or_else(|| directive.key.clone()) else {
                return Ok(());
            };
            if value.is_truthy() {
                tree::add_token(element, &directive.property, &token);
            } else {
                tree::remove_token(element, &directive.property, &token);
            }
            return Ok(());
        }
        Modifier::Toggle | Modifier::ToggleInverted => {
            let mut on = value.is_truthy();
            if directive.modifier == Modifier::ToggleInverted {
                on = !on;
            }
            if on {
                tree::set_attr(
                    element,
                    &directive.property,
                    directive.token.as_deref().unwrap_or(""),
                );
            } else {
                tree::remove_attr(element, &directive.property);
            }
            return Ok(());
        }
        Modifier::None => {}
    }

    // Null is a silent no-op for content targets
    if value.is_null() {
        return Ok(());
    }

    let target = resolve_target(&directive.property, directive.modifier)?;

    if matches!(value, BindValue::Seq(_)) && target != Target::Table {
        return Err(BindError::IncompatibleBindData {
            key: directive.key.clone().unwrap_or_default(),
        });
    }

    match target {
        Target::Text => tree::set_text_content(element, &value.display()),
        Target::Html => set_inner_html(element, &value.display()),
        Target::Class => {
            let class = value.display();
            if !class.is_empty() {
                tree::add_token(element, "class", &class);
            }
        }
        Target::Value => apply_value_target(element, &value.display()),
        Target::Table => outcome.tables.push(element.clone()),
        Target::Attr(name) => tree::set_attr(element, &name, &value.display()),
    }
    Ok(())
}

/// Set a form control's value; select-like controls mark the matching
/// option selected and clear the others
fn apply_value_target(element: &Handle, value: &str) {
    match tree::element_name(element).as_deref() {
        Some("select") => {
            for option in tree::find_by_tag(element, "option") {
                let option_value = tree::get_attr(&option, "value")
                    .unwrap_or_else(|| tree::text_content(&option).trim().to_string());
                if option_value == value {
                    tree::set_attr(&option, "selected", "");
                } else {
                    tree::remove_attr(&option, "selected");
                }
            }
        }
        Some("textarea") => tree::set_text_content(element, value),
        _ => tree::set_attr(element, "value", value),
    }
}

/// Resolve `@attribute` references before directive evaluation
///
/// `ns:prop="@other"` copies the element's current `other` attribute value
/// into the directive's target, so an attribute can follow another
/// attribute's resolved value (for example an id filled in by a
/// placeholder). Reference directives take no part in key matching.
fn expand_references(context: &Handle, config: &MarkupConfig) -> Result<()> {
    for element in tree::descendant_elements(context) {
        for attr in tree::attr_names(&element) {
            if !config.is_directive_attr(&attr) || attr == config.namespace {
                continue;
            }
            let raw = tree::get_attr(&element, &attr).unwrap_or_default();
            let Some(referenced) = raw.trim().strip_prefix('@') else {
                continue;
            };
            let Some(resolved) = tree::get_attr(&element, referenced.trim()) else {
                continue;
            };
            let property = &attr[config.namespace.len() + 1..];
            if property.is_empty() {
                continue;
            }
            match resolve_target(property, Modifier::None)? {
                Target::Text => tree::set_text_content(&element, &resolved),
                Target::Html => set_inner_html(&element, &resolved),
                Target::Class => tree::add_token(&element, "class", &resolved),
                Target::Value => apply_value_target(&element, &resolved),
                Target::Attr(name) => tree::set_attr(&element, &name, &resolved),
                Target::Table => {}
            }
        }
    }
    Ok(())
}

/// Strip every reserved attribute from the context subtree
///
/// Run once binding is final; afterwards the markup carries no trace of
/// the binding vocabulary.
pub fn strip_markup(context: &Handle, config: &MarkupConfig) {
    for element in tree::descendant_elements(context) {
        for attr in tree::attr_names(&element) {
            if config.is_reserved_attr(&attr) {
                tree::remove_attr(&element, &attr);
            }
        }
    }
}
