//! Binding components
//!
//! [`directive`] interprets namespace attributes, [`placeholder`] handles
//! inline `{{key}}` markers, [`list`] drives clone-per-item binding and
//! [`table`] projects tabular data. [`value`] defines the value model they
//! all share.

pub mod directive;
pub mod list;
pub mod placeholder;
pub mod table;
pub mod value;
