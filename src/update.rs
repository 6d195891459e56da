//! Translating partial documents into update-operator documents.

use bson::Document;

/// The operator that sets fields to the given values.
pub const SET_OPERATOR: &str = "$set";

/// Wraps a partial document so that it means "set these fields" instead of
/// "replace the whole document". Values are passed through untouched.
/// ```
/// # use mongo_connector::update::set_operator;
/// # use mongo_connector::prelude::*;
/// assert_eq!(set_operator(doc!{ "age": 30 }), doc!{ "$set": { "age": 30 } });
/// assert_eq!(set_operator(doc!{}), doc!{ "$set": {} });
/// ```
pub fn set_operator(partial: Document) -> Document {
    doc!{ SET_OPERATOR: partial }
}

/// Prefixes every top-level key of an operator record with `$`, so that
/// `{ "set": {...}, "inc": {...} }` becomes `{ "$set": {...}, "$inc": {...} }`.
/// Keys that already start with `$` are kept as they are.
pub fn prefix_operators(operators: Document) -> Document {
    operators
        .into_iter()
        .map(|(key, value)| {
            if key.starts_with('$') {
                (key, value)
            } else {
                (format!("${}", key), value)
            }
        })
        .collect()
}

/// Returns `true` if the document's top-level keys are all update operators.
pub fn is_operator_document(update: &Document) -> bool {
    !update.is_empty() && update.keys().all(|key| key.starts_with('$'))
}
