//! Options for individual collection operations, and their results.
//!
//! Every option record is a plain serde type with camelCase keys, so it can
//! be built in Rust or deserialized from JSON. Unset fields leave the
//! corresponding driver default untouched.

use std::time::Duration;
use bson::{ Bson, Document };
use mongodb::options::{
    self as driver,
    Hint,
};
use crate::literal::{ Order, IndexType };
use crate::error::{ Error, ErrorKind, Result };

/// Options for `insert_one()` and `insert_many()`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InsertOptions {
    /// Skip document validation on the server.
    pub bypass_validation: Option<bool>,
    /// Stop at the first failed insertion (`insert_many()` only).
    pub ordered: Option<bool>,
    /// A comment attached to the command, visible in server logs.
    pub comment: Option<String>,
}

impl From<InsertOptions> for driver::InsertOneOptions {
    fn from(options: InsertOptions) -> Self {
        let mut result = driver::InsertOneOptions::default();
        result.bypass_document_validation = options.bypass_validation;
        result.comment = options.comment.map(Bson::String);
        result
    }
}

impl From<InsertOptions> for driver::InsertManyOptions {
    fn from(options: InsertOptions) -> Self {
        let mut result = driver::InsertManyOptions::default();
        result.bypass_document_validation = options.bypass_validation;
        result.ordered = options.ordered;
        result.comment = options.comment.map(Bson::String);
        result
    }
}

/// Options for `find()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindOptions {
    /// Sort document, e.g. `{ "age": -1 }`.
    pub sort: Option<Document>,
    /// Maximal number of documents to return.
    pub limit: Option<i64>,
    /// Number of documents to skip.
    pub skip: Option<u64>,
    /// Number of documents per server round-trip.
    pub batch_size: Option<u32>,
    /// An explicit projection. When set, it is sent verbatim instead of the
    /// projection derived from the result type.
    pub projection: Option<Document>,
}

impl FindOptions {
    /// Appends `field` to the sort document.
    pub fn sort_by<S: Into<String>>(mut self, field: S, order: Order) -> Self {
        self.sort.get_or_insert_with(Document::new).insert(field, order);
        self
    }

    /// Converts to driver options, using `derived` unless a projection
    /// was given explicitly. An empty projection is not sent at all.
    pub(crate) fn into_driver(self, derived: Document) -> driver::FindOptions {
        let projection = self.projection.unwrap_or(derived);
        let mut result = driver::FindOptions::default();

        result.sort = self.sort;
        result.limit = self.limit;
        result.skip = self.skip;
        result.batch_size = self.batch_size;
        result.projection = if projection.is_empty() { None } else { Some(projection) };
        result
    }
}

/// Options for `find_one()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FindOneOptions {
    /// Sort document; the first document in this order is returned.
    pub sort: Option<Document>,
    /// An explicit projection, sent verbatim instead of the derived one.
    pub projection: Option<Document>,
}

impl FindOneOptions {
    /// Appends `field` to the sort document.
    pub fn sort_by<S: Into<String>>(mut self, field: S, order: Order) -> Self {
        self.sort.get_or_insert_with(Document::new).insert(field, order);
        self
    }

    /// Same as `FindOptions::into_driver()`.
    pub(crate) fn into_driver(self, derived: Document) -> driver::FindOneOptions {
        let projection = self.projection.unwrap_or(derived);
        let mut result = driver::FindOneOptions::default();

        result.sort = self.sort;
        result.projection = if projection.is_empty() { None } else { Some(projection) };
        result
    }
}

/// Options for `count_documents()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CountOptions {
    /// Maximal number of documents to count.
    pub limit: Option<u64>,
    /// Number of documents to skip before counting.
    pub skip: Option<u64>,
    /// Server-side time limit of the operation, in milliseconds.
    pub max_time_ms: Option<u64>,
    /// Index to use, given by its key document.
    pub hint: Option<Document>,
}

impl From<CountOptions> for driver::CountOptions {
    fn from(options: CountOptions) -> Self {
        let mut result = driver::CountOptions::default();
        result.limit = options.limit;
        result.skip = options.skip;
        result.max_time = options.max_time_ms.map(Duration::from_millis);
        result.hint = options.hint.map(Hint::Keys);
        result
    }
}

/// Options for `update_one()` and `update_many()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateOptions {
    /// Insert a new document if none matches the filter.
    pub upsert: Option<bool>,
    /// Skip document validation on the server.
    pub bypass_validation: Option<bool>,
    /// Index to use, given by its key document.
    /// Takes precedence over `hint_string`.
    pub hint: Option<Document>,
    /// Index to use, given by its name.
    pub hint_string: Option<String>,
    /// A comment attached to the command, visible in server logs.
    pub comment: Option<String>,
}

impl From<UpdateOptions> for driver::UpdateOptions {
    fn from(options: UpdateOptions) -> Self {
        let mut result = driver::UpdateOptions::default();
        result.upsert = options.upsert;
        result.bypass_document_validation = options.bypass_validation;
        result.hint = match (options.hint, options.hint_string) {
            (Some(keys), _) => Some(Hint::Keys(keys)),
            (None, Some(name)) => Some(Hint::Name(name)),
            (None, None) => None,
        };
        result.comment = options.comment.map(Bson::String);
        result
    }
}

/// Options for `create_index()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IndexOptions {
    /// Build the index in the background (ignored by servers since 4.2).
    pub background: Option<bool>,
    /// Reject documents that would duplicate an indexed value.
    pub unique: Option<bool>,
    /// Name of the index. Generated by the server from the keys if unset.
    pub name: Option<String>,
    /// Only index documents that contain the indexed fields.
    pub sparse: Option<bool>,
    /// Lifetime of documents in a TTL index, in seconds.
    pub expire_after_seconds: Option<u64>,
    /// Text index field weights.
    pub weights: Option<Document>,
    /// Text index default language.
    pub default_language: Option<String>,
    /// Text index language override field name.
    pub language_override: Option<String>,
    /// Precision of a `2d` index, in bits.
    pub bits: Option<u32>,
    /// Lower bound of a `2d` index.
    pub min: Option<f64>,
    /// Upper bound of a `2d` index.
    pub max: Option<f64>,
    /// Only index documents matching this filter.
    pub partial_filter_expression: Option<Document>,
    /// Hide the index from the query planner.
    pub hidden: Option<bool>,
}

impl From<IndexOptions> for driver::IndexOptions {
    fn from(options: IndexOptions) -> Self {
        let mut result = driver::IndexOptions::default();
        result.background = options.background;
        result.unique = options.unique;
        result.name = options.name;
        result.sparse = options.sparse;
        result.expire_after = options.expire_after_seconds.map(Duration::from_secs);
        result.weights = options.weights;
        result.default_language = options.default_language;
        result.language_override = options.language_override;
        result.bits = options.bits;
        result.min = options.min;
        result.max = options.max;
        result.partial_filter_expression = options.partial_filter_expression;
        result.hidden = options.hidden;
        result
    }
}

/// An index, as returned by `list_indexes()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Index {
    /// The name of the index.
    pub name: String,
    /// The indexed keys and their index types.
    pub key: Document,
    /// Whether the index enforces uniqueness.
    pub unique: bool,
    /// Whether the index is sparse.
    pub sparse: bool,
    /// Whether the index is hidden from the query planner.
    pub hidden: bool,
    /// TTL of indexed documents, in seconds.
    pub expire_after_seconds: Option<u64>,
}

impl Index {
    /// The indexed fields and their index types, in key order.
    pub fn fields(&self) -> Result<Vec<(&str, IndexType)>> {
        self.key
            .iter()
            .map(|(field, value)| match IndexType::from_raw(value) {
                Some(index_type) => Ok((field.as_str(), index_type)),
                None => Err(Error::new(
                    ErrorKind::IllTypedDocumentField,
                    format!("index `{}`: unrecognized key value for `{}`: {}", self.name, field, value)
                )),
            })
            .collect()
    }
}

/// The outcome of a successful `update_one()` or `update_many()` operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    /// The number of documents matched by the filter.
    pub matched_count: u64,
    /// The number of documents actually modified.
    pub modified_count: u64,
    /// The `_id` of the inserted document, if an upsert happened.
    pub upserted_id: Option<Bson>,
}

impl From<mongodb::results::UpdateResult> for UpdateResult {
    fn from(result: mongodb::results::UpdateResult) -> Self {
        UpdateResult {
            matched_count: result.matched_count,
            modified_count: result.modified_count,
            upserted_id: result.upserted_id,
        }
    }
}

/// The outcome of a successful `delete_one()` or `delete_many()` operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    /// The number of deleted documents.
    pub deleted_count: u64,
    /// Whether the server acknowledged the write.
    pub acknowledged: bool,
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorExt;
    use super::*;

    #[test]
    fn find_options_prefer_explicit_projection() {
        let explicit = FindOptions {
            projection: Some(doc!{ "age": 1 }),
            batch_size: Some(16),
            ..FindOptions::default()
        };
        let options = explicit.into_driver(doc!{ "_id": 0, "name": 1 });

        assert_eq!(options.projection, Some(doc!{ "age": 1 }));
        assert_eq!(options.batch_size, Some(16));
        assert_eq!(options.skip, None);

        let derived = FindOptions::default().into_driver(doc!{ "_id": 0, "name": 1 });
        assert_eq!(derived.projection, Some(doc!{ "_id": 0, "name": 1 }));

        let dynamic = FindOptions::default().into_driver(Document::new());
        assert_eq!(dynamic.projection, None);
    }

    #[test]
    fn find_one_options_prefer_explicit_projection() {
        let explicit = FindOneOptions {
            projection: Some(doc!{ "name": 1, "age": 1 }),
            ..FindOneOptions::default()
        }.sort_by("age", Order::Descending);
        let options = explicit.into_driver(doc!{ "_id": 0, "name": 1 });

        assert_eq!(options.projection, Some(doc!{ "name": 1, "age": 1 }));
        assert_eq!(options.sort, Some(doc!{ "age": -1 }));

        let derived = FindOneOptions::default().into_driver(doc!{ "_id": 0, "name": 1 });
        assert_eq!(derived.projection, Some(doc!{ "_id": 0, "name": 1 }));
        assert_eq!(derived.sort, None);

        let dynamic = FindOneOptions::default().into_driver(Document::new());
        assert_eq!(dynamic.projection, None);
    }

    #[test]
    fn update_hint_document_takes_precedence() {
        let both = UpdateOptions {
            hint: Some(doc!{ "name": 1 }),
            hint_string: Some(String::from("name_1")),
            ..UpdateOptions::default()
        };
        let name_only = UpdateOptions {
            hint_string: Some(String::from("name_1")),
            upsert: Some(true),
            ..UpdateOptions::default()
        };

        let both: driver::UpdateOptions = both.into();
        let name_only: driver::UpdateOptions = name_only.into();

        assert!(matches!(both.hint, Some(Hint::Keys(ref keys)) if *keys == doc!{ "name": 1 }));
        assert!(matches!(name_only.hint, Some(Hint::Name(ref name)) if name == "name_1"));
        assert_eq!(name_only.upsert, Some(true));
    }

    #[test]
    fn options_deserialize_from_camel_case_json() {
        let count: CountOptions = serde_json::from_str(
            r#"{ "limit": 10, "maxTimeMs": 250 }"#
        ).unwrap();
        let insert: InsertOptions = serde_json::from_str(
            r#"{ "bypassValidation": true, "comment": "bulk load" }"#
        ).unwrap();

        assert_eq!(count, CountOptions {
            limit: Some(10),
            max_time_ms: Some(250),
            ..CountOptions::default()
        });
        assert_eq!(insert.bypass_validation, Some(true));
        assert_eq!(insert.ordered, None);

        let driver_count: driver::CountOptions = count.into();
        assert_eq!(driver_count.max_time, Some(Duration::from_millis(250)));
    }

    #[test]
    fn index_options_map_ttl_to_duration() {
        let options = IndexOptions {
            name: Some(String::from("session_ttl")),
            expire_after_seconds: Some(3600),
            unique: Some(false),
            ..IndexOptions::default()
        };
        let options: driver::IndexOptions = options.into();

        assert_eq!(options.expire_after, Some(Duration::from_secs(3600)));
        assert_eq!(options.name.as_deref(), Some("session_ttl"));
        assert_eq!(options.unique, Some(false));
    }

    #[test]
    fn index_deserializes_from_list_indexes_output() {
        let raw = doc!{
            "v": 2,
            "key": { "createdAt": 1 },
            "name": "createdAt_1",
            "expireAfterSeconds": 60_i64,
        };
        let index: Index = bson::from_document(raw).unwrap();

        assert_eq!(index.name, "createdAt_1");
        assert_eq!(index.key, doc!{ "createdAt": 1 });
        assert_eq!(index.expire_after_seconds, Some(60));
        assert!(!index.unique);
    }

    #[test]
    fn index_fields_are_typed() {
        let index = Index {
            name: String::from("geo"),
            key: doc!{ "location": "2dsphere", "createdAt": -1.0 },
            ..Index::default()
        };

        assert_eq!(index.fields().unwrap(), vec![
            ("location", IndexType::Geo2DSphere),
            ("createdAt", IndexType::Ordered(Order::Descending)),
        ]);

        let broken = Index {
            name: String::from("broken"),
            key: doc!{ "x": true },
            ..Index::default()
        };
        let error = broken.fields().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::IllTypedDocumentField);
        assert!(error.message().contains("`x`"));
    }

    #[test]
    fn sort_by_accumulates_keys() {
        let options = FindOptions::default()
            .sort_by("age", Order::Descending)
            .sort_by("name", Order::Ascending);

        assert_eq!(options.sort, Some(doc!{ "age": -1, "name": 1 }));
    }
}
