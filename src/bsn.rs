//! BSON serialization and deserialization helpers.

use std::borrow::Borrow;
use std::convert::TryFrom;
use serde_json::Value;
use bson::{ Bson, Document, document::ValueAccessError };
use serde::{ Serialize, de::DeserializeOwned };
use crate::error::{ Error, ErrorKind, Result };

/// Methods for dynamically type-checking JSON.
pub trait JsonExt: Sized {
    /// Ensures that this tree of values doesn't contain integers
    /// which are not expressible by `i64` (e.g. too big `u64`s), which
    /// would otherwise silently become floating-point numbers.
    ///
    /// If this check succeeds, `self` is converted into a `Bson` tree,
    /// interpreting MongoDB extended JSON (`{"$oid": "..."}` etc.) along
    /// the way. Key order is preserved by the `preserve_order` feature of
    /// the `serde_json` crate.
    fn try_into_bson(self) -> Result<Bson>;

    /// Like `try_into_bson()`, but also ensures that the result is a `Document`.
    fn try_into_doc(self) -> Result<Document> {
        self.try_into_bson().and_then(BsonExt::try_into_doc)
    }
}

/// Methods for dynamically type-checking BSON.
pub trait BsonExt: Sized {
    /// Ensures that the BSON value is a `Document` and unwraps it.
    fn try_into_doc(self) -> Result<Document>;
}

impl JsonExt for Value {
    fn try_into_bson(self) -> Result<Bson> {
        check_numbers(&self)?;
        Bson::try_from(self).map_err(From::from)
    }
}

/// Recursively rejects numbers that are neither `i64` nor `f64`.
fn check_numbers(value: &Value) -> Result<()> {
    match *value {
        Value::Number(ref n) => if n.is_i64() || n.is_f64() {
            Ok(())
        } else {
            Err(Error::new(
                ErrorKind::BsonEncoding,
                format!("Value `{}` can't be represented in BSON", n)
            ))
        },
        Value::Array(ref values) => values.iter().try_for_each(check_numbers),
        Value::Object(ref values) => values.values().try_for_each(check_numbers),
        _ => Ok(()),
    }
}

impl BsonExt for Bson {
    fn try_into_doc(self) -> Result<Document> {
        match self {
            Bson::Document(doc) => Ok(doc),
            value => Err(Error::with_cause(
                format!("expected Document, got {:?}", value.element_type()),
                ValueAccessError::UnexpectedType,
            ))
        }
    }
}

/// Parses a JSON (or MongoDB extended JSON) string into a `Document`.
/// ```
/// # use mongo_connector::bsn::parse_document;
/// # use mongo_connector::prelude::*;
/// # fn main() -> ConnectorResult<()> {
/// let filter = parse_document(r#"{ "age": { "$gt": 21 } }"#)?;
/// assert_eq!(filter, doc!{ "age": { "$gt": 21 } });
/// # Ok(())
/// # }
/// ```
pub fn parse_document(json: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(json)?;
    value.try_into_doc()
}

/// Parses a JSON array of aggregation stages.
pub fn parse_pipeline(json: &str) -> Result<Vec<Document>> {
    let value: Value = serde_json::from_str(json)?;

    match value {
        Value::Array(stages) => stages.into_iter().map(JsonExt::try_into_doc).collect(),
        other => Err(Error::new(
            ErrorKind::JsonTranscoding,
            format!("expected an array of pipeline stages, got `{}`", other)
        )),
    }
}

/// Creates a BSON `Document` out of a serializable value.
pub fn serialize_document<T: Serialize + ?Sized>(value: &T) -> Result<Document> {
    bson::to_bson(value)
        .map_err(From::from)
        .and_then(BsonExt::try_into_doc)
}

/// Creates an array of `Document`s from an iterator over serializable values.
pub fn serialize_documents<T, I>(values: I) -> Result<Vec<Document>>
    where T: Serialize,
          I: IntoIterator,
          I::Item: Borrow<T>,
{
    values
        .into_iter()
        .map(|val| serialize_document(val.borrow()))
        .collect()
}

/// Deserializes a strongly-typed value from BSON.
pub fn deserialize_bson<T: DeserializeOwned>(value: Bson) -> Result<T> {
    bson::from_bson(value).map_err(From::from)
}

#[cfg(test)]
mod tests {
    use crate::error::Result;
    use crate::prelude::*;
    use super::*;

    #[test]
    fn json_ext_try_into_bson() -> Result<()> {
        let oid = ObjectId::new();
        let good = serde_json::json!([{ "key": { "$oid": oid.to_hex() } }]);
        let bad = serde_json::to_value(&u64::MAX)?;

        assert_eq!(good.try_into_bson()?, bson!([{ "key": oid }]));
        assert!(bad.try_into_bson()
                .unwrap_err()
                .to_string()
                .contains("can't be represented in BSON"));

        Ok(())
    }

    #[test]
    fn json_key_order_is_preserved() -> Result<()> {
        let doc = parse_document(r#"{ "zeta": 1, "alpha": 2, "mid": { "b": 1, "a": 2 } }"#)?;
        let keys: Vec<&String> = doc.keys().collect();

        assert_eq!(keys, ["zeta", "alpha", "mid"]);
        assert!(parse_document("[1, 2]").is_err());
        assert!(parse_document("{ not json").is_err());

        Ok(())
    }

    #[test]
    fn bson_ext_try_into_doc() -> Result<()> {
        let doc = bson!({ "foo": "bar", "qux": 3.14 });
        let other = bson!([{ "key": "value" }, false, null]);

        assert_eq!(doc.try_into_doc()?,
                   doc!{ "foo": "bar", "qux": 3.14 });

        assert!(other.try_into_doc().is_err());

        Ok(())
    }

    #[test]
    fn pipeline_from_json() -> Result<()> {
        let pipeline = parse_pipeline(r#"[
            { "$match": { "age": { "$gte": 18 } } },
            { "$sort": { "name": 1 } }
        ]"#)?;

        assert_eq!(pipeline, vec![
            doc!{ "$match": { "age": { "$gte": 18 } } },
            doc!{ "$sort": { "name": 1 } },
        ]);
        assert!(parse_pipeline("[]")?.is_empty());
        assert!(parse_pipeline(r#"{ "$match": {} }"#).is_err());
        assert!(parse_pipeline(r#"[{ "$match": {} }, 42]"#).is_err());

        Ok(())
    }

    #[test]
    fn serialize_one_document() -> Result<()> {
        #[derive(Serialize)]
        struct Number { value: u64 }

        let good = Number { value: i64::MAX as u64 };
        let bad = Number { value: i64::MAX as u64 + 1 };
        let bad_nodoc: i64 = 0;

        assert_eq!(serialize_document(&good)?, doc!{ "value": i64::MAX });
        assert!(serialize_document(&bad).is_err());
        assert!(serialize_document(&bad_nodoc)
                .unwrap_err()
                .to_string()
                .contains("expected Document, got Int64"));

        Ok(())
    }

    #[test]
    fn serialize_many_documents() -> Result<()> {
        #[derive(Serialize)]
        struct Number { value: u64 }

        let good = Number { value: 42 };
        let bad = Number { value: u64::MAX };

        assert_eq!(serialize_documents::<Number, _>(vec![&good, &good])?,
                   vec![doc!{ "value": 42_i64 }, doc!{ "value": 42_i64 }]);
        assert!(serialize_documents::<Number, _>(vec![&good, &bad]).is_err());

        Ok(())
    }
}
