//! Typed values for the entries of sort and index key documents.

use std::fmt;
use std::convert::TryFrom;
use bson::Bson;
use serde::{
    ser::{ Serialize, Serializer },
    de::{ self, Deserialize, Deserializer, Visitor },
};

/// Sort or index direction of a single field.
/// ```
/// # use mongo_connector::prelude::*;
/// let sorting = doc! {
///     "_id": Order::Ascending,
///     "zip": Order::Descending,
/// };
/// assert_eq!(sorting, doc!{
///     "_id":  1,
///     "zip": -1,
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Order {
    /// Smaller values first.
    Ascending  =  1,
    /// Greater values first.
    Descending = -1,
}

impl Order {
    /// The direction denoted by a raw key value, if any. Drivers and
    /// shells write directions as any numeric type, so doubles are accepted
    /// as long as they are integral.
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    pub fn from_raw(value: &Bson) -> Option<Self> {
        let direction = match *value {
            Bson::Int32(n) => i64::from(n),
            Bson::Int64(n) => n,
            Bson::Double(x) if x.fract() == 0.0 => x as i64,
            _ => return None,
        };

        match direction {
            1 => Some(Order::Ascending),
            -1 => Some(Order::Descending),
            _ => None,
        }
    }
}

impl Default for Order {
    fn default() -> Self {
        Order::Ascending
    }
}

impl From<Order> for Bson {
    fn from(order: Order) -> Self {
        Bson::Int32(order as i32)
    }
}

impl Serialize for Order {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_i32(*self as i32)
    }
}

impl<'a> Deserialize<'a> for Order {
    fn deserialize<D: Deserializer<'a>>(de: D) -> Result<Self, D::Error> {
        match de.deserialize_any(IndexTypeVisitor)? {
            IndexType::Ordered(order) => Ok(order),
            other => Err(de::Error::custom(format!("expected a direction, found `{}`", other))),
        }
    }
}

/// The kind of a single field of an index key.
/// ```
/// # use mongo_connector::prelude::*;
/// let keys = doc!{
///     "description": IndexType::Text,
///     "body.mass": IndexType::Ordered(Order::Ascending),
///     "location": IndexType::Geo2DSphere,
/// };
/// assert_eq!(keys, doc!{
///     "description": "text",
///     "body.mass": 1,
///     "location": "2dsphere",
/// });
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexType {
    /// Ascending or descending B-tree key.
    Ordered(Order),
    /// Full-text search key.
    Text,
    /// Hashed key, for hash-based sharding.
    Hashed,
    /// Planar geospatial key.
    Geo2D,
    /// Spherical geospatial key.
    Geo2DSphere,
}

impl IndexType {
    /// Names of the string-valued index types, as the server spells them.
    const NAMED: &'static [(&'static str, IndexType)] = &[
        ("text", IndexType::Text),
        ("hashed", IndexType::Hashed),
        ("2d", IndexType::Geo2D),
        ("2dsphere", IndexType::Geo2DSphere),
    ];

    /// Interprets one value of an index key document.
    pub fn from_raw(value: &Bson) -> Option<Self> {
        match *value {
            Bson::String(ref name) => Self::NAMED
                .iter()
                .find(|&&(known, _)| known == name)
                .map(|&(_, index_type)| index_type),
            ref number => Order::from_raw(number).map(IndexType::Ordered),
        }
    }
}

impl fmt::Display for IndexType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match Bson::from(*self) {
            Bson::String(name) => f.write_str(&name),
            other => other.fmt(f),
        }
    }
}

impl From<IndexType> for Bson {
    fn from(index_type: IndexType) -> Self {
        match index_type {
            IndexType::Ordered(order) => order.into(),
            named => IndexType::NAMED
                .iter()
                .find(|&&(_, known)| known == named)
                .map_or(Bson::Null, |&(name, _)| Bson::from(name)),
        }
    }
}

impl From<Order> for IndexType {
    fn from(order: Order) -> Self {
        IndexType::Ordered(order)
    }
}

impl Serialize for IndexType {
    fn serialize<S: Serializer>(&self, ser: S) -> Result<S::Ok, S::Error> {
        Bson::from(*self).serialize(ser)
    }
}

impl<'a> Deserialize<'a> for IndexType {
    fn deserialize<D: Deserializer<'a>>(de: D) -> Result<Self, D::Error> {
        de.deserialize_any(IndexTypeVisitor)
    }
}

/// Accepts the raw representation of an index key entry: a direction
/// number or the name of an index type.
struct IndexTypeVisitor;

impl IndexTypeVisitor {
    /// Shared by every `visit_*` method.
    fn interpret<E: de::Error>(raw: Bson) -> Result<IndexType, E> {
        IndexType::from_raw(&raw).ok_or_else(
            || E::custom(format!("unrecognized index key value: {}", raw))
        )
    }
}

impl<'a> Visitor<'a> for IndexTypeVisitor {
    type Value = IndexType;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("1, -1 or the name of an index type")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Self::interpret(Bson::Int64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Self::interpret(Bson::Int64(i64::try_from(v).unwrap_or(i64::MAX)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Self::interpret(Bson::Double(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Self::interpret(Bson::from(v))
    }
}

#[cfg(test)]
mod tests {
    use bson::{ from_bson, to_bson };
    use super::*;

    #[test]
    fn directions_from_any_number() {
        assert_eq!(Order::from_raw(&Bson::Int32(-1)), Some(Order::Descending));
        assert_eq!(Order::from_raw(&Bson::Int64(1)), Some(Order::Ascending));
        assert_eq!(Order::from_raw(&Bson::Double(-1.0)), Some(Order::Descending));
        assert_eq!(Order::from_raw(&Bson::Double(0.5)), None);
        assert_eq!(Order::from_raw(&Bson::Int32(2)), None);
        assert_eq!(Order::from_raw(&Bson::from("1")), None);
    }

    #[test]
    fn order_through_serde() {
        assert_eq!(to_bson(&Order::Descending).ok(), Some(Bson::Int32(-1)));
        assert_eq!(from_bson::<Order>(Bson::Double(1.0)).ok(), Some(Order::Ascending));
        assert!(from_bson::<Order>(Bson::from("text"))
                .unwrap_err()
                .to_string()
                .contains("expected a direction"));
        assert!(from_bson::<Order>(Bson::Int32(0)).is_err());
    }

    #[test]
    fn index_types_from_raw_values() {
        assert_eq!(from_bson::<IndexType>(Bson::Int32(1)).ok(),
                   Some(IndexType::Ordered(Order::Ascending)));
        assert_eq!(from_bson::<IndexType>(Bson::from("hashed")).ok(),
                   Some(IndexType::Hashed));
        assert_eq!(IndexType::from_raw(&Bson::from("2d")), Some(IndexType::Geo2D));
        assert!(from_bson::<IndexType>(Bson::from("Ascending"))
                .unwrap_err()
                .to_string()
                .contains("unrecognized index key value"));
        assert!(from_bson::<IndexType>(Bson::Boolean(true)).is_err());
    }

    #[test]
    fn index_type_display() {
        assert_eq!(IndexType::Geo2DSphere.to_string(), "2dsphere");
        assert_eq!(IndexType::Ordered(Order::Descending).to_string(), "-1");
    }
}
