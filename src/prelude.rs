//! The prelude provides re-exports of the most commonly used traits and
//! types for convenience, including ones from the `bson` crate.

pub use crate::{
    client::Client,
    db::Database,
    coll::Collection,
    cursor::{ Cursor, MismatchPolicy },
    config::{ ConnectionConfig, ConnectionOptions, ServerAddress },
    auth::{ AuthConfig, AuthMechanism },
    tls::{ TlsConfig, TlsProtocol },
    shape::{ Shape, TargetShape, FieldType, Primitive },
    projection::{ projection, augment_pipeline },
    update::set_operator,
    ops::*,
    literal::{ IndexType, Order },
    bsn::{ parse_document, parse_pipeline },
    error::ErrorExt,
    error::Error as ConnectorError,
    error::ErrorKind as ConnectorErrorKind,
    error::ErrorCategory as ConnectorErrorCategory,
    error::Result as ConnectorResult,
};
#[cfg(feature = "derive")]
pub use mongo_connector_derive::Shape;
pub use bson::{ Bson, Document, oid::ObjectId, doc, bson };
