//! # mongo_connector: typed reads and partial updates for MongoDB
//!
//! This library sits on top of the `mongodb` driver and lets callers work
//! with statically-typed result records instead of raw BSON. The shape of
//! the result type drives what is asked of the server: only the fields the
//! type declares are projected, and `_id` is suppressed unless the type
//! asks for it.
//!
//! ### The Prelude
//!
//! The most frequently used types, from this crate as well as from `bson`,
//! are re-exported under the module [`prelude`](prelude/index.html):
//!
//! ```rust
//! use mongo_connector::prelude::*;
//! ```
//!
//! ### Result shapes
//!
//! A [`Shape`](shape/trait.Shape.html) describes the fields a type expects
//! to read back. It is usually derived, and the derive respects Serde's
//! renaming and skipping attributes:
//!
//! ```
//! # #[macro_use]
//! # extern crate serde_derive;
//! # use mongo_connector::prelude::*;
//! #
//! #[derive(Debug, Deserialize, Shape)]
//! struct Address {
//!     city: String,
//!     zip: Option<String>,
//! }
//!
//! #[derive(Debug, Deserialize, Shape)]
//! #[serde(rename_all = "camelCase")]
//! struct Person {
//!     full_name: String,
//!     address: Address,
//!     tags: Vec<String>,
//!     #[serde(skip)]
//!     cached_age: Option<u32>,
//! }
//!
//! # fn main() {
//! assert_eq!(projection::<Person>(), doc!{
//!     "_id": 0,
//!     "fullName": 1,
//!     "address.city": 1,
//!     "address.zip": 1,
//!     "tags": 1,
//! });
//! # }
//! ```
//!
//! Types that declare no fields, such as `Document` or maps, are *dynamic*:
//! they receive whole documents and no projection is sent at all.
//! Self-referential types are projected down to the point of recursion,
//! which is then included as an opaque subtree.
//!
//! ### Connecting
//!
//! A [`Client`](client/struct.Client.html) is built from a structured
//! [`ConnectionConfig`](config/struct.ConnectionConfig.html) or from a
//! connection string. Configuration mistakes are reported by `connect()`
//! itself, before any network traffic happens.
//!
//! ```no_run
//! # use mongo_connector::prelude::*;
//! # fn main() -> ConnectorResult<()> {
//! let config = ConnectionConfig::from_json(r#"{
//!     "serverAddress": { "host": "localhost", "port": 27017 },
//!     "auth": { "mechanism": "SCRAM_SHA_256", "username": "app", "password": "secret" },
//!     "options": { "maxPoolSize": 16, "readPreference": "primaryPreferred" }
//! }"#)?;
//! let client = Client::connect(&config)?;
//! let people = client.database("directory").collection("people");
//! # Ok(())
//! # }
//! ```
//!
//! ### Operations
//!
//! Writes accept any `Serialize` type. Reads are typed per call, and return
//! a [`Cursor`](cursor/struct.Cursor.html) that must be closed explicitly
//! if it is not read to the end.
//!
//! ```no_run
//! # #[macro_use]
//! # extern crate serde_derive;
//! # use mongo_connector::prelude::*;
//! #
//! #[derive(Debug, Serialize, Deserialize, Shape)]
//! struct Person {
//!     name: String,
//!     age: u32,
//! }
//!
//! #[derive(Debug, Deserialize, Shape)]
//! struct Name {
//!     name: String,
//! }
//!
//! # fn main() -> ConnectorResult<()> {
//! # let people = Client::with_uri("mongodb://localhost:27017")?
//! #     .database("directory")
//! #     .collection("people");
//! people.insert_many::<Person, _>(
//!     vec![
//!         Person { name: "Jim".into(), age: 21 },
//!         Person { name: "Sam".into(), age: 25 },
//!     ],
//!     InsertOptions::default(),
//! )?;
//!
//! // Only `name` is fetched: the projection is `{ "_id": 0, "name": 1 }`.
//! let mut names = people.find::<Name>(doc!{}, FindOptions::default())?;
//! while let Some(name) = names.try_next()? {
//!     println!("{}", name.name);
//! }
//! names.close()?;
//!
//! // Partial updates only touch the given fields.
//! let result = people.update_one(doc!{ "name": "Jim" }, doc!{ "age": 22 }, UpdateOptions::default())?;
//! assert_eq!(result.matched_count, 1);
//!
//! // Aggregation results are projected the same way, unless the
//! // pipeline already has a `$project` stage.
//! let adults = people.aggregate::<Name>(vec![doc!{ "$match": { "age": { "$gte": 18 } } }])?;
//! # drop(adults);
//! # Ok(())
//! # }
//! ```
//!
//! ### Errors
//!
//! Every fallible function returns an [`error::Result`](error/type.Result.html).
//! Errors fall into two categories: `Database` errors were reported by the
//! server or the driver, `Application` errors are caused by the caller's
//! input, configuration or result types.

#![doc(html_root_url = "https://docs.rs/mongo_connector/0.1.0")]
#![deny(missing_debug_implementations, missing_copy_implementations,
        trivial_casts, trivial_numeric_casts,
        unsafe_code,
        unused_import_braces, missing_docs)]
#![allow(clippy::single_match, clippy::match_same_arms, clippy::match_ref_pats,
         clippy::clone_on_ref_ptr, clippy::needless_pass_by_value,
         clippy::new_without_default)]
#![deny(clippy::wrong_self_convention, clippy::used_underscore_binding,
        clippy::similar_names, clippy::missing_docs_in_private_items,
        clippy::non_ascii_literal, clippy::unicode_not_nfc,
        clippy::unwrap_used, clippy::expect_used,
        clippy::int_plus_one, clippy::string_add_assign, clippy::if_not_else,
        clippy::invalid_upcast_comparisons,
        clippy::cast_precision_loss, clippy::cast_lossless,
        clippy::cast_possible_wrap, clippy::cast_possible_truncation,
        clippy::mutex_integer, clippy::mut_mut,
        clippy::print_stdout, clippy::mem_forget, clippy::maybe_infinite_iter)]

#[macro_use]
extern crate bson;
#[macro_use]
extern crate serde_derive;

// Lets the derive macro refer to `::mongo_connector` from within this crate.
extern crate self as mongo_connector;

pub mod shape;
pub mod projection;
pub mod update;
pub mod cursor;
pub mod client;
pub mod db;
pub mod coll;
pub mod config;
pub mod auth;
pub mod tls;
pub mod ops;
pub mod literal;
pub mod bsn;
pub mod error;
pub mod prelude;

#[cfg(feature = "derive")]
pub use mongo_connector_derive::Shape;
