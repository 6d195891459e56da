//! Integration tests for checking high-level functionality of the most
//! important moving parts against a live server. Namely, these tests
//! exercise the following modules:
//! * [`client`](client/index.html)
//! * [`db`](db/index.html)
//! * [`coll`](coll/index.html)
//! * [`cursor`](cursor/index.html)
//! * [`ops`](ops/index.html)
//!
//! The server is taken from the `MONGODB_URI` environment variable. When it
//! is not set, every test returns early without touching the network.

#[macro_use]
extern crate scopeguard;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate serde_derive;
extern crate mongo_connector;

use std::env;
use mongo_connector::prelude::*;

/// The environment variable holding the connection string of the test server.
static URI_VAR: &str = "MONGODB_URI";
/// The database all test collections live in.
static DB_NAME: &str = "mongo_connector_test_db";

lazy_static! {
    /// We don't care that the client is not RAII-destroyed. Its resources
    /// (eg. the connection pool) are cleaned up by the OS at exit.
    static ref DB_HANDLE: Option<Database> = {
        env::var(URI_VAR).ok().map(|uri| {
            Client::with_uri(&uri)
                .expect("can't connect to mongod server")
                .database(DB_NAME)
        })
    };
}

/// Runs the test body with a fresh collection named after the test, which
/// is dropped again once the body finishes (or panics). Without a server,
/// the test is skipped.
macro_rules! with_collection {
    ($name:expr, |$coll:ident| $body:block) => {
        let db = match *DB_HANDLE {
            Some(ref db) => db,
            None => {
                println!("{} is not set; skipping {}", URI_VAR, $name);
                return;
            }
        };
        let $coll = db.collection($name);

        $coll.drop().expect("can't drop collection before test");
        defer!({
            $coll.drop().expect("can't drop collection after test");
        });

        $body
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Shape)]
struct Person {
    name: String,
    age: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Shape)]
struct Name {
    name: String,
}

fn people() -> Vec<Person> {
    vec![
        Person { name: String::from("Jim"), age: 21 },
        Person { name: String::from("Sam"), age: 30 },
    ]
}

#[test]
fn insert_and_count() {
    with_collection!("insert_and_count", |coll| {
        let ids = coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| match *id { Bson::ObjectId(_) => true, _ => false }));

        let no_ids = coll.insert_many::<Person, _>(Vec::<Person>::new(), InsertOptions::default()).unwrap();
        assert!(no_ids.is_empty());

        let explicit = doc!{ "_id": 42, "name": "Pam", "age": 44 };
        let id = coll.insert_one(&explicit, InsertOptions::default()).unwrap();
        assert_eq!(id, Bson::Int32(42));

        assert_eq!(coll.count_documents(doc!{}, CountOptions::default()).unwrap(), 3);
        assert_eq!(
            coll.count_documents(doc!{ "age": { "$gt": 25 } }, CountOptions::default()).unwrap(),
            2
        );

        let limited = CountOptions { limit: Some(1), ..CountOptions::default() };
        assert_eq!(coll.count_documents(doc!{}, limited).unwrap(), 1);
    });
}

#[test]
fn duplicate_id_is_a_database_error() {
    with_collection!("duplicate_id_is_a_database_error", |coll| {
        let person = doc!{ "_id": 1, "name": "Jim", "age": 21 };

        coll.insert_one(&person, InsertOptions::default()).unwrap();
        let error = coll.insert_one(&person, InsertOptions::default()).unwrap_err();

        assert_eq!(error.kind(), ConnectorErrorKind::MongoDbWriteException);
        assert_eq!(error.category(), ConnectorErrorCategory::Database);
        assert_eq!(error.detail().and_then(|detail| detail.get_i32("code").ok()), Some(11000));
    });
}

#[test]
fn find_projects_onto_the_result_shape() {
    with_collection!("find_projects_onto_the_result_shape", |coll| {
        coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();

        let options = FindOptions::default().sort_by("name", Order::Ascending);
        let names: Vec<Name> = coll
            .find(doc!{}, options)
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();

        assert_eq!(names, vec![
            Name { name: String::from("Jim") },
            Name { name: String::from("Sam") },
        ]);

        let raw: Vec<Document> = coll
            .find(doc!{ "name": "Jim" }, FindOptions::default())
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();

        assert_eq!(raw.len(), 1);
        assert!(raw[0].contains_key("_id"));
    });
}

#[test]
fn cursor_stops_at_the_first_mismatch() {
    with_collection!("cursor_stops_at_the_first_mismatch", |coll| {
        coll.insert_one(&doc!{ "name": "Jim", "age": 21 }, InsertOptions::default()).unwrap();
        coll.insert_one(&doc!{ "name": "Ann", "age": "unknown" }, InsertOptions::default()).unwrap();
        coll.insert_one(&doc!{ "name": "Sam", "age": 30 }, InsertOptions::default()).unwrap();

        let sorted = || FindOptions { sort: Some(doc!{ "name": 1 }), ..FindOptions::default() };

        let mut strict = coll.find::<Person>(doc!{}, sorted()).unwrap();
        assert!(strict.try_next().is_err());
        assert!(strict.is_closed());

        let tolerant: Vec<_> = coll
            .find::<Person>(doc!{}, sorted())
            .unwrap()
            .tolerate_mismatches()
            .collect();

        assert_eq!(tolerant.len(), 3);
        assert!(tolerant[0].is_err());
        assert_eq!(tolerant[1].as_ref().ok(), Some(&Person { name: String::from("Jim"), age: 21 }));
        assert_eq!(tolerant[2].as_ref().ok(), Some(&Person { name: String::from("Sam"), age: 30 }));
    });
}

#[test]
fn update_one_sets_fields() {
    with_collection!("update_one_sets_fields", |coll| {
        coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();

        let result = coll.update_one(
            doc!{ "name": "Jim" },
            doc!{ "age": 22 },
            UpdateOptions::default()
        ).unwrap();

        assert_eq!(result.matched_count, 1);
        assert_eq!(result.modified_count, 1);
        assert_eq!(result.upserted_id, None);

        let jim: Option<Person> = coll.find_one(doc!{ "name": "Jim" }, FindOneOptions::default()).unwrap();
        assert_eq!(jim, Some(Person { name: String::from("Jim"), age: 22 }));

        let nobody: Option<Person> = coll.find_one(doc!{ "name": "Nobody" }, FindOneOptions::default()).unwrap();
        assert_eq!(nobody, None);
    });
}

#[test]
fn update_with_operators_and_upsert() {
    with_collection!("update_with_operators_and_upsert", |coll| {
        coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();

        let result = coll.update_many_with_operators(
            doc!{},
            doc!{ "inc": { "age": 1 } },
            UpdateOptions::default()
        ).unwrap();

        assert_eq!(result.matched_count, 2);
        assert_eq!(result.modified_count, 2);

        let by_age = FindOneOptions::default().sort_by("age", Order::Descending);
        let oldest: Option<Person> = coll.find_one(doc!{}, by_age.clone()).unwrap();
        assert_eq!(oldest, Some(Person { name: String::from("Sam"), age: 31 }));

        let name_only = FindOneOptions { projection: Some(doc!{ "_id": 0, "name": 1 }), ..by_age };
        let oldest: Option<Document> = coll.find_one(doc!{}, name_only).unwrap();
        assert_eq!(oldest, Some(doc!{ "name": "Sam" }));

        let upsert = UpdateOptions { upsert: Some(true), ..UpdateOptions::default() };
        let result = coll.update_one(doc!{ "name": "Pam" }, doc!{ "age": 44 }, upsert).unwrap();

        assert_eq!(result.matched_count, 0);
        assert!(result.upserted_id.is_some());
        assert_eq!(coll.count_documents(doc!{}, CountOptions::default()).unwrap(), 3);
    });
}

#[test]
fn delete_reports_counts() {
    with_collection!("delete_reports_counts", |coll| {
        let none = coll.delete_many(doc!{ "name": "Nobody" }).unwrap();
        assert_eq!(none, DeleteResult { deleted_count: 0, acknowledged: true });

        coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();

        let one = coll.delete_one(doc!{ "age": { "$gt": 0 } }).unwrap();
        assert_eq!(one.deleted_count, 1);

        let rest = coll.delete_many(doc!{}).unwrap();
        assert_eq!(rest, DeleteResult { deleted_count: 1, acknowledged: true });
    });
}

#[test]
fn aggregate_appends_projection() {
    with_collection!("aggregate_appends_projection", |coll| {
        coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();

        let pipeline = vec![
            doc!{ "$match": { "age": { "$gt": 25 } } },
        ];
        let names: Vec<Name> = coll
            .aggregate(pipeline)
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();

        assert_eq!(names, vec![Name { name: String::from("Sam") }]);

        let pipeline = vec![
            doc!{ "$sort": { "age": 1 } },
            doc!{ "$project": { "_id": 0, "name": { "$toUpper": "$name" } } },
        ];
        let upper: Vec<Name> = coll
            .aggregate(pipeline)
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();

        assert_eq!(upper, vec![
            Name { name: String::from("JIM") },
            Name { name: String::from("SAM") },
        ]);
    });
}

#[test]
fn distinct_values() {
    with_collection!("distinct_values", |coll| {
        let mut everyone = people();
        everyone.push(Person { name: String::from("Jim"), age: 40 });
        coll.insert_many::<Person, _>(&everyone, InsertOptions::default()).unwrap();

        let mut names: Vec<String> = coll
            .distinct("name", None)
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();
        names.sort();

        assert_eq!(names, ["Jim", "Sam"]);

        let ages: Vec<u32> = coll
            .distinct("age", Some(doc!{ "name": "Sam" }))
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();

        assert_eq!(ages, [30]);
    });
}

#[test]
fn index_lifecycle() {
    with_collection!("index_lifecycle", |coll| {
        coll.insert_many::<Person, _>(&people(), InsertOptions::default()).unwrap();

        let options = IndexOptions {
            unique: Some(true),
            name: Some(String::from("unique_name")),
            ..IndexOptions::default()
        };
        let name = coll.create_index(doc!{ "name": 1 }, options).unwrap();
        assert_eq!(name, "unique_name");

        let indexes: Vec<Index> = coll
            .list_indexes()
            .unwrap()
            .collect::<ConnectorResult<_>>()
            .unwrap();
        let created = indexes
            .iter()
            .find(|index| index.name == "unique_name")
            .expect("created index not listed");

        assert_eq!(indexes.len(), 2);
        assert!(created.unique);
        assert_eq!(created.key, doc!{ "name": 1 });
        assert_eq!(created.fields().unwrap(), vec![("name", IndexType::Ordered(Order::Ascending))]);

        let error = coll.insert_one(&people()[0], InsertOptions::default()).unwrap_err();
        assert_eq!(error.category(), ConnectorErrorCategory::Database);

        coll.drop_index("unique_name").unwrap();
        coll.create_index(doc!{ "age": Order::Descending }, IndexOptions::default()).unwrap();
        coll.drop_indexes().unwrap();

        assert_eq!(coll.list_indexes().unwrap().count(), 1);
    });
}

#[test]
fn database_listings() {
    with_collection!("database_listings", |coll| {
        let db = (*DB_HANDLE).as_ref().expect("database handle");

        coll.insert_one(&people()[0], InsertOptions::default()).unwrap();

        assert_eq!(db.name(), DB_NAME);
        assert!(db.list_collection_names().unwrap().iter().any(|name| name == "database_listings"));
        assert_eq!(coll.namespace(), format!("{}.database_listings", DB_NAME));
    });
}
