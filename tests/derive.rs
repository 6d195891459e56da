//! Tests for `#[derive(Shape)]`, checked through the projections and
//! pipelines the derived shapes produce.

#[macro_use]
extern crate serde_derive;
extern crate mongo_connector;

use std::collections::HashMap;
use mongo_connector::prelude::*;
use mongo_connector::shape::Visited;

/// This could have been a function, but making it a macro results in the
/// error messages pointing to the actual line number of the invocation,
/// which is much better in a test suite.
macro_rules! assert_projection {
    ($ty:ty, { $($body:tt)* }) => {
        assert_eq!(projection::<$ty>(), doc!{ $($body)* });
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Shape)]
struct Address {
    city: String,
    zip: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Shape)]
#[serde(rename_all = "camelCase")]
struct Person {
    full_name: String,
    address: Address,
    tags: Vec<String>,
}

#[test]
fn simple_struct() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Simple {
        name: String,
        age: u32,
    }

    assert_projection!(Simple, { "_id": 0, "name": 1, "age": 1 });

    let shape = Simple::target_shape();
    assert_eq!(shape.name(), "Simple");
    assert_eq!(shape.fields(), &[
        (String::from("name"), FieldType::Primitive(Primitive::String)),
        (String::from("age"), FieldType::Primitive(Primitive::Number)),
    ]);
}

#[test]
fn nested_records_are_flattened_into_paths() {
    assert_projection!(Person, {
        "_id": 0,
        "fullName": 1,
        "address.city": 1,
        "address.zip": 1,
        "tags": 1,
    });
}

#[test]
fn renamed_type_and_fields() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    #[serde(rename = "Renamed", rename_all = "SCREAMING_SNAKE_CASE")]
    struct Original {
        other_field: i64,
        #[serde(rename = "explicit")]
        overridden: bool,
        #[serde(rename(serialize = "ser_only"))]
        serialize_renamed: String,
        #[serde(rename(serialize = "out", deserialize = "in"))]
        both_renamed: String,
    }

    assert_eq!(Original::target_shape().name(), "Renamed");
    assert_projection!(Original, {
        "_id": 0,
        "OTHER_FIELD": 1,
        "explicit": 1,
        "SERIALIZE_RENAMED": 1,
        "in": 1,
    });
}

#[test]
fn raw_identifiers() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Keywords {
        r#type: String,
        r#match: Option<String>,
    }

    assert_projection!(Keywords, { "_id": 0, "type": 1, "match": 1 });
}

#[test]
fn skipped_fields_are_not_projected() {
    #[derive(Debug, Clone, Default, Serialize, Deserialize, Shape)]
    struct Skipping {
        kept: String,
        #[serde(skip)]
        skipped: u8,
        #[serde(skip_deserializing)]
        write_only: u8,
        #[serde(skip_serializing)]
        read_only: u8,
    }

    assert_projection!(Skipping, { "_id": 0, "kept": 1, "read_only": 1 });
}

#[test]
fn flattened_records_merge_into_the_parent() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Audit {
        created_by: String,
        version: u32,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Post {
        title: String,
        #[serde(flatten)]
        audit: Audit,
    }

    assert_projection!(Post, {
        "_id": 0,
        "title": 1,
        "created_by": 1,
        "version": 1,
    });
}

#[test]
fn flattened_map_makes_the_shape_dynamic() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Open {
        title: String,
        #[serde(flatten)]
        rest: HashMap<String, Bson>,
    }

    assert!(Open::target_shape().is_dynamic());
    assert_projection!(Open, {});
}

#[test]
fn declared_id_is_not_suppressed() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct WithId {
        #[serde(rename = "_id")]
        id: ObjectId,
        name: String,
    }

    assert_projection!(WithId, { "_id": 1, "name": 1 });
}

#[test]
fn self_referential_struct() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Node {
        value: i32,
        children: Vec<Node>,
        parent: Option<Box<Node>>,
    }

    let shape = Node::target_shape();

    assert_eq!(shape.fields()[1].1, FieldType::array(FieldType::Cyclic(String::from("Node"))));
    assert_projection!(Node, { "_id": 0, "value": 1, "children": 1, "parent": 1 });
}

#[test]
fn mutually_recursive_structs() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Employee {
        name: String,
        team: Option<Team>,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Team {
        label: String,
        lead: Option<Box<Employee>>,
    }

    assert_projection!(Employee, {
        "_id": 0,
        "name": 1,
        "team.label": 1,
        "team.lead": 1,
    });
}

#[test]
fn repeated_sibling_types_are_not_cycles() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Shipment {
        from: Address,
        to: Address,
    }

    assert_projection!(Shipment, {
        "_id": 0,
        "from.city": 1,
        "from.zip": 1,
        "to.city": 1,
        "to.zip": 1,
    });
}

#[test]
fn generic_struct() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Wrapper<T> {
        label: String,
        payload: T,
    }

    assert_projection!(Wrapper<Address>, {
        "_id": 0,
        "label": 1,
        "payload.city": 1,
        "payload.zip": 1,
    });
    assert_projection!(Wrapper<u64>, { "_id": 0, "label": 1, "payload": 1 });
}

#[test]
fn newtype_and_transparent_structs_forward() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Email(String);

    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    #[serde(transparent)]
    struct Home {
        address: Address,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Contact {
        email: Email,
        home: Home,
    }

    assert_eq!(
        <Email as Shape>::field_type(&mut Visited::new()),
        FieldType::Primitive(Primitive::String)
    );
    assert_projection!(Contact, {
        "_id": 0,
        "email": 1,
        "home.city": 1,
        "home.zip": 1,
    });
}

#[test]
fn tuple_and_unit_structs() {
    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Pair(i32, String);

    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Marker;

    assert_eq!(<Pair as Shape>::field_type(&mut Visited::new()), FieldType::Dynamic);
    assert_eq!(
        <Marker as Shape>::field_type(&mut Visited::new()),
        FieldType::Primitive(Primitive::Null)
    );
    assert_projection!(Pair, {});
}

#[test]
fn unit_enums_are_strings() {
    #[derive(Debug, Clone, Copy, Serialize, Deserialize, Shape)]
    enum Status {
        Active,
        Suspended,
    }

    #[derive(Debug, Clone, Serialize, Deserialize, Shape)]
    struct Account {
        status: Status,
        history: Vec<Status>,
    }

    assert_eq!(
        <Status as Shape>::field_type(&mut Visited::new()),
        FieldType::Primitive(Primitive::String)
    );
    assert_projection!(Account, { "_id": 0, "status": 1, "history": 1 });
}

#[test]
fn dynamic_results_are_not_projected() {
    assert_projection!(Document, {});
    assert_projection!(Bson, {});
    assert_projection!(HashMap<String, i32>, {});
}

#[test]
fn derived_shape_augments_pipelines() {
    let pipeline = vec![
        doc!{ "$match": { "tags": "admin" } },
        doc!{ "$sort": { "fullName": 1 } },
    ];
    let augmented = augment_pipeline(pipeline.clone(), &Person::target_shape());

    assert_eq!(augmented.len(), 3);
    assert_eq!(&augmented[..2], &pipeline[..]);
    assert_eq!(augmented[2], doc!{
        "$project": {
            "_id": 0,
            "fullName": 1,
            "address.city": 1,
            "address.zip": 1,
            "tags": 1,
        }
    });

    let projecting = vec![doc!{ "$project": { "fullName": 1 } }];
    assert_eq!(augment_pipeline(projecting.clone(), &Person::target_shape()), projecting);
    assert_eq!(augment_pipeline(pipeline.clone(), &Document::target_shape()), pipeline);
}
