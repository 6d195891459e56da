//! Deriving projection documents and `$project` pipeline stages from
//! target shapes.
//!
//! The projection requests exactly the fields a shape declares,
//! recursively, so that documents come back from the server already
//! trimmed to what the result type can represent.

use bson::Document;
use crate::shape::{ Shape, TargetShape, FieldType };

/// The name of the identifier field.
pub const ID_FIELD: &str = "_id";

/// The aggregation stage operator that performs projection.
pub const PROJECT_STAGE: &str = "$project";

/// Builds the projection document for the result type `T`.
/// ```
/// # use mongo_connector::projection::projection;
/// # use mongo_connector::prelude::*;
/// assert_eq!(projection::<Document>(), doc!{});
/// ```
pub fn projection<T: Shape + ?Sized>() -> Document {
    projection_for(&T::target_shape())
}

/// Builds the projection document for a target shape.
///
/// * A dynamic shape (one with no declared fields) yields an empty
///   document, meaning "return every field".
/// * Otherwise, every leaf path reachable from the root is included with 1,
///   and `_id` is excluded with 0 unless the shape declares it.
/// ```
/// # use mongo_connector::shape::{ TargetShape, Primitive };
/// # use mongo_connector::projection::projection_for;
/// # use mongo_connector::prelude::*;
/// let address = TargetShape::new("Address")
///     .field("city", Primitive::String)
///     .field("zip", Primitive::String);
/// let person = TargetShape::new("Person")
///     .field("name", Primitive::String)
///     .field("address", address);
///
/// assert_eq!(projection_for(&person), doc!{
///     "_id": 0,
///     "name": 1,
///     "address.city": 1,
///     "address.zip": 1,
/// });
/// ```
pub fn projection_for(shape: &TargetShape) -> Document {
    let mut builder = ProjectionBuilder::default();

    if shape.is_dynamic() {
        return builder.finish();
    }

    if !shape.declares(ID_FIELD) {
        builder.document.insert(ID_FIELD, 0);
    }

    builder.record("", shape);
    builder.finish()
}

/// Appends a `$project` stage derived from `shape` to the pipeline, unless
/// a stage already projects, or the shape is dynamic.
/// ```
/// # use mongo_connector::shape::{ TargetShape, Primitive };
/// # use mongo_connector::projection::augment_pipeline;
/// # use mongo_connector::prelude::*;
/// let shape = TargetShape::new("Person").field("name", Primitive::String);
///
/// assert_eq!(augment_pipeline(Vec::new(), &shape), vec![
///     doc!{ "$project": { "_id": 0, "name": 1 } },
/// ]);
/// ```
pub fn augment_pipeline(mut pipeline: Vec<Document>, shape: &TargetShape) -> Vec<Document> {
    if has_projection_stage(&pipeline) {
        return pipeline;
    }

    let projection = projection_for(shape);

    if !projection.is_empty() {
        pipeline.push(doc!{ PROJECT_STAGE: projection });
    }

    pipeline
}

/// Checks the top-level keys of each stage for the projection operator.
pub fn has_projection_stage(pipeline: &[Document]) -> bool {
    pipeline.iter().any(|stage| stage.contains_key(PROJECT_STAGE))
}

/// Accumulates inclusion entries during a depth-first walk of a shape.
#[derive(Debug, Default)]
struct ProjectionBuilder {
    /// The entries emitted so far, in emission order.
    document: Document,
}

impl ProjectionBuilder {
    /// Walks the fields of a record whose path is `prefix`.
    fn record(&mut self, prefix: &str, shape: &TargetShape) {
        for &(ref name, ref ty) in shape.fields() {
            let path = if prefix.is_empty() {
                name.clone()
            } else {
                format!("{}.{}", prefix, name)
            };

            self.field(&path, ty);
        }
    }

    /// Emits the entries for a single field at `path`.
    fn field(&mut self, path: &str, ty: &FieldType) {
        match *ty {
            FieldType::Primitive(_) | FieldType::Cyclic(_) | FieldType::Dynamic => {
                self.include(path)
            }
            FieldType::Record(ref shape) => {
                if shape.is_dynamic() {
                    self.include(path)
                } else {
                    self.record(path, shape)
                }
            }
            // arrays are projected by the shape of their elements
            FieldType::Array(ref element) => self.field(path, element),
            FieldType::Union(ref members) => {
                let mut projected = false;

                for member in members.iter().filter(|member| !member.is_null()) {
                    self.field(path, member);
                    projected = true;
                }

                if !projected {
                    self.include(path)
                }
            }
        }
    }

    /// Includes `path` whole. MongoDB rejects projections containing both
    /// a path and one of its sub-paths, so the more general entry wins.
    fn include(&mut self, path: &str) {
        if self.is_covered(path) {
            return;
        }

        let prefix = format!("{}.", path);
        let nested: Vec<String> = self.document
            .keys()
            .filter(|key| key.starts_with(&prefix))
            .cloned()
            .collect();

        for key in nested {
            self.document.remove(&key);
        }

        self.document.insert(path, 1);
    }

    /// Returns `true` if `path` or one of its ancestors is already included.
    fn is_covered(&self, path: &str) -> bool {
        let included = |key: &str| self.document.get_i32(key).map_or(false, |flag| flag == 1);

        included(path) || path.match_indices('.').any(|(i, _)| included(&path[..i]))
    }

    /// Returns the finished projection.
    fn finish(self) -> Document {
        self.document
    }
}
