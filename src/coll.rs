//! A MongoDB collection, with typed reads driven by result shapes.

use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;
use serde::{ Serialize, de::DeserializeOwned };
use bson::{ Bson, Document };
use mongodb::{
    IndexModel,
    options::{ self as driver, Acknowledgment },
};
use crate::{
    client::Context,
    cursor::Cursor,
    shape::Shape,
    projection::{ projection, augment_pipeline },
    update::{ set_operator, prefix_operators },
    ops::*,
    bsn::*,
    error::{ Error, ErrorKind, Result, ResultExt },
};

/// A handle to a collection of documents.
///
/// Documents are written from any `Serialize` type. Reads are typed per
/// call: the result type's `Shape` determines the projection sent to the
/// server, and its `Deserialize` impl decodes the returned documents.
#[derive(Clone)]
pub struct Collection {
    /// The backing driver collection.
    inner: mongodb::sync::Collection<Document>,
    /// The connector context.
    context: Arc<Context>,
}

impl Collection {
    /// Wraps a driver collection.
    pub(crate) fn new(inner: mongodb::sync::Collection<Document>, context: Arc<Context>) -> Self {
        Collection { inner, context }
    }

    /// The name of the collection.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// The fully-qualified `database.collection` name.
    pub fn namespace(&self) -> String {
        self.inner.namespace().to_string()
    }

    /// Inserts a single document. Returns its `_id`, which is generated
    /// by the driver if the document didn't have one.
    pub fn insert_one<D>(&self, document: &D, options: InsertOptions) -> Result<Bson>
        where D: Serialize + ?Sized
    {
        let _guard = self.context.enter();
        let doc = serialize_document(document)?;
        let message = || format!("error in {}::insert_one({})", self.namespace(), doc);

        tracing::trace!(namespace = %self.inner.namespace(), "insert_one");

        self.inner
            .insert_one(&doc, driver::InsertOneOptions::from(options))
            .chain(&message)
            .map(|result| result.inserted_id)
    }

    /// Inserts many documents. Returns their `_id`s in the order of the
    /// documents. Inserting no documents at all succeeds trivially.
    pub fn insert_many<D, I>(&self, documents: I, options: InsertOptions) -> Result<Vec<Bson>>
        where D: Serialize,
              I: IntoIterator,
              I::Item: Borrow<D>,
    {
        let _guard = self.context.enter();
        let docs = serialize_documents::<D, _>(documents)?;
        let n_docs = docs.len();
        let message = || format!("error in {}::insert_many(...)", self.namespace());

        // The server rejects an empty batch; nothing to do anyway.
        if n_docs == 0 {
            return Ok(Vec::new());
        }

        tracing::trace!(namespace = %self.inner.namespace(), n_docs, "insert_many");

        let result = self.inner
            .insert_many(docs, driver::InsertManyOptions::from(options))
            .chain(&message)?;

        let mut ids: Vec<_> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|&(index, _)| index);

        if ids.len() == n_docs {
            Ok(ids.into_iter().map(|(_, id)| id).collect())
        } else {
            Err(Error::new(
                ErrorKind::MissingId,
                format!("{}: {} documents given, but {} IDs returned", message(), n_docs, ids.len())
            ))
        }
    }

    /// Retrieves all documents matching the filter, projected onto the
    /// shape of `T` unless `options` carries an explicit projection.
    pub fn find<T>(&self, filter: Document, options: FindOptions) -> Result<Cursor<T>>
        where T: Shape + DeserializeOwned
    {
        let _guard = self.context.enter();
        let options = options.into_driver(projection::<T>());

        tracing::trace!(
            namespace = %self.inner.namespace(),
            projection = ?options.projection,
            "find"
        );

        self.inner
            .find(filter.clone(), options)
            .chain(|| format!("error in {}::find({})", self.namespace(), filter))
            .map(|cursor| Cursor::from_documents(self.namespace(), cursor))
    }

    /// Retrieves the first document matching the filter in the sort order
    /// of `options`, projected onto the shape of `T` unless `options`
    /// carries an explicit projection.
    pub fn find_one<T>(&self, filter: Document, options: FindOneOptions) -> Result<Option<T>>
        where T: Shape + DeserializeOwned
    {
        let _guard = self.context.enter();
        let options = options.into_driver(projection::<T>());

        tracing::trace!(
            namespace = %self.inner.namespace(),
            projection = ?options.projection,
            "find_one"
        );

        self.inner
            .find_one(filter.clone(), options)
            .chain(|| format!("error in {}::find_one({})", self.namespace(), filter))?
            .map(|doc| deserialize_bson(Bson::Document(doc)).chain_kind(
                ErrorKind::BsonDecoding,
                || format!("result from {} doesn't match the result type", self.namespace())
            ))
            .transpose()
    }

    /// Returns the number of documents matching the filter.
    pub fn count_documents(&self, filter: Document, options: CountOptions) -> Result<u64> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), "count_documents");

        self.inner
            .count_documents(filter.clone(), driver::CountOptions::from(options))
            .chain(|| format!("error in {}::count_documents({})", self.namespace(), filter))
    }

    /// Sets the fields of `partial` on the first document matching the filter.
    pub fn update_one(&self, filter: Document, partial: Document, options: UpdateOptions) -> Result<UpdateResult> {
        self.update_one_with_operators(filter, set_operator(partial), options)
    }

    /// Sets the fields of `partial` on every document matching the filter.
    pub fn update_many(&self, filter: Document, partial: Document, options: UpdateOptions) -> Result<UpdateResult> {
        self.update_many_with_operators(filter, set_operator(partial), options)
    }

    /// Applies update operators to the first document matching the filter.
    /// Operator names may be given with or without the leading `$`:
    /// `{ "inc": { "age": 1 } }` is the same as `{ "$inc": { "age": 1 } }`.
    pub fn update_one_with_operators(
        &self,
        filter: Document,
        operators: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult> {
        let _guard = self.context.enter();
        let update = prefix_operators(operators);
        let message = || format!("error in {}::update_one({}, {})", self.namespace(), filter, update);

        tracing::trace!(namespace = %self.inner.namespace(), "update_one");

        self.inner
            .update_one(filter.clone(), update.clone(), driver::UpdateOptions::from(options))
            .chain(&message)
            .map(UpdateResult::from)
    }

    /// Applies update operators to every document matching the filter.
    pub fn update_many_with_operators(
        &self,
        filter: Document,
        operators: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult> {
        let _guard = self.context.enter();
        let update = prefix_operators(operators);
        let message = || format!("error in {}::update_many({}, {})", self.namespace(), filter, update);

        tracing::trace!(namespace = %self.inner.namespace(), "update_many");

        self.inner
            .update_many(filter.clone(), update.clone(), driver::UpdateOptions::from(options))
            .chain(&message)
            .map(UpdateResult::from)
    }

    /// Deletes the first document matching the filter.
    pub fn delete_one(&self, filter: Document) -> Result<DeleteResult> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), "delete_one");

        self.inner
            .delete_one(filter.clone(), None)
            .chain(|| format!("error in {}::delete_one({})", self.namespace(), filter))
            .map(|result| self.delete_result(result.deleted_count))
    }

    /// Deletes every document matching the filter.
    pub fn delete_many(&self, filter: Document) -> Result<DeleteResult> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), "delete_many");

        self.inner
            .delete_many(filter.clone(), None)
            .chain(|| format!("error in {}::delete_many({})", self.namespace(), filter))
            .map(|result| self.delete_result(result.deleted_count))
    }

    /// Runs an aggregation pipeline. Unless the pipeline already projects,
    /// a final `$project` stage derived from the shape of `T` is appended.
    pub fn aggregate<T>(&self, pipeline: Vec<Document>) -> Result<Cursor<T>>
        where T: Shape + DeserializeOwned
    {
        let _guard = self.context.enter();
        let stages = augment_pipeline(pipeline, &T::target_shape());

        tracing::trace!(namespace = %self.inner.namespace(), n_stages = stages.len(), "aggregate");

        self.inner
            .aggregate(stages.clone(), None)
            .chain(|| format!("error in {}::aggregate({:?})", self.namespace(), stages))
            .map(|cursor| Cursor::from_documents(self.namespace(), cursor))
    }

    /// Returns the distinct values of a field among the documents
    /// matching the filter.
    pub fn distinct<V>(&self, field: &str, filter: Option<Document>) -> Result<Cursor<V>>
        where V: DeserializeOwned
    {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), field, "distinct");

        self.inner
            .distinct(field, filter.clone(), None)
            .chain(|| format!("error in {}::distinct({}, {:?})", self.namespace(), field, filter))
            .map(|values| Cursor::from_values(self.namespace(), values))
    }

    /// Creates an index with the given keys. Returns the name of the index.
    pub fn create_index(&self, keys: Document, options: IndexOptions) -> Result<String> {
        let _guard = self.context.enter();
        let message = || format!("error in {}::create_index({})", self.namespace(), keys);
        let model = IndexModel::builder()
            .keys(keys.clone())
            .options(Some(driver::IndexOptions::from(options)))
            .build();

        tracing::trace!(namespace = %self.inner.namespace(), "create_index");

        self.inner
            .create_index(model, None)
            .chain(&message)
            .map(|result| result.index_name)
    }

    /// Lists the indexes of the collection.
    pub fn list_indexes(&self) -> Result<Cursor<Index>> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), "list_indexes");

        let models = self.inner
            .list_indexes(None)
            .chain(|| format!("error in {}::list_indexes()", self.namespace()))?;
        let source = models.map(|model| {
            model
                .chain("can't step index cursor")
                .and_then(|model| bson::to_bson(&model).map_err(From::from))
        });

        Ok(Cursor::from_source(self.namespace(), Box::new(source)))
    }

    /// Drops the named index.
    pub fn drop_index(&self, name: &str) -> Result<()> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), index = name, "drop_index");

        self.inner
            .drop_index(name, None)
            .chain(|| format!("error in {}::drop_index({})", self.namespace(), name))
    }

    /// Drops every index except the one on `_id`.
    pub fn drop_indexes(&self) -> Result<()> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), "drop_indexes");

        self.inner
            .drop_indexes(None)
            .chain(|| format!("error in {}::drop_indexes()", self.namespace()))
    }

    /// Drops the collection along with its indexes.
    pub fn drop(&self) -> Result<()> {
        let _guard = self.context.enter();
        tracing::trace!(namespace = %self.inner.namespace(), "drop");

        self.inner
            .drop(None)
            .chain(|| format!("error in {}::drop()", self.namespace()))
    }

    /// Builds a `DeleteResult`, which is acknowledged unless the
    /// collection's write concern is `w: 0`.
    fn delete_result(&self, deleted_count: u64) -> DeleteResult {
        let acknowledged = self.inner
            .write_concern()
            .and_then(|concern| concern.w.as_ref())
            .map_or(true, |w| *w != Acknowledgment::Nodes(0));

        DeleteResult { deleted_count, acknowledged }
    }
}

impl fmt::Debug for Collection {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Collection({})", self.inner.namespace())
    }
}
