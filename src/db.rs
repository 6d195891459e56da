//! Represents a MongoDB database.

use std::fmt;
use std::sync::Arc;
use crate::{
    client::Context,
    coll::Collection,
    error::{ Result, ResultExt },
};

/// A handle to a database, sharing the connector context of its client.
#[derive(Clone)]
pub struct Database {
    /// The driver database.
    inner: mongodb::sync::Database,
    /// The connector context.
    context: Arc<Context>,
}

impl Database {
    /// Wraps a driver database.
    pub(crate) fn new(inner: mongodb::sync::Database, context: Arc<Context>) -> Self {
        Database { inner, context }
    }

    /// The name of the database.
    pub fn name(&self) -> &str {
        self.inner.name()
    }

    /// Returns the names of all collections in this database.
    pub fn list_collection_names(&self) -> Result<Vec<String>> {
        let _guard = self.context.enter();
        tracing::trace!(database = self.name(), "listing collections");

        self.inner
            .list_collection_names(None)
            .chain(|| format!("can't list collections of {}", self.name()))
    }

    /// Returns a handle to the named collection. Collections are created
    /// on the server lazily, by the first write.
    pub fn collection(&self, name: &str) -> Collection {
        let _guard = self.context.enter();
        tracing::debug!(database = self.name(), collection = name, "collection handle created");

        Collection::new(self.inner.collection(name), Arc::clone(&self.context))
    }

    /// Explicitly creates a collection, and returns a handle to it.
    /// Fails if a collection with the same name already exists.
    pub fn create_collection(&self, name: &str) -> Result<Collection> {
        {
            let _guard = self.context.enter();
            tracing::trace!(database = self.name(), collection = name, "creating collection");

            self.inner
                .create_collection(name, None)
                .chain(|| format!("can't create collection {}.{}", self.name(), name))?;
        }

        Ok(self.collection(name))
    }

    /// Drops the database along with all of its collections.
    pub fn drop(&self) -> Result<()> {
        let _guard = self.context.enter();
        tracing::trace!(database = self.name(), "dropping database");

        self.inner
            .drop(None)
            .chain(|| format!("can't drop database {}", self.name()))
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Database({})", self.name())
    }
}
