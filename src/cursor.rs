//! Typed, generic wrapper around MongoDB cursors.

use std::fmt;
use std::iter::FromIterator;
use std::marker::PhantomData;
use serde::de::DeserializeOwned;
use bson::{ Bson, Document };
use crate::error::{ Error, ErrorKind, Result, ResultExt };

/// The raw values a `Cursor` pulls from.
type Source = Box<dyn Iterator<Item = Result<Bson>> + Send>;

/// What to do when a returned document does not fit the result type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MismatchPolicy {
    /// Yield the error once, then close the cursor.
    Fatal,
    /// Yield the error as an item and keep going.
    PerItem,
}

impl Default for MismatchPolicy {
    fn default() -> Self {
        MismatchPolicy::Fatal
    }
}

/// A typed wrapper around a MongoDB cursor.
///
/// A `Cursor` owns at most one open server-side cursor. It must not be
/// consumed by more than one reader at a time. Consumers that stop early
/// should call [`close()`](#method.close), which may be called any number
/// of times; an exhausted cursor closes itself.
pub struct Cursor<T> {
    /// The underlying source of raw values; `None` once closed.
    inner: Option<Source>,
    /// A value fetched by `has_next()` but not yet yielded.
    peeked: Option<Result<Bson>>,
    /// Handling of values that don't deserialize as `T`.
    policy: MismatchPolicy,
    /// Namespace, for error messages.
    namespace: String,
    /// Just here so that the type parameter is used.
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Cursor<T> {
    /// Creates a strongly-typed cursor from an untyped driver cursor.
    pub(crate) fn from_documents<I>(namespace: String, documents: I) -> Self
        where I: Iterator<Item = mongodb::error::Result<Document>> + Send + 'static
    {
        let source = documents.map(|result| {
            result.map(Bson::Document).chain("can't step Cursor")
        });

        Self::from_source(namespace, Box::new(source))
    }

    /// Creates a strongly-typed cursor over values that are already in memory.
    pub(crate) fn from_values(namespace: String, values: Vec<Bson>) -> Self {
        Self::from_source(namespace, Box::new(values.into_iter().map(Ok)))
    }

    /// Creates a strongly-typed cursor from any source of raw values.
    pub(crate) fn from_source(namespace: String, source: Source) -> Self {
        Cursor {
            inner: Some(source),
            peeked: None,
            policy: MismatchPolicy::default(),
            namespace,
            _marker: PhantomData,
        }
    }

    /// Report documents that don't deserialize as `T` as `Err` items
    /// instead of ending the iteration.
    pub fn tolerate_mismatches(mut self) -> Self {
        self.policy = MismatchPolicy::PerItem;
        self
    }

    /// The current mismatch policy.
    pub fn mismatch_policy(&self) -> MismatchPolicy {
        self.policy
    }

    /// Checks whether there are any more documents for the cursor to yield.
    pub fn has_next(&mut self) -> Result<bool> {
        if self.peeked.is_none() {
            self.peeked = self.pull();
        }

        match self.peeked.take() {
            Some(Ok(raw)) => {
                self.peeked = Some(Ok(raw));
                Ok(true)
            }
            Some(Err(error)) => Err(error),
            None => Ok(false),
        }
    }

    /// Retrieves the next document, or `None` if the cursor is exhausted
    /// or closed.
    pub fn try_next(&mut self) -> Result<Option<T>> {
        self.next().transpose()
    }

    /// Retrieves the next at most `n` documents.
    pub fn next_n<C: FromIterator<T>>(&mut self, n: usize) -> Result<C> {
        self.by_ref().take(n).collect()
    }

    /// Releases the underlying server-side cursor. Calling it again,
    /// or on an exhausted cursor, does nothing.
    pub fn close(&mut self) -> Result<()> {
        self.peeked = None;

        if self.inner.take().is_some() {
            tracing::trace!(namespace = %self.namespace, "cursor closed");
        }

        Ok(())
    }

    /// Returns `true` once the cursor is closed or exhausted.
    pub fn is_closed(&self) -> bool {
        self.inner.is_none() && self.peeked.is_none()
    }

    /// Pulls the next raw value from the source. Exhaustion and source
    /// errors close the cursor.
    fn pull(&mut self) -> Option<Result<Bson>> {
        let item = self.inner.as_mut()?.next();

        match item {
            Some(Ok(_)) => {}
            Some(Err(_)) | None => {
                self.inner = None;
            }
        }

        item
    }

    /// Deserializes a single raw value, applying the mismatch policy.
    fn deserialize(&mut self, raw: Bson) -> Result<T> {
        bson::from_bson(raw).map_err(|error| {
            if self.policy == MismatchPolicy::Fatal {
                self.inner = None;
            }
            Error::with_cause_kind(
                ErrorKind::BsonDecoding,
                format!("result from {} doesn't match the result type", self.namespace),
                error,
            )
        })
    }
}

impl<T: DeserializeOwned> Iterator for Cursor<T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let raw = match self.peeked.take() {
            Some(item) => item,
            None => self.pull()?,
        };

        Some(raw.and_then(|raw| self.deserialize(raw)))
    }
}

impl<T> Drop for Cursor<T> {
    fn drop(&mut self) {
        if self.inner.is_some() {
            tracing::debug!(namespace = %self.namespace, "cursor dropped without being closed");
        }
    }
}

impl<T> fmt::Debug for Cursor<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Cursor")
            .field("namespace", &self.namespace)
            .field("policy", &self.policy)
            .field("open", &self.inner.is_some())
            .finish()
    }
}
