//! `Error` and `Result` types arising out of connector operations.

use std::fmt;
use std::error;
use std::result;
use std::ops::Deref;
use std::borrow::Cow;
use bson::{ Document, document::ValueAccessError };
use mongodb::error::{ ErrorKind as DriverErrorKind, WriteFailure };
use backtrace::Backtrace;

/// Slightly augmented trait for backtrace-able errors.
#[allow(clippy::module_name_repetitions)]
pub trait ErrorExt: error::Error {
    /// Similar to `std::error::Error::source()`, but with richer type info.
    fn reason(&self) -> Option<&(dyn ErrorExt + 'static)> {
        None
    }

    /// Returns the deepest possible backtrace, if any.
    fn backtrace(&self) -> Option<&Backtrace> {
        self.reason().and_then(ErrorExt::backtrace)
    }

    /// Structured error kind.
    fn kind(&self) -> ErrorKind;

    /// Until subtrait coercions are implemented, this helper method
    /// should return the receiver as an `&std::error::Error` trait object.
    fn as_std_error(&self) -> &(dyn error::Error + 'static);
}

/// A trait for conveniently propagating errors up the call stack.
pub trait ResultExt<T>: Sized {
    /// If this `Result` is an `Err`, then prepend the specified error
    /// to the front of the linked list of causes.
    /// ```
    /// # use mongo_connector::error::{ Error, ErrorKind, ErrorExt, Result, ResultExt };
    /// #
    /// # fn main() -> Result<()> {
    /// let ok: Result<_> = Ok("success!");
    /// let ok_chained = ok.chain("dummy error message")?;
    /// assert_eq!(ok_chained, "success!");
    ///
    /// let err: Result<i32> = Err(Error::new(
    ///     ErrorKind::MongoDbError, "chained cause"
    /// ));
    /// let err_chained = err.chain("top-level message").unwrap_err();
    /// assert_eq!(err_chained.message(), "top-level message");
    /// assert_eq!(err_chained.kind(), ErrorKind::MongoDbError);
    /// # Ok(())
    /// # }
    /// ```
    fn chain<M: ErrMsg>(self, message: M) -> Result<T>;

    /// Like `chain()`, but the resulting error has the given `kind`
    /// regardless of the kind of the cause.
    fn chain_kind<M: ErrMsg>(self, kind: ErrorKind, message: M) -> Result<T>;
}

/// Values that can act as or generate an error message.
pub trait ErrMsg: Sized {
    /// Convert the value to an error message.
    fn into_message(self) -> Cow<'static, str>;
}

/// Type alias for a `Result` containing a connector `Error`.
pub type Result<T> = result::Result<T, Error>;

impl<T, E> ResultExt<T> for result::Result<T, E> where E: ErrorExt + Send + Sync + 'static {
    fn chain<M: ErrMsg>(self, message: M) -> Result<T> {
        self.map_err(|cause| Error::with_cause(message.into_message(), cause))
    }

    fn chain_kind<M: ErrMsg>(self, kind: ErrorKind, message: M) -> Result<T> {
        self.map_err(|cause| Error::with_cause_kind(kind, message.into_message(), cause))
    }
}

/// Blanket `impl ErrMsg` for string literals.
impl ErrMsg for &'static str {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Borrowed(self)
    }
}

/// Blanket `impl ErrMsg` for error message formatting functions.
impl<F> ErrMsg for F where F: FnOnce() -> String {
    fn into_message(self) -> Cow<'static, str> {
        Cow::Owned(self())
    }
}

/// The two outward error categories every `ErrorKind` falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// The store rejected or failed to execute an operation.
    Database,
    /// Malformed caller input, bad configuration, or a local
    /// precondition violation.
    Application,
}

/// A structured, "machine-readable" error kind.
#[allow(clippy::module_name_repetitions)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// There was an error converting between JSON and BSON or a typed value.
    JsonTranscoding,
    /// There was an error converting a strongly-typed value to BSON.
    BsonEncoding,
    /// There was an error converting BSON to a strongly-typed value.
    BsonDecoding,
    /// A field with the specified key was not found in the BSON document.
    MissingDocumentField,
    /// A field with the specified key was found in the BSON document,
    /// but it was of an unexpected type.
    IllTypedDocumentField,
    /// One or more ID fields (e.g. `inserted_id` in a MongoDB response)
    /// could not be found.
    MissingId,
    /// An error that comes from the MongoDB driver while executing an operation.
    MongoDbError,
    /// An error coming from MongoDB, related to a write operation.
    MongoDbWriteException,
    /// The connection configuration is invalid.
    Configuration,
    /// The driver client could not be constructed.
    Connection,
    /// The requested authentication mechanism is not supported.
    UnsupportedAuthMechanism,
    /// The TLS settings could not be applied.
    Tls,
}

impl ErrorKind {
    /// Returns a human-readable error description for this kind.
    pub fn as_str(self) -> &'static str {
        use self::ErrorKind::*;

        match self {
            JsonTranscoding          => "JSON transcoding error",
            BsonEncoding             => "BSON encoding error",
            BsonDecoding             => "BSON decoding error",
            MissingDocumentField     => "document field not found",
            IllTypedDocumentField    => "document field of unexpected type",
            MissingId                => "missing unique identifier",
            MongoDbError             => "MongoDB error",
            MongoDbWriteException    => "MongoDB write exception",
            Configuration            => "invalid connection configuration",
            Connection               => "connection error",
            UnsupportedAuthMechanism => "unsupported authentication mechanism",
            Tls                      => "TLS configuration error",
        }
    }

    /// Returns the outward category of this kind of error.
    pub fn category(self) -> ErrorCategory {
        match self {
            ErrorKind::MongoDbError | ErrorKind::MongoDbWriteException => ErrorCategory::Database,
            _ => ErrorCategory::Application,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

/// The central error type for the connector.
#[derive(Debug)]
pub struct Error {
    /// The structured, "machine-readable" kind of this error.
    kind: ErrorKind,
    /// The human-readable description.
    message: Cow<'static, str>,
    /// The underlying error, if any.
    cause: Option<Box<dyn ErrorExt + Send + Sync>>,
    /// The backtrace, if any.
    backtrace: Option<Backtrace>,
    /// Structured details reported by the server, if any.
    detail: Option<Document>,
}

impl Error {
    /// Creates an error with the specified kind, message, no cause,
    /// and a backtrace.
    /// ```
    /// # use mongo_connector::error::{ Error, ErrorKind, ErrorCategory, ErrorExt };
    /// let error = Error::new(ErrorKind::MissingId, "sample error message");
    /// assert_eq!(error.message(), "sample error message");
    /// assert_eq!(error.kind(), ErrorKind::MissingId);
    /// assert_eq!(error.category(), ErrorCategory::Application);
    /// assert!(error.reason().is_none());
    /// assert!(error.backtrace().is_some());
    /// ```
    pub fn new<S>(kind: ErrorKind, message: S) -> Self
        where S: Into<Cow<'static, str>>
    {
        Error {
            kind,
            message: message.into(),
            cause: None,
            backtrace: Some(Backtrace::new()),
            detail: None,
        }
    }

    /// Creates an error with the specified message and cause. If the cause has
    /// no backtrace, this method will create it and add it to the new instance.
    /// The kind and the server-reported detail are inherited from the cause.
    pub fn with_cause<S, E>(message: S, cause: E) -> Self
        where S: Into<Cow<'static, str>>,
              E: ErrorExt + Send + Sync + 'static
    {
        let kind = cause.kind();
        Self::with_cause_kind(kind, message, cause)
    }

    /// Creates an error with the specified kind, message and cause.
    pub fn with_cause_kind<S, E>(kind: ErrorKind, message: S, cause: E) -> Self
        where S: Into<Cow<'static, str>>,
              E: ErrorExt + Send + Sync + 'static
    {
        let message = message.into();
        let backtrace = if cause.backtrace().is_none() {
            Some(Backtrace::new())
        } else {
            None
        };
        let detail = driver_detail(cause.as_std_error());
        let cause: Option<Box<dyn ErrorExt + Send + Sync>> = Some(Box::new(cause));

        Error { kind, message, cause, backtrace, detail }
    }

    /// The human-readable description of this error, without its causes.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this is a database or an application error.
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }

    /// Structured details, e.g. `{ "mongoDBExceptionType": "DuplicateKey", "code": 11000 }`.
    pub fn detail(&self) -> Option<&Document> {
        self.detail.as_ref()
    }

    /// Builder-style setter for augmenting the error with structured details.
    pub fn with_detail(mut self, detail: Document) -> Self {
        self.detail = Some(detail);
        self
    }
}

/// Digs the server-reported error code and code name out of a driver error.
fn driver_detail(error: &(dyn error::Error + 'static)) -> Option<Document> {
    if let Some(error) = error.downcast_ref::<Error>() {
        return error.detail.clone();
    }

    let error = error.downcast_ref::<mongodb::error::Error>()?;
    let (code, code_name) = match *error.kind {
        DriverErrorKind::Command(ref command) => {
            (command.code, command.code_name.clone())
        }
        DriverErrorKind::Write(WriteFailure::WriteError(ref write)) => {
            (write.code, write.code_name.clone().unwrap_or_default())
        }
        DriverErrorKind::Write(WriteFailure::WriteConcernError(ref concern)) => {
            (concern.code, concern.code_name.clone())
        }
        DriverErrorKind::BulkWrite(ref failure) => {
            let write = failure.write_errors.as_ref().and_then(|errors| errors.first())?;
            (write.code, write.code_name.clone().unwrap_or_default())
        }
        _ => return None,
    };

    Some(doc! {
        "mongoDBExceptionType": code_name,
        "code": code,
    })
}

impl ErrorExt for Error {
    fn reason(&self) -> Option<&(dyn ErrorExt + 'static)> {
        match self.cause {
            Some(ref cause) => Some(cause.deref()),
            None => None,
        }
    }

    #[allow(clippy::or_fun_call)]
    fn backtrace(&self) -> Option<&Backtrace> {
        self.reason().and_then(ErrorExt::backtrace).or(self.backtrace.as_ref())
    }

    fn kind(&self) -> ErrorKind {
        self.kind
    }

    fn as_std_error(&self) -> &(dyn error::Error + 'static) {
        self
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;

        if let Some(detail) = self.detail.as_ref() {
            write!(f, " {}", detail)?
        }

        if let Some(cause) = self.cause.as_ref() {
            write!(f, ", caused by: {}", cause)?
        }

        Ok(())
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        self.reason().map(ErrorExt::as_std_error)
    }
}

impl From<ValueAccessError> for Error {
    fn from(error: ValueAccessError) -> Self {
        let message = match error {
            ValueAccessError::NotPresent => "missing value for key in Document",
            _ => "ill-typed value for key in Document",
        };
        Self::with_cause(message, error)
    }
}

impl ErrorExt for ValueAccessError {
    fn kind(&self) -> ErrorKind {
        match *self {
            ValueAccessError::NotPresent => ErrorKind::MissingDocumentField,
            _ => ErrorKind::IllTypedDocumentField,
        }
    }

    fn as_std_error(&self) -> &(dyn error::Error + 'static) {
        self
    }
}

impl ErrorExt for mongodb::error::Error {
    fn kind(&self) -> ErrorKind {
        match *self.kind {
            DriverErrorKind::Write(_) | DriverErrorKind::BulkWrite(_) => {
                ErrorKind::MongoDbWriteException
            }
            _ => ErrorKind::MongoDbError,
        }
    }

    fn as_std_error(&self) -> &(dyn error::Error + 'static) {
        self
    }
}

impl From<mongodb::error::Error> for Error {
    fn from(error: mongodb::error::Error) -> Self {
        Self::with_cause("MongoDB error", error)
    }
}

/// Implementing `ErrorExt` and `From` boilerplate.
macro_rules! impl_error_type {
    ($ty:path, $kind:ident, $message:expr) => {
        impl From<$ty> for Error {
            fn from(error: $ty) -> Self {
                Self::with_cause($message, error)
            }
        }

        impl ErrorExt for $ty {
            fn kind(&self) -> ErrorKind {
                ErrorKind::$kind
            }

            fn as_std_error(&self) -> &(dyn error::Error + 'static) {
                self
            }
        }
    }
}

impl_error_type! { serde_json::Error,         JsonTranscoding, "JSON transcoding error" }
impl_error_type! { bson::extjson::de::Error,  JsonTranscoding, "extended JSON conversion error" }
impl_error_type! { bson::ser::Error,          BsonEncoding,    "BSON encoding error" }
impl_error_type! { bson::de::Error,           BsonDecoding,    "BSON decoding error" }
