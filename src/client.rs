//! The store handle: a connected client and its connector context.

use std::fmt;
use std::sync::Arc;
use tracing::{ Span, span::Entered };
use mongodb::options::ClientOptions;
use crate::{
    db::Database,
    config::ConnectionConfig,
    error::{ ErrorKind, Result, ResultExt },
};

/// State shared by a client and every handle derived from it.
///
/// Instead of module-level globals, this is created once per connection
/// and passed along to every database and collection handle.
#[derive(Debug)]
pub struct Context {
    /// The logging span of all operations on this connection.
    span: Span,
    /// The server addresses, for messages.
    hosts: String,
}

impl Context {
    /// Creates a context for a connection to the given hosts.
    fn new(hosts: String) -> Self {
        let span = tracing::info_span!("mongo_connector", hosts = %hosts);
        Context { span, hosts }
    }

    /// Enters the span of this connection until the guard is dropped.
    pub(crate) fn enter(&self) -> Entered<'_> {
        self.span.enter()
    }

    /// The server addresses this context was created for.
    pub fn hosts(&self) -> &str {
        &self.hosts
    }
}

/// A handle to a MongoDB deployment.
///
/// Cloning is cheap and clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    /// The driver client.
    inner: mongodb::sync::Client,
    /// The connector context.
    context: Arc<Context>,
}

impl Client {
    /// Builds a client from a structured configuration.
    ///
    /// Configuration mistakes (an unsupported authentication mechanism, a
    /// missing TLS store, contradictory pool bounds) are reported here and
    /// never retried. Servers are contacted lazily, by the first operation.
    pub fn connect(config: &ConnectionConfig) -> Result<Self> {
        let context = Arc::new(Context::new(config.hosts()));
        let inner = {
            let _guard = context.enter();
            let options = config.client_options()?;

            tracing::debug!("creating client");

            mongodb::sync::Client::with_options(options).chain_kind(
                ErrorKind::Connection,
                || format!("can't create client for {}", context.hosts)
            )?
        };

        Ok(Client { inner, context })
    }

    /// Builds a client from a `mongodb://` or `mongodb+srv://` connection string.
    ///
    /// The string is parsed by the driver. A malformed string is a
    /// configuration error; SRV records are resolved at this point.
    pub fn with_uri(uri: &str) -> Result<Self> {
        let options = ClientOptions::parse(uri).chain_kind(
            ErrorKind::Configuration,
            "can't parse connection string"
        )?;
        let hosts = options.hosts
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",");
        let context = Arc::new(Context::new(hosts));
        let inner = {
            let _guard = context.enter();

            tracing::debug!("creating client from connection string");

            mongodb::sync::Client::with_options(options).chain_kind(
                ErrorKind::Connection,
                || format!("can't create client for {}", context.hosts)
            )?
        };

        Ok(Client { inner, context })
    }

    /// Returns the names of all databases on the deployment.
    pub fn list_database_names(&self) -> Result<Vec<String>> {
        let _guard = self.context.enter();
        tracing::trace!("listing databases");

        self.inner
            .list_database_names(None, None)
            .chain(|| format!("can't list databases on {}", self.context.hosts))
    }

    /// Returns a handle to the named database. Databases are created
    /// on the server lazily, by the first write.
    pub fn database(&self, name: &str) -> Database {
        let _guard = self.context.enter();
        tracing::debug!(database = name, "database handle created");

        Database::new(self.inner.database(name), Arc::clone(&self.context))
    }

    /// The connector context of this client.
    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Shuts down the connection pool and background monitoring of this
    /// client. Blocks until open cursors and sessions derived from it are
    /// dropped. Clones and handles derived from this client return errors
    /// from every operation afterwards.
    pub fn close(self) {
        let Client { inner, context } = self;
        let _guard = context.enter();

        inner.shutdown();
        tracing::debug!("client closed");
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Client({})", self.context.hosts)
    }
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorExt;
    use super::*;

    #[test]
    fn uri_hosts_label_the_context() {
        let client = Client::with_uri(
            "mongodb://jim:pw@a.example.com:27017,b.example.com:27018/app?replicaSet=rs0"
        ).unwrap();

        assert_eq!(client.context().hosts(), "a.example.com:27017,b.example.com:27018");
        assert_eq!(format!("{:?}", client), "Client(a.example.com:27017,b.example.com:27018)");

        let defaulted = Client::with_uri("mongodb://localhost").unwrap();
        assert_eq!(defaulted.context().hosts(), "localhost:27017");
    }

    #[test]
    fn malformed_uri_is_a_configuration_error() {
        let error = Client::with_uri("localhost:27017").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);

        let error = Client::with_uri("mongodb://a:27017/?authMechanism=BOGUS").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn close_shuts_down_every_clone() {
        let client = Client::with_uri("mongodb://localhost:27017").unwrap();
        let clone = client.clone();
        let database = clone.database("app");

        client.close();

        assert!(database.list_collection_names().is_err());
        assert!(clone.list_database_names().is_err());
    }

    #[test]
    fn connect_rejects_bad_configuration_before_networking() {
        let config = ConnectionConfig::from_json(
            r#"{ "options": { "tlsEnabled": true } }"#
        ).unwrap();

        assert_eq!(Client::connect(&config).unwrap_err().kind(), ErrorKind::Tls);
    }
}
