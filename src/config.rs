//! Connection configuration and its mapping onto driver client options.
//!
//! Every record here is a serde type with camelCase keys. Numeric options
//! given as `-1` and string options given as `""` are treated as if they
//! were absent, and an absent option leaves the driver default in place.
//!
//! ```
//! # use mongo_connector::config::ConnectionConfig;
//! # use mongo_connector::prelude::*;
//! # fn main() -> ConnectorResult<()> {
//! let config = ConnectionConfig::from_json(r#"{
//!     "serverAddress": { "host": "db.example.com", "port": 27018 },
//!     "options": { "maxPoolSize": 20, "minPoolSize": -1, "replicaSetName": "" }
//! }"#)?;
//!
//! assert_eq!(config.server_address[0].to_string(), "db.example.com:27018");
//! assert_eq!(config.options.max_pool_size, Some(20));
//! assert_eq!(config.options.min_pool_size, None);
//! assert_eq!(config.options.replica_set_name, None);
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::str::FromStr;
use std::convert::TryFrom;
use std::time::Duration;
use serde::de::{ Deserialize, Deserializer, Error as DeError };
use mongodb::options::{
    Acknowledgment,
    ClientOptions,
    ReadConcern,
    ReadPreference,
    ReadPreferenceOptions,
    SelectionCriteria,
    ServerAddress as DriverAddress,
    Tls,
    WriteConcern,
};
use crate::auth::AuthConfig;
use crate::tls::TlsConfig;
use crate::error::{ Error, ErrorKind, Result, ResultExt };

/// The port MongoDB listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 27017;

/// The host connected to when no server address is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Everything needed to connect to a deployment.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Seed list of servers. Accepts a single address or a list.
    #[serde(default = "default_server_addresses", deserialize_with = "one_or_many")]
    pub server_address: Vec<ServerAddress>,
    /// Authentication settings; no authentication when `None`.
    #[serde(default)]
    pub auth: Option<AuthConfig>,
    /// Tuning and behavior options.
    #[serde(default)]
    pub options: ConnectionOptions,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        ConnectionConfig {
            server_address: default_server_addresses(),
            auth: None,
            options: ConnectionOptions::default(),
        }
    }
}

impl ConnectionConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).chain_kind(
            ErrorKind::Configuration,
            "invalid connection configuration"
        )
    }

    /// Human-readable, comma-separated list of the configured hosts.
    pub fn hosts(&self) -> String {
        self.server_address
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Builds the driver options. Authentication and TLS settings are
    /// validated here, so a bad configuration never reaches the network.
    pub fn client_options(&self) -> Result<ClientOptions> {
        let mut options = ClientOptions::builder().build();

        if self.server_address.is_empty() {
            return Err(Error::new(ErrorKind::Configuration, "no server address configured"));
        }

        options.hosts = self.server_address.iter().map(DriverAddress::from).collect();
        options.credential = match self.auth {
            Some(ref auth) => auth.credential()?,
            None => None,
        };

        self.options.apply(&mut options)?;

        Ok(options)
    }
}

/// Address of a single server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServerAddress {
    /// Host name or IP address.
    pub host: String,
    /// TCP port.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerAddress {
    fn default() -> Self {
        ServerAddress {
            host: DEFAULT_HOST.into(),
            port: DEFAULT_PORT,
        }
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl<'a> From<&'a ServerAddress> for DriverAddress {
    fn from(address: &'a ServerAddress) -> Self {
        DriverAddress::Tcp {
            host: address.host.clone(),
            port: Some(address.port),
        }
    }
}

/// Client tuning options. Each one is applied only if it is present.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectionOptions {
    /// Encrypt the transport. Requires `tls`.
    pub tls_enabled: Option<bool>,
    /// TLS stores and protocol.
    pub tls: Option<TlsConfig>,
    /// Retry writes once after a transient failure.
    pub retry_writes: Option<bool>,
    /// Default read concern.
    #[serde(deserialize_with = "unset_if_empty")]
    pub read_concern_level: Option<ReadConcernLevel>,
    /// Default write concern: `majority`, a number of nodes, or a tag set name.
    #[serde(deserialize_with = "unset_if_empty")]
    pub write_concern_level: Option<String>,
    /// Default read preference.
    #[serde(deserialize_with = "unset_if_empty")]
    pub read_preference: Option<ReadPreferenceMode>,
    /// Name of the replica set to connect to.
    #[serde(deserialize_with = "unset_if_empty")]
    pub replica_set_name: Option<String>,
    /// Socket read/write timeout. Not supported by the driver.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub socket_timeout_ms: Option<u64>,
    /// Timeout of establishing a single connection.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub connect_timeout_ms: Option<u64>,
    /// Maximal number of connections per server.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub max_pool_size: Option<u32>,
    /// Minimal number of connections per server.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub min_pool_size: Option<u32>,
    /// How long to wait for a suitable server before failing.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub server_selection_timeout_ms: Option<u64>,
    /// How long a pooled connection may stay idle.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub max_connection_idle_time_ms: Option<u64>,
    /// Maximal lifetime of a pooled connection. Not supported by the driver.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub max_connection_life_time_ms: Option<u64>,
    /// Interval of server monitoring checks.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub heartbeat_frequency_ms: Option<u64>,
    /// Latency window for choosing among suitable servers.
    #[serde(deserialize_with = "unset_if_negative_one")]
    pub local_threshold_ms: Option<u64>,
}

impl ConnectionOptions {
    /// Copies every present option into the driver's options.
    fn apply(&self, options: &mut ClientOptions) -> Result<()> {
        if let (Some(max), Some(min)) = (self.max_pool_size, self.min_pool_size) {
            if min > max {
                return Err(Error::new(
                    ErrorKind::Configuration,
                    format!("minPoolSize ({}) exceeds maxPoolSize ({})", min, max)
                ));
            }
        }

        if self.tls_enabled == Some(true) {
            let tls = self.tls.as_ref().ok_or_else(|| Error::new(
                ErrorKind::Tls,
                "tlsEnabled is set but no TLS configuration was given"
            ))?;
            options.tls = Some(Tls::Enabled(tls.to_driver()?));
        } else if self.tls.is_some() {
            tracing::debug!("TLS configuration ignored because tlsEnabled is not set");
        }

        if let Some(retry) = self.retry_writes {
            options.retry_writes = Some(retry);
        }
        if let Some(level) = self.read_concern_level {
            options.read_concern = Some(level.into());
        }
        if let Some(ref level) = self.write_concern_level {
            let mut concern = WriteConcern::default();
            concern.w = Some(acknowledgment(level));
            options.write_concern = Some(concern);
        }
        if let Some(mode) = self.read_preference {
            options.selection_criteria = Some(SelectionCriteria::ReadPreference(mode.into()));
        }
        if let Some(ref name) = self.replica_set_name {
            options.repl_set_name = Some(name.clone());
        }
        if let Some(ms) = self.connect_timeout_ms {
            options.connect_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(size) = self.max_pool_size {
            options.max_pool_size = Some(size);
        }
        if let Some(size) = self.min_pool_size {
            options.min_pool_size = Some(size);
        }
        if let Some(ms) = self.server_selection_timeout_ms {
            options.server_selection_timeout = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.max_connection_idle_time_ms {
            options.max_idle_time = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.heartbeat_frequency_ms {
            options.heartbeat_freq = Some(Duration::from_millis(ms));
        }
        if let Some(ms) = self.local_threshold_ms {
            options.local_threshold = Some(Duration::from_millis(ms));
        }

        if let Some(ms) = self.socket_timeout_ms {
            tracing::warn!(socket_timeout_ms = ms, "socketTimeoutMs is not supported and has no effect");
        }
        if let Some(ms) = self.max_connection_life_time_ms {
            tracing::warn!(
                max_connection_life_time_ms = ms,
                "maxConnectionLifeTimeMs is not supported and has no effect"
            );
        }

        Ok(())
    }
}

/// Interprets a write concern level: `majority`, a node count, or a tag set.
fn acknowledgment(level: &str) -> Acknowledgment {
    if level.eq_ignore_ascii_case("majority") {
        Acknowledgment::Majority
    } else if let Ok(nodes) = level.parse() {
        Acknowledgment::Nodes(nodes)
    } else {
        Acknowledgment::Custom(level.into())
    }
}

/// Read concern levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadConcernLevel {
    /// Most recent data on the queried node.
    Local,
    /// Like `Local`, possibly returning orphaned documents on shards.
    Available,
    /// Data acknowledged by a majority of the replica set.
    Majority,
    /// Majority-acknowledged data, reflecting all prior writes.
    Linearizable,
    /// Data from a snapshot of majority-committed data.
    Snapshot,
}

impl FromStr for ReadConcernLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let all = [
            ("local", ReadConcernLevel::Local),
            ("available", ReadConcernLevel::Available),
            ("majority", ReadConcernLevel::Majority),
            ("linearizable", ReadConcernLevel::Linearizable),
            ("snapshot", ReadConcernLevel::Snapshot),
        ];

        lookup(&all, s, "read concern level")
    }
}

impl From<ReadConcernLevel> for ReadConcern {
    fn from(level: ReadConcernLevel) -> Self {
        match level {
            ReadConcernLevel::Local        => ReadConcern::local(),
            ReadConcernLevel::Available    => ReadConcern::available(),
            ReadConcernLevel::Majority     => ReadConcern::majority(),
            ReadConcernLevel::Linearizable => ReadConcern::linearizable(),
            ReadConcernLevel::Snapshot     => ReadConcern::snapshot(),
        }
    }
}

/// Read preference modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ReadPreferenceMode {
    /// Only the primary.
    Primary,
    /// The primary if available, otherwise a secondary.
    PrimaryPreferred,
    /// Only secondaries.
    Secondary,
    /// A secondary if available, otherwise the primary.
    SecondaryPreferred,
    /// The member with the lowest latency.
    Nearest,
}

impl FromStr for ReadPreferenceMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let all = [
            ("primary", ReadPreferenceMode::Primary),
            ("primaryPreferred", ReadPreferenceMode::PrimaryPreferred),
            ("secondary", ReadPreferenceMode::Secondary),
            ("secondaryPreferred", ReadPreferenceMode::SecondaryPreferred),
            ("nearest", ReadPreferenceMode::Nearest),
        ];

        lookup(&all, s, "read preference")
    }
}

impl From<ReadPreferenceMode> for ReadPreference {
    fn from(mode: ReadPreferenceMode) -> Self {
        let options = ReadPreferenceOptions::default();

        match mode {
            ReadPreferenceMode::Primary => ReadPreference::Primary,
            ReadPreferenceMode::PrimaryPreferred => ReadPreference::PrimaryPreferred { options },
            ReadPreferenceMode::Secondary => ReadPreference::Secondary { options },
            ReadPreferenceMode::SecondaryPreferred => ReadPreference::SecondaryPreferred { options },
            ReadPreferenceMode::Nearest => ReadPreference::Nearest { options },
        }
    }
}

/// Finds a variant by case-insensitive name, ignoring underscores,
/// so that `primaryPreferred` and `PRIMARY_PREFERRED` are equivalent.
fn lookup<T: Copy>(table: &[(&str, T)], s: &str, what: &str) -> Result<T> {
    let wanted: String = s.chars().filter(|&c| c != '_').collect();

    table
        .iter()
        .find(|&&(name, _)| name.eq_ignore_ascii_case(&wanted))
        .map(|&(_, value)| value)
        .ok_or_else(|| Error::new(
            ErrorKind::Configuration,
            format!("unknown {} `{}`", what, s)
        ))
}

/// The default seed list.
fn default_server_addresses() -> Vec<ServerAddress> {
    vec![ServerAddress::default()]
}

/// The default port, for serde.
fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Accepts a single server address or a list of them.
fn one_or_many<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<Vec<ServerAddress>, D::Error> {
    /// Either shape of the `serverAddress` option.
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        /// `{ "host": ..., "port": ... }`
        One(ServerAddress),
        /// `[{ "host": ..., "port": ... }, ...]`
        Many(Vec<ServerAddress>),
    }

    OneOrMany::deserialize(de).map(|addresses| match addresses {
        OneOrMany::One(address) => vec![address],
        OneOrMany::Many(addresses) => addresses,
    })
}

/// Numeric option where `-1` means "not set".
fn unset_if_negative_one<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
    where D: Deserializer<'de>,
          T: TryFrom<i64>,
{
    match Option::<i64>::deserialize(de)? {
        None | Some(-1) => Ok(None),
        Some(n) => T::try_from(n).map(Some).map_err(|_| {
            D::Error::custom(format!("option value {} is out of range", n))
        }),
    }
}

/// String option where `""` means "not set".
fn unset_if_empty<'de, D, T>(de: D) -> std::result::Result<Option<T>, D::Error>
    where D: Deserializer<'de>,
          T: FromStr,
          T::Err: fmt::Display,
{
    match Option::<String>::deserialize(de)? {
        None => Ok(None),
        Some(ref s) if s.is_empty() => Ok(None),
        Some(s) => s.parse().map(Some).map_err(D::Error::custom),
    }
}
