//! TLS settings, validated and mapped onto the driver's TLS options.

use std::fmt;
use std::str::FromStr;
use std::convert::TryFrom;
use std::path::{ Path, PathBuf };
use mongodb::options::TlsOptions;
use crate::error::{ Error, ErrorKind, Result };

/// Protocol versions that may be requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TlsProtocol {
    /// Any version the TLS backend supports.
    Tls,
    /// TLS 1.2.
    Tls12,
    /// TLS 1.3.
    Tls13,
}

impl TlsProtocol {
    /// The configuration name of the protocol.
    pub fn as_str(self) -> &'static str {
        match self {
            TlsProtocol::Tls   => "TLS",
            TlsProtocol::Tls12 => "TLSv1.2",
            TlsProtocol::Tls13 => "TLSv1.3",
        }
    }
}

impl fmt::Display for TlsProtocol {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TlsProtocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "TLS"     => Ok(TlsProtocol::Tls),
            "TLSv1.2" => Ok(TlsProtocol::Tls12),
            "TLSv1.3" => Ok(TlsProtocol::Tls13),
            _ => Err(Error::new(
                ErrorKind::Tls,
                format!("unsupported TLS protocol `{}`; expected TLS, TLSv1.2 or TLSv1.3", s)
            )),
        }
    }
}

impl TryFrom<String> for TlsProtocol {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<TlsProtocol> for String {
    fn from(protocol: TlsProtocol) -> Self {
        protocol.as_str().into()
    }
}

/// TLS settings of a connection.
///
/// Stores are PEM files: the trust store holds the certificate authorities
/// used to verify the server, the key store the client certificate and its
/// private key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TlsConfig {
    /// Path of the CA certificate file.
    pub trust_store_path: Option<PathBuf>,
    /// Password of the trust store.
    pub trust_store_password: Option<String>,
    /// Path of the client certificate and key file.
    pub key_store_path: Option<PathBuf>,
    /// Password of the key store.
    pub key_store_password: Option<String>,
    /// Requested protocol version.
    pub protocol: Option<TlsProtocol>,
}

impl TlsConfig {
    /// Checks that the configured stores exist, then builds driver options.
    pub fn to_driver(&self) -> Result<TlsOptions> {
        let mut options = TlsOptions::default();

        if let Some(ref path) = self.trust_store_path {
            options.ca_file_path = Some(existing_file("Trust", path)?);
        }
        if let Some(ref path) = self.key_store_path {
            options.cert_key_file_path = Some(existing_file("Key", path)?);
        }
        if self.trust_store_password.is_some() || self.key_store_password.is_some() {
            tracing::warn!("TLS store passwords are not supported; stores are read as unencrypted PEM files");
        }
        match self.protocol {
            None | Some(TlsProtocol::Tls) => {}
            Some(protocol) => tracing::warn!(
                %protocol,
                "TLS protocol version can't be pinned; the highest version supported by both peers is negotiated"
            ),
        }

        Ok(options)
    }
}

/// Returns the path if it names a file, or an error naming the store and path.
fn existing_file(store: &str, path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        Ok(path.to_path_buf())
    } else {
        Err(Error::new(
            ErrorKind::Tls,
            format!(
                "{} store file not found for secure connections to MongoDB. {} store file path: '{}'",
                store, store, path.display()
            )
        ))
    }
}
