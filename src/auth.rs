//! Authentication mechanisms and the credentials they produce.

use std::fmt;
use std::str::FromStr;
use std::convert::TryFrom;
use mongodb::options::{ Credential, AuthMechanism as DriverMechanism };
use crate::error::{ Error, ErrorKind, Result };

/// The source database of credentials when none is configured.
pub const DEFAULT_SOURCE_DATABASE: &str = "admin";

/// The mechanism property naming the Kerberos service.
const SERVICE_NAME_PROPERTY: &str = "SERVICE_NAME";

/// The supported authentication mechanisms.
///
/// Mechanism names are parsed when the configuration is built, so an
/// unsupported name is rejected before any connection is attempted:
/// ```
/// # use mongo_connector::auth::AuthMechanism;
/// # use mongo_connector::error::{ ErrorKind, ErrorExt };
/// assert_eq!("SCRAM_SHA_256".parse::<AuthMechanism>().ok(), Some(AuthMechanism::ScramSha256));
/// assert_eq!("MONGODB-X509".parse::<AuthMechanism>().ok(), Some(AuthMechanism::X509));
/// assert_eq!("MONGODB_CR".parse::<AuthMechanism>().unwrap_err().kind(),
///            ErrorKind::UnsupportedAuthMechanism);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthMechanism {
    /// LDAP via SASL PLAIN.
    Plain,
    /// SCRAM with SHA-1.
    ScramSha1,
    /// SCRAM with SHA-256.
    ScramSha256,
    /// X.509 client certificates.
    X509,
    /// Kerberos.
    Gssapi,
}

impl AuthMechanism {
    /// The canonical configuration name of the mechanism.
    pub fn as_str(self) -> &'static str {
        match self {
            AuthMechanism::Plain       => "PLAIN",
            AuthMechanism::ScramSha1   => "SCRAM_SHA_1",
            AuthMechanism::ScramSha256 => "SCRAM_SHA_256",
            AuthMechanism::X509        => "MONGODB_X509",
            AuthMechanism::Gssapi      => "GSSAPI",
        }
    }
}

impl fmt::Display for AuthMechanism {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AuthMechanism {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "PLAIN"                          => Ok(AuthMechanism::Plain),
            "SCRAM_SHA_1" | "SCRAM-SHA-1"     => Ok(AuthMechanism::ScramSha1),
            "SCRAM_SHA_256" | "SCRAM-SHA-256" => Ok(AuthMechanism::ScramSha256),
            "MONGODB_X509" | "MONGODB-X509"   => Ok(AuthMechanism::X509),
            "GSSAPI"                         => Ok(AuthMechanism::Gssapi),
            _ => Err(Error::new(
                ErrorKind::UnsupportedAuthMechanism,
                format!("Unsupported authentication mechanism: {}", s)
            )),
        }
    }
}

impl TryFrom<String> for AuthMechanism {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<AuthMechanism> for String {
    fn from(mechanism: AuthMechanism) -> Self {
        mechanism.as_str().into()
    }
}

/// Authentication settings of a connection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthConfig {
    /// The mechanism. When unset, a username and password (if both are
    /// given) are used with the server's default mechanism.
    pub mechanism: Option<AuthMechanism>,
    /// The user to authenticate as.
    pub username: Option<String>,
    /// The password of the user.
    pub password: Option<String>,
    /// The database holding the user's credentials.
    #[serde(alias = "database")]
    pub source_database: Option<String>,
    /// Kerberos service name (`GSSAPI` only).
    pub service_name: Option<String>,
}

impl AuthConfig {
    /// Produces the driver credential, or `None` if these settings
    /// don't ask for authentication.
    pub fn credential(&self) -> Result<Option<Credential>> {
        let credential = match self.mechanism {
            Some(AuthMechanism::Plain) => plain(self)?,
            Some(AuthMechanism::ScramSha1) => scram(self, DriverMechanism::ScramSha1)?,
            Some(AuthMechanism::ScramSha256) => scram(self, DriverMechanism::ScramSha256)?,
            Some(AuthMechanism::X509) => x509(self),
            Some(AuthMechanism::Gssapi) => gssapi(self)?,
            None => match default_credential(self) {
                Some(credential) => credential,
                None => return Ok(None),
            },
        };

        Ok(Some(credential))
    }

    /// Returns the username, or an error naming the mechanism that needs it.
    fn require_username(&self, mechanism: AuthMechanism) -> Result<String> {
        self.username.clone().ok_or_else(|| Error::new(
            ErrorKind::Configuration,
            format!("authentication mechanism {} requires a username", mechanism)
        ))
    }

    /// Returns the password, or an error naming the mechanism that needs it.
    fn require_password(&self, mechanism: AuthMechanism) -> Result<String> {
        self.password.clone().ok_or_else(|| Error::new(
            ErrorKind::Configuration,
            format!("authentication mechanism {} requires a password", mechanism)
        ))
    }
}

/// SASL PLAIN. The source database defaults to `$external` in the driver.
fn plain(auth: &AuthConfig) -> Result<Credential> {
    let mut credential = Credential::default();
    credential.username = Some(auth.require_username(AuthMechanism::Plain)?);
    credential.password = Some(auth.require_password(AuthMechanism::Plain)?);
    credential.source = auth.source_database.clone();
    credential.mechanism = Some(DriverMechanism::Plain);
    Ok(credential)
}

/// SCRAM-SHA-1 or SCRAM-SHA-256.
fn scram(auth: &AuthConfig, mechanism: DriverMechanism) -> Result<Credential> {
    let name = match mechanism {
        DriverMechanism::ScramSha1 => AuthMechanism::ScramSha1,
        _ => AuthMechanism::ScramSha256,
    };
    let mut credential = Credential::default();
    credential.username = Some(auth.require_username(name)?);
    credential.password = Some(auth.require_password(name)?);
    credential.source = auth.source_database.clone();
    credential.mechanism = Some(mechanism);
    Ok(credential)
}

/// X.509. The username is optional; the server derives it from the
/// client certificate when absent.
fn x509(auth: &AuthConfig) -> Credential {
    let mut credential = Credential::default();
    credential.username = auth.username.clone();
    credential.mechanism = Some(DriverMechanism::MongoDbX509);
    credential
}

/// Kerberos, with an optional service name.
fn gssapi(auth: &AuthConfig) -> Result<Credential> {
    let mut credential = Credential::default();
    credential.username = Some(auth.require_username(AuthMechanism::Gssapi)?);
    credential.mechanism = Some(DriverMechanism::Gssapi);
    credential.mechanism_properties = auth.service_name.as_ref().map(|name| doc!{
        SERVICE_NAME_PROPERTY: name.as_str(),
    });
    Ok(credential)
}

/// Username and password against the source database, if both are given.
fn default_credential(auth: &AuthConfig) -> Option<Credential> {
    let username = auth.username.clone()?;
    let password = auth.password.clone()?;
    let mut credential = Credential::default();

    credential.username = Some(username);
    credential.password = Some(password);
    credential.source = Some(
        auth.source_database.clone().unwrap_or_else(|| DEFAULT_SOURCE_DATABASE.into())
    );

    Some(credential)
}
