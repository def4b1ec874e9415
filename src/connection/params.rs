//! Credential parsing and validation.
//!
//! This module holds the immutable [`Credentials`] describing how to reach and
//! authenticate to a Spark Thrift server, along with the builder and the
//! configuration shape they are deserialized from.

use crate::connection::auth::SecretToken;
use crate::error::ConfigurationError;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default port for both connection methods.
pub const DEFAULT_PORT: u16 = 443;

/// Default organization id for HTTP tunnel URLs.
pub const DEFAULT_ORGANIZATION: &str = "0";

/// Default number of seconds to wait between connection attempts.
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// How the connection to the engine is established.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionMethod {
    /// Direct Thrift session authenticated by username
    Thrift,
    /// Thrift over HTTPS, authenticated with a bearer token
    Http,
}

impl ConnectionMethod {
    /// Method name as it appears in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Thrift => "thrift",
            Self::Http => "http",
        }
    }

    /// Fields that must be set before a transport can be built for this method.
    pub fn required_fields(&self) -> &'static [CredentialField] {
        match self {
            Self::Http => &[
                CredentialField::Host,
                CredentialField::Port,
                CredentialField::Cluster,
                CredentialField::Organization,
                CredentialField::Token,
                CredentialField::Schema,
            ],
            Self::Thrift => &[
                CredentialField::Host,
                CredentialField::Port,
                CredentialField::User,
                CredentialField::Schema,
            ],
        }
    }
}

impl FromStr for ConnectionMethod {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "thrift" => Ok(Self::Thrift),
            "http" => Ok(Self::Http),
            other => Err(ConfigurationError::InvalidMethod(other.to_string())),
        }
    }
}

impl fmt::Display for ConnectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A credential field that a connection method may require.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialField {
    Host,
    Port,
    Cluster,
    Organization,
    Token,
    User,
    Schema,
}

impl CredentialField {
    /// Field name as it appears in configuration.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Host => "host",
            Self::Port => "port",
            Self::Cluster => "cluster",
            Self::Organization => "organization",
            Self::Token => "token",
            Self::User => "user",
            Self::Schema => "schema",
        }
    }
}

/// Immutable connection credentials.
///
/// Spark treats database and schema as one namespace, so `database` always
/// mirrors `schema`. The alias is applied once, when the credentials are
/// constructed; any database value supplied by configuration is ignored.
#[derive(Clone, Deserialize)]
#[serde(try_from = "CredentialsConfig")]
pub struct Credentials {
    host: Option<String>,
    method: ConnectionMethod,
    schema: Option<String>,
    database: Option<String>,
    cluster: Option<String>,
    token: Option<SecretToken>,
    user: Option<String>,
    port: u16,
    organization: String,
    connect_retries: u32,
    connect_timeout_secs: u64,
}

impl Credentials {
    /// Create a builder for the given connection method.
    pub fn builder(method: ConnectionMethod) -> CredentialsBuilder {
        CredentialsBuilder::new(method)
    }

    /// Identifier of the engine family these credentials connect to.
    pub fn connection_type(&self) -> &'static str {
        "spark"
    }

    /// Keys shown when describing the connection.
    pub fn connection_keys(&self) -> &'static [&'static str] {
        &["host", "port", "cluster", "schema", "organization"]
    }

    /// Check that every field in `required` is set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::MissingField` naming the first field that
    /// is absent or empty.
    pub fn validate(&self, required: &[CredentialField]) -> Result<(), ConfigurationError> {
        match required.iter().find(|field| !self.is_set(**field)) {
            Some(field) => Err(ConfigurationError::MissingField {
                field: field.name(),
                method: self.method,
            }),
            None => Ok(()),
        }
    }

    /// Validate the fields required by this credential's own method.
    pub fn validate_for_method(&self) -> Result<(), ConfigurationError> {
        self.validate(self.method.required_fields())
    }

    fn is_set(&self, field: CredentialField) -> bool {
        fn present(value: Option<&str>) -> bool {
            value.is_some_and(|v| !v.is_empty())
        }

        match field {
            CredentialField::Host => present(self.host()),
            CredentialField::Port => self.port != 0,
            CredentialField::Cluster => present(self.cluster()),
            CredentialField::Organization => !self.organization.is_empty(),
            CredentialField::Token => present(self.token.as_ref().map(SecretToken::expose)),
            CredentialField::User => present(self.user()),
            CredentialField::Schema => present(self.schema()),
        }
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn method(&self) -> ConnectionMethod {
        self.method
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    pub fn cluster(&self) -> Option<&str> {
        self.cluster.as_deref()
    }

    pub fn token(&self) -> Option<&SecretToken> {
        self.token.as_ref()
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    /// Number of additional attempts after the first failed connection.
    pub fn connect_retries(&self) -> u32 {
        self.connect_retries
    }

    /// Time to wait between connection attempts.
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("host", &self.host)
            .field("method", &self.method)
            .field("schema", &self.schema)
            .field("database", &self.database)
            .field("cluster", &self.cluster)
            .field("token", &self.token)
            .field("user", &self.user)
            .field("port", &self.port)
            .field("organization", &self.organization)
            .field("connect_retries", &self.connect_retries)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Raw credential configuration as supplied by a profile loader.
///
/// Deserializing [`Credentials`] goes through this shape, so the defaults and
/// the schema/database alias apply to both construction paths.
#[derive(Deserialize)]
pub struct CredentialsConfig {
    #[serde(default)]
    pub host: Option<String>,
    pub method: String,
    #[serde(default)]
    pub schema: Option<String>,
    /// Accepted for compatibility with profile files; always replaced by `schema`
    #[serde(default)]
    pub database: Option<String>,
    #[serde(default)]
    pub cluster: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_organization")]
    pub organization: String,
    #[serde(default)]
    pub connect_retries: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_organization() -> String {
    DEFAULT_ORGANIZATION.to_string()
}

fn default_connect_timeout() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

impl TryFrom<CredentialsConfig> for Credentials {
    type Error = ConfigurationError;

    fn try_from(config: CredentialsConfig) -> Result<Self, Self::Error> {
        let method = config.method.parse()?;
        let mut builder = CredentialsBuilder::new(method)
            .port(config.port)
            .organization(&config.organization)
            .connect_retries(config.connect_retries)
            .connect_timeout_secs(config.connect_timeout);

        builder.host = config.host;
        builder.schema = config.schema;
        builder.cluster = config.cluster;
        builder.token = config.token.map(SecretToken::new);
        builder.user = config.user;

        Ok(builder.build())
    }
}

/// Builder for constructing [`Credentials`].
///
/// Per-method required fields are not checked here; call
/// [`Credentials::validate`] before building a transport.
#[derive(Debug, Clone)]
pub struct CredentialsBuilder {
    method: ConnectionMethod,
    host: Option<String>,
    schema: Option<String>,
    cluster: Option<String>,
    token: Option<SecretToken>,
    user: Option<String>,
    port: u16,
    organization: String,
    connect_retries: u32,
    connect_timeout_secs: u64,
}

impl CredentialsBuilder {
    /// Create a new builder with default values.
    pub fn new(method: ConnectionMethod) -> Self {
        Self {
            method,
            host: None,
            schema: None,
            cluster: None,
            token: None,
            user: None,
            port: DEFAULT_PORT,
            organization: DEFAULT_ORGANIZATION.to_string(),
            connect_retries: 0,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }

    pub fn host(mut self, host: &str) -> Self {
        self.host = Some(host.to_string());
        self
    }

    /// Set the schema. The database is always set to the same value.
    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.to_string());
        self
    }

    pub fn cluster(mut self, cluster: &str) -> Self {
        self.cluster = Some(cluster.to_string());
        self
    }

    pub fn token(mut self, token: &str) -> Self {
        self.token = Some(SecretToken::new(token.to_string()));
        self
    }

    pub fn user(mut self, user: &str) -> Self {
        self.user = Some(user.to_string());
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn organization(mut self, organization: &str) -> Self {
        self.organization = organization.to_string();
        self
    }

    pub fn connect_retries(mut self, retries: u32) -> Self {
        self.connect_retries = retries;
        self
    }

    pub fn connect_timeout_secs(mut self, seconds: u64) -> Self {
        self.connect_timeout_secs = seconds;
        self
    }

    /// Build the credentials, aliasing database to schema.
    pub fn build(self) -> Credentials {
        Credentials {
            database: self.schema.clone(),
            host: self.host,
            method: self.method,
            schema: self.schema,
            cluster: self.cluster,
            token: self.token,
            user: self.user,
            port: self.port,
            organization: self.organization,
            connect_retries: self.connect_retries,
            connect_timeout_secs: self.connect_timeout_secs,
        }
    }
}
