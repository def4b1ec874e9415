//! HTTP tunnel transport description.
//!
//! An [`HttpTransport`] carries the endpoint URL and the custom headers a
//! connector must send when it opens a Thrift session over HTTPS.

use crate::error::ConfigurationError;
use std::collections::BTreeMap;
use std::fmt;
use url::Url;

use crate::connection::auth::AUTHORIZATION_HEADER;

/// Path prefix of the Thrift-over-HTTP endpoint.
pub const CONNECTION_URL_PATH: &str = "sql/protocolv1/o";

/// HTTP transport endpoint with custom request headers.
#[derive(Clone)]
pub struct HttpTransport {
    url: Url,
    custom_headers: BTreeMap<String, String>,
}

impl HttpTransport {
    /// Create a transport for an endpoint URL.
    ///
    /// # Errors
    ///
    /// Returns `ConfigurationError::InvalidUrl` if the URL does not parse.
    pub fn new(url: &str) -> Result<Self, ConfigurationError> {
        let url = Url::parse(url).map_err(|e| ConfigurationError::InvalidUrl {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(Self {
            url,
            custom_headers: BTreeMap::new(),
        })
    }

    /// Create a transport for a cluster endpoint:
    /// `https://{host}:{port}/sql/protocolv1/o/{organization}/{cluster}`.
    pub fn for_cluster(
        host: &str,
        port: u16,
        organization: &str,
        cluster: &str,
    ) -> Result<Self, ConfigurationError> {
        Self::new(&cluster_url(host, port, organization, cluster))
    }

    /// Replace the custom headers sent with every request.
    pub fn set_custom_headers<I, K, V>(&mut self, headers: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.custom_headers = headers
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
    }

    pub fn custom_headers(&self) -> &BTreeMap<String, String> {
        &self.custom_headers
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> Option<&str> {
        self.url.host_str()
    }

    /// Port of the endpoint, including the scheme's default when elided.
    pub fn port(&self) -> Option<u16> {
        self.url.port_or_known_default()
    }

    pub fn path(&self) -> &str {
        self.url.path()
    }
}

/// Format the endpoint URL of a cluster.
pub fn cluster_url(host: &str, port: u16, organization: &str, cluster: &str) -> String {
    format!(
        "https://{}:{}/{}/{}/{}",
        host, port, CONNECTION_URL_PATH, organization, cluster
    )
}

// Authorization header values must never reach logs
impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let headers: BTreeMap<&str, &str> = self
            .custom_headers
            .iter()
            .map(|(k, v)| {
                if k.eq_ignore_ascii_case(AUTHORIZATION_HEADER) {
                    (k.as_str(), "<redacted>")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();

        f.debug_struct("HttpTransport")
            .field("url", &self.url.as_str())
            .field("custom_headers", &headers)
            .finish()
    }
}
