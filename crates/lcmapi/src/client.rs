//! Backend trait and implementations for the lifecycle-manager API.
//!
//! The primary implementation is [`HttpBackend`], a blocking ureq client for
//! the appliance-local API. Use [`MockBackend`] for testing without network
//! access.

use crate::error::{Error, Result};
use crate::types::{Bundle, Cluster, Domain, Host, Page};
use serde::{Deserialize, Serialize};

/// Backend trait for fetching lifecycle-manager inventory and bundles.
///
/// All list operations return elements in API response order; callers rely
/// on that order for enumerated menus.
pub trait Backend: Send + Sync {
    /// Exchange credentials for an API token used by subsequent calls.
    ///
    /// # Errors
    ///
    /// Returns `Error::AuthFailed` when the credentials are rejected.
    fn authenticate(&mut self, username: &str, password: &str) -> Result<()>;

    /// Fetch all domains.
    fn domains(&self) -> Result<Vec<Domain>>;

    /// Fetch all clusters.
    fn clusters(&self) -> Result<Vec<Cluster>>;

    /// Fetch all hosts, in every lifecycle state.
    fn hosts(&self) -> Result<Vec<Host>>;

    /// Fetch bundles for a product type, in API response order.
    fn bundles(&self, product_type: &str) -> Result<Vec<Bundle>>;

    /// Fetch a single bundle by id.
    ///
    /// # Errors
    ///
    /// Returns `Error::BundleNotFound` if the id is unknown.
    fn bundle(&self, id: &str) -> Result<Bundle>;
}

#[derive(Debug, Serialize)]
struct TokenRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: Option<String>,
}

/// Blocking HTTP backend for the appliance-local API.
///
/// TLS verification is disabled: the endpoint is the appliance itself,
/// reached over localhost with a self-signed certificate.
pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    /// Create a backend for the given API base URL (no trailing slash).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .tls_config(
                ureq::tls::TlsConfig::builder()
                    .disable_verification(true)
                    .build(),
            )
            .build();
        Self {
            agent: config.new_agent(),
            base_url: base_url.into(),
            token: None,
        }
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> Result<String> {
        let token = self
            .token
            .as_deref()
            .ok_or_else(|| Error::invalid("API call before authentication"))?;
        Ok(format!("Bearer {}", token))
    }

    fn get_page<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        query: Option<(&str, &str)>,
    ) -> Result<Vec<T>> {
        let mut request = self.agent.get(self.url(path)).header("Authorization", self.bearer()?);
        if let Some((key, value)) = query {
            request = request.query(key, value);
        }
        let page: Page<T> = request.call()?.body_mut().read_json()?;
        Ok(page.elements)
    }
}

impl Backend for HttpBackend {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        let request = TokenRequest { username, password };
        let mut response = match self.agent.post(self.url("/v1/tokens")).send_json(&request) {
            Ok(response) => response,
            Err(ureq::Error::StatusCode(401 | 403)) => return Err(Error::AuthFailed),
            Err(err) => return Err(err.into()),
        };
        let body: TokenResponse = response.body_mut().read_json()?;
        match body.access_token {
            Some(token) => {
                self.token = Some(token);
                Ok(())
            }
            None => Err(Error::invalid("token response without accessToken")),
        }
    }

    fn domains(&self) -> Result<Vec<Domain>> {
        self.get_page("/v1/domains", None)
    }

    fn clusters(&self) -> Result<Vec<Cluster>> {
        self.get_page("/v1/clusters", None)
    }

    fn hosts(&self) -> Result<Vec<Host>> {
        self.get_page("/v1/hosts", None)
    }

    fn bundles(&self, product_type: &str) -> Result<Vec<Bundle>> {
        self.get_page("/v1/bundles", Some(("productType", product_type)))
    }

    fn bundle(&self, id: &str) -> Result<Bundle> {
        let url = self.url(&format!("/v1/bundles/{}", id));
        let result = self
            .agent
            .get(&url)
            .header("Authorization", self.bearer()?)
            .call();
        match result {
            Ok(mut response) => Ok(response.body_mut().read_json()?),
            Err(ureq::Error::StatusCode(404)) => Err(Error::BundleNotFound(id.to_string())),
            Err(err) => Err(err.into()),
        }
    }
}

/// Mock backend for testing without network access.
///
/// Records are returned in insertion order, matching the response-order
/// contract of the real API.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    domains: Vec<Domain>,
    clusters: Vec<Cluster>,
    hosts: Vec<Host>,
    bundles: Vec<Bundle>,
    credentials: Option<(String, String)>,
    authenticated: bool,
}

impl MockBackend {
    /// Create a new empty mock backend accepting any credentials.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the inventory records returned by the fetch operations.
    pub fn set_inventory(&mut self, domains: Vec<Domain>, clusters: Vec<Cluster>, hosts: Vec<Host>) {
        self.domains = domains;
        self.clusters = clusters;
        self.hosts = hosts;
    }

    /// Set the bundles returned by `bundles`/`bundle`.
    pub fn set_bundles(&mut self, bundles: Vec<Bundle>) {
        self.bundles = bundles;
    }

    /// Require this exact username/password pair on `authenticate`.
    pub fn require_credentials(&mut self, username: &str, password: &str) {
        self.credentials = Some((username.to_string(), password.to_string()));
    }

    /// Whether `authenticate` has succeeded on this mock.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }
}

impl Backend for MockBackend {
    fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        if let Some((user, pass)) = &self.credentials {
            if user != username || pass != password {
                return Err(Error::AuthFailed);
            }
        }
        self.authenticated = true;
        Ok(())
    }

    fn domains(&self) -> Result<Vec<Domain>> {
        Ok(self.domains.clone())
    }

    fn clusters(&self) -> Result<Vec<Cluster>> {
        Ok(self.clusters.clone())
    }

    fn hosts(&self) -> Result<Vec<Host>> {
        Ok(self.hosts.clone())
    }

    fn bundles(&self, _product_type: &str) -> Result<Vec<Bundle>> {
        Ok(self.bundles.clone())
    }

    fn bundle(&self, id: &str) -> Result<Bundle> {
        self.bundles
            .iter()
            .find(|b| b.id == id)
            .cloned()
            .ok_or_else(|| Error::BundleNotFound(id.to_string()))
    }
}
