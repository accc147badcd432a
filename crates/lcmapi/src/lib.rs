//! # lcmapi
//!
//! Minimal blocking client for the lifecycle-manager public API.
//!
//! This crate covers the read-only slice of the API that upgrade tooling
//! needs: token authentication, domain/cluster/host inventory, and upgrade
//! bundles. List results keep the API response order; callers present
//! enumerated menus whose indices resolve against that order.
//!
//! ## Example
//!
//! ```no_run
//! use lcmapi::Client;
//!
//! let mut client = Client::new("https://localhost");
//! client.authenticate("administrator@vsphere.local", "secret").unwrap();
//!
//! for domain in client.domains().unwrap() {
//!     println!("{} ({} clusters)", domain.name, domain.clusters.len());
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod error;
pub mod types;

pub use client::{Backend, HttpBackend, MockBackend};
pub use error::{Error, Result};
pub use types::{Bundle, BundleComponent, Cluster, Domain, Host, Page, ResourceRef, STATUS_ASSIGNED};

/// High-level client for lifecycle-manager API operations.
pub struct Client {
    backend: Box<dyn Backend>,
}

impl Client {
    /// Create a client talking HTTP to the given API base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            backend: Box::new(HttpBackend::new(base_url)),
        }
    }

    /// Create a client with a custom backend (useful for testing).
    #[must_use]
    pub fn with_backend(backend: Box<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Exchange credentials for an API token used by subsequent calls.
    pub fn authenticate(&mut self, username: &str, password: &str) -> Result<()> {
        self.backend.authenticate(username, password)
    }

    /// Fetch all domains.
    pub fn domains(&self) -> Result<Vec<Domain>> {
        self.backend.domains()
    }

    /// Fetch all clusters.
    pub fn clusters(&self) -> Result<Vec<Cluster>> {
        self.backend.clusters()
    }

    /// Fetch all hosts, in every lifecycle state.
    pub fn hosts(&self) -> Result<Vec<Host>> {
        self.backend.hosts()
    }

    /// Fetch bundles for a product type, in API response order.
    pub fn bundles(&self, product_type: &str) -> Result<Vec<Bundle>> {
        self.backend.bundles(product_type)
    }

    /// Fetch a single bundle by id.
    pub fn bundle(&self, id: &str) -> Result<Bundle> {
        self.backend.bundle(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_with_mock_backend() {
        let mut mock = MockBackend::new();
        mock.set_bundles(vec![serde_json::from_str(
            r#"{"id": "b1", "components": [{"toVersion": "8.0.3"}]}"#,
        )
        .unwrap()]);

        let mut client = Client::with_backend(Box::new(mock));
        client.authenticate("user", "pass").unwrap();

        let bundles = client.bundles("ESX").unwrap();
        assert_eq!(bundles.len(), 1);
        assert_eq!(bundles[0].id, "b1");
    }

    #[test]
    fn test_client_bundle_not_found() {
        let client = Client::with_backend(Box::new(MockBackend::new()));
        let err = client.bundle("nope").unwrap_err();
        assert!(matches!(err, Error::BundleNotFound(_)));
    }
}
