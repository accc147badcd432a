//! Wire records for the lifecycle-manager public API.
//!
//! Every list endpoint wraps its payload in a [`Page`]; element order is the
//! API response order and is preserved by the client, since callers present
//! enumerated menus whose indices resolve against it.

use serde::Deserialize;

/// Lifecycle state a host must be in to take part in an upgrade.
pub const STATUS_ASSIGNED: &str = "ASSIGNED";

/// Envelope used by every list endpoint: `{"elements": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct Page<T> {
    /// Elements in API response order.
    #[serde(default = "Vec::new")]
    pub elements: Vec<T>,
}

/// Reference to another inventory record by id.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceRef {
    /// Referenced record id.
    pub id: String,
}

/// A workload or management domain.
#[derive(Debug, Clone, Deserialize)]
pub struct Domain {
    /// Domain id.
    pub id: String,
    /// Human-readable domain name.
    pub name: String,
    /// Clusters owned by this domain (by reference).
    #[serde(default)]
    pub clusters: Vec<ResourceRef>,
}

/// A cluster of hosts sharing an upgrade target.
#[derive(Debug, Clone, Deserialize)]
pub struct Cluster {
    /// Cluster id.
    pub id: String,
    /// Human-readable cluster name.
    pub name: String,
}

/// A single ESXi host.
///
/// Hosts that are not yet commissioned may lack vendor, domain, or cluster
/// fields; those are only required once the host reports `ASSIGNED`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    /// Host id.
    pub id: String,
    /// Fully-qualified host name.
    pub fqdn: String,
    /// Lifecycle status, e.g. `ASSIGNED`.
    #[serde(default)]
    pub status: String,
    /// Hardware vendor tag reported by the host.
    #[serde(default)]
    pub hardware_vendor: Option<String>,
    /// Owning domain, once assigned.
    #[serde(default)]
    pub domain: Option<ResourceRef>,
    /// Owning cluster, once assigned.
    #[serde(default)]
    pub cluster: Option<ResourceRef>,
}

impl Host {
    /// Whether this host is in the assigned lifecycle state.
    #[must_use]
    pub fn is_assigned(&self) -> bool {
        self.status == STATUS_ASSIGNED
    }
}

/// An upgrade bundle with its target versions.
#[derive(Debug, Clone, Deserialize)]
pub struct Bundle {
    /// Bundle id.
    pub id: String,
    /// Upgrade components; the first carries the target version.
    #[serde(default)]
    pub components: Vec<BundleComponent>,
}

impl Bundle {
    /// Target version reported by the first upgrade component, if any.
    #[must_use]
    pub fn target_version(&self) -> Option<&str> {
        self.components
            .first()
            .and_then(|c| c.to_version.as_deref())
    }
}

/// A single upgrade component inside a bundle.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleComponent {
    /// Version this component upgrades to.
    #[serde(default)]
    pub to_version: Option<String>,
}
