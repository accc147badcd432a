//! In-memory inventory built once from the lifecycle-manager API.
//!
//! The inventory is constructed by the fetch step and passed read-only to
//! every downstream component. Only hosts in the `ASSIGNED` lifecycle state
//! are loaded; anything else is invisible to selection, vendor
//! reconciliation, and skip-list generation.

use lcmapi::{Client, Error};
use std::collections::HashMap;

/// A domain with the clusters it owns, in API response order.
#[derive(Debug, Clone)]
pub struct DomainEntry {
    /// Domain id.
    pub id: String,
    /// Domain name shown in menus.
    pub name: String,
    /// Owned cluster ids, in API response order.
    pub cluster_ids: Vec<String>,
}

/// An assigned host with resolved references.
#[derive(Debug, Clone)]
pub struct HostRecord {
    /// Host id.
    pub id: String,
    /// Fully-qualified host name.
    pub fqdn: String,
    /// Hardware vendor tag.
    pub vendor: String,
    /// Owning domain id.
    pub domain_id: String,
    /// Owning cluster id.
    pub cluster_id: String,
}

/// Read-only view of domains, clusters, and assigned hosts.
#[derive(Debug, Default)]
pub struct Inventory {
    domains: Vec<DomainEntry>,
    cluster_names: HashMap<String, String>,
    hosts: HashMap<String, HostRecord>,
    cluster_hosts: HashMap<String, Vec<String>>,
}

impl Inventory {
    /// Fetch domains, clusters, and hosts, keeping only assigned hosts.
    ///
    /// An assigned host with a missing vendor tag or a domain/cluster
    /// reference that does not resolve to a loaded record is a fetch-layer
    /// error: the payload is unusable and nothing downstream should run.
    pub fn load(client: &Client) -> lcmapi::Result<Self> {
        let mut inventory = Self::default();

        for domain in client.domains()? {
            inventory.domains.push(DomainEntry {
                id: domain.id,
                name: domain.name,
                cluster_ids: domain.clusters.into_iter().map(|c| c.id).collect(),
            });
        }

        for cluster in client.clusters()? {
            inventory.cluster_names.insert(cluster.id, cluster.name);
        }

        for host in client.hosts()? {
            if !host.is_assigned() {
                continue;
            }
            let vendor = host
                .hardware_vendor
                .ok_or_else(|| Error::invalid(format!("assigned host {} has no vendor", host.id)))?;
            let domain_id = host
                .domain
                .map(|d| d.id)
                .ok_or_else(|| Error::invalid(format!("assigned host {} has no domain", host.id)))?;
            let cluster_id = host
                .cluster
                .map(|c| c.id)
                .ok_or_else(|| Error::invalid(format!("assigned host {} has no cluster", host.id)))?;

            if !inventory.domains.iter().any(|d| d.id == domain_id) {
                return Err(Error::invalid(format!(
                    "host {} references unknown domain {}",
                    host.id, domain_id
                )));
            }
            if !inventory.cluster_names.contains_key(&cluster_id) {
                return Err(Error::invalid(format!(
                    "host {} references unknown cluster {}",
                    host.id, cluster_id
                )));
            }

            inventory
                .cluster_hosts
                .entry(cluster_id.clone())
                .or_default()
                .push(host.id.clone());
            inventory.hosts.insert(
                host.id.clone(),
                HostRecord {
                    id: host.id,
                    fqdn: host.fqdn,
                    vendor,
                    domain_id,
                    cluster_id,
                },
            );
        }

        log::info!(
            "Inventory loaded: domains={}, clusters={}, assigned hosts={}",
            inventory.domains.len(),
            inventory.cluster_names.len(),
            inventory.hosts.len()
        );
        Ok(inventory)
    }

    /// Domain names in API response order.
    pub fn domain_names(&self) -> Vec<&str> {
        self.domains.iter().map(|d| d.name.as_str()).collect()
    }

    /// Look up a domain by name.
    pub fn domain(&self, name: &str) -> Option<&DomainEntry> {
        self.domains.iter().find(|d| d.name == name)
    }

    /// Domain name for a domain id, when known.
    pub fn domain_name_of(&self, domain_id: &str) -> Option<&str> {
        self.domains
            .iter()
            .find(|d| d.id == domain_id)
            .map(|d| d.name.as_str())
    }

    /// Cluster name for an id, falling back to the id itself.
    pub fn cluster_name<'a>(&'a self, cluster_id: &'a str) -> &'a str {
        self.cluster_names
            .get(cluster_id)
            .map_or(cluster_id, String::as_str)
    }

    /// Ids of the assigned hosts in a cluster, in API response order.
    pub fn cluster_hosts(&self, cluster_id: &str) -> &[String] {
        self.cluster_hosts
            .get(cluster_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Look up an assigned host by id.
    pub fn host(&self, host_id: &str) -> Option<&HostRecord> {
        self.hosts.get(host_id)
    }
}

/// Available upgrade bundles with their target versions, in fetch order.
#[derive(Debug, Default)]
pub struct BundleCatalog {
    entries: Vec<(String, String)>,
}

impl BundleCatalog {
    /// Fetch bundles for a product type and pair each with its target
    /// version.
    ///
    /// A bundle without an upgrade component (or without a target version on
    /// its first component) is a data error, never a silent default.
    pub fn load(client: &Client, product_type: &str) -> lcmapi::Result<Self> {
        let mut entries = Vec::new();
        for bundle in client.bundles(product_type)? {
            let version = bundle.target_version().ok_or_else(|| {
                Error::invalid(format!("bundle {} reports no target version", bundle.id))
            })?;
            entries.push((bundle.id.clone(), version.to_string()));
        }
        Ok(Self { entries })
    }

    /// Whether the catalog holds no bundles.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of bundles.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(bundle id, target version)` pairs in fetch order.
    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Target version for a bundle id.
    pub fn version_for(&self, bundle_id: &str) -> lcmapi::Result<&str> {
        self.entries
            .iter()
            .find(|(id, _)| id == bundle_id)
            .map(|(_, version)| version.as_str())
            .ok_or_else(|| Error::BundleNotFound(bundle_id.to_string()))
    }
}

// ============================================================================
// Test fixtures
// ============================================================================
