//! Vendor reconciliation for mixed-vendor clusters.
//!
//! A custom image is built for exactly one hardware vendor, so a cluster
//! whose hosts span several vendors can only upgrade the hosts of one of
//! them. The reconciler picks the effective vendor (unique, or chosen by the
//! operator) and reports every host of the other vendors for the skip list.

use crate::engine::{EngineError, PROMPT_ATTEMPTS};
use crate::inventory::Inventory;
use crate::prompt::Prompter;
use crate::ui;
use std::collections::BTreeSet;

/// Outcome of reconciling one cluster.
#[derive(Debug)]
pub struct Reconciled {
    /// The vendor the cluster will be upgraded as.
    pub vendor: String,
    /// Hosts excluded because their vendor was not chosen.
    pub skipped: Vec<String>,
}

/// Hosts excluded from the upgrade run, across all reconciled clusters.
///
/// Grows monotonically; duplicates are tolerated on write and collapsed on
/// read.
#[derive(Debug, Default)]
pub struct SkipSet {
    ids: Vec<String>,
}

impl SkipSet {
    /// Record more host ids to skip.
    pub fn extend(&mut self, ids: impl IntoIterator<Item = String>) {
        self.ids.extend(ids);
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Deduplicated ids in sorted order.
    pub fn sorted_unique(&self) -> Vec<&str> {
        let set: BTreeSet<&str> = self.ids.iter().map(String::as_str).collect();
        set.into_iter().collect()
    }

    /// Number of distinct hosts recorded.
    pub fn unique_count(&self) -> usize {
        self.sorted_unique().len()
    }

    /// The sorted, comma-joined, deduplicated property value.
    pub fn property_value(&self) -> String {
        self.sorted_unique().join(",")
    }
}

/// Determine the effective vendor for a cluster and the hosts to skip.
///
/// A single-vendor cluster resolves silently. A multi-vendor cluster asks
/// the operator to choose (3 attempts), then every host of a non-chosen
/// vendor is reported as a skip addition. A cluster without assigned hosts
/// has no vendor at all and is surfaced as a configuration error rather
/// than prompted over an empty set.
pub fn reconcile(
    inventory: &Inventory,
    cluster_id: &str,
    prompter: &mut dyn Prompter,
) -> Result<Reconciled, EngineError> {
    let cluster_name = inventory.cluster_name(cluster_id);
    let host_ids = inventory.cluster_hosts(cluster_id);

    let vendors: BTreeSet<&str> = host_ids
        .iter()
        .filter_map(|id| inventory.host(id))
        .map(|host| host.vendor.as_str())
        .collect();

    if vendors.is_empty() {
        return Err(EngineError::Validation(format!(
            "cluster {cluster_name} has no assigned hosts, so no vendor can be determined"
        )));
    }
    if vendors.len() == 1 {
        let vendor = (*vendors.iter().next().unwrap()).to_string();
        log::debug!("cluster {cluster_name}: single vendor {vendor}");
        return Ok(Reconciled {
            vendor,
            skipped: Vec::new(),
        });
    }

    let listed: Vec<&str> = vendors.iter().copied().collect();
    let chosen = choose_vendor(cluster_name, &listed, prompter)?;

    let skipped: Vec<String> = host_ids
        .iter()
        .filter_map(|id| inventory.host(id))
        .filter(|host| host.vendor != chosen)
        .map(|host| host.id.clone())
        .collect();
    log::info!(
        "cluster {cluster_name}: vendor {chosen} chosen, skipping {} host(s)",
        skipped.len()
    );

    Ok(Reconciled {
        vendor: chosen,
        skipped,
    })
}

fn choose_vendor(
    cluster_name: &str,
    vendors: &[&str],
    prompter: &mut dyn Prompter,
) -> Result<String, EngineError> {
    let prompt = format!(
        "Cluster {cluster_name} spans vendors [{}]. Hosts of the other vendors will be \
         skipped. Choose one",
        vendors.join(", ")
    );
    for _ in 0..PROMPT_ATTEMPTS {
        let answer = prompter.input(&prompt)?;
        let answer = answer.trim();
        if vendors.contains(&answer) {
            return Ok(answer.to_string());
        }
        ui::warn(&format!("{answer} is not a vendor of this cluster"));
    }
    Err(EngineError::exhausted("vendor choice"))
}
