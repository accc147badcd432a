//! Image-assignment records and the persisted spec artifact.

use crate::engine::EngineError;
use crate::engine::image::{IsoMode, IsoResolver};
use crate::engine::selection::Selection;
use crate::engine::vendor::{self, SkipSet};
use crate::inventory::Inventory;
use crate::prompt::Prompter;
use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the generated spec artifact.
pub const SPEC_FILENAME: &str = "generated_custom_iso_spec.json";

/// One per-cluster pairing of bundle, target version, and custom image.
///
/// Serialized field order is part of the artifact contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageAssignment {
    /// Upgrade bundle id.
    pub bundle_id: String,
    /// Version the bundle upgrades to.
    pub target_esx_version: String,
    /// Whether the vendor-supplied bundle image is used; always false here.
    pub use_vcf_bundle: bool,
    /// Owning domain id.
    pub domain_id: String,
    /// Target cluster id; always present for this tool.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    /// Absolute path of the custom image.
    pub custom_iso_absolute_path: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SpecDocument<'a> {
    esx_custom_image_spec_list: &'a [ImageAssignment],
}

/// Assignments plus the per-vendor counts for the final summary.
#[derive(Debug, Default)]
pub struct BuildOutcome {
    /// One record per selected cluster, in selection order.
    pub assignments: Vec<ImageAssignment>,
    /// Clusters per effective vendor.
    pub vendor_counts: BTreeMap<String, usize>,
}

/// Build one [`ImageAssignment`] per selected cluster, reconciling vendors
/// and resolving images along the way.
///
/// Skip additions from mixed-vendor clusters land in `skip_set`.
pub fn build(
    inventory: &Inventory,
    selection: &Selection,
    bundle_id: &str,
    target_version: &str,
    mode: IsoMode,
    skip_set: &mut SkipSet,
    prompter: &mut dyn Prompter,
) -> Result<BuildOutcome, EngineError> {
    let mut resolver = IsoResolver::new(mode);
    let mut outcome = BuildOutcome::default();

    for (domain_name, cluster_ids) in selection.iter() {
        let domain_id = inventory
            .domain(domain_name)
            .map(|d| d.id.clone())
            .ok_or_else(|| {
                EngineError::Validation(format!("selection references unknown domain {domain_name}"))
            })?;

        for cluster_id in cluster_ids {
            let cluster_name = inventory.cluster_name(cluster_id);
            let reconciled = vendor::reconcile(inventory, cluster_id, prompter)?;
            skip_set.extend(reconciled.skipped);
            *outcome
                .vendor_counts
                .entry(reconciled.vendor.clone())
                .or_default() += 1;

            let iso = resolver.resolve(&reconciled.vendor, cluster_name, prompter)?;
            outcome.assignments.push(ImageAssignment {
                bundle_id: bundle_id.to_string(),
                target_esx_version: target_version.to_string(),
                use_vcf_bundle: false,
                domain_id: domain_id.clone(),
                cluster_id: Some(cluster_id.clone()),
                custom_iso_absolute_path: iso.display().to_string(),
            });
        }
    }

    Ok(outcome)
}

/// Write the spec document into `dir`, pretty-printed, readable by the
/// service account.
pub fn write(dir: &Path, assignments: &[ImageAssignment]) -> Result<PathBuf> {
    let document = SpecDocument {
        esx_custom_image_spec_list: assignments,
    };
    let path = dir.join(SPEC_FILENAME);
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize image spec")?;
    fs::write(&path, json)
        .with_context(|| format!("Failed to write image spec: {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    log::info!(
        "wrote image spec with {} entries: {}",
        assignments.len(),
        path.display()
    );
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inventory::fixtures::Fixture;
    use crate::prompt::ScriptedPrompter;
    use tempfile::TempDir;

    fn assignment(cluster_id: &str, iso: &str) -> ImageAssignment {
        ImageAssignment {
            bundle_id: "bundle-1".to_string(),
            target_esx_version: "8.0.3-24022510".to_string(),
            use_vcf_bundle: false,
            domain_id: "d1".to_string(),
            cluster_id: Some(cluster_id.to_string()),
            custom_iso_absolute_path: iso.to_string(),
        }
    }

    #[test]
    fn serialized_field_names_and_order_are_stable() {
        let json = serde_json::to_string(&assignment("c1", "/isos/a.iso")).unwrap();
        assert_eq!(
            json,
            r#"{"bundleId":"bundle-1","targetEsxVersion":"8.0.3-24022510","useVcfBundle":false,"domainId":"d1","clusterId":"c1","customIsoAbsolutePath":"/isos/a.iso"}"#
        );
    }

    #[test]
    fn build_produces_one_assignment_per_cluster_in_order() {
        let tmp = TempDir::new().unwrap();
        let iso = tmp.path().join("dell.iso");
        std::fs::write(&iso, b"iso").unwrap();
        let iso = iso.display().to_string();

        let inventory = Fixture::new()
            .domain("d1", "mgmt")
            .cluster("d1", "c1", "mgmt-cluster")
            .cluster("d1", "c2", "edge-cluster")
            .host("c1", "h1", "Dell Inc.")
            .host("c1", "h2", "Dell Inc.")
            .host("c2", "h3", "Dell Inc.")
            .host("c2", "h4", "HPE")
            .build();
        let selection =
            crate::engine::selection::resolve_all(&inventory, None).unwrap();

        // One vendor answer for the mixed cluster, one ISO for the vendor.
        let mut prompter = ScriptedPrompter::new(["Dell Inc.", iso.as_str()]);
        let mut skip_set = SkipSet::default();

        let outcome = build(
            &inventory,
            &selection,
            "bundle-1",
            "8.0.3-24022510",
            IsoMode::PerVendor,
            &mut skip_set,
            &mut prompter,
        )
        .unwrap();

        assert_eq!(outcome.assignments.len(), 2);
        assert_eq!(outcome.assignments[0].cluster_id.as_deref(), Some("c1"));
        assert_eq!(outcome.assignments[1].cluster_id.as_deref(), Some("c2"));
        for entry in &outcome.assignments {
            assert_eq!(entry.custom_iso_absolute_path, iso);
            assert_eq!(entry.domain_id, "d1");
            assert!(!entry.use_vcf_bundle);
        }
        assert_eq!(outcome.vendor_counts["Dell Inc."], 2);
        assert_eq!(skip_set.property_value(), "h4");
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn build_fails_fast_on_exhausted_image_prompts() {
        let inventory = Fixture::new()
            .domain("d1", "mgmt")
            .cluster("d1", "c1", "mgmt-cluster")
            .host("c1", "h1", "Dell Inc.")
            .build();
        let selection = crate::engine::selection::resolve_all(&inventory, None).unwrap();

        let mut prompter =
            ScriptedPrompter::new(["/nope/a.iso", "/nope/b.iso", "/nope/c.iso"]);
        let mut skip_set = SkipSet::default();

        let err = build(
            &inventory,
            &selection,
            "bundle-1",
            "8.0.3",
            IsoMode::PerCluster,
            &mut skip_set,
            &mut prompter,
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InputExhausted { .. }));
    }

    #[test]
    fn write_emits_the_wrapped_document() {
        let tmp = TempDir::new().unwrap();
        let assignments = vec![assignment("c1", "/isos/a.iso")];

        let path = write(tmp.path(), &assignments).unwrap();
        assert_eq!(path.file_name().unwrap(), SPEC_FILENAME);

        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();
        let list = parsed["esxCustomImageSpecList"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["clusterId"], "c1");
        assert_eq!(list[0]["useVcfBundle"], false);

        // Pretty-printed, not a single line.
        assert!(content.lines().count() > 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_makes_the_artifact_world_readable() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let path = write(tmp.path(), &[assignment("c1", "/isos/a.iso")]).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o755);
    }
}
