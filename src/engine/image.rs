//! Custom image resolution, per vendor or per cluster.

use crate::engine::{EngineError, PROMPT_ATTEMPTS};
use crate::prompt::Prompter;
use crate::ui;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How custom images map onto the selected clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoMode {
    /// One image per hardware vendor, reused across clusters.
    PerVendor,
    /// An independent image for every cluster.
    PerCluster,
}

/// Resolves the custom image path for a (vendor, cluster) pair.
///
/// In per-vendor mode the first resolution for a vendor prompts and caches;
/// later calls return the cached path without prompting, whatever the
/// cluster. In per-cluster mode every call prompts independently.
#[derive(Debug)]
pub struct IsoResolver {
    mode: IsoMode,
    cache: HashMap<String, PathBuf>,
}

impl IsoResolver {
    /// Create a resolver for the given mode.
    pub fn new(mode: IsoMode) -> Self {
        Self {
            mode,
            cache: HashMap::new(),
        }
    }

    /// Resolve the image path for a vendor in the context of a cluster.
    pub fn resolve(
        &mut self,
        vendor: &str,
        cluster_name: &str,
        prompter: &mut dyn Prompter,
    ) -> Result<PathBuf, EngineError> {
        match self.mode {
            IsoMode::PerVendor => {
                if let Some(path) = self.cache.get(vendor) {
                    log::debug!("reusing cached {vendor} image: {}", path.display());
                    return Ok(path.clone());
                }
                ui::note(&format!(
                    "this image will be used for all selected clusters with {vendor} hosts"
                ));
                let path = prompt_iso_path(vendor, None, prompter)?;
                self.cache.insert(vendor.to_string(), path.clone());
                Ok(path)
            }
            IsoMode::PerCluster => prompt_iso_path(vendor, Some(cluster_name), prompter),
        }
    }
}

/// Whether the path points at an existing file with a `.iso` extension,
/// compared case-insensitively.
fn is_valid_iso(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("iso"))
}

fn prompt_iso_path(
    vendor: &str,
    cluster_name: Option<&str>,
    prompter: &mut dyn Prompter,
) -> Result<PathBuf, EngineError> {
    let prompt = match cluster_name {
        Some(cluster) => format!("Path to the {vendor} image for cluster {cluster}"),
        None => format!("Path to the {vendor} image"),
    };
    for _ in 0..PROMPT_ATTEMPTS {
        let answer = prompter.input(&prompt)?;
        let path = PathBuf::from(answer.trim());
        if is_valid_iso(&path) {
            return Ok(path);
        }
        ui::warn(&format!("no .iso image at {}", path.display()));
    }
    Err(EngineError::exhausted("image path"))
}
