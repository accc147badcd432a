//! Selection resolver: raw operator input → domain-ordered cluster choice.
//!
//! Index-based picks resolve against the flattened, domain-ordered list of
//! clusters exactly as it was presented, which is why inventory order is a
//! contract and not an accident. Individual bad tokens are skipped with a
//! warning; an empty final selection is fatal.

use crate::engine::EngineError;
use crate::inventory::Inventory;
use crate::prompt::Prompter;
use crate::ui;
use colored::Colorize;

/// Ordered mapping of domain name → deduplicated cluster ids.
#[derive(Debug, Default)]
pub struct Selection {
    entries: Vec<(String, Vec<String>)>,
}

impl Selection {
    fn insert(&mut self, domain: &str, cluster_id: &str) {
        if let Some((_, clusters)) = self.entries.iter_mut().find(|(d, _)| d == domain) {
            if !clusters.iter().any(|c| c == cluster_id) {
                clusters.push(cluster_id.to_string());
            }
        } else {
            self.entries
                .push((domain.to_string(), vec![cluster_id.to_string()]));
        }
    }

    /// Whether no cluster was selected at all.
    pub fn is_empty(&self) -> bool {
        self.cluster_count() == 0
    }

    /// Number of selected clusters across all domains.
    pub fn cluster_count(&self) -> usize {
        self.entries.iter().map(|(_, c)| c.len()).sum()
    }

    /// Number of domains contributing at least one cluster.
    pub fn domain_count(&self) -> usize {
        self.entries.len()
    }

    /// Iterate `(domain name, cluster ids)` in selection order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(domain, clusters)| (domain.as_str(), clusters.as_slice()))
    }
}

/// One row of the flattened cluster menu.
#[derive(Debug, Clone)]
pub struct ClusterOption {
    /// Cluster id.
    pub cluster_id: String,
    /// Cluster name shown to the operator.
    pub cluster_name: String,
    /// Owning domain name.
    pub domain: String,
}

/// Verify an explicit domain scope against the loaded inventory.
///
/// Any unknown name is fatal before any inventory-derived prompting.
pub fn validate_domain_scope(inventory: &Inventory, names: &[String]) -> Result<(), EngineError> {
    let missing: Vec<&str> = names
        .iter()
        .filter(|name| inventory.domain(name).is_none())
        .map(String::as_str)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(EngineError::Validation(format!(
            "unknown domain(s): {}",
            missing.join(", ")
        )))
    }
}

/// Select every cluster in every (or every named) domain.
pub fn resolve_all(
    inventory: &Inventory,
    domain_filter: Option<&[String]>,
) -> Result<Selection, EngineError> {
    let domains: Vec<String> = match domain_filter {
        Some(names) => {
            validate_domain_scope(inventory, names)?;
            names.to_vec()
        }
        None => inventory
            .domain_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let mut selection = Selection::default();
    for name in &domains {
        if let Some(domain) = inventory.domain(name) {
            for cluster_id in &domain.cluster_ids {
                selection.insert(name, cluster_id);
            }
        }
    }
    if selection.is_empty() {
        return Err(EngineError::Validation(
            "no clusters found in the selected domains".to_string(),
        ));
    }
    Ok(selection)
}

/// Flattened, domain-ordered cluster menu for the given domains.
pub fn cluster_options(inventory: &Inventory, domains: &[String]) -> Vec<ClusterOption> {
    let mut options = Vec::new();
    for name in domains {
        if let Some(domain) = inventory.domain(name) {
            for cluster_id in &domain.cluster_ids {
                options.push(ClusterOption {
                    cluster_id: cluster_id.clone(),
                    cluster_name: inventory.cluster_name(cluster_id).to_string(),
                    domain: name.clone(),
                });
            }
        }
    }
    options
}

fn is_all_token(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "all" | "a" | "0")
}

/// Resolve raw cluster tokens against a presented menu.
///
/// Tokens are 1-based indices into `options`, literal cluster ids, literal
/// cluster names, or the ALL token. Bad tokens produce warnings, never
/// errors; duplicates collapse.
pub fn resolve_cluster_tokens(raw: &str, options: &[ClusterOption]) -> (Selection, Vec<String>) {
    let mut selection = Selection::default();
    let mut warnings = Vec::new();

    if is_all_token(raw) {
        for option in options {
            selection.insert(&option.domain, &option.cluster_id);
        }
        return (selection, warnings);
    }

    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        if token.chars().all(|c| c.is_ascii_digit()) {
            match token.parse::<usize>() {
                Ok(index) if index >= 1 && index <= options.len() => {
                    let option = &options[index - 1];
                    selection.insert(&option.domain, &option.cluster_id);
                }
                _ => warnings.push(format!("skipping out-of-range index: {token}")),
            }
        } else if let Some(option) = options
            .iter()
            .find(|o| o.cluster_id == token || o.cluster_name == token)
        {
            selection.insert(&option.domain, &option.cluster_id);
        } else {
            warnings.push(format!("skipping unknown cluster: {token}"));
        }
    }

    (selection, warnings)
}

/// Interactive domain pick: enumerated menu, indices, names, or ALL.
pub fn choose_domains(
    inventory: &Inventory,
    prompter: &mut dyn Prompter,
) -> Result<Vec<String>, EngineError> {
    let names = inventory.domain_names();

    ui::header("Available domains");
    for (index, name) in names.iter().enumerate() {
        println!("{}) {}", index + 1, name);
    }

    let raw = prompter.input("Select domains by number or name (comma-separated), or ALL")?;
    if is_all_token(&raw) {
        return Ok(names.into_iter().map(str::to_string).collect());
    }

    let mut picked: Vec<String> = Vec::new();
    for token in raw.split(',') {
        let token = token.trim();
        if token.is_empty() {
            continue;
        }
        let resolved = if token.chars().all(|c| c.is_ascii_digit()) {
            token
                .parse::<usize>()
                .ok()
                .filter(|index| *index >= 1 && *index <= names.len())
                .map(|index| names[index - 1].to_string())
        } else {
            names
                .iter()
                .find(|name| **name == token)
                .map(|name| (*name).to_string())
        };
        match resolved {
            Some(name) => {
                if !picked.contains(&name) {
                    picked.push(name);
                }
            }
            None => {
                let warning = format!("skipping unknown domain: {token}");
                ui::warn(&warning);
                log::warn!("{warning}");
            }
        }
    }

    if picked.is_empty() {
        return Err(EngineError::Validation(
            "no valid domains selected".to_string(),
        ));
    }
    Ok(picked)
}

/// Interactive cluster pick across the given domains.
///
/// Returns the selection plus the per-token warnings for the final summary.
pub fn choose_clusters(
    inventory: &Inventory,
    domains: &[String],
    prompter: &mut dyn Prompter,
) -> Result<(Selection, Vec<String>), EngineError> {
    let options = cluster_options(inventory, domains);
    if options.is_empty() {
        return Err(EngineError::Validation(
            "selected domains contain no clusters".to_string(),
        ));
    }

    ui::header("Available clusters");
    for (index, option) in options.iter().enumerate() {
        println!(
            "{}) {} ({}) in {}",
            index + 1,
            option.cluster_name,
            option.cluster_id.dimmed(),
            option.domain
        );
    }

    let raw = prompter.input("Comma-separated cluster indices, ids, or names (or ALL)")?;
    let (selection, warnings) = resolve_cluster_tokens(&raw, &options);
    for warning in &warnings {
        ui::warn(warning);
        log::warn!("{warning}");
    }

    if selection.is_empty() {
        return Err(EngineError::Validation("no clusters selected".to_string()));
    }
    Ok((selection, warnings))
}
