//! End-to-end generation of the custom image spec.
//!
//! The run is strictly sequential: credentials, output directory, inventory
//! fetch, bundle pick, selection, vendor/image reconciliation, artifact
//! write, property upserts, optional service restart. Any fatal condition
//! aborts before the artifact is written; the spec-path upsert lands before
//! the skip-host upsert, so a failure between the two leaves a
//! partially-applied state that needs a rerun.

use crate::Context as AppContext;
use crate::cli::Cli;
use crate::engine::image::IsoMode;
use crate::engine::selection::{self, Selection};
use crate::engine::spec;
use crate::engine::vendor::SkipSet;
use crate::engine::{EngineError, PROMPT_ATTEMPTS};
use crate::inventory::{BundleCatalog, Inventory};
use crate::prompt::{Prompter, TerminalPrompter};
use crate::properties;
use crate::service;
use crate::ui;
use anyhow::{Context, Result, bail};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Default directory the spec artifact is written to.
pub const DEFAULT_SPEC_DIR: &str = "/opt/vmware/vcf/lcm/";

/// Account owning the lifecycle manager's files.
const SPEC_OWNER: &str = "vcf_lcm:vcf";

const BUNDLE_PRODUCT_TYPE: &str = "ESX";
const RESTART_TIMEOUT: Duration = Duration::from_secs(60);

/// Resolved run options, decoupled from the CLI surface.
pub struct Options {
    /// Select every cluster without the interactive menus.
    pub all: bool,
    /// Explicit domain scope, when given.
    pub domains: Option<Vec<String>>,
    /// Spec output directory; `None` asks about the default interactively.
    pub spec_dir: Option<PathBuf>,
    /// Property file receiving the two managed keys.
    pub properties_file: PathBuf,
    /// `user:group` the artifact directory is handed to, when set.
    pub spec_owner: Option<String>,
    /// Whether to offer the service restart at the end.
    pub offer_restart: bool,
}

/// Production entry point: root check, HTTP client, terminal prompts.
pub fn run(ctx: &AppContext, cli: &Cli) -> Result<()> {
    if unsafe { libc::geteuid() } != 0 {
        bail!("root privileges required");
    }

    let options = Options {
        all: cli.all,
        domains: cli.domain_names(),
        spec_dir: cli.spec_dir.clone(),
        properties_file: cli
            .properties
            .clone()
            .unwrap_or_else(|| PathBuf::from(properties::DEFAULT_PROPERTIES_FILE)),
        spec_owner: Some(SPEC_OWNER.to_string()),
        offer_restart: !cli.no_restart,
    };
    let mut client = lcmapi::Client::new(cli.endpoint.clone());
    let mut prompter = TerminalPrompter;
    execute(ctx, &options, &mut client, &mut prompter)
}

/// The whole run against injectable collaborators.
pub fn execute(
    _ctx: &AppContext,
    options: &Options,
    client: &mut lcmapi::Client,
    prompter: &mut dyn Prompter,
) -> Result<()> {
    ui::note("previously generated custom image spec settings may be overwritten");
    if !prompter.confirm("Continue?", false)? {
        bail!("aborted by operator");
    }
    log::info!("=== run start ===");

    authenticate(client, prompter)?;
    let spec_dir = resolve_spec_dir(options, prompter)?;

    let inventory = Inventory::load(client).context("Failed to load inventory")?;
    if let Some(names) = &options.domains {
        selection::validate_domain_scope(&inventory, names)?;
    }

    let catalog = BundleCatalog::load(client, BUNDLE_PRODUCT_TYPE)
        .context("Failed to load upgrade bundles")?;
    if catalog.is_empty() {
        bail!("no {BUNDLE_PRODUCT_TYPE} bundles available via the LCM API");
    }
    let bundle_id = choose_bundle(&catalog, prompter)?;
    let target_version = catalog.version_for(&bundle_id)?.to_string();

    let mode = if prompter.confirm("Provide a single image for each vendor?", true)? {
        IsoMode::PerVendor
    } else {
        IsoMode::PerCluster
    };

    let (selected, warnings) = resolve_selection(&inventory, options, prompter)?;
    log::info!(
        "selected {} cluster(s) across {} domain(s)",
        selected.cluster_count(),
        selected.domain_count()
    );

    let mut skip_set = SkipSet::default();
    let outcome = spec::build(
        &inventory,
        &selected,
        &bundle_id,
        &target_version,
        mode,
        &mut skip_set,
        prompter,
    )?;

    let spec_path = spec::write(&spec_dir, &outcome.assignments)?;
    if let Some(owner) = &options.spec_owner {
        transfer_ownership(&spec_dir, owner);
    }

    properties::upsert(
        &options.properties_file,
        properties::CUSTOM_IMAGE_SPEC_KEY,
        &spec_path.display().to_string(),
    )?;
    ui::success(&format!(
        "recorded spec location in {}",
        options.properties_file.display()
    ));

    if !skip_set.is_empty() {
        properties::upsert(
            &options.properties_file,
            properties::SKIP_HOST_IDS_KEY,
            &skip_set.property_value(),
        )?;
        log::info!("skip hosts recorded: {}", skip_set.unique_count());
        ui::success(&format!(
            "recorded {} skip host(s) in {}",
            skip_set.unique_count(),
            options.properties_file.display()
        ));
        println!();
        println!("Hosts that will be skipped:");
        for id in skip_set.sorted_unique() {
            if let Some(host) = inventory.host(id) {
                let domain = inventory
                    .domain_name_of(&host.domain_id)
                    .unwrap_or(&host.domain_id);
                println!(
                    "- {} ({}) in domain {}, cluster {}",
                    host.fqdn,
                    host.vendor,
                    domain,
                    inventory.cluster_name(&host.cluster_id)
                );
            }
        }
    }

    ui::header("Summary");
    for (vendor, count) in &outcome.vendor_counts {
        ui::kv(vendor, &format!("{count} cluster(s)"));
    }
    ui::kv("spec", &spec_path.display().to_string());
    if !warnings.is_empty() {
        ui::warn(&format!(
            "{} selection entr{} could not be resolved and were skipped",
            warnings.len(),
            if warnings.len() == 1 { "y" } else { "ies" }
        ));
        for warning in &warnings {
            ui::dim(warning);
        }
    }
    println!();
    ui::note("run the upgrade precheck and ensure it passes before starting the upgrade");

    if options.offer_restart {
        offer_restart(prompter)?;
    }
    Ok(())
}

fn authenticate(client: &mut lcmapi::Client, prompter: &mut dyn Prompter) -> Result<()> {
    for _ in 0..PROMPT_ATTEMPTS {
        let username = prompter.input("SSO username")?;
        let password = prompter.password("SSO password")?;
        match client.authenticate(&username, &password) {
            Ok(()) => return Ok(()),
            Err(lcmapi::Error::AuthFailed) => ui::warn("invalid SSO credentials"),
            Err(err) => return Err(err).context("Token request failed"),
        }
    }
    Err(EngineError::exhausted("SSO credentials").into())
}

fn resolve_spec_dir(options: &Options, prompter: &mut dyn Prompter) -> Result<PathBuf> {
    let dir = match &options.spec_dir {
        Some(dir) => dir.clone(),
        None => {
            println!("The custom image spec will be saved under {DEFAULT_SPEC_DIR}");
            if prompter.confirm("Use a different path?", false)? {
                PathBuf::from(prompter.input("Spec directory")?)
            } else {
                PathBuf::from(DEFAULT_SPEC_DIR)
            }
        }
    };
    if !dir.is_dir() {
        bail!("not a directory: {}", dir.display());
    }
    fs::canonicalize(&dir).with_context(|| format!("Failed to resolve {}", dir.display()))
}

fn choose_bundle(catalog: &BundleCatalog, prompter: &mut dyn Prompter) -> Result<String> {
    ui::header("Available ESX bundles");
    for (index, (id, version)) in catalog.entries().iter().enumerate() {
        println!(
            "{}) Bundle ID: {}, upgrades to ESX version {}",
            index + 1,
            id,
            version
        );
    }

    for _ in 0..PROMPT_ATTEMPTS {
        let answer = prompter.input(&format!("Choose bundle [1-{}]", catalog.len()))?;
        if let Ok(index) = answer.trim().parse::<usize>() {
            if index >= 1 && index <= catalog.len() {
                return Ok(catalog.entries()[index - 1].0.clone());
            }
        }
        ui::warn("invalid selection, please try again");
    }
    Err(EngineError::exhausted("bundle selection").into())
}

fn resolve_selection(
    inventory: &Inventory,
    options: &Options,
    prompter: &mut dyn Prompter,
) -> Result<(Selection, Vec<String>)> {
    if options.all {
        let selected = selection::resolve_all(inventory, options.domains.as_deref())?;
        ui::info(&format!(
            "--all: selecting every cluster across {} domain(s)",
            selected.domain_count()
        ));
        return Ok((selected, Vec::new()));
    }

    let domains = match &options.domains {
        Some(names) => names.clone(),
        None => selection::choose_domains(inventory, prompter)?,
    };
    let (selected, warnings) = selection::choose_clusters(inventory, &domains, prompter)?;
    Ok((selected, warnings))
}

fn transfer_ownership(dir: &std::path::Path, owner: &str) {
    let dir_arg = dir.display().to_string();
    match service::run("chown", &["-R", owner, &dir_arg]) {
        Ok(output) if output.status.success() => {
            log::debug!("handed {dir_arg} to {owner}");
        }
        Ok(_) => ui::warn(&format!("could not hand {dir_arg} to {owner}")),
        Err(err) => ui::warn(&format!("chown failed: {err:#}")),
    }
}

fn offer_restart(prompter: &mut dyn Prompter) -> Result<()> {
    if !prompter.confirm("Restart the LCM service now?", false)? {
        log::info!("LCM restart skipped");
        ui::dim("skipping LCM service restart");
        return Ok(());
    }

    ui::info("restarting the LCM service...");
    match service::restart(service::LCM_SERVICE) {
        Ok(()) => match service::wait_active(service::LCM_SERVICE, RESTART_TIMEOUT) {
            Ok(true) => {
                log::info!("LCM restarted");
                ui::success("LCM service is active again");
            }
            Ok(false) => ui::warn(
                "LCM service did not report active in time; check `systemctl status lcm`",
            ),
            Err(err) => ui::error(&format!("readiness check failed: {err:#}")),
        },
        Err(err) => ui::error(&format!("restart failed: {err:#}")),
    }
    Ok(())
}
