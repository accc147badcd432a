use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "isomap")]
#[command(version)]
#[command(about = "Map clusters to custom ESXi ISOs for LCM baseline upgrades", long_about = None)]
#[command(
    after_help = "Note that this tool only works for VUM/vLCM baseline clusters. Without \
                  --all it runs fully interactively."
)]
pub struct Cli {
    /// Automatically include all clusters in all (or --domain) domains
    #[arg(short, long)]
    pub all: bool,

    /// Comma-separated domain name(s) to limit selection
    #[arg(short, long, value_name = "NAMES")]
    pub domain: Option<String>,

    /// Base URL of the lifecycle manager API
    #[arg(long, value_name = "URL", default_value = "https://localhost")]
    pub endpoint: String,

    /// Directory the generated image spec is written to (skips the prompt)
    #[arg(long, value_name = "DIR")]
    pub spec_dir: Option<PathBuf>,

    /// LCM property file updated with the spec location and skip hosts
    #[arg(long, value_name = "FILE")]
    pub properties: Option<PathBuf>,

    /// Never offer to restart the LCM service
    #[arg(long)]
    pub no_restart: bool,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

impl Cli {
    /// The `--domain` value split into trimmed, non-empty names.
    pub fn domain_names(&self) -> Option<Vec<String>> {
        self.domain.as_ref().map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect()
        })
    }
}
