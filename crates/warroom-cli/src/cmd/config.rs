use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;
use warroom_core::config::{Config, WarnLevel};
use warroom_core::paths;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show the effective configuration
    Show,

    /// Write config.yaml with default values
    Init {
        /// Overwrite an existing config.yaml
        #[arg(long)]
        force: bool,
    },

    /// Validate the config for common mistakes
    Validate,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(data_dir: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Show => show(data_dir, json),
        ConfigSubcommand::Init { force } => init(data_dir, force, json),
        ConfigSubcommand::Validate => validate(data_dir, json),
    }
}

fn show(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(data_dir).context("failed to load config")?;

    if json {
        return print_json(&config);
    }
    let yaml = serde_yaml::to_string(&config).context("failed to render config")?;
    print!("{yaml}");
    let key = if config.oracle.api_key().is_some() {
        "set"
    } else {
        "not set"
    };
    println!("# {} is {key}", config.oracle.api_key_env);
    Ok(())
}

fn init(data_dir: &Path, force: bool, json: bool) -> anyhow::Result<()> {
    let path = paths::config_path(data_dir);
    if path.exists() && !force {
        anyhow::bail!("{} already exists (pass --force to overwrite)", path.display());
    }
    Config::default()
        .save(data_dir)
        .with_context(|| format!("failed to write {}", path.display()))?;

    if json {
        print_json(&serde_json::json!({ "path": path }))?;
    } else {
        println!("Wrote {}", path.display());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// validate
// ---------------------------------------------------------------------------

fn validate(data_dir: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(data_dir).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}
