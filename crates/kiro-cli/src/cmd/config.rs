use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use kiro_core::{
    config::{Config, WarnLevel},
    paths,
};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Write a default .kiro/tools.yaml if there is none
    Init,

    /// Show the effective settings
    Show,

    /// Validate the config for common mistakes
    Validate,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Init => init(root, json),
        ConfigSubcommand::Show => show(root, json),
        ConfigSubcommand::Validate => validate(root, json),
    }
}

fn init(root: &Path, json: bool) -> anyhow::Result<()> {
    let written = Config::init(root).context("failed to write config")?;
    let path = paths::config_path(root);

    if json {
        print_json(&serde_json::json!({
            "path": path,
            "created": written,
        }))?;
    } else if written {
        println!("Created {}", path.display());
    } else {
        println!("{} already exists; left unchanged", path.display());
    }
    Ok(())
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;

    if json {
        print_json(&config)?;
    } else {
        println!("terminal_name:   {}", config.terminal_name);
        println!("shell:           {}", config.shell);
        println!("scripts_dir:     {}", config.scripts_dir);
        println!("default_feature: {}", config.default_feature);
    }
    Ok(())
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let warnings = config.validate();

    if json {
        print_json(&serde_json::json!({
            "warnings": warnings,
        }))?;
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
