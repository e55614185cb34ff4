mod cmd;
mod output;
mod root;
mod terminal;

use clap::{Parser, Subcommand};
use cmd::{
    config::ConfigSubcommand,
    validate::{Target, ValidateArgs},
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "kiro",
    about = "Run Kiro spec validation scripts against requirements, design and tasks",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: auto-detect from .kiro/ or .git/)
    #[arg(long, global = true, env = "KIRO_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a named spec (scripts/kiro-spec-validate.sh)
    ValidateSpec {
        /// Feature name, e.g. user-login (prompted for when omitted)
        feature: Option<String>,

        /// Phase to validate: requirements, design, tasks or all (prompted for when omitted)
        #[arg(long)]
        phase: Option<String>,

        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Validate the most recently touched spec (scripts/kiro-spec-validate-latest.sh)
    ValidateLatest {
        /// Phase to validate: requirements, design, tasks or all (prompted for when omitted)
        #[arg(long)]
        phase: Option<String>,

        /// Print the command instead of running it
        #[arg(long)]
        dry_run: bool,
    },

    /// Merge a tooling file into a project file, keeping a backup
    Merge {
        src: PathBuf,
        dest: PathBuf,

        /// Report what would happen without touching any file
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage .kiro/tools.yaml
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::find_project_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::ValidateSpec {
            feature,
            phase,
            dry_run,
        } => cmd::validate::run(
            root,
            ValidateArgs {
                target: Target::Named { feature },
                phase,
                dry_run,
            },
            cli.json,
        ),
        Commands::ValidateLatest { phase, dry_run } => cmd::validate::run(
            root,
            ValidateArgs {
                target: Target::Latest,
                phase,
                dry_run,
            },
            cli.json,
        ),
        Commands::Merge { src, dest, dry_run } => cmd::merge::run(&src, &dest, dry_run, cli.json),
        Commands::Config { subcommand } => match root {
            Some(root) => cmd::config::run(&root, subcommand, cli.json),
            None => Err(anyhow::anyhow!(kiro_core::KiroError::NoProject)),
        },
    };

    if let Err(e) = result {
        if e.downcast_ref::<cmd::Reported>().is_none() {
            // Print the full error chain (anyhow's alternate Display)
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}
