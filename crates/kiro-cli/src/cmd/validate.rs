use crate::cmd::Reported;
use crate::output::print_json;
use crate::terminal::TerminalHost;
use anyhow::Context;
use kiro_core::{
    dispatch::{Dispatcher, Outcome},
    types::ValidationPhase,
};
use std::path::PathBuf;

/// Which of the two validation scripts to run.
pub enum Target {
    Named { feature: Option<String> },
    Latest,
}

pub struct ValidateArgs {
    pub target: Target,
    pub phase: Option<String>,
    pub dry_run: bool,
}

pub fn run(root: Option<PathBuf>, args: ValidateArgs, json: bool) -> anyhow::Result<()> {
    let phase = args
        .phase
        .as_deref()
        .map(str::parse::<ValidationPhase>)
        .transpose()?;

    let (feature, latest) = match args.target {
        Target::Named { feature } => (feature, false),
        Target::Latest => (None, true),
    };

    let mut host = TerminalHost::new(root)
        .with_feature(feature)
        .with_phase(phase)
        .dry_run(args.dry_run)
        .json(json);
    let mut dispatcher = Dispatcher::new(&mut host);

    let outcome = if latest {
        dispatcher.validate_latest()
    } else {
        dispatcher.validate_spec()
    }
    .context("validation aborted")?;

    match outcome {
        Outcome::Dispatched(invocation) => {
            if json {
                print_json(&serde_json::json!({
                    "command_line": invocation.command_line(),
                    "invocation": invocation,
                    "dry_run": args.dry_run,
                }))?;
            } else if args.dry_run {
                println!("{}", invocation.command_line());
            }
        }
        Outcome::Cancelled => {
            tracing::debug!("validation cancelled");
        }
        Outcome::NoProject => {
            return Err(Reported(kiro_core::dispatch::NO_PROJECT_MESSAGE.to_string()).into());
        }
    }

    Ok(())
}
