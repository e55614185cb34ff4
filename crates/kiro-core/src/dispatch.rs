//! The two validation actions.
//!
//! Each action is a straight line: resolve the project root, collect the
//! inputs, build a [`ScriptInvocation`], hand it to the host. Any prompt
//! may be cancelled, which ends the action without running anything.

use crate::config::Config;
use crate::error::{KiroError, Result};
use crate::host::{ChoicePrompt, Host, Prompted, TextPrompt};
use crate::paths;
use crate::types::{ValidationPhase, ValidationScript};
use serde::Serialize;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

pub const NO_PROJECT_MESSAGE: &str = "No workspace folder open.";
pub const FEATURE_REQUIRED_MESSAGE: &str = "Feature is required";

// ---------------------------------------------------------------------------
// ScriptInvocation
// ---------------------------------------------------------------------------

/// A validation script run, kept as an argument vector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptInvocation {
    pub program: String,
    pub script: PathBuf,
    pub args: Vec<String>,
}

impl ScriptInvocation {
    pub fn new(program: impl Into<String>, script: PathBuf, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            script,
            args,
        }
    }

    /// Arguments passed to `program`: the script path followed by the
    /// script's own arguments.
    pub fn argv(&self) -> Vec<&OsStr> {
        std::iter::once(self.script.as_os_str())
            .chain(self.args.iter().map(OsStr::new))
            .collect()
    }

    /// Human-readable form, e.g. `bash "/p/scripts/x.sh" "user-login" "design"`.
    ///
    /// Quoting here is cosmetic. Nothing executes this string.
    pub fn command_line(&self) -> String {
        let mut line = format!("{} \"{}\"", self.program, self.script.display());
        for arg in &self.args {
            line.push_str(&format!(" \"{arg}\""));
        }
        line
    }
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The invocation was handed to the host.
    Dispatched(ScriptInvocation),
    /// The user dismissed a prompt.
    Cancelled,
    /// No project root was available; the host has shown the error.
    NoProject,
}

/// Rejects blank feature names. Anything else goes through untouched.
pub fn validate_feature_name(input: &str) -> Option<&'static str> {
    if input.trim().is_empty() {
        Some(FEATURE_REQUIRED_MESSAGE)
    } else {
        None
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

pub struct Dispatcher<'h, H: Host> {
    host: &'h mut H,
}

impl<'h, H: Host> Dispatcher<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }

    /// Prompt for a feature and a phase, then run `kiro-spec-validate.sh`.
    pub fn validate_spec(&mut self) -> Result<Outcome> {
        let Some(root) = self.resolve_root() else {
            return Ok(Outcome::NoProject);
        };
        let config = Config::load(&root)?;

        let Prompted::Submitted(feature) = self.prompt_feature(&config)? else {
            return Ok(Outcome::Cancelled);
        };
        let Prompted::Submitted(phase) = self.prompt_phase()? else {
            return Ok(Outcome::Cancelled);
        };

        self.dispatch(
            &root,
            &config,
            ValidationScript::Named,
            vec![feature, phase.to_string()],
        )
    }

    /// Prompt for a phase, then run `kiro-spec-validate-latest.sh`.
    pub fn validate_latest(&mut self) -> Result<Outcome> {
        let Some(root) = self.resolve_root() else {
            return Ok(Outcome::NoProject);
        };
        let config = Config::load(&root)?;

        let Prompted::Submitted(phase) = self.prompt_phase()? else {
            return Ok(Outcome::Cancelled);
        };

        self.dispatch(
            &root,
            &config,
            ValidationScript::Latest,
            vec![phase.to_string()],
        )
    }

    fn resolve_root(&mut self) -> Option<PathBuf> {
        match self.host.current_project_root() {
            Some(root) => {
                tracing::debug!(root = %root.display(), "resolved project root");
                Some(root)
            }
            None => {
                self.host.show_error(NO_PROJECT_MESSAGE);
                None
            }
        }
    }

    fn prompt_feature(&mut self, config: &Config) -> Result<Prompted<String>> {
        let prompt = TextPrompt {
            title: "Feature name (kebab-case)".to_string(),
            hint: "Example: user-login".to_string(),
            default: config.default_feature.clone(),
            validate: validate_feature_name,
        };
        let answer = self.host.prompt_text(&prompt)?;

        if let Prompted::Submitted(ref feature) = answer {
            if prompt.check(feature).is_some() {
                return Err(KiroError::FeatureRequired);
            }
            if !paths::is_kebab_case(feature) {
                tracing::warn!(feature = %feature, "feature name is not kebab-case");
            }
        }
        Ok(answer)
    }

    fn prompt_phase(&mut self) -> Result<Prompted<ValidationPhase>> {
        let prompt = ChoicePrompt {
            title: "Select phase to validate".to_string(),
            items: ValidationPhase::all()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        };
        match self.host.prompt_choice(&prompt)? {
            Prompted::Submitted(index) => ValidationPhase::from_index(index)
                .map(Prompted::Submitted)
                .ok_or(KiroError::InvalidChoice(index)),
            Prompted::Cancelled => Ok(Prompted::Cancelled),
        }
    }

    fn dispatch(
        &mut self,
        root: &Path,
        config: &Config,
        script: ValidationScript,
        args: Vec<String>,
    ) -> Result<Outcome> {
        let invocation = ScriptInvocation::new(
            config.shell.clone(),
            paths::script_path(root, &config.scripts_dir, script),
            args,
        );
        tracing::debug!(command = %invocation.command_line(), "dispatching");
        self.host
            .run_in_new_terminal(&config.terminal_name, &invocation)?;
        Ok(Outcome::Dispatched(invocation))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
