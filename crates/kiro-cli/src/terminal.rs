//! Interactive [`Host`] backed by the invoking terminal.

use console::Term;
use dialoguer::{theme::ColorfulTheme, Input, Select};
use kiro_core::{
    dispatch::ScriptInvocation,
    host::{ChoicePrompt, Host, Prompted, TextPrompt},
    types::ValidationPhase,
    KiroError, Result,
};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::Once;

static INTERRUPT_HANDLER: Once = Once::new();

pub struct TerminalHost {
    root: Option<PathBuf>,
    /// Answers given on the command line; each one replaces its prompt.
    feature: Option<String>,
    phase: Option<ValidationPhase>,
    dry_run: bool,
    /// Stdout is reserved for a JSON document; the script writes to stderr.
    json: bool,
}

impl TerminalHost {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self {
            root,
            feature: None,
            phase: None,
            dry_run: false,
            json: false,
        }
    }

    pub fn with_feature(mut self, feature: Option<String>) -> Self {
        self.feature = feature;
        self
    }

    pub fn with_phase(mut self, phase: Option<ValidationPhase>) -> Self {
        self.phase = phase;
        self
    }

    /// Skip the run; the caller prints the command instead.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }
}

fn prompt_error(e: dialoguer::Error) -> KiroError {
    KiroError::Prompt(e.to_string())
}

/// Catch SIGINT for the rest of the process so Ctrl-C at a prompt surfaces
/// as an interrupted read instead of killing us with the cursor hidden.
/// A running script still receives the signal itself.
fn catch_interrupts() {
    INTERRUPT_HANDLER.call_once(|| {
        let installed = ctrlc::set_handler(|| {
            let _ = Term::stderr().show_cursor();
        });
        if let Err(e) = installed {
            tracing::debug!(error = %e, "could not install interrupt handler");
        }
    });
}

/// Ctrl-C at a prompt cancels the action; anything else is a real failure.
fn cancel_on_interrupt<T>(e: dialoguer::Error) -> Result<Prompted<T>> {
    match e {
        dialoguer::Error::IO(io) if io.kind() == ErrorKind::Interrupted => {
            let _ = Term::stderr().show_cursor();
            Ok(Prompted::Cancelled)
        }
        e => Err(prompt_error(e)),
    }
}

impl Host for TerminalHost {
    fn current_project_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }

    fn prompt_text(&mut self, prompt: &TextPrompt) -> Result<Prompted<String>> {
        if let Some(feature) = self.feature.take() {
            return Ok(Prompted::Submitted(feature));
        }

        catch_interrupts();
        let rule = prompt.validate;
        let theme = ColorfulTheme::default();
        let answer = Input::<String>::with_theme(&theme)
            .with_prompt(format!("{} ({})", prompt.title, prompt.hint))
            .default(prompt.default.clone())
            .validate_with(move |input: &String| -> std::result::Result<(), &'static str> {
                match rule(input) {
                    Some(message) => Err(message),
                    None => Ok(()),
                }
            })
            .interact_text();

        match answer {
            Ok(value) => Ok(Prompted::Submitted(value)),
            Err(e) => cancel_on_interrupt(e),
        }
    }

    fn prompt_choice(&mut self, prompt: &ChoicePrompt) -> Result<Prompted<usize>> {
        if let Some(phase) = self.phase.take() {
            return prompt
                .items
                .iter()
                .position(|item| item == phase.as_str())
                .map(Prompted::Submitted)
                .ok_or_else(|| KiroError::InvalidPhase(phase.to_string()));
        }

        catch_interrupts();
        let theme = ColorfulTheme::default();
        let choice = Select::with_theme(&theme)
            .with_prompt(&prompt.title)
            .items(&prompt.items)
            .default(0)
            .interact_opt();

        match choice {
            Ok(Some(index)) => Ok(Prompted::Submitted(index)),
            Ok(None) => Ok(Prompted::Cancelled),
            Err(e) => cancel_on_interrupt(e),
        }
    }

    fn show_error(&mut self, message: &str) {
        eprintln!("error: {message}");
    }

    fn run_in_new_terminal(&mut self, label: &str, invocation: &ScriptInvocation) -> Result<()> {
        if self.dry_run {
            tracing::debug!(command = %invocation.command_line(), "dry run, not spawning");
            return Ok(());
        }

        let shell = which::which(&invocation.program)
            .map_err(|_| KiroError::ShellNotFound(invocation.program.clone()))?;

        eprintln!("── {label} ──");
        eprintln!("$ {}", invocation.command_line());

        let mut cmd = Command::new(&shell);
        cmd.args(invocation.argv());
        if let Some(root) = &self.root {
            cmd.current_dir(root);
        }
        if self.json {
            cmd.stdout(Stdio::from(std::io::stderr()));
        }

        let status = cmd.status().map_err(|e| KiroError::Spawn {
            program: invocation.program.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(%status, "validation script finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phase_prompt() -> ChoicePrompt {
        ChoicePrompt {
            title: "Select phase to validate".to_string(),
            items: ValidationPhase::all()
                .iter()
                .map(|p| p.as_str().to_string())
                .collect(),
        }
    }

    #[test]
    fn preset_feature_skips_prompt_once() {
        let mut host = TerminalHost::new(None).with_feature(Some("user-login".to_string()));
        let prompt = TextPrompt {
            title: "Feature name (kebab-case)".to_string(),
            hint: "Example: user-login".to_string(),
            default: "example-feature".to_string(),
            validate: |_| None,
        };
        assert_eq!(
            host.prompt_text(&prompt).unwrap(),
            Prompted::Submitted("user-login".to_string())
        );
        assert!(host.feature.is_none());
    }

    #[test]
    fn preset_phase_maps_to_item_index() {
        let mut host = TerminalHost::new(None).with_phase(Some(ValidationPhase::Tasks));
        assert_eq!(
            host.prompt_choice(&phase_prompt()).unwrap(),
            Prompted::Submitted(2)
        );
    }

    #[test]
    fn preset_phase_missing_from_items_is_an_error() {
        let mut host = TerminalHost::new(None).with_phase(Some(ValidationPhase::All));
        let prompt = ChoicePrompt {
            title: "Select phase to validate".to_string(),
            items: vec!["requirements".to_string()],
        };
        assert!(matches!(
            host.prompt_choice(&prompt),
            Err(KiroError::InvalidPhase(_))
        ));
    }

    #[test]
    fn interrupted_prompt_is_a_cancel() {
        let interrupted = dialoguer::Error::IO(std::io::Error::new(
            ErrorKind::Interrupted,
            "read interrupted",
        ));
        assert_eq!(
            cancel_on_interrupt::<usize>(interrupted).unwrap(),
            Prompted::Cancelled
        );
    }

    #[test]
    fn other_prompt_failures_are_errors() {
        let not_a_tty = dialoguer::Error::IO(std::io::Error::new(
            ErrorKind::NotConnected,
            "not a terminal",
        ));
        assert!(matches!(
            cancel_on_interrupt::<String>(not_a_tty),
            Err(KiroError::Prompt(_))
        ));
    }

    #[test]
    fn dry_run_spawns_nothing() {
        let mut host = TerminalHost::new(None).dry_run(true);
        let invocation = ScriptInvocation::new(
            "definitely-not-a-shell",
            PathBuf::from("/nowhere/kiro-spec-validate.sh"),
            vec!["all".to_string()],
        );
        host.run_in_new_terminal("Kiro Validator", &invocation).unwrap();
    }

    #[test]
    fn missing_shell_is_reported() {
        let mut host = TerminalHost::new(None);
        let invocation = ScriptInvocation::new(
            "definitely-not-a-shell",
            PathBuf::from("/nowhere/kiro-spec-validate.sh"),
            vec!["all".to_string()],
        );
        assert!(matches!(
            host.run_in_new_terminal("Kiro Validator", &invocation),
            Err(KiroError::ShellNotFound(_))
        ));
    }
}
