//! The environment a validation action runs in.
//!
//! The dispatcher never touches a terminal, a prompt library or the process
//! table directly. It asks a [`Host`] for the project root, for user input,
//! and to run the finished [`ScriptInvocation`]. The CLI provides an
//! interactive host; tests provide a scripted one.

use crate::dispatch::ScriptInvocation;
use crate::error::Result;
use std::path::PathBuf;

/// Outcome of a single prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Prompted<T> {
    Submitted(T),
    Cancelled,
}

/// Returns `Some(message)` when the input must be rejected.
pub type InputRule = fn(&str) -> Option<&'static str>;

/// A single-line text prompt.
#[derive(Debug, Clone)]
pub struct TextPrompt {
    pub title: String,
    pub hint: String,
    pub default: String,
    pub validate: InputRule,
}

impl TextPrompt {
    pub fn check(&self, input: &str) -> Option<&'static str> {
        (self.validate)(input)
    }
}

/// A single-choice selection over a fixed list.
#[derive(Debug, Clone)]
pub struct ChoicePrompt {
    pub title: String,
    pub items: Vec<String>,
}

pub trait Host {
    /// First open project root, if any.
    fn current_project_root(&self) -> Option<PathBuf>;

    fn prompt_text(&mut self, prompt: &TextPrompt) -> Result<Prompted<String>>;

    /// Yields the index of the chosen item.
    fn prompt_choice(&mut self, prompt: &ChoicePrompt) -> Result<Prompted<usize>>;

    fn show_error(&mut self, message: &str);

    /// Make a terminal labelled `label` visible and run `invocation` in it.
    /// Fire and forget: the script's exit status is not reported back.
    fn run_in_new_terminal(&mut self, label: &str, invocation: &ScriptInvocation) -> Result<()>;
}
