//! Confirmation adapters: an interactive terminal prompt and a fixed answer.

use dialoguer::Confirm as Prompt;

use crate::ports::confirm::Confirm;

/// Asks on the terminal; anything but an explicit "yes" is a no.
pub struct TerminalConfirm;

impl Confirm for TerminalConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        Prompt::new().with_prompt(prompt).default(false).interact().unwrap_or(false)
    }
}

/// Always gives the same answer. Backs `--force` and tests.
pub struct AutoConfirm(pub bool);

impl Confirm for AutoConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        log::debug!("auto-answering {:?} to: {prompt}", self.0);
        self.0
    }
}
