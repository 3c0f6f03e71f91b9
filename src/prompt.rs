//! Operator interaction for the release pipeline.

use inquire::{InquireError, Select, Text};

use crate::error::{ReleaseError, Result};
use crate::models::PublishAction;

/// Source of operator decisions.
pub trait Operator {
    /// Ask which uploads to perform.
    fn select_action(&self) -> Result<PublishAction>;

    /// Ask a yes/no question; only an affirmative answer returns `true`.
    fn confirm(&self, question: &str) -> Result<bool>;

    /// Wait until the operator acknowledges `message`.
    fn pause(&self, message: &str) -> Result<()>;
}

/// Returns `true` for `y` or `yes`, ignoring case and surrounding whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

/// Interactive operator on the controlling terminal.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalOperator;

impl Operator for TerminalOperator {
    fn select_action(&self) -> Result<PublishAction> {
        match Select::new("Publish options:", PublishAction::ALL.to_vec()).prompt() {
            Ok(action) => Ok(action),
            Err(InquireError::OperationCanceled) => Ok(PublishAction::Abort),
            Err(err) => Err(map_prompt_error(err)),
        }
    }

    fn confirm(&self, question: &str) -> Result<bool> {
        match Text::new(&format!("{question} (y/N)")).prompt() {
            Ok(answer) => Ok(is_affirmative(&answer)),
            Err(InquireError::OperationCanceled) => Ok(false),
            Err(err) => Err(map_prompt_error(err)),
        }
    }

    fn pause(&self, message: &str) -> Result<()> {
        match Text::new(message).prompt() {
            Ok(_) | Err(InquireError::OperationCanceled) => Ok(()),
            Err(err) => Err(map_prompt_error(err)),
        }
    }
}

fn map_prompt_error(err: InquireError) -> ReleaseError {
    match err {
        InquireError::OperationInterrupted => ReleaseError::Interrupted,
        other => ReleaseError::Prompt(other.to_string()),
    }
}
