//! Test doubles for the process and operator seams.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;

use crate::error::Result;
use crate::models::PublishAction;
use crate::process::{CommandOutput, CommandRunner, CommandSpec};
use crate::prompt::Operator;

type Responder = Box<dyn Fn(&CommandSpec) -> io::Result<CommandOutput>>;

/// Runner that records every command and answers from a closure.
pub struct RecordingRunner {
  calls: RefCell<Vec<CommandSpec>>,
  respond: Responder,
}

impl RecordingRunner {
  /// Every command succeeds.
  pub fn succeeding() -> Self {
    Self::with(|_| Ok(CommandOutput::with_code(0)))
  }

  /// Answer each command with `respond`.
  pub fn with(respond: impl Fn(&CommandSpec) -> io::Result<CommandOutput> + 'static) -> Self {
    Self {
      calls: RefCell::new(Vec::new()),
      respond: Box::new(respond),
    }
  }

  /// Display strings of the recorded commands, in order.
  pub fn commands(&self) -> Vec<String> {
    self.calls.borrow().iter().map(CommandSpec::display).collect()
  }

  /// Recorded command specs, in order.
  pub fn calls(&self) -> Vec<CommandSpec> {
    self.calls.borrow().clone()
  }
}

impl CommandRunner for RecordingRunner {
  fn run(&self, spec: &CommandSpec) -> io::Result<CommandOutput> {
    self.calls.borrow_mut().push(spec.clone());
    (self.respond)(spec)
  }
}

/// Operator replaying a fixed action and queue of confirmation answers.
pub struct ScriptedOperator {
  action: PublishAction,
  answers: RefCell<VecDeque<bool>>,
  questions: RefCell<Vec<String>>,
  pauses: RefCell<usize>,
}

impl ScriptedOperator {
  /// Choose `action` and answer confirmations from `answers`; missing answers decline.
  pub fn new(action: PublishAction, answers: &[bool]) -> Self {
    Self {
      action,
      answers: RefCell::new(answers.iter().copied().collect()),
      questions: RefCell::new(Vec::new()),
      pauses: RefCell::new(0),
    }
  }

  /// Confirmation questions asked so far.
  pub fn questions(&self) -> Vec<String> {
    self.questions.borrow().clone()
  }

  /// Number of acknowledgement pauses shown.
  pub fn pauses(&self) -> usize {
    *self.pauses.borrow()
  }
}

impl Operator for ScriptedOperator {
  fn select_action(&self) -> Result<PublishAction> {
    Ok(self.action)
  }

  fn confirm(&self, question: &str) -> Result<bool> {
    self.questions.borrow_mut().push(question.to_string());
    Ok(self.answers.borrow_mut().pop_front().unwrap_or(false))
  }

  fn pause(&self, _message: &str) -> Result<()> {
    *self.pauses.borrow_mut() += 1;
    Ok(())
  }
}
