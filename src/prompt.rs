//! Interactive input as a capability.
//!
//! Every piece of engine logic that needs an answer from the operator takes
//! a [`Prompter`] instead of reading the terminal directly. Production code
//! passes [`TerminalPrompter`]; tests feed scripted answers through
//! [`ScriptedPrompter`]. Retry budgets live with the consuming code, not
//! here.

#![allow(dead_code)]

use dialoguer::{Confirm, Input, Password};
use std::collections::VecDeque;
use std::io;

/// Source of operator answers.
pub trait Prompter {
    /// Ask for a line of text.
    fn input(&mut self, prompt: &str) -> io::Result<String>;

    /// Ask for a secret without echoing it.
    fn password(&mut self, prompt: &str) -> io::Result<String>;

    /// Ask a yes/no question.
    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool>;
}

/// Prompter reading from the controlling terminal via dialoguer.
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl Prompter for TerminalPrompter {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        let answer: String = Input::new()
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
            .map_err(io::Error::other)?;
        Ok(answer.trim().to_string())
    }

    fn password(&mut self, prompt: &str) -> io::Result<String> {
        Password::new()
            .with_prompt(prompt)
            .interact()
            .map_err(io::Error::other)
    }

    fn confirm(&mut self, prompt: &str, default: bool) -> io::Result<bool> {
        Confirm::new()
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(io::Error::other)
    }
}

/// Prompter answering from a fixed script, for tests.
///
/// Answers are consumed front to back; running out of script is an error so
/// a test never hangs on an unexpected extra prompt. Confirm answers accept
/// the same y/n spellings the terminal does.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    answers: VecDeque<String>,
}

impl ScriptedPrompter {
    /// Create a prompter that will return the given answers in order.
    pub fn new<S: Into<String>, I: IntoIterator<Item = S>>(answers: I) -> Self {
        Self {
            answers: answers.into_iter().map(Into::into).collect(),
        }
    }

    /// Answers not yet consumed.
    pub fn remaining(&self) -> usize {
        self.answers.len()
    }

    fn next(&mut self, prompt: &str) -> io::Result<String> {
        self.answers
            .pop_front()
            .ok_or_else(|| io::Error::other(format!("script exhausted at prompt: {prompt}")))
    }
}

impl Prompter for ScriptedPrompter {
    fn input(&mut self, prompt: &str) -> io::Result<String> {
        self.next(prompt)
    }

    fn password(&mut self, prompt: &str) -> io::Result<String> {
        self.next(prompt)
    }

    fn confirm(&mut self, prompt: &str, _default: bool) -> io::Result<bool> {
        let answer = self.next(prompt)?;
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(true),
            "n" | "no" | "false" => Ok(false),
            other => Err(io::Error::other(format!(
                "scripted confirm answer is not y/n: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_answers_in_order() {
        let mut prompter = ScriptedPrompter::new(["first", "second"]);
        assert_eq!(prompter.input("a").unwrap(), "first");
        assert_eq!(prompter.password("b").unwrap(), "second");
        assert_eq!(prompter.remaining(), 0);
    }

    #[test]
    fn scripted_exhaustion_is_an_error() {
        let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
        assert!(prompter.input("anything").is_err());
    }

    #[test]
    fn scripted_confirm_parses_yes_no() {
        let mut prompter = ScriptedPrompter::new(["y", "NO", "maybe"]);
        assert!(prompter.confirm("q", false).unwrap());
        assert!(!prompter.confirm("q", true).unwrap());
        assert!(prompter.confirm("q", true).is_err());
    }
}
