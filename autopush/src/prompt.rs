//! Interactive operator prompts

use colored::Colorize;
use eyre::{Result, eyre};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::debug;

/// Source of operator answers
///
/// Calls block until the operator answers. autopush runs a single flow of
/// control, so nothing else is waiting while a prompt is open.
pub trait Prompter: Send + Sync {
    /// Ask the operator to pick one of `choices`; `default` is used for an empty answer
    fn select(&self, message: &str, choices: &[String], default: &str) -> Result<String>;

    /// Ask for free text; an empty string means the operator skipped the question
    fn input(&self, message: &str) -> Result<String>;
}

/// Prompter reading from the terminal with line editing
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn editor() -> Result<DefaultEditor> {
        DefaultEditor::new().map_err(|e| eyre!("Failed to initialize readline: {}", e))
    }
}

impl Prompter for TerminalPrompter {
    fn select(&self, message: &str, choices: &[String], default: &str) -> Result<String> {
        debug!(%message, ?choices, %default, "TerminalPrompter::select: called");
        println!("{}", message.bright_cyan());
        for (i, choice) in choices.iter().enumerate() {
            let marker = if choice == default { "*".green() } else { " ".normal() };
            println!("  {} {:>2}) {}", marker, i + 1, choice);
        }

        let mut rl = Self::editor()?;
        let prompt = format!("{} [{}] ", ">".bright_green(), default);
        loop {
            match rl.readline(&prompt) {
                Ok(line) => match resolve_choice(&line, choices, default) {
                    Some(choice) => {
                        debug!(%choice, "TerminalPrompter::select: resolved");
                        return Ok(choice);
                    }
                    None => {
                        println!("{} Enter a number between 1 and {} or a name", "?".yellow(), choices.len());
                    }
                },
                Err(ReadlineError::Interrupted) => return Err(eyre!("Prompt interrupted")),
                Err(ReadlineError::Eof) => return Ok(default.to_string()),
                Err(err) => return Err(eyre!("Readline error: {}", err)),
            }
        }
    }

    fn input(&self, message: &str) -> Result<String> {
        debug!(%message, "TerminalPrompter::input: called");
        let mut rl = Self::editor()?;
        match rl.readline(&format!("{} ", message.bright_cyan())) {
            Ok(line) => Ok(line.trim().to_string()),
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                debug!("TerminalPrompter::input: no answer");
                Ok(String::new())
            }
            Err(err) => Err(eyre!("Readline error: {}", err)),
        }
    }
}

/// Map an answer to one of the choices
///
/// Accepts an empty line (the default), a 1-based index, or an exact name.
pub fn resolve_choice(answer: &str, choices: &[String], default: &str) -> Option<String> {
    let answer = answer.trim();
    if answer.is_empty() {
        return Some(default.to_string());
    }

    if let Ok(index) = answer.parse::<usize>()
        && (1..=choices.len()).contains(&index)
    {
        return Some(choices[index - 1].clone());
    }

    choices.iter().find(|choice| choice.as_str() == answer).cloned()
}
