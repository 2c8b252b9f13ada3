//! Operator-facing progress reporting
//!
//! Components report what they are doing through a [`Reporter`]. The console
//! implementation prints colored status lines and mirrors every message to
//! the log, tagged with the label of the step in progress.

use std::sync::Mutex;

use colored::Colorize;
use tracing::{info, warn};

/// Presentation sink for progress messages
pub trait Reporter: Send + Sync {
    /// A labelled step begins
    fn start(&self, label: &str);

    /// Intermediate progress for the current step
    fn update(&self, text: &str);

    /// The current step finished successfully
    fn succeed(&self, text: &str);

    /// The current step failed
    fn fail(&self, text: &str);

    /// A neutral notice outside any step
    fn info(&self, text: &str);
}

/// Reporter that writes to stdout
#[derive(Default)]
pub struct ConsoleReporter {
    label: Mutex<Option<String>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    fn label(&self) -> String {
        self.label
            .lock()
            .map(|label| label.clone().unwrap_or_default())
            .unwrap_or_default()
    }

    fn finish(&self) -> String {
        self.label
            .lock()
            .map(|mut label| label.take().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Reporter for ConsoleReporter {
    fn start(&self, label: &str) {
        if let Ok(mut current) = self.label.lock() {
            *current = Some(label.to_string());
        }
        info!(step = %label, "Started");
        println!("{} {}", "→".cyan(), label);
    }

    fn update(&self, text: &str) {
        info!(step = %self.label(), "{}", text);
        println!("  {}", text.dimmed());
    }

    fn succeed(&self, text: &str) {
        info!(step = %self.finish(), "Succeeded: {}", text);
        println!("{} {}", "✓".green(), text);
    }

    fn fail(&self, text: &str) {
        warn!(step = %self.finish(), "Failed: {}", text);
        println!("{} {}", "✗".red(), text.red());
    }

    fn info(&self, text: &str) {
        info!("{}", text);
        println!("{} {}", "•".blue(), text);
    }
}
