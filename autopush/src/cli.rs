//! CLI definition

use clap::Parser;
use std::path::PathBuf;
use tracing::debug;

use crate::config::Config;

/// autopush - commit and push working tree changes in batches
#[derive(Debug, Parser)]
#[command(
    name = "autopush",
    about = "Watch a git working tree, commit changes in batches and push them",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Working directory to watch
    #[arg(short = 'C', long = "dir", default_value = ".")]
    pub dir: PathBuf,

    /// Changed files needed before a batch is committed
    #[arg(short, long)]
    pub threshold: Option<usize>,

    /// Files committed per batch (0 = all)
    #[arg(short, long)]
    pub batch_size: Option<usize>,

    /// Seconds between polls while waiting for changes
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Remote used when setting up an upstream
    #[arg(long)]
    pub remote: Option<String>,

    /// Stay on the current branch instead of prompting at startup
    #[arg(long)]
    pub no_branch_prompt: bool,

    /// Run a single cycle without waiting for the threshold, then exit
    #[arg(long)]
    pub once: bool,
}

impl Cli {
    /// Overlay command-line values onto a loaded config
    pub fn apply(&self, config: &mut Config) {
        debug!(?self, "Cli::apply: called");
        if let Some(threshold) = self.threshold {
            config.threshold = threshold;
        }
        if let Some(batch_size) = self.batch_size {
            config.batch_size = batch_size;
        }
        if let Some(poll_interval) = self.poll_interval {
            config.poll_interval_secs = poll_interval;
        }
        if let Some(remote) = &self.remote {
            config.remote = remote.clone();
        }
        if self.no_branch_prompt {
            config.select_branch = false;
        }
    }
}

/// Result of checking a required tool
pub struct ToolCheck {
    pub name: &'static str,
    pub available: bool,
    pub version: Option<String>,
}

impl ToolCheck {
    /// Check if a tool is available and get its version
    pub fn check(name: &'static str, version_args: &[&str]) -> Self {
        debug!(name, ?version_args, "ToolCheck::check: called");
        match std::process::Command::new(name).args(version_args).output() {
            Ok(output) if output.status.success() => {
                let version_str = String::from_utf8_lossy(&output.stdout);
                Self {
                    name,
                    available: true,
                    version: Some(parse_version(&version_str)),
                }
            }
            _ => {
                debug!(name, "ToolCheck::check: tool not available");
                Self {
                    name,
                    available: false,
                    version: None,
                }
            }
        }
    }
}

/// Parse version from command output (extracts first version-like string)
fn parse_version(output: &str) -> String {
    for word in output.split_whitespace() {
        let word = word.trim_start_matches('v');
        if word.chars().next().is_some_and(|c| c.is_ascii_digit()) {
            let version: String = word.chars().take_while(|c| c.is_ascii_digit() || *c == '.').collect();
            if !version.is_empty() {
                return version;
            }
        }
    }
    "unknown".to_string()
}

/// Get the log file path
pub fn get_log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("autopush")
        .join("logs")
        .join("autopush.log")
}

/// Generate the after_help text with the git check and log location
pub fn generate_after_help() -> String {
    debug!("generate_after_help: called");
    let git = ToolCheck::check("git", &["--version"]);

    let mut help = String::new();
    help.push_str("Required Tools:\n");
    let icon = if git.available { "\u{2705}" } else { "\u{274C}" };
    let version = git.version.as_deref().unwrap_or("not found");
    help.push_str(&format!("  {} {:<10} {}\n", icon, git.name, version));

    help.push('\n');
    help.push_str(&format!("Logs are written to: {}\n", get_log_path().display()));
    help
}
