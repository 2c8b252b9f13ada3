//! autopush - CLI entry point

use std::fs;
use std::sync::Arc;

use clap::{CommandFactory, FromArgMatches};
use eyre::{Context, Result, bail, eyre};
use tracing::{debug, info};

use autopush::cli::{Cli, generate_after_help, get_log_path};
use autopush::config::Config;
use autopush::git::{GitCli, Vcs};
use autopush::progress::{ConsoleReporter, Reporter};
use autopush::prompt::TerminalPrompter;
use autopush::runner::{AutoPush, CycleOutcome};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    let log_path = get_log_path();
    if let Some(log_dir) = log_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level).map(str::to_uppercase).as_deref() {
        Some("TRACE") => tracing::Level::TRACE,
        Some("DEBUG") => tracing::Level::DEBUG,
        Some("INFO") | None => tracing::Level::INFO,
        Some("WARN") | Some("WARNING") => tracing::Level::WARN,
        Some("ERROR") => tracing::Level::ERROR,
        Some(other) => {
            eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", other);
            tracing::Level::INFO
        }
    };

    let log_file = fs::File::create(&log_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cmd = Cli::command().after_help(generate_after_help());
    let cli = Cli::from_arg_matches(&cmd.get_matches())?;

    let config_log_level = Config::load_log_level(cli.config.as_ref(), &cli.dir);
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let mut config = Config::load(cli.config.as_ref(), &cli.dir).context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate().context("Invalid configuration")?;
    debug!(?config, "main: configuration resolved");

    let git = GitCli::new(&cli.dir);
    if !git.is_repository().await.context("Failed to run git")? {
        bail!("{} is not inside a git repository", cli.dir.display());
    }
    info!(dir = %git.work_dir().display(), "Watching repository");

    let vcs: Arc<dyn Vcs> = Arc::new(git);
    let reporter: Arc<dyn Reporter> = Arc::new(ConsoleReporter::new());
    let app = AutoPush::new(vcs, Arc::new(TerminalPrompter::new()), reporter.clone(), &config);

    if cli.once {
        debug!("main: single-cycle mode");
        app.start().await;
        return match app.run_once().await {
            CycleOutcome::StatusFailed(msg) => Err(eyre!("Could not read repository status: {}", msg)),
            outcome => {
                debug!(?outcome, "main: single cycle finished");
                Ok(())
            }
        };
    }

    tokio::select! {
        _ = app.run() => {}
        result = tokio::signal::ctrl_c() => {
            result.context("Failed to listen for interrupt")?;
            info!("Interrupted, shutting down");
            reporter.info("Interrupted, exiting");
        }
    }

    Ok(())
}
