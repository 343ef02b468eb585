mod cli;
mod input;
mod repl;
mod terminal;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use nudge_service::ReminderService;

use crate::cli::{CliArgs, Command};
use crate::repl::Repl;
use crate::terminal::Terminal;

#[tokio::main]
async fn main() -> Result<()> {
    nudge_core::config::load_dotenv();
    let args = CliArgs::parse();
    let command = args.command();

    // The interactive prompt shares the terminal with the log output, so
    // it only shows warnings unless RUST_LOG says otherwise.
    let default_filter = if command == Command::Run { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config = args.resolve_config();
    config.log_summary();

    let (popup_tx, popup_rx) = mpsc::unbounded_channel();
    let service = ReminderService::open(&config, popup_tx).with_context(|| {
        format!("failed to load saved data from {}", config.data_dir.display())
    })?;

    match command {
        Command::Run => Repl::new(service, popup_rx).run().await,
        Command::Tick => run_tick(&service, popup_rx).await,
        Command::TestEmail => run_test_email(&service).await,
    }
}

/// One scheduler pass for cron-style use. Refused at open while another
/// nudge process owns the data directory.
async fn run_tick(
    service: &ReminderService,
    mut popups: mpsc::UnboundedReceiver<nudge_service::Popup>,
) -> Result<()> {
    let terminal = Terminal::new();
    let report = service
        .run_scheduler_once()
        .await
        .context("scheduler pass failed")?;

    while let Ok(popup) = popups.try_recv() {
        terminal.print_popup(&popup)?;
    }
    terminal.print_tick_report(&report)?;
    info!(fired = report.fired.len(), "Scheduler pass complete");
    Ok(())
}

async fn run_test_email(service: &ReminderService) -> Result<()> {
    let terminal = Terminal::new();
    let settings = service.get_email_settings();
    terminal.print_settings(&settings)?;

    if let Err(e) = service.test_email_connection(&settings).await {
        terminal.print_error(&format!("Connection test failed: {e}"))?;
        bail!("email connection test failed");
    }
    terminal.print_success("Email connection test successful!")?;
    Ok(())
}
