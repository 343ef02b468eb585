use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use nudge_core::Config;

/// Personal task reminders with desktop popups and email.
///
/// Without a subcommand, starts the interactive prompt with the reminder
/// scheduler running in the background.
#[derive(Parser, Debug)]
#[command(name = "nudge", version, about = "Personal task reminders")]
pub struct CliArgs {
    /// Configuration profile (reads `{PROFILE}_NUDGE_*` env vars first)
    #[arg(long, env = "NUDGE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Directory holding tasks.json and email_settings.json
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Seconds between scheduler passes
    #[arg(long, global = true)]
    pub tick_secs: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Interactive prompt with the scheduler in the background (default)
    Run,
    /// Run one scheduler pass, print what fired, and exit
    Tick,
    /// Check the stored SMTP settings and exit
    TestEmail,
}

impl CliArgs {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }

    /// Environment config with command-line overrides applied.
    pub fn resolve_config(&self) -> Config {
        let mut config = match &self.profile {
            Some(profile) => Config::for_profile(profile),
            None => Config::from_env(),
        };
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(secs) = self.tick_secs {
            config.tick_interval = Duration::from_secs(secs.max(1));
        }
        config
    }
}
