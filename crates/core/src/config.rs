use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

pub const DEFAULT_TICK_SECS: u64 = 60;
pub const DEFAULT_SMTP_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_TASKS_FILE: &str = "tasks.json";
pub const DEFAULT_SETTINGS_FILE: &str = "email_settings.json";

/// Runtime configuration for the reminder service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    /// Directory holding the task snapshot and email settings.
    pub data_dir: PathBuf,
    pub tasks_file: String,
    pub settings_file: String,
    /// Scheduler cadence.
    pub tick_interval: Duration,
    /// Bound on every SMTP connect/read.
    pub smtp_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            profile: String::new(),
            data_dir: default_data_dir(),
            tasks_file: DEFAULT_TASKS_FILE.to_string(),
            settings_file: DEFAULT_SETTINGS_FILE.to_string(),
            tick_interval: Duration::from_secs(DEFAULT_TICK_SECS),
            smtp_timeout: Duration::from_secs(DEFAULT_SMTP_TIMEOUT_SECS),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("nudge"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `NUDGE_PROFILE`. When set (e.g. `WORK`), every key
    /// is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("NUDGE_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        let data_dir = profiled_env_opt(p, "NUDGE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_data_dir);
        Self {
            profile: p.to_string(),
            data_dir,
            tasks_file: profiled_env_or(p, "NUDGE_TASKS_FILE", DEFAULT_TASKS_FILE),
            settings_file: profiled_env_or(p, "NUDGE_SETTINGS_FILE", DEFAULT_SETTINGS_FILE),
            tick_interval: Duration::from_secs(
                profiled_env_u64(p, "NUDGE_TICK_SECS", DEFAULT_TICK_SECS).max(1),
            ),
            smtp_timeout: Duration::from_secs(
                profiled_env_u64(p, "NUDGE_SMTP_TIMEOUT_SECS", DEFAULT_SMTP_TIMEOUT_SECS).max(1),
            ),
        }
    }

    /// Config rooted at an explicit data directory, everything else default.
    pub fn with_data_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Self::default()
        }
    }

    pub fn tasks_path(&self) -> PathBuf {
        self.data_dir.join(&self.tasks_file)
    }

    pub fn settings_path(&self) -> PathBuf {
        self.data_dir.join(&self.settings_file)
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  tasks:     {}", self.tasks_path().display());
        tracing::info!("  settings:  {}", self.settings_path().display());
        tracing::info!("  scheduler: tick={}s", self.tick_interval.as_secs());
        tracing::info!("  smtp:      timeout={}s", self.smtp_timeout.as_secs());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_join_data_dir() {
        let cfg = Config::with_data_dir("/tmp/nudge-test");
        assert_eq!(cfg.tasks_path(), PathBuf::from("/tmp/nudge-test/tasks.json"));
        assert_eq!(
            cfg.settings_path(),
            PathBuf::from("/tmp/nudge-test/email_settings.json")
        );
    }

    #[test]
    fn defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.tick_interval, Duration::from_secs(60));
        assert_eq!(cfg.smtp_timeout, Duration::from_secs(10));
        assert_eq!(cfg.profile_label(), "default");
    }

    #[test]
    fn profiled_keys_take_precedence() {
        // Unique key names so parallel tests don't race on shared env vars.
        env::set_var("NUDGETESTP_NUDGE_TICK_SECS", "5");
        env::set_var("NUDGETESTP_NUDGE_TASKS_FILE", "work.json");
        let cfg = Config::for_profile("nudgetestp");
        assert_eq!(cfg.profile, "NUDGETESTP");
        assert_eq!(cfg.tick_interval, Duration::from_secs(5));
        assert_eq!(cfg.tasks_file, "work.json");
        env::remove_var("NUDGETESTP_NUDGE_TICK_SECS");
        env::remove_var("NUDGETESTP_NUDGE_TASKS_FILE");
    }
}
