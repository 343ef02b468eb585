use std::path::{Path, PathBuf};
use std::sync::RwLock;

use nudge_core::EmailSettings;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::snapshot;

/// File-backed email settings.
///
/// Loaded once at startup and written only on explicit save.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    current: RwLock<EmailSettings>,
}

impl SettingsStore {
    /// Load settings from `path`. A missing, unreadable or malformed file
    /// falls back to defaults.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = Self::read(&path).unwrap_or_else(|e| {
            warn!(path = %path.display(), error = %e, "failed to load email settings, using defaults");
            EmailSettings::default()
        });
        Self {
            path,
            current: RwLock::new(settings),
        }
    }

    fn read(path: &Path) -> Result<EmailSettings, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "no email settings file, using defaults");
            return Ok(EmailSettings::default());
        }
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Settings as stored on disk.
    pub fn get(&self) -> EmailSettings {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Stored settings with `SMTP_USERNAME` / `SMTP_PASSWORD` applied.
    /// This is what the email channel uses.
    pub fn effective(&self) -> EmailSettings {
        self.get().with_env_credentials()
    }

    /// Replace the settings in memory and on disk.
    ///
    /// The password is written in cleartext; the file is owner-only on unix.
    pub fn save(&self, settings: EmailSettings) -> Result<(), StoreError> {
        snapshot::write_json(&self.path, &settings)?;
        if !settings.email_password.is_empty() {
            warn!(path = %self.path.display(), "SMTP password stored in cleartext");
        }
        let mut guard = self
            .current
            .write()
            .map_err(|e| StoreError::LockPoisoned(format!("email settings: {e}")))?;
        *guard = settings;
        info!(path = %self.path.display(), "email settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::open(dir.path().join("email_settings.json"));
        assert_eq!(store.get(), EmailSettings::default());
    }

    #[test]
    fn malformed_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email_settings.json");
        std::fs::write(&path, "not json").unwrap();
        let store = SettingsStore::open(&path);
        assert_eq!(store.get(), EmailSettings::default());
    }

    #[test]
    fn save_then_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email_settings.json");
        let store = SettingsStore::open(&path);

        let settings = EmailSettings {
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 2525,
            email_username: "me@example.com".to_string(),
            email_password: "app-password".to_string(),
        };
        store.save(settings.clone()).unwrap();
        assert_eq!(store.get(), settings);

        let reopened = SettingsStore::open(&path);
        assert_eq!(reopened.get(), settings);
    }

    #[test]
    fn file_uses_documented_keys() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("email_settings.json");
        let store = SettingsStore::open(&path);
        store.save(EmailSettings::default()).unwrap();

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["smtp_server"], "smtp.gmail.com");
        assert_eq!(raw["smtp_port"], 587);
        assert_eq!(raw["email_username"], "");
        assert_eq!(raw["email_password"], "");
    }
}
