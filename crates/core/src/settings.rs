use serde::{Deserialize, Serialize};

pub const DEFAULT_SMTP_SERVER: &str = "smtp.gmail.com";
pub const DEFAULT_SMTP_PORT: u16 = 587;

/// SMTP configuration for the email channel.
///
/// Persisted as-is to `email_settings.json`. The password is stored in
/// cleartext to stay compatible with existing settings files.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailSettings {
    #[serde(default = "default_smtp_server")]
    pub smtp_server: String,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    #[serde(default)]
    pub email_username: String,
    #[serde(default)]
    pub email_password: String,
}

fn default_smtp_server() -> String {
    DEFAULT_SMTP_SERVER.to_string()
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_server: default_smtp_server(),
            smtp_port: default_smtp_port(),
            email_username: String::new(),
            email_password: String::new(),
        }
    }
}

impl std::fmt::Debug for EmailSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSettings")
            .field("smtp_server", &self.smtp_server)
            .field("smtp_port", &self.smtp_port)
            .field("email_username", &self.email_username)
            .field("email_password", &"<redacted>")
            .finish()
    }
}

impl EmailSettings {
    /// Email delivery needs both a username and a password.
    pub fn is_configured(&self) -> bool {
        !self.email_username.is_empty() && !self.email_password.is_empty()
    }

    /// Parse a port typed by the user. Anything that is not a plain number
    /// falls back to the default port.
    pub fn parse_port(text: &str) -> u16 {
        let text = text.trim();
        if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
            text.parse().unwrap_or(DEFAULT_SMTP_PORT)
        } else {
            DEFAULT_SMTP_PORT
        }
    }

    /// Replace the stored credentials with `SMTP_USERNAME` / `SMTP_PASSWORD`
    /// when both are set in the environment.
    pub fn with_env_credentials(mut self) -> Self {
        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            if !username.is_empty() && !password.is_empty() {
                self.email_username = username;
                self.email_password = password;
            }
        }
        self
    }

    /// Return a redacted view safe for display (no password).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "smtp_server": self.smtp_server,
            "smtp_port": self.smtp_port,
            "email_username": self.email_username,
            "password_set": !self.email_password.is_empty(),
            "configured": self.is_configured(),
        })
    }
}
