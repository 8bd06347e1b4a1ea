//! SMTP settings and mail relay configuration

use crate::Result;
use crate::error::ActError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Relay endpoint used when `ACT_MAIL_RELAY_URL` is not set
pub const DEFAULT_RELAY_URL: &str = "http://localhost:3000/api/send-email";

/// Request timeout used when `ACT_MAIL_TIMEOUT_SECS` is not set
pub const DEFAULT_RELAY_TIMEOUT: Duration = Duration::from_secs(30);

/// SMTP account the relay sends through
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailSettings {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_user: String,
    pub smtp_password: String,
    pub default_sender: String,
}

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            smtp_host: String::new(),
            smtp_port: 587,
            smtp_user: String::new(),
            smtp_password: String::new(),
            default_sender: String::new(),
        }
    }
}

impl EmailSettings {
    /// Host, user and password must all be filled in
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("smtpHost", &self.smtp_host),
            ("smtpUser", &self.smtp_user),
            ("smtpPassword", &self.smtp_password),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(ActError::Settings(format!(
                "Lūdzu aizpildiet visus SMTP iestatījumus ({})",
                missing.join(", ")
            )))
        }
    }

    /// Sender address: the default sender, else the SMTP user
    pub fn sender(&self) -> &str {
        if self.default_sender.trim().is_empty() {
            &self.smtp_user
        } else {
            &self.default_sender
        }
    }

    /// Port 465 means implicit TLS
    pub fn secure(&self) -> bool {
        self.smtp_port == 465
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn import_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Where and how long to talk to the mail relay
#[derive(Debug, Clone, PartialEq)]
pub struct MailRelayConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl Default for MailRelayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_RELAY_URL.to_string(),
            timeout: DEFAULT_RELAY_TIMEOUT,
        }
    }
}

impl MailRelayConfig {
    /// Read `ACT_MAIL_RELAY_URL` and `ACT_MAIL_TIMEOUT_SECS`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(url) = lookup("ACT_MAIL_RELAY_URL").filter(|u| !u.trim().is_empty()) {
            config.endpoint = url;
        }
        if let Some(raw) = lookup("ACT_MAIL_TIMEOUT_SECS") {
            match raw.trim().parse::<u64>() {
                Ok(secs) => config.timeout = Duration::from_secs(secs),
                Err(_) => warn!("Ignoring ACT_MAIL_TIMEOUT_SECS={:?}", raw),
            }
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let s = EmailSettings::default();
        assert_eq!(s.smtp_port, 587);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_validate_names_missing_fields() {
        let s = EmailSettings {
            smtp_host: "smtp.example.lv".into(),
            ..Default::default()
        };
        let err = s.validate().unwrap_err().to_string();
        assert!(err.contains("smtpUser"));
        assert!(err.contains("smtpPassword"));
        assert!(!err.contains("smtpHost"));
    }

    #[test]
    fn test_sender_fallback_and_secure() {
        let mut s = EmailSettings {
            smtp_user: "user@example.lv".into(),
            ..Default::default()
        };
        assert_eq!(s.sender(), "user@example.lv");
        assert!(!s.secure());
        s.default_sender = "akti@example.lv".into();
        s.smtp_port = 465;
        assert_eq!(s.sender(), "akti@example.lv");
        assert!(s.secure());
    }

    #[test]
    fn test_export_import() {
        let s = EmailSettings {
            smtp_host: "smtp.example.lv".into(),
            smtp_port: 2525,
            smtp_user: "u".into(),
            smtp_password: "p".into(),
            default_sender: "s@example.lv".into(),
        };
        let json = s.export_json().unwrap();
        assert!(json.contains("\"smtpHost\""));
        assert_eq!(EmailSettings::import_json(&json).unwrap(), s);
        assert!(EmailSettings::import_json("{not json").is_err());
    }

    #[test]
    fn test_relay_config_lookup() {
        let config = MailRelayConfig::from_lookup(|key| match key {
            "ACT_MAIL_RELAY_URL" => Some("https://relay.example.lv/send".into()),
            "ACT_MAIL_TIMEOUT_SECS" => Some("5".into()),
            _ => None,
        });
        assert_eq!(config.endpoint, "https://relay.example.lv/send");
        assert_eq!(config.timeout, Duration::from_secs(5));

        let config = MailRelayConfig::from_lookup(|key| {
            (key == "ACT_MAIL_TIMEOUT_SECS").then(|| "soon".to_string())
        });
        assert_eq!(config, MailRelayConfig::default());
    }
}
