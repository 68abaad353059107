//! Configuration loading and management.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

/// Application configuration.
///
/// Every remote setting is optional at load time; [`Config::remote`]
/// validates that the full set is present before any network call.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the remote time-tracking service.
    pub base_url: Option<String>,
    /// Account id of the user whose worklogs are managed.
    pub account_id: Option<String>,
    /// API token for the remote service.
    pub api_token: Option<String>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("base_url", &self.base_url)
            .field("account_id", &self.account_id)
            .field(
                "api_token",
                &self.api_token.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Validated remote settings, ready to build a client from.
#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub base_url: String,
    pub account_id: String,
    pub api_token: String,
}

impl Config {
    /// Loads configuration, optionally from a specific file.
    ///
    /// Precedence, lowest first: defaults, the platform config file,
    /// the `--config` file, then `WLS_*` environment variables.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("WLS_"));

        figment.extract()
    }

    /// Applies command-line flag overrides on top of the loaded values.
    pub fn apply_overrides(
        &mut self,
        base_url: Option<String>,
        account_id: Option<String>,
        api_token: Option<String>,
    ) {
        if base_url.is_some() {
            self.base_url = base_url;
        }
        if account_id.is_some() {
            self.account_id = account_id;
        }
        if api_token.is_some() {
            self.api_token = api_token;
        }
    }

    /// Validates that every remote setting is present and non-empty.
    pub fn remote(&self) -> Result<RemoteSettings> {
        let mut missing = Vec::new();
        let require = |value: &Option<String>, name, missing: &mut Vec<&str>| {
            match value {
                Some(text) if !text.trim().is_empty() => Some(text.clone()),
                _ => {
                    missing.push(name);
                    None
                }
            }
        };

        let base_url = require(&self.base_url, "base_url", &mut missing);
        let account_id = require(&self.account_id, "account_id", &mut missing);
        let api_token = require(&self.api_token, "api_token", &mut missing);

        let (Some(base_url), Some(account_id), Some(api_token)) =
            (base_url, account_id, api_token)
        else {
            anyhow::bail!(
                "missing required setting(s): {} (supply via config file, WLS_* \
                 environment variables, or flags)",
                missing.join(", ")
            );
        };

        Ok(RemoteSettings {
            base_url,
            account_id,
            api_token,
        })
    }
}

/// Returns the platform-specific config directory for wls.
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("wls"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_config() -> Config {
        Config {
            base_url: Some("https://example.test".to_string()),
            account_id: Some("acct-1".to_string()),
            api_token: Some("token".to_string()),
        }
    }

    #[test]
    fn remote_requires_every_setting() {
        let err = Config::default().remote().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("base_url"));
        assert!(message.contains("account_id"));
        assert!(message.contains("api_token"));
    }

    #[test]
    fn remote_rejects_whitespace_values() {
        let mut config = full_config();
        config.api_token = Some("   ".to_string());
        let message = config.remote().unwrap_err().to_string();
        assert!(message.contains("api_token"));
        assert!(!message.contains("base_url"));
    }

    #[test]
    fn remote_accepts_a_full_config() {
        let settings = full_config().remote().unwrap();
        assert_eq!(settings.base_url, "https://example.test");
        assert_eq!(settings.account_id, "acct-1");
    }

    #[test]
    fn flag_overrides_win_over_loaded_values() {
        let mut config = full_config();
        config.apply_overrides(Some("https://other.test".to_string()), None, None);
        assert_eq!(config.base_url.as_deref(), Some("https://other.test"));
        assert_eq!(config.account_id.as_deref(), Some("acct-1"));
    }

    #[test]
    fn debug_redacts_api_token() {
        let mut config = full_config();
        config.api_token = Some("super-secret".to_string());
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }
}
