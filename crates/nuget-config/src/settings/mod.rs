//! Client settings parsing and layering

use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use nuget_core::error::NugetError;
use nuget_registry::{AuthConfig, ClientOptions, RegistryClient, RetryConfig, NUGET_ORG_V3};

use crate::ConfigResult;

/// Prefix of environment variables that override file settings
pub const ENV_PREFIX: &str = "NUGET_CLIENT_";

/// Complete client settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClientSettings {
    /// Service index URL of the package source
    pub source: String,

    /// Per-request timeout in seconds
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,

    /// Retry policy for transport failures
    pub retry: RetrySettings,

    /// Credentials for private feeds
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth: Option<AuthSettings>,
}

/// Retry policy section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

/// Credentials section: a bearer token, or username and password
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            source: NUGET_ORG_V3.to_string(),
            timeout_secs: 30,
            user_agent: format!("nuget-client/{}", env!("CARGO_PKG_VERSION")),
            retry: RetrySettings::default(),
            auth: None,
        }
    }
}

impl Default for RetrySettings {
    fn default() -> Self {
        let defaults = RetryConfig::default();
        Self {
            max_retries: defaults.max_retries,
            initial_delay_ms: defaults.initial_delay.as_millis() as u64,
            max_delay_ms: defaults.max_delay.as_millis() as u64,
            multiplier: defaults.multiplier,
        }
    }
}

impl ClientSettings {
    /// Parse settings from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let settings: ClientSettings = toml::from_str(content).map_err(|e| NugetError::Config {
            message: format!("TOML parsing error: {}", e),
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file
    pub async fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            NugetError::io(format!("Failed to read {}", path.display()), e)
        })?;

        debug!("Loaded settings from {}", path.display());
        Self::from_toml_str(&content).map_err(|e| match e {
            NugetError::Config { message } => NugetError::Config {
                message: format!("In file {}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Serialize settings to TOML
    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| NugetError::Config {
            message: format!("TOML serialization error: {}", e),
        })
    }

    /// Check values that serde cannot
    pub fn validate(&self) -> ConfigResult<()> {
        let invalid = |message: String| Err(NugetError::Config { message });

        if self.source.trim().is_empty() {
            return invalid("source cannot be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return invalid("timeout_secs must be greater than zero".to_string());
        }
        if self.retry.multiplier < 1.0 {
            return invalid(format!(
                "retry.multiplier must be at least 1.0, got {}",
                self.retry.multiplier
            ));
        }
        if let Some(auth) = &self.auth {
            let basic = auth.username.is_some() || auth.password.is_some();
            if auth.token.is_some() && basic {
                return invalid("auth accepts either token or username/password, not both".to_string());
            }
            if basic && (auth.username.is_none() || auth.password.is_none()) {
                return invalid("auth requires both username and password".to_string());
            }
        }
        Ok(())
    }

    /// Apply `NUGET_CLIENT_*` overrides
    pub fn apply_env_overrides(&mut self, overrides: &HashMap<String, String>) -> ConfigResult<()> {
        for (key, value) in overrides {
            match key.strip_prefix(ENV_PREFIX) {
                Some("SOURCE") => self.source = value.clone(),
                Some("TIMEOUT_SECS") => {
                    self.timeout_secs = value.parse().map_err(|e| NugetError::Config {
                        message: format!("Invalid {}: {}", key, e),
                    })?;
                },
                Some("TOKEN") => {
                    self.auth = Some(AuthSettings {
                        token: Some(value.clone()),
                        ..AuthSettings::default()
                    });
                },
                _ => {
                    // Unknown variable, ignore
                },
            }
        }
        self.validate()
    }

    /// Collect `NUGET_CLIENT_*` variables from the process environment
    pub fn collect_env_overrides() -> HashMap<String, String> {
        std::env::vars()
            .filter(|(key, _)| key.starts_with(ENV_PREFIX))
            .collect()
    }

    /// Options for building the registry client
    pub fn client_options(&self) -> ClientOptions {
        ClientOptions {
            retry: RetryConfig {
                max_retries: self.retry.max_retries,
                initial_delay: Duration::from_millis(self.retry.initial_delay_ms),
                max_delay: Duration::from_millis(self.retry.max_delay_ms),
                multiplier: self.retry.multiplier,
            },
            auth: self.auth.as_ref().map(|auth| AuthConfig {
                token: auth.token.clone(),
                username: auth.username.clone(),
                password: auth.password.clone(),
            }),
            timeout: Duration::from_secs(self.timeout_secs),
            user_agent: self.user_agent.clone(),
        }
    }

    /// Build the registry client described by these settings
    pub fn registry_client(&self) -> ConfigResult<RegistryClient> {
        RegistryClient::with_options(&self.source, self.client_options())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_settings_use_defaults() {
        let settings = ClientSettings::from_toml_str("").unwrap();
        assert_eq!(settings, ClientSettings::default());
        assert_eq!(settings.source, NUGET_ORG_V3);
        assert_eq!(settings.retry.max_retries, 3);
    }

    #[test]
    fn test_full_settings() {
        let settings = ClientSettings::from_toml_str(
            r#"
            source = "https://pkgs.example.com/nuget/v3/index.json"
            timeout_secs = 5
            user_agent = "my-tool/1.0"

            [retry]
            max_retries = 1
            initial_delay_ms = 10
            max_delay_ms = 20
            multiplier = 1.5

            [auth]
            username = "build"
            password = "hunter2"
            "#,
        )
        .unwrap();

        let options = settings.client_options();
        assert_eq!(options.timeout, Duration::from_secs(5));
        assert_eq!(options.retry.max_retries, 1);
        assert_eq!(options.retry.initial_delay, Duration::from_millis(10));
        assert_eq!(options.user_agent, "my-tool/1.0");
        let auth = options.auth.unwrap();
        assert_eq!(auth.username.as_deref(), Some("build"));
        assert!(auth.token.is_none());

        let client = settings.registry_client().unwrap();
        assert_eq!(client.source().host_str(), Some("pkgs.example.com"));
    }

    #[test]
    fn test_invalid_settings() {
        for content in [
            "timeout_secs = \"soon\"",
            "unknown_key = 1",
            "timeout_secs = 0",
            "[retry]\nmultiplier = 0.5",
            "[auth]\ntoken = \"t\"\nusername = \"u\"\npassword = \"p\"",
            "[auth]\nusername = \"u\"",
        ] {
            assert!(
                matches!(ClientSettings::from_toml_str(content), Err(NugetError::Config { .. })),
                "{content} should be rejected"
            );
        }
    }

    #[test]
    fn test_invalid_source_rejected_when_building_client() {
        let settings = ClientSettings {
            source: "not a url".to_string(),
            ..ClientSettings::default()
        };
        assert!(matches!(settings.registry_client(), Err(NugetError::Config { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let mut settings = ClientSettings::default();
        let overrides: HashMap<String, String> = [
            ("NUGET_CLIENT_SOURCE", "https://mirror.example.com/v3/index.json"),
            ("NUGET_CLIENT_TIMEOUT_SECS", "90"),
            ("NUGET_CLIENT_TOKEN", "abc"),
            ("NUGET_CLIENT_UNUSED", "ignored"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        settings.apply_env_overrides(&overrides).unwrap();
        assert_eq!(settings.source, "https://mirror.example.com/v3/index.json");
        assert_eq!(settings.timeout_secs, 90);
        assert_eq!(settings.auth.unwrap().token.as_deref(), Some("abc"));

        let mut settings = ClientSettings::default();
        let bad: HashMap<String, String> =
            [("NUGET_CLIENT_TIMEOUT_SECS".to_string(), "x".to_string())].into_iter().collect();
        assert!(settings.apply_env_overrides(&bad).is_err());
    }

    #[test]
    fn test_settings_round_trip_through_toml() {
        let settings = ClientSettings {
            timeout_secs: 12,
            auth: Some(AuthSettings {
                token: Some("t".to_string()),
                ..AuthSettings::default()
            }),
            ..ClientSettings::default()
        };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(ClientSettings::from_toml_str(&text).unwrap(), settings);
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = 7").unwrap();

        let settings = ClientSettings::load(file.path()).await.unwrap();
        assert_eq!(settings.timeout_secs, 7);

        let missing = ClientSettings::load(file.path().with_extension("missing")).await;
        assert!(matches!(missing, Err(NugetError::Io { .. })));
    }

    #[tokio::test]
    async fn test_load_reports_file_in_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "timeout_secs = [").unwrap();

        match ClientSettings::load(file.path()).await {
            Err(NugetError::Config { message }) => assert!(message.contains("In file")),
            other => panic!("Expected Config error, got {:?}", other),
        }
    }
}
