use std::path::PathBuf;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "BOOKSWAP_ENV";
const CONFIG_DIR_ENV: &str = "BOOKSWAP_CONFIG_DIR";
const ENV_PREFIX: &str = "BOOKSWAP";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub auth: AuthSettings,
    #[serde(default)]
    pub exchange: ExchangeSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, environment overlay,
    /// and `BOOKSWAP_*` variables.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                std::env::current_dir()
                    .map(|cwd| cwd.join("config"))
                    .unwrap_or_else(|_| PathBuf::from("config"))
            });

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(environment_source());

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        // Override environment field with parsed enum variant.
        settings.environment = match environment.as_str() {
            "local" => Environment::Local,
            "staging" => Environment::Staging,
            "production" => Environment::Production,
            other => {
                return Err(anyhow!(
                    "unsupported environment '{}'; expected local/staging/production",
                    other
                ));
            }
        };

        settings.validate()?;

        Ok(settings)
    }

    /// Reject configurations the service cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.exchange.places.is_empty() {
            return Err(anyhow!("exchange.places must list at least one place"));
        }
        if self.exchange.places.iter().any(|place| place.trim().is_empty()) {
            return Err(anyhow!("exchange.places must not contain blank entries"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuthSettings {
    /// E-mail addresses granted the admin role at registration.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

/// What happens to the other pending requests on a book once one is accepted.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SiblingPolicy {
    /// Reject them in the same commit as the accept.
    #[default]
    AutoReject,
    /// Leave them pending; accepting one later fails because the book is gone.
    LeavePending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExchangeSettings {
    #[serde(default = "ExchangeSettings::default_places")]
    pub places: Vec<String>,
    #[serde(default)]
    pub sibling_policy: SiblingPolicy,
}

impl ExchangeSettings {
    fn default_places() -> Vec<String> {
        [
            "Professors' Club, 4th floor",
            "Professors' Club, 8th floor",
            "Gym, 1st floor",
            "Main hall, 1st floor",
            "Room B816",
            "Room B422",
            "Room B104",
            "Elbrus auditorium",
            "Sibur corner, 5th floor",
        ]
        .into_iter()
        .map(String::from)
        .collect()
    }
}

impl Default for ExchangeSettings {
    fn default() -> Self {
        Self {
            places: Self::default_places(),
            sibling_policy: SiblingPolicy::default(),
        }
    }
}

/// `BOOKSWAP_*` variables. List values are split on `;` because place names
/// contain commas.
fn environment_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(";")
        .with_list_parse_key("exchange.places")
        .with_list_parse_key("auth.admin_emails")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_places_are_configured() {
        let settings = Settings::default();
        assert_eq!(settings.exchange.places.len(), 9);
        assert!(settings.exchange.places.contains(&"Room B104".to_string()));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn default_sibling_policy_is_auto_reject() {
        assert_eq!(
            Settings::default().exchange.sibling_policy,
            SiblingPolicy::AutoReject
        );
    }

    #[test]
    fn empty_place_list_is_rejected() {
        let mut settings = Settings::default();
        settings.exchange.places.clear();
        assert!(settings.validate().is_err());

        settings.exchange.places = vec!["  ".to_string()];
        assert!(settings.validate().is_err());
    }

    #[test]
    fn place_list_variable_keeps_commas_inside_names() {
        let vars = [(
            "BOOKSWAP_EXCHANGE__PLACES".to_string(),
            "Professors' Club, 4th floor;Room B104".to_string(),
        )]
        .into_iter()
        .collect();
        let cfg = config::Config::builder()
            .add_source(environment_source().source(Some(vars)))
            .build()
            .unwrap();

        let places: Vec<String> = cfg.get("exchange.places").unwrap();
        assert_eq!(places, vec!["Professors' Club, 4th floor", "Room B104"]);
    }

    #[test]
    fn sibling_policy_deserializes_snake_case() {
        let policy: SiblingPolicy = serde_json::from_str("\"leave_pending\"").unwrap();
        assert_eq!(policy, SiblingPolicy::LeavePending);
    }
}
