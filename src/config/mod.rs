use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

/// API credentials. The secret key never leaves the process; it is only used
/// to derive signatures locally.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

/// Immutable per-client settings, fixed at construction
#[derive(Debug, Clone)]
pub struct ClientSettings {
    /// Store endpoint, no trailing slash
    pub base_url: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

/// Store profile with endpoint and credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// Store endpoint URL
    pub endpoint: String,

    /// API access key
    pub access_key: String,

    /// API secret key
    pub secret_key: String,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Total request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    60
}

impl Profile {
    pub fn credentials(&self) -> Credentials {
        Credentials {
            access_key: self.access_key.clone(),
            secret_key: self.secret_key.clone(),
        }
    }

    pub fn settings(&self) -> ClientSettings {
        ClientSettings {
            base_url: self.endpoint.trim_end_matches('/').to_string(),
            connect_timeout: Duration::from_secs(self.connect_timeout),
            request_timeout: Duration::from_secs(self.request_timeout),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Named profiles for different store endpoints
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,

    /// Profile used when none is named explicitly
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
}

impl Config {
    pub fn new() -> Self {
        Self {
            profiles: HashMap::new(),
            default_profile: None,
        }
    }

    /// Get a profile by name, or the default profile if not specified
    pub fn get_profile(&self, name: Option<&str>) -> Option<&Profile> {
        if let Some(name) = name {
            self.profiles.get(name)
        } else if let Some(default) = &self.default_profile {
            self.profiles.get(default)
        } else {
            self.profiles.values().next()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

/// Load configuration from a YAML file
pub fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .context(format!("Failed to read config file: {:?}", path.as_ref()))?;

    let config: Config =
        serde_yaml::from_str(&content).context("Failed to parse YAML configuration")?;

    Ok(config)
}

/// Load configuration from environment variables
///
/// - CUBBY_ENDPOINT (required)
/// - CUBBY_ACCESS_KEY (required)
/// - CUBBY_SECRET_KEY (required)
/// - CUBBY_CONNECT_TIMEOUT (optional, seconds)
/// - CUBBY_REQUEST_TIMEOUT (optional, seconds)
pub fn load_from_env() -> Result<Config> {
    // Try to load .env file if it exists (don't fail if it doesn't)
    let _ = dotenvy::dotenv();

    let endpoint =
        std::env::var("CUBBY_ENDPOINT").context("CUBBY_ENDPOINT environment variable not set")?;
    let access_key = std::env::var("CUBBY_ACCESS_KEY")
        .context("CUBBY_ACCESS_KEY environment variable not set")?;
    let secret_key = std::env::var("CUBBY_SECRET_KEY")
        .context("CUBBY_SECRET_KEY environment variable not set")?;

    let mut profile = Profile {
        endpoint,
        access_key,
        secret_key,
        connect_timeout: default_connect_timeout(),
        request_timeout: default_request_timeout(),
    };

    if let Ok(timeout) = std::env::var("CUBBY_CONNECT_TIMEOUT") {
        if let Ok(val) = timeout.parse() {
            profile.connect_timeout = val;
        }
    }

    if let Ok(timeout) = std::env::var("CUBBY_REQUEST_TIMEOUT") {
        if let Ok(val) = timeout.parse() {
            profile.request_timeout = val;
        }
    }

    let mut config = Config::new();
    config.profiles.insert("default".to_string(), profile);
    config.default_profile = Some("default".to_string());

    Ok(config)
}

/// Load configuration from file or environment
///
/// Tries the YAML file when a path is given, otherwise falls back to
/// environment variables. A requested profile becomes the default.
pub fn load_config(config_path: Option<&str>, profile_name: Option<&str>) -> Result<Config> {
    if let Some(path) = config_path {
        let mut config = load_from_yaml(path)?;

        if let Some(name) = profile_name {
            if !config.profiles.contains_key(name) {
                anyhow::bail!("Profile '{}' not found in config file", name);
            }
            config.default_profile = Some(name.to_string());
        }

        Ok(config)
    } else {
        load_from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_yaml() {
        let yaml = r#"
profiles:
  production:
    endpoint: https://store.example.com
    access_key: ak_prod
    secret_key: sk_prod
    connect_timeout: 5
    request_timeout: 120

default_profile: production
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.profiles.len(), 1);
        let profile = config.profiles.get("production").unwrap();
        assert_eq!(profile.endpoint, "https://store.example.com");
        assert_eq!(profile.access_key, "ak_prod");
        assert_eq!(profile.connect_timeout, 5);
        assert_eq!(profile.request_timeout, 120);
        assert_eq!(config.default_profile, Some("production".to_string()));
    }

    #[test]
    fn test_default_timeouts() {
        let yaml = r#"
profiles:
  minimal:
    endpoint: https://store.example.com
    access_key: key
    secret_key: secret
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();
        let profile = config.profiles.get("minimal").unwrap();

        assert_eq!(profile.connect_timeout, 10);
        assert_eq!(profile.request_timeout, 60);
    }

    #[test]
    fn test_settings_trim_trailing_slash() {
        let profile = Profile {
            endpoint: "https://store.example.com/".to_string(),
            access_key: "k".to_string(),
            secret_key: "s".to_string(),
            connect_timeout: 10,
            request_timeout: 60,
        };
        assert_eq!(profile.settings().base_url, "https://store.example.com");
    }

    #[test]
    fn test_get_profile_fallbacks() {
        let yaml = r#"
profiles:
  a:
    endpoint: https://a.example.com
    access_key: ka
    secret_key: sa
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert!(config.get_profile(Some("a")).is_some());
        assert!(config.get_profile(Some("missing")).is_none());
        // No default set: the only profile wins
        assert_eq!(
            config.get_profile(None).unwrap().endpoint,
            "https://a.example.com"
        );
    }
}
