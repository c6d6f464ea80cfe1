//! Provider configuration.
//!
//! | Variable | Description |
//! |----------|-------------|
//! | `NUBARIUM_API_KEY` | API key for token generation (basic auth user) |
//! | `NUBARIUM_API_SECRET` | API secret for token generation (basic auth password) |
//! | `NUBARIUM_TIMEOUT` | Per-request timeout in seconds (default: 30) |
//! | `NUBARIUM_TOKEN_TTL` | `expireAfter` hint sent with token requests (default: 3600) |
//! | `NUBARIUM_CONCURRENT_STEPS` | Run curp/INE/blocklist concurrently (default: off) |
//! | `NUBARIUM_{API,CURP,INE,OCR,BIOMETRICS,SDK}_URL` | Base URL overrides |

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Base URLs, one per provider host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endpoints {
    /// Blocklist lookups.
    #[serde(default = "default_api_url")]
    pub api: String,

    /// RENAPO CURP validation.
    #[serde(default = "default_curp_url")]
    pub curp: String,

    /// INE nominal-list validation.
    #[serde(default = "default_ine_url")]
    pub ine: String,

    /// Document OCR.
    #[serde(default = "default_ocr_url")]
    pub ocr: String,

    /// Face match.
    #[serde(default = "default_biometrics_url")]
    pub biometrics: String,

    /// Token generation.
    #[serde(default = "default_sdk_url")]
    pub sdk: String,
}

fn default_api_url() -> String {
    "https://api.nubarium.com".to_string()
}

fn default_curp_url() -> String {
    "https://curp.nubarium.com".to_string()
}

fn default_ine_url() -> String {
    "https://ine.nubarium.com".to_string()
}

fn default_ocr_url() -> String {
    "https://ocr.nubarium.com".to_string()
}

fn default_biometrics_url() -> String {
    "https://biometrics.nubarium.com".to_string()
}

fn default_sdk_url() -> String {
    "https://api.sdk.nubarium.com".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            api: default_api_url(),
            curp: default_curp_url(),
            ine: default_ine_url(),
            ocr: default_ocr_url(),
            biometrics: default_biometrics_url(),
            sdk: default_sdk_url(),
        }
    }
}

impl Endpoints {
    /// Point every capability at the same host (mock servers, gateways).
    pub fn uniform(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            api: base.clone(),
            curp: base.clone(),
            ine: base.clone(),
            ocr: base.clone(),
            biometrics: base.clone(),
            sdk: base,
        }
    }

    fn iter(&self) -> [(&'static str, &str); 6] {
        [
            ("api", &self.api),
            ("curp", &self.curp),
            ("ine", &self.ine),
            ("ocr", &self.ocr),
            ("biometrics", &self.biometrics),
            ("sdk", &self.sdk),
        ]
    }

    fn apply_env_overrides(&mut self) {
        let overrides: [(&str, &mut String); 6] = [
            ("NUBARIUM_API_URL", &mut self.api),
            ("NUBARIUM_CURP_URL", &mut self.curp),
            ("NUBARIUM_INE_URL", &mut self.ine),
            ("NUBARIUM_OCR_URL", &mut self.ocr),
            ("NUBARIUM_BIOMETRICS_URL", &mut self.biometrics),
            ("NUBARIUM_SDK_URL", &mut self.sdk),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    *slot = value;
                }
            }
        }
    }
}

/// Provider client configuration.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// API key (basic auth user for token generation).
    #[serde(default)]
    pub api_key: String,

    /// API secret (basic auth password for token generation).
    #[serde(default)]
    pub api_secret: String,

    /// Base URLs per capability.
    #[serde(default)]
    pub endpoints: Endpoints,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Token lifetime requested from the provider.
    #[serde(default = "default_token_ttl")]
    pub token_ttl_secs: u64,

    /// Issue curp, INE and blocklist calls concurrently once OCR is done.
    #[serde(default)]
    pub concurrent_dependent_steps: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_token_ttl() -> u64 {
    3600
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            endpoints: Endpoints::default(),
            timeout_secs: default_timeout(),
            token_ttl_secs: default_token_ttl(),
            concurrent_dependent_steps: false,
        }
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("endpoints", &self.endpoints)
            .field("timeout_secs", &self.timeout_secs)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field(
                "concurrent_dependent_steps",
                &self.concurrent_dependent_steps,
            )
            .finish()
    }
}

impl ProviderConfig {
    /// Create config from environment variables (see module docs).
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        cfg.fill_from_env();
        cfg
    }

    /// Load a YAML config file; environment variables fill unset credentials
    /// and override base URLs.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut cfg: Self = serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        cfg.fill_from_env();
        Ok(cfg)
    }

    fn fill_from_env(&mut self) {
        if self.api_key.is_empty() {
            self.api_key = std::env::var("NUBARIUM_API_KEY").unwrap_or_default();
        }
        if self.api_secret.is_empty() {
            self.api_secret = std::env::var("NUBARIUM_API_SECRET").unwrap_or_default();
        }
        if let Some(secs) = env_parse("NUBARIUM_TIMEOUT") {
            self.timeout_secs = secs;
        }
        if let Some(secs) = env_parse("NUBARIUM_TOKEN_TTL") {
            self.token_ttl_secs = secs;
        }
        if let Ok(v) = std::env::var("NUBARIUM_CONCURRENT_STEPS") {
            self.concurrent_dependent_steps = v == "1" || v.eq_ignore_ascii_case("true");
        }
        self.endpoints.apply_env_overrides();
    }

    /// Check credentials are set and every base URL is an http(s) URL.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_empty() {
            return Err(ConfigError::MissingCredential {
                name: "NUBARIUM_API_KEY",
            });
        }
        if self.api_secret.is_empty() {
            return Err(ConfigError::MissingCredential {
                name: "NUBARIUM_API_SECRET",
            });
        }
        for (name, value) in self.endpoints.iter() {
            let parsed = url::Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
                name,
                value: value.to_string(),
                reason: e.to_string(),
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(ConfigError::InvalidUrl {
                    name,
                    value: value.to_string(),
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                });
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Set the API credentials.
    pub fn with_credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.api_key = key.into();
        self.api_secret = secret.into();
        self
    }

    /// Set the base URLs.
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Set the request timeout.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enable or disable concurrent dependent steps.
    pub fn with_concurrent_dependent_steps(mut self, concurrent: bool) -> Self {
        self.concurrent_dependent_steps = concurrent;
        self
    }
}

fn env_parse(var: &str) -> Option<u64> {
    std::env::var(var).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    const ENV_VARS: [&str; 11] = [
        "NUBARIUM_API_KEY",
        "NUBARIUM_API_SECRET",
        "NUBARIUM_TIMEOUT",
        "NUBARIUM_TOKEN_TTL",
        "NUBARIUM_CONCURRENT_STEPS",
        "NUBARIUM_API_URL",
        "NUBARIUM_CURP_URL",
        "NUBARIUM_INE_URL",
        "NUBARIUM_OCR_URL",
        "NUBARIUM_BIOMETRICS_URL",
        "NUBARIUM_SDK_URL",
    ];

    fn clear_env() {
        for var in ENV_VARS {
            std::env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_config_from_env_defaults() {
        clear_env();

        let config = ProviderConfig::from_env();
        assert_eq!(config.endpoints, Endpoints::default());
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.token_ttl_secs, 3600);
        assert!(!config.concurrent_dependent_steps);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredential {
                name: "NUBARIUM_API_KEY"
            })
        ));
    }

    #[test]
    #[serial]
    fn test_config_from_env_overrides() {
        clear_env();
        std::env::set_var("NUBARIUM_API_KEY", "key");
        std::env::set_var("NUBARIUM_API_SECRET", "secret");
        std::env::set_var("NUBARIUM_TIMEOUT", "5");
        std::env::set_var("NUBARIUM_CONCURRENT_STEPS", "true");
        std::env::set_var("NUBARIUM_OCR_URL", "http://localhost:9000");

        let config = ProviderConfig::from_env();
        clear_env();

        assert_eq!(config.api_key, "key");
        assert_eq!(config.api_secret, "secret");
        assert_eq!(config.timeout(), Duration::from_secs(5));
        assert!(config.concurrent_dependent_steps);
        assert_eq!(config.endpoints.ocr, "http://localhost:9000");
        assert_eq!(config.endpoints.curp, "https://curp.nubarium.com");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_config_from_yaml_file() {
        clear_env();
        std::env::set_var("NUBARIUM_API_SECRET", "from-env");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "api_key: yaml-key\ntimeout_secs: 10\nendpoints:\n  ine: https://ine.example.test"
        )
        .unwrap();

        let config = ProviderConfig::from_yaml_file(file.path()).unwrap();
        clear_env();

        assert_eq!(config.api_key, "yaml-key");
        assert_eq!(config.api_secret, "from-env");
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.endpoints.ine, "https://ine.example.test");
        assert_eq!(config.endpoints.ocr, "https://ocr.nubarium.com");
    }

    #[test]
    fn test_config_from_missing_file() {
        let result = ProviderConfig::from_yaml_file("/nonexistent/idflow.yaml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_validate_rejects_bad_urls() {
        let config = ProviderConfig::default()
            .with_credentials("k", "s")
            .with_endpoints(Endpoints {
                curp: "not a url".into(),
                ..Endpoints::default()
            });
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { name: "curp", .. })
        ));

        let config = ProviderConfig::default()
            .with_credentials("k", "s")
            .with_endpoints(Endpoints::uniform("ftp://files.example.test"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidUrl { name: "api", .. })
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = ProviderConfig::default().with_credentials("key", "very-secret");
        let rendered = format!("{:?}", config);
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("very-secret"));
    }
}
