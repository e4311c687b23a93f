/// Configuration management for the Hetzner Cloud client
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use url::Url;

use crate::error::{Error, Result};

/// The only API version the provider currently serves
pub const SUPPORTED_API_VERSION: u32 = 1;

/// Default API endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.hetzner.cloud";

/// Environment variable holding the API token
pub const TOKEN_ENV: &str = "HCLOUD_TOKEN";

/// Environment variable overriding the API version
pub const API_VERSION_ENV: &str = "HCLOUD_API_VERSION";

/// Environment variable overriding the API endpoint
pub const ENDPOINT_ENV: &str = "HCLOUD_ENDPOINT";

/// Client configuration: credentials, API version and endpoint.
///
/// Validation is deferred until the value is handed to
/// [`HetznerCloudClient::new`](crate::HetznerCloudClient::new); after that it
/// is shared read-only by every collection and entity.
#[derive(Clone)]
pub struct Configuration {
    api_key: String,
    api_version: u32,
    base_url: Url,
}

/// On-disk configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Hetzner Cloud API token (can also be set via HCLOUD_TOKEN env var)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// API version, defaults to 1
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_version: Option<u32>,

    /// API endpoint, defaults to https://api.hetzner.cloud
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl Configuration {
    /// Create a configuration for the given API key with default version and endpoint
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_version: SUPPORTED_API_VERSION,
            base_url: default_base_url(),
        }
    }

    /// Select the API version
    #[must_use]
    pub fn with_api_version(mut self, version: u32) -> Self {
        self.api_version = version;
        self
    }

    /// Point the client at another endpoint (mostly useful for tests)
    #[must_use]
    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = base_url;
        self
    }

    /// Build a configuration from HCLOUD_TOKEN, HCLOUD_API_VERSION and HCLOUD_ENDPOINT
    pub fn from_env() -> Result<Self> {
        let token = std::env::var(TOKEN_ENV).map_err(|_| {
            Error::Configuration(format!(
                "API token not found. Set the {} environment variable",
                TOKEN_ENV
            ))
        })?;

        let file = ConfigFile {
            token: Some(token),
            api_version: std::env::var(API_VERSION_ENV)
                .ok()
                .map(|v| {
                    v.parse().map_err(|_| {
                        Error::Configuration(format!("{} is not a number: {}", API_VERSION_ENV, v))
                    })
                })
                .transpose()?,
            endpoint: std::env::var(ENDPOINT_ENV).ok(),
        };

        Self::from_config_file(file)
    }

    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let file: ConfigFile = serde_yaml::from_str(&content)
            .map_err(|e| Error::Configuration(format!("cannot parse {}: {}", path.display(), e)))?;

        Self::from_config_file(file)
    }

    fn from_config_file(file: ConfigFile) -> Result<Self> {
        let token = file
            .token
            .or_else(|| std::env::var(TOKEN_ENV).ok())
            .unwrap_or_default();

        let mut config = Self::new(token);
        if let Some(version) = file.api_version {
            config = config.with_api_version(version);
        }
        if let Some(endpoint) = file.endpoint {
            let url = Url::parse(&endpoint)
                .map_err(|e| Error::Configuration(format!("invalid endpoint {}: {}", endpoint, e)))?;
            config = config.with_base_url(url);
        }

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Configuration("Invalid API key.".to_string()));
        }

        if self.api_version != SUPPORTED_API_VERSION {
            return Err(Error::Configuration(
                "The requested API version is not yet supported.".to_string(),
            ));
        }

        Ok(())
    }

    /// API key used for the bearer header
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Selected API version
    pub fn api_version(&self) -> u32 {
        self.api_version
    }

    /// Endpoint the client talks to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Full URL for an endpoint, e.g. `servers/42` => `https://api.hetzner.cloud/v1/servers/42`
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        format!(
            "{}/v{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.api_version,
            endpoint.trim_start_matches('/')
        )
    }
}

impl fmt::Debug for Configuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Configuration")
            .field("api_key", &"<redacted>")
            .field("api_version", &self.api_version)
            .field("base_url", &self.base_url.as_str())
            .finish()
    }
}

fn default_base_url() -> Url {
    Url::parse(DEFAULT_ENDPOINT).expect("default endpoint is a valid URL")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var(TOKEN_ENV);
        std::env::remove_var(API_VERSION_ENV);
        std::env::remove_var(ENDPOINT_ENV);
    }

    #[test]
    fn test_config_validation() {
        let config = Configuration::new("abcdefg");
        assert!(config.validate().is_ok());

        let config = Configuration::new("");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));

        let config = Configuration::new("abcdefg").with_api_version(2);
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_endpoint_url() {
        let config = Configuration::new("token");
        assert_eq!(
            config.endpoint_url("servers/42"),
            "https://api.hetzner.cloud/v1/servers/42"
        );

        let config =
            Configuration::new("token").with_base_url(Url::parse("http://127.0.0.1:8080/").unwrap());
        assert_eq!(
            config.endpoint_url("/ssh_keys"),
            "http://127.0.0.1:8080/v1/ssh_keys"
        );
    }

    #[test]
    fn test_debug_redacts_key() {
        let config = Configuration::new("super-secret");
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("<redacted>"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token: file-token").unwrap();
        writeln!(file, "api_version: 1").unwrap();
        writeln!(file, "endpoint: http://localhost:9000").unwrap();

        let config = Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.api_key(), "file-token");
        assert_eq!(config.api_version(), 1);
        assert_eq!(config.base_url().as_str(), "http://localhost:9000/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_rejects_bad_endpoint() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "token: file-token").unwrap();
        writeln!(file, "endpoint: not a url").unwrap();

        let result = Configuration::from_file(file.path());
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    fn test_missing_file() {
        let result = Configuration::from_file("/nonexistent/hcloud.yaml");
        assert!(matches!(result, Err(Error::Configuration(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_missing_token() {
        clear_env();

        let result = Configuration::from_env();
        assert!(matches!(result, Err(Error::Configuration(ref m)) if m.contains(TOKEN_ENV)));
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_non_numeric_version() {
        clear_env();
        std::env::set_var(TOKEN_ENV, "env-token");
        std::env::set_var(API_VERSION_ENV, "one");

        let result = Configuration::from_env();
        clear_env();
        assert!(matches!(result, Err(Error::Configuration(ref m)) if m.contains(API_VERSION_ENV)));
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        std::env::set_var(TOKEN_ENV, "env-token");
        std::env::set_var(API_VERSION_ENV, "1");
        std::env::set_var(ENDPOINT_ENV, "http://localhost:9000");

        let config = Configuration::from_env().unwrap();
        clear_env();
        assert_eq!(config.api_key(), "env-token");
        assert_eq!(config.api_version(), 1);
        assert_eq!(config.base_url().as_str(), "http://localhost:9000/");
        assert!(config.validate().is_ok());
    }

    #[test]
    #[serial]
    fn test_from_file_falls_back_to_env_token() {
        clear_env();
        std::env::set_var(TOKEN_ENV, "env-token");

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_version: 1").unwrap();

        let config = Configuration::from_file(file.path()).unwrap();
        clear_env();
        assert_eq!(config.api_key(), "env-token");
        assert_eq!(config.base_url().as_str(), "https://api.hetzner.cloud/");
    }

    #[test]
    #[serial]
    fn test_from_file_without_any_token() {
        clear_env();

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "api_version: 1").unwrap();

        let config = Configuration::from_file(file.path()).unwrap();
        assert_eq!(config.api_key(), "");
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }
}
