//! Client configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use vft_crypto::{DEFAULT_SS58_PREFIX, MAX_SS58_PREFIX};
use vft_types::{ProgramId, TokenAmount};
use vft_utils::LogFormat;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(String),

    #[error("malformed config: {0}")]
    Parse(String),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Configuration for a VFT client.
///
/// Can be loaded from a TOML file via [`ClientConfig::from_toml_file`] or
/// built programmatically (e.g. for tests). Every field has a default except
/// `program_id`, which commands that talk to the program must have.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// JSON-RPC gateway that relays calls to the token program.
    #[serde(default = "default_gateway_url")]
    pub gateway_url: String,

    /// WebSocket endpoint for program events.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,

    /// The token program.
    #[serde(default)]
    pub program_id: Option<ProgramId>,

    /// Network prefix used when rendering SS58 addresses.
    #[serde(default = "default_ss58_prefix")]
    pub ss58_prefix: u16,

    /// Amount used by `mint` when none is given.
    #[serde(default = "default_amount")]
    pub mint_amount: String,

    /// Amount used by `burn` when none is given.
    #[serde(default = "default_amount")]
    pub burn_amount: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// Log format: "human" or "json".
    #[serde(default)]
    pub log_format: LogFormat,

    /// Log level filter: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// ── Serde default helpers ──────────────────────────────────────────────

fn default_gateway_url() -> String {
    "http://127.0.0.1:7077".to_string()
}

fn default_ws_url() -> String {
    "ws://127.0.0.1:7078/ws".to_string()
}

fn default_ss58_prefix() -> u16 {
    DEFAULT_SS58_PREFIX
}

fn default_amount() -> String {
    "1000".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

// ── Impl ───────────────────────────────────────────────────────────────

impl ClientConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Serialize the configuration to a TOML string.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Check values that deserialize fine but cannot work.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.gateway_url.starts_with("http://") || self.gateway_url.starts_with("https://")) {
            return Err(ConfigError::Invalid(format!(
                "gateway_url must be http(s), got {}",
                self.gateway_url
            )));
        }
        if !(self.ws_url.starts_with("ws://") || self.ws_url.starts_with("wss://")) {
            return Err(ConfigError::Invalid(format!(
                "ws_url must be ws(s), got {}",
                self.ws_url
            )));
        }
        if self.ss58_prefix > MAX_SS58_PREFIX {
            return Err(ConfigError::Invalid(format!(
                "ss58_prefix {} exceeds {MAX_SS58_PREFIX}",
                self.ss58_prefix
            )));
        }
        for (name, amount) in [("mint_amount", &self.mint_amount), ("burn_amount", &self.burn_amount)] {
            TokenAmount::parse_positive(amount)
                .map_err(|e| ConfigError::Invalid(format!("{name}: {e}")))?;
        }
        if self.request_timeout_secs == 0 || self.connect_timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeouts must be non-zero".into()));
        }
        Ok(())
    }

    pub fn require_program_id(&self) -> Result<ProgramId, ConfigError> {
        self.program_id
            .ok_or_else(|| ConfigError::Invalid("program_id is not set".into()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: default_gateway_url(),
            ws_url: default_ws_url(),
            program_id: None,
            ss58_prefix: default_ss58_prefix(),
            mint_amount: default_amount(),
            burn_amount: default_amount(),
            request_timeout_secs: default_request_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            log_format: LogFormat::default(),
            log_level: default_log_level(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PROGRAM: &str = "0x8eaf04151687736326c9fea17e25fc5287613693c912909cb226aa4794f26a48";

    #[test]
    fn default_config_round_trips_through_toml() {
        let config = ClientConfig {
            program_id: Some(PROGRAM.parse().unwrap()),
            ..ClientConfig::default()
        };
        let toml_str = config.to_toml_string().unwrap();
        let parsed = ClientConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed, config);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = ClientConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config, ClientConfig::default());
        assert_eq!(config.gateway_url, "http://127.0.0.1:7077");
        assert_eq!(config.ss58_prefix, 42);
        assert_eq!(config.mint_amount, "1000");
        assert_eq!(config.log_format, LogFormat::Human);
        assert!(config.validate().is_ok());
        assert!(config.require_program_id().is_err());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = format!(
            r#"
            program_id = "{PROGRAM}"
            burn_amount = "25"
            log_format = "json"
        "#
        );
        let config = ClientConfig::from_toml_str(&toml).expect("should parse");
        assert_eq!(config.require_program_id().unwrap().to_hex(), PROGRAM);
        assert_eq!(config.burn_amount, "25");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.mint_amount, "1000"); // default
    }

    #[test]
    fn bad_program_id_is_parse_error() {
        let err = ClientConfig::from_toml_str(r#"program_id = "0x1234""#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn validate_rejects_unusable_values() {
        let mut config = ClientConfig {
            gateway_url: "ftp://gateway".into(),
            ..ClientConfig::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        config = ClientConfig {
            mint_amount: "0".into(),
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());

        config = ClientConfig {
            ss58_prefix: 16384,
            ..ClientConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"gateway_url = "https://gateway.example""#).unwrap();
        let config = ClientConfig::from_toml_file(file.path()).unwrap();
        assert_eq!(config.gateway_url, "https://gateway.example");
    }

    #[test]
    fn missing_file_returns_io_error() {
        let result = ClientConfig::from_toml_file("/nonexistent/vft.toml");
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
