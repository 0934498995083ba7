//! Connection configuration
//!
//! Loaded from TOML or assembled in code with the `with_*` setters. Every
//! field has a default, so an empty file is a valid config.

use crate::error::EstError;
use crate::query::RangeMapping;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Https,
}

impl Protocol {
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Http => "http",
            Protocol::Https => "https",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Protocol {
    type Err = EstError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "http" => Ok(Protocol::Http),
            "https" => Ok(Protocol::Https),
            other => Err(EstError::Configuration(format!(
                "unsupported protocol '{}', expected http or https",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Basic-auth user; no `Authorization` header is sent without one
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Index applied to every fresh query builder
    #[serde(default)]
    pub default_table: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub range_mapping: RangeMapping,
    /// Fail the request on a malformed `Where` instead of skipping it
    #[serde(default = "default_true")]
    pub strict_conditions: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    9200
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_true() -> bool {
    true
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            host: default_host(),
            port: default_port(),
            user: None,
            password: None,
            default_table: None,
            timeout_secs: default_timeout_secs(),
            range_mapping: RangeMapping::default(),
            strict_conditions: default_true(),
        }
    }
}

impl ClientConfig {
    /// Load config from a TOML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| EstError::ConfigFile(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| EstError::ConfigFile(e.to_string()))
    }

    pub fn with_protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_default_table(mut self, table: impl Into<String>) -> Self {
        self.default_table = Some(table.into());
        self
    }

    pub fn with_range_mapping(mut self, mapping: RangeMapping) -> Self {
        self.range_mapping = mapping;
        self
    }

    pub fn with_strict_conditions(mut self, strict: bool) -> Self {
        self.strict_conditions = strict;
        self
    }

    /// `scheme://host:port`
    pub fn base_url(&self) -> String {
        format!("{}://{}:{}", self.protocol, self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:9200");
        assert!(config.strict_conditions);
        assert_eq!(config.range_mapping, RangeMapping::Standard);
        assert!(config.user.is_none());
        assert!(config.default_table.is_none());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ClientConfig::from_toml("").unwrap();
        assert_eq!(config.port, 9200);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn test_full_toml() {
        let config = ClientConfig::from_toml(
            r#"
protocol = "https"
host = "es.internal"
port = 9243
user = "elastic"
password = "secret"
default_table = "logs"
range_mapping = "legacy"
strict_conditions = false
"#,
        )
        .unwrap();
        assert_eq!(config.base_url(), "https://es.internal:9243");
        assert_eq!(config.user.as_deref(), Some("elastic"));
        assert_eq!(config.default_table.as_deref(), Some("logs"));
        assert_eq!(config.range_mapping, RangeMapping::Legacy);
        assert!(!config.strict_conditions);
    }

    #[test]
    fn test_invalid_protocol_rejected() {
        assert!(matches!(
            ClientConfig::from_toml(r#"protocol = "ftp""#),
            Err(EstError::ConfigFile(_))
        ));
        assert!(matches!(
            "gopher".parse::<Protocol>(),
            Err(EstError::Configuration(_))
        ));
        assert_eq!("HTTPS".parse::<Protocol>().unwrap(), Protocol::Https);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "host = \"10.0.0.5\"\nport = 9201").unwrap();
        let config = ClientConfig::load_from(file.path()).unwrap();
        assert_eq!(config.base_url(), "http://10.0.0.5:9201");
    }

    #[test]
    fn test_load_missing_file() {
        let result = ClientConfig::load_from(Path::new("/nonexistent/est.toml"));
        assert!(matches!(result, Err(EstError::ConfigFile(_))));
    }

    #[test]
    fn test_builder_setters() {
        let config = ClientConfig::default()
            .with_protocol(Protocol::Https)
            .with_host("search")
            .with_port(443)
            .with_credentials("u", "p")
            .with_default_table("t");
        assert_eq!(config.base_url(), "https://search:443");
        assert_eq!(config.password.as_deref(), Some("p"));
        assert_eq!(config.default_table.as_deref(), Some("t"));
    }
}
