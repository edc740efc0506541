//! Configuration management
//!
//! Settings are resolved in this order (later wins):
//! 1. built-in defaults
//! 2. `messenger-relay.toml` (or the file passed with `--config`)
//! 3. environment variables
//!
//! The three secrets (verify token, page access token, completion API key)
//! have no defaults; `validate` refuses to start without them.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "messenger-relay.toml";

/// Facebook Messenger settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct FacebookConfig {
    /// Token echoed back by the platform during the webhook handshake
    pub verify_token: String,

    /// Page access token used for the Send API
    pub page_access_token: String,

    /// Graph API base URL, including the version segment
    pub graph_api_url: String,
}

impl Default for FacebookConfig {
    fn default() -> Self {
        Self {
            verify_token: String::new(),
            page_access_token: String::new(),
            graph_api_url: default_graph_api_url(),
        }
    }
}

// Hand-written so secrets never end up in logs.
impl fmt::Debug for FacebookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacebookConfig")
            .field("verify_token", &redact(&self.verify_token))
            .field("page_access_token", &redact(&self.page_access_token))
            .field("graph_api_url", &self.graph_api_url)
            .finish()
    }
}

/// Chat-completion API settings
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// API key
    pub api_key: String,

    /// Model to use
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    pub base_url: String,

    /// Upper bound on generated tokens
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_llm_base_url(),
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

impl fmt::Debug for LlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmConfig")
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// HTTP listener settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,

    /// Timeout applied to every outbound HTTP call
    pub http_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            http_timeout_secs: 30,
        }
    }
}

/// Context document settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    pub path: String,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            path: "docs/info.md".to_string(),
        }
    }
}

/// Main configuration for the relay
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub facebook: FacebookConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub context: ContextConfig,
}

fn default_graph_api_url() -> String {
    "https://graph.facebook.com/v12.0".to_string()
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn redact(secret: &str) -> &'static str {
    if secret.is_empty() { "<unset>" } else { "<redacted>" }
}

impl Config {
    /// Load configuration for the running process
    ///
    /// Reads `path` if given, otherwise `messenger-relay.toml` when it exists,
    /// then applies environment overrides and validates the result.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_toml_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without validating it
    pub fn from_toml_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML content without validating it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Override settings from a key lookup (normally `std::env::var`)
    ///
    /// Empty values are treated as unset.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("FACEBOOK_VERIFY_TOKEN") {
            self.facebook.verify_token = v;
        }
        if let Some(v) = get("FACEBOOK_PAGE_ACCESS_TOKEN") {
            self.facebook.page_access_token = v;
        }
        if let Some(v) = get("FACEBOOK_GRAPH_API_URL") {
            self.facebook.graph_api_url = v;
        }

        if let Some(v) = get("OPENAI_API_KEY") {
            self.llm.api_key = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.llm.model = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.llm.base_url = v;
        }

        if let Some(v) = get("HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", v)))?;
        }
        if let Some(v) = get("HTTP_TIMEOUT_SECS") {
            self.server.http_timeout_secs = v.trim().parse().map_err(|_| {
                Error::Config(format!("HTTP_TIMEOUT_SECS is not a number: {}", v))
            })?;
        }

        if let Some(v) = get("CONTEXT_PATH") {
            self.context.path = v;
        }

        Ok(())
    }

    /// Check that every required secret is present and values are sane
    pub fn validate(&self) -> Result<()> {
        let missing: Vec<&str> = [
            ("FACEBOOK_VERIFY_TOKEN", &self.facebook.verify_token),
            ("FACEBOOK_PAGE_ACCESS_TOKEN", &self.facebook.page_access_token),
            ("OPENAI_API_KEY", &self.llm.api_key),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(Error::Config(format!(
                "missing required settings: {}",
                missing.join(", ")
            )));
        }

        if self.llm.max_tokens == 0 {
            return Err(Error::Config("llm.max_tokens must be positive".to_string()));
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(Error::Config(format!(
                "llm.temperature must be within 0.0..=2.0, got {}",
                self.llm.temperature
            )));
        }
        if self.server.http_timeout_secs == 0 {
            return Err(Error::Config(
                "server.http_timeout_secs must be positive".to_string(),
            ));
        }

        Ok(())
    }

    /// Timeout for outbound HTTP calls
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.server.http_timeout_secs)
    }

    /// Listener address in `host:port` form
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn secrets() -> Vec<(&'static str, &'static str)> {
        vec![
            ("FACEBOOK_VERIFY_TOKEN", "verify"),
            ("FACEBOOK_PAGE_ACCESS_TOKEN", "page-token"),
            ("OPENAI_API_KEY", "sk-test"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.facebook.graph_api_url, "https://graph.facebook.com/v12.0");
        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert_eq!(config.llm.base_url, "https://api.openai.com/v1");
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.llm.temperature, 0.7);
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.context.path, "docs/info.md");
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_env_overrides_and_validate() {
        let mut config = Config::default();
        let mut vars = secrets();
        vars.push(("PORT", "8080"));
        vars.push(("OPENAI_MODEL", "gpt-4o-mini"));
        vars.push(("CONTEXT_PATH", "/srv/info.md"));

        config.apply_overrides(lookup(&vars)).unwrap();
        config.validate().unwrap();

        assert_eq!(config.facebook.verify_token, "verify");
        assert_eq!(config.facebook.page_access_token, "page-token");
        assert_eq!(config.llm.api_key, "sk-test");
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.context.path, "/srv/info.md");
        assert_eq!(config.bind_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_missing_secrets_are_all_reported() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("FACEBOOK_VERIFY_TOKEN", "verify")]))
            .unwrap();

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("FACEBOOK_PAGE_ACCESS_TOKEN"));
        assert!(err.contains("OPENAI_API_KEY"));
        assert!(!err.contains("FACEBOOK_VERIFY_TOKEN"));
    }

    #[test]
    fn test_empty_env_value_is_ignored() {
        let mut config = Config::default();
        config
            .apply_overrides(lookup(&[("OPENAI_MODEL", ""), ("OPENAI_API_KEY", "   ")]))
            .unwrap();

        assert_eq!(config.llm.model, "gpt-3.5-turbo");
        assert!(config.llm.api_key.is_empty());
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_overrides(lookup(&[("PORT", "not-a-port")]));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_toml_config_parsing() {
        let toml_content = r#"
[facebook]
verify_token = "file-verify"
page_access_token = "file-page"

[llm]
api_key = "file-key"
model = "gpt-4o"
temperature = 0.2

[server]
port = 9000

[context]
path = "docs/products.md"
"#;

        let config = Config::from_toml_str(toml_content).unwrap();
        config.validate().unwrap();

        assert_eq!(config.facebook.verify_token, "file-verify");
        assert_eq!(config.facebook.graph_api_url, "https://graph.facebook.com/v12.0");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.llm.temperature, 0.2);
        assert_eq!(config.llm.max_tokens, 500);
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.context.path, "docs/products.md");
    }

    #[test]
    fn test_env_wins_over_file() {
        let mut config = Config::from_toml_str("[server]\nport = 9000\n").unwrap();
        config.apply_overrides(lookup(&[("PORT", "7000")])).unwrap();
        assert_eq!(config.server.port, 7000);
    }

    #[test]
    fn test_out_of_range_temperature() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&secrets())).unwrap();
        config.llm.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut config = Config::default();
        config.apply_overrides(lookup(&secrets())).unwrap();

        let debug = format!("{:?}", config);
        assert!(!debug.contains("page-token"));
        assert!(!debug.contains("sk-test"));
        assert!(debug.contains("<redacted>"));
    }
}
