use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub primary: Option<PrimaryProviderConfig>,
    #[serde(default)]
    pub fallback: Option<FallbackProviderConfig>,
    #[serde(default)]
    pub router: RouterConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// OpenAI-compatible provider used with rotating API keys
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrimaryProviderConfig {
    #[serde(default = "default_primary_name")]
    pub name: String,
    #[serde(default = "default_primary_base_url")]
    pub base_url: String,
    #[serde(default = "default_primary_model")]
    pub model: String,
    /// Entries may be `${VAR}` references; a referenced value may hold
    /// several comma-separated keys.
    #[serde(default)]
    pub api_keys: Vec<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u16,
}

impl Default for PrimaryProviderConfig {
    fn default() -> Self {
        Self {
            name: default_primary_name(),
            base_url: default_primary_base_url(),
            model: default_primary_model(),
            api_keys: Vec::new(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

/// Text-generation inference endpoint used once the primary is exhausted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackProviderConfig {
    #[serde(default = "default_fallback_name")]
    pub name: String,
    #[serde(default = "default_fallback_base_url")]
    pub base_url: String,
    #[serde(default = "default_fallback_model")]
    pub model: String,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_new_tokens: u16,
}

impl Default for FallbackProviderConfig {
    fn default() -> Self {
        Self {
            name: default_fallback_name(),
            base_url: default_fallback_base_url(),
            model: default_fallback_model(),
            token: None,
            temperature: default_temperature(),
            max_new_tokens: default_max_tokens(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Deadline for a single provider attempt
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

// Default functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_primary_name() -> String {
    "groq".to_string()
}

fn default_primary_base_url() -> String {
    "https://api.groq.com/openai/v1".to_string()
}

fn default_primary_model() -> String {
    "llama-3.3-70b-versatile".to_string()
}

fn default_fallback_name() -> String {
    "huggingface".to_string()
}

fn default_fallback_base_url() -> String {
    "https://api-inference.huggingface.co".to_string()
}

fn default_fallback_model() -> String {
    "meta-llama/Meta-Llama-3-70B-Instruct".to_string()
}

fn default_temperature() -> f64 {
    0.7
}

fn default_max_tokens() -> u16 {
    4096
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
