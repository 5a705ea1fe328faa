use crate::ConfigError;
use serde::{Deserialize, Serialize};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub version: u32,
    pub api: ApiConfig,
    #[serde(default)]
    pub mailbox: MailboxConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: Option<u64>,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrentMutations {
    Queue,
    Reject,
}

impl Default for ConcurrentMutations {
    fn default() -> Self {
        Self::Queue
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MailboxConfig {
    pub default_view: String,
    #[serde(default)]
    pub default_days: Option<u32>,
    #[serde(default)]
    pub concurrent_mutations: ConcurrentMutations,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    pub filter: String,
}

impl AppConfig {
    /// Parsed form of `api.base_url`.
    pub fn api_base_url(&self) -> Result<Url, ConfigError> {
        Url::parse(self.api.base_url.trim()).map_err(|source| ConfigError::BaseUrl {
            value: self.api.base_url.clone(),
            source,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            api: ApiConfig::default(),
            mailbox: MailboxConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout_secs: default_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for MailboxConfig {
    fn default() -> Self {
        Self {
            default_view: "inbox".to_string(),
            default_days: None,
            concurrent_mutations: ConcurrentMutations::Queue,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

fn default_timeout_secs() -> Option<u64> {
    Some(30)
}

fn default_user_agent() -> String {
    format!("inboxgenie/{}", env!("CARGO_PKG_VERSION"))
}
