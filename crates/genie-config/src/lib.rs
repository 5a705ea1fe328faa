mod error;
mod manager;
mod model;

pub use error::ConfigError;
pub use manager::{apply_env_overrides, ConfigManager, API_BASE_URL_ENV};
pub use model::*;
