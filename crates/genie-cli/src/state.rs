use anyhow::Context;
use genie_api::{ApiClient, ApiSettings};
use genie_auth::Session;
use genie_config::{AppConfig, ConcurrentMutations, ConfigManager};
use genie_mail::{MailboxState, MutationPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub(crate) fn load_config(path: Option<PathBuf>) -> anyhow::Result<(ConfigManager, AppConfig)> {
    let config_manager = match path {
        Some(path) => ConfigManager::at(path),
        None => ConfigManager::new(),
    }
    .context("initialize config manager")?;
    let config = config_manager.load().context("load app config")?;
    Ok((config_manager, config))
}

pub struct AppState {
    pub(crate) config_manager: ConfigManager,
    pub(crate) config: AppConfig,
    pub(crate) api: Arc<ApiClient>,
    pub(crate) session: Session,
    pub(crate) mailbox: MailboxState,
}

impl AppState {
    pub fn new(config_manager: ConfigManager, config: AppConfig) -> anyhow::Result<Self> {
        let settings = api_settings_from_config(&config)?;
        let api = Arc::new(ApiClient::new(settings).context("build api client")?);
        let mailbox = MailboxState::new(api.clone())
            .with_policy(mutation_policy(config.mailbox.concurrent_mutations));

        Ok(Self {
            config_manager,
            config,
            api,
            session: Session::new(),
            mailbox,
        })
    }
}

pub(crate) fn api_settings_from_config(config: &AppConfig) -> anyhow::Result<ApiSettings> {
    let base_url = config.api_base_url().context("parse api base url")?;
    Ok(ApiSettings {
        base_url,
        timeout: config
            .api
            .timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs),
        user_agent: Some(config.api.user_agent.trim().to_string())
            .filter(|agent| !agent.is_empty()),
    })
}

fn mutation_policy(setting: ConcurrentMutations) -> MutationPolicy {
    match setting {
        ConcurrentMutations::Queue => MutationPolicy::Queue,
        ConcurrentMutations::Reject => MutationPolicy::Reject,
    }
}
