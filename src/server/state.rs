use crate::config::Config;
use crate::crawler::build_http_client;
use crate::jobs::{JobSettings, JobSupervisor};
use crate::storage::JobRegistry;
use crate::ScraperError;
use reqwest::Client;
use std::sync::Arc;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub client: Client,
    pub supervisor: JobSupervisor,
}

impl AppState {
    /// Builds the HTTP client, registry and supervisor for `config`
    pub fn new(config: Config) -> Result<Self, ScraperError> {
        let client = build_http_client(&config.fetch)?;
        let supervisor = JobSupervisor::new(
            JobRegistry::new(),
            client.clone(),
            JobSettings::from_config(&config),
        );

        Ok(Self {
            config: Arc::new(config),
            client,
            supervisor,
        })
    }

    pub fn registry(&self) -> &JobRegistry {
        self.supervisor.registry()
    }
}
