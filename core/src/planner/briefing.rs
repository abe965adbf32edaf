use crate::agent::context::TRAVEL_ASSISTANT_PERSONA;
use crate::config::{self, Config, SamplingConfig};
use crate::error::{Error, Result};
use crate::providers::{AzureOpenAIClient, DataSource, create_entra_model_client};
use crate::traits::{CompletionRequest, Message};
use tracing::info;

pub struct Briefing {
    client: AzureOpenAIClient,
    sampling: SamplingConfig,
}

impl Briefing {
    pub fn new(client: AzureOpenAIClient, sampling: SamplingConfig) -> Self {
        Self { client, sampling }
    }

    pub async fn from_config(config: &Config) -> Result<Self> {
        let endpoint = config::non_empty(&config.azure_search_endpoint);
        let index = config::non_empty(&config.azure_search_index);
        let (Some(endpoint), Some(index)) = (endpoint, index) else {
            return Err(Error::Configuration(
                "AZURE_AI_SEARCH_ENDPOINT and AZURE_AI_SEARCH_INDEX must be set".into(),
            ));
        };

        let client = create_entra_model_client(config)
            .await?
            .with_data_source(DataSource::azure_search(endpoint, index));

        Ok(Self::new(client, config.chat))
    }

    pub async fn run(&self) -> Result<String> {
        let messages = [Message::developer(TRAVEL_ASSISTANT_PERSONA)];
        info!(deployment = %self.client.deployment(), "requesting grounded briefing");

        let body = self
            .client
            .complete_raw(CompletionRequest {
                messages: &messages,
                tools: None,
                sampling: self.sampling,
            })
            .await?;

        serde_json::to_string_pretty(&body).map_err(|e| Error::malformed("Azure OpenAI", e))
    }
}
