use crate::config::{self, Config};
use crate::error::{Error, Result};
use crate::providers::token::token_source;
use crate::providers::perplexity::UnconfiguredSearch;
use crate::providers::{AzureAuth, AzureOpenAIClient, PerplexitySearch};
use crate::traits::{ModelClient, SearchProvider};
use std::sync::Arc;
use tracing::warn;

pub fn create_search(config: &Config) -> Result<PerplexitySearch> {
    PerplexitySearch::from_config(config)
}

pub fn create_chat_search(config: &Config) -> Arc<dyn SearchProvider> {
    match create_search(config) {
        Ok(search) => Arc::new(search),
        Err(e) => {
            warn!("web search disabled: {}", e);
            Arc::new(UnconfiguredSearch)
        }
    }
}

pub fn create_model_client(config: &Config) -> Result<AzureOpenAIClient> {
    let (endpoint, deployment) = resolve_deployment(config)
        .ok_or_else(|| Error::Configuration("Azure OpenAI env vars missing".into()))?;
    let api_key = config::non_empty(&config.azure_api_key)
        .ok_or_else(|| Error::Configuration("Azure OpenAI env vars missing".into()))?;

    Ok(
        AzureOpenAIClient::new(endpoint, deployment, AzureAuth::ApiKey(api_key.to_string()))
            .with_api_version(config.azure_api_version.clone()),
    )
}

pub async fn create_entra_model_client(config: &Config) -> Result<AzureOpenAIClient> {
    let (endpoint, deployment) = resolve_deployment(config).ok_or_else(|| {
        Error::Configuration("ENDPOINT_URL and DEPLOYMENT_NAME must be set".into())
    })?;
    let token = token_source(config)?.token().await?;

    Ok(
        AzureOpenAIClient::new(endpoint, deployment, AzureAuth::Bearer(token))
            .with_api_version(config.azure_api_version.clone()),
    )
}

fn resolve_deployment(config: &Config) -> Option<(&str, &str)> {
    let endpoint = config::non_empty(&config.azure_endpoint)?;
    let deployment = config::non_empty(&config.azure_deployment)?;
    Some((endpoint, deployment))
}

/// Missing credentials surface here, before anything touches the network.
pub trait ClientFactory: Send + Sync {
    fn search(&self) -> Result<Arc<dyn SearchProvider>>;

    fn model(&self) -> Result<Arc<dyn ModelClient>>;
}

pub struct ConfiguredClients {
    config: Arc<Config>,
}

impl ConfiguredClients {
    pub fn new(config: Arc<Config>) -> Self {
        Self { config }
    }
}

impl ClientFactory for ConfiguredClients {
    fn search(&self) -> Result<Arc<dyn SearchProvider>> {
        Ok(Arc::new(create_search(&self.config)?))
    }

    fn model(&self) -> Result<Arc<dyn ModelClient>> {
        Ok(Arc::new(create_model_client(&self.config)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn azure_config() -> Config {
        let mut config = Config::default();
        config.azure_endpoint = Some("https://example.openai.azure.com/".into());
        config.azure_deployment = Some("gpt-4.1".into());
        config.azure_api_key = Some("key".into());
        config
    }

    #[test]
    fn model_client_needs_all_three_settings() {
        assert!(create_model_client(&azure_config()).is_ok());

        for strip in 0..3 {
            let mut config = azure_config();
            match strip {
                0 => config.azure_endpoint = None,
                1 => config.azure_deployment = Some(" ".into()),
                _ => config.azure_api_key = None,
            }
            let err = create_model_client(&config).err().unwrap();
            assert_eq!(err.to_string(), "Azure OpenAI env vars missing");
        }
    }

    #[test]
    fn configured_clients_report_missing_search_key() {
        let clients = ConfiguredClients::new(Arc::new(azure_config()));
        assert!(clients.model().is_ok());
        let err = clients.search().err().unwrap();
        assert_eq!(err.to_string(), "PERPLEXITY_API_KEY missing");
    }

    #[tokio::test]
    async fn chat_search_degrades_without_key() {
        let search = create_chat_search(&Config::default());
        let err = search.search("anything").await.unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn entra_client_uses_static_token() {
        let mut config = azure_config();
        config.azure_api_key = None;
        config.azure_ad_token = Some("token".into());

        let client = create_entra_model_client(&config).await.unwrap();
        assert_eq!(client.deployment(), "gpt-4.1");
    }
}
