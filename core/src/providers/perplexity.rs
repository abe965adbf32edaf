use crate::config::{self, Config, DEFAULT_PERPLEXITY_BASE_URL, DEFAULT_SEARCH_MODEL};
use crate::error::{Error, Result};
use crate::traits::SearchProvider;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

pub const SERVICE: &str = "Perplexity";
pub const NO_RESULTS: &str = "No relevant search results found.";

#[derive(Debug, Serialize)]
struct PerplexityRequest<'a> {
    model: &'a str,
    messages: [PerplexityMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct PerplexityMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponse {
    #[serde(default)]
    choices: Option<Vec<PerplexityChoice>>,
}

#[derive(Debug, Deserialize)]
struct PerplexityChoice {
    #[serde(default)]
    message: Option<PerplexityResponseMessage>,
}

#[derive(Debug, Deserialize)]
struct PerplexityResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

pub struct PerplexitySearch {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl PerplexitySearch {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: build_client(Duration::from_secs(60)),
            api_key: api_key.into(),
            model: DEFAULT_SEARCH_MODEL.to_string(),
            base_url: DEFAULT_PERPLEXITY_BASE_URL.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let api_key = config::non_empty(&config.perplexity_api_key)
            .ok_or_else(|| Error::Configuration("PERPLEXITY_API_KEY missing".into()))?;

        Ok(Self::new(api_key)
            .with_model(config.search_model.clone())
            .with_base_url(config.perplexity_base_url.clone())
            .with_timeout(Duration::from_secs(config.search_timeout_secs)))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = build_client(timeout);
        self
    }
}

fn build_client(timeout: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_default()
}

#[async_trait]
impl SearchProvider for PerplexitySearch {
    async fn search(&self, query: &str) -> Result<String> {
        let request = PerplexityRequest {
            model: &self.model,
            messages: [PerplexityMessage {
                role: "user",
                content: query,
            }],
        };

        info!(model = %self.model, "querying Perplexity");

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::upstream(SERVICE, format!("{status}: {error_text}")));
        }

        let text = response
            .text()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;
        let body: PerplexityResponse =
            serde_json::from_str(&text).map_err(|e| Error::malformed(SERVICE, e))?;

        let answer = body
            .choices
            .unwrap_or_default()
            .into_iter()
            .next()
            .and_then(|c| c.message)
            .and_then(|m| m.content);

        match answer {
            Some(text) => Ok(text),
            None => {
                debug!("Perplexity response carried no answer");
                Ok(NO_RESULTS.to_string())
            }
        }
    }
}

pub struct UnconfiguredSearch;

#[async_trait]
impl SearchProvider for UnconfiguredSearch {
    async fn search(&self, _query: &str) -> Result<String> {
        Err(Error::Configuration("PERPLEXITY_API_KEY missing".into()))
    }
}
