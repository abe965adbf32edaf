use crate::error::Error;
use crate::traits::{SearchProvider, ToolDefinition};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

pub const WEB_SEARCH_TOOL: &str = "search_perplexity";

pub const MISSING_KEY_MESSAGE: &str =
    "Error: Perplexity API key is not set. Please set PERPLEXITY_API_KEY in your .env file.";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchArgs {
    pub query: String,
}

pub fn definition() -> ToolDefinition {
    ToolDefinition {
        name: WEB_SEARCH_TOOL.to_string(),
        description:
            "Searches the web using the Perplexity API to get live information for trip planning."
                .to_string(),
        parameters: json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query for Perplexity API."
                }
            },
            "required": ["query"]
        }),
    }
}

pub async fn search_or_describe(search: &dyn SearchProvider, query: &str) -> String {
    debug!(query, "running web search tool");

    match search.search(query).await {
        Ok(answer) => answer,
        Err(Error::Configuration(reason)) => {
            warn!("web search unavailable: {}", reason);
            MISSING_KEY_MESSAGE.to_string()
        }
        Err(Error::Upstream { message, .. }) | Err(Error::MalformedResponse { message, .. }) => {
            warn!("web search failed: {}", message);
            format!("Error during Perplexity search: {message}")
        }
        Err(e) => {
            warn!("web search failed: {}", e);
            format!("Error during Perplexity search: {e}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeSearch;

    #[tokio::test]
    async fn passes_answer_through() {
        let search = FakeSearch::answering("Visit the aquarium.");
        let output = search_or_describe(&search, "Lisbon kids").await;

        assert_eq!(output, "Visit the aquarium.");
        assert_eq!(search.queries(), vec!["Lisbon kids".to_string()]);
    }

    #[tokio::test]
    async fn missing_key_becomes_fixed_message() {
        let search = FakeSearch::failing(|| Error::Configuration("PERPLEXITY_API_KEY missing".into()));
        let output = search_or_describe(&search, "anything").await;
        assert_eq!(output, MISSING_KEY_MESSAGE);
    }

    #[tokio::test]
    async fn upstream_failure_embeds_reason() {
        let search = FakeSearch::failing(|| Error::upstream("Perplexity", "operation timed out"));
        let output = search_or_describe(&search, "anything").await;
        assert_eq!(output, "Error during Perplexity search: operation timed out");
    }
}
