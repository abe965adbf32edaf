//! Azure OpenAI chat completions.
//!
//! - URL: `{endpoint}/openai/deployments/{deployment}/chat/completions?api-version={version}`
//! - Auth: `api-key: {key}` header, or `Authorization: Bearer {token}` for Entra ID.

use crate::config::DEFAULT_AZURE_API_VERSION;
use crate::error::{Error, Result};
use crate::traits::{
    Completion, CompletionRequest, Message, ModelClient, ToolCallRequest, ToolDefinition,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

pub const SERVICE: &str = "Azure OpenAI";

#[derive(Debug, Clone)]
pub enum AzureAuth {
    ApiKey(String),
    Bearer(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", content = "parameters", rename_all = "snake_case")]
pub enum DataSource {
    AzureSearch(AzureSearchParameters),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AzureSearchParameters {
    pub endpoint: String,
    pub index_name: String,
    pub authentication: SearchAuthentication,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SearchAuthentication {
    SystemAssignedManagedIdentity,
}

impl DataSource {
    pub fn azure_search(endpoint: impl Into<String>, index_name: impl Into<String>) -> Self {
        Self::AzureSearch(AzureSearchParameters {
            endpoint: endpoint.into(),
            index_name: index_name.into(),
            authentication: SearchAuthentication::SystemAssignedManagedIdentity,
        })
    }
}

#[derive(Debug, Serialize)]
struct AzureRequest<'a> {
    messages: Vec<AzureMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<AzureTool<'a>>>,
    temperature: f64,
    top_p: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    data_sources: Option<&'a [DataSource]>,
}

#[derive(Debug, Serialize)]
struct AzureMessage<'a> {
    role: &'a str,
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<AzureToolCallRequest<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct AzureToolCallRequest<'a> {
    id: &'a str,
    r#type: &'a str,
    function: AzureFunctionRequest<'a>,
}

#[derive(Debug, Serialize)]
struct AzureFunctionRequest<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Debug, Serialize)]
struct AzureTool<'a> {
    r#type: &'a str,
    function: AzureToolFunction<'a>,
}

#[derive(Debug, Serialize)]
struct AzureToolFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct AzureResponse {
    #[serde(default)]
    choices: Vec<AzureChoice>,
}

#[derive(Debug, Deserialize)]
struct AzureChoice {
    message: AzureResponseMessage,
}

#[derive(Debug, Deserialize)]
struct AzureResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<AzureToolCall>>,
}

#[derive(Debug, Deserialize)]
struct AzureToolCall {
    id: String,
    function: AzureFunction,
}

#[derive(Debug, Deserialize)]
struct AzureFunction {
    name: String,
    arguments: String,
}

pub struct AzureOpenAIClient {
    client: reqwest::Client,
    endpoint: String,
    deployment: String,
    api_version: String,
    auth: AzureAuth,
    data_sources: Vec<DataSource>,
}

impl AzureOpenAIClient {
    pub fn new(endpoint: impl Into<String>, deployment: impl Into<String>, auth: AzureAuth) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            deployment: deployment.into(),
            api_version: DEFAULT_AZURE_API_VERSION.to_string(),
            auth,
            data_sources: Vec::new(),
        }
    }

    pub fn with_api_version(mut self, api_version: impl Into<String>) -> Self {
        self.api_version = api_version.into();
        self
    }

    pub fn with_data_source(mut self, source: DataSource) -> Self {
        self.data_sources.push(source);
        self
    }

    pub fn deployment(&self) -> &str {
        &self.deployment
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions",
            self.endpoint, self.deployment
        )
    }

    fn convert_messages<'a>(&self, messages: &'a [Message]) -> Vec<AzureMessage<'a>> {
        messages
            .iter()
            .map(|m| {
                let tool_calls = m.tool_calls.as_ref().map(|calls| {
                    calls
                        .iter()
                        .map(|tc| AzureToolCallRequest {
                            id: &tc.call_id,
                            r#type: "function",
                            function: AzureFunctionRequest {
                                name: &tc.tool_name,
                                arguments: &tc.arguments,
                            },
                        })
                        .collect()
                });

                // A tool-call-bearing assistant turn with no text goes out as `null`.
                let content = if m.content.is_empty() && tool_calls.is_some() {
                    None
                } else {
                    Some(m.content.as_str())
                };

                AzureMessage {
                    role: m.role.as_str(),
                    content,
                    tool_calls,
                    tool_call_id: m.tool_call_id.as_deref(),
                    name: m.name.as_deref(),
                }
            })
            .collect()
    }

    fn convert_tools(tools: &[ToolDefinition]) -> Vec<AzureTool<'_>> {
        tools
            .iter()
            .map(|t| AzureTool {
                r#type: "function",
                function: AzureToolFunction {
                    name: &t.name,
                    description: &t.description,
                    parameters: &t.parameters,
                },
            })
            .collect()
    }

    pub async fn complete_raw(&self, request: CompletionRequest<'_>) -> Result<serde_json::Value> {
        let body = AzureRequest {
            messages: self.convert_messages(request.messages),
            tools: request.tools.map(Self::convert_tools),
            temperature: request.sampling.temperature,
            top_p: request.sampling.top_p,
            max_tokens: request.sampling.max_tokens,
            data_sources: (!self.data_sources.is_empty()).then_some(self.data_sources.as_slice()),
        };

        info!(
            deployment = %self.deployment,
            messages = request.messages.len(),
            tools = request.tools.map_or(0, <[_]>::len),
            "requesting chat completion"
        );

        let builder = self
            .client
            .post(self.completions_url())
            .query(&[("api-version", self.api_version.as_str())])
            .json(&body);

        let builder = match &self.auth {
            AzureAuth::ApiKey(key) => builder.header("api-key", key),
            AzureAuth::Bearer(token) => builder.bearer_auth(token),
        };

        let response = builder
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
        serde_json::from_str(&text).map_err(|e| Error::malformed(SERVICE, e))
    }
}

fn interpret(body: serde_json::Value) -> Result<Completion> {
    let response: AzureResponse =
        serde_json::from_value(body).map_err(|e| Error::malformed(SERVICE, e))?;

    let message = response
        .choices
        .into_iter()
        .next()
        .map(|c| c.message)
        .ok_or_else(|| Error::malformed(SERVICE, "No choices in response"))?;

    let mut calls = message.tool_calls.unwrap_or_default().into_iter();
    if let Some(first) = calls.next() {
        let dropped = calls.count();
        if dropped > 0 {
            warn!(dropped, "model requested several tool calls; only the first is executed");
        }
        debug!(tool = %first.function.name, call_id = %first.id, "model requested a tool");

        return Ok(Completion::ToolCall {
            call: ToolCallRequest {
                call_id: first.id,
                tool_name: first.function.name,
                arguments: first.function.arguments,
            },
            content: message.content.unwrap_or_default(),
        });
    }

    match message.content {
        Some(text) if !text.trim().is_empty() => Ok(Completion::Text(text)),
        _ => Err(Error::malformed(
            SERVICE,
            "Empty response: no content or tool calls",
        )),
    }
}

#[async_trait]
impl ModelClient for AzureOpenAIClient {
    async fn complete(&self, request: CompletionRequest<'_>) -> Result<Completion> {
        let body = self.complete_raw(request).await?;
        interpret(body)
    }
}
