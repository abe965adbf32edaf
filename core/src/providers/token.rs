use crate::config::{self, Config};
use crate::error::{Error, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn token(&self) -> Result<String>;
}

pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

#[async_trait]
impl TokenSource for StaticToken {
    async fn token(&self) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct AzureCliToken {
    resource: String,
}

impl AzureCliToken {
    pub fn new(resource: impl Into<String>) -> Self {
        Self {
            resource: resource.into(),
        }
    }

    fn args(&self) -> [&str; 8] {
        [
            "account",
            "get-access-token",
            "--resource",
            &self.resource,
            "--query",
            "accessToken",
            "--output",
            "tsv",
        ]
    }
}

#[async_trait]
impl TokenSource for AzureCliToken {
    async fn token(&self) -> Result<String> {
        debug!(resource = %self.resource, "requesting Entra token from Azure CLI");

        let output = Command::new("az")
            .args(self.args())
            .output()
            .await
            .map_err(|e| Error::Configuration(format!("Failed to run Azure CLI: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(Error::Configuration(format!(
                "Azure CLI token request failed: {}",
                stderr.trim()
            )));
        }

        let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if token.is_empty() {
            return Err(Error::Configuration(
                "Azure CLI returned an empty access token".into(),
            ));
        }
        Ok(token)
    }
}

/// A pre-issued token wins; otherwise the Azure CLI is asked for one.
pub fn token_source(config: &Config) -> Result<Box<dyn TokenSource>> {
    if let Some(token) = config::non_empty(&config.azure_ad_token) {
        return Ok(Box::new(StaticToken::new(token)));
    }

    let resource = config::non_empty(&config.cognitive_services_resource).ok_or_else(|| {
        Error::Configuration(
            "Set AZURE_OPENAI_AD_TOKEN or AZURE_COGNITIVE_SERVICES_RESOURCE for Entra ID authentication"
                .into(),
        )
    })?;

    Ok(Box::new(AzureCliToken::new(resource)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn static_token_wins_over_cli() {
        let mut config = Config::default();
        config.azure_ad_token = Some("eyJ0eXAi".into());
        config.cognitive_services_resource = Some("https://cognitiveservices.azure.com".into());

        let source = token_source(&config).unwrap();
        assert_eq!(source.token().await.unwrap(), "eyJ0eXAi");
    }

    #[test]
    fn no_token_and_no_resource_is_a_configuration_error() {
        let err = token_source(&Config::default()).err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn cli_is_scoped_to_resource() {
        let source = AzureCliToken::new("https://cognitiveservices.azure.com");
        let args = source.args();
        assert_eq!(args[2], "--resource");
        assert_eq!(args[3], "https://cognitiveservices.azure.com");
    }
}
