pub mod azure;
pub mod factory;
pub mod perplexity;
pub mod token;

pub use azure::{AzureAuth, AzureOpenAIClient, DataSource};
pub use factory::{
    ClientFactory, ConfiguredClients, create_chat_search, create_entra_model_client,
    create_model_client, create_search,
};
pub use perplexity::{PerplexitySearch, UnconfiguredSearch};
pub use token::{AzureCliToken, StaticToken, TokenSource, token_source};
