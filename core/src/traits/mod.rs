pub mod model;
pub mod search;
pub mod tool;

pub use model::{
    Completion, CompletionRequest, Message, ModelClient, Role, ToolCallRequest,
};
pub use search::SearchProvider;
pub use tool::ToolDefinition;
