pub mod context;
pub mod history;
pub mod loop_;

pub use context::ContextBuilder;
pub use history::ConversationHistory;
pub use loop_::{ConversationLoop, LoopState, TurnOutcome, is_exit_command};
