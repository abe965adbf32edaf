pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod planner;
pub mod providers;
pub mod tools;
pub mod traits;

#[cfg(test)]
mod testing;

pub use agent::{ContextBuilder, ConversationHistory, ConversationLoop, LoopState, TurnOutcome};
pub use config::*;
pub use error::{Error, Result};
pub use planner::{Briefing, TravelGroupSpec, TripPlanner};
pub use providers::*;
pub use traits::*;
