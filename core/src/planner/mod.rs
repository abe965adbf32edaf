//! Itinerary synthesis: search the web for the group, then let the model write the plan.

pub mod briefing;
pub mod group;

pub use briefing::Briefing;
pub use group::{TravelGroupSpec, build_search_query};

use crate::config::SamplingConfig;
use crate::error::{Error, Result};
use crate::traits::{Completion, CompletionRequest, Message, ModelClient, SearchProvider};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

pub const PLANNER_SYSTEM_PROMPT: &str = "You are a travel planning assistant. Create a soothing, well-structured itinerary. \
Be considerate of children and seniors as provided. Include day-by-day plan, \
estimated pacing, accessibility notes, and links from provided web context.";

#[derive(Serialize)]
struct PlanContext<'a> {
    group: &'a TravelGroupSpec,
    assumptions: &'a str,
    web_context: &'a str,
}

pub fn build_plan_messages(group: &TravelGroupSpec, web_context: &str) -> Result<Vec<Message>> {
    let context = PlanContext {
        group,
        assumptions: group.assumptions(),
        web_context,
    };
    let user = serde_json::to_string(&context)
        .map_err(|e| Error::Validation(format!("Failed to encode group: {e}")))?;

    Ok(vec![Message::system(PLANNER_SYSTEM_PROMPT), Message::user(user)])
}

pub struct TripPlanner {
    search: Arc<dyn SearchProvider>,
    model: Arc<dyn ModelClient>,
    sampling: SamplingConfig,
}

impl TripPlanner {
    pub fn new(
        search: Arc<dyn SearchProvider>,
        model: Arc<dyn ModelClient>,
        sampling: SamplingConfig,
    ) -> Self {
        Self {
            search,
            model,
            sampling,
        }
    }

    pub async fn plan(&self, group: &TravelGroupSpec) -> Result<String> {
        group.validate()?;

        let query = build_search_query(group);
        info!(total_persons = group.total_persons, "gathering web context");
        let web_context = self.search.search(&query).await?;

        let messages = build_plan_messages(group, &web_context)?;
        let request = CompletionRequest {
            messages: &messages,
            tools: None,
            sampling: self.sampling,
        };

        match self.model.complete(request).await? {
            Completion::Text(plan) => Ok(plan),
            Completion::ToolCall { call, .. } => Err(Error::malformed(
                crate::providers::azure::SERVICE,
                format!("unexpected tool call '{}' while planning", call.tool_name),
            )),
        }
    }
}
