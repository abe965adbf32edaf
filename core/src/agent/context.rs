use crate::traits::ToolDefinition;
use chrono::{DateTime, Local};
use std::fmt::Write;

pub const TRAVEL_ASSISTANT_PERSONA: &str =
    "You are a travel assistant agent, you help people to plan trips according to their age groups.";

pub struct ContextBuilder {
    persona: String,
    tools: Vec<ToolDefinition>,
    now: DateTime<Local>,
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ContextBuilder {
    pub fn new() -> Self {
        Self {
            persona: TRAVEL_ASSISTANT_PERSONA.to_string(),
            tools: vec![],
            now: Local::now(),
        }
    }

    pub fn with_persona(mut self, persona: impl Into<String>) -> Self {
        self.persona = persona.into();
        self
    }

    pub fn with_tools(mut self, tools: &[ToolDefinition]) -> Self {
        self.tools = tools.to_vec();
        self
    }

    pub fn with_time(mut self, now: DateTime<Local>) -> Self {
        self.now = now;
        self
    }

    pub fn build_system_prompt(&self) -> String {
        let mut parts = vec![self.persona.clone()];

        if let Some(tools) = self.get_tool_notes() {
            parts.push(tools);
        }
        parts.push(self.get_runtime_context());

        parts.join("\n\n")
    }

    fn get_tool_notes(&self) -> Option<String> {
        if self.tools.is_empty() {
            return None;
        }

        let mut notes = String::from("## Tools\n\n");
        notes.push_str(
            "Call a tool when the traveller needs current information such as opening hours, \
             prices, events, weather or accessibility details. Cite links from tool results.\n\n",
        );
        for tool in &self.tools {
            let _ = writeln!(notes, "- **{}**: {}", tool.name, tool.description);
        }

        Some(notes)
    }

    fn get_runtime_context(&self) -> String {
        format!(
            "## Current Date\n{}",
            self.now.format("%Y-%m-%d (%A)")
        )
    }
}
