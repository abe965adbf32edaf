use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

const QUERY_OPENING: &str = "Find family-friendly and senior-friendly travel suggestions with accessibility and kid activities as relevant.";
const QUERY_CLOSING: &str = "Return concise bullets of attractions, accommodations, transport tips, and meal suggestions with links where possible.";
pub const ADULTS_ONLY_NOTE: &str = "No children or seniors; assume young adults only.";
pub const ADULTS_ONLY_ASSUMPTION: &str = "Assume young adults only (no kids/seniors).";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TravelGroupSpec {
    pub total_persons: u32,
    #[serde(default)]
    pub children: Vec<u32>,
    #[serde(default)]
    pub seniors: Vec<u32>,
    #[serde(default)]
    pub destination_hint: Option<String>,
    #[serde(default)]
    pub days: Option<u32>,
    /// Free text, usually `low`, `medium` or `high`.
    #[serde(default)]
    pub budget_level: Option<String>,
}

impl TravelGroupSpec {
    pub fn new(total_persons: u32) -> Self {
        Self {
            total_persons,
            children: Vec::new(),
            seniors: Vec::new(),
            destination_hint: None,
            days: None,
            budget_level: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.total_persons < 1 {
            return Err(Error::Validation(
                "total_persons must be greater than or equal to 1".into(),
            ));
        }
        if self.days.is_some_and(|d| d < 1) {
            return Err(Error::Validation(
                "days must be greater than or equal to 1".into(),
            ));
        }
        Ok(())
    }

    pub fn is_adults_only(&self) -> bool {
        self.children.is_empty() && self.seniors.is_empty()
    }

    pub fn assumptions(&self) -> &'static str {
        if self.is_adults_only() {
            ADULTS_ONLY_ASSUMPTION
        } else {
            ""
        }
    }
}

fn join_ages(ages: &[u32]) -> String {
    ages.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

fn filled(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

pub fn build_search_query(group: &TravelGroupSpec) -> String {
    let mut parts = vec![
        QUERY_OPENING.to_string(),
        format!("Group size: {}.", group.total_persons),
    ];

    if group.is_adults_only() {
        parts.push(ADULTS_ONLY_NOTE.to_string());
    }
    if !group.children.is_empty() {
        parts.push(format!("Children ages: {}.", join_ages(&group.children)));
    }
    if !group.seniors.is_empty() {
        parts.push(format!("Seniors ages: {}.", join_ages(&group.seniors)));
    }
    if let Some(hint) = filled(&group.destination_hint) {
        parts.push(format!("Destination hint: {hint}."));
    }
    if let Some(days) = group.days.filter(|d| *d > 0) {
        parts.push(format!("Trip length: {days} days."));
    }
    if let Some(budget) = filled(&group.budget_level) {
        parts.push(format!("Budget level: {budget}."));
    }

    parts.push(QUERY_CLOSING.to_string());
    parts.join(" ")
}
