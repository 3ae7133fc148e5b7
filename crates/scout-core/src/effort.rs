//! Research effort levels and the reasoning model catalogue.
//!
//! The remote agent has no notion of "effort"; it only understands an initial
//! query count and a loop budget. Each level maps to a fixed pair.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-preview-04-17";

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EffortLevel {
    Low,
    #[default]
    Medium,
    High,
}

/// Query and loop budget sent with every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResearchBudget {
    pub initial_search_query_count: u32,
    pub max_research_loops: u32,
}

impl EffortLevel {
    pub fn budget(&self) -> ResearchBudget {
        let (initial_search_query_count, max_research_loops) = match self {
            Self::Low => (1, 1),
            Self::Medium => (3, 3),
            Self::High => (5, 10),
        };
        ResearchBudget {
            initial_search_query_count,
            max_research_loops,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Quick",
            Self::Medium => "Standard",
            Self::High => "Deep",
        }
    }

    pub fn next(&self) -> Self {
        match self {
            Self::Low => Self::Medium,
            Self::Medium => Self::High,
            Self::High => Self::Low,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Self::Low => Self::High,
            Self::Medium => Self::Low,
            Self::High => Self::Medium,
        }
    }

    /// Lenient parse used for values read back from the history store.
    /// Unknown strings fall back to the default level.
    pub fn parse_or_default(value: &str) -> Self {
        value.parse().unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReasoningModel {
    pub id: &'static str,
    pub label: &'static str,
}

pub const REASONING_MODELS: &[ReasoningModel] = &[
    ReasoningModel {
        id: "gemini-2.0-flash",
        label: "2.0 Flash",
    },
    ReasoningModel {
        id: DEFAULT_MODEL,
        label: "2.5 Flash",
    },
    ReasoningModel {
        id: "gemini-2.5-pro-preview-05-06",
        label: "2.5 Pro",
    },
];

pub fn model_label(id: &str) -> &str {
    REASONING_MODELS
        .iter()
        .find(|m| m.id == id)
        .map(|m| m.label)
        .unwrap_or(id)
}

/// Cycle through the catalogue. Unknown ids restart at the first entry.
pub fn next_model(current: &str) -> &'static str {
    let index = REASONING_MODELS.iter().position(|m| m.id == current);
    match index {
        Some(i) => REASONING_MODELS[(i + 1) % REASONING_MODELS.len()].id,
        None => REASONING_MODELS[0].id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effort_budgets() {
        assert_eq!(
            EffortLevel::Low.budget(),
            ResearchBudget {
                initial_search_query_count: 1,
                max_research_loops: 1
            }
        );
        assert_eq!(
            EffortLevel::Medium.budget(),
            ResearchBudget {
                initial_search_query_count: 3,
                max_research_loops: 3
            }
        );
        assert_eq!(
            EffortLevel::High.budget(),
            ResearchBudget {
                initial_search_query_count: 5,
                max_research_loops: 10
            }
        );
    }

    #[test]
    fn test_effort_parsing() {
        assert_eq!("low".parse::<EffortLevel>().unwrap(), EffortLevel::Low);
        assert_eq!("HIGH".parse::<EffortLevel>().unwrap(), EffortLevel::High);
        assert!("extreme".parse::<EffortLevel>().is_err());
        assert_eq!(EffortLevel::parse_or_default("bogus"), EffortLevel::Medium);
        assert_eq!(EffortLevel::High.to_string(), "high");
    }

    #[test]
    fn test_effort_cycle_wraps() {
        assert_eq!(EffortLevel::High.next(), EffortLevel::Low);
        assert_eq!(EffortLevel::Low.previous(), EffortLevel::High);
    }

    #[test]
    fn test_model_catalogue() {
        assert_eq!(model_label(DEFAULT_MODEL), "2.5 Flash");
        assert_eq!(model_label("custom-model"), "custom-model");
        assert_eq!(next_model("gemini-2.0-flash"), DEFAULT_MODEL);
        assert_eq!(
            next_model("gemini-2.5-pro-preview-05-06"),
            "gemini-2.0-flash"
        );
        assert_eq!(next_model("unknown"), "gemini-2.0-flash");
    }
}
