//! # DomainScout Core Library
//!
//! This crate provides the core functionality for the DomainScout terminal client.
//! It contains the agent streaming protocol, the local search history, and the
//! rule-based helpers that are independent of any specific user interface.
//!
//! ## Modules
//!
//! - `agent`: Streaming client for the remote domain-analysis agent
//! - `timeline`: Progress entries derived from agent node updates
//! - `history` / `session`: Local search history store and its view-state mirror
//! - `suggestions`: Follow-up question generation
//! - `settings`: Application configuration management
//! - `theme`: UI theming system

pub mod agent;
pub mod domain;
pub mod effort;
pub mod error;
pub mod history;
pub mod message;
pub mod session;
pub mod settings;
pub mod sse;
pub mod suggestions;
pub mod theme;
pub mod timeline;

pub use error::{Result, ScoutError};

#[cfg(test)]
mod tests {
    use crate::agent::{default_api_url, RunInput, DEFAULT_ASSISTANT_ID};
    use crate::effort::{EffortLevel, DEFAULT_MODEL};
    use crate::message::Message;
    use crate::settings::Settings;
    use crate::theme::ThemeVariant;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.theme, ThemeVariant::Dark);
        assert_eq!(settings.assistant_id, DEFAULT_ASSISTANT_ID);
        assert_eq!(settings.model, DEFAULT_MODEL);
        assert_eq!(settings.effort, EffortLevel::Medium);
        assert!(settings.database_path.is_none());
        assert_eq!(settings.api_url, default_api_url());
    }

    #[test]
    fn test_default_settings_produce_medium_run() {
        let settings = Settings::default();
        let input = RunInput::new(
            vec![Message::human("example.com", "1")],
            settings.effort,
            &settings.model,
        );
        assert_eq!(input.initial_search_query_count, 3);
        assert_eq!(input.max_research_loops, 3);
        assert_eq!(input.reasoning_model, DEFAULT_MODEL);
    }
}
