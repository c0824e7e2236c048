//! Domain configuration for the Text-to-SQL prompt.
//!
//! A query is only meaningful against a schema, so the console requires
//! an active domain profile (name, description, database schema) before
//! it sends anything. This crate carries the built-in domain catalog,
//! the profile shape that gets persisted, and the request builder that
//! turns a profile plus chat history into the wire payload.

mod catalog;

pub use catalog::builtin_domains;

use eq_core::{ChatRole, ChatTurn, QueryRequest, Sender};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How many recent user/assistant turns ride along with each request.
const HISTORY_WINDOW: usize = 10;

/// One predefined domain from the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainConfig {
    pub name: String,
    pub domain: String,
    pub description: String,
    #[serde(default)]
    pub sample_queries: Vec<String>,
    /// Database schema as structured JSON; rendered to text when the
    /// config is turned into an active profile.
    pub schema: Value,
}

/// The active domain configuration, as persisted between sessions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DomainProfile {
    pub name: String,
    pub description: String,
    /// Schema text exactly as it is sent in the system prompt. For a
    /// catalog domain this is the pretty-printed schema JSON; for a
    /// custom domain it is whatever the user typed.
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub sample_queries: Vec<String>,
}

impl DomainProfile {
    pub fn from_config(config: &DomainConfig) -> Self {
        Self {
            name: config.name.clone(),
            description: config.description.clone(),
            schema: serde_json::to_string_pretty(&config.schema).unwrap_or_default(),
            sample_queries: config.sample_queries.clone(),
        }
    }

    /// All three fields are required before queries can be sent.
    pub fn is_complete(&self) -> bool {
        !self.name.trim().is_empty()
            && !self.description.trim().is_empty()
            && !self.schema.trim().is_empty()
    }

    /// The system turn sent ahead of every conversation.
    pub fn system_prompt(&self) -> String {
        let mut prompt = format!(
            "You are a Text-to-SQL query generator. Use the given context and user query \
             to reason step-by-step, then produce the final SQL query.\n\n\
             Context:\nDomain: {}\nDomain Description: {}",
            self.name, self.description
        );
        if !self.schema.trim().is_empty() {
            prompt.push_str("\nDatabase Schema: ");
            prompt.push_str(&self.schema);
        }
        prompt
    }
}

/// Maps a transcript sender onto a prompt role; system-generated
/// transcript entries (results, metrics) never enter the prompt.
pub fn history_role(sender: Sender) -> Option<ChatRole> {
    match sender {
        Sender::User => Some(ChatRole::User),
        Sender::Assistant => Some(ChatRole::Assistant),
        Sender::System => None,
    }
}

/// Builds the request payload: system turn, the most recent
/// user/assistant exchanges, then the current message as a fresh user
/// turn.
pub fn build_query_request(
    user_id: &str,
    profile: &DomainProfile,
    history: &[ChatTurn],
    message: &str,
) -> QueryRequest {
    let recent = history.len().saturating_sub(HISTORY_WINDOW);
    let mut messages = Vec::with_capacity(history.len() - recent + 2);
    messages.push(ChatTurn::new(ChatRole::System, profile.system_prompt()));
    messages.extend_from_slice(&history[recent..]);
    messages.push(ChatTurn::new(ChatRole::User, message));

    QueryRequest {
        user_id: user_id.to_string(),
        message: message.to_string(),
        messages,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> DomainProfile {
        DomainProfile {
            name: "Forestry".into(),
            description: "Timber sales and forest management.".into(),
            schema: r#"{"timber_sales": {}}"#.into(),
            sample_queries: vec![],
        }
    }

    #[test]
    fn system_prompt_carries_domain_context() {
        let prompt = profile().system_prompt();
        assert!(prompt.starts_with("You are a Text-to-SQL query generator."));
        assert!(prompt.contains("Domain: Forestry"));
        assert!(prompt.contains("Domain Description: Timber sales"));
        assert!(prompt.contains("Database Schema: {\"timber_sales\""));
    }

    #[test]
    fn system_prompt_omits_empty_schema() {
        let mut p = profile();
        p.schema = "  ".into();
        assert!(!p.system_prompt().contains("Database Schema"));
    }

    #[test]
    fn profile_requires_all_fields() {
        assert!(profile().is_complete());
        let mut p = profile();
        p.description.clear();
        assert!(!p.is_complete());
    }

    #[test]
    fn request_prepends_system_and_appends_current_turn() {
        let history = vec![
            ChatTurn::new(ChatRole::User, "q1"),
            ChatTurn::new(ChatRole::Assistant, "a1"),
        ];
        let request = build_query_request("user_1", &profile(), &history, "q2");
        assert_eq!(request.message, "q2");
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role, ChatRole::System);
        assert_eq!(request.messages[1].content, "q1");
        assert_eq!(request.messages.last().unwrap().content, "q2");
    }

    #[test]
    fn history_is_windowed_to_the_most_recent_turns() {
        let history: Vec<ChatTurn> = (0..25)
            .map(|i| ChatTurn::new(ChatRole::User, format!("q{i}")))
            .collect();
        let request = build_query_request("user_1", &profile(), &history, "latest");
        // system + 10 most recent + current
        assert_eq!(request.messages.len(), 12);
        assert_eq!(request.messages[1].content, "q15");
    }

    #[test]
    fn catalog_domains_convert_to_complete_profiles() {
        for config in builtin_domains() {
            let profile = DomainProfile::from_config(&config);
            assert!(profile.is_complete(), "incomplete profile for {}", config.name);
            assert!(profile.schema.contains("database_schema"));
        }
    }

    #[test]
    fn system_sender_is_excluded_from_history() {
        assert_eq!(history_role(Sender::System), None);
        assert_eq!(history_role(Sender::User), Some(ChatRole::User));
        assert_eq!(history_role(Sender::Assistant), Some(ChatRole::Assistant));
    }
}
