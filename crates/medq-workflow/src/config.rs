use serde::{Deserialize, Serialize};

/// Sequence that numbers new responses.
pub const RESPONSE_SEQUENCE_CODE: &str = "medical.questionnaire.response";

/// Identifier given to a response when no sequence is configured.
pub const FALLBACK_IDENTIFIER: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    #[serde(default = "default_sequence_code")]
    pub sequence_code: String,
    #[serde(default = "default_fallback_identifier")]
    pub fallback_identifier: String,
    /// Recorded on every audit event.
    #[serde(default = "default_actor")]
    pub actor: String,
}

fn default_sequence_code() -> String {
    RESPONSE_SEQUENCE_CODE.to_string()
}

fn default_fallback_identifier() -> String {
    FALLBACK_IDENTIFIER.to_string()
}

fn default_actor() -> String {
    "system".to_string()
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            sequence_code: default_sequence_code(),
            fallback_identifier: default_fallback_identifier(),
            actor: default_actor(),
        }
    }
}

impl WorkflowConfig {
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = actor.into();
        self
    }
}
