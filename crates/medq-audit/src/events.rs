use std::fmt;

use serde::Serialize;
use tracing::info;

use medq_core::{Model, RecordId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Start,
    Complete,
    RevertToDraft,
    Project,
    Sign,
    WriteItems,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Start => "start",
            Self::Complete => "complete",
            Self::RevertToDraft => "revert_to_draft",
            Self::Project => "project",
            Self::Sign => "sign",
            Self::WriteItems => "write_items",
            Self::Delete => "delete",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured audit event for a change to a clinical record.
///
/// Events go through `tracing` at `info` so whichever subscriber the binary
/// installs (plain or JSON) keeps them next to the rest of the log.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEvent {
    pub action: AuditAction,
    pub resource_type: Model,
    pub resource_id: RecordId,
    pub actor: String,
    pub at: jiff::Timestamp,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(
        action: AuditAction,
        resource_type: Model,
        resource_id: RecordId,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            action,
            resource_type,
            resource_id,
            actor: actor.into(),
            at: jiff::Timestamp::now(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Emit this audit event via tracing.
    pub fn emit(&self) {
        let details = self
            .details
            .as_ref()
            .map(|d| d.to_string())
            .unwrap_or_default();
        info!(
            audit.action = %self.action,
            audit.resource_type = %self.resource_type,
            audit.resource_id = %self.resource_id,
            audit.actor = %self.actor,
            audit.details = %details,
            "audit event"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_model_and_action_names() {
        let event = AuditEvent::new(AuditAction::RevertToDraft, Model::Response, RecordId(3), "nurse")
            .with_details(serde_json::json!({ "items_removed": 4 }));
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "revert_to_draft");
        assert_eq!(json["resource_type"], "response");
        assert_eq!(json["resource_id"], 3);
        assert_eq!(json["details"]["items_removed"], 4);
        event.emit();
    }
}
