use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::fields::{Model, Record};
use crate::models::{NewResponseItem, RecordId};
use crate::path::DestinationPath;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QuestionType {
    Text,
    Integer,
    Float,
    Boolean,
    Date,
    Selection,
    Multiselection,
    /// Display-only block; carries no answer.
    Description,
}

/// A single question of a questionnaire definition.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionDefinition {
    pub id: RecordId,
    pub questionnaire_id: RecordId,
    #[serde(default)]
    pub sequence: i32,
    pub name: String,
    /// Variable name under which the answer is visible to the completion check.
    #[serde(default)]
    pub technical_name: Option<String>,
    pub question_type: QuestionType,
    #[serde(default = "default_required")]
    pub required: bool,
    #[serde(default)]
    pub selection_options: Option<String>,
    #[serde(default)]
    pub options: Option<String>,
    /// Dot-separated path, starting at the response, that receives the answer
    /// once the response is completed.
    #[serde(default)]
    pub destination_field: Option<String>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(default)]
    pub readonly_condition: Option<String>,
    #[serde(default)]
    pub is_invisible: bool,
    #[serde(default)]
    pub invisible_condition: Option<String>,
}

fn default_required() -> bool {
    true
}

impl QuestionDefinition {
    /// Initial values of the response item that answers this question.
    pub fn generate_question(&self, response_id: RecordId) -> NewResponseItem {
        NewResponseItem {
            response_id,
            name: self.name.clone(),
            required: self.required,
            question_type: self.question_type,
            result: None,
            selection_options: self.selection_options.clone(),
            options: self.options.clone(),
            question_id: Some(self.id),
            sequence: self.sequence,
        }
    }

    pub fn destination(&self) -> Option<DestinationPath> {
        DestinationPath::parse(self.destination_field.as_deref())
    }

    pub fn technical_name(&self) -> Option<&str> {
        self.technical_name.as_deref().filter(|n| !n.is_empty())
    }
}

impl Record for QuestionDefinition {
    const MODEL: Model = Model::QuestionDefinition;

    fn id(&self) -> RecordId {
        self.id
    }
}
