use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::answer::{AnswerValue, transform_result};
use crate::error::CoreError;
use crate::fields::{Model, Record, coerce_text};
use crate::models::{EventState, QuestionType, RecordId};

/// One filled-out instance of a questionnaire for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Response {
    pub id: RecordId,
    /// Sequence-generated reference, also used as the display name.
    pub internal_identifier: String,
    pub questionnaire_id: RecordId,
    /// The request this response was generated from. Never changes.
    #[serde(default)]
    pub procedure_request_id: Option<RecordId>,
    pub patient_id: RecordId,
    #[serde(default)]
    pub performer_id: Option<RecordId>,
    #[serde(default)]
    pub service_id: Option<RecordId>,
    #[serde(default)]
    pub state: EventState,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub signature: Option<DocumentSignature>,
    #[serde(default)]
    pub occurrence_started_at: Option<jiff::Timestamp>,
    #[serde(default)]
    pub occurrence_completed_at: Option<jiff::Timestamp>,
    pub created_at: jiff::Timestamp,
    pub updated_at: jiff::Timestamp,
}

impl Response {
    pub fn display_name(&self) -> &str {
        &self.internal_identifier
    }

    /// Completed responses are signed and no longer accept answers.
    pub fn is_locked(&self) -> bool {
        self.state == EventState::Completed
    }
}

impl Record for Response {
    const MODEL: Model = Model::Response;

    fn id(&self) -> RecordId {
        self.id
    }

    fn link(&self, field: &str) -> Result<Option<RecordId>, CoreError> {
        match field {
            "questionnaire_id" => Ok(Some(self.questionnaire_id)),
            "procedure_request_id" => Ok(self.procedure_request_id),
            "patient_id" => Ok(Some(self.patient_id)),
            "performer_id" => Ok(self.performer_id),
            "service_id" => Ok(self.service_id),
            _ => Err(CoreError::FieldNotFound {
                field: field.to_string(),
                model: Self::MODEL,
            }),
        }
    }

    fn set_field(&mut self, field: &str, value: &AnswerValue) -> Result<(), CoreError> {
        match field {
            "note" => self.note = coerce_text(value),
            _ => {
                return Err(CoreError::FieldNotFound {
                    field: field.to_string(),
                    model: Self::MODEL,
                });
            }
        }
        Ok(())
    }
}

/// Creation values for a [`Response`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewResponse {
    pub questionnaire_id: RecordId,
    #[serde(default)]
    pub procedure_request_id: Option<RecordId>,
    pub patient_id: RecordId,
    #[serde(default)]
    pub performer_id: Option<RecordId>,
    #[serde(default)]
    pub service_id: Option<RecordId>,
    #[serde(default)]
    pub note: Option<String>,
}

/// Proof that a completed response was sealed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentSignature {
    pub algorithm: String,
    /// Hex digest of the serialized response at signing time.
    pub digest: String,
    pub signed_at: jiff::Timestamp,
}

/// One answered question within a response.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ResponseItem {
    pub id: RecordId,
    pub response_id: RecordId,
    pub name: String,
    pub required: bool,
    pub question_type: QuestionType,
    /// Raw answer text. Typed reading goes through [`ResponseItem::typed_result`].
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub selection_options: Option<String>,
    #[serde(default)]
    pub options: Option<String>,
    #[serde(default)]
    pub question_id: Option<RecordId>,
    #[serde(default)]
    pub sequence: i32,
}

impl ResponseItem {
    pub fn typed_result(&self) -> Result<AnswerValue, CoreError> {
        transform_result(self.question_type, self.result.as_deref())
    }
}

impl Record for ResponseItem {
    const MODEL: Model = Model::ResponseItem;

    fn id(&self) -> RecordId {
        self.id
    }

    fn link(&self, field: &str) -> Result<Option<RecordId>, CoreError> {
        match field {
            "response_id" => Ok(Some(self.response_id)),
            "question_id" => Ok(self.question_id),
            _ => Err(CoreError::FieldNotFound {
                field: field.to_string(),
                model: Self::MODEL,
            }),
        }
    }
}

/// Creation values for a [`ResponseItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewResponseItem {
    pub response_id: RecordId,
    pub name: String,
    pub required: bool,
    pub question_type: QuestionType,
    pub result: Option<String>,
    pub selection_options: Option<String>,
    pub options: Option<String>,
    pub question_id: Option<RecordId>,
    pub sequence: i32,
}

impl NewResponseItem {
    pub fn into_item(self, id: RecordId) -> ResponseItem {
        ResponseItem {
            id,
            response_id: self.response_id,
            name: self.name,
            required: self.required,
            question_type: self.question_type,
            result: self.result,
            selection_options: self.selection_options,
            options: self.options,
            question_id: self.question_id,
            sequence: self.sequence,
        }
    }
}
