use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::answer::AnswerValue;
use crate::error::CoreError;
use crate::fields::{Model, Record, coerce_text};
use crate::models::RecordId;

/// A request to have a questionnaire filled for a patient.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ProcedureRequest {
    pub id: RecordId,
    pub patient_id: RecordId,
    #[serde(default)]
    pub performer_id: Option<RecordId>,
    #[serde(default)]
    pub service_id: Option<RecordId>,
    pub questionnaire_id: RecordId,
    #[serde(default)]
    pub note: Option<String>,
}

impl Record for ProcedureRequest {
    const MODEL: Model = Model::ProcedureRequest;

    fn id(&self) -> RecordId {
        self.id
    }

    fn link(&self, field: &str) -> Result<Option<RecordId>, CoreError> {
        match field {
            "patient_id" => Ok(Some(self.patient_id)),
            "performer_id" => Ok(self.performer_id),
            "service_id" => Ok(self.service_id),
            "questionnaire_id" => Ok(Some(self.questionnaire_id)),
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
