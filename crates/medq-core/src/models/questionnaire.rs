use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::answer::AnswerValue;
use crate::error::CoreError;
use crate::fields::{Model, Record, coerce_text};
use crate::models::RecordId;

/// A questionnaire template. Its questions live in their own table and
/// point back here through `questionnaire_id`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Questionnaire {
    pub id: RecordId,
    pub name: String,
    /// Expression that must hold before a response may be completed.
    #[serde(default)]
    pub check_code: Option<String>,
}

impl Questionnaire {
    pub fn check_code(&self) -> Option<&str> {
        self.check_code.as_deref().filter(|c| !c.trim().is_empty())
    }
}

impl Record for Questionnaire {
    const MODEL: Model = Model::Questionnaire;

    fn id(&self) -> RecordId {
        self.id
    }

    fn set_field(&mut self, field: &str, value: &AnswerValue) -> Result<(), CoreError> {
        match field {
            "name" => self.name = coerce_text(value).unwrap_or_default(),
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
